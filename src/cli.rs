use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "squeeze-upload",
    about = "Fit images under an upload size ceiling and submit them",
    long_about = "squeeze-upload shrinks images until they fit a byte budget and uploads them as \
                  multipart requests. Oversized images are downscaled, then encoded as WebP or JPEG \
                  at the highest quality that fits; SVG and GIF files are uploaded untouched.",
    version = "0.1.0",
    after_help = "EXAMPLES:\n  \
    squeeze-upload compress photo.jpg photo-small.webp -s 1920\n  \
    squeeze-upload upload banner.png -e admin -f banners --base-url https://cms.example.com\n  \
    squeeze-upload info scan.tiff"
)]
pub struct Args {
    #[arg(short = 'q', long, global = true, help = "Only print results and errors")]
    pub quiet: bool,

    #[arg(short = 'v', long, global = true, help = "Log every encoding attempt")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Compress a single image to fit the size budget",
        long_about = "Run the compression pipeline locally and write the result. \
                      The output may be WebP or JPEG regardless of the output extension."
    )]
    Compress {
        #[arg(help = "Input image file path")]
        input: PathBuf,

        #[arg(help = "Output file path")]
        output: PathBuf,

        #[arg(
            short = 's',
            long,
            help = "Maximum side length in pixels (default: 2560)",
            long_help = "Images with a longer side are downscaled, preserving aspect ratio. \
                         Images are never upscaled."
        )]
        max_side: Option<u32>,

        #[arg(
            short = 'b',
            long,
            help = "Maximum output size in bytes (default: 3145728)"
        )]
        max_bytes: Option<usize>,

        #[arg(
            short = 'n',
            long,
            help = "Name for the encoded result",
            long_help = "Base name for the encoded result; the extension is replaced \
                         to match the chosen format."
        )]
        file_name: Option<String>,
    },

    #[command(
        about = "Compress and upload an image",
        long_about = "Compress an image and submit it as a multipart form to the admin or \
                      media upload endpoint. Prints the uploaded URL."
    )]
    Upload {
        #[arg(help = "Image file path to upload")]
        input: PathBuf,

        #[arg(short = 'f', long, help = "Destination folder")]
        folder: Option<String>,

        #[arg(
            short = 'e',
            long,
            default_value = "media",
            help = "Upload endpoint (admin, media)"
        )]
        endpoint: String,

        #[arg(
            long,
            help = "API base URL",
            long_help = "Base URL the endpoint path is appended to. \
                         Default: http://localhost:3000"
        )]
        base_url: Option<String>,

        #[arg(long, help = "Bearer token sent with the upload")]
        token: Option<String>,

        #[arg(short = 's', long, help = "Maximum side length in pixels (default: 2560)")]
        max_side: Option<u32>,

        #[arg(short = 'b', long, help = "Maximum upload size in bytes (default: 3145728)")]
        max_bytes: Option<usize>,
    },

    #[command(
        about = "Show image details and the planned upload route",
        long_about = "Decode an image and report its dimensions, size, and whether it would be \
                      passed through, uploaded unchanged, or compressed."
    )]
    Info {
        #[arg(help = "Image file path to analyze")]
        input: PathBuf,

        #[arg(short = 's', long, help = "Maximum side length in pixels (default: 2560)")]
        max_side: Option<u32>,

        #[arg(short = 'b', long, help = "Maximum size in bytes (default: 3145728)")]
        max_bytes: Option<usize>,
    },
}
