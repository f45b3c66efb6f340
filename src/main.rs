use anyhow::{Context, Result};
use clap::Parser;
use squeeze_upload::cli::{Args, Commands};
use squeeze_upload::utils::{create_progress_spinner, print_compression_result};
use squeeze_upload::{
    compress, inspect_image, logger, print_image_report, CompressionPolicy, CompressionTier,
    Endpoint, HttpTransport, ImageCrateCodec, SourceImage, TransportConfig, Uploader,
};
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logger::init(args.quiet, args.verbose);

    if let Err(err) = run(args.command).await {
        squeeze_upload::error!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Compress {
            input,
            output,
            max_side,
            max_bytes,
            file_name,
        } => {
            let policy = CompressionPolicy::new(max_side, max_bytes, file_name)?;
            compress_file(&input, &output, &policy).await
        }
        Commands::Upload {
            input,
            folder,
            endpoint,
            base_url,
            token,
            max_side,
            max_bytes,
        } => {
            let policy = CompressionPolicy::new(max_side, max_bytes, None)?;
            let endpoint = Endpoint::from_str(&endpoint)?;
            let config = TransportConfig::new(base_url, token);
            upload_file(&input, folder.as_deref(), endpoint, config, policy).await
        }
        Commands::Info {
            input,
            max_side,
            max_bytes,
        } => {
            let policy = CompressionPolicy::new(max_side, max_bytes, None)?;
            show_image_info(&input, &policy).await
        }
    }
}

fn read_source(input: &Path) -> Result<SourceImage> {
    SourceImage::from_path(input).with_context(|| format!("Failed to read {:?}", input))
}

async fn compress_file(input: &Path, output: &Path, policy: &CompressionPolicy) -> Result<()> {
    squeeze_upload::info!("🗜️  Compressing image: {:?}", input);
    squeeze_upload::info!("📁 Output: {:?}", output);

    let source = read_source(input)?;
    let bytes = if source.kind().is_compressible() {
        let pb = create_progress_spinner("Compressing...");
        let result = compress(&ImageCrateCodec::new(), &source, policy).await;
        pb.finish_and_clear();
        let result = result.with_context(|| format!("Failed to compress {:?}", input))?;

        match (result.tier, result.format, result.quality) {
            (CompressionTier::FastPath, _, _) => {
                squeeze_upload::info!("✅ Already within budget, copied unchanged");
            }
            (tier, Some(format), Some(quality)) => {
                squeeze_upload::info!(
                    "✅ {} at quality {:.2}, {}x{} ({:?})",
                    format,
                    quality,
                    result.width,
                    result.height,
                    tier
                );
            }
            _ => {}
        }
        if result.tier == CompressionTier::Fallback {
            squeeze_upload::warn!("Result may exceed the {} byte budget", policy.max_bytes);
        }
        result.data
    } else {
        squeeze_upload::info!("⏭️  {} is not resampled, copied unchanged", source.mime);
        source.data.clone()
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }
    fs::write(output, &bytes).with_context(|| format!("Failed to write {:?}", output))?;

    print_compression_result(source.size() as u64, bytes.len() as u64);
    Ok(())
}

async fn upload_file(
    input: &Path,
    folder: Option<&str>,
    endpoint: Endpoint,
    config: TransportConfig,
    policy: CompressionPolicy,
) -> Result<()> {
    squeeze_upload::info!("📤 Uploading: {:?}", input);
    squeeze_upload::info!("🔗 Endpoint: {}", config.endpoint_url(endpoint));

    let source = read_source(input)?;
    let transport = HttpTransport::new(config);
    let uploader = Uploader::with_policy(ImageCrateCodec::new(), transport, policy);

    let pb = create_progress_spinner("Uploading...");
    let outcome = uploader.upload(source, folder, endpoint).await;
    pb.finish_and_clear();
    let outcome = outcome?;

    squeeze_upload::info!("✅ Upload successful!");
    println!("{}", outcome.url);
    if let Some(warning) = outcome.warning {
        squeeze_upload::warn!("{}", warning);
    }
    Ok(())
}

async fn show_image_info(input: &Path, policy: &CompressionPolicy) -> Result<()> {
    squeeze_upload::info!("📋 Getting info for: {:?}", input);

    let source = read_source(input)?;
    let report = inspect_image(&ImageCrateCodec::new(), &source, policy).await;
    print_image_report(&report, policy);
    Ok(())
}
