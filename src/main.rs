//! waybill CLI - inspect and exercise the data access layer from a shell.
//!
//! Commands:
//!
//! - `waybill routes` - list routes (cached, with offline fallback)
//! - `waybill locations [route-id]` - list locations, optionally per route
//! - `waybill upload <location-id> <file>...` - upload images and attach
//!   the hosted URLs to a location

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use waybill::upload::{progress_channel, ImageFile, ImageHostClient, Uploader};
use waybill::{Config, DataService};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::load()?;
    info!(api = %config.api_base_url, local = config.use_local_store, "waybill starting");

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("routes") => list_routes(&config).await,
        Some("locations") => {
            let route_id = match args.get(1) {
                Some(raw) => Some(raw.parse::<i64>().context("Invalid route id")?),
                None => None,
            };
            list_locations(&config, route_id).await
        }
        Some("upload") => {
            let location_id = args
                .get(1)
                .context("Usage: waybill upload <location-id> <file>...")?
                .parse::<i64>()
                .context("Invalid location id")?;
            if args.len() < 3 {
                bail!("Usage: waybill upload <location-id> <file>...");
            }
            upload_images(&config, location_id, &args[2..]).await
        }
        _ => {
            eprintln!("Usage: waybill <routes | locations [route-id] | upload <location-id> <file>...>");
            Ok(())
        }
    }
}

async fn list_routes(config: &Config) -> Result<()> {
    let service = DataService::new(config)?;
    let routes = service.get_routes(false).await;
    for route in routes {
        println!(
            "{:>6}  {:<12} {:<10} {:<16} {}",
            route.id, route.route, route.shift, route.warehouse, route.description
        );
    }
    Ok(())
}

async fn list_locations(config: &Config, route_id: Option<i64>) -> Result<()> {
    let service = DataService::new(config)?;
    let locations = service.get_detail_data(route_id, false).await;
    for location in locations {
        println!(
            "{:>6}  {:<24} route {:>4}  {} image(s)",
            location.id,
            location.location,
            location.route_id,
            location.images.len()
        );
    }
    Ok(())
}

async fn upload_images(config: &Config, location_id: i64, paths: &[String]) -> Result<()> {
    let api_key = config
        .imgbb_api_key
        .as_deref()
        .context("No imgbb API key configured (set WAYBILL_IMGBB_KEY)")?;

    let files = paths
        .iter()
        .map(|path| read_image(path))
        .collect::<Result<Vec<_>>>()?;

    let host = ImageHostClient::new(api_key)?;
    let service = Arc::new(DataService::new(config)?);
    let uploader = Uploader::new(host, service);

    let (tx, mut rx) = progress_channel();
    let watcher = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            eprintln!("progress: {}%", *rx.borrow());
        }
    });

    let report = uploader.attach_images(location_id, &files, Some(&tx)).await;
    drop(tx);
    let _ = watcher.await;

    let report = report?;
    println!("uploaded {} image(s), {} failed", report.uploaded, report.failed);
    Ok(())
}

fn read_image(path: &str) -> Result<ImageFile> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read image file {}", path))?;
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    Ok(ImageFile {
        mime: mime_for(&name),
        name,
        bytes,
    })
}

fn mime_for(name: &str) -> String {
    let ext = Path::new(name)
        .extension()
        .map(|e| e.to_ascii_lowercase().to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    };
    mime.to_string()
}
