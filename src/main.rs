use anyhow::{Context, Result};
use clap::Parser;
use splitget::config::Settings;
use splitget::{Args, ConsoleObserver, DownloadSpec, Downloader, probe_resource};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Ignoring config: {e:#}");
            Settings::default()
        }
    };

    let log_level = args.log_level.as_deref().or(settings.log_level.as_deref());
    init_tracing(log_level);

    let segments = args.segments.or(settings.segments).unwrap_or(8);
    let dir = args
        .dir
        .or(settings.default_dir)
        .unwrap_or_else(|| ".".to_string());
    let user_agent = settings
        .user_agent
        .unwrap_or_else(|| format!("splitget/{}", env!("CARGO_PKG_VERSION")));

    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .build()
        .context("building HTTP client")?;

    let resource = probe_resource(&args.url, &client)
        .await
        .with_context(|| format!("probing {}", args.url))?;

    if !resource.range_supported {
        warn!("server does not advertise byte ranges, using a single stream");
    }

    let filename = args.output.unwrap_or(resource.filename);
    if dir != "." {
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating {dir}"))?;
    }
    let target = Path::new(&dir).join(&filename);

    let spec = DownloadSpec::new(
        resource.url,
        resource.total_size,
        resource.range_supported,
        target,
        segments,
    );
    info!(?spec, "starting download");

    let observer = Arc::new(ConsoleObserver::new(&filename, spec.total_size));
    let report = Downloader::new(client, observer)
        .run(&spec)
        .await
        .with_context(|| format!("downloading {}", spec.url))?;

    println!(
        "Saved {} ({} bytes, {} segments, {:.1}s)",
        report.path.display(),
        report.bytes,
        report.segments,
        report.elapsed.as_secs_f64()
    );
    Ok(())
}
