//! Screenshot tool for the BB3 chassis
//!
//! One `DISPlay:DATA?` query over the SCPI socket; the reply is a
//! definite-length binary block whose payload is the front-panel
//! framebuffer, written verbatim to a file.

use bb3_link::{Chassis, Result, TcpTransport};
use clap::Parser;
use log::info;
use std::time::Duration;

/// Fetch a screenshot from a BB3 chassis
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output filename (default: auto-generated .jpg file)
    filename: Option<String>,

    /// Chassis SCPI address
    #[arg(long, default_value = "192.168.10.78:5025")]
    address: String,

    /// Connect and reply timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let filename = args.filename.unwrap_or_else(|| {
        format!(
            "bb3_screenshot_{}.jpg",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        )
    });

    info!("Connecting to BB3 at {}...", args.address);
    let transport = TcpTransport::connect(&args.address, Duration::from_secs(args.timeout))?;
    let mut chassis = Chassis::new(transport);
    chassis.set_io_timeout(Duration::from_secs(args.timeout))?;

    info!("Requesting screenshot...");
    let image = chassis.screenshot()?;

    std::fs::write(&filename, &image)?;
    info!("Screenshot saved to: {filename}");
    info!("Image size: {} bytes", image.len());

    Ok(())
}
