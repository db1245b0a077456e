//! Screenshot tool for the Keithley DMM6500
//!
//! The instrument has no screenshot query, but its web interface draws
//! the front panel into a canvas element. This tool drives a browser
//! through a WebDriver session, waits for the panel to render, and
//! saves either the whole virtual panel or just the display canvas.

mod browser;
mod capture;
mod error;
mod webdriver;

use capture::{CaptureMode, CaptureOptions};
use clap::Parser;
use error::Result;
use log::{error, info};
use std::time::Duration;
use webdriver::{BrowserKind, WebDriverSession};

/// Capture a screenshot from a DMM6500 web interface
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output filename (default: auto-generated .png file)
    filename: Option<String>,

    /// DMM6500 IP address
    #[arg(long, default_value = "192.168.0.1")]
    ip: String,

    /// Web interface username
    #[arg(long, default_value = "admin")]
    user: String,

    /// Web interface password
    #[arg(long, default_value = "admin")]
    password: String,

    /// Browser to use (default: edge on Windows, chrome elsewhere)
    #[arg(long, value_enum)]
    browser: Option<BrowserKind>,

    /// Show the browser window (default: run headless)
    #[arg(long)]
    no_headless: bool,

    /// Wait time in seconds for the display to load
    #[arg(long, default_value = "3.0")]
    wait: f64,

    /// Capture only the display canvas (default: full panel)
    #[arg(long)]
    canvas_only: bool,

    /// Attach to a running WebDriver instead of spawning one
    #[arg(long)]
    webdriver_url: Option<String>,
}

fn run(args: &Args) -> Result<String> {
    let kind = args.browser.unwrap_or_else(BrowserKind::platform_default);

    info!("Connecting to DMM6500 at {}...", args.ip);
    let mut session =
        WebDriverSession::start(kind, !args.no_headless, args.webdriver_url.as_deref())?;

    let mode = if args.canvas_only {
        CaptureMode::CanvasOnly
    } else {
        CaptureMode::FullPanel
    };
    let opts = CaptureOptions {
        ip: args.ip.clone(),
        username: args.user.clone(),
        password: args.password.clone(),
        mode,
        load_wait: Duration::from_secs_f64(args.wait),
        resize_wait: Duration::from_millis(500),
    };

    let image = capture::capture(&mut session, &opts)?;

    let filename = args.filename.clone().unwrap_or_else(|| {
        format!(
            "dmm6500_screenshot_{}.png",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        )
    });
    std::fs::write(&filename, &image)?;

    info!("Screenshot saved to: {filename}");
    info!("Image size: {} bytes", image.len());
    info!(
        "Mode: {}",
        match mode {
            CaptureMode::FullPanel => "Full panel",
            CaptureMode::CanvasOnly => "Canvas only",
        }
    );

    Ok(filename)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{e}");
        std::process::exit(1);
    }
}
