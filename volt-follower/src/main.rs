use bb3_link::{Chassis, TcpTransport};
use log::{error, info};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use volt_follower::config::FollowerConfig;
use volt_follower::controller::Controller;
use volt_follower::error::Result;

/// Resolve configuration from command line arguments.
///
/// Supports:
/// - `volt-follower <config.toml>` (positional)
/// - `volt-follower --address <ip:port>` (override, with or without a file)
///
/// Falls back to `follower.toml` in the working directory, then to
/// built-in defaults.
fn resolve_config() -> Result<FollowerConfig> {
    let args: Vec<String> = std::env::args().collect();

    let mut config = if args.len() > 1 && !args[1].starts_with('-') {
        let path = Path::new(&args[1]);
        info!("Loading configuration from {path:?}");
        FollowerConfig::load(path)?
    } else if Path::new("follower.toml").exists() {
        info!("Loading configuration from follower.toml");
        FollowerConfig::load(Path::new("follower.toml"))?
    } else {
        info!("Using default configuration");
        FollowerConfig::default()
    };

    if let Some(address) = args
        .iter()
        .position(|a| a == "--address")
        .and_then(|i| args.get(i + 1))
    {
        info!("Using chassis address: {address}");
        config.connection.address = address.clone();
    }

    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("volt-follower v{}", env!("CARGO_PKG_VERSION"));

    let config = resolve_config()?;

    let transport = TcpTransport::connect(
        &config.connection.address,
        Duration::from_millis(config.connection.timeout_ms),
    )?;
    let mut chassis = Chassis::new(transport);
    chassis.set_io_timeout(Duration::from_millis(config.connection.io_timeout_ms))?;

    let mut controller = Controller::new(chassis, config.control.clone());

    // Both slots must hold the required module before anything is driven
    controller.check_modules()?;
    controller.setup()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let s = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        s.store(true, Ordering::Relaxed);
    })
    .map_err(|e| {
        volt_follower::error::FollowerError::Config(format!("Error setting Ctrl-C handler: {e}"))
    })?;

    let result = controller.run(&shutdown);
    if let Err(ref e) = result {
        error!("Loop error: {e}");
    }

    // Always disable the output, whatever ended the loop
    controller.shutdown_output();

    info!("volt-follower finished");
    result
}
