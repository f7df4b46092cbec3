use std::process;

use clap::{Arg, Command};
use log::{error, info, warn};
use tokio::signal;

mod config;
mod control_server;
mod daemon;
mod packet_handler;
mod seed;
mod service;

use config::Config;
use daemon::Daemon;

#[tokio::main]
async fn main() {
    let matches = Command::new("ndngated")
        .version("0.1.0")
        .about("ndngate Daemon - NDN admission control and forwarding liveness")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("/etc/ndngate/ndngated.conf"),
        )
        .arg(
            Arg::new("daemon")
                .short('d')
                .long("daemon")
                .help("Run as daemon")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").unwrap();
    let daemon_mode = matches.get_flag("daemon");

    let config = match Config::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    // the configured level is the default; RUST_LOG still wins
    let mut log_builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.logging.level),
    );
    if let Some(log_file) = &config.logging.file {
        match std::fs::OpenOptions::new().create(true).append(true).open(log_file) {
            Ok(file) => {
                log_builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Cannot open log file {}: {}, logging to stderr", log_file, e),
        }
    }
    log_builder.init();

    info!("Starting ndngate Daemon");
    info!("Config file: {}", config_path);
    info!("Daemon mode: {}", daemon_mode);

    let mut daemon = Daemon::new(config);

    if let Err(e) = daemon.start().await {
        error!("Failed to start daemon: {}", e);
        process::exit(1);
    }

    info!("ndngate Daemon started successfully");

    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for ctrl+c: {}", e);
    }

    info!("Shutting down ndngate Daemon");
    if let Err(e) = daemon.stop().await {
        warn!("Shutdown error: {}", e);
    }
}
