use std::env;
use clap::Parser;
use log::{info, LevelFilter};
use crate::cli::application::run_application;
use crate::cli::types::Options;
use crate::error::AppRunError;

pub mod cli;
pub mod config;
pub mod device;
pub mod error;

pub fn init_logging(level: LevelFilter) {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    if let Ok(log_file) = env::var("LOG_FILE") {
        dispatch = dispatch.chain(
            fern::log_file(log_file).expect("Failed to open LOG_FILE")
        );
    }

    dispatch.apply().expect("Failed to initialize logger");
}

pub fn run(args: env::Args) -> Result<(), AppRunError> {
    let options = Options::parse_from(args);

    init_logging(if options.verbose { LevelFilter::Debug } else { LevelFilter::Info });
    info!(concat!("BLE Device List ", env!("CARGO_PKG_VERSION")));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(run_application(options));

    // the stdin reader may still be blocked on a read
    runtime.shutdown_background();
    result
}
