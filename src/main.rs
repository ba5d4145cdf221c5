mod args;
mod cloudflare;
mod config;
mod ip;
mod pushover;
mod setup;
mod state;
mod updater;

use std::error::Error;
use std::process::ExitCode;

/// User-Agent header value for HTTP requests
pub const USER_AGENT: &str = concat!("cloudflare-ddns/", env!("CARGO_PKG_VERSION"));

fn init_logger(verbose: bool, debug: bool, quiet: bool) {
    let log_level = if quiet {
        log::LevelFilter::Error
    } else if debug {
        log::LevelFilter::Trace
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::builder()
        .filter(None, log_level)
        .init();
}

fn main() -> ExitCode {
    let args = args::Args::new();

    init_logger(args.verbose, args.debug, args.quiet);
    log::trace!("Args: {:?}", args);

    if let Err(e) = run(&args) {
        log::error!("{}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &args::Args) -> Result<(), Box<dyn Error>> {
    if args.setup {
        return setup::run(args);
    }

    let config_file = config::config_path(args.config.as_deref())?;
    let config = config::Config::load(&config_file)?;
    config.validate()?;
    log::trace!("Config loaded from {}", config_file.display());

    updater::run(args, &config)
}
