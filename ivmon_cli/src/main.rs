mod cli;
mod error_fmt;
mod logging;
mod rt;
mod station;

use clap::Parser;
use eyre::WrapErr;
use ivmon_traits::CancelToken;

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let code = match real_main(&cli) {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!(error = %err, "ivmon failed");
            if cli.json {
                eprintln!("{}", error_fmt::format_error_json(&err));
            } else {
                eprintln!("{}", error_fmt::humanize(&err));
            }
            error_fmt::exit_code_for_error(&err)
        }
    };
    // process::exit skips destructors; flush the log file first.
    if let Ok(mut guard) = FILE_GUARD.lock() {
        guard.take();
    }
    std::process::exit(code);
}

fn real_main(cli: &Cli) -> eyre::Result<()> {
    let mut cfg = match &cli.config {
        Some(path) => ivmon_config::load_file(path)?,
        None => ivmon_config::Config::default(),
    };
    if let Commands::Run {
        collector_url: Some(url),
        ..
    } = &cli.cmd
    {
        cfg.collector.url = Some(url.clone());
        cfg.validate()?;
    }

    logging::init(cli.log_level.as_deref(), cli.json, &cfg.logging)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "ivmon starting"
    );

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            cancel.cancel();
        })
        .wrap_err("install Ctrl-C handler")?;
    }

    station::execute(&cli.cmd, &cfg, cancel)
}
