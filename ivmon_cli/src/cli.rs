//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

/// Log file writer guard; dropping it flushes the file.
pub static FILE_GUARD: Mutex<Option<tracing_appender::non_blocking::WorkerGuard>> =
    Mutex::new(None);
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "ivmon", version, about = "IV bag weight monitor (HX711 load cell)")]
pub struct Cli {
    /// Path to config TOML; built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log as JSON lines and print results as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Memory locking mode for real-time operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RtLock {
    /// Do not lock memory
    None,
    /// Lock currently resident pages
    Current,
    /// Lock current and future pages
    All,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Calibrate interactively, then monitor the bag weight until Ctrl+C
    Run {
        /// Stop after this many monitoring cycles
        #[arg(long, value_name = "N")]
        cycles: Option<u64>,
        /// Collector endpoint for readings (overrides [collector].url)
        #[arg(long, value_name = "URL")]
        collector_url: Option<String>,
        /// Enable real-time mode (mlockall, SCHED_FIFO)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on supported OSes.\n\nLinux: locks the address space with mlockall and requests SCHED_FIFO so the HX711 clock pulses are not stretched by preemption. Needs CAP_IPC_LOCK/CAP_SYS_NICE (or root); failures are logged and the run continues.\n\nmacOS: only mlockall is applied."
        )]
        rt: bool,
        /// SCHED_FIFO priority for --rt (Linux only; defaults to the maximum)
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
        /// Memory locking mode for --rt
        #[arg(long, value_enum, value_name = "MODE", default_value = "current")]
        rt_lock: RtLock,
    },
    /// Hardware check only (plus collector reachability when configured)
    SelfCheck,
}
