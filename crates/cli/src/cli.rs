//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Bus Tracker - live bus position sharing
#[derive(Parser, Debug)]
#[command(
    name = "bus-tracker",
    author,
    version,
    about = "Live bus position registry and reporter",
    long_about = "Drivers share their position under a bus number; passengers look it up.\n\n\
                  `serve` runs the registry, `share` runs a reporter session, \n\
                  `locate` and `stop` talk to a running registry."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "BUS_TRACKER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "BUS_TRACKER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the position registry server
    Serve(ServeArgs),

    /// Share a simulated position under a bus number
    Share(ShareArgs),

    /// Print the current position of a bus
    Locate(LocateArgs),

    /// Ask the registry to stop sharing a bus number
    Stop(StopArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `serve` command
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when absent
    #[arg(short, long, env = "BUS_TRACKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override bind host
    #[arg(long, env = "BUS_TRACKER_HOST")]
    pub host: Option<String>,

    /// Override bind port
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Expire records older than this many seconds
    #[arg(long, env = "BUS_TRACKER_RECORD_TTL_SECS")]
    pub record_ttl_secs: Option<u64>,

    /// GeoJSON FeatureCollection served on /api/line/{code}
    #[arg(long, env = "BUS_TRACKER_LINES_PATH")]
    pub lines_path: Option<PathBuf>,

    /// Prometheus exporter port (disabled when absent)
    #[arg(long, env = "BUS_TRACKER_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Registry connection options shared by client commands
#[derive(Parser, Debug, Clone)]
pub struct EndpointArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when absent
    #[arg(short, long, env = "BUS_TRACKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Registry base URL, overrides `reporter.endpoint`
    #[arg(long, env = "BUS_TRACKER_ENDPOINT")]
    pub endpoint: Option<String>,
}

/// Arguments for the `share` command
#[derive(Parser, Debug, Clone)]
pub struct ShareArgs {
    /// Bus number to share under
    #[arg(short, long)]
    pub bus_number: String,

    #[command(flatten)]
    pub endpoint: EndpointArgs,

    /// Override the acquisition interval (ms)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Stop after this many seconds (runs until Ctrl+C when absent)
    #[arg(long)]
    pub duration_secs: Option<u64>,

    /// Simulated start latitude
    #[arg(long, requires = "start_lon", allow_hyphen_values = true)]
    pub start_lat: Option<f64>,

    /// Simulated start longitude
    #[arg(long, requires = "start_lat", allow_hyphen_values = true)]
    pub start_lon: Option<f64>,

    /// Simulated distance travelled per fix (meters)
    #[arg(long, default_value = "10")]
    pub step_m: f64,

    /// Simulated heading (degrees clockwise from north)
    #[arg(long, default_value = "90", allow_hyphen_values = true)]
    pub heading_deg: f64,
}

/// Arguments for the `locate` command
#[derive(Parser, Debug, Clone)]
pub struct LocateArgs {
    /// Bus number to look up
    #[arg(short, long)]
    pub bus_number: String,

    #[command(flatten)]
    pub endpoint: EndpointArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `stop` command
#[derive(Parser, Debug, Clone)]
pub struct StopArgs {
    /// Bus number to stop sharing
    #[arg(short, long)]
    pub bus_number: String,

    #[command(flatten)]
    pub endpoint: EndpointArgs,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
