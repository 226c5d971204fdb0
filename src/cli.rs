//! Command-line interface (clap derive).
//!
//! `run` flags all have an environment variable so the sidecar can be
//! configured from a container spec alone.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "cf-realip",
    version,
    about = "Trusted-proxy header rewriting for services behind Cloudflare",
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the header-rewriting proxy
    Run(RunArgs),

    /// Write a starter config file
    Init(InitArgs),

    /// Check a config file without starting
    Validate(ValidateArgs),

    /// Query /health on a running instance
    Health(HealthArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Config file (.yaml, .yml, .json, .toml); auto-detected when omitted
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(short, long, env = "LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Human-readable logs even without a TTY
    #[arg(long, env = "LOG_PRETTY")]
    pub pretty: bool,

    /// JSON logs even on a TTY
    #[arg(long, env = "LOG_JSON", conflicts_with = "pretty")]
    pub json: bool,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "MAX_BODY_SIZE", default_value_t = 1_048_576)]
    pub max_body: usize,
}

#[derive(Args)]
pub struct InitArgs {
    #[arg(short, long, value_enum, default_value_t = ConfigFormat::Yaml)]
    pub format: ConfigFormat,

    /// Defaults to `cf-realip.<format>` in the working directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Upstream every request is forwarded to
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    pub upstream: String,

    /// Replace an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    #[arg(default_value = "cf-realip.yaml")]
    pub config: PathBuf,

    #[arg(long, value_enum, default_value_t = ValidateFormat::Text)]
    pub format: ValidateFormat,
}

#[derive(Args)]
pub struct HealthArgs {
    /// Base URL of the running instance
    #[arg(default_value = "http://localhost:3000")]
    pub url: String,

    /// Print the raw JSON body
    #[arg(long)]
    pub json: bool,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// File extension, also the key `parse_config_str` dispatches on.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ValidateFormat {
    Text,
    Json,
}
