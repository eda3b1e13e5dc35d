use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::time::Duration;

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs allowed to receive server responses,
    /// or "*" to allow any origin.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "*"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: String,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Events retained per periodic stream for replay after reconnects
    #[arg(long, env, default_value_t = 2000)]
    pub event_buffer_capacity: usize,

    /// Chunks retained per chunk stream for replay after reconnects
    #[arg(long, env, default_value_t = 500)]
    pub chunk_buffer_capacity: usize,

    /// Seconds a periodic stream may sit idle before the sweeper reclaims it
    #[arg(long, env, default_value_t = 300)]
    pub idle_timeout_secs: u64,

    /// Seconds between expiration sweeps over the periodic stream registry
    #[arg(long, env, default_value_t = 60)]
    pub sweep_interval_secs: u64,

    /// Seconds a chunk stream survives past its most recently emitted chunk
    #[arg(long, env, default_value_t = 120)]
    pub chunk_ttl_secs: u64,

    /// Default milliseconds between generated events when a request does not set one
    #[arg(long, env, default_value_t = 2000)]
    pub default_interval_ms: u64,

    /// Default chunk payload size in bytes
    #[arg(long, env, default_value_t = 1024)]
    pub default_chunk_size: usize,

    /// Default total byte target for chunk streams
    #[arg(long, env, default_value_t = 65536)]
    pub default_chunk_total_bytes: u64,

    /// Default milliseconds between chunks
    #[arg(long, env, default_value_t = 200)]
    pub default_chunk_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn chunk_ttl(&self) -> Duration {
        Duration::from_secs(self.chunk_ttl_secs)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}
