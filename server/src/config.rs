//! Command line configuration for the server binary

use clap::Parser;
use shared::{DEFAULT_GRID_SIZE, DEFAULT_PORT};

const DEFAULT_OUTBOUND_BUFFER: u32 = 64;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(author, version, about = "Realtime treasure hunt server")]
pub struct Config {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,
    /// Server port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Side length of the square grid
    #[arg(short, long, default_value_t = DEFAULT_GRID_SIZE, value_parser = clap::value_parser!(u32).range(1..))]
    pub grid_size: u32,
    /// Frames queued per connection before broadcasts to it are skipped
    #[arg(long, default_value_t = DEFAULT_OUTBOUND_BUFFER, value_parser = clap::value_parser!(u32).range(1..))]
    pub outbound_buffer: u32,
}

impl Config {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            grid_size: DEFAULT_GRID_SIZE,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }
}
