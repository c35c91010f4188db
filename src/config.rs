use std::path::PathBuf;

use clap::Parser;

use crate::constants::{DEFAULT_HOST, DEFAULT_PORT};
use crate::session::SessionOptions;
use crate::types::GameMode;

/// Game server for phone-based social deduction sessions.
#[derive(Clone, Debug, Parser)]
#[command(author, version, about)]
pub struct ServerConfig {
    /// Address to bind to
    #[arg(short = 'H', long, env = "HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Which assignment policy the session runs
    #[arg(short, long, env = "GAME_MODE", value_enum, default_value_t = GameMode::Deduction)]
    pub mode: GameMode,

    /// Seed for the session random source
    #[arg(long, env = "GAME_SEED")]
    pub seed: Option<u64>,

    /// Directory with join.html, role.html and admin.html
    #[arg(long, env = "STATIC_DIR", default_value = "public")]
    pub static_dir: PathBuf,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            mode: self.mode,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = ServerConfig::parse_from([
            "server", "--host", "127.0.0.1", "--port", "8080", "--mode", "paired", "--seed", "9",
        ]);
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        let options = config.session_options();
        assert_eq!(options.mode, GameMode::Paired);
        assert_eq!(options.seed, Some(9));
    }
}
