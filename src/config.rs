use std::path::PathBuf;
use anyhow::bail;
use clap::{ArgAction, Parser};

#[derive(Parser, Clone, Debug)]
pub struct Config {
    #[clap(env, long, default_value = "development")]
    pub environment: String,

    /// Postgres connection string. The in-memory store is used when absent.
    #[clap(env, long)]
    pub database_url: Option<String>,

    #[clap(env, long, default_value_t = 8)]
    pub pool_size: u32,

    /// HMAC key used to sign session tokens.
    #[clap(env, long, hide_env_values = true)]
    pub jwt_secret: String,

    /// Comma separated list of origins allowed by CORS.
    #[clap(env, long, default_value = "http://localhost:5173")]
    pub origin_urls: String,

    #[clap(env, long, default_value_t = 4000)]
    pub port: u16,

    #[clap(env, long, default_value = "uploads")]
    pub upload_dir: PathBuf,

    #[clap(env, long, default_value_t = true, action = ArgAction::Set)]
    pub cookie_secure: bool,

    #[clap(env, long, default_value_t = 50 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    #[clap(env, long, default_value_t = 20 * 1024 * 1024)]
    pub max_remote_fetch_bytes: u64,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt_secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        if self.pool_size == 0 {
            bail!("POOL_SIZE must be at least 1");
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
