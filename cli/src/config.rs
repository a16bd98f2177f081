use std::time::Duration;

use anyhow::bail;
use clap::{Parser, Subcommand, ValueEnum};

/// Runtime configuration for the `fanout` binary.
///
/// Every global flag can also be supplied through the environment (or a
/// `.env` file in the working directory).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fanout",
    version,
    about = "Concurrent REST fetches against jsonplaceholder, dummyjson and giphy"
)]
pub struct CliArgs {
    /// Base URL of the jsonplaceholder-style users API.
    ///
    /// Environment variable: `FANOUT_USERS_URL`
    #[arg(long, env = "FANOUT_USERS_URL", global = true, default_value_t = String::from(fanout_core::client::JSONPLACEHOLDER_URL))]
    pub users_url: String,

    /// Base URL of the dummyjson-style profiles API.
    ///
    /// Environment variable: `FANOUT_PROFILES_URL`
    #[arg(long, env = "FANOUT_PROFILES_URL", global = true, default_value_t = String::from(fanout_core::client::DUMMYJSON_URL))]
    pub profiles_url: String,

    /// Base URL of the giphy API.
    ///
    /// Environment variable: `FANOUT_GIPHY_URL`
    #[arg(long, env = "FANOUT_GIPHY_URL", global = true, default_value_t = String::from(fanout_core::giphy::GIPHY_URL))]
    pub giphy_url: String,

    /// Giphy api key. Only required by the `gifs` subcommands.
    ///
    /// Environment variable: `GIPHY_API_KEY`
    #[arg(long, env = "GIPHY_API_KEY", global = true, hide_env_values = true, default_value_t = String::new())]
    pub giphy_api_key: String,

    /// Number of gifs per page.
    ///
    /// Environment variable: `FANOUT_GIPHY_LIMIT`
    #[arg(long, env = "FANOUT_GIPHY_LIMIT", global = true, default_value_t = fanout_core::giphy::DEFAULT_LIMIT)]
    pub giphy_limit: u32,

    /// Per-request timeout in milliseconds, covering connect and body read.
    ///
    /// Environment variable: `FANOUT_TIMEOUT_MS`
    #[arg(long, env = "FANOUT_TIMEOUT_MS", global = true, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// HTTP stack used for every request.
    ///
    /// Environment variable: `FANOUT_BACKEND`
    #[arg(long, env = "FANOUT_BACKEND", global = true, value_enum, default_value_t = Backend::Reqwest)]
    pub backend: Backend,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch users concurrently and print their names in argument order.
    Get {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Create a user.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },
    /// Delete a user.
    Delete { id: String },
    /// Delete a profile.
    DeleteProfile { id: String },
    /// Walk profiles from `start` until the API reports the end.
    Profiles {
        #[arg(long, default_value_t = 1)]
        start: u64,
        #[arg(long, default_value_t = 100)]
        max: usize,
    },
    /// Search or list trending gifs.
    Gifs {
        #[command(subcommand)]
        query: GifCommand,
    },
    /// Interactive menu on stdin.
    Menu,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum GifCommand {
    Search { query: String },
    Trending,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Async client.
    Reqwest,
    /// Blocking client, run on the blocking thread pool.
    Ureq,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub users_url: String,
    pub profiles_url: String,
    pub giphy_url: String,
    pub giphy_api_key: String,
    pub giphy_limit: u32,
    pub timeout: Duration,
    pub backend: Backend,
}

impl TryFrom<&CliArgs> for Config {
    type Error = anyhow::Error;

    fn try_from(args: &CliArgs) -> Result<Self, Self::Error> {
        if args.timeout_ms == 0 {
            bail!("FANOUT_TIMEOUT_MS must be greater than 0");
        }
        if args.giphy_limit == 0 {
            bail!("FANOUT_GIPHY_LIMIT must be greater than 0");
        }
        for (var, url) in [
            ("FANOUT_USERS_URL", &args.users_url),
            ("FANOUT_PROFILES_URL", &args.profiles_url),
            ("FANOUT_GIPHY_URL", &args.giphy_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                bail!("{var} must be an http(s) URL, got {url:?}");
            }
        }
        if matches!(args.command, Command::Gifs { .. }) && args.giphy_api_key.is_empty() {
            bail!("GIPHY_API_KEY is required for the gifs subcommands");
        }

        Ok(Self {
            users_url: args.users_url.clone(),
            profiles_url: args.profiles_url.clone(),
            giphy_url: args.giphy_url.clone(),
            giphy_api_key: args.giphy_api_key.clone(),
            giphy_limit: args.giphy_limit,
            timeout: Duration::from_millis(args.timeout_ms),
            backend: args.backend,
        })
    }
}
