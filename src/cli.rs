use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

use crate::config::Overrides;

/// Send signed requests to the bitsCrunch market metrics API and print the
/// responses.
#[derive(Debug, Parser)]
#[command(name = "bitscrunch", version)]
pub struct Args {
    /// Path to the access key file [default: ./access-key.json]
    #[arg(long)]
    pub key_path: Option<PathBuf>,

    /// Number of requests [default: 10]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub count: Option<u32>,

    /// API host, e.g. `https://api-testnet.bitscrunch.com`
    #[arg(long)]
    pub host: Option<String>,

    /// TOML settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Only warnings and the fatal error are shown by default
    #[arg(long, default_value = "warn")]
    pub log_level: Level,
}

impl Args {
    /// Parse arguments, accepting single-dash long flags (`-count=1`) too.
    pub fn parse_normalized<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_flags(args))
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            key_path: self.key_path.clone(),
            count: self.count,
        }
    }
}

const LONG_FLAGS: [&str; 5] = ["key-path", "count", "host", "config", "log-level"];

/// Rewrites `-flag` and `-flag=value` to their `--` form for known long
/// flags. Everything else, short flags included, passes through untouched.
pub fn normalize_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            let Some(text) = arg.to_str() else {
                return arg;
            };
            let Some(rest) = text.strip_prefix('-') else {
                return arg;
            };
            if rest.starts_with('-') {
                return arg;
            }
            let flag = rest.split('=').next().unwrap_or(rest);
            if LONG_FLAGS.contains(&flag) {
                OsString::from(format!("-{text}"))
            } else {
                arg
            }
        })
        .collect()
}
