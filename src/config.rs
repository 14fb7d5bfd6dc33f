//! Command line, environment and config file locations.
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::api::DEFAULT_API_URL;
use crate::error::{Context, Result, simple_error};

const APP_DIR: &str = "usrapi-manager";

#[derive(Parser, Debug, Clone)]
#[command(name = "usrapi-manager", version, about = "TUI for a REST users API")]
pub struct Args {
    /// Collection URL of the users resource.
    #[arg(long, env = "USRAPI_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Directory holding theme.conf and keybinds.conf.
    #[arg(long, env = "USRAPI_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Log file (default: <config dir>/usrapi-manager.log).
    #[arg(long, env = "USRAPI_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

/// Resolved file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub dir: PathBuf,
    pub theme: PathBuf,
    pub keybinds: PathBuf,
    pub log: PathBuf,
}

impl Paths {
    /// Pick the config directory and create it if needed.
    pub fn resolve(args: &Args) -> Result<Self> {
        let dir = args
            .config_dir
            .clone()
            .or_else(|| dirs::config_dir().map(|d| d.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&dir)
            .with_ctx(|| format!("create config dir {}", dir.display()))?;
        Ok(Self::in_dir(&dir, args.log_file.clone()))
    }

    pub fn in_dir(dir: &Path, log: Option<PathBuf>) -> Self {
        Self {
            dir: dir.to_path_buf(),
            theme: dir.join("theme.conf"),
            keybinds: dir.join("keybinds.conf"),
            log: log.unwrap_or_else(|| dir.join("usrapi-manager.log")),
        }
    }
}

/// Accept only http(s) URLs; strip a trailing slash.
pub fn normalize_api_url(raw: &str) -> Result<String> {
    let url = raw.trim().trim_end_matches('/');
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(url.to_string()),
        _ => Err(simple_error(format!(
            "invalid API URL '{raw}': expected http://host[:port]/path"
        ))),
    }
}
