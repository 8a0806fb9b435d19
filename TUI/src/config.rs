//! Application configuration and constants.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

use crate::preferences::PreferenceStore;

#[derive(Debug, Parser)]
#[command(name = "tokenizer-tui", version, about = "Terminal front end for a tokenizer service")]
pub struct Cli {
    /// TOML config file; values there override the built-in defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Tokenizer API base URL (backend directly, or the gateway's /api)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Where to write logs (the terminal is owned by the UI)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Preferences file holding the saved theme
    #[arg(long)]
    pub prefs: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Main loop tick rate in milliseconds (target 60 FPS = ~16ms)
    pub tick_rate_ms: u64,

    pub api_base_url: String,

    /// Deadline for the startup connectivity probe
    pub probe_timeout_ms: u64,

    /// Client-side timeout for encode/decode requests
    pub request_timeout_ms: u64,

    /// How long an errored input stays flagged
    pub error_flag_ms: u64,

    pub status_timeout_ms: u64,

    /// "Copied!" on the copy-to-decode label
    pub copy_to_decode_ack_ms: u64,

    pub decode_flash_ms: u64,

    /// Highlight after clicking a cell in the ID view
    pub id_copy_ack_ms: u64,

    /// Highlight after clicking a cell in the text view
    pub text_copy_ack_ms: u64,

    pub log_file: PathBuf,

    pub preferences_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate_ms: 16,
            api_base_url: "http://localhost:8080".to_string(),
            probe_timeout_ms: 2000,
            request_timeout_ms: 30_000,
            error_flag_ms: 2000,
            status_timeout_ms: 3000,
            copy_to_decode_ack_ms: 2000,
            decode_flash_ms: 1000,
            id_copy_ack_ms: 300,
            text_copy_ack_ms: 1000,
            log_file: PathBuf::from("tokenizer-tui.log"),
            preferences_path: None,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file if given, then CLI flags.
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(url) = &cli.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(path) = &cli.log_file {
            config.log_file = path.clone();
        }
        if let Some(path) = &cli.prefs {
            config.preferences_path = Some(path.clone());
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Number of ticks covering `ms`, at least one.
    pub fn ticks(&self, ms: u64) -> u64 {
        ms.div_ceil(self.tick_rate_ms.max(1)).max(1)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.preferences_path
            .clone()
            .unwrap_or_else(PreferenceStore::default_path)
    }
}

/// Key hints shown in the footer
pub const KEY_HINTS: &[(&str, &str)] = &[
    ("Enter", "submit"),
    ("Tab", "focus"),
    ("F2", "ids/text"),
    ("F3", "theme"),
    ("F4", "copy to decode"),
    ("Esc", "quit"),
];
