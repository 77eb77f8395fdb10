use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "chat.toml";
pub const DEFAULT_TYPING_STOP_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub socket_url: String,
    pub socket_path: String,
    pub typing_stop_delay_ms: u64,
    pub event_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".into(),
            socket_url: "http://localhost:8000".into(),
            socket_path: "/ws".into(),
            typing_stop_delay_ms: DEFAULT_TYPING_STOP_DELAY_MS,
            event_buffer: 256,
        }
    }
}

impl ClientConfig {
    pub fn typing_stop_delay(&self) -> Duration {
        Duration::from_millis(self.typing_stop_delay_ms)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_url: Option<String>,
    socket_url: Option<String>,
    socket_path: Option<String>,
    typing_stop_delay_ms: Option<u64>,
    event_buffer: Option<usize>,
}

/// Defaults, then the TOML file, then `CHAT_*` environment variables.
///
/// An explicit `path` must exist; without one, `chat.toml` in the working
/// directory is read when present.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::default();

    let raw = match path {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?,
        ),
        None => fs::read_to_string(DEFAULT_CONFIG_FILE).ok(),
    };
    if let Some(raw) = raw {
        apply_file(&mut config, &raw)?;
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn apply_file(config: &mut ClientConfig, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileConfig = toml::from_str(raw).context("invalid client config file")?;
    if let Some(v) = file_cfg.api_url {
        config.api_url = v;
    }
    if let Some(v) = file_cfg.socket_url {
        config.socket_url = v;
    }
    if let Some(v) = file_cfg.socket_path {
        config.socket_path = v;
    }
    if let Some(v) = file_cfg.typing_stop_delay_ms {
        config.typing_stop_delay_ms = v;
    }
    if let Some(v) = file_cfg.event_buffer {
        config.event_buffer = v.max(1);
    }
    Ok(())
}

fn apply_env_overrides(config: &mut ClientConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("CHAT_API_URL") {
        config.api_url = v;
    }
    if let Some(v) = lookup("CHAT_SOCKET_URL") {
        config.socket_url = v;
    }
    if let Some(v) = lookup("CHAT_SOCKET_PATH") {
        config.socket_path = v;
    }
    if let Some(v) = lookup("CHAT_TYPING_STOP_DELAY_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            config.typing_stop_delay_ms = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
