// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Configuration for the room relay.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "relay", version, about = "Real-time room relay over WebSocket")]
pub struct RelayConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "RELAY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "RELAY_PORT")]
    pub port: u16,

    /// Heartbeat sweep period in milliseconds.
    #[arg(long, default_value_t = 15_000, env = "RELAY_HEARTBEAT_MS")]
    pub heartbeat_ms: u64,

    /// Largest inbound WebSocket message accepted, in bytes.
    #[arg(long, default_value_t = 65_536, env = "RELAY_MAX_FRAME_BYTES")]
    pub max_frame_bytes: usize,

    /// Longest chat message accepted, in characters.
    #[arg(long, default_value_t = 2000, env = "RELAY_MAX_MESSAGE_CHARS")]
    pub max_message_chars: usize,

    /// Log format (json or text).
    #[arg(long, default_value = "text", env = "RELAY_LOG_FORMAT")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "RELAY_LOG_LEVEL")]
    pub log_level: String,
}

impl RelayConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.heartbeat_ms == 0 {
            anyhow::bail!("--heartbeat-ms must be positive");
        }
        if self.max_frame_bytes == 0 {
            anyhow::bail!("--max-frame-bytes must be positive");
        }
        if self.max_message_chars == 0 {
            anyhow::bail!("--max-message-chars must be positive");
        }
        match self.log_format.as_str() {
            "json" | "text" => Ok(()),
            other => anyhow::bail!("unknown log format: {other} (expected json or text)"),
        }
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
