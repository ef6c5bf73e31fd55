//! Entry point for the Nautica remote console.
//!
//! Opens a session to a Nautica device and turns the terminal into a small
//! control console: every line typed on stdin is sent as one JSON packet,
//! and everything the device sends back is logged.
//!
//! # Usage
//!
//! ```text
//! nautica-remote [OPTIONS]
//!
//! Options:
//!   --config <PATH>              TOML config file
//!   --host <HOST>                Device host [default: 127.0.0.1]
//!   --port <PORT>                Device WebSocket port [default: 8300]
//!   --access-key <KEY>           Pre-shared key; selects the authenticated endpoint
//!   --reconnect-delay-ms <MS>    Local-variant reconnect delay [default: 1000]
//! ```
//!
//! Flags override values from `--config`.  The access key can also come from
//! `NAUTICA_ACCESS_KEY` so it does not end up in shell history.
//!
//! ```text
//! $ nautica-remote --host 10.0.0.5 --port 9000 --access-key K
//! {"id":"nr.list"}
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use nautica_core::{decode_packet, MessageKind};
use nautica_remote::domain::RemoteConfig;
use nautica_remote::infrastructure::RemoteSession;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Console client for a Nautica device's control WebSocket.
#[derive(Debug, Parser)]
#[command(
    name = "nautica-remote",
    about = "Console client for a Nautica device's control WebSocket",
    version
)]
struct Cli {
    /// TOML config file.  Missing fields fall back to defaults.
    #[arg(long, env = "NAUTICA_CONFIG")]
    config: Option<PathBuf>,

    /// Device host name or IP address.
    #[arg(long, env = "NAUTICA_HOST")]
    host: Option<String>,

    /// Device WebSocket port.
    #[arg(long, env = "NAUTICA_PORT")]
    port: Option<u16>,

    /// Pre-shared access key.  When set, the authenticated endpoint is used
    /// and the session does not reconnect on its own.
    #[arg(long, env = "NAUTICA_ACCESS_KEY", hide_env_values = true)]
    access_key: Option<String>,

    /// Delay before the local variant reconnects, in milliseconds.
    #[arg(long, env = "NAUTICA_RECONNECT_DELAY_MS")]
    reconnect_delay_ms: Option<u64>,
}

impl Cli {
    /// Loads the config file (if any) and applies the CLI overrides on top.
    ///
    /// # Errors
    ///
    /// Returns an error if `--config` names a file that cannot be read or
    /// parsed.
    fn into_remote_config(self) -> anyhow::Result<RemoteConfig> {
        let mut config = match &self.config {
            Some(path) => RemoteConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => RemoteConfig::default(),
        };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(access_key) = self.access_key {
            config.access_key = Some(access_key);
        }
        if let Some(delay) = self.reconnect_delay_ms {
            config.reconnect_delay_ms = delay;
        }

        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `RUST_LOG` controls verbosity; `info` when unset or invalid.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_remote_config()?;
    let target = config.target();
    info!("Nautica remote console starting, target={target:?}");

    let session = RemoteSession::spawn(config.session_config());

    session.on(MessageKind::List, |packet| match packet.servers() {
        Ok(servers) if servers.is_empty() => info!("device lists no servers"),
        Ok(servers) => {
            for server in servers {
                info!("server '{}' on node '{}' at {}", server.label, server.node, server.address());
            }
        }
        Err(e) => warn!("unexpected nr.list reply: {e}"),
    })?;
    session.on(MessageKind::Auth, |packet| match packet.is_ok() {
        Some(false) => warn!("authentication rejected"),
        _ => info!("authenticated"),
    })?;
    session.on_error(|content| error!("device error: {content}"))?;

    // Log every state change.
    let mut state = session.watch_state();
    tokio::spawn(async move {
        while state.changed().await.is_ok() {
            let current = *state.borrow_and_update();
            info!("connection state: {current}");
        }
    });

    session.connect(target)?;

    // ── Console loop ──────────────────────────────────────────────────────────
    //
    // Each stdin line is one packet.  The loop ends on Ctrl+C or stdin EOF.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line.context("failed to read stdin")? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match decode_packet(line.trim()) {
                    Ok(packet) => session.send(packet)?,
                    Err(e) => warn!("not a packet: {e}"),
                },
                None => {
                    info!("stdin closed");
                    break;
                }
            },
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("failed to listen for Ctrl+C signal: {e}");
                }
                info!("received Ctrl+C, shutting down");
                break;
            }
        }
    }

    session.disconnect()?;
    session.shutdown()?;

    info!("Nautica remote console stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use nautica_remote::domain::Target;

    #[test]
    fn test_cli_without_arguments_uses_config_defaults() {
        // Arrange: no flags, no file
        let cli = Cli::parse_from(["nautica-remote"]);

        // Act
        let config = cli.into_remote_config().unwrap();

        // Assert
        assert_eq!(config, RemoteConfig::default());
    }

    #[test]
    fn test_cli_host_and_port_override() {
        let cli = Cli::parse_from(["nautica-remote", "--host", "10.0.0.5", "--port", "9000"]);
        let config = cli.into_remote_config().unwrap();
        assert_eq!(config.target(), Target::local("10.0.0.5", 9000));
    }

    #[test]
    fn test_cli_access_key_selects_authenticated_target() {
        let cli = Cli::parse_from([
            "nautica-remote",
            "--host",
            "10.0.0.5",
            "--port",
            "9000",
            "--access-key",
            "K",
        ]);
        let config = cli.into_remote_config().unwrap();
        assert_eq!(config.target(), Target::authenticated("10.0.0.5", 9000, "K"));
    }

    #[test]
    fn test_cli_reconnect_delay_override() {
        let cli = Cli::parse_from(["nautica-remote", "--reconnect-delay-ms", "250"]);
        let config = cli.into_remote_config().unwrap();
        assert_eq!(config.reconnect_delay_ms, 250);
    }

    #[test]
    fn test_cli_flags_override_config_file() {
        // Arrange: a config file that sets port and host
        let path = std::env::temp_dir().join(format!("nautica-cli-{}.toml", std::process::id()));
        std::fs::write(&path, "host = \"10.0.0.9\"\nport = 9100\n").unwrap();
        let path_arg = path.to_string_lossy().to_string();

        // Act: override only the port on the command line
        let cli = Cli::parse_from(["nautica-remote", "--config", &path_arg, "--port", "9200"]);
        let config = cli.into_remote_config().unwrap();
        let _ = std::fs::remove_file(&path);

        // Assert: host from the file, port from the flag
        assert_eq!(config.host, "10.0.0.9");
        assert_eq!(config.port, 9200);
    }

    #[test]
    fn test_cli_missing_config_file_is_error() {
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/nautica.toml")),
            host: None,
            port: None,
            access_key: None,
            reconnect_delay_ms: None,
        };
        assert!(cli.into_remote_config().is_err());
    }

    #[test]
    fn test_cli_invalid_port_is_rejected_by_parser() {
        let result = Cli::try_parse_from(["nautica-remote", "--port", "70000"]);
        assert!(result.is_err());
    }
}
