use anyhow::{Context, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Deserialize;
use std::sync::Arc;

use crate::audio::AudioDevices;
use crate::cli::Cli;
use crate::session::SessionConfig;
use crate::tls::{ClientIdentity, TlsPolicy};
use crate::transport::Credentials;

/// Prefix of generated usernames.
pub const USERNAME_PREFIX: &str = "rcs7100-";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub address: String,
}

/// Accepts the camelCase keys of older config files; the loader may hand
/// them over lowercased.
#[derive(Debug, Default, Deserialize)]
pub struct AudioConfig {
    #[serde(default, alias = "playbackDevice", alias = "playbackdevice")]
    pub playback_device: String,
    #[serde(default, alias = "captureDevice", alias = "capturedevice")]
    pub capture_device: String,
}

impl Config {
    /// Load from `path` (YAML, extension optional), with `RCS7100_*`
    /// environment overrides such as `RCS7100_SERVER__ADDRESS`.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("RCS7100")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("fatal error config file: {}", path))?;

        Ok(settings.try_deserialize()?)
    }

    /// Combine the file settings with the command line into a session
    /// configuration. Loads the client certificate if one was given.
    pub fn session_config(self, cli: &Cli) -> Result<SessionConfig> {
        let username = if cli.username.is_empty() {
            generate_username()?
        } else {
            cli.username.clone()
        };

        let client_identity = match &cli.certificate {
            Some(path) => Some(Arc::new(ClientIdentity::load_pem(path)?)),
            None => None,
        };

        Ok(SessionConfig {
            address: self.server.address,
            channel_name: cli.channel.clone(),
            credentials: Credentials {
                username,
                password: cli.password.clone(),
            },
            tls: TlsPolicy {
                insecure_skip_verify: cli.insecure,
                client_identity,
            },
            devices: AudioDevices {
                playback_device: self.audio.playback_device,
                capture_device: self.audio.capture_device,
            },
            ..SessionConfig::default()
        })
    }
}

/// Random username: six bytes from the OS generator with the
/// locally-administered bit set, as twelve lowercase hex digits.
pub fn generate_username() -> Result<String> {
    let mut buf = [0u8; 6];
    OsRng
        .try_fill_bytes(&mut buf)
        .context("Failed to read random bytes for username")?;

    buf[0] |= 0x02;

    let hex: String = buf.iter().map(|b| format!("{:02x}", b)).collect();
    Ok(format!("{}{}", USERNAME_PREFIX, hex))
}
