//! Process settings loaded via OrthoConfig.
//!
//! Values come from `CHECKIN_*` environment variables, configuration files
//! and command-line flags, in OrthoConfig's usual precedence order.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use actix_web::cookie::{Key, SameSite};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use tracing::warn;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Settings controlling the HTTP listener, persistence and session cookies.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CHECKIN")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string; absent means the in-memory store.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub pool_max_size: Option<u32>,
    /// File holding the session cookie master key.
    pub session_key_file: Option<PathBuf>,
    /// Mark session cookies `Secure`; defaults to on.
    pub cookie_secure: Option<bool>,
    /// `SameSite` policy for the session cookie.
    pub same_site: Option<String>,
    /// Fall back to a random session key when the key file is unreadable.
    #[ortho_config(default = false)]
    pub allow_ephemeral_session_key: bool,
}

/// Errors raised while turning settings into server configuration.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid same_site value '{value}'; expected {SAMESITE_EXPECTED}")]
    SameSite { value: String },
    #[error("same_site=None requires cookie_secure")]
    InsecureSameSiteNone,
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
}

impl ServerSettings {
    /// Listener address, falling back to `0.0.0.0:8080`.
    ///
    /// # Errors
    /// Returns [`SettingsError::BindAddr`] when the value does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    /// Pool size, falling back to 10.
    #[must_use]
    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }

    /// Whether session cookies are marked `Secure`.
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure.unwrap_or(true)
    }

    /// Session key path, falling back to the mounted secret location.
    #[must_use]
    pub fn session_key_file(&self) -> &Path {
        self.session_key_file
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_SESSION_KEY_FILE))
    }

    /// `SameSite` policy, defaulting to `Lax`.
    ///
    /// # Errors
    /// Rejects unknown values and `None` without a secure cookie.
    pub fn same_site(&self) -> Result<SameSite, SettingsError> {
        let Some(raw) = self.same_site.as_deref().map(str::trim) else {
            return Ok(SameSite::Lax);
        };
        let same_site = match raw.to_ascii_lowercase().as_str() {
            "strict" => SameSite::Strict,
            "lax" => SameSite::Lax,
            "none" => SameSite::None,
            _ => {
                return Err(SettingsError::SameSite {
                    value: raw.to_owned(),
                });
            }
        };
        if same_site == SameSite::None && !self.cookie_secure() {
            return Err(SettingsError::InsecureSameSiteNone);
        }
        Ok(same_site)
    }

    /// Load the session signing key.
    ///
    /// An unreadable key file is fatal unless this is a debug build or
    /// `allow_ephemeral_session_key` is set, in which case a random key is
    /// generated and every restart invalidates existing sessions.
    ///
    /// # Errors
    /// Returns [`SettingsError`] when the key cannot be read or is too short.
    pub fn session_key(&self) -> Result<Key, SettingsError> {
        let path = self.session_key_file();
        match std::fs::read(path) {
            Ok(bytes) if bytes.len() < SESSION_KEY_MIN_LEN => Err(SettingsError::KeyTooShort {
                path: path.to_path_buf(),
                length: bytes.len(),
                min_len: SESSION_KEY_MIN_LEN,
            }),
            Ok(bytes) => Ok(Key::derive_from(&bytes)),
            Err(source) if cfg!(debug_assertions) || self.allow_ephemeral_session_key => {
                warn!(path = %path.display(), error = %source, "using temporary session key");
                Ok(Key::generate())
            }
            Err(source) => Err(SettingsError::KeyRead {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
