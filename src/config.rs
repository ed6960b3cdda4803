//! Configuration for the encrypting overlay driver

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::obscure;
use crate::paths::clean_path;

/// Default filename encoding used by the cipher
pub const DEFAULT_FILENAME_ENCODING: &str = "base64";

/// Default suffix appended to encrypted file names
pub const DEFAULT_ENCRYPTED_SUFFIX: &str = ".bin";

/// Filename encryption mode understood by the cipher capability
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NameEncryptionMode {
    /// No name encryption; only the suffix is applied to files
    Off,
    /// Full standard name encryption
    Standard,
    /// Lightweight reversible obfuscation
    Obfuscate,
}

impl Default for NameEncryptionMode {
    fn default() -> Self {
        NameEncryptionMode::Standard
    }
}

/// Overlay driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptConfig {
    /// Cipher password (stored obscured after the first normalize)
    pub password: String,

    /// Cipher salt / second password (stored obscured after the first normalize)
    pub salt: String,

    /// File name encryption mode
    #[serde(default)]
    pub filename_encryption: NameEncryptionMode,

    /// Directory name encryption mode
    #[serde(default)]
    pub directory_name_encryption: NameEncryptionMode,

    /// Encoding for encrypted names ("base64", "base32", ...)
    #[serde(default)]
    pub filename_encoding: String,

    /// Suffix appended to encrypted file names, e.g. ".bin"
    #[serde(default)]
    pub encrypted_suffix: String,

    /// Root path on the remote backend under which ciphertext lives
    pub remote_path: String,

    /// Show logical entries whose decrypted name starts with a dot
    #[serde(default)]
    pub show_hidden: bool,

    /// Synthesize thumbnail URLs for file entries
    #[serde(default)]
    pub thumbnail: bool,
}

impl Default for CryptConfig {
    fn default() -> Self {
        CryptConfig {
            password: String::new(),
            salt: String::new(),
            filename_encryption: NameEncryptionMode::Standard,
            directory_name_encryption: NameEncryptionMode::Standard,
            filename_encoding: DEFAULT_FILENAME_ENCODING.to_string(),
            encrypted_suffix: DEFAULT_ENCRYPTED_SUFFIX.to_string(),
            remote_path: "/".to_string(),
            show_hidden: false,
            thumbnail: false,
        }
    }
}

impl CryptConfig {
    /// Load configuration from a JSON file, with environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("failed to read config file: {}", e)))?;

        let mut config: CryptConfig = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config file: {}", e)))?;

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(password) = std::env::var("VEILFS_PASSWORD") {
            if !password.is_empty() {
                self.password = password;
            }
        }
        if let Ok(salt) = std::env::var("VEILFS_SALT") {
            if !salt.is_empty() {
                self.salt = salt;
            }
        }
        if let Ok(remote) = std::env::var("VEILFS_REMOTE_PATH") {
            if !remote.is_empty() {
                self.remote_path = remote;
            }
        }
    }

    /// Save configuration to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| Error::Config(format!("failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Normalize the configuration: obscure credentials (idempotent),
    /// fill defaults, and clean the remote root path.
    ///
    /// Called once during driver initialization; safe to call again on
    /// an already-normalized config.
    pub fn normalize(&mut self) {
        obscure::obscure_in_place(&mut self.password);
        obscure::obscure_in_place(&mut self.salt);

        if self.filename_encoding.is_empty() {
            self.filename_encoding = DEFAULT_FILENAME_ENCODING.to_string();
        }
        if self.encrypted_suffix.is_empty() {
            self.encrypted_suffix = DEFAULT_ENCRYPTED_SUFFIX.to_string();
        }
        self.remote_path = clean_path(&self.remote_path);
    }

    /// Validate the configuration. Must be called after [`normalize`].
    ///
    /// [`normalize`]: CryptConfig::normalize
    pub fn validate(&self) -> Result<()> {
        let suffix_rule = Regex::new(r"^[.][A-Za-z0-9-_]{2,}$").expect("static regex");
        if !suffix_rule.is_match(&self.encrypted_suffix) {
            return Err(Error::Config(format!(
                "encrypted suffix {:?} is illegal, want a dot followed by 2+ of [A-Za-z0-9-_]",
                self.encrypted_suffix
            )));
        }
        Ok(())
    }

    /// Reveal the plaintext password for cipher construction.
    pub fn reveal_password(&self) -> Result<String> {
        obscure::reveal(&self.password)
    }

    /// Reveal the plaintext salt for cipher construction.
    pub fn reveal_salt(&self) -> Result<String> {
        obscure::reveal(&self.salt)
    }
}
