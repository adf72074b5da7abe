//! Catalog configuration.

use crate::crypto::{KeyDerivation, Password, PasswordCodec, LEGACY_ROUNDS};

/// Default PBKDF2 round count for [`KeyDerivation::Salted`].
pub const DEFAULT_KDF_ROUNDS: u32 = 10_000;

/// How a database's tables are read when it is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Every table is read and parsed while opening.
    #[default]
    Eager,
    /// Tables are registered empty and read on first access.
    Lazy,
}

/// Configuration shared by every database opened through a catalog.
#[derive(Debug, Clone)]
pub struct Config {
    /// How encryption keys are derived from passwords.
    pub key_derivation: KeyDerivation,

    /// PBKDF2 rounds for salted derivation. Legacy derivation always uses
    /// [`LEGACY_ROUNDS`].
    pub kdf_rounds: u32,

    /// Whether table content is written as indented JSON.
    pub pretty_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_derivation: KeyDerivation::Salted,
            kdf_rounds: DEFAULT_KDF_ROUNDS,
            pretty_json: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration that reads and writes databases produced by the
    /// password-salted legacy format.
    #[must_use]
    pub fn legacy() -> Self {
        Self {
            key_derivation: KeyDerivation::Legacy,
            kdf_rounds: LEGACY_ROUNDS,
            pretty_json: false,
        }
    }

    /// Sets the key derivation scheme.
    #[must_use]
    pub const fn key_derivation(mut self, value: KeyDerivation) -> Self {
        self.key_derivation = value;
        self
    }

    /// Sets the PBKDF2 round count for salted derivation.
    #[must_use]
    pub const fn kdf_rounds(mut self, rounds: u32) -> Self {
        self.kdf_rounds = rounds;
        self
    }

    /// Sets whether table content is pretty-printed.
    #[must_use]
    pub const fn pretty_json(mut self, value: bool) -> Self {
        self.pretty_json = value;
        self
    }

    /// Builds the content codec for `password` under this configuration.
    #[must_use]
    pub fn codec(&self, password: &str) -> PasswordCodec {
        PasswordCodec::new(
            Password::new(password),
            self.key_derivation,
            self.kdf_rounds,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.key_derivation, KeyDerivation::Salted);
        assert_eq!(config.kdf_rounds, DEFAULT_KDF_ROUNDS);
        assert!(!config.pretty_json);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .key_derivation(KeyDerivation::Legacy)
            .kdf_rounds(500)
            .pretty_json(true);

        assert_eq!(config.key_derivation, KeyDerivation::Legacy);
        assert_eq!(config.kdf_rounds, 500);
        assert!(config.pretty_json);
    }

    #[test]
    fn empty_password_codec_is_plaintext() {
        assert!(!Config::default().codec("").is_encrypting());
        assert!(Config::default().codec("secret").is_encrypting());
    }

    #[test]
    fn load_mode_defaults_to_eager() {
        assert_eq!(LoadMode::default(), LoadMode::Eager);
    }
}
