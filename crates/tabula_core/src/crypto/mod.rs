//! Password-based content encryption for Tabula.
//!
//! Every entry of a password-protected database is stored as printable
//! base64 text of an AES-256-CBC ciphertext. Key and IV come from PBKDF2
//! over the password.
//!
//! ## Key Derivation
//!
//! - [`KeyDerivation::Salted`] (default): PBKDF2-HMAC-SHA256 with a fresh
//!   random salt per encryption, stored in front of the ciphertext
//! - [`KeyDerivation::Legacy`]: PBKDF2-HMAC-SHA1, 1000 rounds, with the
//!   password's own bytes as salt. Only for reading and writing databases
//!   created by older releases; a salt derived from the secret adds nothing
//!
//! ## Usage
//!
//! ```rust
//! use tabula_core::crypto::{KeyDerivation, Password, PasswordCodec};
//!
//! let codec = PasswordCodec::new(Password::new("hunter2"), KeyDerivation::Salted, 1_000);
//! let ciphertext = codec.encrypt("secret data");
//! assert_eq!(codec.decrypt(&ciphertext).unwrap(), "secret data");
//! ```

mod codec;
mod password;

pub use codec::{KeyDerivation, PasswordCodec, IV_SIZE, KEY_SIZE, LEGACY_ROUNDS, SALT_SIZE};
pub use password::Password;
