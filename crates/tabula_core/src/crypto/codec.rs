//! AES-256-CBC content codec keyed by PBKDF2.

use crate::crypto::password::Password;
use crate::error::{CoreError, CoreResult};
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::RngCore;
use sha1::Sha1;
use sha2::Sha256;
use zeroize::Zeroizing;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of the CBC initialization vector (the AES block size) in bytes.
pub const IV_SIZE: usize = 16;
/// Size of the random salt stored with salted ciphertexts.
pub const SALT_SIZE: usize = 16;
/// PBKDF2 rounds used by [`KeyDerivation::Legacy`].
pub const LEGACY_ROUNDS: u32 = 1000;

const BLOCK_SIZE: usize = 16;

/// How key and IV are derived from a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyDerivation {
    /// PBKDF2-HMAC-SHA1, [`LEGACY_ROUNDS`] rounds, salt = password bytes.
    ///
    /// Deterministic: the same password and text always give the same
    /// ciphertext.
    Legacy,
    /// PBKDF2-HMAC-SHA256 with a random [`SALT_SIZE`]-byte salt prepended
    /// to the ciphertext.
    #[default]
    Salted,
}

/// Encrypts and decrypts entry content with one password.
///
/// With an empty password the codec is the identity: [`encode`] and
/// [`decode`] return their input unchanged. [`encrypt`] and [`decrypt`]
/// always apply the cipher.
///
/// [`encode`]: PasswordCodec::encode
/// [`decode`]: PasswordCodec::decode
/// [`encrypt`]: PasswordCodec::encrypt
/// [`decrypt`]: PasswordCodec::decrypt
#[derive(Clone)]
pub struct PasswordCodec {
    password: Password,
    derivation: KeyDerivation,
    rounds: u32,
}

impl PasswordCodec {
    /// Creates a codec for `password`.
    ///
    /// `rounds` applies to [`KeyDerivation::Salted`] only.
    #[must_use]
    pub fn new(password: Password, derivation: KeyDerivation, rounds: u32) -> Self {
        Self {
            password,
            derivation,
            rounds: rounds.max(1),
        }
    }

    /// A codec that stores content as plain text.
    #[must_use]
    pub fn plaintext() -> Self {
        Self::new(Password::default(), KeyDerivation::default(), 1)
    }

    /// Returns `true` if content passing through this codec is encrypted.
    #[must_use]
    pub fn is_encrypting(&self) -> bool {
        !self.password.is_empty()
    }

    /// Returns the key derivation scheme.
    #[must_use]
    pub fn derivation(&self) -> KeyDerivation {
        self.derivation
    }

    /// Encrypts `text` if a password is set, otherwise returns it as is.
    #[must_use]
    pub fn encode(&self, text: &str) -> String {
        if self.is_encrypting() {
            self.encrypt(text)
        } else {
            text.to_string()
        }
    }

    /// Decrypts `content` if a password is set, otherwise returns it as is.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Decryption`] if the content is not a ciphertext
    /// produced under this password.
    pub fn decode(&self, content: &str) -> CoreResult<String> {
        if self.is_encrypting() {
            self.decrypt(content)
        } else {
            Ok(content.to_string())
        }
    }

    /// Encrypts `text` and returns base64 ciphertext.
    #[must_use]
    pub fn encrypt(&self, text: &str) -> String {
        match self.derivation {
            KeyDerivation::Legacy => {
                let material = self.derive(self.password.as_bytes());
                STANDARD.encode(seal(&material, text.as_bytes()))
            }
            KeyDerivation::Salted => {
                let mut salt = [0u8; SALT_SIZE];
                rand::thread_rng().fill_bytes(&mut salt);
                let material = self.derive(&salt);

                let mut out = salt.to_vec();
                out.extend(seal(&material, text.as_bytes()));
                STANDARD.encode(out)
            }
        }
    }

    /// Decrypts base64 ciphertext produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Decryption`] if the input is not base64, has the
    /// wrong length, fails padding validation (typically a wrong password)
    /// or does not decrypt to UTF-8.
    pub fn decrypt(&self, ciphertext: &str) -> CoreResult<String> {
        let raw = STANDARD
            .decode(ciphertext.trim())
            .map_err(|e| CoreError::decryption_failed(format!("invalid base64: {e}")))?;

        let plaintext = match self.derivation {
            KeyDerivation::Legacy => {
                let material = self.derive(self.password.as_bytes());
                open(&material, &raw)?
            }
            KeyDerivation::Salted => {
                if raw.len() < SALT_SIZE {
                    return Err(CoreError::decryption_failed("ciphertext too short"));
                }
                let (salt, body) = raw.split_at(SALT_SIZE);
                let material = self.derive(salt);
                open(&material, body)?
            }
        };

        String::from_utf8(plaintext.to_vec())
            .map_err(|_| CoreError::decryption_failed("plaintext is not valid UTF-8"))
    }

    fn derive(&self, salt: &[u8]) -> Zeroizing<[u8; KEY_SIZE + IV_SIZE]> {
        let mut material = Zeroizing::new([0u8; KEY_SIZE + IV_SIZE]);
        let password = self.password.as_bytes();
        match self.derivation {
            KeyDerivation::Legacy => {
                pbkdf2::pbkdf2_hmac::<Sha1>(password, salt, LEGACY_ROUNDS, &mut material[..]);
            }
            KeyDerivation::Salted => {
                pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, self.rounds, &mut material[..]);
            }
        }
        material
    }
}

impl std::fmt::Debug for PasswordCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCodec")
            .field("password", &self.password)
            .field("derivation", &self.derivation)
            .field("rounds", &self.rounds)
            .finish()
    }
}

fn split_material(material: &[u8; KEY_SIZE + IV_SIZE]) -> (Zeroizing<[u8; KEY_SIZE]>, [u8; IV_SIZE]) {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    let mut iv = [0u8; IV_SIZE];
    key.copy_from_slice(&material[..KEY_SIZE]);
    iv.copy_from_slice(&material[KEY_SIZE..]);
    (key, iv)
}

fn seal(material: &[u8; KEY_SIZE + IV_SIZE], plaintext: &[u8]) -> Vec<u8> {
    let (key, iv) = split_material(material);
    Aes256CbcEnc::new(&(*key).into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

fn open(material: &[u8; KEY_SIZE + IV_SIZE], ciphertext: &[u8]) -> CoreResult<Zeroizing<Vec<u8>>> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CoreError::decryption_failed(format!(
            "ciphertext length {} is not a positive multiple of {BLOCK_SIZE}",
            ciphertext.len()
        )));
    }

    let (key, iv) = split_material(material);
    Aes256CbcDec::new(&(*key).into(), &iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| CoreError::decryption_failed("invalid padding (wrong password?)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salted(password: &str) -> PasswordCodec {
        PasswordCodec::new(Password::new(password), KeyDerivation::Salted, 1000)
    }

    fn legacy(password: &str) -> PasswordCodec {
        PasswordCodec::new(Password::new(password), KeyDerivation::Legacy, 1)
    }

    #[test]
    fn salted_roundtrip() {
        let codec = salted("hunter2");
        let ciphertext = codec.encrypt("Hello, Tabula!");
        assert_ne!(ciphertext, "Hello, Tabula!");
        assert_eq!(codec.decrypt(&ciphertext).unwrap(), "Hello, Tabula!");
    }

    #[test]
    fn salted_ciphertexts_differ() {
        let codec = salted("hunter2");
        // Fresh salt per call
        assert_ne!(codec.encrypt("same data"), codec.encrypt("same data"));
    }

    #[test]
    fn legacy_is_deterministic() {
        let codec = legacy("hunter2");
        assert_eq!(codec.encrypt("same data"), codec.encrypt("same data"));
    }

    #[test]
    fn legacy_matches_known_vector() {
        // Produced by the password-salted format of earlier releases.
        let codec = legacy("correct horse");
        let expected = "ZzW4mk9w+pwi6GuDX8jQbnI0emkUQgUn5ICRikKU7T4=";
        assert_eq!(codec.encrypt("Data\r\nfeeding[UserData]"), expected);
        assert_eq!(codec.decrypt(expected).unwrap(), "Data\r\nfeeding[UserData]");
    }

    #[test]
    fn ciphertext_is_printable() {
        let text = salted("pw").encrypt("line one\nline two");
        assert!(text.chars().all(|c| c.is_ascii_alphanumeric() || "+/=".contains(c)));
    }

    #[test]
    fn wrong_password_never_returns_plaintext() {
        for codec in [salted("p1"), legacy("p1")] {
            let ciphertext = codec.encrypt("Data\r\nprofile[login]");
            let other = PasswordCodec::new(Password::new("p2"), codec.derivation(), 1000);
            match other.decrypt(&ciphertext) {
                Err(CoreError::Decryption { .. }) => {}
                Err(other) => panic!("unexpected error {other:?}"),
                Ok(text) => assert_ne!(text, "Data\r\nprofile[login]"),
            }
        }
    }

    #[test]
    fn corrupted_ciphertext_fails() {
        let codec = salted("pw");
        assert!(codec.decrypt("not base64 at all!").is_err());
        assert!(codec.decrypt("").is_err());
        // Salt only, no body
        assert!(codec.decrypt(&STANDARD.encode([0u8; SALT_SIZE])).is_err());
        // Body not a block multiple
        assert!(codec.decrypt(&STANDARD.encode([0u8; SALT_SIZE + 5])).is_err());
    }

    #[test]
    fn empty_plaintext_roundtrip() {
        let codec = salted("pw");
        let ciphertext = codec.encrypt("");
        assert_eq!(codec.decrypt(&ciphertext).unwrap(), "");
    }

    #[test]
    fn empty_password_encode_is_identity() {
        let codec = PasswordCodec::plaintext();
        assert!(!codec.is_encrypting());
        assert_eq!(codec.encode("plain"), "plain");
        assert_eq!(codec.decode("plain").unwrap(), "plain");
    }

    #[test]
    fn non_ascii_roundtrip() {
        let codec = salted("пароль");
        let text = "Frühstück 07:30 – 母乳";
        assert_eq!(codec.decrypt(&codec.encrypt(text)).unwrap(), text);
    }

    #[test]
    fn debug_hides_password() {
        let printed = format!("{:?}", salted("hunter2"));
        assert!(!printed.contains("hunter2"));
    }
}
