//! Password-based encryption of configuration files
//!
//! The configuration set is serialized to JSON and sealed with AES-256-GCM.
//! The key is derived from the password with Argon2id using a random salt.
//! Salt, nonce and ciphertext are stored hex-encoded in a small JSON
//! envelope so encrypted files can be committed and shared as text.

use std::fs;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::Argon2;
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{EnvCheckError, Result};
use crate::format::{self, EnvFormat};
use crate::schema::ConfigurationSet;

/// Shortest password accepted for encryption
pub const MIN_KEY_LENGTH: usize = 8;

/// Envelope layout version written by this crate
pub const ENVELOPE_VERSION: u32 = 1;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

/// Encrypted configuration as stored on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    pub version: u32,
    /// Argon2id salt, hex
    pub salt: String,
    /// AES-GCM nonce, hex
    pub nonce: String,
    /// Ciphertext with authentication tag, hex
    pub ciphertext: String,
}

impl EncryptedEnvelope {
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content.trim())
            .map_err(|e| EnvCheckError::Decryption(format!("not an encrypted env-check file: {e}")))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// AES-256-GCM primitives
pub struct Encryptor;

impl Encryptor {
    /// Encrypt `data`, returning the ciphertext and the random nonce used
    pub fn encrypt(data: &[u8], key: &[u8; 32]) -> Result<(Vec<u8>, [u8; NONCE_LEN])> {
        let cipher = Aes256Gcm::new(key.into());
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, data)
            .map_err(|e| EnvCheckError::Encryption(e.to_string()))?;

        Ok((ciphertext, nonce_bytes))
    }

    pub fn decrypt(ciphertext: &[u8], key: &[u8; 32], nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new(key.into());
        let nonce = Nonce::from_slice(nonce);

        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| EnvCheckError::Decryption("invalid key or corrupted file".to_string()))
    }

    /// Derive a 32-byte key from a password and salt using Argon2id
    pub fn derive_key(password: &SecretString, salt: &[u8]) -> Result<[u8; 32]> {
        let mut key = [0u8; 32];
        Argon2::default()
            .hash_password_into(password.expose_secret().as_bytes(), salt, &mut key)
            .map_err(|e| EnvCheckError::Encryption(format!("key derivation failed: {e}")))?;
        Ok(key)
    }
}

/// Encrypt a configuration set with a password
pub fn encrypt_config(config: &ConfigurationSet, password: &SecretString) -> Result<EncryptedEnvelope> {
    if password.expose_secret().chars().count() < MIN_KEY_LENGTH {
        return Err(EnvCheckError::KeyTooShort { min: MIN_KEY_LENGTH });
    }

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let key = Encryptor::derive_key(password, &salt)?;

    let plaintext = serde_json::to_vec(config)?;
    let (ciphertext, nonce) = Encryptor::encrypt(&plaintext, &key)?;

    Ok(EncryptedEnvelope {
        version: ENVELOPE_VERSION,
        salt: hex::encode(salt),
        nonce: hex::encode(nonce),
        ciphertext: hex::encode(ciphertext),
    })
}

/// Decrypt an envelope produced by [`encrypt_config`]
pub fn decrypt_envelope(envelope: &EncryptedEnvelope, password: &SecretString) -> Result<ConfigurationSet> {
    if envelope.version != ENVELOPE_VERSION {
        return Err(EnvCheckError::Decryption(format!(
            "unsupported envelope version {}",
            envelope.version
        )));
    }

    let salt = decode_hex("salt", &envelope.salt)?;
    let nonce: [u8; NONCE_LEN] = decode_hex("nonce", &envelope.nonce)?
        .try_into()
        .map_err(|_| EnvCheckError::Decryption(format!("nonce must be {NONCE_LEN} bytes")))?;
    let ciphertext = decode_hex("ciphertext", &envelope.ciphertext)?;

    let key = Encryptor::derive_key(password, &salt)?;
    let plaintext = Encryptor::decrypt(&ciphertext, &key, &nonce)?;

    serde_json::from_slice(&plaintext)
        .map_err(|e| EnvCheckError::Decryption(format!("decrypted payload is not a configuration: {e}")))
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value).map_err(|e| EnvCheckError::Decryption(format!("invalid {field}: {e}")))
}

/// `<file>.enc`
pub fn default_encrypted_path(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_owned();
    name.push(".enc");
    PathBuf::from(name)
}

/// The source path without its last extension, or `<file>.dec` when it has none
pub fn default_decrypted_path(source: &Path) -> PathBuf {
    let stripped = source.with_extension("");
    if stripped == source {
        let mut name = source.as_os_str().to_owned();
        name.push(".dec");
        PathBuf::from(name)
    } else {
        stripped
    }
}

/// Encrypt a configuration file.
///
/// Returns the path written, `<source>.enc` unless `output` is given.
pub fn encrypt_file(source: &Path, password: &SecretString, output: Option<&Path>) -> Result<PathBuf> {
    let config = format::load(source)?;
    let envelope = encrypt_config(&config, password)?;

    let out = output.map(Path::to_path_buf).unwrap_or_else(|| default_encrypted_path(source));
    fs::write(&out, envelope.to_json_pretty()?)?;
    tracing::info!(source = %source.display(), output = %out.display(), variables = config.len(), "encrypted configuration");
    Ok(out)
}

/// Decrypt a file written by [`encrypt_file`].
///
/// The output format follows the output path's extension.
pub fn decrypt_file(source: &Path, password: &SecretString, output: Option<&Path>) -> Result<PathBuf> {
    if !source.is_file() {
        return Err(EnvCheckError::NotFound {
            path: source.to_path_buf(),
        });
    }
    let envelope = EncryptedEnvelope::from_json_str(&fs::read_to_string(source)?)?;
    let config = decrypt_envelope(&envelope, password)?;

    let out = output.map(Path::to_path_buf).unwrap_or_else(|| default_decrypted_path(source));
    format::save(&config, &out, EnvFormat::from_path(&out))?;
    tracing::info!(source = %source.display(), output = %out.display(), variables = config.len(), "decrypted configuration");
    Ok(out)
}
