//! AES-256-GCM sealing for secrets stored in the grant database.
//!
//! Every value gets its own random nonce. The master key is 32 bytes,
//! base64-encoded, and comes from `UPNAFESTA_ENCRYPTION_KEY`.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Size of the encryption key in bytes (256 bits)
const KEY_SIZE: usize = 32;

/// Size of the nonce in bytes (96 bits, standard for GCM)
const NONCE_SIZE: usize = 12;

/// Seals and opens secrets with a single master key.
pub struct TokenCipher {
    cipher: Aes256Gcm,
}

impl TokenCipher {
    /// Builds a cipher from a base64-encoded 32-byte key.
    ///
    /// # Errors
    /// - Key is not valid base64
    /// - Decoded key is not exactly 32 bytes
    pub fn from_base64(key_base64: &str) -> Result<Self> {
        let key_bytes = BASE64
            .decode(key_base64.trim())
            .context("Failed to decode base64 encryption key")?;

        if key_bytes.len() != KEY_SIZE {
            return Err(anyhow!(
                "Encryption key must be {} bytes (256 bits), got {} bytes",
                KEY_SIZE,
                key_bytes.len()
            ));
        }

        let cipher = Aes256Gcm::new_from_slice(&key_bytes)
            .map_err(|e| anyhow!("Failed to create cipher: {}", e))?;

        Ok(Self { cipher })
    }

    /// Encrypts `plaintext`, returning `(ciphertext, nonce)`, both base64.
    pub fn seal(&self, plaintext: &str) -> Result<(String, String)> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| anyhow!("Encryption failed: {}", e))?;

        Ok((BASE64.encode(&ciphertext), BASE64.encode(nonce)))
    }

    /// Decrypts a value produced by [`TokenCipher::seal`].
    ///
    /// Fails on a wrong key, a mismatched nonce or tampered ciphertext.
    pub fn open(&self, ciphertext: &str, nonce: &str) -> Result<String> {
        let ciphertext_bytes = BASE64
            .decode(ciphertext)
            .context("Failed to decode ciphertext")?;
        let nonce_bytes = BASE64.decode(nonce).context("Failed to decode nonce")?;

        if nonce_bytes.len() != NONCE_SIZE {
            return Err(anyhow!(
                "Invalid nonce size: expected {}, got {}",
                NONCE_SIZE,
                nonce_bytes.len()
            ));
        }

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext_bytes.as_ref())
            .map_err(|e| anyhow!("Decryption failed (wrong key or corrupted data): {}", e))?;

        String::from_utf8(plaintext).context("Decrypted data is not valid UTF-8")
    }

    /// Seals an optional value, keeping `None` as `(None, None)`.
    pub fn seal_optional(&self, plaintext: Option<&str>) -> Result<(Option<String>, Option<String>)> {
        match plaintext {
            Some(value) => {
                let (ciphertext, nonce) = self.seal(value)?;
                Ok((Some(ciphertext), Some(nonce)))
            }
            None => Ok((None, None)),
        }
    }

    /// Opens an optional sealed value. A ciphertext without nonce is treated as absent.
    pub fn open_optional(
        &self,
        ciphertext: Option<&str>,
        nonce: Option<&str>,
    ) -> Result<Option<String>> {
        match (ciphertext, nonce) {
            (Some(ciphertext), Some(nonce)) => self.open(ciphertext, nonce).map(Some),
            _ => Ok(None),
        }
    }
}
