/**
 * Payload Cipher
 *
 * ChaCha20-Poly1305 sealing for the values that travel inside tokens and
 * links: session payloads, verification payloads, password reset tokens and
 * organization API keys.
 *
 * # Format
 *
 * `base64url_no_pad(nonce (12 bytes) || ciphertext || tag)`
 *
 * The key is the application secret, zero-padded or truncated to 32 bytes.
 * Every way an input can fail to open (bad base64, too short, tag mismatch,
 * bad JSON) is reported as the same [`DecryptError`].
 */

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("payload could not be decrypted")]
pub struct DecryptError;

#[derive(Debug, Error)]
#[error("payload could not be encrypted: {0}")]
pub struct EncryptError(String);

#[derive(Clone)]
pub struct PayloadCipher {
    key: [u8; 32],
}

impl std::fmt::Debug for PayloadCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadCipher").finish_non_exhaustive()
    }
}

impl PayloadCipher {
    pub fn new(secret: &str) -> Self {
        let mut key = [0u8; 32];
        let bytes = secret.as_bytes();
        let len = bytes.len().min(key.len());
        key[..len].copy_from_slice(&bytes[..len]);
        Self { key }
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.key))
    }

    /// Seal raw bytes under a fresh random nonce.
    pub fn seal(&self, plaintext: &[u8]) -> Result<String, EncryptError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher()
            .encrypt(nonce, plaintext)
            .map_err(|e| EncryptError(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    pub fn open(&self, sealed: &str) -> Result<Vec<u8>, DecryptError> {
        let data = URL_SAFE_NO_PAD.decode(sealed.trim()).map_err(|_| DecryptError)?;
        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(DecryptError);
        }
        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        self.cipher()
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| DecryptError)
    }

    /// Serialize `payload` as JSON and seal it.
    pub fn encrypt<T: Serialize>(&self, payload: &T) -> Result<String, EncryptError> {
        let json = serde_json::to_vec(payload).map_err(|e| EncryptError(e.to_string()))?;
        self.seal(&json)
    }

    pub fn decrypt<T: DeserializeOwned>(&self, sealed: &str) -> Result<T, DecryptError> {
        let plaintext = self.open(sealed)?;
        serde_json::from_slice(&plaintext).map_err(|_| DecryptError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Payload {
        user_id: String,
        organization_id: Option<String>,
    }

    fn payload() -> Payload {
        Payload {
            user_id: "u-1".to_string(),
            organization_id: Some("o-1".to_string()),
        }
    }

    #[test]
    fn test_encrypt_then_decrypt() {
        let cipher = PayloadCipher::new(SECRET);
        let sealed = cipher.encrypt(&payload()).unwrap();
        assert!(!sealed.contains("u-1"));
        assert!(!sealed.contains('='));
        let opened: Payload = cipher.decrypt(&sealed).unwrap();
        assert_eq!(opened, payload());
    }

    #[test]
    fn test_nonce_is_random() {
        let cipher = PayloadCipher::new(SECRET);
        assert_ne!(cipher.encrypt(&payload()).unwrap(), cipher.encrypt(&payload()).unwrap());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let cipher = PayloadCipher::new(SECRET);
        let sealed = cipher.encrypt(&payload()).unwrap();
        let mut raw = URL_SAFE_NO_PAD.decode(&sealed).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = URL_SAFE_NO_PAD.encode(raw);
        assert_eq!(cipher.decrypt::<Payload>(&tampered), Err(DecryptError));
    }

    #[test]
    fn test_truncated_and_garbage_input_fail() {
        let cipher = PayloadCipher::new(SECRET);
        let sealed = cipher.encrypt(&payload()).unwrap();
        assert_eq!(cipher.decrypt::<Payload>(&sealed[..10]), Err(DecryptError));
        assert_eq!(cipher.decrypt::<Payload>("not base64 !!"), Err(DecryptError));
        assert_eq!(cipher.decrypt::<Payload>(""), Err(DecryptError));
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = PayloadCipher::new(SECRET).encrypt(&payload()).unwrap();
        let other = PayloadCipher::new("another-secret-another-secret-xx");
        assert_eq!(other.decrypt::<Payload>(&sealed), Err(DecryptError));
    }

    #[test]
    fn test_wrong_shape_fails() {
        let cipher = PayloadCipher::new(SECRET);
        let sealed = cipher.encrypt(&vec![1, 2, 3]).unwrap();
        assert_eq!(cipher.decrypt::<Payload>(&sealed), Err(DecryptError));
    }

    #[test]
    fn test_long_secret_is_truncated() {
        let long = format!("{}{}", SECRET, "tail-ignored");
        let sealed = PayloadCipher::new(&long).encrypt(&payload()).unwrap();
        let opened: Payload = PayloadCipher::new(SECRET).decrypt(&sealed).unwrap();
        assert_eq!(opened, payload());
    }
}
