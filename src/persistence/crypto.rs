//! Encryption envelope for persisted records
//!
//! Records are sealed with AES-256-GCM. The key is the SHA-256 digest of the
//! caller's secret, a fresh 12-byte nonce is drawn per call, and the stored
//! string is `base64(nonce || ciphertext || tag)`. A wrong secret fails
//! authentication instead of producing garbage.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::CipherError;

/// Symmetric, secret-keyed string transform.
pub trait Cipher {
    fn encrypt(&self, plaintext: &str, secret: &str) -> Result<String, CipherError>;
    fn decrypt(&self, ciphertext: &str, secret: &str) -> Result<String, CipherError>;
}

const NONCE_LEN: usize = 12;

/// AES-256-GCM with a SHA-256 derived key
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmCipher;

impl AesGcmCipher {
    fn cipher_for(secret: &str) -> Aes256Gcm {
        let key: [u8; 32] = Sha256::digest(secret.as_bytes()).into();
        Aes256Gcm::new(&key.into())
    }
}

impl Cipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str, secret: &str) -> Result<String, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = Self::cipher_for(secret)
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    fn decrypt(&self, ciphertext: &str, secret: &str) -> Result<String, CipherError> {
        let sealed = STANDARD.decode(ciphertext.trim())?;
        if sealed.len() <= NONCE_LEN {
            return Err(CipherError::Truncated);
        }

        let (nonce_bytes, body) = sealed.split_at(NONCE_LEN);
        let plaintext = Self::cipher_for(secret)
            .decrypt(Nonce::from_slice(nonce_bytes), body)
            .map_err(|_| CipherError::Decrypt)?;

        Ok(String::from_utf8(plaintext)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let cipher = AesGcmCipher;
        let sealed = cipher.encrypt(r#"{"name":"Ada"}"#, "pw").unwrap();

        assert_ne!(sealed, r#"{"name":"Ada"}"#);
        assert!(!sealed.contains("Ada"));
        assert_eq!(cipher.decrypt(&sealed, "pw").unwrap(), r#"{"name":"Ada"}"#);
    }

    #[test]
    fn test_nonce_differs_per_call() {
        let cipher = AesGcmCipher;
        let a = cipher.encrypt("same", "pw").unwrap();
        let b = cipher.encrypt("same", "pw").unwrap();

        assert_ne!(a, b);
        assert_eq!(cipher.decrypt(&a, "pw").unwrap(), cipher.decrypt(&b, "pw").unwrap());
    }

    #[test]
    fn test_wrong_secret_fails() {
        let cipher = AesGcmCipher;
        let sealed = cipher.encrypt("payload", "right").unwrap();
        assert!(matches!(cipher.decrypt(&sealed, "wrong"), Err(CipherError::Decrypt)));
    }

    #[test]
    fn test_rejects_garbage() {
        let cipher = AesGcmCipher;
        assert!(matches!(cipher.decrypt("%%%", "pw"), Err(CipherError::Encoding(_))));
        assert!(matches!(
            cipher.decrypt(&STANDARD.encode([0u8; 4]), "pw"),
            Err(CipherError::Truncated)
        ));
        // Plain JSON left over from before encryption was enabled
        assert!(cipher.decrypt(r#"{"name":"Ada"}"#, "pw").is_err());
    }
}
