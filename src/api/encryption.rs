//! Password envelope encryption for the login call.
//!
//! The server hands out an RSA public key (base64 of a PEM document) and a key id
//! during sync. The password is sealed with a fresh AES-256-GCM session key, the
//! session key is sealed with RSA PKCS#1 v1.5, and both travel in one binary
//! envelope:
//!
//! ```text
//! 0x01 | key_id | iv[12] | rsa_len (u16 LE) | rsa(session key) | tag[16] | ciphertext
//! ```

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Envelope format version understood by the server.
pub const ENVELOPE_VERSION: u8 = 1;

/// Password format version placed in the `enc_password` prefix.
pub const PASSWORD_FORMAT_VERSION: u8 = 4;

const IV_SIZE: usize = 12;
const KEY_SIZE: usize = 32;
const TAG_SIZE: usize = 16;

/// Encrypt a password and return the base64 envelope.
pub fn encrypt_password(
    password: &str,
    public_key_b64: &str,
    key_id: u8,
    timestamp: &str,
) -> Result<String> {
    let pem_bytes = STANDARD
        .decode(public_key_b64.trim())
        .map_err(|e| Error::Encryption(format!("Public key is not base64: {}", e)))?;
    let pem = String::from_utf8(pem_bytes)
        .map_err(|e| Error::Encryption(format!("Public key is not UTF-8 PEM: {}", e)))?;
    let public_key = RsaPublicKey::from_public_key_pem(&pem)
        .map_err(|e| Error::Encryption(format!("Invalid public key: {}", e)))?;

    let mut rng = rand::thread_rng();
    let mut session_key = Zeroizing::new([0u8; KEY_SIZE]);
    rng.fill_bytes(&mut session_key[..]);
    let mut iv = [0u8; IV_SIZE];
    rng.fill_bytes(&mut iv);

    let rsa_encrypted = public_key
        .encrypt(&mut rng, Pkcs1v15Encrypt, &session_key[..])
        .map_err(|e| Error::Encryption(format!("RSA encryption failed: {}", e)))?;

    let cipher = Aes256Gcm::new_from_slice(&session_key[..])
        .map_err(|e| Error::Encryption(format!("Invalid session key: {}", e)))?;
    let sealed = cipher
        .encrypt(
            Nonce::from_slice(&iv),
            Payload {
                msg: password.as_bytes(),
                aad: timestamp.as_bytes(),
            },
        )
        .map_err(|_| Error::Encryption("AES-GCM encryption failed".into()))?;

    // aes-gcm appends the tag to the ciphertext; the envelope wants it first
    let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_SIZE);

    let rsa_len = u16::try_from(rsa_encrypted.len())
        .map_err(|_| Error::Encryption("RSA block too large".into()))?;

    let mut envelope =
        Vec::with_capacity(2 + IV_SIZE + 2 + rsa_encrypted.len() + TAG_SIZE + ciphertext.len());
    envelope.push(ENVELOPE_VERSION);
    envelope.push(key_id);
    envelope.extend_from_slice(&iv);
    envelope.extend_from_slice(&rsa_len.to_le_bytes());
    envelope.extend_from_slice(&rsa_encrypted);
    envelope.extend_from_slice(tag);
    envelope.extend_from_slice(ciphertext);

    Ok(STANDARD.encode(envelope))
}

/// Build the `enc_password` form value.
pub fn format_enc_password(timestamp: &str, envelope: &str) -> String {
    format!(
        "#PWD_INSTAGRAM:{}:{}:{}",
        PASSWORD_FORMAT_VERSION, timestamp, envelope
    )
}
