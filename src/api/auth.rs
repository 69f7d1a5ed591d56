//! Device identity generation and request signing utilities.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use rand::Rng;
use sha2::Sha256;

/// Seed mixed into device id generation.
const VOLATILE_SEED: &str = "12345";

/// Turns a compact JSON payload into the value of the `signed_body` field.
pub trait RequestSigner: Send + Sync {
    fn sign(&self, payload: &str) -> String;
}

/// Signer producing `SIGNATURE.<payload>`, the form the official app currently
/// sends when no signature key is bundled.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderSigner;

impl RequestSigner for PlaceholderSigner {
    fn sign(&self, payload: &str) -> String {
        format!("SIGNATURE.{}", payload)
    }
}

/// Signer producing `<hex hmac-sha256>.<payload>` with a known signature key.
#[derive(Clone)]
pub struct HmacSigner {
    key: Vec<u8>,
}

impl HmacSigner {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }
}

impl RequestSigner for HmacSigner {
    fn sign(&self, payload: &str) -> String {
        // HMAC accepts keys of any length, so this never fails.
        let mut mac =
            Hmac::<Sha256>::new_from_slice(&self.key).expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        format!("{}.{}", hex::encode(mac.finalize().into_bytes()), payload)
    }
}

/// Wrap a signed payload into the form fields of a POST body.
pub fn signed_form(signer: &dyn RequestSigner, payload: &str) -> BTreeMap<String, String> {
    let mut form = BTreeMap::new();
    form.insert("signed_body".to_string(), signer.sign(payload));
    form
}

/// Compute the `jazoest` checksum: "2" followed by the sum of the input bytes.
pub fn jazoest(input: &str) -> String {
    let sum: u64 = input.bytes().map(u64::from).sum();
    format!("2{}", sum)
}

/// Hex MD5 digest of the input.
pub fn md5_hex(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Derive the `android-XXXXXXXXXXXXXXXX` device id from a seed.
pub fn generate_device_id(seed: &str) -> String {
    let hash = md5_hex(&format!("{}{}", seed, VOLATILE_SEED));
    format!("android-{}", &hash[..16])
}

/// Random v4 UUID in its hyphenated form.
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Pigeon session id sent with most requests.
pub fn generate_pigeon_session_id() -> String {
    format!("UFS-{}-0", generate_uuid())
}

/// Random ten digit number used in upload entity names.
pub fn random_entity_number() -> u64 {
    rand::thread_rng().gen_range(1_000_000_000..10_000_000_000)
}

/// Current unix time in seconds.
pub fn unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Current unix time in milliseconds.
pub fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Raw client time in the `seconds.millis` form of `X-Pigeon-Rawclienttime`.
pub fn raw_client_time() -> String {
    let ms = unix_millis();
    format!("{}.{:03}", ms / 1000, ms % 1000)
}

/// Check if the X-Mid token expired. A negative expiry means it was never fetched.
pub fn is_xmid_expired(expiry: i64) -> bool {
    expiry < 0 || unix_seconds() >= expiry
}
