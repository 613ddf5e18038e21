//! HitPay webhook signature computation and verification.
//!
//! HitPay signs every notification with HMAC-SHA256 keyed by the merchant's
//! API salt. The signed message is built from the notification fields:
//!
//! 1. every field `k` with value `v` becomes the string `k‖v` (no separator)
//! 2. the pieces are ordered by key, byte-wise ascending
//! 3. the ordered pieces are concatenated with no delimiter
//!
//! The digest is sent hex-encoded in the `hmac` field, which the caller must
//! strip before verifying.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Name of the form field carrying the signature.
pub const SIGNATURE_FIELD: &str = "hmac";

/// Computes the hex-encoded signature of a field set.
///
/// Input order is irrelevant; fields are re-sorted by key.
pub fn sign<I, K, V>(secret: &[u8], fields: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    hex::encode(digest(secret, fields))
}

/// Recomputes the signature and compares it with `presented` in constant time.
///
/// `fields` must not contain the signature field itself.
pub fn verify<I, K, V>(secret: &[u8], fields: I, presented: &str) -> bool
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let presented = match hex::decode(presented.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let expected = digest(secret, fields);
    constant_time_compare(&expected, &presented)
}

fn digest<I, K, V>(secret: &[u8], fields: I) -> Vec<u8>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pieces: Vec<(String, String)> = fields
        .into_iter()
        .map(|(k, v)| {
            let key = k.as_ref().to_string();
            let piece = format!("{}{}", key, v.as_ref());
            (key, piece)
        })
        .collect();
    pieces.sort_by(|a, b| a.0.cmp(&b.0));

    let message: String = pieces.into_iter().map(|(_, piece)| piece).collect();

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Verifier bound to the merchant's API salt.
#[derive(Clone)]
pub struct SignatureVerifier {
    salt: SecretString,
}

impl SignatureVerifier {
    /// Creates a verifier for the given API salt.
    pub fn new(salt: SecretString) -> Self {
        Self { salt }
    }

    /// Signs a field set with the stored salt.
    pub fn sign<I, K, V>(&self, fields: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        sign(self.salt.expose_secret().as_bytes(), fields)
    }

    /// Verifies a presented signature against a field set.
    pub fn verify<I, K, V>(&self, fields: I, presented: &str) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        verify(self.salt.expose_secret().as_bytes(), fields, presented)
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier").finish_non_exhaustive()
    }
}
