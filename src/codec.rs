//! Session identifier generation and cookie signing
//!
//! Identifiers are 32 bytes from the operating system's random source,
//! base64url encoded without padding. The cookie carries the identifier
//! together with an HMAC-SHA256 tag:
//! `s:` + identifier + `.` + base64(hmac_sha256(identifier, secret))
//!
//! The `s:` prefix marks the format version; values without it never verify.

use base64::{
    engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
    Engine,
};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use crate::error::SessionError;

type HmacSha256 = Hmac<Sha256>;

const VERSION_PREFIX: &str = "s:";

/// Number of random bytes in a session identifier (256 bits).
pub const ID_BYTES: usize = 32;

/// Generates, signs and verifies session identifiers.
///
/// The first secret signs new cookies. All secrets are tried when verifying,
/// so a secret can be rotated by prepending the new one.
#[derive(Clone)]
pub struct IdentifierCodec {
    secrets: Vec<String>,
    generator: fn() -> Result<String, SessionError>,
}

impl IdentifierCodec {
    /// Create a codec from an ordered list of secrets.
    ///
    /// Fails when the list is empty or any secret is empty.
    pub fn new<I, S>(secrets: I) -> Result<Self, SessionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let secrets: Vec<String> = secrets.into_iter().map(Into::into).collect();
        if secrets.is_empty() {
            return Err(SessionError::Configuration(
                "at least one secret is required".to_string(),
            ));
        }
        if secrets.iter().any(|s| s.is_empty()) {
            return Err(SessionError::Configuration(
                "secret must not be empty".to_string(),
            ));
        }
        Ok(Self {
            secrets,
            generator: generate_from_os,
        })
    }

    /// Replace the identifier source.
    #[cfg(test)]
    pub(crate) fn with_generator(mut self, generator: fn() -> Result<String, SessionError>) -> Self {
        self.generator = generator;
        self
    }

    /// Generate a fresh identifier from the OS random source.
    pub fn generate(&self) -> Result<String, SessionError> {
        (self.generator)()
    }

    /// Sign an identifier with the primary secret.
    pub fn sign(&self, id: &str) -> String {
        sign(id, &self.secrets[0])
    }

    /// Verify a cookie value and return the identifier it carries.
    ///
    /// Returns `None` for anything that is not a value this codec signed,
    /// including malformed or percent-encoded garbage.
    pub fn verify(&self, signed_value: &str) -> Option<String> {
        let decoded = match urlencoding::decode(signed_value) {
            Ok(d) => d.into_owned(),
            Err(_) => signed_value.to_string(),
        };
        self.secrets
            .iter()
            .find_map(|secret| unsign(&decoded, secret))
    }
}

impl std::fmt::Debug for IdentifierCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifierCodec")
            .field("secrets", &self.secrets.len())
            .finish()
    }
}

fn generate_from_os() -> Result<String, SessionError> {
    generate_with(&mut OsRng)
}

/// Generate an identifier from the given random source.
pub fn generate_with<R: RngCore>(rng: &mut R) -> Result<String, SessionError> {
    let mut bytes = [0u8; ID_BYTES];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| SessionError::EntropyExhausted(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Sign a value.
/// Returns: `s:` + value + `.` + base64_signature (without padding)
pub fn sign(value: &str, secret: &str) -> String {
    let signature = STANDARD_NO_PAD.encode(mac_for(value, secret).finalize().into_bytes());
    format!("{}{}.{}", VERSION_PREFIX, value, signature)
}

/// Unsign a value, verifying the signature.
/// Expects format: `s:` + value + `.` + signature
/// Returns the original value if signature is valid, None otherwise.
pub fn unsign(signed_value: &str, secret: &str) -> Option<String> {
    let without_prefix = signed_value.strip_prefix(VERSION_PREFIX)?;

    // The value may itself contain dots; the tag never does.
    let dot_pos = without_prefix.rfind('.')?;
    let value = &without_prefix[..dot_pos];
    let provided = &without_prefix[dot_pos + 1..];

    // Padding was stripped when signing, so a padded tag is not ours.
    if provided.contains('=') {
        return None;
    }
    let provided = STANDARD_NO_PAD.decode(provided).ok()?;

    // verify_slice compares in constant time
    mac_for(value, secret).verify_slice(&provided).ok()?;
    Some(value.to_string())
}

fn mac_for(value: &str, secret: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(value.as_bytes());
    mac
}
