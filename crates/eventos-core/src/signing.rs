//! Cryptographic signing for values stored on the client.
//!
//! - [`Signer`]: signs and verifies strings using HMAC-SHA256.
//! - [`Signer::sign_object`] / [`Signer::unsign_object`]: serialize a value
//!   to JSON, base64-encode it, and sign the result.
//!
//! The flash-message cookie is the main consumer: the browser can hold the
//! pending messages but cannot forge or alter them.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::Sha256;

use crate::error::EventosError;

type HmacSha256 = Hmac<Sha256>;

/// The separator used between value and signature.
const DEFAULT_SEP: char = ':';

/// Signs and verifies strings using HMAC-SHA256.
///
/// # Examples
///
/// ```
/// use eventos_core::signing::Signer;
///
/// let signer = Signer::new("my-secret-key");
/// let signed = signer.sign("hello");
/// assert_eq!(signer.unsign(&signed).unwrap(), "hello");
/// ```
#[derive(Debug, Clone)]
pub struct Signer {
    key: String,
    salt: String,
}

impl Signer {
    /// Creates a new `Signer` with the given secret key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            salt: "eventos.core.signing.Signer".to_string(),
        }
    }

    /// Sets the salt mixed into the HMAC key.
    ///
    /// Different salts keep signatures produced for one purpose from being
    /// accepted for another.
    #[must_use]
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = salt.into();
        self
    }

    fn mac(&self) -> HmacSha256 {
        let salted_key = format!("{}:{}", self.salt, self.key);
        HmacSha256::new_from_slice(salted_key.as_bytes()).expect("HMAC accepts any key size")
    }

    /// Signs a value, returning `"value:signature"`.
    pub fn sign(&self, value: &str) -> String {
        let mut mac = self.mac();
        mac.update(value.as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{value}{DEFAULT_SEP}{sig}")
    }

    /// Verifies a signed string and returns the original value.
    ///
    /// # Errors
    ///
    /// Returns [`EventosError::SuspiciousOperation`] if the separator is
    /// missing or the signature does not match.
    pub fn unsign(&self, signed_value: &str) -> Result<String, EventosError> {
        let (value, sig) = signed_value.rsplit_once(DEFAULT_SEP).ok_or_else(|| {
            EventosError::SuspiciousOperation("No separator found in signed value".to_string())
        })?;

        let sig_bytes = URL_SAFE_NO_PAD.decode(sig).map_err(|_| {
            EventosError::SuspiciousOperation("Signature is not valid base64".to_string())
        })?;

        let mut mac = self.mac();
        mac.update(value.as_bytes());
        mac.verify_slice(&sig_bytes).map_err(|_| {
            EventosError::SuspiciousOperation("Signature verification failed".to_string())
        })?;

        Ok(value.to_string())
    }

    /// Serializes `data` to JSON, base64-encodes it, and signs the result.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` cannot be serialized.
    pub fn sign_object<T: Serialize>(&self, data: &T) -> Result<String, EventosError> {
        let json_bytes = serde_json::to_vec(data)?;
        Ok(self.sign(&URL_SAFE_NO_PAD.encode(json_bytes)))
    }

    /// Verifies a value produced by [`Signer::sign_object`] and decodes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature is invalid or the payload cannot be
    /// decoded into `T`.
    pub fn unsign_object<T: DeserializeOwned>(&self, signed: &str) -> Result<T, EventosError> {
        let encoded = self.unsign(signed)?;
        let json_bytes = URL_SAFE_NO_PAD.decode(encoded).map_err(|e| {
            EventosError::SerializationError(format!("Base64 decode failed: {e}"))
        })?;
        Ok(serde_json::from_slice(&json_bytes)?)
    }
}
