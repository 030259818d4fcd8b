//! Secret handling for the Admin API access token
//!
//! The token is held in a [`secrecy::Secret`] so it is zeroed on drop and
//! redacted from `Debug` output. Call sites must go through
//! `expose_secret()` to read it, which keeps accidental logging out of
//! structured log fields.
//!
//! # Example
//!
//! ```rust
//! use shopsync::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let token = secret_string("shpat_0123".to_string());
//! assert_eq!(token.expose_secret().as_ref(), "shpat_0123");
//! assert!(!format!("{token:?}").contains("shpat_0123"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String wrapper that satisfies the bounds `Secret` needs
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// A zeroizing, redacted string
pub type SecretString = Secret<SecretValue>;

/// Wrap a plain string as a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_string_creation() {
        let secret = secret_string("shpat_test".to_string());
        assert_eq!(secret.expose_secret(), "shpat_test");
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = secret_string("shpat_sensitive".to_string());
        let debug_output = format!("{secret:?}");
        assert!(!debug_output.contains("shpat_sensitive"));
    }

    #[test]
    fn test_secret_value_is_empty() {
        assert!(SecretValue::from("  ".to_string()).is_empty());
        assert!(!SecretValue::from("x".to_string()).is_empty());
    }

    #[test]
    fn test_secret_deserializes_from_plain_string() {
        #[derive(Deserialize)]
        struct Holder {
            token: SecretString,
        }

        let holder: Holder = toml::from_str("token = \"shpat_abc\"").unwrap();
        assert_eq!(holder.token.expose_secret(), "shpat_abc");
    }
}
