//! Responder settings loaded once at startup.
//!
//! The validity window is required: a missing or unparsable value is an
//! error, never a silent default.

use core::{fmt, str::FromStr, time::Duration};
use tracing::debug;

use crate::{
    algorithm::SignatureAlgorithm,
    errors::{Error, Result},
    response::ResponderIdKind,
};

#[cfg(feature = "serde")]
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Environment variable holding the validity window in minutes.
pub const NEXT_UPDATE_MINUTES: &str = "OCSP_NEXT_UPDATE_MINUTES";

/// Environment variable holding the signature algorithm name.
pub const SIGNATURE_ALGORITHM: &str = "OCSP_SIGNATURE_ALGORITHM";

/// Environment variable selecting the responder ID form (`name` or `key`).
pub const RESPONDER_ID: &str = "OCSP_RESPONDER_ID";

/// Distance between `thisUpdate` and `nextUpdate` of a status record.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ValidityWindow(Duration);

impl ValidityWindow {
    /// Build a window from a number of minutes, which must be finite and
    /// non-negative.
    pub fn from_minutes(minutes: f64) -> Result<Self> {
        if !minutes.is_finite() {
            return Err(invalid_minutes("value must be finite"));
        }

        if minutes < 0.0 {
            return Err(invalid_minutes("value must not be negative"));
        }

        Duration::try_from_secs_f64(minutes * 60.0)
            .map(Self)
            .map_err(|err| invalid_minutes(err.to_string()))
    }

    /// Build a window from an exact duration.
    pub const fn from_duration(duration: Duration) -> Self {
        Self(duration)
    }

    /// The window as a duration.
    pub const fn duration(&self) -> Duration {
        self.0
    }

    /// The window in (possibly fractional) minutes.
    pub fn minutes(&self) -> f64 {
        self.0.as_secs_f64() / 60.0
    }
}

impl From<ValidityWindow> for Duration {
    fn from(window: ValidityWindow) -> Duration {
        window.0
    }
}

impl FromStr for ValidityWindow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let minutes = s
            .trim()
            .parse::<f64>()
            .map_err(|err| invalid_minutes(format!("{:?}: {}", s, err)))?;
        Self::from_minutes(minutes)
    }
}

impl fmt::Display for ValidityWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.minutes())
    }
}

fn invalid_minutes(reason: impl Into<String>) -> Error {
    Error::Configuration {
        key: NEXT_UPDATE_MINUTES,
        reason: reason.into(),
    }
}

/// Settings shared by every response a responder produces.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResponderConfig {
    /// Validity window applied to status records.
    #[cfg_attr(feature = "serde", serde(rename = "nextupdate"))]
    pub validity: ValidityWindow,

    /// Algorithm used to sign responses.
    #[cfg_attr(feature = "serde", serde(default))]
    pub signature_algorithm: SignatureAlgorithm,

    /// Form of the `responderID` field.
    #[cfg_attr(feature = "serde", serde(default))]
    pub responder_id: ResponderIdKind,
}

impl ResponderConfig {
    /// Use `validity` with the default algorithm and responder ID.
    pub fn new(validity: ValidityWindow) -> Self {
        Self {
            validity,
            signature_algorithm: SignatureAlgorithm::default(),
            responder_id: ResponderIdKind::default(),
        }
    }

    /// Load from the process environment.
    ///
    /// See [`NEXT_UPDATE_MINUTES`], [`SIGNATURE_ALGORITHM`] and
    /// [`RESPONDER_ID`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let validity = lookup(NEXT_UPDATE_MINUTES)
            .ok_or_else(|| invalid_minutes("not set"))?
            .parse::<ValidityWindow>()?;

        let signature_algorithm = match lookup(SIGNATURE_ALGORITHM) {
            Some(name) => name.parse().map_err(|err| Error::Configuration {
                key: SIGNATURE_ALGORITHM,
                reason: format!("{}", err),
            })?,
            None => SignatureAlgorithm::default(),
        };

        let responder_id = match lookup(RESPONDER_ID) {
            Some(kind) => kind.parse()?,
            None => ResponderIdKind::default(),
        };

        debug!(
            validity = %validity,
            algorithm = %signature_algorithm,
            responder_id = ?responder_id,
            "loaded responder configuration"
        );

        Ok(Self {
            validity,
            signature_algorithm,
            responder_id,
        })
    }
}

#[cfg(feature = "serde")]
impl Serialize for ValidityWindow {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.minutes())
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for ValidityWindow {
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let minutes = f64::deserialize(deserializer)?;
        Self::from_minutes(minutes).map_err(de::Error::custom)
    }
}

#[cfg(feature = "serde")]
impl Serialize for SignatureAlgorithm {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for SignatureAlgorithm {
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

#[cfg(feature = "serde")]
impl Serialize for ResponderIdKind {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for ResponderIdKind {
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn parse_minutes() {
        let window: ValidityWindow = "60".parse().unwrap();
        assert_eq!(window.duration(), Duration::from_secs(3600));

        let window: ValidityWindow = " 0.5 ".parse().unwrap();
        assert_eq!(window.duration(), Duration::from_secs(30));

        let window = ValidityWindow::from_minutes(0.0).unwrap();
        assert_eq!(window.duration(), Duration::ZERO);
    }

    #[test]
    fn reject_invalid_minutes() {
        for value in ["", "soon", "-1", "NaN", "inf", "1e300"] {
            match value.parse::<ValidityWindow>() {
                Err(Error::Configuration { key, .. }) => assert_eq!(key, NEXT_UPDATE_MINUTES),
                other => panic!("unexpected result for {:?}: {:?}", value, other),
            }
        }
    }

    #[test]
    fn missing_window_is_an_error() {
        let err = ResponderConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration {
                key: NEXT_UPDATE_MINUTES,
                ..
            }
        ));
    }

    #[test]
    fn defaults_apply_to_optional_settings() {
        let config = ResponderConfig::from_lookup(lookup(&[(NEXT_UPDATE_MINUTES, "15")])).unwrap();
        assert_eq!(config, ResponderConfig::new(ValidityWindow::from_minutes(15.0).unwrap()));
        assert_eq!(config.signature_algorithm, SignatureAlgorithm::Sha1WithRsa);
        assert_eq!(config.responder_id, ResponderIdKind::ByName);
    }

    #[test]
    fn all_settings() {
        let config = ResponderConfig::from_lookup(lookup(&[
            (NEXT_UPDATE_MINUTES, "1440"),
            (SIGNATURE_ALGORITHM, "SHA256withRSA"),
            (RESPONDER_ID, "key"),
        ]))
        .unwrap();

        assert_eq!(config.validity.duration(), Duration::from_secs(86_400));
        assert_eq!(config.signature_algorithm, SignatureAlgorithm::Sha256WithRsa);
        assert_eq!(config.responder_id, ResponderIdKind::ByKey);
    }

    #[test]
    fn bad_algorithm_names_the_setting() {
        let err = ResponderConfig::from_lookup(lookup(&[
            (NEXT_UPDATE_MINUTES, "60"),
            (SIGNATURE_ALGORITHM, "MD5withRSA"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration {
                key: SIGNATURE_ALGORITHM,
                ..
            }
        ));
    }

    #[test]
    #[cfg(feature = "serde")]
    fn test_serde() {
        use serde_test::{assert_de_tokens_error, assert_tokens, Token};

        let config = ResponderConfig {
            validity: ValidityWindow::from_minutes(90.0).unwrap(),
            signature_algorithm: SignatureAlgorithm::Sha256WithRsa,
            responder_id: ResponderIdKind::ByKey,
        };

        let tokens = [
            Token::Struct {
                name: "ResponderConfig",
                len: 3,
            },
            Token::Str("nextupdate"),
            Token::F64(90.0),
            Token::Str("signature_algorithm"),
            Token::Str("SHA256withRSA"),
            Token::Str("responder_id"),
            Token::Str("key"),
            Token::StructEnd,
        ];
        assert_tokens(&config, &tokens);

        assert_de_tokens_error::<ValidityWindow>(
            &[Token::F64(-5.0)],
            "invalid configuration value `OCSP_NEXT_UPDATE_MINUTES`: value must not be negative",
        );
    }
}
