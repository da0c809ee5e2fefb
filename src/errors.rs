//! Error types.

/// Alias for [`core::result::Result`] with the `ocsp-responder` crate's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A configuration value is missing or invalid.
    Configuration {
        /// Name of the offending setting.
        key: &'static str,

        /// What was wrong with it.
        reason: String,
    },

    /// Signing key material or the responder certificate could not be loaded.
    KeyMaterial {
        /// Path or label of the material being loaded.
        context: String,

        /// What went wrong.
        reason: String,
    },

    /// The signing identity failed to produce a signature.
    Signing(signature::Error),

    /// The signing identity does not support the requested digest.
    UnsupportedDigest(&'static str),

    /// Unrecognized signature algorithm name.
    UnknownAlgorithm(String),

    /// The CRL reason code extension could not be decoded.
    ReasonCode(der::Error),

    /// The extension set has already been sealed.
    ExtensionsSealed,

    /// ASN.1 encoding error.
    Asn1(der::Error),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Signing(err) => Some(err),
            Error::ReasonCode(err) | Error::Asn1(err) => Some(err),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Error::Configuration { key, reason } => {
                write!(f, "invalid configuration value `{}`: {}", key, reason)
            }
            Error::KeyMaterial { context, reason } => {
                write!(f, "cannot load signing material {}: {}", context, reason)
            }
            Error::Signing(err) => write!(f, "signing failed: {}", err),
            Error::UnsupportedDigest(name) => write!(f, "unsupported digest: {}", name),
            Error::UnknownAlgorithm(name) => write!(f, "unknown signature algorithm: {}", name),
            Error::ReasonCode(err) => write!(f, "invalid CRL reason code: {}", err),
            Error::ExtensionsSealed => write!(f, "extension set is sealed"),
            Error::Asn1(err) => write!(f, "{}", err),
        }
    }
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Error {
        Error::Asn1(err)
    }
}

impl From<signature::Error> for Error {
    fn from(err: signature::Error) -> Error {
        Error::Signing(err)
    }
}

impl From<Error> for signature::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Signing(err) => err,
            err => Self::from_source(err),
        }
    }
}
