//! CRL reason codes as described in [RFC5280 § 5.3.1].
//!
//! [RFC5280 § 5.3.1]: https://datatracker.ietf.org/doc/html/rfc5280#section-5.3.1

use core::fmt;
use der::{Decode, Enumerated};

use crate::errors::{Error, Result};

/// Reason a certificate was revoked.
///
/// ```text
/// CRLReason ::= ENUMERATED {
///      unspecified             (0),
///      keyCompromise           (1),
///      cACompromise            (2),
///      affiliationChanged      (3),
///      superseded              (4),
///      cessationOfOperation    (5),
///      certificateHold         (6),
///           -- value 7 is not used
///      removeFromCRL           (8) }
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Enumerated)]
#[repr(u32)]
pub enum ReasonCode {
    /// `unspecified`
    #[default]
    Unspecified = 0,
    /// `keyCompromise`
    KeyCompromise = 1,
    /// `cACompromise`
    CaCompromise = 2,
    /// `affiliationChanged`
    AffiliationChanged = 3,
    /// `superseded`
    Superseded = 4,
    /// `cessationOfOperation`
    CessationOfOperation = 5,
    /// `certificateHold`
    CertificateHold = 6,
    /// `removeFromCRL`
    RemoveFromCrl = 8,
}

impl ReasonCode {
    /// Decode the value of a CRL entry's `reasonCode` extension.
    ///
    /// An absent extension means [`ReasonCode::Unspecified`]. A present value
    /// must be a DER `ENUMERATED` holding one of the defined codes.
    pub fn from_crl_extension(value: Option<&[u8]>) -> Result<Self> {
        match value {
            None => Ok(ReasonCode::Unspecified),
            Some(bytes) => ReasonCode::from_der(bytes).map_err(Error::ReasonCode),
        }
    }

    /// Numeric value of the code.
    pub const fn value(self) -> u32 {
        self as u32
    }

    /// ASN.1 identifier of the code.
    pub const fn name(self) -> &'static str {
        match self {
            ReasonCode::Unspecified => "unspecified",
            ReasonCode::KeyCompromise => "keyCompromise",
            ReasonCode::CaCompromise => "cACompromise",
            ReasonCode::AffiliationChanged => "affiliationChanged",
            ReasonCode::Superseded => "superseded",
            ReasonCode::CessationOfOperation => "cessationOfOperation",
            ReasonCode::CertificateHold => "certificateHold",
            ReasonCode::RemoveFromCrl => "removeFromCRL",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.value())
    }
}
