//! Decoded CRL entries.
//!
//! Fetching and parsing CRL files is left to the caller; the response builder
//! only needs the revocation date of an entry and raw access to its entry
//! extensions.

use const_oid::db::rfc5280::ID_CE_CRL_REASONS;
use der::asn1::ObjectIdentifier;
use std::time::SystemTime;
use x509_cert::crl::RevokedCert;

use crate::{errors::Result, reason::ReasonCode};

/// An entry of a certificate revocation list.
pub trait CrlEntry {
    /// When the certificate was revoked.
    fn revocation_date(&self) -> SystemTime;

    /// Raw DER value of the entry extension identified by `oid`, if present.
    fn extension_value(&self, oid: &ObjectIdentifier) -> Option<&[u8]>;

    /// Reason code carried in the `reasonCode` entry extension
    /// (`2.5.29.21`), or [`ReasonCode::Unspecified`] when absent.
    fn reason_code(&self) -> Result<ReasonCode> {
        ReasonCode::from_crl_extension(self.extension_value(&ID_CE_CRL_REASONS))
    }
}

impl CrlEntry for RevokedCert {
    fn revocation_date(&self) -> SystemTime {
        self.revocation_date.to_system_time()
    }

    fn extension_value(&self, oid: &ObjectIdentifier) -> Option<&[u8]> {
        self.crl_entry_extensions
            .as_ref()?
            .iter()
            .find(|ext| ext.extn_id == *oid)
            .map(|ext| ext.extn_value.as_bytes())
    }
}

impl<T> CrlEntry for &T
where
    T: CrlEntry + ?Sized,
{
    fn revocation_date(&self) -> SystemTime {
        (**self).revocation_date()
    }

    fn extension_value(&self, oid: &ObjectIdentifier) -> Option<&[u8]> {
        (**self).extension_value(oid)
    }
}
