//! Response-level extensions.

use const_oid::db::rfc6960::ID_PKIX_OCSP_NONCE;
use der::asn1::{ObjectIdentifier, OctetString};
use x509_cert::ext::{Extension, Extensions};

use crate::errors::{Error, Result};

/// `id-pkix-ocsp-nonce` (`1.3.6.1.5.5.7.48.1.2`).
pub const NONCE: ObjectIdentifier = ID_PKIX_OCSP_NONCE;

/// `id-pkix-ocsp-extended-revoke` (`1.3.6.1.5.5.7.48.1.9`), see
/// [RFC 6960 § 4.4.8](https://datatracker.ietf.org/doc/html/rfc6960#section-4.4.8).
pub const EXTENDED_REVOKE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.1.9");

/// Value of the extended revocation extension: DER `NULL`.
pub const EXTENDED_REVOKE_VALUE: [u8; 2] = [0x05, 0x00];

/// Ordered collection of extensions keyed by OID.
///
/// Each OID appears at most once; inserting an OID that is already present
/// leaves the set untouched. Once [`ExtensionSet::seal`] has been called the
/// set rejects further changes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ExtensionSet {
    entries: Vec<Extension>,
    sealed: bool,
}

impl ExtensionSet {
    /// Create an empty, unsealed set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an extension unless its OID is already present.
    ///
    /// Returns `Ok(true)` if the extension was added and `Ok(false)` if an
    /// extension with the same OID was already present.
    pub fn insert(
        &mut self,
        oid: ObjectIdentifier,
        critical: bool,
        value: impl Into<Vec<u8>>,
    ) -> Result<bool> {
        if self.sealed {
            return Err(Error::ExtensionsSealed);
        }

        if self.contains(&oid) {
            return Ok(false);
        }

        self.entries.push(Extension {
            extn_id: oid,
            critical,
            extn_value: OctetString::new(value.into())?,
        });
        Ok(true)
    }

    /// Look up an extension by OID.
    pub fn get(&self, oid: &ObjectIdentifier) -> Option<&Extension> {
        self.entries.iter().find(|ext| ext.extn_id == *oid)
    }

    /// Is an extension with this OID present?
    pub fn contains(&self, oid: &ObjectIdentifier) -> bool {
        self.get(oid).is_some()
    }

    /// Number of extensions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the set holds no extensions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Has the set been sealed?
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Iterate over the extensions in insertion order.
    pub fn iter(&self) -> core::slice::Iter<'_, Extension> {
        self.entries.iter()
    }

    /// Seal the set and return an immutable view of its contents.
    pub fn seal(&mut self) -> Result<SealedExtensions> {
        if self.sealed {
            return Err(Error::ExtensionsSealed);
        }

        self.sealed = true;
        Ok(SealedExtensions(self.entries.clone()))
    }
}

impl<'a> IntoIterator for &'a ExtensionSet {
    type Item = &'a Extension;
    type IntoIter = core::slice::Iter<'a, Extension>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Immutable, ordered extensions produced by [`ExtensionSet::seal`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SealedExtensions(Vec<Extension>);

impl SealedExtensions {
    /// Look up an extension by OID.
    pub fn get(&self, oid: &ObjectIdentifier) -> Option<&Extension> {
        self.0.iter().find(|ext| ext.extn_id == *oid)
    }

    /// Raw value of the extension identified by `oid`.
    pub fn value(&self, oid: &ObjectIdentifier) -> Option<&[u8]> {
        self.get(oid).map(|ext| ext.extn_value.as_bytes())
    }

    /// Extensions in insertion order.
    pub fn as_slice(&self) -> &[Extension] {
        &self.0
    }

    /// Number of extensions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no extensions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `responseExtensions` field value; an empty set is omitted.
    pub fn to_extensions(&self) -> Option<Extensions> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.clone())
        }
    }
}

impl From<Extensions> for SealedExtensions {
    fn from(extensions: Extensions) -> Self {
        Self(extensions)
    }
}

impl AsRef<[Extension]> for SealedExtensions {
    fn as_ref(&self) -> &[Extension] {
        self.as_slice()
    }
}
