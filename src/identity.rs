//! Signing identities.
//!
//! A [`SigningIdentity`] bundles the responder certificate with whatever can
//! produce signatures for it. The response builder only talks to this trait,
//! so key material may live in memory, in a hardware module or behind a
//! remote service.

mod soft_token;

pub use self::soft_token::SoftToken;

use core::fmt;
use rsa::RsaPrivateKey;
use spki::SubjectPublicKeyInfoOwned;
use x509_cert::Certificate;

use crate::{algorithm::DigestAlgorithm, errors::Result};

/// Handle to the private half of a signing identity.
#[derive(Clone, Copy)]
pub enum SigningMaterial<'a> {
    /// RSA key held in process memory.
    InMemory(&'a RsaPrivateKey),

    /// Key held outside the process, e.g. a PKCS#11 object label.
    External {
        /// Backend-specific label of the key.
        label: &'a str,
    },
}

impl fmt::Debug for SigningMaterial<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningMaterial::InMemory(_) => f.write_str("InMemory(..)"),
            SigningMaterial::External { label } => {
                f.debug_struct("External").field("label", label).finish()
            }
        }
    }
}

/// Something that can sign OCSP responses.
///
/// Implementations may block in [`SigningIdentity::sign`]; the builder calls
/// it exactly once per response and never retries.
pub trait SigningIdentity {
    /// Stable name used in diagnostics.
    fn name(&self) -> &str;

    /// Private signing material.
    fn private_signing_material(&self) -> SigningMaterial<'_>;

    /// Certificate of the responder, included in every response.
    fn signing_certificate(&self) -> &Certificate;

    /// Public key of the responder.
    fn public_key(&self) -> &SubjectPublicKeyInfoOwned {
        &self.signing_certificate().tbs_certificate.subject_public_key_info
    }

    /// Sign `data` with `RSASSA-PKCS1-v1_5` using `digest`.
    fn sign(&self, data: &[u8], digest: DigestAlgorithm) -> Result<Vec<u8>>;
}

impl<T> SigningIdentity for &T
where
    T: SigningIdentity + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn private_signing_material(&self) -> SigningMaterial<'_> {
        (**self).private_signing_material()
    }

    fn signing_certificate(&self) -> &Certificate {
        (**self).signing_certificate()
    }

    fn public_key(&self) -> &SubjectPublicKeyInfoOwned {
        (**self).public_key()
    }

    fn sign(&self, data: &[u8], digest: DigestAlgorithm) -> Result<Vec<u8>> {
        (**self).sign(data, digest)
    }
}
