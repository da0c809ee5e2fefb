//! PEM-backed signing identity.

use core::fmt;
use der::{pem, DecodePem, Encode};
use pkcs1::DecodeRsaPrivateKey;
use pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use std::{fs, path::Path};
use tracing::debug;
use x509_cert::Certificate;
use zeroize::Zeroizing;

use super::{SigningIdentity, SigningMaterial};
use crate::{
    algorithm::DigestAlgorithm,
    errors::{Error, Result},
};

/// Responder certificate and RSA private key held in memory.
///
/// The key may be PEM encoded as PKCS#8 (`PRIVATE KEY`) or PKCS#1
/// (`RSA PRIVATE KEY`), and must belong to the certificate.
#[derive(Clone)]
pub struct SoftToken {
    name: String,
    certificate: Certificate,
    key: RsaPrivateKey,
}

impl SoftToken {
    /// Read the certificate and key from PEM files.
    pub fn open(
        name: impl Into<String>,
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let name = name.into();
        let cert_path = cert_path.as_ref();
        let key_path = key_path.as_ref();

        debug!(
            token = %name,
            cert = %cert_path.display(),
            key = %key_path.display(),
            "configuring soft token"
        );

        let cert_pem = read_pem(cert_path)?;
        let key_pem = Zeroizing::new(read_pem(key_path)?);

        let certificate = parse_certificate(&cert_pem, &cert_path.display().to_string())?;
        let key = parse_private_key(&key_pem, &key_path.display().to_string())?;
        Self::new(name, certificate, key)
    }

    /// Parse the certificate and key from PEM strings.
    pub fn from_pem(name: impl Into<String>, cert_pem: &str, key_pem: &str) -> Result<Self> {
        let name = name.into();
        let certificate = parse_certificate(cert_pem, &name)?;
        let key = parse_private_key(key_pem, &name)?;
        Self::new(name, certificate, key)
    }

    /// Use an already decoded certificate and key.
    pub fn new(name: impl Into<String>, certificate: Certificate, key: RsaPrivateKey) -> Result<Self> {
        let name = name.into();
        let spki = certificate
            .tbs_certificate
            .subject_public_key_info
            .to_der()?;
        let cert_key = RsaPublicKey::from_public_key_der(&spki)
            .map_err(|err| key_material(&name, format!("certificate key: {}", err)))?;

        if cert_key != key.to_public_key() {
            return Err(key_material(
                &name,
                "private key does not match the certificate",
            ));
        }

        Ok(Self {
            name,
            certificate,
            key,
        })
    }
}

impl SigningIdentity for SoftToken {
    fn name(&self) -> &str {
        &self.name
    }

    fn private_signing_material(&self) -> SigningMaterial<'_> {
        SigningMaterial::InMemory(&self.key)
    }

    fn signing_certificate(&self) -> &Certificate {
        &self.certificate
    }

    fn sign(&self, data: &[u8], digest: DigestAlgorithm) -> Result<Vec<u8>> {
        let padding = match digest {
            DigestAlgorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
            DigestAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
            DigestAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
            DigestAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
        };

        let hashed = digest.digest(data);
        self.key
            .sign(padding, &hashed)
            .map_err(|err| Error::Signing(signature::Error::from_source(err)))
    }
}

impl fmt::Debug for SoftToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftToken")
            .field("name", &self.name)
            .field("subject", &self.certificate.tbs_certificate.subject)
            .finish_non_exhaustive()
    }
}

fn key_material(context: &str, reason: impl Into<String>) -> Error {
    Error::KeyMaterial {
        context: context.to_string(),
        reason: reason.into(),
    }
}

fn read_pem(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| key_material(&path.display().to_string(), err.to_string()))
}

fn parse_certificate(pem: &str, context: &str) -> Result<Certificate> {
    Certificate::from_pem(pem).map_err(|err| key_material(context, format!("certificate: {}", err)))
}

fn parse_private_key(pem: &str, context: &str) -> Result<RsaPrivateKey> {
    let label = pem::decode_label(pem.as_bytes())
        .map_err(|err| key_material(context, format!("private key: {}", err)))?;

    let key = match label {
        "PRIVATE KEY" => RsaPrivateKey::from_pkcs8_pem(pem).map_err(|err| err.to_string()),
        "RSA PRIVATE KEY" => RsaPrivateKey::from_pkcs1_pem(pem).map_err(|err| err.to_string()),
        other => Err(format!("unsupported PEM label `{}`", other)),
    };

    key.map_err(|reason| key_material(context, format!("private key: {}", reason)))
}
