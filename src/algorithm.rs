//! Signature and digest algorithm identifiers.
//!
//! Responses are signed with `RSASSA-PKCS1-v1_5` as described in
//! [RFC8017 § 8.2]. The algorithm names accepted by [`SignatureAlgorithm`]'s
//! [`FromStr`] impl are the JCA-style names used in responder configuration
//! files, e.g. `SHA1withRSA`.
//!
//! [RFC8017 § 8.2]: https://datatracker.ietf.org/doc/html/rfc8017#section-8.2

use const_oid::db::rfc5912::{
    ID_SHA_1, ID_SHA_256, ID_SHA_384, ID_SHA_512, SHA_1_WITH_RSA_ENCRYPTION,
    SHA_256_WITH_RSA_ENCRYPTION, SHA_384_WITH_RSA_ENCRYPTION, SHA_512_WITH_RSA_ENCRYPTION,
};
use core::{fmt, str::FromStr};
use der::{asn1::ObjectIdentifier, Any};
use digest::Digest;
use spki::AlgorithmIdentifierOwned;

use crate::errors::{Error, Result};

/// Message digest used for signing and for `CertID` hashes.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum DigestAlgorithm {
    /// SHA-1.
    #[default]
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl DigestAlgorithm {
    /// Object identifier of the digest.
    pub const fn oid(self) -> ObjectIdentifier {
        match self {
            DigestAlgorithm::Sha1 => ID_SHA_1,
            DigestAlgorithm::Sha256 => ID_SHA_256,
            DigestAlgorithm::Sha384 => ID_SHA_384,
            DigestAlgorithm::Sha512 => ID_SHA_512,
        }
    }

    /// Short display name, e.g. `SHA-256`.
    pub const fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "SHA-1",
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha384 => "SHA-384",
            DigestAlgorithm::Sha512 => "SHA-512",
        }
    }

    /// Hash `data` with this digest.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha1 => sha1::Sha1::digest(data).to_vec(),
            DigestAlgorithm::Sha256 => sha2::Sha256::digest(data).to_vec(),
            DigestAlgorithm::Sha384 => sha2::Sha384::digest(data).to_vec(),
            DigestAlgorithm::Sha512 => sha2::Sha512::digest(data).to_vec(),
        }
    }

    /// `AlgorithmIdentifier` with explicit NULL parameters.
    pub fn algorithm_identifier(self) -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid: self.oid(),
            parameters: Some(Any::null()),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Algorithm used to sign the `tbsResponseData`. Defaults to `SHA1withRSA`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum SignatureAlgorithm {
    /// `sha1WithRSAEncryption`.
    #[default]
    Sha1WithRsa,
    /// `sha256WithRSAEncryption`.
    Sha256WithRsa,
    /// `sha384WithRSAEncryption`.
    Sha384WithRsa,
    /// `sha512WithRSAEncryption`.
    Sha512WithRsa,
}

impl SignatureAlgorithm {
    /// All supported algorithms.
    pub const ALL: [SignatureAlgorithm; 4] = [
        SignatureAlgorithm::Sha1WithRsa,
        SignatureAlgorithm::Sha256WithRsa,
        SignatureAlgorithm::Sha384WithRsa,
        SignatureAlgorithm::Sha512WithRsa,
    ];

    /// Object identifier of the signature algorithm.
    pub const fn oid(self) -> ObjectIdentifier {
        match self {
            SignatureAlgorithm::Sha1WithRsa => SHA_1_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha256WithRsa => SHA_256_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha384WithRsa => SHA_384_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha512WithRsa => SHA_512_WITH_RSA_ENCRYPTION,
        }
    }

    /// Digest the signer must apply.
    pub const fn digest(self) -> DigestAlgorithm {
        match self {
            SignatureAlgorithm::Sha1WithRsa => DigestAlgorithm::Sha1,
            SignatureAlgorithm::Sha256WithRsa => DigestAlgorithm::Sha256,
            SignatureAlgorithm::Sha384WithRsa => DigestAlgorithm::Sha384,
            SignatureAlgorithm::Sha512WithRsa => DigestAlgorithm::Sha512,
        }
    }

    /// Configuration name, e.g. `SHA1withRSA`.
    pub const fn name(self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1WithRsa => "SHA1withRSA",
            SignatureAlgorithm::Sha256WithRsa => "SHA256withRSA",
            SignatureAlgorithm::Sha384WithRsa => "SHA384withRSA",
            SignatureAlgorithm::Sha512WithRsa => "SHA512withRSA",
        }
    }

    /// `AlgorithmIdentifier` for the `signatureAlgorithm` field. PKCS#1 v1.5
    /// identifiers carry explicit NULL parameters ([RFC4055 § 5]).
    ///
    /// [RFC4055 § 5]: https://datatracker.ietf.org/doc/html/rfc4055#section-5
    pub fn algorithm_identifier(self) -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid: self.oid(),
            parameters: Some(Any::null()),
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = Error;

    /// Accepts the configuration name (case-insensitive, an optional `-` in
    /// the digest name is ignored) or the dotted OID.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        if let Ok(oid) = ObjectIdentifier::new(s) {
            return Self::ALL
                .into_iter()
                .find(|alg| alg.oid() == oid)
                .ok_or_else(|| Error::UnknownAlgorithm(s.to_string()));
        }

        let normalized = s.replace('-', "").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|alg| alg.name().to_ascii_lowercase() == normalized)
            .ok_or_else(|| Error::UnknownAlgorithm(s.to_string()))
    }
}

impl TryFrom<&AlgorithmIdentifierOwned> for SignatureAlgorithm {
    type Error = Error;

    fn try_from(id: &AlgorithmIdentifierOwned) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.oid() == id.oid)
            .ok_or_else(|| Error::UnknownAlgorithm(id.oid.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn parse_configuration_names() {
        assert_eq!(
            "SHA1withRSA".parse::<SignatureAlgorithm>().unwrap(),
            SignatureAlgorithm::Sha1WithRsa
        );
        assert_eq!(
            "sha-256withrsa".parse::<SignatureAlgorithm>().unwrap(),
            SignatureAlgorithm::Sha256WithRsa
        );
        assert_eq!(
            " SHA512withRSA ".parse::<SignatureAlgorithm>().unwrap(),
            SignatureAlgorithm::Sha512WithRsa
        );
        assert_eq!(
            "1.2.840.113549.1.1.12".parse::<SignatureAlgorithm>().unwrap(),
            SignatureAlgorithm::Sha384WithRsa
        );
    }

    #[test]
    fn reject_unknown_names() {
        for name in ["", "MD5withRSA", "SHA256withECDSA", "1.2.840.10045.4.3.2"] {
            match name.parse::<SignatureAlgorithm>() {
                Err(Error::UnknownAlgorithm(_)) => {}
                other => panic!("unexpected result for {:?}: {:?}", name, other),
            }
        }
    }

    #[test]
    fn names_round_trip_through_display() {
        for alg in SignatureAlgorithm::ALL {
            assert_eq!(alg.to_string().parse::<SignatureAlgorithm>().unwrap(), alg);
        }
    }

    #[test]
    fn default_is_sha1_with_rsa() {
        assert_eq!(SignatureAlgorithm::default().name(), "SHA1withRSA");
        assert_eq!(
            SignatureAlgorithm::default().digest(),
            DigestAlgorithm::Sha1
        );
    }

    #[test]
    fn digest_output() {
        assert_eq!(
            DigestAlgorithm::Sha1.digest(b"abc"),
            hex!("a9993e364706816aba3e25717850c26c9cd0d89d")
        );
        assert_eq!(
            DigestAlgorithm::Sha256.digest(b"abc"),
            hex!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
        assert_eq!(DigestAlgorithm::Sha384.digest(b"abc").len(), 48);
        assert_eq!(DigestAlgorithm::Sha512.digest(b"abc").len(), 64);
    }

    #[test]
    fn algorithm_identifier_has_null_parameters() {
        let id = SignatureAlgorithm::Sha256WithRsa.algorithm_identifier();
        assert_eq!(id.oid, SHA_256_WITH_RSA_ENCRYPTION);
        assert_eq!(id.parameters, Some(Any::null()));
    }
}
