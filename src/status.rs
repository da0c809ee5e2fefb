//! Certificate identifiers and per-certificate status records.

use core::time::Duration;
use der::{asn1::OctetString, Encode, Sequence};
use spki::AlgorithmIdentifierOwned;
use std::time::{SystemTime, UNIX_EPOCH};
use x509_cert::{serial_number::SerialNumber, Certificate};

use crate::{algorithm::DigestAlgorithm, errors::Result, reason::ReasonCode};

/// `CertID` structure as defined in [RFC 6960 Section 4.1.1].
///
/// ```text
/// CertID ::= SEQUENCE {
///    hashAlgorithm           AlgorithmIdentifier,
///    issuerNameHash          OCTET STRING, -- Hash of issuer's DN
///    issuerKeyHash           OCTET STRING, -- Hash of issuer's public key
///    serialNumber            CertificateSerialNumber }
/// ```
///
/// The response builder passes identifiers through unchanged, so a `CertID`
/// taken from a request is echoed byte for byte.
///
/// [RFC 6960 Section 4.1.1]: https://datatracker.ietf.org/doc/html/rfc6960#section-4.1.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct CertificateId {
    pub hash_algorithm: AlgorithmIdentifierOwned,
    pub issuer_name_hash: OctetString,
    pub issuer_key_hash: OctetString,
    pub serial_number: SerialNumber,
}

impl CertificateId {
    /// Create an identifier from precomputed issuer hashes.
    pub fn new(
        digest: DigestAlgorithm,
        issuer_name_hash: &[u8],
        issuer_key_hash: &[u8],
        serial_number: SerialNumber,
    ) -> Result<Self> {
        Ok(Self {
            hash_algorithm: digest.algorithm_identifier(),
            issuer_name_hash: OctetString::new(issuer_name_hash)?,
            issuer_key_hash: OctetString::new(issuer_key_hash)?,
            serial_number,
        })
    }

    /// Compute the identifier of the certificate with `serial_number` issued
    /// by `issuer`.
    ///
    /// The name hash covers the DER encoding of the issuer's subject name and
    /// the key hash covers the value of the issuer's `subjectPublicKey` BIT
    /// STRING, excluding tag, length and unused-bits octet.
    pub fn from_issuer(
        issuer: &Certificate,
        serial_number: SerialNumber,
        digest: DigestAlgorithm,
    ) -> Result<Self> {
        let tbs = &issuer.tbs_certificate;
        let name_hash = digest.digest(&tbs.subject.to_der()?);
        let key_hash = digest.digest(tbs.subject_public_key_info.subject_public_key.raw_bytes());

        Self::new(digest, &name_hash, &key_hash, serial_number)
    }
}

/// Status assigned to a certificate by the caller.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CertStatus {
    /// The certificate is not revoked.
    Good,

    /// The responder does not know about the certificate.
    Unknown,

    /// The certificate has been revoked.
    Revoked {
        /// When the certificate was revoked.
        revocation_time: SystemTime,

        /// Why it was revoked.
        reason: ReasonCode,
    },
}

impl CertStatus {
    /// Revocation time used for certificates that were never issued
    /// ([RFC 6960 Section 2.2]): `1970-01-01T00:00:00Z`.
    ///
    /// [RFC 6960 Section 2.2]: https://datatracker.ietf.org/doc/html/rfc6960#section-2.2
    pub const EXTENDED_REVOCATION_TIME: SystemTime = UNIX_EPOCH;

    /// Revoked at `revocation_time` for `reason`.
    pub fn revoked(revocation_time: SystemTime, reason: ReasonCode) -> Self {
        CertStatus::Revoked {
            revocation_time,
            reason,
        }
    }

    /// Revoked with the extended revocation sentinel: epoch time and
    /// `certificateHold`.
    pub fn extended_revoked() -> Self {
        Self::revoked(Self::EXTENDED_REVOCATION_TIME, ReasonCode::CertificateHold)
    }

    /// Revoked at `now` because the issuing CA was compromised.
    pub fn ca_compromised(now: SystemTime) -> Self {
        Self::revoked(now, ReasonCode::CaCompromise)
    }

    /// Returns `true` for [`CertStatus::Revoked`].
    pub fn is_revoked(&self) -> bool {
        matches!(self, CertStatus::Revoked { .. })
    }

    /// Revocation reason, if revoked.
    pub fn reason(&self) -> Option<ReasonCode> {
        match self {
            CertStatus::Revoked { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Revocation time, if revoked.
    pub fn revocation_time(&self) -> Option<SystemTime> {
        match self {
            CertStatus::Revoked {
                revocation_time, ..
            } => Some(*revocation_time),
            _ => None,
        }
    }
}

/// One status record of a response, in the order it was added.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SingleStatusEntry {
    /// Certificate the record is about.
    pub cert_id: CertificateId,

    /// Status of the certificate.
    pub status: CertStatus,

    /// Time at which the status is known to be correct.
    pub this_update: SystemTime,

    /// Time at or before which newer information will be available. `None`
    /// means newer information is always available.
    pub next_update: Option<SystemTime>,
}

impl SingleStatusEntry {
    /// Length of the validity window, `nextUpdate - thisUpdate`.
    pub fn validity(&self) -> Option<Duration> {
        self.next_update?.duration_since(self.this_update).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::{Decode, DecodePem};
    use hex_literal::hex;

    const RESPONDER_CERT: &str = include_str!("../tests/examples/responder-cert.pem");

    #[test]
    fn extended_revoked_uses_sentinel() {
        let status = CertStatus::extended_revoked();
        assert_eq!(status.revocation_time(), Some(UNIX_EPOCH));
        assert_eq!(status.reason(), Some(ReasonCode::CertificateHold));
        assert!(status.is_revoked());
    }

    #[test]
    fn ca_compromised_uses_given_time() {
        let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let status = CertStatus::ca_compromised(now);
        assert_eq!(status.revocation_time(), Some(now));
        assert_eq!(status.reason(), Some(ReasonCode::CaCompromise));
        assert_eq!(CertStatus::Good.reason(), None);
        assert!(!CertStatus::Unknown.is_revoked());
    }

    #[test]
    fn cert_id_der_encoding() {
        let id = CertificateId::new(
            DigestAlgorithm::Sha1,
            &[0x11; 20],
            &[0x22; 20],
            SerialNumber::new(&[0x01, 0x02]).unwrap(),
        )
        .unwrap();

        let der = id.to_der().unwrap();
        assert_eq!(
            &der[..13],
            // SEQUENCE, AlgorithmIdentifier { sha1, NULL }
            &hex!("303b 3009 0605 2b0e03021a 0500")[..]
        );
        assert_eq!(CertificateId::from_der(&der).unwrap(), id);
    }

    #[test]
    fn cert_id_from_issuer() {
        let issuer = Certificate::from_pem(RESPONDER_CERT).unwrap();
        let serial = SerialNumber::new(&[0x42]).unwrap();
        let id = CertificateId::from_issuer(&issuer, serial.clone(), DigestAlgorithm::Sha1).unwrap();

        let tbs = &issuer.tbs_certificate;
        assert_eq!(
            id.issuer_name_hash.as_bytes(),
            DigestAlgorithm::Sha1.digest(&tbs.subject.to_der().unwrap())
        );
        assert_eq!(
            id.issuer_key_hash.as_bytes(),
            DigestAlgorithm::Sha1.digest(tbs.subject_public_key_info.subject_public_key.raw_bytes())
        );
        assert_eq!(id.issuer_name_hash.as_bytes().len(), 20);
        assert_eq!(id.serial_number, serial);

        let sha256 = CertificateId::from_issuer(&issuer, serial, DigestAlgorithm::Sha256).unwrap();
        assert_eq!(sha256.issuer_key_hash.as_bytes().len(), 32);
        assert_eq!(sha256.hash_algorithm.oid, DigestAlgorithm::Sha256.oid());
    }

    #[test]
    fn validity_of_entries() {
        let id = CertificateId::new(
            DigestAlgorithm::Sha1,
            &[0; 20],
            &[0; 20],
            SerialNumber::new(&[0x01]).unwrap(),
        )
        .unwrap();
        let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);

        let entry = SingleStatusEntry {
            cert_id: id.clone(),
            status: CertStatus::Good,
            this_update: now,
            next_update: Some(now + Duration::from_secs(3600)),
        };
        assert_eq!(entry.validity(), Some(Duration::from_secs(3600)));

        let open_ended = SingleStatusEntry {
            cert_id: id,
            status: CertStatus::ca_compromised(now),
            this_update: now,
            next_update: None,
        };
        assert_eq!(open_ended.validity(), None);
    }
}
