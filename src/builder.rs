//! Assembly of signed OCSP responses.
//!
//! A [`ResponseBuilder`] collects one status record per requested certificate,
//! in request order, then signs them all at once in
//! [`ResponseBuilder::finalize`]. Finalizing consumes the builder, so a
//! builder produces at most one response.

use core::{fmt, time::Duration};
use der::{asn1::BitString, Encode};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, trace, warn};

use crate::{
    algorithm::SignatureAlgorithm,
    asn1::{BasicOcspResponse, ResponseData, SingleResponse, Version},
    config::ValidityWindow,
    crl::CrlEntry,
    errors::{Error, Result},
    extensions::{ExtensionSet, EXTENDED_REVOKE, EXTENDED_REVOKE_VALUE, NONCE},
    identity::SigningIdentity,
    response::{ResponderIdKind, SignedResponse, RESPONSE_LIFETIME},
    status::{CertStatus, CertificateId, SingleStatusEntry},
};

/// Builder for one signed `BasicOCSPResponse`.
pub struct ResponseBuilder<'a, S>
where
    S: SigningIdentity + ?Sized,
{
    identity: &'a S,
    algorithm: SignatureAlgorithm,
    validity: ValidityWindow,
    responder_id: ResponderIdKind,
    entries: Vec<SingleStatusEntry>,
    extensions: ExtensionSet,
    nonce: Option<Vec<u8>>,
}

impl<'a, S> ResponseBuilder<'a, S>
where
    S: SigningIdentity + ?Sized,
{
    /// Create a builder signing with `SHA1withRSA`.
    pub fn new(identity: &'a S, validity: &ValidityWindow) -> Self {
        Self::with_algorithm(identity, SignatureAlgorithm::default(), validity)
    }

    /// Create a builder signing with `algorithm`.
    pub fn with_algorithm(
        identity: &'a S,
        algorithm: SignatureAlgorithm,
        validity: &ValidityWindow,
    ) -> Self {
        Self {
            identity,
            algorithm,
            validity: *validity,
            responder_id: ResponderIdKind::default(),
            entries: Vec::new(),
            extensions: ExtensionSet::new(),
            nonce: None,
        }
    }

    /// Select the form of the `responderID` field.
    pub fn responder_id(&mut self, kind: ResponderIdKind) -> &mut Self {
        self.responder_id = kind;
        self
    }

    /// Record that the certificate is not revoked.
    pub fn add_good(&mut self, cert_id: CertificateId) {
        self.push_with_window(cert_id, CertStatus::Good);
    }

    /// Record that the certificate is unknown to the responder.
    pub fn add_unknown(&mut self, cert_id: CertificateId) {
        self.push_with_window(cert_id, CertStatus::Unknown);
    }

    /// Record that the certificate was revoked, as described by its CRL
    /// entry.
    ///
    /// The reason comes from the entry's `reasonCode` extension and defaults
    /// to `unspecified`. A malformed reason is an error and nothing is
    /// recorded.
    pub fn add_revoked(&mut self, cert_id: CertificateId, entry: impl CrlEntry) -> Result<()> {
        let reason = entry.reason_code()?;
        let status = CertStatus::revoked(entry.revocation_date(), reason);
        self.push_with_window(cert_id, status);
        Ok(())
    }

    /// Record a certificate that was never issued, using the extended
    /// revocation sentinel, and mark the response with the
    /// `id-pkix-ocsp-extended-revoke` extension.
    pub fn add_extended_revoked(&mut self, cert_id: CertificateId) {
        self.push_with_window(cert_id, CertStatus::extended_revoked());

        match self.extensions.insert(EXTENDED_REVOKE, false, EXTENDED_REVOKE_VALUE) {
            Ok(true) => debug!("added extended revocation marker"),
            Ok(false) => {}
            // the builder never seals its own set
            Err(err) => warn!(%err, "cannot add extended revocation marker"),
        }
    }

    /// Record that the certificate's issuing CA was compromised.
    ///
    /// The record is revoked as of now with reason `cACompromise` and has no
    /// `nextUpdate`.
    pub fn add_ca_compromised(&mut self, cert_id: CertificateId) {
        let now = current_time();
        self.push(cert_id, CertStatus::ca_compromised(now), now, None);
    }

    /// Record an arbitrary status with `thisUpdate` set to now.
    pub fn add_status(
        &mut self,
        cert_id: CertificateId,
        status: CertStatus,
        next_update: Option<SystemTime>,
    ) {
        self.push(cert_id, status, current_time(), next_update);
    }

    /// Echo a request nonce. Calling this again replaces the previous nonce.
    pub fn set_nonce(&mut self, nonce: impl Into<Vec<u8>>) -> &mut Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Nonce that will be echoed, if any.
    pub fn nonce(&self) -> Option<&[u8]> {
        self.nonce.as_deref()
    }

    /// Records added so far, in order.
    pub fn entries(&self) -> &[SingleStatusEntry] {
        &self.entries
    }

    /// Response extensions added so far, not including the nonce.
    pub fn extensions(&self) -> &ExtensionSet {
        &self.extensions
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no records have been added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Algorithm used for the signature.
    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// Seal the extensions and sign the response.
    ///
    /// On failure the builder is handed back untouched inside the
    /// [`FinalizeError`].
    pub fn finalize(self) -> core::result::Result<SignedResponse, FinalizeError<'a, S>> {
        match self.sign_at(current_time()) {
            Ok(response) => Ok(response),
            Err(error) => {
                warn!(
                    identity = self.identity.name(),
                    %error,
                    "failed to finalize OCSP response"
                );
                Err(FinalizeError {
                    builder: self,
                    error,
                })
            }
        }
    }

    fn sign_at(&self, now: SystemTime) -> Result<SignedResponse> {
        let mut extensions = self.extensions.clone();
        if let Some(nonce) = &self.nonce {
            extensions.insert(NONCE, false, nonce.clone())?;
        }
        let extensions = extensions.seal()?;

        let certificate = self.identity.signing_certificate();
        let responder_id = self.responder_id.responder_id(certificate)?;
        let responses = self
            .entries
            .iter()
            .map(SingleResponse::try_from)
            .collect::<der::Result<Vec<_>>>()?;

        let tbs_response_data = ResponseData {
            version: Version::V1,
            responder_id: responder_id.clone(),
            produced_at: crate::asn1::generalized_time(now)?,
            responses,
            response_extensions: extensions.to_extensions(),
        };
        let tbs_der = tbs_response_data.to_der()?;

        debug!(
            identity = self.identity.name(),
            algorithm = %self.algorithm,
            responses = self.entries.len(),
            extensions = extensions.len(),
            "signing OCSP response"
        );
        let signature = self
            .identity
            .sign(&tbs_der, self.algorithm.digest())?;

        let basic = BasicOcspResponse {
            tbs_response_data,
            signature_algorithm: self.algorithm.algorithm_identifier(),
            signature: BitString::from_bytes(&signature)?,
            certs: Some(vec![certificate.clone()]),
        };

        Ok(SignedResponse {
            responder_id,
            produced_at: now,
            valid_until: now + RESPONSE_LIFETIME,
            signature_algorithm: self.algorithm,
            entries: self.entries.clone(),
            extensions,
            tbs_der,
            basic,
        })
    }

    fn push_with_window(&mut self, cert_id: CertificateId, status: CertStatus) {
        let now = current_time();
        let next_update = now + self.validity.duration();
        self.push(cert_id, status, now, Some(next_update));
    }

    fn push(
        &mut self,
        cert_id: CertificateId,
        status: CertStatus,
        this_update: SystemTime,
        next_update: Option<SystemTime>,
    ) {
        trace!(
            serial = ?cert_id.serial_number,
            ?status,
            index = self.entries.len(),
            "adding status record"
        );

        self.entries.push(SingleStatusEntry {
            cert_id,
            status,
            this_update,
            next_update,
        });
    }
}

impl<S> fmt::Debug for ResponseBuilder<'_, S>
where
    S: SigningIdentity + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBuilder")
            .field("identity", &self.identity.name())
            .field("algorithm", &self.algorithm)
            .field("validity", &self.validity)
            .field("responder_id", &self.responder_id)
            .field("entries", &self.entries)
            .field("extensions", &self.extensions)
            .field("nonce", &self.nonce)
            .finish()
    }
}

/// Current time truncated to whole seconds, the resolution of
/// `GeneralizedTime` in a response.
fn current_time() -> SystemTime {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    UNIX_EPOCH + Duration::from_secs(since_epoch.as_secs())
}

/// Failure to finalize a response, carrying the builder back to the caller.
pub struct FinalizeError<'a, S>
where
    S: SigningIdentity + ?Sized,
{
    builder: ResponseBuilder<'a, S>,
    error: Error,
}

impl<'a, S> FinalizeError<'a, S>
where
    S: SigningIdentity + ?Sized,
{
    /// Why finalizing failed.
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// The builder, in the state it was in before `finalize` was called.
    pub fn builder(&self) -> &ResponseBuilder<'a, S> {
        &self.builder
    }

    /// Take back the builder, e.g. to retry.
    pub fn into_builder(self) -> ResponseBuilder<'a, S> {
        self.builder
    }

    /// Split into the builder and the error.
    pub fn into_parts(self) -> (ResponseBuilder<'a, S>, Error) {
        (self.builder, self.error)
    }
}

impl<S> fmt::Debug for FinalizeError<'_, S>
where
    S: SigningIdentity + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinalizeError")
            .field("error", &self.error)
            .field("records", &self.builder.len())
            .finish_non_exhaustive()
    }
}

impl<S> fmt::Display for FinalizeError<'_, S>
where
    S: SigningIdentity + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot finalize OCSP response: {}", self.error)
    }
}

impl<S> std::error::Error for FinalizeError<'_, S>
where
    S: SigningIdentity + ?Sized,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<S> From<FinalizeError<'_, S>> for Error
where
    S: SigningIdentity + ?Sized,
{
    fn from(err: FinalizeError<'_, S>) -> Error {
        err.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{algorithm::DigestAlgorithm, identity::SigningMaterial, reason::ReasonCode};
    use const_oid::db::rfc5280::ID_CE_CRL_REASONS;
    use core::cell::Cell;
    use der::{asn1::ObjectIdentifier, DecodePem};
    use x509_cert::{serial_number::SerialNumber, Certificate};

    const CERT: &str = include_str!("../tests/examples/responder-cert.pem");
    const JAN_1_2023: u64 = 1_672_531_200;

    /// Identity that returns a fixed signature, or fails.
    struct StubIdentity {
        certificate: Certificate,
        fail: bool,
        calls: Cell<usize>,
        last_digest: Cell<Option<DigestAlgorithm>>,
    }

    impl StubIdentity {
        fn new(fail: bool) -> Self {
            Self {
                certificate: Certificate::from_pem(CERT).unwrap(),
                fail,
                calls: Cell::new(0),
                last_digest: Cell::new(None),
            }
        }
    }

    impl SigningIdentity for StubIdentity {
        fn name(&self) -> &str {
            "stub"
        }

        fn private_signing_material(&self) -> SigningMaterial<'_> {
            SigningMaterial::External { label: "stub" }
        }

        fn signing_certificate(&self) -> &Certificate {
            &self.certificate
        }

        fn sign(&self, _data: &[u8], digest: DigestAlgorithm) -> Result<Vec<u8>> {
            self.calls.set(self.calls.get() + 1);
            self.last_digest.set(Some(digest));
            if self.fail {
                Err(Error::Signing(signature::Error::new()))
            } else {
                Ok(vec![0x5a; 256])
            }
        }
    }

    struct Entry {
        date: SystemTime,
        reason: Option<Vec<u8>>,
    }

    impl CrlEntry for Entry {
        fn revocation_date(&self) -> SystemTime {
            self.date
        }

        fn extension_value(&self, oid: &ObjectIdentifier) -> Option<&[u8]> {
            if *oid == ID_CE_CRL_REASONS {
                self.reason.as_deref()
            } else {
                None
            }
        }
    }

    fn cert_id(serial: u8) -> CertificateId {
        CertificateId::new(
            DigestAlgorithm::Sha1,
            &[0x11; 20],
            &[0x22; 20],
            SerialNumber::new(&[serial]).unwrap(),
        )
        .unwrap()
    }

    fn window() -> ValidityWindow {
        ValidityWindow::from_minutes(60.0).unwrap()
    }

    fn jan_1_2023() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(JAN_1_2023)
    }

    #[test]
    fn records_keep_their_order_and_window() {
        let identity = StubIdentity::new(false);
        let validity = window();
        let mut builder = ResponseBuilder::new(&identity, &validity);

        builder.add_good(cert_id(1));
        builder.add_unknown(cert_id(2));
        builder
            .add_revoked(
                cert_id(3),
                Entry {
                    date: jan_1_2023(),
                    reason: Some(vec![0x0a, 0x01, 0x01]),
                },
            )
            .unwrap();
        builder.add_extended_revoked(cert_id(4));

        let serials: Vec<_> = builder
            .entries()
            .iter()
            .map(|entry| entry.cert_id.serial_number.as_bytes()[0])
            .collect();
        assert_eq!(serials, [1, 2, 3, 4]);

        for entry in builder.entries() {
            assert_eq!(entry.validity(), Some(Duration::from_secs(3600)));
        }

        assert_eq!(builder.entries()[0].status, CertStatus::Good);
        assert_eq!(builder.entries()[1].status, CertStatus::Unknown);
        assert_eq!(
            builder.entries()[2].status,
            CertStatus::revoked(jan_1_2023(), ReasonCode::KeyCompromise)
        );
        assert_eq!(builder.entries()[3].status, CertStatus::extended_revoked());
    }

    #[test]
    fn missing_reason_is_unspecified() {
        let identity = StubIdentity::new(false);
        let mut builder = ResponseBuilder::new(&identity, &window());
        builder
            .add_revoked(
                cert_id(1),
                Entry {
                    date: jan_1_2023(),
                    reason: None,
                },
            )
            .unwrap();

        assert_eq!(builder.entries()[0].status.reason(), Some(ReasonCode::Unspecified));
    }

    #[test]
    fn malformed_reason_appends_nothing() {
        let identity = StubIdentity::new(false);
        let mut builder = ResponseBuilder::new(&identity, &window());
        let result = builder.add_revoked(
            cert_id(1),
            Entry {
                date: jan_1_2023(),
                reason: Some(vec![0x0a, 0x01, 0x07]),
            },
        );

        assert!(matches!(result, Err(Error::ReasonCode(_))));
        assert!(builder.is_empty());
    }

    #[test]
    fn extended_revoke_marker_added_once() {
        let identity = StubIdentity::new(false);
        let mut builder = ResponseBuilder::new(&identity, &window());
        for serial in 0..3 {
            builder.add_extended_revoked(cert_id(serial));
        }

        assert_eq!(builder.len(), 3);
        assert_eq!(builder.extensions().len(), 1);
        let marker = builder.extensions().get(&EXTENDED_REVOKE).unwrap();
        assert!(!marker.critical);
        assert_eq!(marker.extn_value.as_bytes(), EXTENDED_REVOKE_VALUE);
    }

    #[test]
    fn ca_compromised_has_no_next_update() {
        let identity = StubIdentity::new(false);
        let mut builder = ResponseBuilder::new(&identity, &window());
        builder.add_ca_compromised(cert_id(7));

        let entry = &builder.entries()[0];
        assert_eq!(entry.next_update, None);
        assert_eq!(entry.status.reason(), Some(ReasonCode::CaCompromise));
        assert_eq!(entry.status.revocation_time(), Some(entry.this_update));
    }

    #[test]
    fn last_nonce_wins() {
        let identity = StubIdentity::new(false);
        let mut builder = ResponseBuilder::new(&identity, &window());
        builder.set_nonce([1, 2, 3]).set_nonce(vec![4, 5]);
        assert_eq!(builder.nonce(), Some(&[4u8, 5][..]));

        let response = builder.finalize().unwrap();
        assert_eq!(response.extensions().value(&NONCE), Some(&[4u8, 5][..]));
        assert!(!response.extensions().get(&NONCE).unwrap().critical);
    }

    #[test]
    fn finalize_without_records() {
        let identity = StubIdentity::new(false);
        let response = ResponseBuilder::new(&identity, &window()).finalize().unwrap();

        assert!(response.responses().is_empty());
        assert!(response.extensions().is_empty());
        assert_eq!(response.valid_until, response.produced_at + RESPONSE_LIFETIME);
        assert_eq!(response.signature(), &[0x5a; 256][..]);
        assert_eq!(response.certificates(), &[identity.certificate.clone()]);
        assert_eq!(identity.calls.get(), 1);
        assert_eq!(identity.last_digest.get(), Some(DigestAlgorithm::Sha1));
    }

    #[test]
    fn algorithm_selects_digest() {
        let identity = StubIdentity::new(false);
        let response = ResponseBuilder::with_algorithm(
            &identity,
            SignatureAlgorithm::Sha384WithRsa,
            &window(),
        )
        .finalize()
        .unwrap();

        assert_eq!(identity.last_digest.get(), Some(DigestAlgorithm::Sha384));
        assert_eq!(response.signature_algorithm, SignatureAlgorithm::Sha384WithRsa);
        assert_eq!(
            response.signature_algorithm_identifier().oid,
            SignatureAlgorithm::Sha384WithRsa.oid()
        );
    }

    #[test]
    fn signing_failure_returns_builder_untouched() {
        let identity = StubIdentity::new(true);
        let mut builder = ResponseBuilder::new(&identity, &window());
        builder.add_good(cert_id(1));
        builder.add_extended_revoked(cert_id(2));
        builder.set_nonce([9, 9]);

        let before = builder.entries().to_vec();
        let err = builder.finalize().unwrap_err();
        assert!(matches!(err.error(), Error::Signing(_)));
        assert_eq!(identity.calls.get(), 1);

        let builder = err.into_builder();
        assert_eq!(builder.entries(), &before[..]);
        assert_eq!(builder.extensions().len(), 1);
        assert!(!builder.extensions().is_sealed());
        assert!(!builder.extensions().contains(&NONCE));
        assert_eq!(builder.nonce(), Some(&[9u8, 9][..]));
    }
}
