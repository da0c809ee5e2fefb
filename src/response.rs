//! Signed responses and response envelopes.

use core::{fmt, str::FromStr, time::Duration};
use der::{asn1::OctetString, Encode};
use spki::AlgorithmIdentifierOwned;
use std::time::SystemTime;
use x509_cert::Certificate;

use crate::{
    algorithm::{DigestAlgorithm, SignatureAlgorithm},
    asn1::{BasicOcspResponse, OcspResponse, OcspResponseStatus, ResponderId},
    config::RESPONDER_ID,
    errors::{Error, Result},
    extensions::SealedExtensions,
    status::SingleStatusEntry,
};

/// How long a signed response itself is considered fresh, counted from
/// `producedAt`.
pub const RESPONSE_LIFETIME: Duration = Duration::from_secs(5 * 60);

/// Form of the `responderID` field.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ResponderIdKind {
    /// Subject name of the responder certificate.
    #[default]
    ByName,

    /// SHA-1 hash of the responder's public key.
    ByKey,
}

impl ResponderIdKind {
    /// Configuration name, `name` or `key`.
    pub const fn name(self) -> &'static str {
        match self {
            ResponderIdKind::ByName => "name",
            ResponderIdKind::ByKey => "key",
        }
    }

    /// Build the `responderID` for `certificate`.
    pub fn responder_id(self, certificate: &Certificate) -> Result<ResponderId> {
        let tbs = &certificate.tbs_certificate;
        Ok(match self {
            ResponderIdKind::ByName => ResponderId::ByName(tbs.subject.clone()),
            ResponderIdKind::ByKey => {
                let key_bits = tbs.subject_public_key_info.subject_public_key.raw_bytes();
                ResponderId::ByKey(OctetString::new(DigestAlgorithm::Sha1.digest(key_bits))?)
            }
        })
    }
}

impl FromStr for ResponderIdKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" | "byname" => Ok(ResponderIdKind::ByName),
            "key" | "bykey" => Ok(ResponderIdKind::ByKey),
            _ => Err(Error::Configuration {
                key: RESPONDER_ID,
                reason: format!("expected `name` or `key`, got {:?}", s),
            }),
        }
    }
}

impl fmt::Display for ResponderIdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Status of a response that carries no signed body.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ResponseStatus {
    /// `malformedRequest (1)`: illegal confirmation request.
    MalformedRequest,
    /// `internalError (2)`: internal error in issuer.
    InternalError,
    /// `tryLater (3)`: try again later.
    TryLater,
    /// `sigRequired (5)`: must sign the request.
    SigRequired,
    /// `unauthorized (6)`: request unauthorized.
    Unauthorized,
}

impl From<ResponseStatus> for OcspResponseStatus {
    fn from(status: ResponseStatus) -> Self {
        match status {
            ResponseStatus::MalformedRequest => OcspResponseStatus::MalformedRequest,
            ResponseStatus::InternalError => OcspResponseStatus::InternalError,
            ResponseStatus::TryLater => OcspResponseStatus::TryLater,
            ResponseStatus::SigRequired => OcspResponseStatus::SigRequired,
            ResponseStatus::Unauthorized => OcspResponseStatus::Unauthorized,
        }
    }
}

/// DER encoded `OCSPResponse` with `status` and no `responseBytes`.
pub fn unsuccessful_response_der(status: ResponseStatus) -> Result<Vec<u8>> {
    Ok(OcspResponse::unsuccessful(status.into()).to_der()?)
}

/// A finalized, signed `BasicOCSPResponse`.
///
/// Holds both the logical values the response was built from and the encoded
/// structure that was signed.
#[derive(Clone, Debug)]
pub struct SignedResponse {
    /// `responderID` of the response.
    pub responder_id: ResponderId,

    /// `producedAt`, truncated to whole seconds.
    pub produced_at: SystemTime,

    /// End of the response's own validity, [`RESPONSE_LIFETIME`] after
    /// `produced_at`.
    pub valid_until: SystemTime,

    /// Algorithm the response was signed with.
    pub signature_algorithm: SignatureAlgorithm,

    pub(crate) entries: Vec<SingleStatusEntry>,
    pub(crate) extensions: SealedExtensions,
    pub(crate) tbs_der: Vec<u8>,
    pub(crate) basic: BasicOcspResponse,
}

impl SignedResponse {
    /// Status records, in the order they were added.
    pub fn responses(&self) -> &[SingleStatusEntry] {
        &self.entries
    }

    /// Sealed `responseExtensions`.
    pub fn extensions(&self) -> &SealedExtensions {
        &self.extensions
    }

    /// Signature over [`SignedResponse::tbs_response_data`].
    pub fn signature(&self) -> &[u8] {
        self.basic.signature.raw_bytes()
    }

    /// `signatureAlgorithm` field value.
    pub fn signature_algorithm_identifier(&self) -> &AlgorithmIdentifierOwned {
        &self.basic.signature_algorithm
    }

    /// Certificates shipped with the response, the responder's first.
    pub fn certificates(&self) -> &[Certificate] {
        self.basic.certs.as_deref().unwrap_or_default()
    }

    /// DER encoding of `tbsResponseData`, exactly the bytes that were signed.
    pub fn tbs_response_data(&self) -> &[u8] {
        &self.tbs_der
    }

    /// Encoded structure.
    pub fn basic_response(&self) -> &BasicOcspResponse {
        &self.basic
    }

    /// DER encoded `BasicOCSPResponse`.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.basic.to_der()?)
    }

    /// DER encoded `OCSPResponse` with status `successful`, ready to be sent
    /// to a client.
    pub fn to_ocsp_response_der(&self) -> Result<Vec<u8>> {
        Ok(OcspResponse::successful(&self.basic)?.to_der()?)
    }

    /// Is the response still fresh at `now`?
    pub fn is_fresh_at(&self, now: SystemTime) -> bool {
        self.produced_at <= now && now <= self.valid_until
    }
}

impl From<SignedResponse> for BasicOcspResponse {
    fn from(response: SignedResponse) -> Self {
        response.basic
    }
}
