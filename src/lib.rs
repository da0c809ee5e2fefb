#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # Usage
//!
//! Load the responder settings and signing identity once, then build one
//! response per request:
//!
//! ```
//! use ocsp_responder::{
//!     CertificateId, DigestAlgorithm, ResponderConfig, ResponseBuilder, SoftToken,
//!     ValidityWindow,
//! };
//! use std::time::{Duration, UNIX_EPOCH};
//! use x509_cert::{crl::RevokedCert, serial_number::SerialNumber, time::Time};
//!
//! let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/examples");
//! let token = SoftToken::open(
//!     "responder",
//!     format!("{dir}/responder-cert.pem"),
//!     format!("{dir}/responder-pkcs8.pem"),
//! )?;
//! let config = ResponderConfig::new("60".parse::<ValidityWindow>()?);
//!
//! // identifiers normally come straight from the request
//! let issuer_name_hash = [0x11; 20];
//! let issuer_key_hash = [0x22; 20];
//! let good = CertificateId::new(
//!     DigestAlgorithm::Sha1,
//!     &issuer_name_hash,
//!     &issuer_key_hash,
//!     SerialNumber::new(&[0x01])?,
//! )?;
//! let revoked = CertificateId::new(
//!     DigestAlgorithm::Sha1,
//!     &issuer_name_hash,
//!     &issuer_key_hash,
//!     SerialNumber::new(&[0x02])?,
//! )?;
//! let crl_entry = RevokedCert {
//!     serial_number: SerialNumber::new(&[0x02])?,
//!     revocation_date: Time::try_from(UNIX_EPOCH + Duration::from_secs(1_672_531_200))?,
//!     crl_entry_extensions: None,
//! };
//!
//! let mut builder = ResponseBuilder::with_algorithm(
//!     &token,
//!     config.signature_algorithm,
//!     &config.validity,
//! );
//! builder.add_good(good);
//! builder.add_revoked(revoked, &crl_entry)?;
//! builder.set_nonce([0x01, 0x02]);
//!
//! let response = builder.finalize().map_err(ocsp_responder::Error::from)?;
//! assert_eq!(response.responses().len(), 2);
//!
//! let body = response.to_ocsp_response_der()?;
//! # assert_eq!(body[0], 0x30);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod algorithm;
pub mod asn1;
pub mod builder;
pub mod config;
pub mod crl;
pub mod errors;
pub mod extensions;
pub mod identity;
pub mod reason;
pub mod response;
pub mod status;

pub use der;
pub use rsa;
pub use x509_cert;

pub use crate::{
    algorithm::{DigestAlgorithm, SignatureAlgorithm},
    builder::{FinalizeError, ResponseBuilder},
    config::{ResponderConfig, ValidityWindow},
    crl::CrlEntry,
    errors::{Error, Result},
    extensions::{ExtensionSet, SealedExtensions},
    identity::{SigningIdentity, SigningMaterial, SoftToken},
    reason::ReasonCode,
    response::{unsuccessful_response_der, ResponderIdKind, ResponseStatus, SignedResponse},
    status::{CertStatus, CertificateId, SingleStatusEntry},
};
