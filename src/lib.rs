//! This library extracts selectively disclosed claims from [ISO/IEC 18013-5] mdoc
//! presentations, such as the `vp_token` a wallet returns through the Digital Credentials API.
//!
//! [ISO/IEC 18013-5]: <https://www.iso.org/standard/69084.html>
//!
//! # Usage
//!
//! Request the fields you need, hand the wallet's answer to a [`Decoder`], and read the claims
//! back by namespace and element identifier:
//!
//! ```ignore
//! use mdoc_claims::core::presentation_request::mdl_request;
//! use mdoc_claims::core::projection::NAMESPACE_ISO_MDL;
//! use mdoc_claims::core::response::PresentationResponse;
//! use mdoc_claims::decoder::Decoder;
//!
//! // Build the request passed to `navigator.credentials.get` with protocol `openid4vp`.
//! let request = mdl_request(nonce, "www.mysite.com");
//! let request_json = serde_json::to_string(&request)?;
//!
//! // The wallet interaction layer returns the response `data` as JSON text.
//! let response = PresentationResponse::from_json_str(&credential_response_data)?;
//!
//! let claims = Decoder::default().decode_for_request(&response, &request)?;
//! let given_name = claims.get(NAMESPACE_ISO_MDL, "given_name");
//! let portrait = claims.get(NAMESPACE_ISO_MDL, "portrait"); // base64 text
//!
//! for diagnostic in claims.diagnostics() {
//!     eprintln!("{diagnostic}");
//! }
//! ```
//!
//! # Pipeline
//!
//! 1. *Token unwrapping*: the base64 `vp_token` of a [`PresentationResponse`] is decoded into a
//!    [`PresentationToken`]. Text that is not base64 fails as
//!    [`ErrorCategory::MalformedInput`].
//! 2. *Document parsing*: the token is read as a CBOR `DeviceResponse` and turned into
//!    [`Document`]s, each holding its namespaces and the elements recovered from their
//!    `IssuerSignedItem` envelopes. Bytes that do not match that grammar fail as
//!    [`ErrorCategory::StructurallyInvalid`], nothing is partially returned.
//! 3. *Projection*: the requested namespaces are copied, in request order, into
//!    [`ProjectedClaims`]. Byte strings are base64 encoded on the way out. A namespace the
//!    document does not disclose is reported as a [`Diagnostic`] rather than an error.
//!
//! Issuer signatures, device authentication and certificate chains are not verified: the
//! `issuerAuth` and `deviceSigned` structures are kept undecoded on the [`Document`].
//!
//! Every step is a synchronous transform of its input, so separate presentations (say a
//! driving licence and a vehicle registration) can be decoded concurrently without
//! coordination.
//!
//! [`Decoder`]: crate::decoder::Decoder
//! [`PresentationResponse`]: crate::core::response::PresentationResponse
//! [`PresentationToken`]: crate::core::response::parameters::PresentationToken
//! [`ErrorCategory::MalformedInput`]: crate::core::error::ErrorCategory::MalformedInput
//! [`ErrorCategory::StructurallyInvalid`]: crate::core::error::ErrorCategory::StructurallyInvalid
//! [`Document`]: crate::core::mdoc::Document
//! [`ProjectedClaims`]: mdoc_claims_frontend::ProjectedClaims
//! [`Diagnostic`]: mdoc_claims_frontend::Diagnostic

pub mod config;
pub mod core;
pub mod decoder;
pub mod utils;

pub use mdoc_claims_frontend::{ClaimValue, Diagnostic, NamespaceClaims, ProjectedClaims};
