use mdoc_claims_frontend::{Diagnostic, ProjectedClaims};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::DecoderConfig;
use crate::core::{
    error::DecodeError,
    mdoc::DeviceResponse,
    presentation_request::PresentationRequest,
    projection::Projector,
    response::{parameters::PresentationToken, PresentationResponse},
};

/// Turns wallet responses into [ProjectedClaims].
///
/// A decoder holds no state besides its configuration and can be shared between threads, each
/// call works on its own token.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
    projector: Projector,
}

/// The claims of one document of a presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentClaims {
    pub doc_type: String,
    pub claims: ProjectedClaims,
}

impl Decoder {
    pub fn new(config: DecoderConfig) -> Self {
        let projector = Projector::new(config.binary_encoding);
        Self { config, projector }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode the configured default namespaces.
    pub fn decode(&self, response: &PresentationResponse) -> Result<ProjectedClaims, DecodeError> {
        self.decode_namespaces(response, &self.config.default_namespaces[..])
    }

    /// Decode the namespaces asked for by `request`, falling back to the configured defaults
    /// when none of its field paths addresses an mdoc namespace.
    pub fn decode_for_request(
        &self,
        response: &PresentationResponse,
        request: &PresentationRequest,
    ) -> Result<ProjectedClaims, DecodeError> {
        let namespaces = request.requested_namespaces();
        if namespaces.is_empty() {
            return self.decode(response);
        }
        self.decode_namespaces(response, &namespaces[..])
    }

    pub fn decode_namespaces<S: AsRef<str>>(
        &self,
        response: &PresentationResponse,
        namespaces: &[S],
    ) -> Result<ProjectedClaims, DecodeError> {
        let token = response.unwrap_token()?;
        self.decode_token(&token, namespaces)
    }

    /// Project the configured document of an already unwrapped presentation.
    pub fn decode_token<S: AsRef<str>>(
        &self,
        token: &PresentationToken,
        namespaces: &[S],
    ) -> Result<ProjectedClaims, DecodeError> {
        let device_response = DeviceResponse::from_token(token)?;
        let index = self.config.document_index;
        let doc = device_response.document(index)?;

        let mut claims = self.projector.project(doc, namespaces);

        let total = device_response.documents().len();
        if total > 1 {
            warn!(
                selected = index,
                total,
                "presentation holds several documents, only one was projected"
            );
            claims.record(Diagnostic::DocumentsIgnored {
                selected: index,
                total,
            });
        }

        debug!(
            doc_type = doc.doc_type(),
            elements = claims.element_count(),
            "projected presentation"
        );
        Ok(claims)
    }

    /// Project every document of every presentation in the response, in presentation order.
    pub fn decode_all<S: AsRef<str>>(
        &self,
        response: &PresentationResponse,
        namespaces: &[S],
    ) -> Result<Vec<DocumentClaims>, DecodeError> {
        let mut documents = Vec::new();
        for token in response.unwrap_all()? {
            let device_response = DeviceResponse::from_token(&token)?;
            documents.extend(device_response.documents().iter().map(|doc| DocumentClaims {
                doc_type: doc.doc_type().to_owned(),
                claims: self.projector.project(doc, namespaces),
            }));
        }
        Ok(documents)
    }
}

/// Decode a wallet response with the default configuration.
///
/// An empty `namespaces` slice selects the mobile driving licence namespace.
pub fn decode_credential<S: AsRef<str>>(
    response: &PresentationResponse,
    namespaces: &[S],
) -> Result<ProjectedClaims, DecodeError> {
    let decoder = Decoder::default();
    if namespaces.is_empty() {
        return decoder.decode(response);
    }
    decoder.decode_namespaces(response, namespaces)
}
