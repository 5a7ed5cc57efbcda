use serde::Deserialize;
use tracing::debug;

use self::parameters::{PresentationToken, VpToken};
use super::error::DecodeError;

pub mod parameters;

/// The response object handed over by the wallet interaction layer, e.g. the parsed `data` of a
/// Digital Credentials API `openid4vp` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PresentationResponse {
    vp_token: VpToken,
}

impl PresentationResponse {
    pub fn new(vp_token: VpToken) -> Self {
        Self { vp_token }
    }

    /// Shorthand for a response carrying exactly one base64 presentation.
    pub fn single(token: impl Into<String>) -> Self {
        Self::new(VpToken::Single(token.into()))
    }

    /// Parse the JSON text returned by the wallet.
    pub fn from_json_str(data: &str) -> Result<Self, DecodeError> {
        serde_json::from_str(data).map_err(DecodeError::InvalidResponse)
    }

    pub fn vp_token(&self) -> &VpToken {
        &self.vp_token
    }

    /// Decode the first presentation of the response.
    pub fn unwrap_token(&self) -> Result<PresentationToken, DecodeError> {
        let presentations = self.vp_token.presentations();
        let first = presentations.first().ok_or(DecodeError::NoPresentation)?;
        if presentations.len() > 1 {
            debug!(
                count = presentations.len(),
                "response carries several presentations, decoding the first"
            );
        }
        PresentationToken::from_base64(first)
    }

    /// Decode every presentation of the response, in response order.
    pub fn unwrap_all(&self) -> Result<Vec<PresentationToken>, DecodeError> {
        let presentations = self.vp_token.presentations();
        if presentations.is_empty() {
            return Err(DecodeError::NoPresentation);
        }
        presentations
            .into_iter()
            .map(PresentationToken::from_base64)
            .collect()
    }
}

impl From<VpToken> for PresentationResponse {
    fn from(vp_token: VpToken) -> Self {
        Self::new(vp_token)
    }
}

/// Decode the presentation carried by a wallet response.
pub fn unwrap_token(response: &PresentationResponse) -> Result<PresentationToken, DecodeError> {
    response.unwrap_token()
}
