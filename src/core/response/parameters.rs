use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use mdoc_claims_frontend::IndexMap;
use serde::Deserialize;

use crate::core::error::DecodeError;

const DECODE_CONFIG: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// Standard alphabet, padding optional.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, DECODE_CONFIG);

/// URL-safe alphabet, padding optional.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, DECODE_CONFIG);

/// The `vp_token` member of a wallet response.
///
/// OpenID for Verifiable Presentations allows the token to be a single string, an array of
/// strings, or (with DCQL) an object keyed by credential query id:
///
/// ```json
/// { "vp_token": "o2d2ZXJzaW9u..." }
/// { "vp_token": ["o2d2ZXJzaW9u...", "o2d2ZXJzaW9u..."] }
/// { "vp_token": { "mdl": ["o2d2ZXJzaW9u..."] } }
/// ```
///
/// See: [OpenID.VP#section-8.1](https://openid.net/specs/openid-4-verifiable-presentations-1_0.html#section-8.1)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "VpTokenRepr")]
pub enum VpToken {
    Single(String),
    Many(Vec<String>),
    ByQuery(IndexMap<String, Vec<String>>),
}

/// Wire form of [VpToken]. Query ids are read straight into an [IndexMap] so that they keep the
/// order the wallet sent them in.
#[derive(Deserialize)]
#[serde(untagged)]
enum VpTokenRepr {
    Single(String),
    Many(Vec<String>),
    ByQuery(IndexMap<String, StringOrList>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    List(Vec<String>),
}

impl From<VpTokenRepr> for VpToken {
    fn from(repr: VpTokenRepr) -> Self {
        match repr {
            VpTokenRepr::Single(s) => VpToken::Single(s),
            VpTokenRepr::Many(many) => VpToken::Many(many),
            VpTokenRepr::ByQuery(map) => VpToken::ByQuery(
                map.into_iter()
                    .map(|(id, list)| match list {
                        StringOrList::One(s) => (id, vec![s]),
                        StringOrList::List(list) => (id, list),
                    })
                    .collect(),
            ),
        }
    }
}

impl VpToken {
    /// Base64 encoded presentations, in response order.
    pub fn presentations(&self) -> Vec<&str> {
        match self {
            VpToken::Single(s) => vec![s.as_str()],
            VpToken::Many(many) => many.iter().map(String::as_str).collect(),
            VpToken::ByQuery(map) => map.values().flatten().map(String::as_str).collect(),
        }
    }

    /// Presentations returned for a DCQL credential query id.
    pub fn for_query(&self, id: &str) -> Option<&[String]> {
        match self {
            VpToken::ByQuery(map) => map.get(id).map(Vec::as_slice),
            _ => None,
        }
    }
}

/// The binary payload of one presentation, as produced by base64 decoding a `vp_token` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationToken(Vec<u8>);

impl PresentationToken {
    /// Decode a base64 presentation.
    ///
    /// Both the standard and the URL-safe alphabets are accepted, with or without padding.
    /// Surrounding whitespace is trimmed; any other character outside the alphabet is an error.
    pub fn from_base64(encoded: &str) -> Result<Self, DecodeError> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(DecodeError::EmptyToken);
        }

        let bytes = if encoded.contains(['-', '_']) {
            URL_SAFE_LENIENT.decode(encoded)?
        } else {
            STANDARD_LENIENT.decode(encoded)?
        };

        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
