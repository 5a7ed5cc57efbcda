//! mdoc claim data structures that are needed on the frontend, without the CBOR and base64
//! dependencies of the decoder itself.
use std::fmt;

pub use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as Json;

/// Elements disclosed within a single namespace, in presentation order.
pub type NamespaceClaims = IndexMap<String, ClaimValue>;

/// A normalized data element value.
///
/// Binary values never reach this type as raw bytes: they are carried as printable base64 text
/// in [ClaimValue::Binary].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ClaimValue {
    Text(String),
    Bool(bool),
    Integer(i64),
    /// ISO-8601 rendering of a `full-date` or `tdate` element.
    Date(String),
    /// Base64 rendering of a byte string element, e.g. `portrait`.
    Binary(String),
    Array(Vec<ClaimValue>),
    Map(IndexMap<String, ClaimValue>),
}

impl ClaimValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ClaimValue::Text(s) | ClaimValue::Date(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ClaimValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ClaimValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// The base64 text of a binary element.
    pub fn as_binary(&self) -> Option<&str> {
        match self {
            ClaimValue::Binary(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, ClaimValue::Binary(_))
    }
}

/// Stringification used when a claim is rendered or forwarded as text, e.g. as a query
/// parameter.
impl fmt::Display for ClaimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimValue::Text(s) | ClaimValue::Date(s) | ClaimValue::Binary(s) => f.write_str(s),
            ClaimValue::Bool(b) => write!(f, "{b}"),
            ClaimValue::Integer(i) => write!(f, "{i}"),
            ClaimValue::Array(items) => {
                let items: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&items.join(","))
            }
            ClaimValue::Map(_) => f.write_str(&Json::from(self.clone()).to_string()),
        }
    }
}

impl From<ClaimValue> for Json {
    fn from(value: ClaimValue) -> Self {
        match value {
            ClaimValue::Text(s) | ClaimValue::Date(s) | ClaimValue::Binary(s) => Json::String(s),
            ClaimValue::Bool(b) => Json::Bool(b),
            ClaimValue::Integer(i) => Json::from(i),
            ClaimValue::Array(items) => Json::Array(items.into_iter().map(Json::from).collect()),
            ClaimValue::Map(map) => {
                Json::Object(map.into_iter().map(|(k, v)| (k, Json::from(v))).collect())
            }
        }
    }
}

/// Non-fatal condition noticed while projecting a presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Diagnostic {
    /// A requested namespace was not disclosed by the document.
    NamespaceNotFound { namespace: String },
    /// The presentation held more documents than were projected.
    DocumentsIgnored { selected: usize, total: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NamespaceNotFound { namespace } => {
                write!(f, "namespace {namespace} not found in the credential")
            }
            Diagnostic::DocumentsIgnored { selected, total } => {
                write!(f, "projected document {selected} of {total}, others were ignored")
            }
        }
    }
}

/// Claims extracted from one document, keyed by namespace and then by element identifier.
///
/// Namespaces keep the order in which they were requested, elements keep the order in which the
/// issuer encoded them. Serializes as the nested object only, diagnostics are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectedClaims {
    namespaces: IndexMap<String, NamespaceClaims>,
    diagnostics: Vec<Diagnostic>,
}

impl ProjectedClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the claims of a namespace.
    ///
    /// Returns the claims previously stored under that namespace, if any.
    pub fn insert(
        &mut self,
        namespace: impl Into<String>,
        claims: NamespaceClaims,
    ) -> Option<NamespaceClaims> {
        self.namespaces.insert(namespace.into(), claims)
    }

    pub fn record(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic)
    }

    pub fn namespace(&self, namespace: &str) -> Option<&NamespaceClaims> {
        self.namespaces.get(namespace)
    }

    pub fn get(&self, namespace: &str, element: &str) -> Option<&ClaimValue> {
        self.namespaces.get(namespace)?.get(element)
    }

    pub fn contains_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &NamespaceClaims)> {
        self.namespaces.iter()
    }

    /// Total number of elements across all namespaces.
    pub fn element_count(&self) -> usize {
        self.namespaces.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_inner(self) -> IndexMap<String, NamespaceClaims> {
        self.namespaces
    }
}

impl Serialize for ProjectedClaims {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.namespaces.serialize(serializer)
    }
}

impl From<ProjectedClaims> for Json {
    fn from(value: ProjectedClaims) -> Self {
        Json::Object(
            value
                .namespaces
                .into_iter()
                .map(|(namespace, claims)| {
                    let claims = claims.into_iter().map(|(k, v)| (k, Json::from(v))).collect();
                    (namespace, Json::Object(claims))
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ProjectedClaims {
        let mut claims = NamespaceClaims::new();
        claims.insert("given_name".into(), ClaimValue::Text("Jane".into()));
        claims.insert("age_over_21".into(), ClaimValue::Bool(true));
        claims.insert("portrait".into(), ClaimValue::Binary("AAEC".into()));

        let mut projected = ProjectedClaims::new();
        projected.insert("org.iso.18013.5.1", claims);
        projected.record(Diagnostic::NamespaceNotFound {
            namespace: "org.iso.7367.1".into(),
        });
        projected
    }

    #[test]
    fn serializes_as_nested_object() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            json!({
                "org.iso.18013.5.1": {
                    "given_name": "Jane",
                    "age_over_21": true,
                    "portrait": "AAEC"
                }
            })
        );
        assert_eq!(Json::from(sample()), value);
    }

    #[test]
    fn json_keeps_element_order() {
        let mut claims = NamespaceClaims::new();
        claims.insert("zeta".into(), ClaimValue::Text("1".into()));
        claims.insert("alpha".into(), ClaimValue::Text("2".into()));
        let mut projected = ProjectedClaims::new();
        projected.insert("org.example.z", claims.clone());
        projected.insert("org.example.a", claims);

        for value in [
            Json::from(projected.clone()),
            serde_json::to_value(&projected).unwrap(),
        ] {
            let namespaces = value.as_object().unwrap();
            let keys: Vec<&str> = namespaces.keys().map(String::as_str).collect();
            assert_eq!(keys, ["org.example.z", "org.example.a"]);

            let elements = namespaces["org.example.z"].as_object().unwrap();
            let keys: Vec<&str> = elements.keys().map(String::as_str).collect();
            assert_eq!(keys, ["zeta", "alpha"]);
        }

        let nested = ClaimValue::Map(
            [
                ("zeta".to_owned(), ClaimValue::Bool(true)),
                ("alpha".to_owned(), ClaimValue::Integer(1)),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(nested.to_string(), r#"{"zeta":true,"alpha":1}"#);
    }

    #[test]
    fn lookup_by_namespace_and_element() {
        let projected = sample();
        assert_eq!(
            projected
                .get("org.iso.18013.5.1", "given_name")
                .and_then(ClaimValue::as_str),
            Some("Jane")
        );
        assert_eq!(projected.get("org.iso.7367.1", "given_name"), None);
        assert_eq!(projected.element_count(), 3);
        assert_eq!(projected.diagnostics().len(), 1);
    }

    #[test]
    fn display_stringifies_booleans() {
        assert_eq!(ClaimValue::Bool(false).to_string(), "false");
        assert_eq!(ClaimValue::Integer(42).to_string(), "42");
        assert_eq!(
            Diagnostic::NamespaceNotFound {
                namespace: "org.iso.7367.1".into()
            }
            .to_string(),
            "namespace org.iso.7367.1 not found in the credential"
        );
    }
}
