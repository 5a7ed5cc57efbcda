use base64::prelude::*;
use mdoc_claims_frontend::{ClaimValue, Diagnostic, IndexMap, NamespaceClaims, ProjectedClaims};
use serde::Deserialize;
use tracing::warn;

use super::mdoc::{Document, ElementValue};
use crate::utils::{dedup_ordered, to_human_readable_string};

/// Namespace of the mobile driving licence data elements (ISO/IEC 18013-5).
pub const NAMESPACE_ISO_MDL: &str = "org.iso.18013.5.1";

/// Namespace of the mobile vehicle registration certificate data elements (ISO/IEC 7367).
pub const NAMESPACE_ISO_MVRC: &str = "org.iso.7367.1";

/// Text encoding applied to byte string elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryEncoding {
    /// RFC 4648 §4 base64 with padding, suitable for `data:` URLs.
    #[default]
    Standard,
    /// RFC 4648 §5 base64url without padding.
    UrlSafeNoPad,
}

impl BinaryEncoding {
    pub fn encode(&self, bytes: &[u8]) -> String {
        match self {
            BinaryEncoding::Standard => BASE64_STANDARD.encode(bytes),
            BinaryEncoding::UrlSafeNoPad => BASE64_URL_SAFE_NO_PAD.encode(bytes),
        }
    }
}

/// Projects the namespaces of a [Document] into [ProjectedClaims].
#[derive(Debug, Clone, Copy, Default)]
pub struct Projector {
    binary_encoding: BinaryEncoding,
}

impl Projector {
    pub fn new(binary_encoding: BinaryEncoding) -> Self {
        Self { binary_encoding }
    }

    /// Project the requested namespaces, in the order they are requested.
    ///
    /// A namespace the document does not disclose is skipped and reported as a
    /// [Diagnostic::NamespaceNotFound]; the remaining namespaces are still projected. Repeated
    /// namespaces are projected once.
    pub fn project<S: AsRef<str>>(&self, doc: &Document, namespaces: &[S]) -> ProjectedClaims {
        let mut projected = ProjectedClaims::new();

        for namespace in dedup_ordered(namespaces) {
            let Some(block) = doc.namespace(namespace) else {
                warn!(
                    namespace,
                    doc_type = doc.doc_type(),
                    "namespace not found in the credential"
                );
                projected.record(Diagnostic::NamespaceNotFound {
                    namespace: namespace.to_owned(),
                });
                continue;
            };

            let claims: NamespaceClaims = block
                .elements()
                .iter()
                .map(|e| (e.identifier().to_owned(), self.normalize(e.value())))
                .collect();
            projected.insert(namespace, claims);
        }

        projected
    }

    /// Map an element value onto its output form. Byte strings become printable text, every
    /// other variant is carried over as is.
    pub fn normalize(&self, value: &ElementValue) -> ClaimValue {
        match value {
            ElementValue::Bytes(bytes) => ClaimValue::Binary(self.binary_encoding.encode(bytes)),
            ElementValue::Bool(b) => ClaimValue::Bool(*b),
            ElementValue::Text(s) => ClaimValue::Text(s.clone()),
            ElementValue::Integer(i) => ClaimValue::Integer(*i),
            ElementValue::Date(date) => ClaimValue::Date(date.to_iso_string()),
            ElementValue::Array(items) => {
                ClaimValue::Array(items.iter().map(|item| self.normalize(item)).collect())
            }
            ElementValue::Map(entries) => ClaimValue::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), self.normalize(v)))
                    .collect::<IndexMap<_, _>>(),
            ),
        }
    }
}

/// Project `namespaces` out of `doc` with the default (standard base64) binary encoding.
pub fn project<S: AsRef<str>>(doc: &Document, namespaces: &[S]) -> ProjectedClaims {
    Projector::default().project(doc, namespaces)
}

/// Project the mobile driving licence namespace.
pub fn project_mdl(doc: &Document) -> ProjectedClaims {
    project(doc, &[NAMESPACE_ISO_MDL])
}

/// Labels and display strings of a projected namespace, e.g. `("Age Over 21", "true")`.
pub fn display_fields(claims: &ProjectedClaims, namespace: &str) -> Vec<(String, String)> {
    claims
        .namespace(namespace)
        .map(|elements| {
            elements
                .iter()
                .map(|(id, value)| (to_human_readable_string(id.as_str()), value.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mdoc::{fixtures::*, DeviceResponse};
    use ciborium::Value as Cbor;
    use serde_json::json;

    fn first_document(value: &Cbor) -> Document {
        DeviceResponse::from_bytes(&to_vec(value))
            .unwrap()
            .into_documents()
            .remove(0)
    }

    #[test]
    fn projects_mdl_claims() {
        let doc = first_document(&device_response(vec![mdl()]));
        let claims = project(&doc, &[NAMESPACE_ISO_MDL]);

        assert_eq!(
            serde_json::to_value(&claims).unwrap(),
            json!({
                "org.iso.18013.5.1": {
                    "given_name": "Jane",
                    "family_name": "Doe",
                    "age_over_21": true,
                    "portrait": BASE64_STANDARD.encode(portrait()),
                }
            })
        );
        assert!(claims.diagnostics().is_empty());
        assert_eq!(project_mdl(&doc), claims);
    }

    #[test]
    fn binary_values_reverse_decode() {
        let doc = first_document(&device_response(vec![mdl()]));
        for encoding in [BinaryEncoding::Standard, BinaryEncoding::UrlSafeNoPad] {
            let claims = Projector::new(encoding).project(&doc, &[NAMESPACE_ISO_MDL]);
            let text = claims
                .get(NAMESPACE_ISO_MDL, "portrait")
                .and_then(ClaimValue::as_binary)
                .unwrap();
            let decoded = match encoding {
                BinaryEncoding::Standard => BASE64_STANDARD.decode(text).unwrap(),
                BinaryEncoding::UrlSafeNoPad => BASE64_URL_SAFE_NO_PAD.decode(text).unwrap(),
            };
            assert_eq!(decoded, portrait());
        }
    }

    #[test]
    fn missing_namespace_is_reported_not_fatal() {
        let doc = first_document(&device_response(vec![mdl()]));
        let claims = project(&doc, &["org.iso.7367.1", NAMESPACE_ISO_MDL]);

        assert_eq!(
            claims.iter().map(|(ns, _)| ns.as_str()).collect::<Vec<_>>(),
            [NAMESPACE_ISO_MDL]
        );
        assert_eq!(
            claims.diagnostics(),
            &[Diagnostic::NamespaceNotFound {
                namespace: "org.iso.7367.1".into()
            }]
        );
    }

    #[test]
    fn preserves_requested_and_encoded_order() {
        let doc = first_document(&device_response(vec![document(
            "org.example.multi",
            vec![
                ("org.example.a", vec![("z", text("1")), ("a", text("2"))]),
                ("org.example.b", vec![("m", Cbor::Bool(false))]),
                ("org.example.c", vec![("x", Cbor::Integer(3.into()))]),
            ],
        )]));

        let claims = project(
            &doc,
            &["org.example.c", "org.example.a", "org.example.b", "org.example.a"],
        );
        let namespaces: Vec<&str> = claims.iter().map(|(ns, _)| ns.as_str()).collect();
        assert_eq!(namespaces, ["org.example.c", "org.example.a", "org.example.b"]);

        let keys: Vec<&str> = claims
            .namespace("org.example.a")
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, ["z", "a"]);
        assert_eq!(claims.element_count(), doc.element_count());
    }

    #[test]
    fn composite_values_pass_through() {
        let privileges = Cbor::Array(vec![Cbor::Map(vec![
            (text("vehicle_category_code"), text("B")),
            (text("issue_date"), full_date("2020-01-01")),
            (text("codes"), Cbor::Array(vec![Cbor::Integer(78.into())])),
        ])]);
        let doc = first_document(&device_response(vec![document(
            "org.iso.18013.5.1.mDL",
            vec![(
                NAMESPACE_ISO_MDL,
                vec![
                    ("driving_privileges", privileges),
                    ("signature_usual_mark", Cbor::Bytes(vec![1, 2, 3])),
                ],
            )],
        )]));

        let claims = project(&doc, &[NAMESPACE_ISO_MDL]);
        assert_eq!(
            serde_json::to_value(&claims).unwrap(),
            json!({
                "org.iso.18013.5.1": {
                    "driving_privileges": [{
                        "vehicle_category_code": "B",
                        "issue_date": "2020-01-01",
                        "codes": [78]
                    }],
                    "signature_usual_mark": "AQID"
                }
            })
        );
    }

    #[test]
    fn display_fields_use_labels() {
        let doc = first_document(&device_response(vec![mvrc()]));
        let claims = project(&doc, &[NAMESPACE_ISO_MVRC]);
        assert_eq!(
            display_fields(&claims, NAMESPACE_ISO_MVRC),
            vec![
                ("Registration Number".to_string(), "AB-123-CD".to_string()),
                ("Date Of Registration".to_string(), "2021-06-15".to_string()),
                (
                    "Vehicle Identification Number".to_string(),
                    "1HGCM82633A004352".to_string()
                ),
            ]
        );
        assert!(display_fields(&claims, NAMESPACE_ISO_MDL).is_empty());
    }
}
