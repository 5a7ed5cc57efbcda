//! ISO/IEC 18013-5 device response model.
//!
//! Only the parts needed to recover disclosed data elements are interpreted:
//!
//! ```cddl
//! DeviceResponse = {
//!   "version" : tstr,
//!   ? "documents" : [+Document],
//!   ? "documentErrors" : [+DocumentError],
//!   "status" : uint
//! }
//! Document = {
//!   "docType" : DocType,
//!   "issuerSigned" : IssuerSigned,
//!   ? "deviceSigned" : DeviceSigned,
//!   ? "errors" : Errors
//! }
//! IssuerSigned = {
//!   ? "nameSpaces" : IssuerNameSpaces,
//!   "issuerAuth" : IssuerAuth
//! }
//! IssuerNameSpaces = { + NameSpace => [ + IssuerSignedItemBytes ] }
//! IssuerSignedItemBytes = #6.24(bstr .cbor IssuerSignedItem)
//! IssuerSignedItem = {
//!   "digestID" : uint,
//!   "random" : bstr,
//!   "elementIdentifier" : DataElementIdentifier,
//!   "elementValue" : DataElementValue
//! }
//! ```
//!
//! `issuerAuth` and `deviceSigned` are kept as opaque CBOR, nothing here verifies them.
//! Although `documents` and `nameSpaces` are optional in the grammar above, a presentation without
//! them discloses nothing and is rejected.

use ciborium::Value as Cbor;
use tracing::{debug, warn};

use self::cbor::Fields;
use super::{error::DecodeError, response::parameters::PresentationToken};

pub mod cbor;
pub mod value;

pub use value::{DateValue, ElementValue};

/// Status code of a successful device response.
pub const STATUS_OK: u64 = 0;

/// A parsed `DeviceResponse`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceResponse {
    version: String,
    documents: Vec<Document>,
    document_errors: Vec<DocumentError>,
    status: u64,
}

/// A document the wallet declined or failed to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentError {
    pub doc_type: String,
    pub code: i64,
}

/// One issuer-signed credential of a presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    doc_type: String,
    namespaces: Vec<NamespaceBlock>,
    issuer_auth: Option<Cbor>,
    device_signed: Option<Cbor>,
}

/// The disclosed elements of a single namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceBlock {
    namespace: String,
    elements: Vec<Element>,
}

/// A disclosed data element, recovered from its `IssuerSignedItem` envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    identifier: String,
    value: ElementValue,
    digest_id: u64,
    random: Vec<u8>,
}

/// Parse every document of a presentation, in presentation order.
pub fn parse(token: &PresentationToken) -> Result<Vec<Document>, DecodeError> {
    DeviceResponse::from_token(token).map(DeviceResponse::into_documents)
}

impl DeviceResponse {
    pub fn from_token(token: &PresentationToken) -> Result<Self, DecodeError> {
        Self::from_bytes(token.as_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let value = cbor::from_slice(bytes, "$")?;
        let response = Self::from_cbor(value)?;

        debug!(
            version = %response.version,
            status = response.status,
            documents = response.documents.len(),
            "parsed device response"
        );
        if response.status != STATUS_OK {
            warn!(status = response.status, "device response reports a non-zero status");
        }
        for error in &response.document_errors {
            warn!(
                doc_type = %error.doc_type,
                code = error.code,
                "wallet returned a document error"
            );
        }

        Ok(response)
    }

    fn from_cbor(value: Cbor) -> Result<Self, DecodeError> {
        let mut fields = Fields::new(value, "$")?;

        let version = cbor::into_text(fields.require("version")?, &fields.child("version"))?;
        let status = cbor::into_uint(fields.require("status")?, &fields.child("status"))?;

        let documents_path = fields.child("documents");
        let documents = cbor::into_array(fields.require("documents")?, &documents_path)?
            .into_iter()
            .enumerate()
            .map(|(i, doc)| Document::from_cbor(doc, format!("documents[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;

        let document_errors = match fields.take("documentErrors") {
            Some(errors) => parse_document_errors(errors, &fields.child("documentErrors"))?,
            None => Vec::new(),
        };

        Ok(Self {
            version,
            documents,
            document_errors,
            status,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn status(&self) -> u64 {
        self.status
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, index: usize) -> Result<&Document, DecodeError> {
        self.documents
            .get(index)
            .ok_or(DecodeError::DocumentOutOfRange {
                index,
                count: self.documents.len(),
            })
    }

    pub fn document_errors(&self) -> &[DocumentError] {
        &self.document_errors
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }
}

fn parse_document_errors(value: Cbor, path: &str) -> Result<Vec<DocumentError>, DecodeError> {
    let mut errors = Vec::new();
    for (i, entry) in cbor::into_array(value, path)?.into_iter().enumerate() {
        let entry_path = format!("{path}[{i}]");
        for (doc_type, code) in cbor::into_map(entry, &entry_path)? {
            let doc_type = cbor::into_text(doc_type, &entry_path)?;
            let code = match code {
                Cbor::Integer(code) => cbor::into_int(code, &entry_path)?,
                other => {
                    return Err(DecodeError::UnexpectedType {
                        path: entry_path,
                        expected: "integer",
                        found: cbor::type_name(&other),
                    })
                }
            };
            errors.push(DocumentError { doc_type, code });
        }
    }
    Ok(errors)
}

impl Document {
    fn from_cbor(value: Cbor, path: String) -> Result<Self, DecodeError> {
        let mut fields = Fields::new(value, path)?;

        let doc_type = cbor::into_text(fields.require("docType")?, &fields.child("docType"))?;
        let device_signed = fields.take("deviceSigned");

        let mut issuer_signed = Fields::new(
            fields.require("issuerSigned")?,
            fields.child("issuerSigned"),
        )?;
        let issuer_auth = issuer_signed.take("issuerAuth");

        let namespaces_path = issuer_signed.child("nameSpaces");
        let entries = cbor::into_map(issuer_signed.require("nameSpaces")?, &namespaces_path)?;

        let mut namespaces: Vec<NamespaceBlock> = Vec::with_capacity(entries.len());
        for (namespace, items) in entries {
            let namespace = cbor::into_text(namespace, &namespaces_path)?;
            if namespaces.iter().any(|block| block.namespace == namespace) {
                return Err(DecodeError::DuplicateKey {
                    path: namespaces_path,
                    key: namespace,
                });
            }
            let block_path = format!("{namespaces_path}[\"{namespace}\"]");
            namespaces.push(NamespaceBlock::from_cbor(namespace, items, &block_path)?);
        }

        Ok(Self {
            doc_type,
            namespaces,
            issuer_auth,
            device_signed,
        })
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    pub fn namespaces(&self) -> &[NamespaceBlock] {
        &self.namespaces
    }

    pub fn namespace(&self, namespace: &str) -> Option<&NamespaceBlock> {
        self.namespaces.iter().find(|block| block.namespace == namespace)
    }

    /// The `issuerAuth` COSE_Sign1 structure, undecoded.
    pub fn issuer_auth(&self) -> Option<&Cbor> {
        self.issuer_auth.as_ref()
    }

    /// The `deviceSigned` structure, undecoded.
    pub fn device_signed(&self) -> Option<&Cbor> {
        self.device_signed.as_ref()
    }

    pub fn element_count(&self) -> usize {
        self.namespaces.iter().map(NamespaceBlock::len).sum()
    }
}

impl NamespaceBlock {
    fn from_cbor(namespace: String, items: Cbor, path: &str) -> Result<Self, DecodeError> {
        let items = cbor::into_array(items, path)?;

        let mut elements: Vec<Element> = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let element = Element::from_envelope(item, &format!("{path}[{i}]"))?;
            if elements.iter().any(|e| e.identifier == element.identifier) {
                return Err(DecodeError::DuplicateKey {
                    path: path.to_owned(),
                    key: element.identifier,
                });
            }
            elements.push(element);
        }

        Ok(Self {
            namespace,
            elements,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn get(&self, identifier: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.identifier == identifier)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl Element {
    fn from_envelope(envelope: Cbor, path: &str) -> Result<Self, DecodeError> {
        let item = cbor::unwrap_encoded_cbor(envelope, path)?;
        let mut fields = Fields::new(item, path)?;

        let digest_id = cbor::into_uint(fields.require("digestID")?, &fields.child("digestID"))?;
        let random = cbor::into_bytes(fields.require("random")?, &fields.child("random"))?;
        let identifier = cbor::into_text(
            fields.require("elementIdentifier")?,
            &fields.child("elementIdentifier"),
        )?;
        let value_path = format!("{}.{identifier}", fields.path());
        let value = ElementValue::from_cbor(fields.require("elementValue")?, &value_path)?;

        Ok(Self {
            identifier,
            value,
            digest_id,
            random,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn value(&self) -> &ElementValue {
        &self.value
    }

    pub fn digest_id(&self) -> u64 {
        self.digest_id
    }

    pub fn random(&self) -> &[u8] {
        &self.random
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Builders for device responses, mirroring what a wallet would emit.

    use base64::prelude::*;
    use ciborium::Value as Cbor;

    use super::cbor::TAG_ENCODED_CBOR;

    pub fn to_vec(value: &Cbor) -> Vec<u8> {
        let mut bytes = Vec::new();
        ciborium::into_writer(value, &mut bytes).unwrap();
        bytes
    }

    pub fn text(s: &str) -> Cbor {
        Cbor::Text(s.to_owned())
    }

    pub fn full_date(s: &str) -> Cbor {
        Cbor::Tag(1004, Box::new(text(s)))
    }

    pub fn issuer_signed_item(digest_id: u64, identifier: &str, value: Cbor) -> Cbor {
        let item = Cbor::Map(vec![
            (text("digestID"), Cbor::Integer(digest_id.into())),
            (text("random"), Cbor::Bytes(vec![0x5a; 16])),
            (text("elementIdentifier"), text(identifier)),
            (text("elementValue"), value),
        ]);
        Cbor::Tag(TAG_ENCODED_CBOR, Box::new(Cbor::Bytes(to_vec(&item))))
    }

    pub fn document(doc_type: &str, namespaces: Vec<(&str, Vec<(&str, Cbor)>)>) -> Cbor {
        let namespaces = namespaces
            .into_iter()
            .map(|(namespace, elements)| {
                let items = elements
                    .into_iter()
                    .enumerate()
                    .map(|(i, (id, value))| issuer_signed_item(i as u64, id, value))
                    .collect();
                (text(namespace), Cbor::Array(items))
            })
            .collect();

        Cbor::Map(vec![
            (text("docType"), text(doc_type)),
            (
                text("issuerSigned"),
                Cbor::Map(vec![
                    (text("nameSpaces"), Cbor::Map(namespaces)),
                    (
                        text("issuerAuth"),
                        Cbor::Array(vec![
                            Cbor::Bytes(vec![0xa1, 0x01, 0x26]),
                            Cbor::Map(vec![]),
                            Cbor::Bytes(vec![]),
                            Cbor::Bytes(vec![0u8; 64]),
                        ]),
                    ),
                ]),
            ),
        ])
    }

    pub fn device_response(documents: Vec<Cbor>) -> Cbor {
        Cbor::Map(vec![
            (text("version"), text("1.0")),
            (text("documents"), Cbor::Array(documents)),
            (text("status"), Cbor::Integer(0.into())),
        ])
    }

    pub fn encode(value: &Cbor) -> String {
        BASE64_URL_SAFE_NO_PAD.encode(to_vec(value))
    }

    pub fn portrait() -> Vec<u8> {
        vec![
            0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, 0x4a, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00,
            0x00, 0x01, 0xff,
        ]
    }

    /// A driving licence disclosing the four fields the permit flow asks for.
    pub fn mdl() -> Cbor {
        document(
            "org.iso.18013.5.1.mDL",
            vec![(
                "org.iso.18013.5.1",
                vec![
                    ("given_name", text("Jane")),
                    ("family_name", text("Doe")),
                    ("age_over_21", Cbor::Bool(true)),
                    ("portrait", Cbor::Bytes(portrait())),
                ],
            )],
        )
    }

    /// A vehicle registration certificate.
    pub fn mvrc() -> Cbor {
        document(
            "org.iso.7367.1.mVRC",
            vec![(
                "org.iso.7367.1",
                vec![
                    ("registration_number", text("AB-123-CD")),
                    ("date_of_registration", full_date("2021-06-15")),
                    ("vehicle_identification_number", text("1HGCM82633A004352")),
                ],
            )],
        )
    }
}
