//! The request half of the exchange: OID4VP presentation definitions asking a wallet for mdoc
//! data elements over the Digital Credentials API.
//!
//! Each requested element is addressed by a JSONPath of the form
//! `$['<namespace>']['<element identifier>']`.

use mdoc_claims_frontend::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use super::projection::{NAMESPACE_ISO_MDL, NAMESPACE_ISO_MVRC};
use crate::utils::{dedup_ordered, NonEmptyVec};

/// Protocol identifier of the request when passed to the Digital Credentials API.
pub const DC_API_PROTOCOL: &str = "openid4vp";

/// Claim format designation of ISO mdocs.
pub const FORMAT_MSO_MDOC: &str = "mso_mdoc";

pub const RESPONSE_TYPE_VP_TOKEN: &str = "vp_token";

/// A JSONPath is a string that represents a path to a specific value within a JSON object.
pub type JsonPath = String;

/// Claim format designation to the signing algorithms accepted for it.
pub type ClaimFormatMap = IndexMap<String, AlgorithmSupport>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlgorithmSupport {
    pub alg: Vec<String>,
}

/// The request object handed to the wallet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresentationRequest {
    response_type: String,
    nonce: String,
    client_id: String,
    #[serde(default)]
    client_metadata: Map<String, Json>,
    presentation_definition: PresentationDefinition,
}

impl PresentationRequest {
    /// Request a `vp_token` satisfying `presentation_definition`.
    pub fn new(
        nonce: impl Into<String>,
        client_id: impl Into<String>,
        presentation_definition: PresentationDefinition,
    ) -> Self {
        Self {
            response_type: RESPONSE_TYPE_VP_TOKEN.to_owned(),
            nonce: nonce.into(),
            client_id: client_id.into(),
            client_metadata: Map::new(),
            presentation_definition,
        }
    }

    pub fn set_client_metadata(mut self, client_metadata: Map<String, Json>) -> Self {
        self.client_metadata = client_metadata;
        self
    }

    pub fn response_type(&self) -> &str {
        &self.response_type
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_metadata(&self) -> &Map<String, Json> {
        &self.client_metadata
    }

    pub fn presentation_definition(&self) -> &PresentationDefinition {
        &self.presentation_definition
    }

    /// The provider entry handed to the Digital Credentials API, e.g. in the `digital.providers`
    /// list of `navigator.identity.get`.
    pub fn dc_api_provider(&self) -> Result<Json, serde_json::Error> {
        Ok(serde_json::json!({
            "protocol": DC_API_PROTOCOL,
            "request": serde_json::to_value(self)?,
        }))
    }

    /// Namespaces to project out of the wallet's answer to this request.
    pub fn requested_namespaces(&self) -> Vec<String> {
        self.presentation_definition.requested_namespaces()
    }
}

/// A presentation definition, limited to the members used for mdoc requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresentationDefinition {
    id: String,
    input_descriptors: Vec<InputDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purpose: Option<String>,
}

impl PresentationDefinition {
    pub fn new(id: impl Into<String>, input_descriptor: InputDescriptor) -> Self {
        Self {
            id: id.into(),
            input_descriptors: vec![input_descriptor],
            name: None,
            purpose: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn add_input_descriptors(mut self, input_descriptor: InputDescriptor) -> Self {
        self.input_descriptors.push(input_descriptor);
        self
    }

    pub fn input_descriptors(&self) -> &[InputDescriptor] {
        &self.input_descriptors
    }

    pub fn set_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn name(&self) -> Option<&String> {
        self.name.as_ref()
    }

    pub fn set_purpose(mut self, purpose: String) -> Self {
        self.purpose = Some(purpose);
        self
    }

    pub fn purpose(&self) -> Option<&String> {
        self.purpose.as_ref()
    }

    /// Every field path of every input descriptor, in request order.
    pub fn requested_fields(&self) -> Vec<&str> {
        self.input_descriptors
            .iter()
            .flat_map(|descriptor| descriptor.constraints.fields.iter())
            .flat_map(|field| field.path.iter().map(String::as_str))
            .collect()
    }

    /// The namespaces addressed by the field paths, first occurrence first.
    ///
    /// Paths that are not of the `$['<namespace>']['<element>']` form are skipped.
    pub fn requested_namespaces(&self) -> Vec<String> {
        let namespaces: Vec<&str> = self
            .input_descriptors
            .iter()
            .flat_map(|descriptor| descriptor.constraints.fields.iter())
            .filter_map(ConstraintsField::mdoc_element)
            .map(|(namespace, _)| namespace)
            .collect();

        dedup_ordered(&namespaces)
            .into_iter()
            .map(str::to_owned)
            .collect()
    }
}

/// Describes the information a verifier requires of a holder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputDescriptor {
    id: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    format: ClaimFormatMap,
    #[serde(default)]
    constraints: Constraints,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purpose: Option<String>,
}

impl InputDescriptor {
    pub fn new(id: impl Into<String>, constraints: Constraints) -> Self {
        Self {
            id: id.into(),
            format: ClaimFormatMap::new(),
            constraints,
            name: None,
            purpose: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Accept the given claim format, signed with any of `alg`.
    pub fn add_format(mut self, format: impl Into<String>, alg: Vec<String>) -> Self {
        self.format.insert(format.into(), AlgorithmSupport { alg });
        self
    }

    pub fn format(&self) -> &ClaimFormatMap {
        &self.format
    }

    pub fn set_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn set_purpose(mut self, purpose: String) -> Self {
        self.purpose = Some(purpose);
        self
    }

    pub fn purpose(&self) -> Option<&String> {
        self.purpose.as_ref()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintsLimitDisclosure {
    Required,
    Preferred,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    fields: Vec<ConstraintsField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit_disclosure: Option<ConstraintsLimitDisclosure>,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_constraint(mut self, field: ConstraintsField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[ConstraintsField] {
        &self.fields
    }

    /// Ask the wallet to disclose nothing beyond the requested fields.
    ///
    /// The value is forwarded as is, the decoder does not check it against the response.
    pub fn set_limit_disclosure(mut self, limit_disclosure: ConstraintsLimitDisclosure) -> Self {
        self.limit_disclosure = Some(limit_disclosure);
        self
    }

    pub fn limit_disclosure(&self) -> Option<ConstraintsLimitDisclosure> {
        self.limit_disclosure
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConstraintsField {
    path: NonEmptyVec<JsonPath>,
    #[serde(default)]
    intent_to_retain: bool,
}

impl ConstraintsField {
    pub fn new(path: NonEmptyVec<JsonPath>) -> Self {
        Self {
            path,
            intent_to_retain: false,
        }
    }

    /// A field addressing one data element of an mdoc namespace.
    pub fn mdoc(namespace: &str, element: &str) -> Self {
        Self::new(NonEmptyVec::new(format!("$['{namespace}']['{element}']")))
    }

    pub fn path(&self) -> &NonEmptyVec<JsonPath> {
        &self.path
    }

    pub fn set_intent_to_retain(mut self, intent_to_retain: bool) -> Self {
        self.intent_to_retain = intent_to_retain;
        self
    }

    pub fn intent_to_retain(&self) -> bool {
        self.intent_to_retain
    }

    /// The `(namespace, element)` pair addressed by the first path, if it has the mdoc form.
    pub fn mdoc_element(&self) -> Option<(&str, &str)> {
        let rest = self.path.first().strip_prefix("$['")?;
        let (namespace, rest) = rest.split_once("']['")?;
        let element = rest.strip_suffix("']")?;
        if namespace.is_empty() || element.is_empty() || element.contains('\'') {
            return None;
        }
        Some((namespace, element))
    }
}

/// Builds the input descriptor for a set of data elements of one namespace.
#[derive(Debug, Clone)]
pub struct MdocFieldRequest {
    descriptor_id: String,
    namespace: String,
    elements: Vec<String>,
    intent_to_retain: bool,
    alg: Vec<String>,
}

impl MdocFieldRequest {
    /// `descriptor_id` is conventionally the requested document type, e.g.
    /// `org.iso.18013.5.1.mDL`.
    pub fn new(descriptor_id: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            descriptor_id: descriptor_id.into(),
            namespace: namespace.into(),
            elements: Vec::new(),
            intent_to_retain: false,
            alg: vec!["ES256".to_owned()],
        }
    }

    pub fn element(mut self, element: impl Into<String>) -> Self {
        self.elements.push(element.into());
        self
    }

    pub fn elements<I, S>(mut self, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.elements.extend(elements.into_iter().map(Into::into));
        self
    }

    pub fn intent_to_retain(mut self, intent_to_retain: bool) -> Self {
        self.intent_to_retain = intent_to_retain;
        self
    }

    pub fn alg(mut self, alg: Vec<String>) -> Self {
        self.alg = alg;
        self
    }

    pub fn build(self) -> InputDescriptor {
        let constraints = self.elements.iter().fold(
            Constraints::new().set_limit_disclosure(ConstraintsLimitDisclosure::Required),
            |constraints, element| {
                constraints.add_constraint(
                    ConstraintsField::mdoc(&self.namespace, element)
                        .set_intent_to_retain(self.intent_to_retain),
                )
            },
        );

        InputDescriptor::new(self.descriptor_id, constraints).add_format(FORMAT_MSO_MDOC, self.alg)
    }
}

/// Request the driving licence fields needed for a permit application.
pub fn mdl_request(nonce: impl Into<String>, client_id: impl Into<String>) -> PresentationRequest {
    let descriptor = MdocFieldRequest::new("org.iso.18013.5.1.mDL", NAMESPACE_ISO_MDL)
        .elements(["family_name", "given_name", "age_over_21", "portrait"])
        .build();

    PresentationRequest::new(
        nonce,
        client_id,
        PresentationDefinition::new("mDL-request-demo", descriptor),
    )
}

/// Request the identifying fields of a vehicle registration certificate.
pub fn vehicle_registration_request(
    nonce: impl Into<String>,
    client_id: impl Into<String>,
) -> PresentationRequest {
    let descriptor = MdocFieldRequest::new("org.iso.7367.1.mVRC", NAMESPACE_ISO_MVRC)
        .elements([
            "registration_number",
            "date_of_registration",
            "vehicle_identification_number",
        ])
        .build();

    PresentationRequest::new(
        nonce,
        client_id,
        PresentationDefinition::new("vrc-request-demo", descriptor),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NONCE: &str = "Z2Y2OWtlcFYrbTV0R3hVSXNGdExpNnB3Zz1kYW4";

    #[test]
    fn mdl_request_serialization() {
        let request = mdl_request(NONCE, "www.mysite.com");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "response_type": "vp_token",
                "nonce": NONCE,
                "client_id": "www.mysite.com",
                "client_metadata": {},
                "presentation_definition": {
                    "id": "mDL-request-demo",
                    "input_descriptors": [{
                        "id": "org.iso.18013.5.1.mDL",
                        "format": { "mso_mdoc": { "alg": ["ES256"] } },
                        "constraints": {
                            "fields": [
                                { "path": ["$['org.iso.18013.5.1']['family_name']"], "intent_to_retain": false },
                                { "path": ["$['org.iso.18013.5.1']['given_name']"], "intent_to_retain": false },
                                { "path": ["$['org.iso.18013.5.1']['age_over_21']"], "intent_to_retain": false },
                                { "path": ["$['org.iso.18013.5.1']['portrait']"], "intent_to_retain": false }
                            ],
                            "limit_disclosure": "required"
                        }
                    }]
                }
            })
        );
        assert_eq!(request.requested_namespaces(), [NAMESPACE_ISO_MDL]);
    }

    #[test]
    fn dc_api_provider_entry() {
        let request = vehicle_registration_request(NONCE, "www.mysite.com");
        let provider = request.dc_api_provider().unwrap();
        assert_eq!(provider["protocol"], "openid4vp");
        assert_eq!(provider["request"], serde_json::to_value(&request).unwrap());
        assert_eq!(
            provider["request"]["presentation_definition"]["id"],
            "vrc-request-demo"
        );
    }

    #[test]
    fn vehicle_registration_request_fields() {
        let request = vehicle_registration_request(NONCE, "www.mysite.com");
        let definition = request.presentation_definition();
        assert_eq!(definition.id(), "vrc-request-demo");
        assert_eq!(
            definition.requested_fields(),
            [
                "$['org.iso.7367.1']['registration_number']",
                "$['org.iso.7367.1']['date_of_registration']",
                "$['org.iso.7367.1']['vehicle_identification_number']",
            ]
        );
        assert_eq!(request.requested_namespaces(), [NAMESPACE_ISO_MVRC]);
    }

    #[test]
    fn parses_request_json() {
        let request: PresentationRequest = serde_json::from_value(json!({
            "response_type": "vp_token",
            "nonce": NONCE,
            "client_id": "www.mysite.com",
            "presentation_definition": {
                "id": "combined",
                "input_descriptors": [
                    {
                        "id": "org.iso.7367.1.mVRC",
                        "constraints": {
                            "limit_disclosure": "preferred",
                            "fields": [
                                { "path": ["$['org.iso.7367.1']['registration_number']"], "intent_to_retain": true },
                                { "path": ["$.vc.credentialSubject"] }
                            ]
                        }
                    },
                    {
                        "id": "org.iso.18013.5.1.mDL",
                        "constraints": {
                            "fields": [
                                { "path": ["$['org.iso.18013.5.1']['given_name']"] },
                                { "path": ["$['org.iso.7367.1']['vehicle_identification_number']"] }
                            ]
                        }
                    }
                ]
            }
        }))
        .unwrap();

        assert!(request.client_metadata().is_empty());
        assert_eq!(
            request.requested_namespaces(),
            [NAMESPACE_ISO_MVRC, NAMESPACE_ISO_MDL]
        );

        let descriptor = &request.presentation_definition().input_descriptors()[0];
        assert_eq!(
            descriptor.constraints().limit_disclosure(),
            Some(ConstraintsLimitDisclosure::Preferred)
        );
        assert!(descriptor.constraints().fields()[0].intent_to_retain());
        assert!(!descriptor.constraints().fields()[1].intent_to_retain());
    }

    #[test]
    fn mdoc_element_paths() {
        assert_eq!(
            ConstraintsField::mdoc("org.iso.18013.5.1", "portrait").mdoc_element(),
            Some(("org.iso.18013.5.1", "portrait"))
        );
        for path in ["$.given_name", "$['org.iso.18013.5.1']", "$['']['x']"] {
            let field = ConstraintsField::new(NonEmptyVec::new(path.to_owned()));
            assert_eq!(field.mdoc_element(), None, "{path}");
        }
    }

    #[test]
    fn builder_options() {
        let descriptor = MdocFieldRequest::new("org.iso.18013.5.1.mDL", NAMESPACE_ISO_MDL)
            .element("birth_date")
            .intent_to_retain(true)
            .alg(vec!["ES256".into(), "ES384".into()])
            .build()
            .set_purpose("Age verification".into());

        assert_eq!(descriptor.format()[FORMAT_MSO_MDOC].alg, ["ES256", "ES384"]);
        assert!(descriptor.constraints().fields()[0].intent_to_retain());
        assert_eq!(descriptor.purpose().map(String::as_str), Some("Age verification"));
    }
}
