//! Unified identifier codec
//!
//! Pure functions, no I/O. A unified id is a `key,value` sequence joined by
//! `;`, prefixed with the gateway namespace and resource type, then
//! base64url-encoded with padding stripped:
//!
//! `relay-gw:<type>;unified_id,<uuid>;target_model_names,<csv>;resource_id,<id>;model_id,<id>`
//!
//! Anything that fails to decode is, by definition, a provider-native id and
//! must pass through the gateway untouched. Decode therefore never errors on
//! foreign-looking input; it returns `None`.

use base64::{engine::general_purpose::URL_SAFE, engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use regex::Regex;

use super::ResourceError;

/// Namespace tag distinguishing unified ids from provider-native ids
pub const UNIFIED_ID_NAMESPACE: &str = "relay-gw";

const FIELD_UNIFIED_ID: &str = "unified_id";
const FIELD_TARGET_MODELS: &str = "target_model_names";
const FIELD_MODEL_ID: &str = "model_id";

/// Accepted field names for the representative resource id, newest first.
/// Older gateways wrote the legacy names; ids they minted must keep decoding.
const RESOURCE_ID_FIELDS: &[&str] = &["resource_id", "provider_resource_id", "managed_resource_id"];

/// Structured form of a unified resource id. Immutable once minted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnifiedResourceDescriptor {
    pub resource_type: String,
    pub unified_uuid: String,
    /// Insertion order is creation order and drives routing priority
    pub target_model_names: Vec<String>,
    /// Backend-native id from the first successful backend; seeds the encoded
    /// string only, never authoritative for routing
    pub representative_resource_id: String,
    /// Deployment id of that first backend
    pub representative_model_id: String,
}

impl UnifiedResourceDescriptor {
    /// Mint a descriptor with a fresh UUID. Re-running creation for the same
    /// logical request always yields a new unified id; there is no
    /// idempotency key.
    pub fn mint(
        resource_type: impl Into<String>,
        target_model_names: Vec<String>,
        representative_resource_id: impl Into<String>,
        representative_model_id: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            unified_uuid: uuid::Uuid::new_v4().to_string(),
            target_model_names,
            representative_resource_id: representative_resource_id.into(),
            representative_model_id: representative_model_id.into(),
        }
    }
}

/// Encode a descriptor to the opaque wire form.
///
/// Fields containing the `;` or `,` delimiters would break round-trip
/// decoding, so they are rejected here at mint time rather than surfacing as
/// an undecodable id later.
pub fn encode(descriptor: &UnifiedResourceDescriptor) -> Result<String, ResourceError> {
    let mut fields: Vec<&str> = vec![
        &descriptor.resource_type,
        &descriptor.unified_uuid,
        &descriptor.representative_resource_id,
        &descriptor.representative_model_id,
    ];
    fields.extend(descriptor.target_model_names.iter().map(String::as_str));

    for field in fields {
        if field.contains(';') || field.contains(',') {
            return Err(ResourceError::InvalidDescriptor(format!(
                "descriptor field contains a delimiter character: {field:?}"
            )));
        }
    }
    if descriptor.target_model_names.is_empty() {
        return Err(ResourceError::InvalidDescriptor(
            "target_model_names must not be empty".to_string(),
        ));
    }

    let text = format!(
        "{ns}:{ty};{uid_key},{uid};{targets_key},{targets};{rid_key},{rid};{mid_key},{mid}",
        ns = UNIFIED_ID_NAMESPACE,
        ty = descriptor.resource_type,
        uid_key = FIELD_UNIFIED_ID,
        uid = descriptor.unified_uuid,
        targets_key = FIELD_TARGET_MODELS,
        targets = descriptor.target_model_names.join(","),
        rid_key = RESOURCE_ID_FIELDS[0],
        rid = descriptor.representative_resource_id,
        mid_key = FIELD_MODEL_ID,
        mid = descriptor.representative_model_id,
    );

    Ok(URL_SAFE_NO_PAD.encode(text))
}

/// Decode a candidate unified id. `None` means "not a unified id": the caller
/// must treat the string as a provider-native identifier and pass it through.
pub fn decode(candidate: &str) -> Option<UnifiedResourceDescriptor> {
    let text = decode_text(candidate)?;
    parse_descriptor(&text)
}

/// Whether a string is a unified id minted by this gateway
pub fn is_unified_id(candidate: &str) -> bool {
    decode_text(candidate).is_some()
}

/// base64url-decode with padding re-added, then check the namespace prefix
fn decode_text(candidate: &str) -> Option<String> {
    let padded = match candidate.len() % 4 {
        0 => candidate.to_string(),
        n => format!("{candidate}{}", "=".repeat(4 - n)),
    };
    let bytes = URL_SAFE.decode(padded).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    text.starts_with(&format!("{UNIFIED_ID_NAMESPACE}:"))
        .then_some(text)
}

/// Accept either the encoded or the already-decoded form, so the field
/// extractors are safe to call directly on raw input.
fn as_decoded_text(input: &str) -> Option<String> {
    decode_text(input)
        .or_else(|| input.starts_with(&format!("{UNIFIED_ID_NAMESPACE}:")).then(|| input.to_string()))
}

/// Extract one `key,value` field, value running to the next `;`
fn field_value(text: &str, key: &str) -> Option<String> {
    let re = Regex::new(&format!("(?:^|;){key},([^;]*)")).ok()?;
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn parse_descriptor(text: &str) -> Option<UnifiedResourceDescriptor> {
    let resource_type = resource_type_of(text)?;
    let unified_uuid = field_value(text, FIELD_UNIFIED_ID)?;
    let targets_csv = field_value(text, FIELD_TARGET_MODELS)?;
    let target_model_names: Vec<String> = targets_csv
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    let representative_resource_id = RESOURCE_ID_FIELDS
        .iter()
        .find_map(|key| field_value(text, key))?;
    let representative_model_id = field_value(text, FIELD_MODEL_ID)?;

    Some(UnifiedResourceDescriptor {
        resource_type,
        unified_uuid,
        target_model_names,
        representative_resource_id,
        representative_model_id,
    })
}

fn resource_type_of(text: &str) -> Option<String> {
    let re = Regex::new(&format!("^{UNIFIED_ID_NAMESPACE}:([^;]+)")).ok()?;
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract the resource type tag from a raw or encoded id
pub fn extract_resource_type(input: &str) -> Option<String> {
    resource_type_of(&as_decoded_text(input)?)
}

/// Extract the unified uuid from a raw or encoded id
pub fn extract_unified_uuid(input: &str) -> Option<String> {
    field_value(&as_decoded_text(input)?, FIELD_UNIFIED_ID)
}

/// Extract the ordered target model list from a raw or encoded id
pub fn extract_target_model_names(input: &str) -> Option<Vec<String>> {
    let csv = field_value(&as_decoded_text(input)?, FIELD_TARGET_MODELS)?;
    Some(
        csv.split(',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Extract the representative backend-native resource id from a raw or
/// encoded id, trying legacy field names for ids minted by older gateways
pub fn extract_resource_id(input: &str) -> Option<String> {
    let text = as_decoded_text(input)?;
    RESOURCE_ID_FIELDS.iter().find_map(|key| field_value(&text, key))
}

/// Extract the representative deployment id from a raw or encoded id
pub fn extract_model_id(input: &str) -> Option<String> {
    field_value(&as_decoded_text(input)?, FIELD_MODEL_ID)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> UnifiedResourceDescriptor {
        UnifiedResourceDescriptor {
            resource_type: "vector_store".to_string(),
            unified_uuid: "3f8f9a54-7a61-4b2f-9a10-b51e6a2f9c77".to_string(),
            target_model_names: vec!["m1".to_string(), "m2".to_string(), "m3".to_string()],
            representative_resource_id: "vs_abc123".to_string(),
            representative_model_id: "dep-openai-1".to_string(),
        }
    }

    #[test]
    fn test_round_trip() {
        let d = descriptor();
        let encoded = encode(&d).unwrap();
        assert!(!encoded.contains('='));
        assert_eq!(decode(&encoded).unwrap(), d);
    }

    #[test]
    fn test_round_trip_preserves_target_order() {
        let encoded = encode(&descriptor()).unwrap();
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.target_model_names, vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn test_prefix_discrimination() {
        // Not base64 at all
        assert!(decode("!!! not base64 !!!").is_none());
        // Provider-native id shapes must pass through
        assert!(decode("vs_abc123").is_none());
        assert!(decode("file-xyz789").is_none());
        // Valid base64 that lacks the namespace prefix
        let foreign = URL_SAFE_NO_PAD.encode("some:other;format");
        assert!(decode(&foreign).is_none());
        // Empty string
        assert!(decode("").is_none());
    }

    #[test]
    fn test_is_unified_id() {
        let encoded = encode(&descriptor()).unwrap();
        assert!(is_unified_id(&encoded));
        assert!(!is_unified_id("vs_abc123"));
    }

    #[test]
    fn test_extractors_accept_raw_and_encoded() {
        let d = descriptor();
        let encoded = encode(&d).unwrap();
        let raw = format!(
            "relay-gw:vector_store;unified_id,{};target_model_names,m1,m2,m3;resource_id,vs_abc123;model_id,dep-openai-1",
            d.unified_uuid
        );

        for input in [encoded.as_str(), raw.as_str()] {
            assert_eq!(extract_resource_type(input).unwrap(), "vector_store");
            assert_eq!(extract_unified_uuid(input).unwrap(), d.unified_uuid);
            assert_eq!(
                extract_target_model_names(input).unwrap(),
                vec!["m1", "m2", "m3"]
            );
            assert_eq!(extract_resource_id(input).unwrap(), "vs_abc123");
            assert_eq!(extract_model_id(input).unwrap(), "dep-openai-1");
        }
    }

    #[test]
    fn test_legacy_resource_id_field_names() {
        for legacy in ["provider_resource_id", "managed_resource_id"] {
            let raw = format!(
                "relay-gw:file;unified_id,u-1;target_model_names,m1;{legacy},file-old;model_id,dep1"
            );
            let encoded = URL_SAFE_NO_PAD.encode(&raw);
            assert_eq!(extract_resource_id(&encoded).unwrap(), "file-old");
            let decoded = decode(&encoded).unwrap();
            assert_eq!(decoded.representative_resource_id, "file-old");
        }
    }

    #[test]
    fn test_encode_rejects_delimiters() {
        let mut d = descriptor();
        d.representative_resource_id = "vs;evil".to_string();
        assert!(matches!(
            encode(&d),
            Err(ResourceError::InvalidDescriptor(_))
        ));

        let mut d = descriptor();
        d.target_model_names = vec!["m,1".to_string()];
        assert!(encode(&d).is_err());
    }

    #[test]
    fn test_encode_rejects_empty_targets() {
        let mut d = descriptor();
        d.target_model_names.clear();
        assert!(encode(&d).is_err());
    }

    #[test]
    fn test_padding_readded_on_decode() {
        // Force a text length that needs padding when base64url-encoded
        let raw = "relay-gw:file;unified_id,u;target_model_names,m;resource_id,r;model_id,d";
        let stripped = URL_SAFE_NO_PAD.encode(raw);
        assert!(decode(&stripped).is_some());
    }

    #[test]
    fn test_mint_generates_fresh_uuid() {
        let a = UnifiedResourceDescriptor::mint("vector_store", vec!["m1".into()], "vs_1", "dep1");
        let b = UnifiedResourceDescriptor::mint("vector_store", vec!["m1".into()], "vs_1", "dep1");
        assert_ne!(a.unified_uuid, b.unified_uuid);
    }
}
