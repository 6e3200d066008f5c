//! Conversion of binary fields between the canonical byte-array form and
//! their textual renderings (base58 identifiers, base64 blobs).

use serde_json::Value;
use shared_types::{decode_binary, encode_binary, Encoding};

/// A binary field located by a dotted path. A `[]` suffix on a segment
/// fans out over every element of that array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryField {
    pub path: &'static str,
    pub encoding: Encoding,
}

pub(crate) const fn identifier(path: &'static str) -> BinaryField {
    BinaryField {
        path,
        encoding: Encoding::Base58,
    }
}

pub(crate) const fn blob(path: &'static str) -> BinaryField {
    BinaryField {
        path,
        encoding: Encoding::Base64,
    }
}

/// Replace textual binary fields with byte arrays.
///
/// Strings that do not decode are left untouched for schema validation to
/// report.
pub fn decode_text_fields(value: &mut Value, fields: &[BinaryField]) {
    for field in fields {
        visit_path(value, field.path, &mut |slot| {
            if let Value::String(text) = slot {
                if let Ok(bytes) = decode_binary(text, field.encoding) {
                    *slot = bytes_to_value(&bytes);
                }
            }
        });
    }
}

/// Replace byte-array fields with their textual rendering.
pub fn encode_binary_fields(value: &mut Value, fields: &[BinaryField]) {
    for field in fields {
        visit_path(value, field.path, &mut |slot| {
            if let Some(bytes) = value_to_bytes(slot) {
                *slot = Value::String(encode_binary(&bytes, field.encoding));
            }
        });
    }
}

pub(crate) fn bytes_to_value(bytes: &[u8]) -> Value {
    Value::Array(bytes.iter().map(|b| Value::from(*b)).collect())
}

pub(crate) fn value_to_bytes(value: &Value) -> Option<Vec<u8>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect()
}

fn visit_path(value: &mut Value, path: &str, apply: &mut dyn FnMut(&mut Value)) {
    let segments: Vec<&str> = path.split('.').collect();
    visit_segments(value, &segments, apply);
}

fn visit_segments(value: &mut Value, segments: &[&str], apply: &mut dyn FnMut(&mut Value)) {
    let Some((head, rest)) = segments.split_first() else {
        apply(value);
        return;
    };
    let (key, fan_out) = match head.strip_suffix("[]") {
        Some(key) => (key, true),
        None => (*head, false),
    };
    let Some(child) = value.as_object_mut().and_then(|o| o.get_mut(key)) else {
        return;
    };
    if fan_out {
        if let Some(items) = child.as_array_mut() {
            for item in items {
                visit_segments(item, rest, apply);
            }
        }
    } else {
        visit_segments(child, rest, apply);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_types::Identifier;

    const FIELDS: &[BinaryField] = &[
        identifier("ownerId"),
        identifier("transitions[].$id"),
        blob("signature"),
    ];

    #[test]
    fn test_text_and_byte_forms_convert_both_ways() {
        let owner = Identifier::new([4; 32]);
        let doc = Identifier::new([5; 32]);
        let mut value = json!({
            "ownerId": owner.to_base58(),
            "transitions": [{ "$id": doc.to_base58() }, { "$id": doc.to_base58() }],
            "signature": encode_binary(&[1, 2, 3], Encoding::Base64),
        });

        decode_text_fields(&mut value, FIELDS);
        assert_eq!(value["ownerId"], owner.to_value());
        assert_eq!(value["transitions"][1]["$id"], doc.to_value());
        assert_eq!(value["signature"], json!([1, 2, 3]));

        encode_binary_fields(&mut value, FIELDS);
        assert_eq!(value["ownerId"], json!(owner.to_base58()));
        assert_eq!(value["signature"], json!("AQID"));
    }

    #[test]
    fn test_undecodable_text_left_for_schema() {
        let mut value = json!({ "ownerId": "0OIl not base58" });
        decode_text_fields(&mut value, FIELDS);
        assert_eq!(value["ownerId"], json!("0OIl not base58"));
    }

    #[test]
    fn test_missing_paths_ignored() {
        let mut value = json!({ "other": 1 });
        decode_text_fields(&mut value, FIELDS);
        assert_eq!(value, json!({ "other": 1 }));
    }
}
