//! Shared shape sniffing for dual-family inputs.
//!
//! Upstream producers hand the resolver either raw wire shapes or values
//! that already went through one display transformation. The tolerance
//! rules live here, once, and every compound kind goes through them:
//!
//! - records: name-keyed object, else positional sequence
//! - variants: explicit `_type` tag wins, else the first key naming a
//!   declared option
//! - optionals: bracketed wire form (`[]` absent / `[v]` present) first,
//!   `null` absent, anything else is the already-unwrapped present value
//! - blobs/principals: byte sequence (0–255 integers) or hex/text string

use serde_json::{Map, Value};

/// Runtime kind tag of a JSON value, for error messages.
pub fn runtime_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The two record access families.
pub enum FieldsView<'a> {
    Named(&'a Map<String, Value>),
    Positional(&'a [Value]),
}

pub fn fields_view(value: &Value) -> Option<FieldsView<'_>> {
    match value {
        Value::Object(map) => Some(FieldsView::Named(map)),
        Value::Array(items) => Some(FieldsView::Positional(items)),
        _ => None,
    }
}

/// Variant tag resolution. `Ok((tag, payload))` when a declared option was
/// identified; `Err(found_keys)` with the candidate key(s) otherwise.
pub fn variant_tag<'a>(
    map: &'a Map<String, Value>,
    is_option: impl Fn(&str) -> bool,
) -> Result<(String, Option<&'a Value>), Vec<String>> {
    if let Some(Value::String(tag)) = map.get("_type") {
        if is_option(tag) {
            return Ok((tag.clone(), map.get(tag.as_str())));
        }
        return Err(vec![tag.clone()]);
    }
    if let Some(key) = map.keys().find(|k| is_option(k)) {
        return Ok((key.clone(), map.get(key.as_str())));
    }
    Err(map.keys().cloned().collect())
}

/// Normalize the two optional encodings into present/absent.
///
/// The bracketed wire form is sniffed first, so a single-element sequence
/// always reads as `[v]` (present). Longer sequences can only be an
/// already-unwrapped inner value.
pub fn optional_view(value: &Value) -> Option<&Value> {
    match value {
        Value::Null => None,
        Value::Array(items) => match items.as_slice() {
            [] => None,
            [inner] => Some(inner),
            _ => Some(value),
        },
        other => Some(other),
    }
}

/// Byte-sequence view: an array of 0–255 integers, or a hex string.
pub fn bytes_view(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let byte = item.as_u64().filter(|b| *b <= 255)?;
                out.push(byte as u8);
            }
            Some(out)
        }
        Value::String(s) => hex::decode(s).ok(),
        _ => None,
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_normalization_order() {
        assert!(optional_view(&Value::Null).is_none());
        assert!(optional_view(&json!([])).is_none());
        assert_eq!(optional_view(&json!(["hi"])), Some(&json!("hi")));
        assert_eq!(optional_view(&json!("hi")), Some(&json!("hi")));
        // longer sequences are an unwrapped inner value, not a wire optional
        assert_eq!(optional_view(&json!([1, 2, 3])), Some(&json!([1, 2, 3])));
    }

    #[test]
    fn variant_tag_prefers_the_explicit_tag() {
        let options = ["A", "B"];
        let is_option = |k: &str| options.contains(&k);

        let tagged = json!({ "_type": "B", "B": "x" });
        let Value::Object(map) = &tagged else { unreachable!() };
        assert_eq!(
            variant_tag(map, is_option),
            Ok(("B".to_string(), Some(&json!("x"))))
        );

        let untagged = json!({ "A": null });
        let Value::Object(map) = &untagged else { unreachable!() };
        assert_eq!(variant_tag(map, is_option), Ok(("A".to_string(), Some(&json!(null)))));

        let unknown = json!({ "C": null });
        let Value::Object(map) = &unknown else { unreachable!() };
        assert_eq!(variant_tag(map, is_option), Err(vec!["C".to_string()]));

        let bad_tag = json!({ "_type": "C", "C": 1 });
        let Value::Object(map) = &bad_tag else { unreachable!() };
        assert_eq!(variant_tag(map, is_option), Err(vec!["C".to_string()]));
    }

    #[test]
    fn bytes_from_sequences_and_hex() {
        assert_eq!(bytes_view(&json!([0x12, 0x34])), Some(vec![0x12, 0x34]));
        assert_eq!(bytes_view(&json!("1234abcd")), Some(vec![0x12, 0x34, 0xab, 0xcd]));
        assert_eq!(bytes_view(&json!("")), Some(vec![]));
        assert_eq!(bytes_view(&json!([256])), None);
        assert_eq!(bytes_view(&json!([-1])), None);
        assert_eq!(bytes_view(&json!("zz")), None);
        assert_eq!(bytes_view(&json!(true)), None);
    }
}
