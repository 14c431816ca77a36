//! Precision-safe numeric display.
//!
//! The display channel of anything wider than 32 bits is a decimal string:
//! common display number types are 64-bit floats, and a `nat64` near its
//! maximum silently loses low digits there. At 32 bits or narrower the
//! native numeric value is exact, so it passes through unchanged.

use serde_json::{Number, Value};

use crate::types::NumTy;

/// Compute the display value for a numeric leaf. `Err` carries the runtime
/// kind tag of the rejected input.
pub fn display_number(num: NumTy, value: &Value) -> Result<Value, &'static str> {
    match value {
        Value::Number(n) => {
            if num.float {
                return Ok(value.clone());
            }
            if num.is_wide() {
                // exact decimal text, regardless of magnitude
                return Ok(Value::String(n.to_string()));
            }
            Ok(value.clone())
        }
        // the transformed family hands numbers in as strings
        Value::String(s) => {
            let text = s.trim();
            if num.float {
                let parsed: f64 = text.parse().map_err(|_| "string")?;
                return Number::from_f64(parsed)
                    .map(Value::Number)
                    .ok_or("string");
            }
            if text.parse::<i128>().is_err() {
                return Err("string");
            }
            if num.is_wide() {
                Ok(Value::String(text.to_string()))
            } else {
                // narrow enough for a native display value
                let parsed: i64 = text.parse().map_err(|_| "string")?;
                Ok(Value::Number(Number::from(parsed)))
            }
        }
        other => Err(super::runtime_kind(other)),
    }
}

/// Integer reading of a resolved display value, for pretty renderers.
pub fn as_i128(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NumTy, NumWidth};
    use serde_json::json;

    #[test]
    fn wide_values_display_as_exact_strings() {
        let nat64 = NumTy::nat(NumWidth::W64);
        let max: Value = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(
            display_number(nat64, &max),
            Ok(json!("18446744073709551615"))
        );

        // unbounded nat wider than u64 survives too
        let nat = NumTy::NAT;
        let big: Value = serde_json::from_str("340282366920938463463374607431768211455").unwrap();
        assert_eq!(
            display_number(nat, &big),
            Ok(json!("340282366920938463463374607431768211455"))
        );
    }

    #[test]
    fn narrow_values_stay_native() {
        let nat8 = NumTy::nat(NumWidth::W8);
        assert_eq!(display_number(nat8, &json!(255)), Ok(json!(255)));
        let int32 = NumTy::int(NumWidth::W32);
        assert_eq!(display_number(int32, &json!(-42)), Ok(json!(-42)));
        assert_eq!(display_number(int32, &json!("-42")), Ok(json!(-42)));
    }

    #[test]
    fn string_inputs_for_wide_types_pass_through() {
        let nat64 = NumTy::nat(NumWidth::W64);
        assert_eq!(
            display_number(nat64, &json!("18446744073709551615")),
            Ok(json!("18446744073709551615"))
        );
        assert_eq!(display_number(nat64, &json!("abc")), Err("string"));
        assert_eq!(display_number(nat64, &json!(true)), Err("bool"));
    }

    #[test]
    fn floats_are_native_both_ways() {
        assert_eq!(display_number(NumTy::FLOAT64, &json!(4.5)), Ok(json!(4.5)));
        assert_eq!(display_number(NumTy::FLOAT64, &json!("4.5")), Ok(json!(4.5)));
    }
}
