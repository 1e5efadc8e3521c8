//! Serde adapter for `uint256` message fields.
//!
//! Signing clients send integers in whichever form their JSON library
//! produced: plain numbers, `0x`-prefixed hex strings such as `"0x01"` or
//! decimal strings such as `"210000000000000000"`. All three are accepted on
//! input; output is minimal hex such as `"0x2a"`.
//!
//! ```rust
//! use alloy_primitives::U256;
//!
//! #[derive(serde::Deserialize)]
//! struct Counter {
//!     #[serde(with = "delegatable_typed_data::serde_uint")]
//!     value: U256,
//! }
//!
//! let counter: Counter = serde_json::from_str(r#"{ "value": "0x2a" }"#).unwrap();
//! assert_eq!(counter.value, U256::from(42u64));
//! ```

use std::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::TypedDataError;

/// Parse a `0x`-prefixed hex or plain decimal integer.
pub fn parse_uint(text: &str) -> Result<U256, TypedDataError> {
    let parsed = match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(digits) => U256::from_str_radix(digits, 16),
        None => U256::from_str_radix(text, 10),
    };
    parsed.map_err(|_| TypedDataError::InvalidInteger(text.to_string()))
}

/// Serialize `value` as minimal `0x`-prefixed hex, or natively in binary
/// formats.
pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    if serializer.is_human_readable() {
        serializer.serialize_str(&format!("{value:#x}"))
    } else {
        value.serialize(serializer)
    }
}

/// Deserialize a number, hex string or decimal string.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    if deserializer.is_human_readable() {
        deserializer.deserialize_any(UintVisitor)
    } else {
        U256::deserialize(deserializer)
    }
}

struct UintVisitor;

impl de::Visitor<'_> for UintVisitor {
    type Value = U256;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an unsigned integer, a hex string or a decimal string")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<U256, E> {
        Ok(U256::from(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<U256, E> {
        u64::try_from(value)
            .map(U256::from)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<U256, E> {
        parse_uint(value).map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    #[derive(Debug, Deserialize, Serialize)]
    struct Field {
        #[serde(with = "crate::serde_uint")]
        value: U256,
    }

    fn parse(json: &str) -> Result<U256, serde_json::Error> {
        serde_json::from_str::<Field>(json).map(|field| field.value)
    }

    #[test]
    fn it_reads_every_client_form() -> TestResult {
        assert_eq!(parse(r#"{ "value": 7 }"#)?, U256::from(7u64));
        assert_eq!(parse(r#"{ "value": "0x01" }"#)?, U256::from(1u64));
        assert_eq!(parse(r#"{ "value": "0x00" }"#)?, U256::ZERO);
        assert_eq!(
            parse(r#"{ "value": "210000000000000000" }"#)?,
            U256::from(210_000_000_000_000_000u64)
        );
        Ok(())
    }

    #[test]
    fn it_reads_values_wider_than_64_bits() -> TestResult {
        let wide = parse(r#"{ "value": "0x10000000000000000" }"#)?;
        assert_eq!(wide, U256::from(u64::MAX) + U256::from(1u64));
        assert_eq!(parse(r#"{ "value": "18446744073709551616" }"#)?, wide);
        Ok(())
    }

    #[test]
    fn it_rejects_what_is_not_an_integer() {
        assert!(parse(r#"{ "value": "0xzz" }"#).is_err());
        assert!(parse(r#"{ "value": "twelve" }"#).is_err());
        assert!(parse(r#"{ "value": -1 }"#).is_err());
        assert_eq!(
            parse_uint("1.5"),
            Err(TypedDataError::InvalidInteger("1.5".into()))
        );
    }

    #[test]
    fn it_reads_its_own_output() -> TestResult {
        let field = Field {
            value: U256::from(0xabcdu64),
        };
        let json = serde_json::to_string(&field)?;
        assert_eq!(json, r#"{"value":"0xabcd"}"#);
        assert_eq!(parse(&json)?, field.value);
        Ok(())
    }
}
