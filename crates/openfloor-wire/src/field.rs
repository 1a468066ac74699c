//! Per-field semantic validators for command parameters.
//!
//! Parameters arrive as untyped JSON values and are checked positionally
//! against a command's [`FieldSpec`] list. Numeric fields travel as
//! strings so precision survives the wire.

use std::sync::LazyLock;

use openfloor_types::constants::{AMOUNT_PRECISION, CURRENCY_CODE_LEN, ORDER_VALUE_PRECISION};
use openfloor_types::{BitcoinApi, OrderSide, SessionKey};
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+$").expect("email regex compiles"));

/// What one positional parameter must be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSpec {
    /// Any JSON string.
    Str,
    /// `local@domain.tld` shape.
    Email,
    /// 64 hex characters (a raw 32-byte key).
    PublicKey,
    /// Exactly 3 uppercase ASCII letters.
    CurrencyCode,
    /// Decimal string with at most 4 fractional digits.
    OrderValue,
    /// Decimal string with at most 8 fractional digits.
    Amount,
    /// `"Buy"` or `"Sell"`, case-sensitive.
    OrderType,
    /// Passes the external bitcoin address-validity check.
    BitcoinAddress,
}

impl FieldSpec {
    /// Check one parameter against this spec.
    #[must_use]
    pub fn check(&self, value: &Value, bitcoin: &dyn BitcoinApi) -> bool {
        let Some(text) = value.as_str() else {
            // Every field kind travels as a JSON string.
            return false;
        };
        match self {
            Self::Str => true,
            Self::Email => EMAIL_RE.is_match(text),
            Self::PublicKey => SessionKey::from_hex(text).is_some(),
            Self::CurrencyCode => is_currency_code(text),
            Self::OrderValue => has_max_precision(text, ORDER_VALUE_PRECISION),
            Self::Amount => has_max_precision(text, AMOUNT_PRECISION),
            Self::OrderType => OrderSide::from_tag(text).is_some(),
            Self::BitcoinAddress => bitcoin.is_valid_address(text),
        }
    }
}

fn is_currency_code(text: &str) -> bool {
    text.len() == CURRENCY_CODE_LEN && text.bytes().all(|b| b.is_ascii_uppercase())
}

/// Whether `text` parses as a base-10 decimal carrying at most
/// `precision` fractional digits once trailing zeros are normalized
/// away (so `"1.2300"` counts as 2 digits).
fn has_max_precision(text: &str, precision: u32) -> bool {
    let Ok(value) = text.parse::<Decimal>() else {
        return false;
    };
    value.normalize().scale() <= precision
}

#[cfg(test)]
mod tests {
    use super::*;
    use openfloor_types::UserId;
    use serde_json::json;

    /// Address stub: structural length check only.
    struct LenientBitcoin;

    impl BitcoinApi for LenientBitcoin {
        fn is_valid_address(&self, address: &str) -> bool {
            (26..=35).contains(&address.len())
        }

        fn derive_deposit_address(&self, _user_id: UserId, _chain_index: u32) -> String {
            unreachable!("validator tests never derive")
        }
    }

    fn check(spec: FieldSpec, value: Value) -> bool {
        spec.check(&value, &LenientBitcoin)
    }

    #[test]
    fn non_string_values_always_fail() {
        for spec in [
            FieldSpec::Str,
            FieldSpec::Email,
            FieldSpec::CurrencyCode,
            FieldSpec::OrderValue,
        ] {
            assert!(!check(spec, json!(42)));
            assert!(!check(spec, json!(null)));
            assert!(!check(spec, json!(["BTC"])));
        }
    }

    #[test]
    fn email_shape() {
        assert!(check(FieldSpec::Email, json!("ada@example.com")));
        assert!(check(FieldSpec::Email, json!("a@b.c")));
        assert!(!check(FieldSpec::Email, json!("ada@example")));
        assert!(!check(FieldSpec::Email, json!("@example.com")));
        assert!(!check(FieldSpec::Email, json!("ada@@example.com")));
        assert!(!check(FieldSpec::Email, json!("")));
    }

    #[test]
    fn public_key_is_64_hex_chars() {
        let hex64 = "ab".repeat(32);
        assert!(check(FieldSpec::PublicKey, json!(hex64)));
        assert!(check(FieldSpec::PublicKey, json!("AB".repeat(32))));
        assert!(!check(FieldSpec::PublicKey, json!("ab".repeat(31))));
        assert!(!check(FieldSpec::PublicKey, json!("zz".repeat(32))));
    }

    #[test]
    fn currency_code_case_and_length() {
        assert!(check(FieldSpec::CurrencyCode, json!("BTC")));
        assert!(check(FieldSpec::CurrencyCode, json!("USD")));
        assert!(!check(FieldSpec::CurrencyCode, json!("btc")));
        assert!(!check(FieldSpec::CurrencyCode, json!("BT")));
        assert!(!check(FieldSpec::CurrencyCode, json!("BTCD")));
        assert!(!check(FieldSpec::CurrencyCode, json!("BT1")));
    }

    #[test]
    fn order_value_four_fractional_digits() {
        assert!(check(FieldSpec::OrderValue, json!("1.2345")));
        assert!(check(FieldSpec::OrderValue, json!("1")));
        assert!(check(FieldSpec::OrderValue, json!("0.1")));
        // Trailing zeros normalize away.
        assert!(check(FieldSpec::OrderValue, json!("1.230000")));
        assert!(!check(FieldSpec::OrderValue, json!("1.23456")));
        assert!(!check(FieldSpec::OrderValue, json!("abc")));
        assert!(!check(FieldSpec::OrderValue, json!("")));
    }

    #[test]
    fn amount_eight_fractional_digits() {
        assert!(check(FieldSpec::Amount, json!("0.12345678")));
        assert!(!check(FieldSpec::Amount, json!("0.123456789")));
    }

    #[test]
    fn order_type_literal_tags() {
        assert!(check(FieldSpec::OrderType, json!("Buy")));
        assert!(check(FieldSpec::OrderType, json!("Sell")));
        assert!(!check(FieldSpec::OrderType, json!("buy")));
        assert!(!check(FieldSpec::OrderType, json!("Hold")));
    }

    #[test]
    fn bitcoin_address_delegates_to_collaborator() {
        assert!(check(
            FieldSpec::BitcoinAddress,
            json!("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2")
        ));
        assert!(!check(FieldSpec::BitcoinAddress, json!("short")));
    }
}
