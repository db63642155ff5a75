//! Fixed-point token amounts.
//!
//! On-chain amounts are integers in the smallest unit; one whole token is
//! 10^18 units. The decimal view is exact (string based, no floats).

use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::U256;
use serde::{Serialize, Serializer};

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Base units per whole token.
pub const TOKEN_DECIMALS: u8 = 18;

/// An amount of the stake token (or native currency) in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount(U256);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(U256::ZERO);

    pub const fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    /// `tokens` whole tokens.
    pub fn from_tokens(tokens: u64) -> Self {
        Self(U256::from(tokens) * U256::from(10u64).pow(U256::from(TOKEN_DECIMALS)))
    }

    /// Parse a decimal token amount such as `"12.5"`.
    pub fn parse_tokens(text: &str) -> BlockchainResult<Self> {
        parse_ether(text.trim())
            .map(Self)
            .map_err(|e| BlockchainError::InvalidArgument(format!("invalid token amount '{}': {}", text, e)))
    }

    pub fn raw(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Exact decimal string with all 18 fractional digits.
    pub fn to_decimal_string(&self) -> String {
        format_ether(self.0)
    }

    /// Difference that floors at zero.
    pub fn saturating_sub(&self, other: TokenAmount) -> TokenAmount {
        TokenAmount(self.0.saturating_sub(other.0))
    }
}

impl From<U256> for TokenAmount {
    fn from(raw: U256) -> Self {
        Self(raw)
    }
}

/// Decimal with trailing fractional zeros removed: `100`, `12.5`.
impl std::fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let full = self.to_decimal_string();
        let trimmed = match full.split_once('.') {
            Some((whole, frac)) => {
                let frac = frac.trim_end_matches('0');
                if frac.is_empty() {
                    whole.to_string()
                } else {
                    format!("{}.{}", whole, frac)
                }
            }
            None => full,
        };
        f.write_str(&trimmed)
    }
}

/// Serialized as `{"raw": "<base units>", "tokens": "<decimal>"}`.
impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("TokenAmount", 2)?;
        s.serialize_field("raw", &self.0.to_string())?;
        s.serialize_field("tokens", &self.to_string())?;
        s.end()
    }
}

/// `serialize_with` helper writing an integer as decimal text.
pub fn serialize_decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_tokens_round_trip_exactly() {
        for tokens in [0u64, 1, 10, 100, 1_000_000, u64::MAX] {
            let amount = TokenAmount::from_tokens(tokens);
            let back = TokenAmount::parse_tokens(&amount.to_decimal_string()).unwrap();
            assert_eq!(back.raw(), amount.raw(), "tokens = {}", tokens);
        }
    }

    #[test]
    fn test_display_trims_zeros() {
        assert_eq!(TokenAmount::from_tokens(100).to_string(), "100");
        assert_eq!(TokenAmount::parse_tokens("12.5").unwrap().to_string(), "12.5");
        assert_eq!(TokenAmount::ZERO.to_string(), "0");
        assert_eq!(
            TokenAmount::from_raw(U256::from(1u64)).to_string(),
            "0.000000000000000001"
        );
    }

    #[test]
    fn test_hundred_tokens_raw_value() {
        let amount = TokenAmount::from_tokens(100);
        assert_eq!(amount.raw(), U256::from(100_000_000_000_000_000_000u128));
    }

    #[test]
    fn test_serialize_has_both_views() {
        let json = serde_json::to_value(TokenAmount::from_tokens(10)).unwrap();
        assert_eq!(json["raw"], "10000000000000000000");
        assert_eq!(json["tokens"], "10");
    }

    #[test]
    fn test_decimal_serializer_is_not_hex() {
        #[derive(Serialize)]
        struct Count {
            #[serde(serialize_with = "serialize_decimal")]
            n: U256,
        }
        let json = serde_json::to_value(Count { n: U256::from(42u64) }).unwrap();
        assert_eq!(json["n"], "42");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(TokenAmount::parse_tokens("ten").is_err());
    }

    #[test]
    fn test_saturating_sub() {
        let a = TokenAmount::from_tokens(5);
        let b = TokenAmount::from_tokens(7);
        assert_eq!(b.saturating_sub(a), TokenAmount::from_tokens(2));
        assert_eq!(a.saturating_sub(b), TokenAmount::ZERO);
    }
}
