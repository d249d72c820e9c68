//! Conversion between user-facing decimal amounts and contract base units.

use alloy_primitives::U256;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Zero, negative, or below one base unit
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Amount does not fit the target representation
    #[error("Amount out of range: {0}")]
    Overflow(String),
}

/// Fixed-precision codec for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountCodec {
    decimals: u8,
}

impl AmountCodec {
    pub const fn new(decimals: u8) -> Self {
        Self { decimals }
    }

    pub const fn decimals(&self) -> u8 {
        self.decimals
    }

    /// `floor(amount * 10^decimals)`.
    pub fn encode(&self, amount: Decimal) -> Result<U256, CodecError> {
        if amount <= Decimal::ZERO {
            return Err(CodecError::InvalidAmount(format!(
                "{amount} must be greater than zero"
            )));
        }

        let factor = 10u64
            .checked_pow(u32::from(self.decimals))
            .map(Decimal::from)
            .ok_or_else(|| CodecError::Overflow(format!("{} decimals", self.decimals)))?;

        let scaled = amount
            .checked_mul(factor)
            .ok_or_else(|| CodecError::Overflow(amount.to_string()))?
            .floor();

        let base_units = scaled
            .to_u128()
            .ok_or_else(|| CodecError::Overflow(scaled.to_string()))?;

        if base_units == 0 {
            return Err(CodecError::InvalidAmount(format!(
                "{amount} is smaller than one base unit"
            )));
        }

        Ok(U256::from(base_units))
    }

    /// `base_units / 10^decimals`.
    pub fn decode(&self, base_units: U256) -> Result<Decimal, CodecError> {
        let raw = i128::try_from(base_units)
            .map_err(|_| CodecError::Overflow(base_units.to_string()))?;

        Decimal::try_from_i128_with_scale(raw, u32::from(self.decimals))
            .map_err(|e| CodecError::Overflow(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn usdc() -> AmountCodec {
        AmountCodec::new(6)
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_encode_whole_and_fractional() {
        assert_eq!(usdc().encode(dec("1")).unwrap(), U256::from(1_000_000));
        assert_eq!(usdc().encode(dec("10.25")).unwrap(), U256::from(10_250_000));
    }

    #[test]
    fn test_encode_floors_extra_precision() {
        assert_eq!(usdc().encode(dec("1.2345679")).unwrap(), U256::from(1_234_567));
    }

    #[test]
    fn test_encode_rejects_zero_and_negative() {
        assert!(matches!(
            usdc().encode(Decimal::ZERO),
            Err(CodecError::InvalidAmount(_))
        ));
        assert!(matches!(
            usdc().encode(dec("-5")),
            Err(CodecError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_encode_rejects_dust_below_one_unit() {
        assert!(matches!(
            usdc().encode(dec("0.0000001")),
            Err(CodecError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_decode() {
        assert_eq!(usdc().decode(U256::from(3_000_000)).unwrap(), dec("3"));
        assert_eq!(usdc().decode(U256::from(1)).unwrap(), dec("0.000001"));
    }

    #[test]
    fn test_decode_overflow() {
        assert!(matches!(
            usdc().decode(U256::MAX),
            Err(CodecError::Overflow(_))
        ));
    }
}
