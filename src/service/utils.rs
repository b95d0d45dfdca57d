//! Integer-exact amount handling for U256 token values
//!
//! Amounts that reach the pool are always raw integers in the token's own
//! precision. `Decimal` is only used for the advisory exchange rate shown to
//! callers.

use alloy::primitives::U256;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::ServiceResult;
use super::error::ServiceError;

/// Basis points in 100%.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Convert U256 to Decimal with proper decimal scaling
///
/// # Arguments
/// * `value` - The U256 value to convert
/// * `decimals` - Number of decimal places (e.g., 18 for amDAI, 6 for amUSDC)
///
/// # Returns
/// A Decimal representing the actual value (e.g., 1.5 instead of 1500000)
pub fn u256_to_decimal(value: U256, decimals: u8) -> ServiceResult<Decimal> {
    let mut decimal = Decimal::from_str(&value.to_string()).map_err(|e| {
        ServiceError::InvalidAmount(format!("Failed to parse U256 to Decimal: {}", e))
    })?;

    for _ in 0..decimals {
        decimal /= Decimal::from(10);
    }

    Ok(decimal.normalize())
}

/// Exchange rate between two raw amounts with different decimals
///
/// # Returns
/// Units of output token per unit of input token, or "0" when it cannot be computed
pub fn calculate_exchange_rate(
    amount_in: U256,
    amount_out: U256,
    decimals_in: u8,
    decimals_out: u8,
) -> String {
    if amount_in.is_zero() {
        return "0".to_string();
    }

    let rate = u256_to_decimal(amount_out, decimals_out).and_then(|out| {
        let input = u256_to_decimal(amount_in, decimals_in)?;
        out.checked_div(input)
            .ok_or_else(|| ServiceError::InvalidAmount("Division overflow".to_string()))
    });

    match rate {
        Ok(rate) => rate.normalize().to_string(),
        Err(_) => "0".to_string(),
    }
}

/// Parse human-readable amount (e.g., "1.5") to smallest unit based on decimals
///
/// # Arguments
/// * `amount` - Human-readable amount as string (e.g., "1.5" for 1.5 amUSDC)
/// * `decimals` - Number of decimal places for the token
///
/// # Examples
/// - "1" with 18 decimals -> 1000000000000000000
/// - "100.5" with 6 decimals -> 100500000
///
/// # Returns
/// U256 value in smallest unit
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, String> {
    let amount = amount.trim();
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));

    if whole.is_empty() && fraction.is_empty() {
        return Err(format!("Invalid amount format: '{amount}'"));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(format!("Invalid amount format: '{amount}'"));
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > decimals as usize {
        return Err(format!(
            "Amount '{amount}' has more than {decimals} decimal places"
        ));
    }

    let digits = format!(
        "{}{:0<width$}",
        if whole.is_empty() { "0" } else { whole },
        fraction,
        width = decimals as usize
    );

    U256::from_str_radix(&digits, 10).map_err(|e| format!("Failed to parse amount: {}", e))
}

/// Format balance from smallest unit to human-readable format
///
/// # Arguments
/// * `balance` - Balance in smallest unit
/// * `decimals` - Number of decimal places for the token
///
/// # Returns
/// Formatted balance as string with trailing zeros removed
pub fn format_balance(balance: U256, decimals: u8) -> String {
    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = balance / divisor;
    let remainder = balance % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_part = remainder.to_string();
        let padded = format!("{:0>width$}", decimal_part, width = decimals as usize);
        let trimmed = padded.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{whole}.{trimmed}")
        }
    }
}

/// Rejects a slippage tolerance above 100%
pub fn validate_slippage(slippage_bps: u32) -> ServiceResult<()> {
    if slippage_bps > BPS_DENOMINATOR {
        return Err(ServiceError::InvalidSlippage(slippage_bps));
    }
    Ok(())
}

/// Minimum acceptable output for a quoted amount and a slippage tolerance in basis points
///
/// `expected * (10000 - slippage_bps) / 10000`, rounded down.
///
/// # Errors
/// * `InvalidSlippage` - tolerance above 10000 bps
/// * `InvalidAmount` - the intermediate product overflows U256
pub fn calculate_minimum_output(expected: U256, slippage_bps: u32) -> ServiceResult<U256> {
    validate_slippage(slippage_bps)?;

    let kept = U256::from(BPS_DENOMINATOR - slippage_bps);
    let product = expected.checked_mul(kept).ok_or_else(|| {
        ServiceError::InvalidAmount(format!("Expected output {expected} overflows"))
    })?;

    Ok(product / U256::from(BPS_DENOMINATOR))
}
