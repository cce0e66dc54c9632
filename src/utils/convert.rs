//! 最小单位（wei 等）与十进制金额之间的精确换算。
//!
//! `decimal = base_units / 10^scale`，scale 由调用方给出（原生币为 18）。
//! 所有换算都走 BigDecimal 的十进制表示，不经过浮点；唯一的例外是
//! [`to_base_units_from_f64`]，f64 本身无法精确表示多数十进制小数，
//! 调用方应优先使用字符串或整数入口。

use crate::errors::error::{AppError, Result};
use bigdecimal::BigDecimal;
use bigdecimal::num_bigint::{BigInt, Sign};
use ethers_core::types::U256;
use std::str::FromStr;

pub const ETHER_DECIMALS: u32 = 18;
pub const GWEI_DECIMALS: u32 = 9;

/// U256::MAX 共 78 位十进制数，更大的 scale 没有意义
pub const MAX_SCALE: u32 = 77;

fn check_scale(scale: u32) -> Result<i64> {
    if scale > MAX_SCALE {
        return Err(AppError::Conversion(format!("scale {} 超过上限 {}", scale, MAX_SCALE)));
    }
    Ok(i64::from(scale))
}

fn u256_to_bigint(value: U256) -> BigInt {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    BigInt::from_bytes_be(Sign::Plus, &bytes)
}

/// 最小单位 → 十进制金额（保留全部精度）
pub fn to_decimal(value: U256, scale: u32) -> Result<BigDecimal> {
    Ok(BigDecimal::new(u256_to_bigint(value), check_scale(scale)?))
}

/// 十进制字符串形式的最小单位 → 十进制金额
pub fn to_decimal_from_str(value: &str, scale: u32) -> Result<BigDecimal> {
    let value = U256::from_dec_str(value.trim())
        .map_err(|e| AppError::InvalidNumber(format!("{}: {:?}", value, e)))?;
    to_decimal(value, scale)
}

/// 十进制金额 → 最小单位，超出 scale 的小数位直接截断
pub fn to_base_units(amount: &BigDecimal, scale: u32) -> Result<U256> {
    if *amount < BigDecimal::from(0) {
        return Err(AppError::Conversion(format!("金额不能为负数: {}", amount)));
    }

    // amount × 10^scale，再截断小数部分
    let shift = BigDecimal::new(BigInt::from(1), -check_scale(scale)?);
    let (digits, _) = (amount * shift).with_scale(0).into_bigint_and_exponent();

    let (_, bytes) = digits.to_bytes_be();
    if bytes.len() > 32 {
        return Err(AppError::Conversion(format!("{} 超出 U256 范围", amount)));
    }
    Ok(U256::from_big_endian(&bytes))
}

pub fn to_base_units_from_str(amount: &str, scale: u32) -> Result<U256> {
    let amount = BigDecimal::from_str(amount.trim())
        .map_err(|e| AppError::InvalidNumber(format!("{}: {}", amount, e)))?;
    to_base_units(&amount, scale)
}

pub fn to_base_units_from_int(amount: u128, scale: u32) -> Result<U256> {
    to_base_units(&BigDecimal::from(amount), scale)
}

/// f64 → 最小单位。
///
/// 先取 f64 的最短十进制表示（`0.1` 得到 "0.1" 而不是其二进制展开），
/// 但超过 15~17 位有效数字的输入本身已经丢失精度，这里不会也无法修正。
pub fn to_base_units_from_f64(amount: f64, scale: u32) -> Result<U256> {
    if !amount.is_finite() {
        return Err(AppError::InvalidNumber(format!("非有限浮点数: {}", amount)));
    }
    to_base_units_from_str(&format!("{}", amount), scale)
}
