use crate::errors::error::{AppError, Result};
use ethers_core::types::U256;
use ethers_core::utils;

/// 按 scale 格式化为可读字符串，去掉小数部分末尾的 0；scale 超过 77 时报错
pub fn format_units(value: U256, scale: u32) -> Result<String> {
    let text = utils::format_units(value, scale)
        .map_err(|e| AppError::Conversion(format!("{} 按 {} 位格式化失败: {}", value, scale, e)))?;
    match text.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                Ok(whole.to_string())
            } else {
                Ok(format!("{}.{}", whole, frac))
            }
        }
        None => Ok(text),
    }
}

/// 带单位后缀，例如 "1.5 ETH"
pub fn format_with_unit(value: U256, scale: u32, unit: &str) -> Result<String> {
    Ok(format!("{} {}", format_units(value, scale)?, unit))
}
