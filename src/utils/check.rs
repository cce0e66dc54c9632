use crate::errors::error::{AppError, Result};
use ethers_core::types::{Address, Bytes, U256};

// ERC-20 transfer(address,uint256) 的函数选择器
pub const ERC20_TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// 地址格式校验：0x + 40 位十六进制（不校验 EIP-55 大小写）
pub fn is_valid_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(body) => body.len() == 40 && body.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

pub fn parse_address(address: &str) -> Result<Address> {
    if !is_valid_address(address) {
        return Err(AppError::InvalidAddress(address.to_string()));
    }
    address
        .parse::<Address>()
        .map_err(|_| AppError::InvalidAddress(address.to_string()))
}

/// 解析十六进制调用数据，允许带或不带 0x 前缀，空串视为空数据
pub fn decode_hex_payload(input: &str) -> Result<Bytes> {
    let body = input.trim();
    let body = body.strip_prefix("0x").unwrap_or(body);
    Ok(Bytes::from(hex::decode(body)?))
}

/// 调用数据是否为不携带原生币的 ERC-20 transfer
pub fn is_erc20_transfer(value: U256, input: &[u8]) -> bool {
    input.len() >= 4 && input[..4] == ERC20_TRANSFER_SELECTOR && value.is_zero()
}
