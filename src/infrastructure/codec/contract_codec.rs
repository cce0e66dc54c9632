// infrastructure/codec/contract_codec.rs
use crate::errors::error::{AppError, Result};
use ethers_core::abi::{Abi, Function, Token};
use ethers_core::types::{Bytes, H256};
use ethers_core::utils::keccak256;

/// 方法选择器：keccak256("name(type1,type2)") 的前 4 字节
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// 事件签名哈希（日志 topics[0]）
pub fn event_topic(signature: &str) -> H256 {
    H256::from(keccak256(signature.as_bytes()))
}

/// 规范方法签名 "name(type1,type2)"，不含返回类型
pub fn canonical_signature(function: &Function) -> String {
    let kinds: Vec<String> = function.inputs.iter().map(|p| p.kind.to_string()).collect();
    format!("{}({})", function.name, kinds.join(","))
}

/// 合约调用的编解码边界，ABI 由 ethabi 解析
#[derive(Debug, Clone)]
pub struct ContractCodec {
    abi: Abi,
}

impl ContractCodec {
    pub fn new(abi: Abi) -> Self {
        Self { abi }
    }

    /// 从 ABI JSON 文档构造
    pub fn from_json(json: &str) -> Result<Self> {
        let abi: Abi = serde_json::from_str(json)
            .map_err(|e| AppError::Decode(format!("ABI JSON 解析失败: {}", e)))?;
        Ok(Self::new(abi))
    }

    pub fn abi(&self) -> &Abi {
        &self.abi
    }

    /// 按参数个数和类型在重载中挑选方法
    pub fn function_for(&self, name: &str, args: &[Token]) -> Result<&Function> {
        let candidates = self
            .abi
            .functions_by_name(name)
            .map_err(|_| AppError::Encode(format!("ABI 中不存在方法 {}", name)))?;

        candidates
            .iter()
            .find(|f| {
                let kinds: Vec<_> = f.inputs.iter().map(|p| p.kind.clone()).collect();
                Token::types_check(args, &kinds)
            })
            .ok_or_else(|| {
                let expected: Vec<String> = candidates.iter().map(canonical_signature).collect();
                AppError::Encode(format!(
                    "{} 的参数与 ABI 不匹配（{} 个参数），可选签名: {}",
                    name,
                    args.len(),
                    expected.join(", ")
                ))
            })
    }

    /// selector ‖ abi.encode(args)
    pub fn encode_call(&self, name: &str, args: &[Token]) -> Result<Bytes> {
        let function = self.function_for(name, args)?;
        function
            .encode_input(args)
            .map(Bytes::from)
            .map_err(|e| AppError::Encode(format!("{} 编码失败: {}", canonical_signature(function), e)))
    }

    /// 按声明的返回类型解码；重载方法依次尝试，取第一个成功的
    pub fn decode_call_result(&self, name: &str, data: &[u8]) -> Result<Vec<Token>> {
        let candidates = self
            .abi
            .functions_by_name(name)
            .map_err(|_| AppError::Decode(format!("ABI 中不存在方法 {}", name)))?;

        let mut last_err = None;
        for function in candidates {
            match function.decode_output(data) {
                Ok(tokens) => return Ok(tokens),
                Err(e) => last_err = Some(e),
            }
        }
        Err(AppError::Decode(format!(
            "{} 返回值解码失败（{} 字节）: {}",
            name,
            data.len(),
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// 反向解析调用数据：按前 4 字节匹配方法，再解码参数
    pub fn decode_call_input(&self, data: &[u8]) -> Result<(&Function, Vec<Token>)> {
        if data.len() < 4 {
            return Err(AppError::Decode(format!("调用数据过短: {} 字节", data.len())));
        }
        let function = self
            .abi
            .functions()
            .find(|f| f.short_signature() == data[..4])
            .ok_or_else(|| {
                AppError::Decode(format!("未知的方法选择器 0x{}", hex::encode(&data[..4])))
            })?;
        let tokens = function
            .decode_input(&data[4..])
            .map_err(|e| AppError::Decode(format!("{} 参数解码失败: {}", canonical_signature(function), e)))?;
        Ok((function, tokens))
    }
}
