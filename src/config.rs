//!
//! # 网关配置
//!
//! 环境选择、接口地址、商户身份与证书路径。
//! 证书文件在这里读成字节后交给 `KeyMaterial`，编解码器本身从不访问文件系统。
//!

use crate::codec::{DEFAULT_BLOCK_CIPHER_HEXLEN, KeyError, KeyMaterial};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zeroize::Zeroizing;

const ENV_PREFIX: &str = "BAOFOO_";
const DEFAULT_BACK_TRANS_URL: &str = "https://tgw.baofoo.com/cutpayment/api/backTransRequest";
const PRODUCTION_FOPAY_BASE: &str = "https://public.baofoo.com/baofoo-fopay/pay";
const TESTING_FOPAY_BASE: &str = "http://paytest.baofoo.com/baofoo-fopay/pay";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to load key material")]
    Key(#[from] KeyError),
}

/// 运行环境，不同环境对应的代付接口地址不同
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Environment {
    #[default]
    Testing,
    Production,
}

/// 代付类接口
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// 代付交易
    AgentPay,
    /// 代付交易状态查证
    AgentPayStatusQuery,
    /// 代付交易退款查证
    AgentPayRefundQuery,
    /// 代付交易拆分
    AgentPaySplit,
    /// 代付绑卡交易
    AgentPayBindCard,
    /// 宝付账户实时交易
    AccountTransfer,
    /// 账户收款方交易查证
    AccountPayeeQuery,
}

impl Endpoint {
    pub fn code(self) -> &'static str {
        match self {
            Endpoint::AgentPay => "BF0040001",
            Endpoint::AgentPayStatusQuery => "BF0040002",
            Endpoint::AgentPayRefundQuery => "BF0040003",
            Endpoint::AgentPaySplit => "BF0040004",
            Endpoint::AgentPayBindCard => "BF0040006",
            Endpoint::AccountTransfer => "BF0040007",
            Endpoint::AccountPayeeQuery => "BF0040010",
        }
    }

    /// 单次请求允许的记录条数上限
    pub fn max_records(self) -> Option<usize> {
        match self {
            Endpoint::AgentPay | Endpoint::AgentPayStatusQuery | Endpoint::AgentPaySplit => Some(5),
            Endpoint::AgentPayRefundQuery => Some(1),
            Endpoint::AgentPayBindCard | Endpoint::AccountTransfer | Endpoint::AccountPayeeQuery => {
                None
            }
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// 完整的网关配置
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub environment: Environment,
    pub version: String,
    /// 加密报文的数据类型，本客户端只支持 `json`
    pub data_type: String,
    pub terminal_id: String,
    pub member_id: String,
    pub txn_type: String,
    pub biz_type: String,
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    #[serde(deserialize_with = "deserialize_secret")]
    pub private_key_password: SecretString,
    pub request_timeout_secs: u64,
    /// 认证支付接口地址，默认为宝付正式地址
    pub request_url: Option<String>,
    /// 入站密文块的十六进制宽度，须与宝付公钥模长一致
    pub cipher_block_hexlen: usize,
}

fn deserialize_secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Testing,
            version: "4.0.0.0".to_string(),
            data_type: "json".to_string(),
            terminal_id: "100000178".to_string(),
            member_id: "100000859".to_string(),
            txn_type: "0431".to_string(),
            biz_type: "0000".to_string(),
            private_key_path: PathBuf::from("./res/cer/m_pri.pfx"),
            public_key_path: PathBuf::from("./res/cer/baofoo_pub.cer"),
            private_key_password: SecretString::from("123456".to_string()),
            request_timeout_secs: 60,
            request_url: None,
            cipher_block_hexlen: DEFAULT_BLOCK_CIPHER_HEXLEN,
        }
    }
}

impl GatewayConfig {
    /// 从 JSON 文件加载配置，缺省字段取默认值
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// 以 `BAOFOO_*` 环境变量覆盖默认配置
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 以任意键值来源覆盖默认配置，键名与环境变量相同
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let mut config = Self::default();

        if let Some(value) = var("ENV") {
            config.environment = match value.to_uppercase().as_str() {
                "PRODUCTION" => Environment::Production,
                "TESTING" => Environment::Testing,
                other => return Err(ConfigError::Invalid(format!("unknown environment {other}"))),
            };
        }
        if let Some(value) = var("TERMINAL_ID") {
            config.terminal_id = value;
        }
        if let Some(value) = var("MEMBER_ID") {
            config.member_id = value;
        }
        if let Some(value) = var("PRIVATE_KEY_PATH") {
            config.private_key_path = PathBuf::from(value);
        }
        if let Some(value) = var("PUBLIC_KEY_PATH") {
            config.public_key_path = PathBuf::from(value);
        }
        if let Some(value) = var("PRIVATE_KEY_PASSWORD") {
            config.private_key_password = SecretString::from(value);
        }
        if let Some(value) = var("REQUEST_URL") {
            config.request_url = Some(value);
        }
        if let Some(value) = var("TIMEOUT_SECS") {
            config.request_timeout_secs = value
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("timeout is not a number: {value}")))?;
        }
        if let Some(value) = var("CIPHER_BLOCK_HEXLEN") {
            config.cipher_block_hexlen = value
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("block width is not a number: {value}")))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cipher_block_hexlen == 0 || self.cipher_block_hexlen % 2 != 0 {
            return Err(ConfigError::Invalid(format!(
                "cipher_block_hexlen must be a positive even number, got {}",
                self.cipher_block_hexlen
            )));
        }
        if self.data_type != "json" {
            return Err(ConfigError::Invalid(format!(
                "unsupported data_type {}",
                self.data_type
            )));
        }
        if self.terminal_id.is_empty() || self.member_id.is_empty() {
            return Err(ConfigError::Invalid("terminal_id and member_id are required".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// 代付接口地址
    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        let base = match self.environment {
            Environment::Production => PRODUCTION_FOPAY_BASE,
            Environment::Testing => TESTING_FOPAY_BASE,
        };
        format!("{base}/{}.do", endpoint.code())
    }

    /// 认证支付（后台交易）接口地址
    pub fn back_trans_url(&self) -> &str {
        self.request_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_BACK_TRANS_URL)
    }

    /// 读取证书文件并构造密钥材料
    pub fn load_key_material(&self) -> Result<KeyMaterial, ConfigError> {
        let read = |path: &Path| {
            std::fs::read(path)
                .map(Zeroizing::new)
                .map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
        };
        let pkcs12 = read(&self.private_key_path)?;
        let certificate = read(&self.public_key_path)?;
        Ok(KeyMaterial::from_pkcs12_and_certificate(
            &pkcs12,
            self.private_key_password.expose_secret(),
            &certificate,
        )?)
    }
}
