//!
//! 集成测试的通用辅助函数
//!
#![allow(dead_code)]

use async_trait::async_trait;
use baofoo_seal::codec::{KeyMaterial, SegmentedCodec};
use baofoo_seal::transport::{FormFields, Transport, TransportError};
use rsa::rand_core::OsRng as RsaOsRng;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::Value;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::EnvFilter;

/// 安装测试用日志输出，`RUST_LOG=baofoo_seal=debug` 可查看编解码与请求日志
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 商户与宝付各自的 1024 位私钥，进程内只生成一次
pub fn merchant_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut RsaOsRng, 1024).unwrap())
}

pub fn gateway_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut RsaOsRng, 1024).unwrap())
}

/// 商户侧：用商户私钥加密，用宝付公钥解密
pub fn merchant_keys() -> KeyMaterial {
    KeyMaterial::new(merchant_key().clone(), RsaPublicKey::from(gateway_key()))
}

/// 网关侧：用宝付私钥加密，用商户公钥解密
pub fn gateway_keys() -> KeyMaterial {
    KeyMaterial::new(gateway_key().clone(), RsaPublicKey::from(merchant_key()))
}

/// 同一密钥对的两端，用于自环测试
pub fn loopback_codec() -> SegmentedCodec {
    init_tracing();
    SegmentedCodec::new(KeyMaterial::new(
        merchant_key().clone(),
        RsaPublicKey::from(merchant_key()),
    ))
}

/// 一次被记录下来的请求
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub fields: Vec<(String, String)>,
    /// 网关解密后的明文报文
    pub payload: Value,
}

impl RecordedRequest {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// 网关应答方式
pub enum Reply {
    /// 加密后返回此 JSON
    Encrypted(Value),
    /// 原样返回明文
    Plaintext(String),
    /// 返回任意原始字符串
    Raw(String),
    /// 传输失败
    Fail,
}

/// 模拟宝付网关：解密请求、记录下来，并按预设方式应答
pub struct MockGateway {
    codec: SegmentedCodec,
    reply: Box<dyn Fn(&Value) -> Reply + Send + Sync>,
    pub requests: Mutex<Vec<RecordedRequest>>,
}

impl MockGateway {
    pub fn new<F>(reply: F) -> Self
    where
        F: Fn(&Value) -> Reply + Send + Sync + 'static,
    {
        init_tracing();
        Self {
            codec: SegmentedCodec::new(gateway_keys()),
            reply: Box::new(reply),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl Transport for MockGateway {
    async fn post_form(&self, url: &str, fields: &FormFields) -> Result<String, TransportError> {
        let content = fields
            .iter()
            .find(|(key, _)| *key == "data_content")
            .map(|(_, value)| value.clone())
            .unwrap();
        let payload: Value = serde_json::from_slice(&self.codec.decode(&content).unwrap()).unwrap();

        let reply = (self.reply)(&payload);
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            fields: fields
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect(),
            payload,
        });

        match reply {
            Reply::Encrypted(body) => Ok(self.codec.encode(body.to_string().as_bytes()).unwrap()),
            Reply::Plaintext(body) | Reply::Raw(body) => Ok(body),
            Reply::Fail => Err(TransportError::Http("operation timed out".into())),
        }
    }
}
