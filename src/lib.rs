//! # Baofoo-Seal: 宝付支付网关客户端
//!
//! `baofoo-seal` 实现宝付网关要求的报文保护与请求/响应约定：
//!
//! - **`SegmentedCodec`**: 分段非对称编解码。明文经 base64 后每 32 个字符一块，
//!   用商户私钥逐块变换并以十六进制拼接；响应按固定宽度切块，用宝付公钥还原。
//! - **`EnvelopeBuilder`**: 组装代付接口的嵌套信封，批量接口的笔数与总金额由记录重新计算。
//! - **`ResponseOutcome`**: 把宝付响应码分为成功、需要查询、失败三类。
//! - **`GatewayClient`**: 串联以上组件，并通过可替换的 `Transport` 发出请求。
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use baofoo_seal::prelude::*;
//! use rust_decimal_macros::dec;
//! use std::time::Duration;
//!
//! async fn pay() -> baofoo_seal::Result<()> {
//!     let config = GatewayConfig::from_env()?;
//!     let keys = config.load_key_material()?;
//!     let transport = HttpTransport::new(Duration::from_secs(config.request_timeout_secs))?;
//!     let client = GatewayClient::new(config, keys, transport)?;
//!
//!     let record = AgentPayRecord::new(generate_trans_id(), dec!(0.01), "张三", "6222020000000000", "工商银行");
//!     let reply = client.agent_pay(vec![record]).await?;
//!     match reply.outcome.class() {
//!         OutcomeClass::Success => println!("paid"),
//!         OutcomeClass::NeedsQuery => println!("query later"),
//!         OutcomeClass::Failure => println!("failed: {}", reply.outcome.message),
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod envelope;
pub mod error;
pub mod ids;
pub mod outcome;
pub mod transport;

pub use error::{Error, RequestError, Result};

// --- Prelude ---
// 最常用的类型与函数。
pub mod prelude {
    pub use crate::client::{GatewayClient, GatewayReply, TransactionRequest, TxnSubType};
    pub use crate::codec::{CodecError, KeyMaterial, SegmentedCodec};
    pub use crate::config::{Endpoint, Environment, GatewayConfig};
    pub use crate::envelope::{
        AgentPayRecord, Envelope, EnvelopeBuilder, EnvelopeError, RefundQueryRecord,
        StatusQueryRecord, TransHead, TransRecord,
    };
    pub use crate::ids::{generate_serial_no, generate_trans_id};
    pub use crate::outcome::{OutcomeClass, ResponseOutcome, is_success};
    #[cfg(feature = "http")]
    pub use crate::transport::HttpTransport;
    pub use crate::transport::{Transport, TransportError};
}

/// The version of the `baofoo-seal` crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
