//! 定义 `baofoo-seal` crate 的错误类型。

use crate::codec::{CodecError, KeyError};
use crate::config::ConfigError;
use crate::envelope::EnvelopeError;
use crate::transport::TransportError;
use thiserror::Error;

/// 请求在发出之前被拒绝的原因
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("record {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },
    #[error("{endpoint} accepts at most {max} records per call, got {actual}")]
    BatchTooLarge {
        endpoint: &'static str,
        max: usize,
        actual: usize,
    },
    #[error("trade_date `{0}` is not a recognizable date")]
    InvalidTradeDate(String),
}

/// `baofoo-seal` 的主错误类型。
///
/// 编解码与信封错误会立即中止当前请求；响应码分类不是错误，
/// 终态失败以 `ResponseOutcome` 返回。
#[derive(Debug, Error)]
pub enum Error {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("key material error: {0}")]
    Key(#[from] KeyError),

    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("invalid request: {0}")]
    Request(#[from] RequestError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("decrypted response is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
