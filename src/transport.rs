//! Transport boundary between the client and the gateway.
// 中文: 客户端与宝付网关之间的传输边界。

use async_trait::async_trait;
use thiserror::Error;

/// 表单字段列表，按插入顺序编码
pub type FormFields = Vec<(&'static str, String)>;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(String),
    #[error("gateway answered with status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Sends one form-encoded POST and returns the raw response body.
///
/// Implementations perform exactly one request per call with their own timeout;
/// a request that times out never yields a body to decode, and callers treat it
/// as an undetermined outcome that must be confirmed through a status query.
///
/// 中文: 发送一次表单编码的 POST 请求并返回原始响应体。
///
/// 每次调用只发出一个请求，超时由实现自行控制；超时的请求没有可解码的响应，
/// 调用方应将其视为结果未定，通过查询接口确认。
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_form(&self, url: &str, fields: &FormFields) -> Result<String, TransportError>;
}

#[cfg(feature = "http")]
pub use self::http::HttpTransport;

#[cfg(feature = "http")]
mod http {
    use super::{FormFields, Transport, TransportError};
    use async_trait::async_trait;
    use std::time::Duration;

    /// 基于 `reqwest` 的 HTTPS 传输
    #[derive(Debug, Clone)]
    pub struct HttpTransport {
        client: reqwest::Client,
    }

    impl HttpTransport {
        pub fn new(timeout: Duration) -> Result<Self, TransportError> {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| TransportError::Http(e.to_string()))?;
            Ok(Self { client })
        }
    }

    #[async_trait]
    impl Transport for HttpTransport {
        async fn post_form(&self, url: &str, fields: &FormFields) -> Result<String, TransportError> {
            let response = self
                .client
                .post(url)
                .form(fields)
                .send()
                .await
                .map_err(|e| TransportError::Http(e.to_string()))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| TransportError::Http(e.to_string()))?;
            if !status.is_success() {
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            Ok(body)
        }
    }

}
