use thiserror::Error;

/// 分段编解码过程中可能出现的错误。
///
/// 这些错误都表示协议/配置不匹配或传输过程中的数据损坏，在本层不会重试。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),
    #[error("cipher block size mismatch: expected {expected} bytes, got {actual}")]
    BlockSizeMismatch { expected: usize, actual: usize },
    #[error("asymmetric transform failed: {0}")]
    TransformFailed(String),
    #[error("recovered plaintext is not valid base64: {0}")]
    MalformedPlaintext(String),
}

/// 加载密钥材料时可能出现的错误
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("failed to read pkcs#12 container: {0}")]
    Pkcs12(String),
    #[error("pkcs#12 container holds no private key")]
    NoPrivateKey,
    #[error("failed to read certificate: {0}")]
    Certificate(String),
    #[error("unsupported key: {0}")]
    UnsupportedKey(String),
}
