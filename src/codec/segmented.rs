//! `SegmentedCodec` 实现宝付报文的分段非对称编解码。
//!
//! 出站：明文 → base64 → 每 32 个字符一块 → 私钥变换 → 十六进制拼接。
//! 入站：十六进制按固定宽度切块 → 公钥还原 → 拼接 → base64 解码。
//! 块宽度固定，所以密文不需要分隔符或长度前缀。

use crate::codec::block::{open_block, seal_block};
use crate::codec::errors::CodecError;
use crate::codec::keys::KeyMaterial;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// 每个明文块包含的 base64 字符数
pub const BLOCK_PLAIN_LEN: usize = 32;

/// 1024 位对端公钥对应的密文块十六进制宽度
pub const DEFAULT_BLOCK_CIPHER_HEXLEN: usize = 256;

/// 分段编解码器。
///
/// 密钥材料在构造后只读，可以放进 `Arc` 被任意多个并发请求共享。
#[derive(Debug, Clone)]
pub struct SegmentedCodec {
    keys: KeyMaterial,
    cipher_block_hexlen: usize,
}

impl SegmentedCodec {
    /// 按对端公钥的模长推导入站块宽度
    pub fn new(keys: KeyMaterial) -> Self {
        let cipher_block_hexlen = keys.verification_width() * 2;
        Self {
            keys,
            cipher_block_hexlen,
        }
    }

    /// 使用协议约定的固定入站块宽度。
    ///
    /// 该宽度必须与对端公钥的模长一致，否则返回 `BlockSizeMismatch`。
    pub fn with_cipher_block_hexlen(
        keys: KeyMaterial,
        cipher_block_hexlen: usize,
    ) -> Result<Self, CodecError> {
        let width = keys.verification_width();
        if cipher_block_hexlen != width * 2 {
            return Err(CodecError::BlockSizeMismatch {
                expected: width,
                actual: cipher_block_hexlen / 2,
            });
        }
        Ok(Self {
            keys,
            cipher_block_hexlen,
        })
    }

    pub fn keys(&self) -> &KeyMaterial {
        &self.keys
    }

    pub fn cipher_block_hexlen(&self) -> usize {
        self.cipher_block_hexlen
    }

    /// 编码出站明文，返回十六进制密文
    pub fn encode(&self, plaintext: &[u8]) -> Result<String, CodecError> {
        let text = STANDARD.encode(plaintext);
        let signing_key = self.keys.signing_key();

        let mut ciphertext =
            String::with_capacity(encoded_len(text.len(), self.keys.signing_width()));
        for chunk in text.as_bytes().chunks(BLOCK_PLAIN_LEN) {
            let sealed = seal_block(signing_key, chunk)?;
            ciphertext.push_str(&hex::encode(sealed));
        }

        tracing::debug!(
            plaintext_len = plaintext.len(),
            blocks = text.len().div_ceil(BLOCK_PLAIN_LEN),
            "encoded gateway payload"
        );
        Ok(ciphertext)
    }

    /// 解码入站十六进制密文，返回原始明文
    pub fn decode(&self, ciphertext: &str) -> Result<Vec<u8>, CodecError> {
        let ciphertext = ciphertext.trim();
        if ciphertext.len() % 2 != 0 {
            return Err(CodecError::MalformedCiphertext(format!(
                "odd hex length {}",
                ciphertext.len()
            )));
        }

        let verification_key = self.keys.verification_key();
        let mut text = Vec::with_capacity(ciphertext.len() / self.cipher_block_hexlen * BLOCK_PLAIN_LEN);
        for chunk in ciphertext.as_bytes().chunks(self.cipher_block_hexlen) {
            let block = hex::decode(chunk)
                .map_err(|e| CodecError::MalformedCiphertext(e.to_string()))?;
            if block.len() * 2 != self.cipher_block_hexlen {
                return Err(CodecError::BlockSizeMismatch {
                    expected: self.cipher_block_hexlen / 2,
                    actual: block.len(),
                });
            }
            text.extend_from_slice(&open_block(verification_key, &block)?);
        }

        tracing::debug!(
            blocks = ciphertext.len() / self.cipher_block_hexlen,
            "decoded gateway payload"
        );
        STANDARD
            .decode(&text)
            .map_err(|e| CodecError::MalformedPlaintext(e.to_string()))
    }
}

/// 给定 base64 文本长度与私钥模长时，密文的十六进制长度
pub fn encoded_len(base64_len: usize, modulus_width: usize) -> usize {
    base64_len.div_ceil(BLOCK_PLAIN_LEN) * modulus_width * 2
}
