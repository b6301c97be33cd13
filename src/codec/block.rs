//! 单块 RSA 变换。
//!
//! 出站方向相当于 "私钥加密"：对块做 PKCS#1 v1.5 类型 1 填充后执行私钥运算，
//! 输出恒为模长字节数。入站方向相当于 "公钥解密"：执行公钥运算并去除类型 1 填充，
//! 还原出原始块内容。每块独立处理，没有链接、没有 IV。

use crate::codec::errors::CodecError;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};

/// PKCS#1 v1.5 要求的最小填充长度（0x00 0x01 PS 0x00，PS 至少 8 字节）
const MIN_PADDING_LEN: usize = 11;

/// 用签名私钥变换一个明文块
pub(crate) fn seal_block(key: &RsaPrivateKey, block: &[u8]) -> Result<Vec<u8>, CodecError> {
    if block.len() + MIN_PADDING_LEN > key.size() {
        return Err(CodecError::TransformFailed(format!(
            "block of {} bytes does not fit a {}-bit key",
            block.len(),
            key.size() * 8
        )));
    }
    key.sign(Pkcs1v15Sign::new_unprefixed(), block)
        .map_err(|e| CodecError::TransformFailed(e.to_string()))
}

/// 用验证公钥还原一个密文块
pub(crate) fn open_block(key: &RsaPublicKey, block: &[u8]) -> Result<Vec<u8>, CodecError> {
    let width = key.size();
    if block.len() != width {
        return Err(CodecError::BlockSizeMismatch {
            expected: width,
            actual: block.len(),
        });
    }

    let c = BigUint::from_bytes_be(block);
    if &c >= key.n() {
        return Err(CodecError::TransformFailed(
            "cipher block is not smaller than the modulus".into(),
        ));
    }
    let m = c.modpow(key.e(), key.n()).to_bytes_be();

    // 左侧补零到模长
    let mut em = vec![0u8; width];
    em[width - m.len()..].copy_from_slice(&m);
    strip_type1_padding(&em)
}

fn strip_type1_padding(em: &[u8]) -> Result<Vec<u8>, CodecError> {
    if em.len() < MIN_PADDING_LEN || em[0] != 0x00 || em[1] != 0x01 {
        return Err(CodecError::TransformFailed("invalid block padding header".into()));
    }
    let separator = em[2..]
        .iter()
        .position(|&b| b != 0xff)
        .map(|pos| pos + 2)
        .ok_or_else(|| CodecError::TransformFailed("missing padding separator".into()))?;
    if em[separator] != 0x00 || separator - 2 < 8 {
        return Err(CodecError::TransformFailed("invalid padding string".into()));
    }
    Ok(em[separator + 1..].to_vec())
}
