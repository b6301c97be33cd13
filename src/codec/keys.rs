//! 报文编解码使用的密钥材料。
//!
//! 商户私钥来自带密码保护的 PKCS#12 容器（`.pfx`），宝付公钥来自 X.509 证书（`.cer`）。
//! 两者在客户端构造时加载一次，此后只读。

use crate::codec::errors::KeyError;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use std::panic;
use x509_cert::Certificate;
use x509_cert::der::{Decode, DecodePem, Encode};
use zeroize::Zeroizing;

const PEM_PREFIX: &[u8] = b"-----BEGIN";

/// 按角色拆分的非对称密钥对。
///
/// `signing_key` 只用于生成出站密文块；`verification_key` 只用于还原入站密文块。
/// 二者分属不同的密钥对（商户私钥 / 宝付公钥），永远不会互换使用。
#[derive(Clone)]
pub struct KeyMaterial {
    signing_key: RsaPrivateKey,
    verification_key: RsaPublicKey,
}

impl KeyMaterial {
    /// 使用已经解析好的密钥构造
    pub fn new(signing_key: RsaPrivateKey, verification_key: RsaPublicKey) -> Self {
        Self {
            signing_key,
            verification_key,
        }
    }

    /// 从 PKCS#12 容器和证书的原始字节加载密钥材料。
    ///
    /// 证书可以是 DER 或 PEM 编码。文件读取由配置层负责，这里只处理字节。
    pub fn from_pkcs12_and_certificate(
        pkcs12: &[u8],
        password: &str,
        certificate: &[u8],
    ) -> Result<Self, KeyError> {
        let signing_key = signing_key_from_pkcs12(pkcs12, password)?;
        let verification_key = verification_key_from_certificate(certificate)?;
        tracing::debug!(
            signing_bits = signing_key.size() * 8,
            verification_bits = verification_key.size() * 8,
            "loaded gateway key material"
        );
        Ok(Self::new(signing_key, verification_key))
    }

    pub fn signing_key(&self) -> &RsaPrivateKey {
        &self.signing_key
    }

    pub fn verification_key(&self) -> &RsaPublicKey {
        &self.verification_key
    }

    /// 对端（验证）公钥的模长字节数，即每个入站密文块的字节宽度
    pub fn verification_width(&self) -> usize {
        self.verification_key.size()
    }

    /// 本端私钥的模长字节数，即每个出站密文块的字节宽度
    pub fn signing_width(&self) -> usize {
        self.signing_key.size()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("signing_bits", &(self.signing_width() * 8))
            .field("verification_bits", &(self.verification_width() * 8))
            .finish_non_exhaustive()
    }
}

fn signing_key_from_pkcs12(pkcs12: &[u8], password: &str) -> Result<RsaPrivateKey, KeyError> {
    // p12 在个别畸形输入上会触发内部断言，这里统一转换成错误
    let der = panic::catch_unwind(|| pkcs8_from_pkcs12(pkcs12, password))
        .map_err(|_| KeyError::Pkcs12("malformed pkcs#12 container".into()))??;
    RsaPrivateKey::from_pkcs8_der(&der).map_err(|e| KeyError::UnsupportedKey(e.to_string()))
}

fn pkcs8_from_pkcs12(pkcs12: &[u8], password: &str) -> Result<Zeroizing<Vec<u8>>, KeyError> {
    let pfx = p12::PFX::parse(pkcs12).map_err(|e| KeyError::Pkcs12(format!("{e:?}")))?;

    // 只支持 SHA-1 MAC 的传统容器；OpenSSL 3 默认导出的 SHA-256 MAC / PBES2 容器需加 -legacy
    if let Some(mac_data) = &pfx.mac_data {
        if mac_data.mac.digest_algorithm != p12::AlgorithmIdentifier::Sha1 {
            return Err(KeyError::Pkcs12(
                "unsupported MAC/PBES2 container, re-export it with `openssl pkcs12 -legacy`".into(),
            ));
        }
    }
    if !pfx.verify_mac(password) {
        return Err(KeyError::Pkcs12("MAC verification failed, wrong password?".into()));
    }
    let bags = pfx
        .key_bags(password)
        .map_err(|e| KeyError::Pkcs12(format!("{e:?}")))?;

    // key bag 中是 PKCS#8 编码的私钥，解析后立即擦除
    bags.into_iter()
        .next()
        .map(Zeroizing::new)
        .ok_or(KeyError::NoPrivateKey)
}

fn verification_key_from_certificate(certificate: &[u8]) -> Result<RsaPublicKey, KeyError> {
    let cert = if certificate.trim_ascii_start().starts_with(PEM_PREFIX) {
        Certificate::from_pem(certificate)
    } else {
        Certificate::from_der(certificate)
    }
    .map_err(|e| KeyError::Certificate(e.to_string()))?;

    let spki = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| KeyError::Certificate(e.to_string()))?;
    RsaPublicKey::from_public_key_der(&spki).map_err(|e| KeyError::UnsupportedKey(e.to_string()))
}
