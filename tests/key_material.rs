//!
//! 证书加载测试
//!
//! `fixtures/` 中的证书由 OpenSSL 生成，同一把 1024 位 RSA 密钥：
//! - `merchant_sha1.pfx`：SHA-1 MAC + 3DES（宝付下发证书的格式），密码 123456
//! - `merchant_aes.pfx`：OpenSSL 3 默认导出（SHA-256 MAC + PBES2/AES）
//! - `merchant_pub.cer` / `merchant_pub.pem`：对应的自签名证书，DER 与 PEM 两种编码
//!

use baofoo_seal::codec::{KeyError, KeyMaterial, SegmentedCodec};
use baofoo_seal::config::{ConfigError, GatewayConfig};
use rsa::traits::PublicKeyParts;
use secrecy::SecretString;
use std::path::PathBuf;

const LEGACY_PFX: &[u8] = include_bytes!("fixtures/merchant_sha1.pfx");
const MODERN_PFX: &[u8] = include_bytes!("fixtures/merchant_aes.pfx");
const CERT_DER: &[u8] = include_bytes!("fixtures/merchant_pub.cer");
const CERT_PEM: &[u8] = include_bytes!("fixtures/merchant_pub.pem");

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn test_load_legacy_pfx_with_der_certificate() {
    let keys = KeyMaterial::from_pkcs12_and_certificate(LEGACY_PFX, "123456", CERT_DER).unwrap();

    assert_eq!(keys.signing_width(), 128);
    assert_eq!(keys.verification_width(), 128);
    assert_eq!(keys.signing_key().n(), keys.verification_key().n());

    // 私钥与证书属于同一密钥对，可以自环
    let codec = SegmentedCodec::new(keys);
    let ciphertext = codec.encode(b"hello").unwrap();
    assert_eq!(ciphertext.len(), 256);
    assert_eq!(codec.decode(&ciphertext).unwrap(), b"hello");
}

#[test]
fn test_pem_certificate_matches_der() {
    let from_der = KeyMaterial::from_pkcs12_and_certificate(LEGACY_PFX, "123456", CERT_DER).unwrap();
    let from_pem = KeyMaterial::from_pkcs12_and_certificate(LEGACY_PFX, "123456", CERT_PEM).unwrap();
    assert_eq!(from_der.verification_key(), from_pem.verification_key());
}

#[test]
fn test_wrong_password_is_rejected() {
    let result = KeyMaterial::from_pkcs12_and_certificate(LEGACY_PFX, "654321", CERT_DER);
    assert!(matches!(result, Err(KeyError::Pkcs12(_))));
}

#[test]
fn test_sha256_mac_container_is_rejected_without_panicking() {
    let result = KeyMaterial::from_pkcs12_and_certificate(MODERN_PFX, "123456", CERT_DER);
    match result {
        Err(KeyError::Pkcs12(message)) => assert!(message.contains("unsupported"), "{message}"),
        other => panic!("expected an unsupported-container error, got {other:?}"),
    }
}

#[test]
fn test_config_loads_key_files() {
    let config = GatewayConfig {
        private_key_path: fixture("merchant_sha1.pfx"),
        public_key_path: fixture("merchant_pub.pem"),
        private_key_password: SecretString::from("123456".to_string()),
        ..Default::default()
    };

    let keys = config.load_key_material().unwrap();
    assert_eq!(keys.verification_width() * 2, config.cipher_block_hexlen);
}

#[test]
fn test_config_reports_wrong_password() {
    let config = GatewayConfig {
        private_key_path: fixture("merchant_sha1.pfx"),
        public_key_path: fixture("merchant_pub.cer"),
        private_key_password: SecretString::from("wrong".to_string()),
        ..Default::default()
    };

    assert!(matches!(
        config.load_key_material(),
        Err(ConfigError::Key(KeyError::Pkcs12(_)))
    ));
}
