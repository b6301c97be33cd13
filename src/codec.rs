//! 分段非对称编解码：宝付报文 `data_content` 的加密与解密

mod block;
pub mod errors;
pub mod keys;
pub mod segmented;

pub use self::errors::{CodecError, KeyError};
pub use self::keys::KeyMaterial;
pub use self::segmented::{BLOCK_PLAIN_LEN, DEFAULT_BLOCK_CIPHER_HEXLEN, SegmentedCodec, encoded_len};
