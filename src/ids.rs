//! 商户流水号与订单号生成。
//!
//! 格式属于协议约定，宝付按长度和字符集校验：
//! - 流水号 `TSN` + `yyMMddHHmmss` + 5 位补零随机数（1..=99999），共 20 位
//! - 订单号 `TI` + `yyMMddHHmmss` + 6 位补零随机数（1..=999999），共 20 位
//!
//! 只有秒级时间戳加随机后缀，同一进程内不做碰撞检查。
//! 需要严格唯一时由调用方自行分配（例如单调计数器或外部发号器）。

use chrono::{DateTime, FixedOffset, Offset, Utc};
use rand::Rng;

pub const SERIAL_NO_PREFIX: &str = "TSN";
pub const TRANS_ID_PREFIX: &str = "TI";

const TIMESTAMP_FORMAT: &str = "%y%m%d%H%M%S";
const BEIJING_OFFSET_SECS: i32 = 8 * 3600;

/// 宝付所在时区（UTC+8）
pub fn gateway_offset() -> FixedOffset {
    FixedOffset::east_opt(BEIJING_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// 宝付时区下的当前时间
pub fn gateway_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&gateway_offset())
}

/// 生成商户流水号
pub fn generate_serial_no() -> String {
    serial_no_at(&gateway_now(), &mut rand::thread_rng())
}

/// 生成商户订单号
pub fn generate_trans_id() -> String {
    trans_id_at(&gateway_now(), &mut rand::thread_rng())
}

pub fn serial_no_at<R: Rng + ?Sized>(at: &DateTime<FixedOffset>, rng: &mut R) -> String {
    format!(
        "{SERIAL_NO_PREFIX}{}{:05}",
        at.format(TIMESTAMP_FORMAT),
        rng.gen_range(1..=99_999u32)
    )
}

pub fn trans_id_at<R: Rng + ?Sized>(at: &DateTime<FixedOffset>, rng: &mut R) -> String {
    format!(
        "{TRANS_ID_PREFIX}{}{:06}",
        at.format(TIMESTAMP_FORMAT),
        rng.gen_range(1..=999_999u32)
    )
}
