//! 代付请求信封的组装。
//!
//! 宝付代付接口的明文报文形如：
//!
//! ```json
//! {"trans_content":{"trans_reqDatas":{"trans_reqData":[...]},"trans_head":{...}}}
//! ```
//!
//! `trans_head` 只在批量拆分类接口中出现，其中的笔数与总金额由记录重新计算。

pub mod records;

pub use self::records::{AgentPayRecord, RefundQueryRecord, StatusQueryRecord, TransRecord};

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// 明文响应与信封共有的顶层字段，出现在响应中说明报文未加密
pub const TRANS_CONTENT_MARKER: &str = "trans_content";

#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("envelope has no records")]
    Empty,
    #[error("trans_totalMoney overflows at record {index}")]
    AmountOverflow { index: usize },
    #[error("failed to serialize envelope: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 批量汇总信息。
///
/// 总金额在报文中是 JSON 数字而不是字符串，与记录里的 `trans_money` 不同。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransHead {
    pub trans_count: usize,
    #[serde(rename = "trans_totalMoney", with = "rust_decimal::serde::float")]
    pub trans_total_money: Decimal,
}

impl TransHead {
    fn summarize(records: &[TransRecord]) -> Result<Self, EnvelopeError> {
        let trans_total_money = records
            .iter()
            .enumerate()
            .try_fold(Decimal::ZERO, |total, (index, record)| {
                total
                    .checked_add(record.amount())
                    .ok_or(EnvelopeError::AmountOverflow { index })
            })?;
        Ok(Self {
            trans_count: records.len(),
            trans_total_money,
        })
    }
}

/// 组装完成、可以序列化的信封
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    trans_content: TransContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct TransContent {
    #[serde(rename = "trans_reqDatas")]
    req_datas: ReqDatas,
    #[serde(skip_serializing_if = "Option::is_none")]
    trans_head: Option<TransHead>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ReqDatas {
    #[serde(rename = "trans_reqData")]
    req_data: Vec<TransRecord>,
}

impl Envelope {
    pub fn head(&self) -> Option<&TransHead> {
        self.trans_content.trans_head.as_ref()
    }

    pub fn records(&self) -> &[TransRecord] {
        &self.trans_content.req_datas.req_data
    }

    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// 信封构建器。
///
/// 只负责收集记录和计算汇总，不做字段校验，也不限制笔数；
/// 各接口的笔数上限由调用方在 `build` 之前检查。
#[derive(Debug, Default)]
pub struct EnvelopeBuilder {
    records: Vec<TransRecord>,
    head: Option<TransHead>,
}

impl EnvelopeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&mut self, record: impl Into<TransRecord>) -> &mut Self {
        self.records.push(record.into());
        self
    }

    /// 调用方提供的汇总信息；`build(true)` 时总会被重新计算的值覆盖
    pub fn with_head(&mut self, head: TransHead) -> &mut Self {
        self.head = Some(head);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn build(&self, include_head: bool) -> Result<Envelope, EnvelopeError> {
        if self.records.is_empty() {
            return Err(EnvelopeError::Empty);
        }

        let trans_head = include_head
            .then(|| TransHead::summarize(&self.records))
            .transpose()?;
        if let (Some(head), Some(supplied)) = (&trans_head, &self.head) {
            if supplied != head {
                tracing::debug!(
                    supplied_count = supplied.trans_count,
                    supplied_total = %supplied.trans_total_money,
                    "overriding caller-supplied trans_head"
                );
            }
        }

        Ok(Envelope {
            trans_content: TransContent {
                req_datas: ReqDatas {
                    req_data: self.records.clone(),
                },
                trans_head,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn pay(trans_no: &str, money: Decimal) -> AgentPayRecord {
        AgentPayRecord::new(trans_no, money, "王五", "6217000000000000", "中国银行")
    }

    #[test]
    fn test_build_recomputes_head() {
        let mut builder = EnvelopeBuilder::new();
        builder
            .with_head(TransHead {
                trans_count: 0,
                trans_total_money: dec!(0),
            })
            .add_record(pay("TI1", dec!(100)))
            .add_record(pay("TI2", dec!(250)))
            .add_record(pay("TI3", dec!(50)));

        let envelope = builder.build(true).unwrap();
        let head = envelope.head().unwrap();
        assert_eq!(head.trans_count, 3);
        assert_eq!(head.trans_total_money, dec!(400));
    }

    #[test]
    fn test_wrong_caller_head_is_overwritten() {
        let mut builder = EnvelopeBuilder::new();
        builder.add_record(pay("TI1", dec!(0.01)));
        builder.with_head(TransHead {
            trans_count: 9,
            trans_total_money: dec!(999),
        });

        let head = builder.build(true).unwrap().head().cloned().unwrap();
        assert_eq!(head.trans_count, 1);
        assert_eq!(head.trans_total_money, dec!(0.01));
    }

    #[test]
    fn test_build_without_head_omits_it() {
        let mut builder = EnvelopeBuilder::new();
        builder.add_record(StatusQueryRecord::new("TI1"));
        builder.with_head(TransHead {
            trans_count: 1,
            trans_total_money: dec!(0),
        });

        let envelope = builder.build(false).unwrap();
        assert!(envelope.head().is_none());
        let value: serde_json::Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"trans_content": {"trans_reqDatas": {"trans_reqData": [{"trans_no": "TI1"}]}}})
        );
    }

    #[test]
    fn test_empty_build_fails() {
        assert!(matches!(EnvelopeBuilder::new().build(true), Err(EnvelopeError::Empty)));
        assert!(matches!(EnvelopeBuilder::new().build(false), Err(EnvelopeError::Empty)));
    }

    #[test]
    fn test_head_serializes_with_gateway_field_names() {
        let mut builder = EnvelopeBuilder::new();
        builder.add_record(pay("TI1", dec!(1.5)));
        let value = serde_json::to_value(builder.build(true).unwrap()).unwrap();

        assert_eq!(
            value["trans_content"]["trans_head"],
            json!({"trans_count": 1, "trans_totalMoney": 1.5})
        );
        assert_eq!(value["trans_content"]["trans_reqDatas"]["trans_reqData"][0]["trans_no"], "TI1");
    }

    #[test]
    fn test_total_money_is_a_json_number() {
        let mut builder = EnvelopeBuilder::new();
        builder
            .add_record(pay("TI1", dec!(0.01)))
            .add_record(pay("TI2", dec!(0.02)));
        let json = builder.build(true).unwrap().to_json().unwrap();

        assert!(json.contains(r#""trans_head":{"trans_count":2,"trans_totalMoney":0.03}"#), "{json}");
        assert!(json.contains(r#""trans_money":"0.01""#), "{json}");
    }

    #[test]
    fn test_total_overflow_is_an_error() {
        let mut builder = EnvelopeBuilder::new();
        builder
            .add_record(pay("TI1", Decimal::MAX))
            .add_record(pay("TI2", Decimal::MAX));

        assert!(matches!(
            builder.build(true),
            Err(EnvelopeError::AmountOverflow { index: 1 })
        ));
        // 不需要汇总时不计算总金额
        assert!(builder.build(false).is_ok());
    }

    #[test]
    fn test_builder_does_not_enforce_batch_ceiling() {
        let mut builder = EnvelopeBuilder::new();
        for i in 0..8 {
            builder.add_record(pay(&format!("TI{i}"), dec!(1)));
        }
        assert_eq!(builder.len(), 8);
        assert_eq!(builder.build(true).unwrap().records().len(), 8);
    }
}
