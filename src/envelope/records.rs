//! 代付接口循环域（`trans_reqData`）中的业务记录。
//!
//! 每种交易类型对应一个结构体，必填字段在类型上体现；
//! `TransRecord` 把它们统一成信封可以容纳的一种记录。

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// 代付 / 代付拆分交易记录（BF0040001 / BF0040004）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentPayRecord {
    /// 商户订单号
    pub trans_no: String,
    /// 转账金额，单位元
    pub trans_money: Decimal,
    /// 收款人姓名
    pub to_acc_name: String,
    /// 收款人银行帐号
    pub to_acc_no: String,
    /// 收款人银行名称
    pub to_bank_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_pro_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_city_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_acc_dept: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trans_card_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trans_mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trans_summary: Option<String>,
}

impl AgentPayRecord {
    pub fn new(
        trans_no: impl Into<String>,
        trans_money: Decimal,
        to_acc_name: impl Into<String>,
        to_acc_no: impl Into<String>,
        to_bank_name: impl Into<String>,
    ) -> Self {
        Self {
            trans_no: trans_no.into(),
            trans_money,
            to_acc_name: to_acc_name.into(),
            to_acc_no: to_acc_no.into(),
            to_bank_name: to_bank_name.into(),
            to_pro_name: None,
            to_city_name: None,
            to_acc_dept: None,
            trans_card_id: None,
            trans_mobile: None,
            trans_summary: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.trans_summary = Some(summary.into());
        self
    }
}

/// 代付交易状态查证记录（BF0040002）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusQueryRecord {
    /// 宝付批次号
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trans_batchid: Option<String>,
    /// 商户订单号
    pub trans_no: String,
}

impl StatusQueryRecord {
    pub fn new(trans_no: impl Into<String>) -> Self {
        Self {
            trans_batchid: None,
            trans_no: trans_no.into(),
        }
    }
}

/// 代付交易退款查证记录（BF0040003），查询区间最多一天
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefundQueryRecord {
    #[serde(serialize_with = "serialize_day")]
    pub trans_btime: NaiveDate,
    #[serde(serialize_with = "serialize_day")]
    pub trans_etime: NaiveDate,
}

impl RefundQueryRecord {
    /// 查询某一天内的退款订单
    pub fn for_day(day: NaiveDate) -> Self {
        Self {
            trans_btime: day,
            trans_etime: day,
        }
    }
}

fn serialize_day<S: Serializer>(day: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&day.format("%Y%m%d"))
}

/// 信封中的一条记录
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TransRecord {
    AgentPay(AgentPayRecord),
    StatusQuery(StatusQueryRecord),
    RefundQuery(RefundQueryRecord),
}

impl TransRecord {
    /// 参与 `trans_totalMoney` 汇总的金额；查询类记录为零
    pub fn amount(&self) -> Decimal {
        match self {
            TransRecord::AgentPay(r) => r.trans_money,
            TransRecord::StatusQuery(_) | TransRecord::RefundQuery(_) => Decimal::ZERO,
        }
    }

    /// 返回第一个为空的必填字段名
    pub fn missing_field(&self) -> Option<&'static str> {
        match self {
            TransRecord::AgentPay(r) => [
                ("trans_no", &r.trans_no),
                ("to_acc_name", &r.to_acc_name),
                ("to_acc_no", &r.to_acc_no),
                ("to_bank_name", &r.to_bank_name),
            ]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name),
            TransRecord::StatusQuery(r) if r.trans_no.trim().is_empty() => Some("trans_no"),
            TransRecord::StatusQuery(_) => None,
            TransRecord::RefundQuery(r) if r.trans_etime < r.trans_btime => Some("trans_etime"),
            TransRecord::RefundQuery(_) => None,
        }
    }
}

impl From<AgentPayRecord> for TransRecord {
    fn from(record: AgentPayRecord) -> Self {
        TransRecord::AgentPay(record)
    }
}

impl From<StatusQueryRecord> for TransRecord {
    fn from(record: StatusQueryRecord) -> Self {
        TransRecord::StatusQuery(record)
    }
}

impl From<RefundQueryRecord> for TransRecord {
    fn from(record: RefundQueryRecord) -> Self {
        TransRecord::RefundQuery(record)
    }
}
