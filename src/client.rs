//! `GatewayClient` 串联整个请求/响应流程：
//!
//! 组装信封 → 分段加密 → 传输 → 识别明文响应或分段解密 → 响应码分类。

use crate::codec::{KeyMaterial, SegmentedCodec};
use crate::config::{Endpoint, GatewayConfig};
use crate::envelope::{
    AgentPayRecord, EnvelopeBuilder, RefundQueryRecord, StatusQueryRecord, TRANS_CONTENT_MARKER,
    TransRecord,
};
use crate::error::{RequestError, Result};
use crate::ids::{gateway_now, generate_serial_no};
use crate::outcome::{ResponseOutcome, response_code};
use crate::transport::{FormFields, Transport};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{error, info, warn};

const TRADE_DATE_FORMAT: &str = "%Y%m%d%H%M%S";

/// 认证支付接口的交易子类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnSubType {
    /// 直接绑卡
    BindCard,
    /// 解除绑定关系
    UnbindCard,
    /// 查询绑定关系
    QueryBindCard,
    /// 预绑卡
    PreBindCard,
    /// 确认绑卡
    ConfirmBindCard,
    /// 预支付（发送短信）
    PrePay,
    /// 支付确认
    ConfirmPay,
    /// 交易状态查询
    QueryOrder,
}

impl TxnSubType {
    pub fn code(self) -> &'static str {
        match self {
            TxnSubType::BindCard => "01",
            TxnSubType::UnbindCard => "02",
            TxnSubType::QueryBindCard => "03",
            TxnSubType::PreBindCard => "11",
            TxnSubType::ConfirmBindCard => "12",
            TxnSubType::PrePay => "15",
            TxnSubType::ConfirmPay => "16",
            TxnSubType::QueryOrder => "31",
        }
    }

    /// 交易状态查询不携带 `trade_date`
    fn carries_trade_date(self) -> bool {
        self != TxnSubType::QueryOrder
    }
}

/// 认证支付类请求。
///
/// 业务字段放在 `fields` 中原样透传；公共字段由客户端根据配置补齐。
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub txn_sub_type: TxnSubType,
    /// 为空时自动生成
    pub trans_serial_no: Option<String>,
    /// 为空时取当前北京时间
    pub trade_date: Option<NaiveDateTime>,
    pub fields: Map<String, Value>,
}

impl TransactionRequest {
    pub fn new(txn_sub_type: TxnSubType) -> Self {
        Self {
            txn_sub_type,
            trans_serial_no: None,
            trade_date: None,
            fields: Map::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// 一次网关调用的结果：分类结论加上解密后的完整响应
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayReply {
    pub outcome: ResponseOutcome,
    pub body: Value,
}

/// 宝付网关客户端。
///
/// 编解码器（含密钥材料）只读且放在 `Arc` 中，可被并发请求共享；
/// 每个请求使用自己的 `EnvelopeBuilder`。
pub struct GatewayClient<T> {
    config: GatewayConfig,
    codec: Arc<SegmentedCodec>,
    transport: T,
}

impl<T: Transport> GatewayClient<T> {
    pub fn new(config: GatewayConfig, keys: KeyMaterial, transport: T) -> Result<Self> {
        config.validate()?;
        let codec = SegmentedCodec::with_cipher_block_hexlen(keys, config.cipher_block_hexlen)?;
        Ok(Self {
            config,
            codec: Arc::new(codec),
            transport,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn codec(&self) -> Arc<SegmentedCodec> {
        Arc::clone(&self.codec)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 代付交易（BF0040001）
    pub async fn agent_pay(&self, records: Vec<AgentPayRecord>) -> Result<GatewayReply> {
        self.submit_batch(Endpoint::AgentPay, into_records(records), false)
            .await
    }

    /// 代付交易状态查证（BF0040002）
    pub async fn agent_pay_status_query(
        &self,
        records: Vec<StatusQueryRecord>,
    ) -> Result<GatewayReply> {
        self.submit_batch(Endpoint::AgentPayStatusQuery, into_records(records), false)
            .await
    }

    /// 代付交易退款查证（BF0040003），一次只查一天
    pub async fn agent_pay_refund_query(&self, record: RefundQueryRecord) -> Result<GatewayReply> {
        self.submit_batch(Endpoint::AgentPayRefundQuery, vec![record.into()], false)
            .await
    }

    /// 代付交易拆分（BF0040004），`trans_head` 由记录重新计算
    pub async fn agent_pay_split(&self, records: Vec<AgentPayRecord>) -> Result<GatewayReply> {
        self.submit_batch(Endpoint::AgentPaySplit, into_records(records), true)
            .await
    }

    async fn submit_batch(
        &self,
        endpoint: Endpoint,
        records: Vec<TransRecord>,
        include_head: bool,
    ) -> Result<GatewayReply> {
        check_batch(endpoint, &records)?;

        let mut builder = EnvelopeBuilder::new();
        for record in records {
            builder.add_record(record);
        }
        let envelope = builder.build(include_head)?;
        let plaintext = envelope.to_json()?;

        let fields: FormFields = vec![
            ("version", self.config.version.clone()),
            ("terminal_id", self.config.terminal_id.clone()),
            ("member_id", self.config.member_id.clone()),
            ("data_type", self.config.data_type.clone()),
            ("data_content", self.codec.encode(plaintext.as_bytes())?),
        ];

        info!(
            endpoint = %endpoint,
            records = envelope.records().len(),
            "sending agent-pay request"
        );
        let url = self.config.endpoint_url(endpoint);
        self.exchange(&url, &fields).await
    }

    /// 认证支付类交易（绑卡、支付、查询等），报文为扁平字段
    pub async fn back_transaction(&self, request: TransactionRequest) -> Result<GatewayReply> {
        let sub_type = request.txn_sub_type;
        let data = self.transaction_payload(request)?;
        let plaintext = serde_json::to_string(&data)?;

        let fields: FormFields = vec![
            ("version", self.config.version.clone()),
            ("terminal_id", self.config.terminal_id.clone()),
            ("txn_type", self.config.txn_type.clone()),
            ("txn_sub_type", sub_type.code().to_string()),
            ("member_id", self.config.member_id.clone()),
            ("data_type", self.config.data_type.clone()),
            ("data_content", self.codec.encode(plaintext.as_bytes())?),
        ];

        info!(txn_sub_type = sub_type.code(), "sending back-transaction request");
        let url = self.config.back_trans_url().to_string();
        self.exchange(&url, &fields).await
    }

    fn transaction_payload(
        &self,
        request: TransactionRequest,
    ) -> Result<Map<String, Value>, RequestError> {
        let TransactionRequest {
            txn_sub_type,
            trans_serial_no,
            trade_date,
            fields,
        } = request;

        let mut data = Map::new();
        data.insert("terminal_id".into(), self.config.terminal_id.clone().into());
        data.insert("member_id".into(), self.config.member_id.clone().into());
        data.insert("additional_info".into(), "".into());
        data.insert("req_reserved".into(), "".into());
        data.extend(fields);

        // 以下字段不允许被业务字段覆盖
        data.insert("biz_type".into(), self.config.biz_type.clone().into());
        data.insert("txn_sub_type".into(), txn_sub_type.code().into());

        // 流水号与订单日期：显式参数优先，其次是业务字段中的非空值，都没有时才自动生成
        let field_trade_date = non_empty_field(&data, "trade_date");
        if txn_sub_type.carries_trade_date() {
            let trade_date = match (trade_date, field_trade_date) {
                (Some(at), _) => at,
                (None, Some(text)) => parse_trade_date(&text)?,
                (None, None) => gateway_now().naive_local(),
            };
            data.insert(
                "trade_date".into(),
                trade_date.format(TRADE_DATE_FORMAT).to_string().into(),
            );
        } else {
            data.remove("trade_date");
        }

        let serial = trans_serial_no
            .filter(|serial| !serial.is_empty())
            .or_else(|| non_empty_field(&data, "trans_serial_no"))
            .unwrap_or_else(generate_serial_no);
        data.insert("trans_serial_no".into(), serial.into());
        Ok(data)
    }

    async fn exchange(&self, url: &str, fields: &FormFields) -> Result<GatewayReply> {
        let raw = self.transport.post_form(url, fields).await.map_err(|e| {
            error!(url, error = %e, "gateway request failed");
            e
        })?;

        let body: Value = if is_plaintext_reply(&raw) {
            // 特殊异常时宝付直接返回明文
            warn!(url, "gateway answered in plaintext");
            serde_json::from_str(&raw)?
        } else {
            let decoded = self.codec.decode(&raw).map_err(|e| {
                error!(url, error = %e, "failed to decode gateway response");
                e
            })?;
            serde_json::from_slice(&decoded)?
        };

        let outcome = match response_code(&body) {
            Some((code, message)) => ResponseOutcome::classify(&code, &message),
            None => ResponseOutcome::classify("", "response carries no code"),
        };
        info!(
            code = %outcome.code,
            ok = outcome.ok,
            needs_query = outcome.needs_query,
            "gateway response classified"
        );
        Ok(GatewayReply { outcome, body })
    }

    /// 解码宝付回调通知中的 `data_content`
    pub fn decode_callback(&self, data_content: &str) -> Result<Value> {
        let decoded = self.codec.decode(data_content)?;
        Ok(serde_json::from_str(&String::from_utf8(decoded)?)?)
    }
}

/// 回调应答报文（明文）
pub fn callback_ack(code: &str, message: &str) -> String {
    json!({
        "trans_content": {
            "trans_head": {
                "return_code": code,
                "return_msg": message,
            }
        }
    })
    .to_string()
}

/// 响应中带有 `trans_content` 字段说明是未加密的明文
pub fn is_plaintext_reply(raw: &str) -> bool {
    raw.contains(TRANS_CONTENT_MARKER)
}

fn non_empty_field(data: &Map<String, Value>, name: &str) -> Option<String> {
    match data.get(name)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// 解析调用方给出的订单日期，接受紧凑格式与常见的分隔格式
fn parse_trade_date(text: &str) -> Result<NaiveDateTime, RequestError> {
    const DATE_TIME_FORMATS: &[&str] = &[
        TRADE_DATE_FORMAT,
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];
    const DATE_FORMATS: &[&str] = &["%Y%m%d", "%Y-%m-%d", "%Y/%m/%d"];

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|day| day.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| RequestError::InvalidTradeDate(text.to_string()))
}

fn into_records<R: Into<TransRecord>>(records: Vec<R>) -> Vec<TransRecord> {
    records.into_iter().map(Into::into).collect()
}

fn check_batch(endpoint: Endpoint, records: &[TransRecord]) -> Result<(), RequestError> {
    if let Some(max) = endpoint.max_records() {
        if records.len() > max {
            return Err(RequestError::BatchTooLarge {
                endpoint: endpoint.code(),
                max,
                actual: records.len(),
            });
        }
    }
    records
        .iter()
        .enumerate()
        .find_map(|(index, record)| {
            record
                .missing_field()
                .map(|field| RequestError::MissingField { index, field })
        })
        .map_or(Ok(()), Err)
}
