//! 宝付响应码分类。
//!
//! 每个响应码归入三类之一：成功、需要查询（结果未定）、失败。
//! 分类不是错误路径，终态失败同样以普通的 `ResponseOutcome` 返回。

use serde::Serialize;
use serde_json::Value;

/// 交易成功
pub const SUCCESS_CODE: &str = "0000";

/// 响应码的三种归类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeClass {
    Success,
    NeedsQuery,
    Failure,
}

use OutcomeClass::{Failure, NeedsQuery, Success};

/// 响应码对照表。
///
/// `BF00114`（订单已支付成功）是重复提交已成功订单时的返回，按成功处理；
/// 系统繁忙、结果未知、处理中、风控审核、超时、已受理一类返回码需要调用查询接口确认。
static CODE_TABLE: &[(&str, OutcomeClass, &str)] = &[
    ("0000", Success, "交易成功"),
    ("BF00100", NeedsQuery, "系统异常, 请联系宝付"),
    ("BF00101", Failure, "持卡人信息有误"),
    ("BF00102", Failure, "银行卡已过有效期, 请联系发卡行"),
    ("BF00103", Failure, "账户余额不足"),
    ("BF00104", Failure, "交易金额超限"),
    ("BF00105", Failure, "短信验证码错误"),
    ("BF00106", Failure, "短信验证码失效"),
    ("BF00107", Failure, "当前银行卡不支持该业务, 请联系发卡行"),
    ("BF00108", Failure, "交易失败, 请联系发卡行"),
    ("BF00109", Failure, "交易金额低于限额"),
    ("BF00110", Failure, "该卡暂不支持此交易"),
    ("BF00111", Failure, "交易失败"),
    ("BF00112", NeedsQuery, "系统繁忙, 请稍后再试"),
    ("BF00113", NeedsQuery, "交易结果未知, 请稍后查询"),
    ("BF00114", Success, "订单已支付成功, 请勿重复支付"),
    ("BF00115", NeedsQuery, "交易处理中, 请稍后查询"),
    ("BF00116", Failure, "该终端号不存在"),
    ("BF00117", Failure, "交易金额超限, 请联系宝付"),
    ("BF00118", Failure, "报文中密文解析失败"),
    ("BF00119", Failure, "短信验证超时, 请稍后再试"),
    ("BF00120", Failure, "报文交易要素缺失"),
    ("BF00121", Failure, "报文交易要素格式错误"),
    ("BF00122", Failure, "卡号和支付通道不匹配"),
    ("BF00123", Failure, "商户不存在或状态不正常, 请联系宝付"),
    ("BF00124", Failure, "商户与终端号不匹配"),
    ("BF00125", Failure, "商户该终端下未开通此类型交易"),
    ("BF00126", Failure, "该笔订单已存在"),
    ("BF00127", Failure, "不支持该支付通道的交易"),
    ("BF00128", Failure, "该笔订单不存在"),
    ("BF00129", Failure, "密文和明文中参数不一致, 请确认是否被篡改!"),
    ("BF00130", Failure, "请确认是否发送短信, 当前交易必须通过短信验证!"),
    ("BF00131", Failure, "当前交易信息与短信交易信息不一致, 请核对信息"),
    ("BF00132", Failure, "短信验证超时, 请稍后再试"),
    ("BF00133", Failure, "短信验证失败"),
    ("BF00134", Failure, "绑定关系不存在"),
    ("BF00135", Failure, "交易金额不正确"),
    ("BF00136", Failure, "订单创建失败"),
    ("BF00137", Failure, "个人会员不能为空"),
    ("BF00138", Failure, "个人会员不存在"),
    ("BF00140", Failure, "该卡已被注销"),
    ("BF00141", Failure, "该卡已挂失"),
    ("BF00142", Failure, "暂不支持该银行卡的绑卡"),
    ("BF00143", Failure, "绑卡失败"),
    ("BF00144", NeedsQuery, "该交易有风险, 订单处理中"),
    ("BF00146", Failure, "订单金额超过单笔限额"),
    ("BF00147", Failure, "该银行卡不支持此交易"),
    ("BF00177", Failure, "非法的交易"),
    ("BF00180", Failure, "获取短信验证码失败"),
    ("BF00182", Failure, "您输入的银行卡号有误, 请重新输入"),
    ("BF00186", Failure, "该卡已绑定"),
    ("BF00187", Failure, "暂不支持信用卡的绑定"),
    ("BF00188", Failure, "绑卡失败"),
    ("BF00189", Failure, "交易金额超过限额"),
    ("BF00190", Failure, "商户流水号不能重复"),
    ("BF00191", Failure, "绑定id和用户id不匹配"),
    ("BF00192", Failure, "标的开始日期格式不正确"),
    ("BF00193", Failure, "标的结束日期格式不正确"),
    ("BF00194", Failure, "标的到期还款日期格式不正确"),
    ("BF00195", Failure, "交易金额不正确"),
    ("BF00196", Failure, "标的金额不正确"),
    ("BF00197", Failure, "还款总金额不正确"),
    ("BF00198", Failure, "年化率格式不正确"),
    ("BF00199", Failure, "订单日期格式不正确"),
    ("BF00200", Failure, "发送短信和支付时商户订单号不一致"),
    ("BF00201", Failure, "发送短信和支付交易时金额不相等"),
    ("BF00202", NeedsQuery, "交易超时, 请稍后查询"),
    ("BF00203", NeedsQuery, "退款交易已受理"),
    ("BF00204", Failure, "确认绑卡时与预绑卡时的商户订单号不一致"),
    ("BF00232", Failure, "银行卡未开通认证支付"),
    ("BF00233", Failure, "密码输入次数超限, 请联系发卡行"),
    ("BF00234", Failure, "单日交易金额超限"),
    ("BF00235", Failure, "单笔交易金额超限"),
    ("BF00236", Failure, "卡号无效, 请确认后输入"),
    ("BF00237", Failure, "该卡已冻结, 请联系发卡行"),
    ("BF00238", NeedsQuery, "交易结果未知, 请稍后查询"),
    ("BF00309", Failure, "绑卡和发送短信时手机号不一致"),
    ("BF00311", Failure, "卡类型和 biz_type 值不匹配"),
    ("BF00312", Failure, "卡号校验失败"),
    ("BF00313", Failure, "商户请求IP不合法"),
    ("BF00315", Failure, "手机号码为空, 请重新输入"),
];

fn lookup(code: &str) -> Option<(OutcomeClass, &'static str)> {
    CODE_TABLE
        .iter()
        .find(|(known, _, _)| *known == code)
        .map(|&(_, class, message)| (class, message))
}

/// 一次响应的分类结果，`ok` 为真时 `needs_query` 必为假
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseOutcome {
    pub ok: bool,
    pub needs_query: bool,
    pub message: String,
    pub code: String,
}

impl ResponseOutcome {
    /// 按响应码分类。未收录的响应码原样透传宝付返回的消息。
    pub fn classify(code: &str, raw_message: &str) -> Self {
        let (class, message) = match lookup(code) {
            Some((class, message)) => (class, message.to_string()),
            None => (Failure, raw_message.to_string()),
        };
        Self {
            ok: class == Success,
            needs_query: class == NeedsQuery,
            message,
            code: code.to_string(),
        }
    }

    pub fn class(&self) -> OutcomeClass {
        match (self.ok, self.needs_query) {
            (true, _) => Success,
            (false, true) => NeedsQuery,
            (false, false) => Failure,
        }
    }
}

/// 响应码是否属于成功类
pub fn is_success_code(code: &str) -> bool {
    matches!(lookup(code), Some((Success, _)))
}

/// 从解密后的响应中取出响应码与消息。
///
/// 认证支付接口使用顶层的 `resp_code` / `resp_msg`，
/// 代付接口使用 `trans_content.trans_head.return_code` / `return_msg`。
pub fn response_code(response: &Value) -> Option<(String, String)> {
    let (code, message) = match response.get("resp_code") {
        Some(code) => (code, response.get("resp_msg")),
        None => {
            let head = response.pointer("/trans_content/trans_head")?;
            (head.get("return_code")?, head.get("return_msg"))
        }
    };
    Some((scalar_to_string(code)?, message.and_then(scalar_to_string).unwrap_or_default()))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 快速判断响应是否成功，与 `ResponseOutcome::classify` 的成功类完全一致
pub fn is_success(response: &Value) -> bool {
    response_code(response).is_some_and(|(code, _)| is_success_code(&code))
}

/// 将银行卡 BIN 查询得到的发卡行编码转换为宝付的 `pay_code`
pub fn normalize_pay_code(bank_code: &str) -> &str {
    match bank_code {
        "COMM" => "BCOM",
        "SPABANK" => "PAB",
        "SHBANK" => "SHB",
        "HXBANK" => "HXB",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_success_code() {
        let outcome = ResponseOutcome::classify("0000", "whatever");
        assert!(outcome.ok);
        assert!(!outcome.needs_query);
        assert_eq!(outcome.message, "交易成功");
        assert_eq!(outcome.class(), OutcomeClass::Success);
    }

    #[test]
    fn test_duplicate_success_is_success() {
        let outcome = ResponseOutcome::classify("BF00114", "订单已支付成功");
        assert!(outcome.ok);
        assert!(!outcome.needs_query);
    }

    #[test]
    fn test_processing_needs_query() {
        let outcome = ResponseOutcome::classify("BF00115", "ignored");
        assert!(!outcome.ok);
        assert!(outcome.needs_query);
        assert_eq!(outcome.message, "交易处理中, 请稍后查询");
        for code in ["BF00100", "BF00112", "BF00113", "BF00144", "BF00202", "BF00238"] {
            assert_eq!(ResponseOutcome::classify(code, "").class(), OutcomeClass::NeedsQuery, "{code}");
        }
    }

    #[test]
    fn test_known_failure_uses_canonical_message() {
        let outcome = ResponseOutcome::classify("BF00103", "raw text");
        assert_eq!(outcome.class(), OutcomeClass::Failure);
        assert_eq!(outcome.message, "账户余额不足");
    }

    #[test]
    fn test_unknown_code_passes_raw_message_through() {
        let outcome = ResponseOutcome::classify("BF99999", "custom text");
        assert_eq!(
            outcome,
            ResponseOutcome {
                ok: false,
                needs_query: false,
                message: "custom text".into(),
                code: "BF99999".into(),
            }
        );
    }

    #[test]
    fn test_table_has_no_duplicate_codes() {
        let codes: HashSet<_> = CODE_TABLE.iter().map(|(code, _, _)| *code).collect();
        assert_eq!(codes.len(), CODE_TABLE.len());
    }

    #[test]
    fn test_is_success_agrees_with_classifier() {
        for (code, _, _) in CODE_TABLE {
            let response = json!({"resp_code": code, "resp_msg": ""});
            assert_eq!(is_success(&response), ResponseOutcome::classify(code, "").ok, "{code}");
        }
        assert!(!is_success(&json!({"resp_code": "BF99999"})));
        assert!(!is_success(&json!({})));
    }

    #[test]
    fn test_response_code_from_agent_pay_head() {
        let response = json!({
            "trans_content": {"trans_head": {"return_code": "0000", "return_msg": "代付请求交易成功"}}
        });
        assert_eq!(
            response_code(&response),
            Some(("0000".to_string(), "代付请求交易成功".to_string()))
        );
        assert!(is_success(&response));
    }

    #[test]
    fn test_numeric_code_is_accepted() {
        let response = json!({"resp_code": 0, "resp_msg": "x"});
        assert_eq!(response_code(&response), Some(("0".to_string(), "x".to_string())));
    }

    #[test]
    fn test_normalize_pay_code() {
        assert_eq!(normalize_pay_code("COMM"), "BCOM");
        assert_eq!(normalize_pay_code("SPABANK"), "PAB");
        assert_eq!(normalize_pay_code("SHBANK"), "SHB");
        assert_eq!(normalize_pay_code("HXBANK"), "HXB");
        assert_eq!(normalize_pay_code("ICBC"), "ICBC");
    }
}
