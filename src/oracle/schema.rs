//! 决策输出 JSON Schema 生成（schemars 自动生成，拼入 system prompt 减少格式错误）

use schemars::{schema_for, JsonSchema};
use std::collections::HashMap;

/// 决策输出格式：与解析器接受的 JSON 一致（仅用于 Schema 生成）
#[allow(dead_code)]
#[derive(JsonSchema)]
struct DecisionFormat {
    /// 本轮思考
    pub thought: String,
    /// 要调用的工具名；不调工具时省略
    pub tool: Option<String>,
    /// 工具参数，依工具的参数 schema 而定
    pub args: Option<HashMap<String, serde_json::Value>>,
    /// 最终答案；问题尚未解决时省略
    pub final_answer: Option<String>,
}

/// 返回决策输出的 JSON Schema 字符串，可拼入 system prompt
pub fn decision_schema_json() -> String {
    let schema = schema_for!(DecisionFormat);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| String::new())
}
