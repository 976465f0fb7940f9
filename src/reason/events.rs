//! 会话过程事件：用于前端/日志展示思考、工具调用、观察与预算变化

use serde::Serialize;

/// 单步过程事件（可序列化为 JSON 供外部展示）
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// 迭代计数更新
    StepUpdate { current: u32, max: u32 },
    /// 正在调用 Oracle 思考
    Thinking,
    /// Oracle 的思考内容（预览）
    ThinkingContent { text: String },
    /// 调用工具
    ToolCall {
        tool: String,
        args: serde_json::Value,
    },
    /// 工具返回（预览，避免过长）
    Observation { tool: String, preview: String },
    /// 工具执行失败（作为观察记入链）
    ToolFailure { tool: String, reason: String },
    /// Oracle 调用失败（以保守 Continue 恢复）
    OracleFailure { reason: String, consecutive: u32 },
    /// 预算被扩展（智能/灵活模式）
    BudgetExtended { new_max: u32 },
    /// 会话结束
    Done { reason: String },
}
