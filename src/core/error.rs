//! 引擎错误类型
//!
//! OracleError 区分「传输失败」与「输出不可解析」两类；AgentError 覆盖工具与配置。
//! 单次 Oracle/工具失败均可在循环内恢复，只有 ConfigError 在会话入口快速失败。

use thiserror::Error;

/// 推理 Oracle 调用错误：传输层失败或输出无法解析为决策
#[derive(Error, Debug, Clone)]
pub enum OracleError {
    /// 网络/超时/后端错误
    #[error("Oracle transport error: {0}")]
    Transport(String),

    /// 返回内容无法解析为合法决策（如 JSON 格式错误）
    #[error("Unparseable oracle output: {0}")]
    Unparseable(String),
}

/// 会话运行过程中可能出现的错误
#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// 配置非法（如安全上限小于策略最小预算、空工具注册表）；在任何 Oracle 调用前返回
    #[error("Config error: {0}")]
    ConfigError(String),
}
