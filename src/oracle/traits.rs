//! 推理 Oracle 抽象
//!
//! 所有后端（OpenAI 兼容 / Mock）实现 OracleClient：complete 接收消息列表，返回原始文本，
//! 由 parser 进一步解析为 Decision。失败必须是类型化的 OracleError，而非裸异常。

use async_trait::async_trait;

use crate::core::OracleError;
use crate::memory::Message;

/// Oracle 客户端 trait：一次非流式完成
#[async_trait]
pub trait OracleClient: Send + Sync {
    /// 调用后端，返回原始文本
    async fn complete(&self, messages: &[Message]) -> Result<String, OracleError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
