//! Mock Oracle（用于测试与无 API Key 的本地运行）

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::OracleError;
use crate::memory::{Message, Role};
use crate::oracle::OracleClient;

/// Mock 客户端：对任何输入直接给出最终答案（回显最后一条 user 消息）
#[derive(Debug, Default)]
pub struct MockOracle;

#[async_trait]
impl OracleClient for MockOracle {
    async fn complete(&self, messages: &[Message]) -> Result<String, OracleError> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::User))
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");
        Ok(format!(
            r#"{{"thought": "mock", "final_answer": "Echo from Mock: {}"}}"#,
            last_user.replace('"', "'")
        ))
    }
}

/// 脚本化 Oracle：按序弹出预置回复，脚本耗尽后返回传输错误
///
/// 测试里用它精确驱动状态机走任意分支（Continue / ToolCall / FinalAnswer / 失败）。
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    responses: Mutex<VecDeque<ScriptItem>>,
}

#[derive(Debug)]
enum ScriptItem {
    Ok(String),
    Err(OracleError),
}

impl ScriptedOracle {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|s| ScriptItem::Ok(s.into()))
                    .collect(),
            ),
        }
    }

    /// 追加一条成功回复
    pub fn push(&self, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(ScriptItem::Ok(response.into()));
    }

    /// 追加一条失败（模拟传输错误等）
    pub fn push_err(&self, err: OracleError) {
        self.responses
            .lock()
            .unwrap()
            .push_back(ScriptItem::Err(err));
    }
}

#[async_trait]
impl OracleClient for ScriptedOracle {
    async fn complete(&self, _messages: &[Message]) -> Result<String, OracleError> {
        match self.responses.lock().unwrap().pop_front() {
            Some(ScriptItem::Ok(s)) => Ok(s),
            Some(ScriptItem::Err(e)) => Err(e),
            None => Err(OracleError::Transport("script exhausted".to_string())),
        }
    }
}
