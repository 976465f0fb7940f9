//! 会话记忆：消息类型与按会话隔离的键值 Arena
//!
//! SessionArena 由调用方持有并以 &mut 传入会话，替代进程级全局字典，
//! 保证多会话并发时互不泄漏、可独立单测。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
    System,
}

/// 单条消息
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// 按会话隔离的键值存储：复杂度分析、策略记录与逐轮日志都写在这里
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SessionArena {
    entries: BTreeMap<String, String>,
}

impl SessionArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|s| s.as_str())
    }

    /// 追加一条逐轮日志（键形如 log/0007），便于按迭代序回放
    pub fn append_log(&mut self, iteration: u32, line: impl Into<String>) {
        self.entries
            .insert(format!("log/{:04}", iteration), line.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
