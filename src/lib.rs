//! ReAgent - 多轮推理编排引擎
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误分层（Oracle / 工具 / 配置 / 取消）
//! - **memory**: 会话消息与会话级键值存储（SessionArena）
//! - **oracle**: 决策 Oracle 抽象与实现（OpenAI 兼容 / Mock / 脚本化）及输出解析
//! - **reason**: 复杂度分析、策略选择、迭代预算、进展评估、阶段过滤与 ReAct 主循环
//! - **tools**: 工具注册表、带超时的执行器与内置工具

pub mod config;
pub mod core;
pub mod memory;
pub mod oracle;
pub mod reason;
pub mod tools;

pub use reason::{ReasonSession, SessionConfig, SessionResult};
