//! 推理会话数据模型
//!
//! Problem 与 ComplexityAnalysis 会话内只读；IterationBudget 与推理链是仅有的两份可变状态，
//! 均由会话独占（见 loop_）。

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 待解决的问题（会话启动时创建，之后只读）
#[derive(Debug, Clone)]
pub struct Problem {
    pub text: String,
}

impl Problem {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// 问题复杂度等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityTier {
    Simple,
    Medium,
    Complex,
    VeryComplex,
}

impl ComplexityTier {
    /// 提升一级，封顶 VeryComplex
    pub fn escalate(self) -> Self {
        match self {
            ComplexityTier::Simple => ComplexityTier::Medium,
            ComplexityTier::Medium => ComplexityTier::Complex,
            ComplexityTier::Complex => ComplexityTier::VeryComplex,
            ComplexityTier::VeryComplex => ComplexityTier::VeryComplex,
        }
    }

    /// 智能模式下的迭代预算乘数
    pub fn multiplier(self) -> f64 {
        match self {
            ComplexityTier::Simple => 1.0,
            ComplexityTier::Medium => 1.5,
            ComplexityTier::Complex => 2.0,
            ComplexityTier::VeryComplex => 2.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComplexityTier::Simple => "simple",
            ComplexityTier::Medium => "medium",
            ComplexityTier::Complex => "complex",
            ComplexityTier::VeryComplex => "very_complex",
        }
    }
}

/// 复杂度分析结果（会话开始时生成一次，之后只读）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityAnalysis {
    pub tier: ComplexityTier,
    pub rationale: String,
    pub estimated_steps: u32,
    /// 推荐工具（已过滤为注册表中实际存在的名字）
    pub recommended_tools: Vec<String>,
    pub success_criteria: String,
}

/// 运行时上下文：时间压力、历史失败次数、工具调用上限，用于策略覆盖
#[derive(Debug, Clone, Default)]
pub struct RuntimeContext {
    pub time_limit: Option<Duration>,
    pub prior_failures: u32,
    pub tool_call_limit: Option<usize>,
}

/// 推理链单步：一轮 Thought/Action/Observation
///
/// 链只追加不改写，唯一的例外是配对的工具调用完成后回填 observation。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub index: u32,
    pub thought: String,
    pub action: String,
    pub tool: Option<String>,
    pub tool_args: Option<Value>,
    pub observation: Option<String>,
    pub at: DateTime<Utc>,
}

impl ReasoningStep {
    pub fn new(index: u32, thought: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            index,
            thought: thought.into(),
            action: action.into(),
            tool: None,
            tool_args: None,
            observation: None,
            at: Utc::now(),
        }
    }
}

/// 预算只读视图：进展评估只需要 current/max 两个数
#[derive(Debug, Clone, Copy)]
pub struct IterationBudgetView {
    pub current: u32,
    pub max: u32,
}

/// 进展评估（每轮从链与预算重新推导，不持久化）
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvaluation {
    pub progress_score: f64,
    pub confidence: f64,
    pub tool_diversity: f64,
    pub reasoning_depth: f64,
    pub should_continue: bool,
    /// 仅作提示展示，不参与控制流
    pub recommendations: Vec<String>,
}

/// Oracle 单轮决策
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// 给出最终答案，会话完成
    FinalAnswer(String),
    /// 调用指定工具
    ToolCall { name: String, args: Value },
    /// 仅思考，不调工具也未完成
    Continue { thought: String },
}

/// 会话终止原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    Completed,
    BudgetExhausted,
    Cancelled,
    OracleFailure,
}

impl TerminationReason {
    pub fn as_str(self) -> &'static str {
        match self {
            TerminationReason::Completed => "completed",
            TerminationReason::BudgetExhausted => "budget_exhausted",
            TerminationReason::Cancelled => "cancelled",
            TerminationReason::OracleFailure => "oracle_failure",
        }
    }
}

/// 会话结果：最终答案、完整推理链与终止信息
#[derive(Debug, Clone)]
pub struct SessionResult {
    pub final_answer: String,
    pub chain: Vec<ReasoningStep>,
    pub iterations_used: u32,
    pub strategy_used: crate::reason::strategy::Strategy,
    pub termination_reason: TerminationReason,
}

/// 迭代控制模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    /// 严格按策略预算，不允许扩展
    Strict,
    /// 按复杂度放大预算，并可依据近期观察结果小步扩展
    Intelligent,
    /// 直接放到安全上限，主要依赖 Oracle 自行给出最终答案
    Flexible,
}

/// 单会话入口配置
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub control_mode: ControlMode,
    pub auto_adjust: bool,
    pub safety_ceiling: u32,
    pub confidence_threshold_override: Option<f64>,
    pub runtime: RuntimeContext,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            control_mode: ControlMode::Intelligent,
            auto_adjust: true,
            safety_ceiling: 40,
            confidence_threshold_override: None,
            runtime: RuntimeContext::default(),
        }
    }
}
