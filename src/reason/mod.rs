//! 推理引擎：复杂度分析、策略选择、迭代预算、进展评估与 ReAct 主循环

pub mod budget;
pub mod complexity;
pub mod events;
pub mod loop_;
pub mod progress;
pub mod prompt;
pub mod stage;
pub mod strategy;
pub mod types;

pub use budget::{BudgetController, IterationBudget, ProblemSignals};
pub use complexity::ComplexityAnalyzer;
pub use events::SessionEvent;
pub use loop_::{ReasonSession, PENDING_OBSERVATION};
pub use strategy::{select_strategy, Strategy, StrategyProfile};
pub use types::{
    ComplexityAnalysis, ComplexityTier, ControlMode, Decision, Problem, ProgressEvaluation,
    ReasoningStep, RuntimeContext, SessionConfig, SessionResult, TerminationReason,
};
