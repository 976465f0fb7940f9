//! 推理主循环编排
//!
//! Analyzing -> Reasoning -> AwaitingTool -> Observing 状态机：会话启动时做一次
//! 复杂度分析与策略选择并初始化预算，此后每轮「组上下文 -> Oracle 决策 ->
//! （可选）工具调用 -> 回填观察 -> 进展评估 -> 预算推进」。终止性由预算保证：
//! 每完成一轮 current 恰好加一，扩展永不越过安全上限。
//!
//! 单会话内严格串行（思考依赖上一轮观察）；多会话各自持有预算、链与 Arena，
//! 仅共享只读注册表，可并发运行。除 ConfigError 外，调用方总能拿到 SessionResult。

use std::collections::BTreeSet;
use std::time::Duration;

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::core::{AgentError, OracleError};
use crate::memory::SessionArena;
use crate::oracle::{parse_turn, OracleClient};
use crate::reason::budget::{BudgetController, IterationBudget};
use crate::reason::complexity::ComplexityAnalyzer;
use crate::reason::events::SessionEvent;
use crate::reason::progress::{evaluate, ProgressInput};
use crate::reason::prompt::{build_messages, DecisionContext};
use crate::reason::stage::filter_by_stage;
use crate::reason::strategy::{min_default_iterations, profile_for, select_strategy};
use crate::reason::types::{
    ComplexityAnalysis, ComplexityTier, Decision, IterationBudgetView, Problem, ReasoningStep,
    SessionConfig, SessionResult, TerminationReason,
};
use crate::tools::{ToolDescriptor, ToolExecutor};

/// 工具结果尚未回填时的占位观察
pub const PENDING_OBSERVATION: &str = "等待工具执行结果...";
/// 预算耗尽且链中无可用内容时的兜底答案
const NO_PARTIAL_ANSWER: &str = "迭代预算已用尽，未能得出答案。";

/// 思考内容展示最大字符数
const THINKING_PREVIEW_CHARS: usize = 800;
/// Observation 预览最大字符数
const OBSERVATION_PREVIEW_CHARS: usize = 200;

/// 各复杂度每轮提供给 Oracle 的候选工具数上限
fn shortlist_limit(tier: ComplexityTier) -> usize {
    match tier {
        ComplexityTier::Simple => 2,
        ComplexityTier::Medium => 3,
        ComplexityTier::Complex | ComplexityTier::VeryComplex => 5,
    }
}

/// 推理会话：组合 Oracle、工具执行器与配置，一次 run_session 驱动一个完整会话
pub struct ReasonSession {
    oracle: Arc<dyn OracleClient>,
    executor: ToolExecutor,
    cfg: AppConfig,
    cancel_token: CancellationToken,
    event_tx: Option<UnboundedSender<SessionEvent>>,
}

impl ReasonSession {
    pub fn new(oracle: Arc<dyn OracleClient>, executor: ToolExecutor, cfg: AppConfig) -> Self {
        Self {
            oracle,
            executor,
            cfg,
            cancel_token: CancellationToken::new(),
            event_tx: None,
        }
    }

    /// 设置取消令牌（外部取消时在下一轮 Reasoning 顶部生效）
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// 设置事件推送通道
    pub fn with_event_tx(mut self, tx: UnboundedSender<SessionEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    /// 入口校验：唯一在做任何工作之前就失败的错误类
    fn validate(&self, session_cfg: &SessionConfig) -> Result<(), AgentError> {
        if self.executor.registry().is_empty() {
            return Err(AgentError::ConfigError(
                "工具注册表为空，无法开始会话".to_string(),
            ));
        }
        let floor = min_default_iterations(&self.cfg.strategy);
        if session_cfg.safety_ceiling < floor {
            return Err(AgentError::ConfigError(format!(
                "safety_ceiling ({}) 小于策略最小默认预算 ({})",
                session_cfg.safety_ceiling, floor
            )));
        }
        if let Some(threshold) = session_cfg.confidence_threshold_override {
            if !(threshold > 0.0 && threshold <= 1.0) {
                return Err(AgentError::ConfigError(format!(
                    "confidence_threshold_override ({threshold}) 必须在 (0, 1] 内"
                )));
            }
        }
        Ok(())
    }

    /// 运行一个完整会话
    ///
    /// Arena 由调用方持有并独占传入；复杂度分析、策略与逐轮日志写入其中。
    pub async fn run_session(
        &self,
        problem: &Problem,
        session_cfg: &SessionConfig,
        arena: &mut SessionArena,
    ) -> Result<SessionResult, AgentError> {
        self.validate(session_cfg)?;

        // ---- Analyzing：一次性分析与预算初始化 ----
        let descriptors = self.executor.registry().descriptors();
        let analyzer =
            ComplexityAnalyzer::new(self.oracle.clone(), self.cfg.analysis.clone());
        let signals = analyzer.detect_signals(&problem.text);
        let analysis = analyzer.analyze(&problem.text, &descriptors).await;

        let strategy = select_strategy(analysis.tier, &session_cfg.runtime, &self.cfg.strategy);
        let profile = profile_for(strategy, &self.cfg.strategy);
        let confidence_threshold = session_cfg
            .confidence_threshold_override
            .unwrap_or(profile.confidence_threshold);

        let controller = BudgetController::new(self.cfg.budget.clone());
        let mut budget = controller.initialize(
            &profile,
            analysis.tier,
            session_cfg.control_mode,
            session_cfg.safety_ceiling,
            session_cfg.auto_adjust,
            signals,
        );

        let session_id = uuid::Uuid::new_v4().to_string();
        arena.put("session_id", session_id.clone());
        arena.put("problem", problem.text.clone());
        arena.put("complexity", analysis.tier.as_str());
        arena.put("strategy", strategy.as_str());
        arena.put("budget/max", budget.max.to_string());
        tracing::info!(
            session = %session_id,
            complexity = analysis.tier.as_str(),
            strategy = strategy.as_str(),
            max_iterations = budget.max,
            ceiling = budget.safety_ceiling,
            "会话开始"
        );

        // ---- Reasoning 循环：链与预算是仅有的可变状态 ----
        let available_tools = self.executor.tool_names();
        let mut chain: Vec<ReasoningStep> = Vec::new();
        let mut used_tools: BTreeSet<String> = BTreeSet::new();
        let mut consecutive_oracle_failures: u32 = 0;

        loop {
            if self.cancel_token.is_cancelled() {
                return Ok(self.finish(
                    TerminationReason::Cancelled,
                    fallback_answer(&chain),
                    chain,
                    &budget,
                    strategy,
                ));
            }

            if budget.exhausted() {
                match controller.should_extend(&budget, &chain, PENDING_OBSERVATION) {
                    Some(new_max) if new_max > budget.max => {
                        tracing::info!(new_max, "预算扩展");
                        self.emit(SessionEvent::BudgetExtended { new_max });
                        budget.max = new_max;
                        arena.put("budget/max", budget.max.to_string());
                    }
                    _ => {
                        return Ok(self.finish(
                            TerminationReason::BudgetExhausted,
                            fallback_answer(&chain),
                            chain,
                            &budget,
                            strategy,
                        ));
                    }
                }
            }

            self.emit(SessionEvent::StepUpdate {
                current: budget.current,
                max: budget.max,
            });

            let evaluation = evaluate(&ProgressInput {
                chain: &chain,
                budget: IterationBudgetView {
                    current: budget.current,
                    max: budget.max,
                },
                used_tools: &used_tools,
                available_tools: &available_tools,
                recommended_tools: &analysis.recommended_tools,
                confidence_threshold,
                pending_placeholder: PENDING_OBSERVATION,
                min_valid_observation_chars: self.cfg.analysis.min_valid_observation_chars,
            });

            let shortlist = self.build_shortlist(&analysis, &used_tools, &budget, &descriptors);
            let messages = build_messages(&DecisionContext {
                problem: &problem.text,
                profile: &profile,
                analysis: &analysis,
                current_iteration: budget.current,
                max_iterations: budget.max,
                confidence_threshold,
                evaluation: &evaluation,
                shortlist: &shortlist,
                chain: &chain,
            });

            self.emit(SessionEvent::Thinking);
            let oracle_result = match timeout(
                Duration::from_secs(self.cfg.oracle.request_timeout_secs),
                self.oracle.complete(&messages),
            )
            .await
            {
                Ok(inner) => inner,
                Err(_) => Err(OracleError::Transport("oracle call timed out".to_string())),
            };

            let turn = match oracle_result.and_then(|output| {
                let preview: String = output.chars().take(THINKING_PREVIEW_CHARS).collect();
                self.emit(SessionEvent::ThinkingContent { text: preview });
                parse_turn(&output)
            }) {
                Ok(turn) => {
                    consecutive_oracle_failures = 0;
                    turn
                }
                Err(e) => {
                    consecutive_oracle_failures += 1;
                    tracing::warn!(
                        error = %e,
                        consecutive = consecutive_oracle_failures,
                        "Oracle 调用失败，以保守 Continue 恢复"
                    );
                    self.emit(SessionEvent::OracleFailure {
                        reason: e.to_string(),
                        consecutive: consecutive_oracle_failures,
                    });
                    if consecutive_oracle_failures >= self.cfg.session.oracle_failure_threshold {
                        return Ok(self.finish(
                            TerminationReason::OracleFailure,
                            fallback_answer(&chain),
                            chain,
                            &budget,
                            strategy,
                        ));
                    }
                    // 保守恢复：记一步失败思考，照常计一轮
                    let step = ReasoningStep::new(
                        chain.len() as u32,
                        format!("Oracle 调用失败（{e}），保守继续推理"),
                        "continue",
                    );
                    chain.push(step);
                    budget.advance();
                    arena.append_log(budget.current, format!("oracle_failure: {e}"));
                    continue;
                }
            };

            match turn.decision {
                Decision::FinalAnswer(answer) => {
                    // 最终答案也是完整的一轮：入链并推进预算
                    let mut step =
                        ReasoningStep::new(chain.len() as u32, turn.thought, "final_answer");
                    step.observation = Some(answer.clone());
                    chain.push(step);
                    budget.advance();
                    arena.append_log(budget.current, "final_answer");
                    return Ok(self.finish(
                        TerminationReason::Completed,
                        answer,
                        chain,
                        &budget,
                        strategy,
                    ));
                }
                Decision::Continue { thought } => {
                    let step = ReasoningStep::new(chain.len() as u32, thought, "continue");
                    chain.push(step);
                    budget.advance();
                    arena.append_log(budget.current, "continue");
                }
                Decision::ToolCall { name, args } => {
                    // AwaitingTool：先入链占位，调用完成后回填观察
                    let mut step = ReasoningStep::new(
                        chain.len() as u32,
                        turn.thought,
                        format!("调用工具 {name}"),
                    );
                    step.tool = Some(name.clone());
                    step.tool_args = Some(args.clone());
                    step.observation = Some(PENDING_OBSERVATION.to_string());
                    chain.push(step);

                    self.emit(SessionEvent::ToolCall {
                        tool: name.clone(),
                        args: args.clone(),
                    });

                    // 工具失败是可恢复信息而非致命错误：错误文本记为观察
                    let observation = match self.executor.execute(&name, args).await {
                        Ok(result) => result,
                        Err(e) => {
                            self.emit(SessionEvent::ToolFailure {
                                tool: name.clone(),
                                reason: e.to_string(),
                            });
                            format!("Error: {e}")
                        }
                    };

                    let preview: String = observation
                        .chars()
                        .take(OBSERVATION_PREVIEW_CHARS)
                        .collect();
                    self.emit(SessionEvent::Observation {
                        tool: name.clone(),
                        preview,
                    });

                    // Observing：回填占位观察（链的唯一一处原地改写）
                    if let Some(last) = chain.last_mut() {
                        last.observation = Some(observation);
                    }
                    // 只记录注册表中真实存在的工具：幻觉工具名不计入多样性，也不影响后续候选
                    if self.executor.registry().contains(&name) {
                        used_tools.insert(name.clone());
                    }
                    // 无论工具成败，这一轮都算完成
                    budget.advance();
                    arena.append_log(budget.current, format!("tool: {name}"));
                }
            }
        }
    }

    /// 本轮候选工具：未用过的推荐工具优先，推荐耗尽后退回全部未用工具，再按阶段过滤并截断
    fn build_shortlist(
        &self,
        analysis: &ComplexityAnalysis,
        used_tools: &BTreeSet<String>,
        budget: &IterationBudget,
        descriptors: &[ToolDescriptor],
    ) -> Vec<ToolDescriptor> {
        let registry = self.executor.registry();
        let unused_recommended: Vec<String> = analysis
            .recommended_tools
            .iter()
            .filter(|name| !used_tools.contains(*name))
            .cloned()
            .collect();
        let candidates = if unused_recommended.is_empty() {
            registry
                .tool_names()
                .into_iter()
                .filter(|name| !used_tools.contains(name))
                .collect()
        } else {
            unused_recommended
        };

        let mut filtered =
            filter_by_stage(&candidates, budget.current, budget.max, registry);
        // 偏好与允许集合都为空时仍给全部候选，避免 Oracle 无工具可选
        if filtered.is_empty() {
            filtered = candidates;
        }
        filtered.truncate(shortlist_limit(analysis.tier));

        filtered
            .iter()
            .filter_map(|name| descriptors.iter().find(|d| &d.name == name))
            .cloned()
            .collect()
    }

    fn finish(
        &self,
        reason: TerminationReason,
        final_answer: String,
        chain: Vec<ReasoningStep>,
        budget: &IterationBudget,
        strategy: crate::reason::strategy::Strategy,
    ) -> SessionResult {
        tracing::info!(
            reason = reason.as_str(),
            iterations = budget.current,
            "会话结束"
        );
        self.emit(SessionEvent::Done {
            reason: reason.as_str().to_string(),
        });
        SessionResult {
            final_answer,
            chain,
            iterations_used: budget.current,
            strategy_used: strategy,
            termination_reason: reason,
        }
    }
}

/// 预算耗尽/取消时的兜底答案：最近的有效观察，其次最后一条思考
fn fallback_answer(chain: &[ReasoningStep]) -> String {
    let last_observation = chain.iter().rev().find_map(|step| {
        step.observation
            .as_ref()
            .filter(|obs| !obs.is_empty() && obs.as_str() != PENDING_OBSERVATION)
    });
    if let Some(obs) = last_observation {
        return format!("（预算内未完成，基于已有结果）{obs}");
    }
    if let Some(step) = chain.last() {
        if !step.thought.is_empty() {
            return format!("（预算内未完成，最后思考）{}", step.thought);
        }
    }
    NO_PARTIAL_ANSWER.to_string()
}
