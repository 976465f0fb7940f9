//! 推理进展评估
//!
//! 纯函数：从链与预算推导进展分数与信心度。信心度由四个各自封顶的分量加权求和，
//! 单一因素无法独自拉满；最终值收敛到 [0.1, 1.0]。

use std::collections::BTreeSet;

use crate::reason::types::{IterationBudgetView, ProgressEvaluation, ReasoningStep};

/// 信心度基础常量与各分量权重
const BASE_CONFIDENCE: f64 = 0.2;
const DEPTH_WEIGHT: f64 = 0.3;
const DIVERSITY_WEIGHT: f64 = 0.25;
const OBSERVATION_WEIGHT: f64 = 0.25;
const RECOMMENDED_WEIGHT: f64 = 0.2;
/// 有效观察达到该数量后观察分量饱和
const OBSERVATION_SATURATION: f64 = 3.0;

/// 进展缓慢的提示阈值
const SLOW_PROGRESS_THRESHOLD: f64 = 0.3;

/// 评估输入：链、预算视图、工具使用情况与阈值
pub struct ProgressInput<'a> {
    pub chain: &'a [ReasoningStep],
    pub budget: IterationBudgetView,
    pub used_tools: &'a BTreeSet<String>,
    pub available_tools: &'a [String],
    pub recommended_tools: &'a [String],
    pub confidence_threshold: f64,
    /// 工具结果尚未回填时的占位观察文本
    pub pending_placeholder: &'a str,
    /// 观察结果计入有效所需的最小字符数
    pub min_valid_observation_chars: usize,
}

/// 计算一次进展评估
pub fn evaluate(input: &ProgressInput<'_>) -> ProgressEvaluation {
    let chain = input.chain;

    // 已用集合按约定是可用集合的子集；仍夹紧到 1.0，保证比值不破坏 [0,1] 区间
    let tool_diversity = (input.used_tools.len() as f64
        / (input.available_tools.len().max(1)) as f64)
        .min(1.0);
    let reasoning_depth = if input.budget.max > 0 {
        chain.len() as f64 / input.budget.max as f64
    } else {
        0.0
    };

    let valid_observations = chain
        .iter()
        .filter(|step| is_valid_observation(step, input))
        .count();

    let used_recommended = input
        .recommended_tools
        .iter()
        .filter(|t| input.used_tools.contains(*t))
        .count();

    let confidence = {
        let depth_part = reasoning_depth.min(1.0) * DEPTH_WEIGHT;
        let diversity_part = (tool_diversity * 2.0).min(1.0) * DIVERSITY_WEIGHT;
        let observation_part =
            (valid_observations as f64 / OBSERVATION_SATURATION).min(1.0) * OBSERVATION_WEIGHT;
        let recommended_part = (used_recommended as f64
            / input.recommended_tools.len().max(1) as f64)
            .min(1.0)
            * RECOMMENDED_WEIGHT;
        (BASE_CONFIDENCE + depth_part + diversity_part + observation_part + recommended_part)
            .clamp(0.1, 1.0)
    };

    let progress_score = {
        let gathered = if valid_observations > 0 { 1.0 } else { 0.0 };
        ((tool_diversity + reasoning_depth + gathered) / 3.0).clamp(0.0, 1.0)
    };

    let should_continue =
        confidence < input.confidence_threshold && input.budget.current < input.budget.max;

    let mut recommendations = Vec::new();
    if chain.is_empty() {
        recommendations.push("开始推理过程".to_string());
    }
    if !chain.is_empty() && progress_score < SLOW_PROGRESS_THRESHOLD {
        recommendations.push("推理进展缓慢，考虑改变策略".to_string());
    }
    if input.used_tools.len() < 3 && input.available_tools.len() > 5 {
        recommendations.push("尝试使用更多类型的工具".to_string());
    }
    if confidence < 0.5 {
        recommendations.push("需要收集更多信息".to_string());
    }
    if input.budget.max > 0
        && input.budget.current as f64 >= input.budget.max as f64 * 0.8
    {
        recommendations.push("接近最大轮次，准备总结".to_string());
    }

    ProgressEvaluation {
        progress_score,
        confidence,
        tool_diversity,
        reasoning_depth,
        should_continue,
        recommendations,
    }
}

fn is_valid_observation(step: &ReasoningStep, input: &ProgressInput<'_>) -> bool {
    match &step.observation {
        Some(obs) => {
            obs != input.pending_placeholder
                && obs.chars().count() > input.min_valid_observation_chars
        }
        None => false,
    }
}
