//! 推理策略：枚举、配置档与选择逻辑
//!
//! 每个策略绑定默认迭代预算与信心度阈值（迭代数表可在 [strategy] 段调整），
//! select_strategy 为纯函数：复杂度做基础映射，运行时上下文按固定顺序覆盖。

use serde::{Deserialize, Serialize};

use crate::config::StrategySection;
use crate::reason::types::{ComplexityTier, RuntimeContext};

/// 推理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// 顺序推理：逐步分析
    Sequential,
    /// 并行推理：同时考虑多条路径
    Parallel,
    /// 层次推理：分解为子问题
    Hierarchical,
    /// 自适应推理：按进展动态调整
    Adaptive,
    /// 聚焦推理：专注关键信息
    Focused,
    /// 探索推理：广泛搜索可能性
    Exploratory,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::Parallel => "parallel",
            Strategy::Hierarchical => "hierarchical",
            Strategy::Adaptive => "adaptive",
            Strategy::Focused => "focused",
            Strategy::Exploratory => "exploratory",
        }
    }
}

/// 策略配置档：默认迭代预算、信心度阈值与提示词指导
#[derive(Debug, Clone)]
pub struct StrategyProfile {
    pub strategy: Strategy,
    pub max_iterations: u32,
    pub confidence_threshold: f64,
    pub description: &'static str,
    pub guidance: &'static str,
}

/// 取策略配置档（迭代数来自配置，阈值与文案为策略固有属性）
pub fn profile_for(strategy: Strategy, cfg: &StrategySection) -> StrategyProfile {
    match strategy {
        Strategy::Sequential => StrategyProfile {
            strategy,
            max_iterations: cfg.sequential_iterations,
            confidence_threshold: 0.7,
            description: "顺序推理：逐步分析，一步一步解决问题",
            guidance: "1. 逐步分析问题，一次专注一个方面\n\
                       2. 确保每一步都有明确的目标\n\
                       3. 在继续下一步之前验证当前步骤的结果\n\
                       4. 保持逻辑的连贯性和清晰性",
        },
        Strategy::Parallel => StrategyProfile {
            strategy,
            max_iterations: cfg.parallel_iterations,
            confidence_threshold: 0.8,
            description: "并行推理：同时考虑多个解决路径",
            guidance: "1. 同时考虑多个解决路径\n\
                       2. 识别可以并行处理的子问题\n\
                       3. 比较不同方法的优缺点\n\
                       4. 选择最有希望的路径继续",
        },
        Strategy::Hierarchical => StrategyProfile {
            strategy,
            max_iterations: cfg.hierarchical_iterations,
            confidence_threshold: 0.75,
            description: "层次推理：分解为子问题，逐层解决",
            guidance: "1. 将复杂问题分解为更小的子问题\n\
                       2. 建立问题之间的层次关系\n\
                       3. 从基础问题开始，逐层向上解决\n\
                       4. 确保子问题的解决方案能够整合",
        },
        Strategy::Adaptive => StrategyProfile {
            strategy,
            max_iterations: cfg.adaptive_iterations,
            confidence_threshold: 0.8,
            description: "自适应推理：根据进展动态调整策略",
            guidance: "1. 根据当前进展调整推理方向\n\
                       2. 灵活切换不同的解决方法\n\
                       3. 监控推理效果，及时调整策略\n\
                       4. 在必要时改变问题分析角度",
        },
        Strategy::Focused => StrategyProfile {
            strategy,
            max_iterations: cfg.focused_iterations,
            confidence_threshold: 0.85,
            description: "聚焦推理：专注于最关键的信息",
            guidance: "1. 专注于最关键的信息和要求\n\
                       2. 避免不必要的复杂化\n\
                       3. 直接针对核心问题寻找解决方案\n\
                       4. 提高推理的效率和准确性",
        },
        Strategy::Exploratory => StrategyProfile {
            strategy,
            max_iterations: cfg.exploratory_iterations,
            confidence_threshold: 0.7,
            description: "探索推理：广泛搜索，发现新的可能性",
            guidance: "1. 广泛搜索可能的解决方案\n\
                       2. 尝试不同的方法和角度\n\
                       3. 不要过早排除任何可能性\n\
                       4. 从多个维度验证结果",
        },
    }
}

/// 全部策略的最小默认迭代数（入口校验安全上限时使用）
pub fn min_default_iterations(cfg: &StrategySection) -> u32 {
    [
        cfg.sequential_iterations,
        cfg.parallel_iterations,
        cfg.hierarchical_iterations,
        cfg.adaptive_iterations,
        cfg.focused_iterations,
        cfg.exploratory_iterations,
    ]
    .into_iter()
    .min()
    .unwrap_or(1)
    .max(1)
}

/// 按复杂度与运行时上下文选择策略（纯函数，首个命中的覆盖条件生效）
///
/// 覆盖顺序：时间紧迫且问题复杂 -> Focused；历史失败多 -> Exploratory；
/// 工具调用受限 -> Focused；否则按复杂度基础映射。
pub fn select_strategy(tier: ComplexityTier, ctx: &RuntimeContext, cfg: &StrategySection) -> Strategy {
    if let Some(limit) = ctx.time_limit {
        if limit.as_secs() < cfg.time_pressure_secs
            && matches!(tier, ComplexityTier::Complex | ComplexityTier::VeryComplex)
        {
            return Strategy::Focused;
        }
    }

    if ctx.prior_failures > 1 {
        return Strategy::Exploratory;
    }

    if let Some(limit) = ctx.tool_call_limit {
        if limit < cfg.min_tool_call_limit {
            return Strategy::Focused;
        }
    }

    match tier {
        ComplexityTier::Simple => Strategy::Focused,
        ComplexityTier::Medium => Strategy::Sequential,
        ComplexityTier::Complex => Strategy::Hierarchical,
        ComplexityTier::VeryComplex => Strategy::Adaptive,
    }
}
