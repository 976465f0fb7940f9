//! 迭代预算控制
//!
//! 预算归单个会话独占；current 每完成一轮恰好加一，只增不减。
//! 三种控制模式各自一个 match 分支，新增模式是编译期检查的改动。
//!
//! 智能模式扩展的边界规则：只要 current < safety_ceiling 就允许扩展，
//! 新 max 取 min(current + extension_step, safety_ceiling)；因此
//! current + step 恰好等于上限时扩展到上限，下一次耗尽检查自然终止。

use serde::{Deserialize, Serialize};

use crate::config::BudgetSection;
use crate::reason::strategy::StrategyProfile;
use crate::reason::types::{ComplexityTier, ControlMode, ReasoningStep};

/// 问题信号：从问题文本检测，影响智能模式的预算追加
#[derive(Debug, Clone, Copy, Default)]
pub struct ProblemSignals {
    /// 需要生成文件/报告等产物
    pub artifact: bool,
    /// 需要复杂计算
    pub complex_calculation: bool,
}

impl ProblemSignals {
    pub fn any(self) -> bool {
        self.artifact || self.complex_calculation
    }
}

/// 会话迭代预算
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationBudget {
    pub current: u32,
    pub max: u32,
    pub safety_ceiling: u32,
    pub mode: ControlMode,
}

impl IterationBudget {
    /// 完成一轮推理后推进计数；任何路径每轮只调用一次
    pub fn advance(&mut self) {
        self.current += 1;
        debug_assert!(self.current <= self.safety_ceiling);
    }

    pub fn exhausted(&self) -> bool {
        self.current >= self.max
    }
}

/// 预算控制器：持有扩展启发式的配置常量
#[derive(Debug, Clone)]
pub struct BudgetController {
    cfg: BudgetSection,
}

impl BudgetController {
    pub fn new(cfg: BudgetSection) -> Self {
        Self { cfg }
    }

    /// 初始化会话预算
    ///
    /// auto_adjust=false 时一律用策略默认值；否则按模式：
    /// Strict 用策略默认值且之后不再上调；Intelligent 按复杂度乘数放大并对
    /// 产物/计算信号追加固定量；Flexible 直接放到安全上限。
    pub fn initialize(
        &self,
        profile: &StrategyProfile,
        tier: ComplexityTier,
        mode: ControlMode,
        safety_ceiling: u32,
        auto_adjust: bool,
        signals: ProblemSignals,
    ) -> IterationBudget {
        let max = if !auto_adjust {
            profile.max_iterations.min(safety_ceiling)
        } else {
            match mode {
                ControlMode::Strict => profile.max_iterations.min(safety_ceiling),
                ControlMode::Intelligent => {
                    let scaled =
                        (self.cfg.base_iterations as f64 * tier.multiplier()).round() as u32;
                    let mut max = scaled.min(safety_ceiling);
                    if signals.any() {
                        max = (max + self.cfg.artifact_extension).min(safety_ceiling);
                    }
                    max
                }
                ControlMode::Flexible => safety_ceiling,
            }
        };

        IterationBudget {
            current: 0,
            max: max.max(1),
            safety_ceiling,
            mode,
        }
    }

    /// 预算耗尽（current >= max）时询问是否扩展；返回新的 max，None 表示终止
    ///
    /// Strict：从不扩展。Flexible：上限内无条件继续。
    /// Intelligent：回看最近几步，存在足够长的非占位观察结果才视为仍有进展，
    /// 否则按停滞终止。
    pub fn should_extend(
        &self,
        budget: &IterationBudget,
        chain: &[ReasoningStep],
        pending_placeholder: &str,
    ) -> Option<u32> {
        if budget.current >= budget.safety_ceiling {
            return None;
        }
        match budget.mode {
            ControlMode::Strict => None,
            ControlMode::Flexible => Some(budget.safety_ceiling),
            ControlMode::Intelligent => {
                let lookback = self.cfg.extension_lookback;
                let recent_progress = chain
                    .iter()
                    .rev()
                    .take(lookback)
                    .any(|step| match &step.observation {
                        Some(obs) => {
                            obs != pending_placeholder
                                && obs.chars().count() > self.cfg.extension_min_observation_chars
                        }
                        None => false,
                    });
                if recent_progress {
                    Some((budget.current + self.cfg.extension_step).min(budget.safety_ceiling))
                } else {
                    None
                }
            }
        }
    }
}
