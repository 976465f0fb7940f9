//! 阶段化工具过滤
//!
//! 按进度比例限制各优先级阶段的工具何时可提供给 Oracle：前 40% 偏好 early，
//! 40%~80% 偏好 middle，之后偏好 late。偏好阶段无候选时退回允许集合，
//! 返回值始终是候选列表的子集。这样 Oracle 既不会在信息不足时提前产出最终产物，
//! 也不会在收尾阶段重复跑纯分析工具。

use crate::tools::{ToolRegistry, ToolStage};

/// 进度阈值：低于 0.4 为早期，低于 0.8 为中期，其余为后期
const EARLY_PHASE_END: f64 = 0.4;
const MIDDLE_PHASE_END: f64 = 0.8;

/// 过滤候选工具：返回候选与偏好阶段的交集，交集为空时退回与允许阶段的交集
pub fn filter_by_stage(
    candidates: &[String],
    current_iteration: u32,
    max_iterations: u32,
    registry: &ToolRegistry,
) -> Vec<String> {
    let progress_ratio = if max_iterations > 0 {
        current_iteration as f64 / max_iterations as f64
    } else {
        0.0
    };

    let (preferred, allowed): (&[ToolStage], &[ToolStage]) = if progress_ratio < EARLY_PHASE_END {
        (
            &[ToolStage::Early],
            &[ToolStage::Early, ToolStage::Middle],
        )
    } else if progress_ratio < MIDDLE_PHASE_END {
        (
            &[ToolStage::Middle],
            &[ToolStage::Early, ToolStage::Middle, ToolStage::Late],
        )
    } else {
        (
            &[ToolStage::Late],
            &[ToolStage::Early, ToolStage::Middle, ToolStage::Late],
        )
    };

    let in_stages = |name: &String, stages: &[ToolStage]| {
        registry
            .stage_of(name)
            .map(|s| stages.contains(&s))
            .unwrap_or(false)
    };

    let preferred_hits: Vec<String> = candidates
        .iter()
        .filter(|name| in_stages(name, preferred))
        .cloned()
        .collect();
    if !preferred_hits.is_empty() {
        return preferred_hits;
    }

    candidates
        .iter()
        .filter(|name| in_stages(name, allowed))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Tool;
    use async_trait::async_trait;
    use serde_json::Value;

    struct StubTool {
        name: &'static str,
        stage: ToolStage,
    }

    #[async_trait]
    impl Tool for StubTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "stub"
        }
        fn stage(&self) -> ToolStage {
            self.stage
        }
        async fn execute(&self, _args: Value) -> Result<String, String> {
            Ok(String::new())
        }
    }

    fn registry() -> ToolRegistry {
        let mut reg = ToolRegistry::new();
        reg.register(StubTool {
            name: "search",
            stage: ToolStage::Early,
        });
        reg.register(StubTool {
            name: "transform",
            stage: ToolStage::Middle,
        });
        reg.register(StubTool {
            name: "report",
            stage: ToolStage::Late,
        });
        reg
    }

    fn all_candidates() -> Vec<String> {
        vec![
            "search".to_string(),
            "transform".to_string(),
            "report".to_string(),
        ]
    }

    #[test]
    fn test_early_phase_prefers_early() {
        let reg = registry();
        let out = filter_by_stage(&all_candidates(), 1, 10, &reg);
        assert_eq!(out, vec!["search"]);
    }

    #[test]
    fn test_middle_phase_prefers_middle() {
        let reg = registry();
        let out = filter_by_stage(&all_candidates(), 5, 10, &reg);
        assert_eq!(out, vec!["transform"]);
    }

    #[test]
    fn test_late_phase_prefers_late() {
        let reg = registry();
        let out = filter_by_stage(&all_candidates(), 8, 10, &reg);
        assert_eq!(out, vec!["report"]);
    }

    #[test]
    fn test_no_late_only_before_late_phase() {
        // 混合候选下，0.8 之前绝不会只剩 late 工具
        let reg = registry();
        for iteration in 0..8 {
            let out = filter_by_stage(&all_candidates(), iteration, 10, &reg);
            assert!(
                !out.iter().all(|n| n == "report"),
                "iteration {iteration} returned late-only: {out:?}"
            );
        }
    }

    #[test]
    fn test_fallback_to_allowed_set() {
        let reg = registry();
        // 早期阶段没有 early 候选：退回 early+middle 允许集，report 被排除
        let candidates = vec!["transform".to_string(), "report".to_string()];
        let out = filter_by_stage(&candidates, 0, 10, &reg);
        assert_eq!(out, vec!["transform"]);
    }

    #[test]
    fn test_subset_of_candidates() {
        let reg = registry();
        let candidates = vec!["report".to_string()];
        let out = filter_by_stage(&candidates, 9, 10, &reg);
        assert_eq!(out, vec!["report"]);
        // 未注册的候选名直接被丢弃
        let unknown = vec!["ghost".to_string()];
        assert!(filter_by_stage(&unknown, 9, 10, &reg).is_empty());
    }

    #[test]
    fn test_zero_max_treated_as_early() {
        let reg = registry();
        let out = filter_by_stage(&all_candidates(), 0, 0, &reg);
        assert_eq!(out, vec!["search"]);
    }
}
