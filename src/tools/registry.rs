//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / stage / 参数 schema / execute），
//! 由 ToolRegistry 按名注册与查找。注册表启动后只读，可被多个会话经 Arc 并发共享。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 工具优先级阶段：推理循环按进度比例限制各阶段工具何时可被提供给 Oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStage {
    /// 分析/查询类，无副作用
    Early,
    /// 内容变换/生成类
    Middle,
    /// 产物输出类（报告、表格、文件）
    Late,
}

/// 工具 trait：名称、描述（供 Oracle 理解）、阶段、参数 schema、异步执行（args 为 JSON）
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（用于决策 JSON 中的 "tool" 字段）
    fn name(&self) -> &str;

    /// 工具描述（供 Oracle 理解功能）
    fn description(&self) -> &str;

    /// 所属优先级阶段
    fn stage(&self) -> ToolStage;

    /// 参数 JSON Schema（供 Oracle 生成正确的参数格式）
    /// 默认返回空对象，表示无参数或参数格式不限
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    /// 执行工具
    async fn execute(&self, args: Value) -> Result<String, String>;
}

/// 工具描述符：注册表对外暴露的只读元信息
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub stage: ToolStage,
    pub parameters: Value,
}

/// 工具注册表：按名称存储 Arc<dyn Tool>，支持 register / get / execute / descriptors
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub async fn execute(&self, name: &str, args: Value) -> Result<String, String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| format!("Unknown tool: {name}"))?;
        tool.execute(args).await
    }

    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn stage_of(&self, name: &str) -> Option<ToolStage> {
        self.tools.get(name).map(|t| t.stage())
    }

    /// 指定阶段的全部工具名（排序后返回，保证提示词稳定）
    pub fn names_in_stage(&self, stage: ToolStage) -> Vec<String> {
        let mut names: Vec<String> = self
            .tools
            .values()
            .filter(|t| t.stage() == stage)
            .map(|t| t.name().to_string())
            .collect();
        names.sort();
        names
    }

    /// 只读描述符列表，用于复杂度分析与决策提示词中的工具目录
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        let mut list: Vec<ToolDescriptor> = self
            .tools
            .values()
            .map(|t| ToolDescriptor {
                name: t.name().to_string(),
                description: t.description().to_string(),
                stage: t.stage(),
                parameters: t.parameters_schema(),
            })
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// 工具目录 JSON（拼入提示词）
    pub fn to_schema_json(&self) -> String {
        serde_json::to_string_pretty(&self.descriptors()).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopTool {
        name: &'static str,
        stage: ToolStage,
    }

    #[async_trait]
    impl Tool for NoopTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "noop"
        }
        fn stage(&self) -> ToolStage {
            self.stage
        }
        async fn execute(&self, _args: Value) -> Result<String, String> {
            Ok("ok".to_string())
        }
    }

    #[tokio::test]
    async fn test_register_and_execute() {
        let mut reg = ToolRegistry::new();
        reg.register(NoopTool {
            name: "probe",
            stage: ToolStage::Early,
        });
        assert!(reg.contains("probe"));
        assert_eq!(reg.stage_of("probe"), Some(ToolStage::Early));
        assert_eq!(reg.execute("probe", Value::Null).await.unwrap(), "ok");
        assert!(reg.execute("missing", Value::Null).await.is_err());
    }

    #[test]
    fn test_names_in_stage_sorted() {
        let mut reg = ToolRegistry::new();
        reg.register(NoopTool {
            name: "b_tool",
            stage: ToolStage::Late,
        });
        reg.register(NoopTool {
            name: "a_tool",
            stage: ToolStage::Late,
        });
        assert_eq!(reg.names_in_stage(ToolStage::Late), vec!["a_tool", "b_tool"]);
        assert!(reg.names_in_stage(ToolStage::Early).is_empty());
    }
}
