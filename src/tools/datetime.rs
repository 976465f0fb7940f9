//! 日期时间工具（early 阶段）

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::tools::{Tool, ToolStage};

/// get_current_time：返回当前 UTC 时间，可选自定义格式
pub struct DateTimeTool;

#[async_trait]
impl Tool for DateTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Get the current UTC date and time. Args: {\"format\": \"%Y-%m-%d %H:%M:%S\" (optional)}"
    }

    fn stage(&self) -> ToolStage {
        ToolStage::Early
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "format": { "type": "string", "description": "strftime format, defaults to RFC3339" }
            },
            "required": []
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let now = Utc::now();
        match args.get("format").and_then(|v| v.as_str()) {
            Some(fmt) => Ok(now.format(fmt).to_string()),
            None => Ok(now.to_rfc3339()),
        }
    }
}
