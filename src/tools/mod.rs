//! 工具箱：注册表、执行器与内置工具（覆盖 early / middle / late 三个阶段）

pub mod calculator;
pub mod datetime;
pub mod executor;
pub mod markdown;
pub mod registry;
pub mod text;

pub use calculator::CalculatorTool;
pub use datetime::DateTimeTool;
pub use executor::ToolExecutor;
pub use markdown::MarkdownReportTool;
pub use registry::{Tool, ToolDescriptor, ToolRegistry, ToolStage};
pub use text::TextAnalysisTool;
