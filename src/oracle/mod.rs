//! 推理 Oracle 层：客户端抽象、决策解析与后端实现（OpenAI 兼容 / Mock）

pub mod mock;
pub mod openai;
pub mod parser;
pub mod schema;
pub mod traits;

pub use mock::{MockOracle, ScriptedOracle};
pub use openai::OpenAiOracle;
pub use parser::{parse_turn, OracleTurn};
pub use schema::decision_schema_json;
pub use traits::OracleClient;
