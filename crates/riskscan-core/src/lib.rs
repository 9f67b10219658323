pub mod checks;
pub mod config;
pub mod error;
pub mod extract;
pub mod redact;
pub mod scanner;
pub mod tools;

pub use checks::{Resolution, RiskCheck, UNKNOWN_RISK};
pub use config::{FailurePolicy, ScannerConfig};
pub use error::{ScanError, ToolError};
pub use extract::{extract, NO_FINDINGS};
pub use scanner::report::{CategoryResult, Outcome, ScanReport};
pub use scanner::ScanOrchestrator;
pub use tools::invoker::{Invocation, RawToolResult, ToolInvoker};
pub use tools::ToolKind;
