use serde::{Deserialize, Serialize};

/// Answer of `code.execute_csharp` / `code.generate_and_execute_csharp`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CSharpResponse {
    /// Stringified return value of the executed code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<String>,
}
