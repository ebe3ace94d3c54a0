use std::time::Duration;

use super::{require_text, CallContext};
use crate::error::Result;
use crate::models::CSharpResponse;
use crate::rpc::Request;

/// C# execution on the server
pub struct CodeApi<'a> {
    ctx: CallContext<'a>,
}

impl<'a> CodeApi<'a> {
    pub(crate) fn new(ctx: CallContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.ctx = self.ctx.with_timeout(timeout);
        self
    }

    pub async fn execute_csharp(&self, code: &str) -> Result<CSharpResponse> {
        require_text("code", code)?;
        self.ctx
            .call(Request::CodeExecuteCSharp {
                code: code.to_string(),
            })
            .await
    }

    /// Let the server's code-generation service write the C#, then run it
    pub async fn generate_and_execute_csharp(&self, task_description: &str) -> Result<CSharpResponse> {
        require_text("task_description", task_description)?;
        self.ctx
            .call(Request::CodeGenerateAndExecuteCSharp {
                task_description: task_description.to_string(),
            })
            .await
    }
}
