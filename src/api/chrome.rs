use std::time::Duration;

use super::{require_non_empty, require_text, require_url, CallContext};
use crate::error::Result;
use crate::models::{ActionResponse, ChromeTabDetails, ScriptResponse};
use crate::rpc::Request;

/// The managed Chrome instance, addressed by CSS selectors.
///
/// Open it first with [`ChromeApi::open_chrome`].
pub struct ChromeApi<'a> {
    ctx: CallContext<'a>,
}

impl<'a> ChromeApi<'a> {
    pub(crate) fn new(ctx: CallContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.ctx = self.ctx.with_timeout(timeout);
        self
    }

    /// Launch the managed Chrome instance, optionally at `url`.
    /// Same call as `system().open_chrome(..)`.
    pub async fn open_chrome(&self, url: Option<&str>) -> Result<ActionResponse> {
        if let Some(url) = url {
            require_url("url", url)?;
        }
        self.ctx
            .call(Request::SystemOpenChrome {
                url: url.map(|u| u.trim().to_string()),
            })
            .await
    }

    pub async fn navigate(&self, url: &str) -> Result<ActionResponse> {
        require_url("url", url)?;
        self.ctx
            .call(Request::ChromeNavigate {
                url: url.trim().to_string(),
            })
            .await
    }

    /// Title, URL and candidate selectors of the current tab
    pub async fn explain_current_tab(&self) -> Result<ChromeTabDetails> {
        self.ctx.call(Request::ChromeExplainCurrentTab).await
    }

    pub async fn click_element(&self, selector: &str) -> Result<ActionResponse> {
        require_text("selector", selector)?;
        self.ctx
            .call(Request::ChromeClickElement {
                selector: selector.to_string(),
            })
            .await
    }

    /// Type into the element matched by `selector`
    pub async fn simulate_input(&self, selector: &str, text: &str) -> Result<ActionResponse> {
        require_text("selector", selector)?;
        require_non_empty("text", text)?;
        self.ctx
            .call(Request::ChromeSimulateInput {
                selector: selector.to_string(),
                text: text.to_string(),
            })
            .await
    }

    pub async fn execute_script(&self, script: &str) -> Result<ScriptResponse> {
        require_text("script", script)?;
        self.ctx
            .call(Request::ChromeExecuteScript {
                script: script.to_string(),
            })
            .await
    }

    /// Have the server synthesize JavaScript for `task_description` and run it
    pub async fn generate_and_execute_script(&self, task_description: &str) -> Result<ScriptResponse> {
        require_text("task_description", task_description)?;
        self.ctx
            .call(Request::ChromeGenerateAndExecuteScript {
                task_description: task_description.to_string(),
            })
            .await
    }
}
