use std::time::Duration;

use super::{require_text, require_url, CallContext};
use crate::error::Result;
use crate::models::{ActionResponse, OverviewResponse, WindowDetailsResponse, WindowId};
use crate::rpc::Request;

/// Window inventory and application launching.
///
/// `get_overview` and `get_window_details` are the only source of window and
/// element ids. Their JSON form (`to_json_string`) is meant to be handed to
/// an LLM to pick targets.
pub struct SystemApi<'a> {
    ctx: CallContext<'a>,
}

impl<'a> SystemApi<'a> {
    pub(crate) fn new(ctx: CallContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.ctx = self.ctx.with_timeout(timeout);
        self
    }

    /// Open windows, focus, Chrome instances and installed programs
    pub async fn get_overview(&self) -> Result<OverviewResponse> {
        self.ctx.call(Request::SystemGetOverview).await
    }

    /// UI element tree of one window
    pub async fn get_window_details(&self, window_id: &WindowId) -> Result<WindowDetailsResponse> {
        require_text("window_id", window_id.as_str())?;
        self.ctx
            .call(Request::SystemGetWindowDetails {
                window_id: window_id.clone(),
            })
            .await
    }

    pub async fn open_application(&self, name: &str) -> Result<ActionResponse> {
        require_text("name", name)?;
        self.ctx
            .call(Request::SystemOpenApplication {
                name: name.trim().to_string(),
            })
            .await
    }

    /// Launch the managed Chrome instance, optionally at `url`
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
}
