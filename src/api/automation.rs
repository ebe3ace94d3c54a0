use std::time::Duration;

use super::{require_text, CallContext};
use crate::error::Result;
use crate::models::{ActionResponse, ElementId, WindowId};
use crate::rpc::Request;

/// Windows UI Automation on ids obtained from `system`.
///
/// Ids are forwarded untouched. An unknown or stale id is reported by the
/// server and surfaces as `ServerReported`.
pub struct AutomationApi<'a> {
    ctx: CallContext<'a>,
}

impl<'a> AutomationApi<'a> {
    pub(crate) fn new(ctx: CallContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.ctx = self.ctx.with_timeout(timeout);
        self
    }

    /// Default action of the element (press a button, open a menu item, ...)
    pub async fn invoke(&self, element_id: &ElementId) -> Result<ActionResponse> {
        require_text("element_id", element_id.as_str())?;
        self.ctx
            .call(Request::AutomationInvoke {
                element_id: element_id.clone(),
            })
            .await
    }

    /// Replace the element's value; an empty `value` clears it
    pub async fn set_value(&self, element_id: &ElementId, value: &str) -> Result<ActionResponse> {
        require_text("element_id", element_id.as_str())?;
        self.ctx
            .call(Request::AutomationSetValue {
                element_id: element_id.clone(),
                value: value.to_string(),
            })
            .await
    }

    pub async fn set_focus(&self, element_id: &ElementId) -> Result<ActionResponse> {
        require_text("element_id", element_id.as_str())?;
        self.ctx
            .call(Request::AutomationSetFocus {
                element_id: element_id.clone(),
            })
            .await
    }

    pub async fn bring_to_front(&self, window_id: &WindowId) -> Result<ActionResponse> {
        require_text("window_id", window_id.as_str())?;
        self.ctx
            .call(Request::AutomationBringToFront {
                window_id: window_id.clone(),
            })
            .await
    }
}
