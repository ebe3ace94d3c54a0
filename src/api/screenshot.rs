use std::time::Duration;

use super::{resolution, CallContext};
use crate::error::Result;
use crate::models::{ResolvedTarget, ScreenshotResponse};
use crate::rpc::TargetKind;

/// Screen capture and AI element lookup
pub struct ScreenshotApi<'a> {
    ctx: CallContext<'a>,
}

impl<'a> ScreenshotApi<'a> {
    pub(crate) fn new(ctx: CallContext<'a>) -> Self {
        Self { ctx }
    }

    /// Override the timeout for calls made through this handle
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.ctx = self.ctx.with_timeout(timeout);
        self
    }

    pub async fn take(&self) -> Result<ScreenshotResponse> {
        resolution::capture(&self.ctx).await
    }

    /// Locate an element on the current screen from a description such as
    /// `"Submit button"`. Fails with `ElementNotFound` rather than guessing.
    pub async fn find_ui_element(&self, description: &str) -> Result<ResolvedTarget> {
        resolution::resolve(&self.ctx, description, TargetKind::Any).await
    }
}
