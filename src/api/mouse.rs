use std::time::Duration;

use super::{resolution, CallContext};
use crate::error::{Error, Result};
use crate::models::{ActionResponse, ResolvedTarget};
use crate::rpc::{Request, TargetKind};

/// Pointer input at coordinates or at described elements.
///
/// The `*_by_description` variants take a fresh screenshot, resolve the
/// description to a point and then issue the plain coordinate call.
pub struct MouseApi<'a> {
    ctx: CallContext<'a>,
}

impl<'a> MouseApi<'a> {
    pub(crate) fn new(ctx: CallContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.ctx = self.ctx.with_timeout(timeout);
        self
    }

    pub async fn move_to(&self, x: i32, y: i32) -> Result<ActionResponse> {
        self.ctx.call(Request::MouseMove { x, y }).await
    }

    pub async fn click(&self, x: i32, y: i32) -> Result<ActionResponse> {
        self.ctx.call(Request::MouseClick { x, y }).await
    }

    pub async fn double_click(&self, x: i32, y: i32) -> Result<ActionResponse> {
        self.ctx.call(Request::MouseDoubleClick { x, y }).await
    }

    pub async fn right_click(&self, x: i32, y: i32) -> Result<ActionResponse> {
        self.ctx.call(Request::MouseRightClick { x, y }).await
    }

    pub async fn drag(
        &self,
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
    ) -> Result<ActionResponse> {
        self.ctx
            .call(Request::MouseDrag {
                start_x,
                start_y,
                end_x,
                end_y,
            })
            .await
    }

    /// Scroll at a position; positive clicks scroll down
    pub async fn scroll(&self, x: i32, y: i32, clicks: i32) -> Result<ActionResponse> {
        if clicks == 0 {
            return Err(Error::Validation("clicks must be non-zero".to_string()));
        }
        self.ctx.call(Request::MouseScroll { x, y, clicks }).await
    }

    pub async fn click_by_description(&self, description: &str) -> Result<ActionResponse> {
        let point = resolution::resolve_point(&self.ctx, description).await?;
        self.click(point.x, point.y).await
    }

    pub async fn double_click_by_description(&self, description: &str) -> Result<ActionResponse> {
        let point = resolution::resolve_point(&self.ctx, description).await?;
        self.double_click(point.x, point.y).await
    }

    pub async fn right_click_by_description(&self, description: &str) -> Result<ActionResponse> {
        let point = resolution::resolve_point(&self.ctx, description).await?;
        self.right_click(point.x, point.y).await
    }

    /// Drag from one described element to another. Both ends are resolved
    /// against the same screenshot.
    pub async fn drag_by_description(
        &self,
        source_description: &str,
        target_description: &str,
    ) -> Result<ActionResponse> {
        super::require_text("source_description", source_description)?;
        super::require_text("target_description", target_description)?;

        let screenshot = resolution::capture(&self.ctx).await?;
        let mut points = Vec::with_capacity(2);
        for description in [source_description, target_description] {
            let target =
                resolution::resolve_against(&self.ctx, description, &screenshot, TargetKind::Point)
                    .await?;
            match target {
                ResolvedTarget::Point(point) => points.push(point),
                ResolvedTarget::Element { .. } => return Err(resolution::no_location(description)),
            }
        }

        let (from, to) = (points[0], points[1]);
        self.drag(from.x, from.y, to.x, to.y).await
    }
}
