use std::time::Duration;

use super::{require_non_empty, resolution, CallContext};
use crate::error::Result;
use crate::keys::KeyCombo;
use crate::models::{ActionResponse, ResolvedTarget};
use crate::rpc::{Request, TargetKind};

pub struct KeyboardApi<'a> {
    ctx: CallContext<'a>,
}

impl<'a> KeyboardApi<'a> {
    pub(crate) fn new(ctx: CallContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.ctx = self.ctx.with_timeout(timeout);
        self
    }

    /// Type text at the current focus
    pub async fn type_text(&self, text: &str) -> Result<ActionResponse> {
        require_non_empty("text", text)?;
        self.ctx
            .call(Request::KeyboardType {
                text: text.to_string(),
            })
            .await
    }

    /// Press a key combination such as `"Ctrl+C"` (see [`crate::keys`])
    pub async fn press(&self, keys: &str) -> Result<ActionResponse> {
        let keys: KeyCombo = keys.parse()?;
        self.ctx.call(Request::KeyboardPress { keys }).await
    }

    /// Focus the described element, then type into it.
    ///
    /// A point answer is clicked; an element answer gets `automation.set_focus`.
    pub async fn type_at_element(&self, description: &str, text: &str) -> Result<ActionResponse> {
        require_non_empty("text", text)?;

        match resolution::resolve(&self.ctx, description, TargetKind::Any).await? {
            ResolvedTarget::Point(point) => {
                let _: ActionResponse = self
                    .ctx
                    .call(Request::MouseClick {
                        x: point.x,
                        y: point.y,
                    })
                    .await?;
            }
            ResolvedTarget::Element { id } => {
                let _: ActionResponse = self
                    .ctx
                    .call(Request::AutomationSetFocus { element_id: id })
                    .await?;
            }
        }

        self.type_text(text).await
    }
}
