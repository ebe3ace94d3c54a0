//! Natural-language description → screen location.
//!
//! The server forwards the description and a fresh screenshot to the vision
//! service. Every call resolves again; screen state may have changed since
//! the last one, so nothing is cached.

use super::{require_text, CallContext};
use crate::error::{Error, Result};
use crate::models::{ResolutionResponse, ResolutionStatus, ResolvedTarget, ScreenshotResponse};
use crate::rpc::{Request, TargetKind};

/// Capture the screen, then resolve `description` against it
pub(crate) async fn resolve(
    ctx: &CallContext<'_>,
    description: &str,
    expect: TargetKind,
) -> Result<ResolvedTarget> {
    require_text("description", description)?;
    let screenshot = capture(ctx).await?;
    resolve_against(ctx, description, &screenshot, expect).await
}

pub(crate) async fn capture(ctx: &CallContext<'_>) -> Result<ScreenshotResponse> {
    ctx.call(Request::ScreenshotTake).await
}

/// Resolve against an already captured screenshot
pub(crate) async fn resolve_against(
    ctx: &CallContext<'_>,
    description: &str,
    screenshot: &ScreenshotResponse,
    expect: TargetKind,
) -> Result<ResolvedTarget> {
    require_text("description", description)?;

    let response: ResolutionResponse = ctx
        .call(Request::ScreenshotFindUiElement {
            description: description.to_string(),
            screenshot_base64: Some(screenshot.image_base64.clone()),
            expect,
        })
        .await?;

    interpret(description, response, expect)
}

/// Resolve to a point; element-only answers are not usable for pointer input
pub(crate) async fn resolve_point(
    ctx: &CallContext<'_>,
    description: &str,
) -> Result<crate::models::Coordinate> {
    match resolve(ctx, description, TargetKind::Point).await? {
        ResolvedTarget::Point(point) => Ok(point),
        ResolvedTarget::Element { .. } => Err(no_location(description)),
    }
}

fn interpret(
    description: &str,
    response: ResolutionResponse,
    expect: TargetKind,
) -> Result<ResolvedTarget> {
    if response.status == ResolutionStatus::NoMatch {
        tracing::debug!("No match for {:?}: {:?}", description, response.message);
        return Err(Error::ElementNotFound {
            description: description.to_string(),
            message: response.message,
        });
    }

    if let Some(point) = response.coordinate() {
        return Ok(ResolvedTarget::Point(point));
    }

    match (expect, response.element_id) {
        (TargetKind::Any, Some(id)) => Ok(ResolvedTarget::Element { id }),
        _ => Err(no_location(description)),
    }
}

pub(crate) fn no_location(description: &str) -> Error {
    Error::ElementNotFound {
        description: description.to_string(),
        message: Some("match carried no usable location".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, ElementId};

    fn response(status: ResolutionStatus) -> ResolutionResponse {
        ResolutionResponse {
            status,
            x: None,
            y: None,
            element_id: None,
            message: None,
        }
    }

    #[test]
    fn test_no_match_is_element_not_found() {
        let mut miss = response(ResolutionStatus::NoMatch);
        miss.message = Some("nothing like that on screen".to_string());
        miss.x = Some(1);
        miss.y = Some(1);

        match interpret("Nonexistent Button XYZ", miss, TargetKind::Any) {
            Err(Error::ElementNotFound {
                description,
                message,
            }) => {
                assert_eq!(description, "Nonexistent Button XYZ");
                assert_eq!(message.as_deref(), Some("nothing like that on screen"));
            }
            other => panic!("expected ElementNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_match_with_coordinates() {
        let mut hit = response(ResolutionStatus::Match);
        hit.x = Some(512);
        hit.y = Some(300);
        assert_eq!(
            interpret("Submit", hit, TargetKind::Point).unwrap(),
            ResolvedTarget::Point(Coordinate::new(512, 300))
        );
    }

    #[test]
    fn test_element_only_match_depends_on_expectation() {
        let mut hit = response(ResolutionStatus::Match);
        hit.element_id = Some(ElementId::new("e-9"));

        assert_eq!(
            interpret("Username", hit.clone(), TargetKind::Any).unwrap(),
            ResolvedTarget::Element {
                id: ElementId::new("e-9")
            }
        );
        assert!(matches!(
            interpret("Username", hit, TargetKind::Point),
            Err(Error::ElementNotFound { .. })
        ));
    }
}
