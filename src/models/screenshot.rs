use base64::Engine;
use serde::{Deserialize, Serialize};

use super::common::Coordinate;
use super::system::ElementId;

/// A captured screen image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotResponse {
    /// PNG bytes, base64-encoded
    pub image_base64: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ScreenshotResponse {
    /// Decode the image into raw bytes
    pub fn image_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(&self.image_base64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    Match,
    NoMatch,
}

/// Raw answer of `screenshot.find_ui_element`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResponse {
    pub status: ResolutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ResolutionResponse {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.status, self.x, self.y) {
            (ResolutionStatus::Match, Some(x), Some(y)) => Some(Coordinate::new(x, y)),
            _ => None,
        }
    }
}

/// Where a natural-language description landed on screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedTarget {
    Point(Coordinate),
    Element { id: ElementId },
}

impl ResolvedTarget {
    pub fn as_point(&self) -> Option<Coordinate> {
        match self {
            ResolvedTarget::Point(c) => Some(*c),
            ResolvedTarget::Element { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JsonString;

    #[test]
    fn test_image_bytes() {
        let shot = ScreenshotResponse {
            image_base64: "iVBORw0K".to_string(),
            timestamp: None,
            width: None,
            height: None,
        };
        assert_eq!(shot.image_bytes().unwrap(), vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a]);
    }

    #[test]
    fn test_screenshot_round_trip() {
        let shot = ScreenshotResponse {
            image_base64: "iVBORw0K".to_string(),
            timestamp: Some("2024-05-01T12:00:00Z".to_string()),
            width: Some(1920),
            height: Some(1080),
        };
        let json = shot.to_json_string().unwrap();
        assert_eq!(ScreenshotResponse::from_json_str(&json).unwrap(), shot);
    }

    #[test]
    fn test_resolution_response_round_trip() {
        let answers = [
            ResolutionResponse {
                status: ResolutionStatus::Match,
                x: Some(512),
                y: Some(300),
                element_id: None,
                message: None,
            },
            ResolutionResponse {
                status: ResolutionStatus::Match,
                x: None,
                y: None,
                element_id: Some(ElementId::new("e-7")),
                message: Some("Name field".to_string()),
            },
            ResolutionResponse {
                status: ResolutionStatus::NoMatch,
                x: None,
                y: None,
                element_id: None,
                message: Some("nothing like that on screen".to_string()),
            },
        ];
        for answer in answers {
            let json = answer.to_json_string().unwrap();
            assert_eq!(ResolutionResponse::from_json_str(&json).unwrap(), answer);
        }
    }

    #[test]
    fn test_resolution_coordinate_requires_match() {
        let hit: ResolutionResponse =
            serde_json::from_str(r#"{"status":"match","x":512,"y":300}"#).unwrap();
        assert_eq!(hit.coordinate(), Some(Coordinate::new(512, 300)));

        let miss: ResolutionResponse =
            serde_json::from_str(r#"{"status":"no_match","x":1,"y":2,"message":"nothing"}"#)
                .unwrap();
        assert_eq!(miss.coordinate(), None);
    }

    #[test]
    fn test_resolved_target_json() {
        let target = ResolvedTarget::Point(Coordinate::new(4, 5));
        let json = target.to_json_string().unwrap();
        assert_eq!(json, r#"{"kind":"point","x":4,"y":5}"#);
        assert_eq!(ResolvedTarget::from_json_str(&json).unwrap(), target);

        let element = ResolvedTarget::Element {
            id: ElementId::new("e-7"),
        };
        let json = element.to_json_string().unwrap();
        assert_eq!(ResolvedTarget::from_json_str(&json).unwrap(), element);
    }
}
