use serde::{Deserialize, Serialize};

/// A point in screen space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Bounding rectangle in screen coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    pub fn is_visible(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Result of any side-effecting call (click, type, invoke, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Operation-specific value reported by the server, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_value: Option<String>,
}

impl ActionResponse {
    pub fn ok(message: Option<String>) -> Self {
        Self {
            success: true,
            message,
            result_value: None,
        }
    }
}
