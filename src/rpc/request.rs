use serde_json::{json, Map, Value};

use super::envelope::{Domain, RequestEnvelope};
use crate::keys::KeyCombo;
use crate::models::{ElementId, WindowId};

/// What a resolution call should come back with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Screen coordinates only
    Point,
    /// Coordinates or an element id, whichever the server finds
    Any,
}

impl TargetKind {
    fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Point => "point",
            TargetKind::Any => "any",
        }
    }
}

/// Every call the server understands. Unsupported domain × operation
/// pairs cannot be expressed.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    ScreenshotTake,
    ScreenshotFindUiElement {
        description: String,
        screenshot_base64: Option<String>,
        expect: TargetKind,
    },

    SystemGetOverview,
    SystemGetWindowDetails { window_id: WindowId },
    SystemOpenApplication { name: String },
    SystemOpenChrome { url: Option<String> },

    MouseMove { x: i32, y: i32 },
    MouseClick { x: i32, y: i32 },
    MouseDoubleClick { x: i32, y: i32 },
    MouseRightClick { x: i32, y: i32 },
    MouseDrag { start_x: i32, start_y: i32, end_x: i32, end_y: i32 },
    MouseScroll { x: i32, y: i32, clicks: i32 },

    KeyboardType { text: String },
    KeyboardPress { keys: KeyCombo },

    ChromeNavigate { url: String },
    ChromeExplainCurrentTab,
    ChromeClickElement { selector: String },
    ChromeSimulateInput { selector: String, text: String },
    ChromeExecuteScript { script: String },
    ChromeGenerateAndExecuteScript { task_description: String },

    AutomationInvoke { element_id: ElementId },
    AutomationSetValue { element_id: ElementId, value: String },
    AutomationSetFocus { element_id: ElementId },
    AutomationBringToFront { window_id: WindowId },

    CodeExecuteCSharp { code: String },
    CodeGenerateAndExecuteCSharp { task_description: String },
}

impl Request {
    pub fn domain(&self) -> Domain {
        use Request::*;
        match self {
            ScreenshotTake | ScreenshotFindUiElement { .. } => Domain::Screenshot,
            SystemGetOverview
            | SystemGetWindowDetails { .. }
            | SystemOpenApplication { .. }
            | SystemOpenChrome { .. } => Domain::System,
            MouseMove { .. }
            | MouseClick { .. }
            | MouseDoubleClick { .. }
            | MouseRightClick { .. }
            | MouseDrag { .. }
            | MouseScroll { .. } => Domain::Mouse,
            KeyboardType { .. } | KeyboardPress { .. } => Domain::Keyboard,
            ChromeNavigate { .. }
            | ChromeExplainCurrentTab
            | ChromeClickElement { .. }
            | ChromeSimulateInput { .. }
            | ChromeExecuteScript { .. }
            | ChromeGenerateAndExecuteScript { .. } => Domain::Chrome,
            AutomationInvoke { .. }
            | AutomationSetValue { .. }
            | AutomationSetFocus { .. }
            | AutomationBringToFront { .. } => Domain::Automation,
            CodeExecuteCSharp { .. } | CodeGenerateAndExecuteCSharp { .. } => Domain::Code,
        }
    }

    pub fn operation(&self) -> &'static str {
        use Request::*;
        match self {
            ScreenshotTake => "take",
            ScreenshotFindUiElement { .. } => "find_ui_element",
            SystemGetOverview => "get_overview",
            SystemGetWindowDetails { .. } => "get_window_details",
            SystemOpenApplication { .. } => "open_application",
            SystemOpenChrome { .. } => "open_chrome",
            MouseMove { .. } => "move",
            MouseClick { .. } => "click",
            MouseDoubleClick { .. } => "double_click",
            MouseRightClick { .. } => "right_click",
            MouseDrag { .. } => "drag",
            MouseScroll { .. } => "scroll",
            KeyboardType { .. } => "type",
            KeyboardPress { .. } => "press",
            ChromeNavigate { .. } => "navigate",
            ChromeExplainCurrentTab => "explain_current_tab",
            ChromeClickElement { .. } => "click_element",
            ChromeSimulateInput { .. } => "simulate_input",
            ChromeExecuteScript { .. } => "execute_script",
            ChromeGenerateAndExecuteScript { .. } => "generate_and_execute_script",
            AutomationInvoke { .. } => "invoke",
            AutomationSetValue { .. } => "set_value",
            AutomationSetFocus { .. } => "set_focus",
            AutomationBringToFront { .. } => "bring_to_front",
            CodeExecuteCSharp { .. } => "execute_csharp",
            CodeGenerateAndExecuteCSharp { .. } => "generate_and_execute_csharp",
        }
    }

    /// Calls that wait on an external AI service on the server side
    pub fn is_ai_assisted(&self) -> bool {
        matches!(
            self,
            Request::ScreenshotFindUiElement { .. }
                | Request::ChromeGenerateAndExecuteScript { .. }
                | Request::CodeGenerateAndExecuteCSharp { .. }
        )
    }

    pub fn params(&self) -> Map<String, Value> {
        use Request::*;
        let value = match self {
            ScreenshotTake | SystemGetOverview | ChromeExplainCurrentTab => json!({}),
            ScreenshotFindUiElement {
                description,
                screenshot_base64,
                expect,
            } => {
                let mut params = json!({
                    "description": description,
                    "expect": expect.as_str(),
                });
                if let Some(image) = screenshot_base64 {
                    params["screenshot_base64"] = json!(image);
                }
                params
            }
            SystemGetWindowDetails { window_id } => json!({ "window_id": window_id }),
            SystemOpenApplication { name } => json!({ "name": name }),
            SystemOpenChrome { url } => match url {
                Some(url) => json!({ "url": url }),
                None => json!({}),
            },
            MouseMove { x, y }
            | MouseClick { x, y }
            | MouseDoubleClick { x, y }
            | MouseRightClick { x, y } => json!({ "x": x, "y": y }),
            MouseDrag {
                start_x,
                start_y,
                end_x,
                end_y,
            } => json!({
                "start_x": start_x,
                "start_y": start_y,
                "end_x": end_x,
                "end_y": end_y,
            }),
            MouseScroll { x, y, clicks } => json!({ "x": x, "y": y, "clicks": clicks }),
            KeyboardType { text } => json!({ "text": text }),
            KeyboardPress { keys } => json!({ "keys": keys.to_string() }),
            ChromeNavigate { url } => json!({ "url": url }),
            ChromeClickElement { selector } => json!({ "selector": selector }),
            ChromeSimulateInput { selector, text } => json!({ "selector": selector, "text": text }),
            ChromeExecuteScript { script } => json!({ "script": script }),
            ChromeGenerateAndExecuteScript { task_description }
            | CodeGenerateAndExecuteCSharp { task_description } => {
                json!({ "task_description": task_description })
            }
            AutomationInvoke { element_id } | AutomationSetFocus { element_id } => {
                json!({ "element_id": element_id })
            }
            AutomationSetValue { element_id, value } => {
                json!({ "element_id": element_id, "value": value })
            }
            AutomationBringToFront { window_id } => json!({ "window_id": window_id }),
            CodeExecuteCSharp { code } => json!({ "code": code }),
        };

        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    pub fn into_envelope(self) -> RequestEnvelope {
        RequestEnvelope {
            id: uuid::Uuid::new_v4().to_string(),
            domain: self.domain(),
            operation: self.operation().to_string(),
            params: self.params(),
        }
    }
}
