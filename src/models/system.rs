use serde::{Deserialize, Serialize};
use std::fmt;

use super::common::Rect;

/// Opaque window identifier issued by the server.
///
/// Only `system.get_overview` / `system.get_window_details` produce these.
/// They may go stale when the UI changes, so re-fetch instead of caching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(String);

/// Opaque UI element identifier issued by the server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

macro_rules! opaque_id {
    ($name:ident) => {
        impl $name {
            /// Wrap an id previously handed out by the server
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(WindowId);
opaque_id!(ElementId);

/// Top-level window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: WindowId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub process_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable_path: Option<String>,
    #[serde(default)]
    pub bounds: Rect,
    #[serde(default)]
    pub is_foreground: bool,
    #[serde(default)]
    pub is_minimized: bool,
}

impl WindowInfo {
    pub fn display_name(&self) -> String {
        if self.title.is_empty() {
            self.process_name.clone()
        } else {
            format!("{} - {}", self.title, self.process_name)
        }
    }
}

/// Node in a window's UI automation tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
    pub id: ElementId,
    /// Button, Edit, MenuItem, CheckBox, ...
    #[serde(default)]
    pub control_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Rect>,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    #[serde(default)]
    pub is_focusable: bool,
    #[serde(default)]
    pub supports_invoke: bool,
    #[serde(default)]
    pub supports_set_value: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementInfo>,
}

fn default_true() -> bool {
    true
}

impl ElementInfo {
    pub fn new(id: ElementId, control_type: impl Into<String>) -> Self {
        Self {
            id,
            control_type: control_type.into(),
            name: None,
            automation_id: None,
            value: None,
            bounds: None,
            is_enabled: true,
            is_focusable: false,
            supports_invoke: false,
            supports_set_value: false,
            parent_id: None,
            children: Vec::new(),
        }
    }

    pub fn display_text(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.value.clone())
            .unwrap_or_else(|| self.control_type.clone())
    }

    pub fn is_interactive(&self) -> bool {
        (self.supports_invoke || self.supports_set_value || self.is_focusable) && self.is_enabled
    }

    /// Depth-first walk over this element and all descendants
    pub fn iter(&self) -> ElementIter<'_> {
        ElementIter { stack: vec![self] }
    }

    pub fn find(&self, mut pred: impl FnMut(&ElementInfo) -> bool) -> Option<&ElementInfo> {
        self.iter().find(|e| pred(*e))
    }

    pub fn find_by_id(&self, id: &ElementId) -> Option<&ElementInfo> {
        self.find(|e| &e.id == id)
    }

    /// First element whose name contains `name`, case-insensitively
    pub fn find_by_name(&self, name: &str) -> Option<&ElementInfo> {
        let needle = name.to_lowercase();
        self.find(|e| {
            e.name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&needle))
        })
    }
}

pub struct ElementIter<'a> {
    stack: Vec<&'a ElementInfo>,
}

impl<'a> Iterator for ElementIter<'a> {
    type Item = &'a ElementInfo;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromeInstance {
    pub window_id: WindowId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledProgram {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable_path: Option<String>,
}

/// Answer of `system.get_overview`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewResponse {
    #[serde(default)]
    pub windows: Vec<WindowInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_info: Option<FocusInfo>,
    #[serde(default)]
    pub chrome_instances: Vec<ChromeInstance>,
    #[serde(default)]
    pub installed_programs: Vec<InstalledProgram>,
}

impl OverviewResponse {
    pub fn focused_window(&self) -> Option<&WindowInfo> {
        let focused = self.focus_info.as_ref()?.window_id.as_ref()?;
        self.windows.iter().find(|w| &w.id == focused)
    }

    /// First window whose title contains `title`, case-insensitively
    pub fn window_by_title(&self, title: &str) -> Option<&WindowInfo> {
        let needle = title.to_lowercase();
        self.windows
            .iter()
            .find(|w| w.title.to_lowercase().contains(&needle))
    }
}

/// Answer of `system.get_window_details`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowDetailsResponse {
    pub window: WindowInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<ElementInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl WindowDetailsResponse {
    pub fn find_element(&self, id: &ElementId) -> Option<&ElementInfo> {
        self.root.as_ref()?.find_by_id(id)
    }

    pub fn elements(&self) -> impl Iterator<Item = &ElementInfo> {
        self.root.iter().flat_map(|r| r.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JsonString;

    fn window(id: &str, title: &str) -> WindowInfo {
        WindowInfo {
            id: WindowId::new(id),
            title: title.to_string(),
            process_name: "notepad.exe".to_string(),
            process_id: Some(4242),
            executable_path: None,
            bounds: Rect::new(0, 0, 800, 600),
            is_foreground: false,
            is_minimized: false,
        }
    }

    fn tree() -> ElementInfo {
        let mut root = ElementInfo::new(ElementId::new("root"), "Window");
        let mut ok = ElementInfo::new(ElementId::new("ok"), "Button");
        ok.name = Some("OK".to_string());
        ok.supports_invoke = true;
        ok.parent_id = Some(root.id.clone());
        let mut edit = ElementInfo::new(ElementId::new("edit"), "Edit");
        edit.name = Some("File name".to_string());
        edit.supports_set_value = true;
        edit.parent_id = Some(root.id.clone());
        let mut pane = ElementInfo::new(ElementId::new("pane"), "Pane");
        pane.parent_id = Some(root.id.clone());
        pane.children.push(edit);
        root.children = vec![ok, pane];
        root
    }

    #[test]
    fn test_window_list_round_trip() {
        for count in [0, 1, 5] {
            let overview = OverviewResponse {
                windows: (0..count)
                    .map(|i| window(&format!("w-{}", i), &format!("Window {}", i)))
                    .collect(),
                ..Default::default()
            };
            let json = overview.to_json_string().unwrap();
            assert_eq!(OverviewResponse::from_json_str(&json).unwrap(), overview);
        }
    }

    #[test]
    fn test_element_tree_round_trip() {
        let details = WindowDetailsResponse {
            window: window("w-1", "Save As"),
            root: Some(tree()),
            note: Some("truncated at depth 8".to_string()),
        };
        let json = details.to_json_string().unwrap();
        assert_eq!(WindowDetailsResponse::from_json_str(&json).unwrap(), details);
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&WindowId::new("0x1F")).unwrap();
        assert_eq!(json, "\"0x1F\"");
    }

    #[test]
    fn test_tree_walk_is_depth_first() {
        let root = tree();
        let order: Vec<&str> = root.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(order, vec!["root", "ok", "pane", "edit"]);
        assert_eq!(root.find_by_name("file").map(|e| e.id.as_str()), Some("edit"));
        assert!(root.find_by_id(&ElementId::new("missing")).is_none());
    }

    #[test]
    fn test_overview_lookups() {
        let overview = OverviewResponse {
            windows: vec![window("a", "Untitled - Notepad"), window("b", "Calculator")],
            focus_info: Some(FocusInfo {
                window_id: Some(WindowId::new("b")),
                element: None,
            }),
            ..Default::default()
        };
        assert_eq!(overview.focused_window().map(|w| w.id.as_str()), Some("b"));
        assert_eq!(overview.window_by_title("notepad").map(|w| w.id.as_str()), Some("a"));
    }

    #[test]
    fn test_element_defaults_when_fields_missing() {
        let element: ElementInfo = serde_json::from_str(r#"{"id":"e-1"}"#).unwrap();
        assert!(element.is_enabled);
        assert!(!element.is_interactive());
        assert_eq!(element.display_text(), "");
    }
}
