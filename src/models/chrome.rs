use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Interactive element of the current tab, addressed by CSS selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromeElement {
    pub selector: String,
    #[serde(default)]
    pub tag_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

fn default_visible() -> bool {
    true
}

/// Answer of `chrome.explain_current_tab`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromeTabDetails {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_index: Option<u32>,
    #[serde(default)]
    pub elements: Vec<ChromeElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ChromeTabDetails {
    /// First visible element whose text contains `text`, case-insensitively
    pub fn element_with_text(&self, text: &str) -> Option<&ChromeElement> {
        let needle = text.to_lowercase();
        self.elements.iter().filter(|e| e.is_visible).find(|e| {
            e.text
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(&needle))
        })
    }
}

/// Answer of `chrome.execute_script` / `chrome.generate_and_execute_script`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptResponse {
    /// Whatever the script returned, as JSON; `Null` when it returned nothing
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub result: Value,
    /// Script synthesized from a task description, when one was generated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_script: Option<String>,
}
