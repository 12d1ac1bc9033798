use crate::classify::Signatures;
use crate::error::EngineError;
use crate::gesture::Shortcuts;
use crate::style::DEFAULT_LEVEL_HORIZON;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wasm_bindgen::JsValue;

/// A selector whose matches get their markup stripped on every rescan.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RescanTarget {
    pub selector: String,
    /// Process even when the text has no formatting trigger.
    #[serde(default)]
    pub always: bool,
}

impl RescanTarget {
    fn new(selector: &str, always: bool) -> Self {
        Self {
            selector: selector.to_string(),
            always,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Selectors {
    pub rescan_targets: Vec<RescanTarget>,
    /// Class names of containers whose arrival triggers a rescan.
    pub containers: Vec<String>,
    /// Class names of elements whose content is re-rendered in place.
    pub content_targets: Vec<String>,
    pub zoom_header: String,
    pub breadcrumb: String,
    pub bullet: String,
    /// One compound selector for the top-level lines of the focused editor.
    pub focused_lines: String,
    /// Class carried by every list line; `{class}-{n}` encodes the depth.
    pub list_line_class: String,
    pub task_line_class: String,
    pub ordered_marker: String,
    pub indent_guide: String,
    pub editor_line: String,
    pub content: String,
    pub scroller_class: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            rescan_targets: vec![
                RescanTarget::new(".search-result-file-matches span", false),
                RescanTarget::new(".backlink-pane .search-result-file-match span", false),
                // Only the anchor, so the backlink stays clickable.
                RescanTarget::new(".block-language-tasks .tasks-backlink a", false),
                RescanTarget::new(".block-language-tasks .tasks-list-text", false),
                RescanTarget::new(".zoom-plugin-title", true),
            ],
            containers: vec![
                "search-result-file-matches".to_string(),
                "backlink-pane".to_string(),
                "block-language-tasks".to_string(),
                "zoom-plugin-header".to_string(),
            ],
            content_targets: vec![
                "search-result-file-matches".to_string(),
                "search-result-file-match".to_string(),
                "block-language-tasks".to_string(),
                "tasks-list-text".to_string(),
                "zoom-plugin-header".to_string(),
            ],
            zoom_header: ".zoom-plugin-header".to_string(),
            breadcrumb: ".zoom-plugin-title".to_string(),
            bullet: ".cm-formatting-list, .list-bullet".to_string(),
            focused_lines: ".cm-content > .cm-line.HyperMD-list-line".to_string(),
            list_line_class: "HyperMD-list-line".to_string(),
            task_line_class: "HyperMD-task-line".to_string(),
            ordered_marker: ".cm-formatting-list-ol".to_string(),
            indent_guide: ".cm-hmd-list-indent .cm-indent".to_string(),
            editor_line: ".cm-line".to_string(),
            content: ".cm-content".to_string(),
            scroller_class: "cm-scroller".to_string(),
        }
    }
}

/// Deferrals, in milliseconds, that let the host finish its own render pass.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Timing {
    pub rescan_delay_ms: u64,
    pub level_delay_ms: u64,
    pub initial_rescan_ms: u64,
    pub initial_level_ms: u64,
    pub cursor_delay_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            rescan_delay_ms: 50,
            level_delay_ms: 100,
            initial_rescan_ms: 100,
            initial_level_ms: 150,
            cursor_delay_ms: 50,
        }
    }
}

impl Timing {
    pub fn rescan_delay(&self) -> Duration {
        Duration::from_millis(self.rescan_delay_ms)
    }

    pub fn level_delay(&self) -> Duration {
        Duration::from_millis(self.level_delay_ms)
    }

    pub fn cursor_delay(&self) -> Duration {
        Duration::from_millis(self.cursor_delay_ms)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub selectors: Selectors,
    pub timing: Timing,
    pub shortcuts: Shortcuts,
    pub level_horizon: u32,
    pub style_element_id: String,
    pub level_class_prefix: String,
    pub hash_attribute: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            selectors: Selectors::default(),
            timing: Timing::default(),
            shortcuts: Shortcuts::default(),
            level_horizon: DEFAULT_LEVEL_HORIZON,
            style_element_id: "zoom-level-styles".to_string(),
            level_class_prefix: "zoom-level-".to_string(),
            hash_attribute: "data-wikilink-hash".to_string(),
        }
    }
}

impl EngineConfig {
    /// Reads the options object handed over by the host; `undefined` and
    /// `null` mean defaults.
    pub fn from_js(value: JsValue) -> Result<Self, EngineError> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        serde_wasm_bindgen::from_value(value).map_err(|e| EngineError::Config(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        serde_json::from_str(text).map_err(|e| EngineError::Config(e.to_string()))
    }

    pub fn signatures(&self) -> Signatures {
        Signatures {
            containers: self.selectors.containers.clone(),
            content_targets: self.selectors.content_targets.clone(),
            list_line: self.selectors.list_line_class.clone(),
            scroller: self.selectors.scroller_class.clone(),
        }
    }
}
