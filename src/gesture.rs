//! User gestures that move the zoom focus, and the outdent guard.

use crate::zoom::ZoomState;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
    /// Click on a list item's leading bullet, zooming into it.
    BulletClick,
    /// Click on a breadcrumb segment, zooming out to that ancestor.
    BreadcrumbClick,
    ZoomIn,
    ZoomOut,
}

impl Gesture {
    /// Breadcrumb and keyboard gestures can land on a level the cache
    /// already holds, so detection must not trust it.
    pub fn invalidates_cache(self) -> bool {
        !matches!(self, Gesture::BulletClick)
    }
}

impl ZoomState {
    pub fn note_gesture(&mut self, gesture: Gesture) {
        self.should_scroll_to_top = true;
        if gesture == Gesture::BreadcrumbClick {
            self.is_breadcrumb_click = true;
        }
        if gesture.invalidates_cache() {
            self.cached_level = None;
        }
    }
}

/// A key press reduced to the parts shortcuts care about.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyChord {
    pub key: String,
    /// Physical key, e.g. `Period`; stable when Shift changes `key` to `>`.
    pub code: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

/// A configurable shortcut. `key` matches either the produced key or the
/// physical key code; `mod` is satisfied by either Ctrl or Meta.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    pub key: String,
    #[serde(default, rename = "mod")]
    pub mod_key: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
}

impl Shortcut {
    pub fn new(key: &str, mod_key: bool, shift: bool) -> Self {
        Self {
            key: key.to_string(),
            mod_key,
            shift,
            alt: false,
        }
    }

    pub fn matches(&self, chord: &KeyChord) -> bool {
        (chord.key.eq_ignore_ascii_case(&self.key) || chord.code.eq_ignore_ascii_case(&self.key))
            && (chord.ctrl || chord.meta) == self.mod_key
            && chord.shift == self.shift
            && chord.alt == self.alt
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Shortcuts {
    pub zoom_in: Shortcut,
    pub zoom_out: Shortcut,
    pub outdent: Shortcut,
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            zoom_in: Shortcut::new("Period", true, false),
            zoom_out: Shortcut::new("Period", true, true),
            outdent: Shortcut::new("Tab", false, true),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyIntent {
    Zoom(Gesture),
    Outdent,
}

impl Shortcuts {
    pub fn intent(&self, chord: &KeyChord) -> Option<KeyIntent> {
        if self.zoom_in.matches(chord) {
            Some(KeyIntent::Zoom(Gesture::ZoomIn))
        } else if self.zoom_out.matches(chord) {
            Some(KeyIntent::Zoom(Gesture::ZoomOut))
        } else if self.outdent.matches(chord) {
            Some(KeyIntent::Outdent)
        } else {
            None
        }
    }
}

/// True when outdenting the edited line would lift it above the zoom root.
///
/// Only the first level under the focused item is guarded; deeper lines may
/// outdent freely because one step cannot take them out of the subtree.
pub fn should_block_outdent(focused_level: Option<u32>, line_level: Option<u32>) -> bool {
    match (focused_level, line_level) {
        (Some(focused), Some(line)) => focused.checked_add(1) == Some(line),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn chord(key: &str, code: &str, ctrl: bool, meta: bool, shift: bool) -> KeyChord {
        KeyChord {
            key: key.to_string(),
            code: code.to_string(),
            ctrl,
            meta,
            shift,
            alt: false,
        }
    }

    #[rstest]
    #[case(Some(2), Some(3), true)]
    #[case(Some(2), Some(4), false)]
    #[case(Some(2), Some(7), false)]
    #[case(Some(2), Some(2), false)]
    #[case(None, Some(3), false)]
    #[case(Some(2), None, false)]
    #[case(Some(u32::MAX), Some(u32::MAX), false)]
    #[case(Some(u32::MAX), Some(0), false)]
    fn guards_first_level_below_focus(
        #[case] focused: Option<u32>,
        #[case] line: Option<u32>,
        #[case] blocked: bool,
    ) {
        assert_eq!(should_block_outdent(focused, line), blocked);
    }

    #[test]
    fn bullet_click_keeps_cache() {
        let mut state = ZoomState {
            cached_level: Some(2),
            ..ZoomState::default()
        };
        state.note_gesture(Gesture::BulletClick);
        assert_eq!(
            state,
            ZoomState {
                cached_level: Some(2),
                should_scroll_to_top: true,
                is_breadcrumb_click: false,
            }
        );
    }

    #[test]
    fn breadcrumb_click_invalidates_and_marks_cursor() {
        let mut state = ZoomState {
            cached_level: Some(4),
            ..ZoomState::default()
        };
        state.note_gesture(Gesture::BreadcrumbClick);
        assert_eq!(
            state,
            ZoomState {
                cached_level: None,
                should_scroll_to_top: true,
                is_breadcrumb_click: true,
            }
        );
    }

    #[test]
    fn keyboard_zoom_invalidates_without_cursor() {
        let mut state = ZoomState {
            cached_level: Some(4),
            ..ZoomState::default()
        };
        state.note_gesture(Gesture::ZoomOut);
        assert_eq!(state.cached_level, None);
        assert!(state.should_scroll_to_top);
        assert!(!state.is_breadcrumb_click);
    }

    #[rstest]
    #[case(chord(".", "Period", true, false, false), Some(KeyIntent::Zoom(Gesture::ZoomIn)))]
    #[case(chord(".", "Period", false, true, false), Some(KeyIntent::Zoom(Gesture::ZoomIn)))]
    #[case(chord(">", "Period", true, false, true), Some(KeyIntent::Zoom(Gesture::ZoomOut)))]
    #[case(chord("Tab", "Tab", false, false, true), Some(KeyIntent::Outdent))]
    #[case(chord("Tab", "Tab", false, false, false), None)]
    #[case(chord(".", "Period", false, false, false), None)]
    #[case(chord(".", "NumpadDecimal", true, false, false), None)]
    fn maps_default_shortcuts(#[case] pressed: KeyChord, #[case] expected: Option<KeyIntent>) {
        assert_eq!(Shortcuts::default().intent(&pressed), expected);
    }

    #[test]
    fn shortcut_deserializes_mod_flag() {
        let shortcut: Shortcut = serde_json::from_str(r#"{"key":"]","mod":true}"#).unwrap();
        assert_eq!(shortcut, Shortcut::new("]", true, false));
    }

    #[test]
    fn produced_key_also_matches() {
        let custom = Shortcut::new("]", true, false);
        assert!(custom.matches(&chord("]", "BracketRight", true, false, false)));
    }
}
