//! Depth-indexed indentation overrides for the zoom view.
//!
//! The editor indents list lines by absolute nesting depth. When a subtree is
//! zoomed, its root should sit where a top-level item would, so every depth
//! from the focused level downwards gets its indent re-pinned relative to the
//! focused level, and the guides for the hidden ancestors are switched off.

use std::fmt::Write;

/// Width of one nesting step in the editor's list layout, in px.
pub const INDENT_UNIT: i32 = 36;

/// How many levels below the focused one receive an override.
pub const DEFAULT_LEVEL_HORIZON: u32 = 50;

/// Upper bound on a configured horizon; deeper outlines are not rendered.
pub const MAX_LEVEL_HORIZON: u32 = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    Unordered,
    Task,
    OrderedSingle,
    OrderedDouble,
}

/// Base hanging indent of a top-level line of a given list kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListTypeProfile {
    pub text_indent: i32,
    pub padding: i32,
    pub unit: i32,
}

impl ListKind {
    pub const fn profile(self) -> ListTypeProfile {
        match self {
            ListKind::Unordered => ListTypeProfile {
                text_indent: -22,
                padding: 22,
                unit: INDENT_UNIT,
            },
            ListKind::Task => ListTypeProfile {
                text_indent: -44,
                padding: 44,
                unit: INDENT_UNIT,
            },
            ListKind::OrderedSingle => ListTypeProfile {
                text_indent: -26,
                padding: 26,
                unit: INDENT_UNIT,
            },
            ListKind::OrderedDouble => ListTypeProfile {
                text_indent: -34,
                padding: 34,
                unit: INDENT_UNIT,
            },
        }
    }
}

/// What a rendered list line tells us about its list kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineShape {
    /// Number in the ordered-list marker, e.g. `12` for `12. `.
    pub ordered_marker: Option<u32>,
    pub is_task: bool,
}

impl LineShape {
    pub fn kind(self) -> ListKind {
        match self.ordered_marker {
            Some(n) if n >= 10 => ListKind::OrderedDouble,
            Some(_) => ListKind::OrderedSingle,
            None if self.is_task => ListKind::Task,
            None => ListKind::Unordered,
        }
    }

    /// Folds the shapes of every line at one depth into the shape that depth
    /// is styled by: the widest ordered marker wins, and one task line makes
    /// the depth a task depth. `None` when there are no lines.
    pub fn across(shapes: impl IntoIterator<Item = LineShape>) -> Option<LineShape> {
        shapes.into_iter().reduce(|acc, shape| LineShape {
            ordered_marker: acc.ordered_marker.max(shape.ordered_marker),
            is_task: acc.is_task || shape.is_task,
        })
    }
}

/// Reads the number out of an ordered-list marker such as `"12. "`.
pub fn parse_ordered_marker(marker: &str) -> Option<u32> {
    let digits: String = marker
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Class names and selectors the generated rules are written against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleScope<'a> {
    pub level_class_prefix: &'a str,
    pub list_line_class: &'a str,
    pub indent_guide: &'a str,
}

/// Builds the stylesheet for a zoom focused at `focused` (1-based).
///
/// `kind_at` reports the list kind of the line at an absolute depth. The output
/// depends only on its inputs, so regenerating it is always safe.
pub fn generate_stylesheet(
    focused: u32,
    horizon: u32,
    scope: &StyleScope<'_>,
    kind_at: impl Fn(u32) -> ListKind,
) -> String {
    let focused = focused.max(1);
    let horizon = horizon.min(MAX_LEVEL_HORIZON);
    let root = format!("body.{}{focused}", scope.level_class_prefix);
    let mut css = String::new();

    for absolute in focused..=focused.saturating_add(horizon) {
        let profile = kind_at(absolute).profile();
        let steps = i32::try_from(absolute - focused).unwrap_or(i32::MAX);
        let shift = steps.saturating_mul(profile.unit);
        let indent = profile.text_indent.saturating_sub(shift);
        let padding = profile.padding.saturating_add(shift);
        let _ = writeln!(
            css,
            "{root} .{line}-{absolute} {{ text-indent: {indent}px !important; padding-inline-start: {padding}px !important; }}",
            line = scope.list_line_class,
        );
    }

    if focused > 1 {
        let hidden = focused - 1;
        let _ = writeln!(
            css,
            "{root} .{line}-{focused} {guide}:nth-child(-n+{hidden}) {{ display: none !important; }}",
            line = scope.list_line_class,
            guide = scope.indent_guide,
        );
    }
    css
}
