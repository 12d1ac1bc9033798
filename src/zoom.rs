//! Zoom level detection and the state it carries between mutation batches.

use crate::style::{generate_stylesheet, LineShape, ListKind, StyleScope};
use regex::Regex;
use std::sync::OnceLock;

/// State shared between gesture handlers and [`ZoomSync`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ZoomState {
    /// `None` whenever no zoom view is active.
    pub cached_level: Option<u32>,
    pub should_scroll_to_top: bool,
    pub is_breadcrumb_click: bool,
}

/// The document operations the synchronizer relies on.
pub trait Outline {
    type Line: Clone;

    /// Whether the zoom view's breadcrumb header is rendered.
    fn has_zoom_header(&self) -> bool;

    /// First focused list line in document order that has a layout box.
    fn first_visible_line(&self) -> Option<Self::Line>;

    fn line_level(&self, line: &Self::Line) -> Option<u32>;

    /// Shape of the line currently rendered at an absolute depth.
    fn line_shape_at(&self, level: u32) -> Option<LineShape>;

    /// Replaces any level marker on the document root; `None` removes it.
    fn set_level_marker(&self, level: Option<u32>);

    fn apply_stylesheet(&self, css: &str);

    fn remove_stylesheet(&self);

    fn style_scope(&self) -> StyleScope<'_>;
}

/// Scroll (and maybe caret) work owed to a gesture, carried out by the caller
/// once the host has painted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FocusRequest<L> {
    pub line: L,
    pub place_cursor: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome<L> {
    Inactive,
    Cached(u32),
    Detected {
        level: u32,
        focus: Option<FocusRequest<L>>,
    },
    /// Zoom is showing but no level could be read this cycle.
    Skipped,
}

pub struct ZoomSync {
    state: ZoomState,
    horizon: u32,
}

impl ZoomSync {
    pub fn new(horizon: u32) -> Self {
        Self {
            state: ZoomState::default(),
            horizon,
        }
    }

    pub fn state(&self) -> ZoomState {
        self.state
    }

    pub fn state_mut(&mut self) -> &mut ZoomState {
        &mut self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.cached_level.is_some()
    }

    /// Brings the root marker and stylesheet in line with the zoom view.
    ///
    /// With `force == false` a cached level is trusted as-is, which keeps the
    /// level from flickering while the editor re-renders lines during scroll.
    pub fn sync<O: Outline>(&mut self, outline: &O, force: bool) -> SyncOutcome<O::Line> {
        if !outline.has_zoom_header() {
            self.deactivate(outline);
            return SyncOutcome::Inactive;
        }

        if !force {
            if let Some(level) = self.state.cached_level {
                return SyncOutcome::Cached(level);
            }
        }

        let Some(line) = outline.first_visible_line() else {
            tracing::trace!("zoom header present but no visible list line");
            return SyncOutcome::Skipped;
        };
        let Some(level) = outline.line_level(&line) else {
            tracing::trace!("focused line carries no level class");
            return SyncOutcome::Skipped;
        };

        outline.set_level_marker(Some(level));
        let css = generate_stylesheet(level, self.horizon, &outline.style_scope(), |depth| {
            outline
                .line_shape_at(depth)
                .map_or(ListKind::Unordered, LineShape::kind)
        });
        outline.apply_stylesheet(&css);
        if self.state.cached_level != Some(level) {
            tracing::debug!(level, "zoom level changed");
        }
        self.state.cached_level = Some(level);

        let focus = self.state.should_scroll_to_top.then(|| FocusRequest {
            line,
            place_cursor: self.state.is_breadcrumb_click,
        });
        self.state.should_scroll_to_top = false;
        self.state.is_breadcrumb_click = false;

        SyncOutcome::Detected { level, focus }
    }

    /// Drops every trace of the zoom view: cache, pending gesture flags,
    /// root marker and stylesheet.
    pub fn deactivate<O: Outline>(&mut self, outline: &O) {
        if self.state.cached_level.is_some() {
            tracing::debug!("zoom view closed");
        }
        self.state = ZoomState::default();
        outline.set_level_marker(None);
        outline.remove_stylesheet();
    }
}

/// Extracts the nesting depth from a class list such as
/// `"cm-line HyperMD-list-line HyperMD-list-line-3"`.
pub fn level_from_class(class_name: &str, list_line_class: &str) -> Option<u32> {
    static RE_LEVEL: OnceLock<Regex> = OnceLock::new();
    let re_level = RE_LEVEL.get_or_init(|| Regex::new(r"^(.+)-(\d+)$").unwrap());

    class_name.split_whitespace().find_map(|class| {
        let cap = re_level.captures(class)?;
        if cap.get(1).map(|m| m.as_str()) != Some(list_line_class) {
            return None;
        }
        cap.get(2)?.as_str().parse().ok().filter(|level| *level > 0)
    })
}
