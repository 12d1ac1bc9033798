//! Browser implementations of the engine's document traits.

use crate::classify::{ChangeKind, ChangeRecord, WatchedNode};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::gesture::{should_block_outdent, Gesture, KeyChord};
use crate::spans::{refresh_container, SpanContainer, TextSpan};
use crate::style::{parse_ordered_marker, LineShape, StyleScope};
use crate::zoom::{level_from_class, Outline};
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlElement, KeyboardEvent, MouseEvent, MutationRecord, Node, NodeList,
};

/// `NodeFilter.SHOW_TEXT`
const SHOW_TEXT: u32 = 0x4;

#[derive(Clone, Debug)]
pub struct DomNode(pub Element);

impl WatchedNode for DomNode {
    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }

    fn has_descendant(&self, class: &str) -> bool {
        matches!(self.0.query_selector(&format!(".{class}")), Ok(Some(_)))
    }

    fn is_within(&self, class: &str) -> bool {
        matches!(self.0.closest(&format!(".{class}")), Ok(Some(_)))
    }
}

/// Converts the records handed to a `MutationObserver` callback. Records whose
/// target is not an element are dropped.
pub fn change_records(records: &js_sys::Array) -> Vec<ChangeRecord<DomNode>> {
    records
        .iter()
        .filter_map(|value| {
            let record = value.dyn_into::<MutationRecord>().ok()?;
            let target = record.target()?.dyn_into::<Element>().ok()?;
            let kind = match record.type_().as_str() {
                "attributes" => ChangeKind::Attributes,
                _ => ChangeKind::ChildList,
            };
            let added = nodes(&record.added_nodes())
                .filter_map(|node| node.dyn_into::<Element>().ok())
                .map(DomNode)
                .collect();
            Some(ChangeRecord {
                kind,
                target: DomNode(target),
                added,
                attribute: record.attribute_name(),
            })
        })
        .collect()
}

fn nodes(list: &NodeList) -> impl Iterator<Item = Node> + '_ {
    (0..list.length()).filter_map(move |i| list.item(i))
}

/// A rescan span: the matched element itself, or one of its text nodes.
enum DomSpan<'a> {
    /// Stamped with the fingerprint attribute after each write.
    Element {
        element: Element,
        hash_attribute: &'a str,
    },
    /// Text nodes cannot hold attributes; rewriting is idempotent so they
    /// are simply checked again each pass.
    Text(Node),
}

impl TextSpan for DomSpan<'_> {
    fn text(&self) -> String {
        match self {
            DomSpan::Element { element, .. } => element.text_content(),
            DomSpan::Text(node) => node.text_content(),
        }
        .unwrap_or_default()
    }

    fn write(&self, text: &str) {
        match self {
            DomSpan::Element { element, .. } => element.set_text_content(Some(text)),
            DomSpan::Text(node) => node.set_text_content(Some(text)),
        }
    }

    fn fingerprint(&self) -> Option<String> {
        match self {
            DomSpan::Element {
                element,
                hash_attribute,
            } => element.get_attribute(hash_attribute),
            DomSpan::Text(_) => None,
        }
    }

    fn stamp(&self, fingerprint: &str) {
        if let DomSpan::Element {
            element,
            hash_attribute,
        } = self
        {
            if let Err(err) = element.set_attribute(hash_attribute, fingerprint) {
                tracing::trace!(?err, "could not stamp span");
            }
        }
    }
}

struct MatchedElement<'a> {
    element: Element,
    hash_attribute: &'a str,
}

impl<'a> SpanContainer for MatchedElement<'a> {
    type Span = DomSpan<'a>;

    fn as_leaf(&self) -> Option<DomSpan<'a>> {
        (self.element.child_element_count() == 0).then(|| DomSpan::Element {
            element: self.element.clone(),
            hash_attribute: self.hash_attribute,
        })
    }

    fn text_children(&self) -> Vec<DomSpan<'a>> {
        nodes(&self.element.child_nodes())
            .filter(|node| node.node_type() == Node::TEXT_NODE)
            .map(DomSpan::Text)
            .collect()
    }
}

/// Strips markup from every element matched by the configured rescan targets.
pub fn rescan(document: &Document, config: &EngineConfig) -> usize {
    let mut rewritten = 0;
    for target in &config.selectors.rescan_targets {
        let matches = match document.query_selector_all(&target.selector) {
            Ok(list) => list,
            Err(err) => {
                tracing::warn!(selector = %target.selector, ?err, "bad rescan selector");
                continue;
            }
        };
        for node in nodes(&matches) {
            let Ok(element) = node.dyn_into::<Element>() else {
                continue;
            };
            let container = MatchedElement {
                element,
                hash_attribute: &config.hash_attribute,
            };
            rewritten += refresh_container(&container, target.always);
        }
    }
    if rewritten > 0 {
        tracing::debug!(rewritten, "stripped markup from spans");
    }
    rewritten
}

pub struct WebOutline<'a> {
    document: Document,
    config: &'a EngineConfig,
}

impl<'a> WebOutline<'a> {
    pub fn new(document: Document, config: &'a EngineConfig) -> Self {
        Self { document, config }
    }

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }
}

impl Outline for WebOutline<'_> {
    type Line = HtmlElement;

    fn has_zoom_header(&self) -> bool {
        self.query(&self.config.selectors.zoom_header).is_some()
    }

    fn first_visible_line(&self) -> Option<HtmlElement> {
        let lines = self
            .document
            .query_selector_all(&self.config.selectors.focused_lines)
            .ok()?;
        // Folded and zoomed-out lines stay in the tree but get no layout box.
        let first = nodes(&lines)
            .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
            .find(|line| line.offset_parent().is_some());
        first
    }

    fn line_level(&self, line: &HtmlElement) -> Option<u32> {
        level_from_class(&line.class_name(), &self.config.selectors.list_line_class)
    }

    fn line_shape_at(&self, level: u32) -> Option<LineShape> {
        let selectors = &self.config.selectors;
        let lines = self
            .document
            .query_selector_all(&format!(
                "{}.{}-{level}",
                selectors.focused_lines, selectors.list_line_class
            ))
            .ok()?;
        let shapes = nodes(&lines)
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|line| LineShape {
                ordered_marker: line
                    .query_selector(&selectors.ordered_marker)
                    .ok()
                    .flatten()
                    .and_then(|marker| marker.text_content())
                    .and_then(|text| parse_ordered_marker(&text)),
                is_task: line.class_list().contains(&selectors.task_line_class),
            });
        let shape = LineShape::across(shapes);
        shape
    }

    fn set_level_marker(&self, level: Option<u32>) {
        let Some(body) = self.document.body() else {
            return;
        };
        let classes = body.class_list();
        let prefix = &self.config.level_class_prefix;
        let stale: Vec<String> = (0..classes.length())
            .filter_map(|i| classes.item(i))
            .filter(|class| class.starts_with(prefix.as_str()))
            .collect();
        for class in stale {
            if let Err(err) = classes.remove_1(&class) {
                let error = EngineError::from(err);
                tracing::warn!(%class, %error, "could not clear zoom level class");
            }
        }
        if let Some(level) = level {
            if let Err(err) = classes.add_1(&format!("{prefix}{level}")) {
                let error = EngineError::from(err);
                tracing::warn!(level, %error, "could not set zoom level class");
            }
        }
    }

    fn apply_stylesheet(&self, css: &str) {
        let id = &self.config.style_element_id;
        if let Some(existing) = self.document.get_element_by_id(id) {
            existing.set_text_content(Some(css));
            return;
        }
        let inserted = self.document.create_element("style").and_then(|style| {
            style.set_id(id);
            style.set_text_content(Some(css));
            let head = self
                .document
                .head()
                .ok_or_else(|| wasm_bindgen::JsValue::from_str("document has no head"))?;
            head.append_child(&style)
        });
        if let Err(err) = inserted {
            tracing::warn!(error = %EngineError::from(err), "could not insert zoom stylesheet");
        }
    }

    fn remove_stylesheet(&self) {
        if let Some(existing) = self.document.get_element_by_id(&self.config.style_element_id) {
            existing.remove();
        }
    }

    fn style_scope(&self) -> StyleScope<'_> {
        StyleScope {
            level_class_prefix: &self.config.level_class_prefix,
            list_line_class: &self.config.selectors.list_line_class,
            indent_guide: &self.config.selectors.indent_guide,
        }
    }
}

pub fn scroll_to_top(line: &HtmlElement) {
    line.scroll_into_view_with_bool(true);
}

/// Puts the caret after the last visible character of `line` and focuses the
/// editing surface.
pub fn place_cursor_at_end(
    document: &Document,
    line: &HtmlElement,
    content_selector: &str,
) -> Result<(), EngineError> {
    let walker = document.create_tree_walker_with_what_to_show(line, SHOW_TEXT)?;
    let mut target: Option<(Node, u32)> = None;
    while let Some(node) = walker.next_node()? {
        let text = node.text_content().unwrap_or_default();
        let visible = text.trim_end();
        if !visible.is_empty() {
            let offset = visible.encode_utf16().count() as u32;
            target = Some((node, offset));
        }
    }
    let (node, offset) = target.ok_or(EngineError::MissingElement("text run in focused line"))?;

    let range = document
        .create_range()
        .map_err(|e| EngineError::Selection(format!("{e:?}")))?;
    range
        .set_start(&node, offset)
        .map_err(|e| EngineError::Selection(format!("{e:?}")))?;
    range.collapse_with_to_start(true);

    let selection = leptos::prelude::window()
        .get_selection()
        .map_err(|e| EngineError::Selection(format!("{e:?}")))?
        .ok_or_else(|| EngineError::Selection("no selection object".to_string()))?;
    selection
        .remove_all_ranges()
        .map_err(|e| EngineError::Selection(format!("{e:?}")))?;
    selection
        .add_range(&range)
        .map_err(|e| EngineError::Selection(format!("{e:?}")))?;

    let content = document
        .query_selector(content_selector)?
        .ok_or(EngineError::MissingElement("editor content"))?;
    content
        .dyn_into::<HtmlElement>()
        .map_err(|_| EngineError::MissingElement("editor content"))?
        .focus()?;
    Ok(())
}

/// Depth of the list line holding the caret, if it sits in one.
pub fn edited_line_level(config: &EngineConfig) -> Option<u32> {
    let selection = leptos::prelude::window().get_selection().ok()??;
    let anchor = selection.anchor_node()?;
    let element = match anchor.dyn_ref::<Element>() {
        Some(element) => element.clone(),
        None => anchor.parent_element()?,
    };
    let line = element.closest(&config.selectors.editor_line).ok()??;
    level_from_class(&line.class_name(), &config.selectors.list_line_class)
}

/// Cancels an outdent that would lift the edited line out of the zoomed
/// subtree. Returns whether the event was cancelled.
pub fn guard_outdent(
    event: &KeyboardEvent,
    focused_level: Option<u32>,
    config: &EngineConfig,
) -> bool {
    if focused_level.is_none() {
        return false;
    }
    let line = edited_line_level(config);
    if !should_block_outdent(focused_level, line) {
        return false;
    }
    event.prevent_default();
    event.stop_immediate_propagation();
    tracing::debug!(?focused_level, ?line, "outdent blocked at zoom root");
    true
}

pub fn key_chord(event: &KeyboardEvent) -> KeyChord {
    KeyChord {
        key: event.key(),
        code: event.code(),
        ctrl: event.ctrl_key(),
        meta: event.meta_key(),
        shift: event.shift_key(),
        alt: event.alt_key(),
    }
}

/// Classifies a click as a zoom gesture by what was clicked.
pub fn click_gesture(event: &MouseEvent, config: &EngineConfig) -> Option<Gesture> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    if matches!(target.closest(&config.selectors.breadcrumb), Ok(Some(_))) {
        Some(Gesture::BreadcrumbClick)
    } else if matches!(target.closest(&config.selectors.bullet), Ok(Some(_))) {
        Some(Gesture::BulletClick)
    } else {
        None
    }
}
