//! Browser tests for the DOM side of the engine.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use bracketless::config::EngineConfig;
use bracketless::dom::{guard_outdent, key_chord, rescan, WebOutline};
use bracketless::gesture::KeyIntent;
use bracketless::zoom::{Outline, SyncOutcome, ZoomSync};
use bracketless::{fingerprint, Engine};
use web_sys::{Document, Element, KeyboardEvent, KeyboardEventInit};

fn document() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

/// Markup mounted under `<body>` for the duration of one test.
struct Fixture(Element);

impl Fixture {
    fn mount(html: &str) -> Self {
        let doc = document();
        let root = doc.create_element("div").unwrap();
        root.set_inner_html(html);
        doc.body().unwrap().append_child(&root).unwrap();
        Fixture(root)
    }

    fn find(&self, selector: &str) -> Element {
        self.0.query_selector(selector).unwrap().unwrap()
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        self.0.remove();
    }
}

fn style_elements() -> u32 {
    document()
        .query_selector_all("#zoom-level-styles")
        .unwrap()
        .length()
}

fn shift_tab() -> KeyboardEvent {
    let init = KeyboardEventInit::new();
    init.set_key("Tab");
    init.set_code("Tab");
    init.set_shift_key(true);
    init.set_bubbles(true);
    init.set_cancelable(true);
    KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).unwrap()
}

fn put_caret_in(line: &Element) {
    let anchor = line.first_child().unwrap();
    let range = document().create_range().unwrap();
    range.set_start(&anchor, 1).unwrap();
    range.collapse_with_to_start(true);
    let selection = web_sys::window().unwrap().get_selection().unwrap().unwrap();
    selection.remove_all_ranges().unwrap();
    selection.add_range(&range).unwrap();
}

fn zoomed_outline(focused: u32, numbered_children: u32) -> String {
    let mut html = format!(
        r#"<div class="zoom-plugin-header"><span class="zoom-plugin-title">Root</span></div>
        <div class="cm-content">
        <div class="cm-line HyperMD-list-line HyperMD-list-line-{focused}">Focused</div>"#
    );
    let child = focused + 1;
    for n in 1..=numbered_children {
        html.push_str(&format!(
            r#"<div class="cm-line HyperMD-list-line HyperMD-list-line-{child}"><span class="cm-formatting-list-ol">{n}. </span>item</div>"#
        ));
    }
    html.push_str("</div>");
    html
}

// === Stylesheet ===

#[wasm_bindgen_test]
fn test_stylesheet_is_replaced_in_place() {
    let config = EngineConfig::default();
    let outline = WebOutline::new(document(), &config);

    outline.apply_stylesheet("body { color: red; }");
    outline.apply_stylesheet("body { color: blue; }");
    assert_eq!(style_elements(), 1);
    let sheet = document().get_element_by_id("zoom-level-styles").unwrap();
    assert_eq!(sheet.text_content().as_deref(), Some("body { color: blue; }"));

    outline.remove_stylesheet();
    assert_eq!(style_elements(), 0);
}

#[wasm_bindgen_test]
fn test_sync_marks_body_and_sizes_long_ordered_lists() {
    let _fixture = Fixture::mount(&zoomed_outline(3, 12));
    let config = EngineConfig::default();
    let outline = WebOutline::new(document(), &config);
    let mut sync = ZoomSync::new(config.level_horizon);

    assert!(matches!(sync.sync(&outline, true), SyncOutcome::Detected { level: 3, .. }));
    assert!(matches!(sync.sync(&outline, true), SyncOutcome::Detected { level: 3, .. }));
    assert_eq!(style_elements(), 1);
    assert!(document().body().unwrap().class_list().contains("zoom-level-3"));

    let css = document()
        .get_element_by_id("zoom-level-styles")
        .unwrap()
        .text_content()
        .unwrap();
    assert!(css.contains(
        ".HyperMD-list-line-4 { text-indent: -70px !important; padding-inline-start: 70px !important; }"
    ));

    sync.deactivate(&outline);
    assert_eq!(style_elements(), 0);
    assert!(!document().body().unwrap().class_list().contains("zoom-level-3"));
}

// === Outdent guard ===

#[wasm_bindgen_test]
fn test_outdent_cancelled_on_first_level_below_focus() {
    let fixture = Fixture::mount(&zoomed_outline(2, 1));
    let config = EngineConfig::default();
    put_caret_in(&fixture.find(".HyperMD-list-line-3"));

    let event = shift_tab();
    assert!(guard_outdent(&event, Some(2), &config));
    assert!(event.default_prevented());
}

#[wasm_bindgen_test]
fn test_outdent_allowed_deeper_or_without_zoom() {
    let fixture = Fixture::mount(&zoomed_outline(2, 1));
    let config = EngineConfig::default();
    put_caret_in(&fixture.find(".HyperMD-list-line-3"));

    let event = shift_tab();
    assert!(!guard_outdent(&event, Some(1), &config));
    assert!(!event.default_prevented());

    let event = shift_tab();
    assert!(!guard_outdent(&event, None, &config));
    assert!(!event.default_prevented());
}

#[wasm_bindgen_test]
fn test_shift_tab_reads_as_outdent() {
    let chord = key_chord(&shift_tab());
    assert!(chord.shift);
    assert_eq!(
        EngineConfig::default().shortcuts.intent(&chord),
        Some(KeyIntent::Outdent)
    );
}

// === Rescan ===

#[wasm_bindgen_test]
fn test_rescan_stamps_once_and_then_leaves_span_alone() {
    let fixture = Fixture::mount(
        r#"<div class="search-result-file-matches"><span>**Release** for C# users</span></div>"#,
    );
    let config = EngineConfig::default();
    let span = fixture.find(".search-result-file-matches span");

    assert_eq!(rescan(&document(), &config), 1);
    assert_eq!(span.text_content().as_deref(), Some("Release for C# users"));
    assert_eq!(
        span.get_attribute("data-wikilink-hash"),
        Some(fingerprint("Release for C# users"))
    );

    let written = span.first_child();
    assert_eq!(rescan(&document(), &config), 0);
    assert!(span.first_child().unwrap().is_same_node(written.as_ref()));
    assert_eq!(span.text_content().as_deref(), Some("Release for C# users"));
}

// === Lifecycle ===

#[wasm_bindgen_test]
fn test_stop_removes_everything_the_engine_added() {
    let engine = Engine::start(EngineConfig::default()).unwrap();
    let config = EngineConfig::default();
    WebOutline::new(document(), &config).apply_stylesheet("body {}");
    document()
        .body()
        .unwrap()
        .class_list()
        .add_1("zoom-level-2")
        .unwrap();

    engine.stop();
    assert_eq!(style_elements(), 0);
    assert!(!document().body().unwrap().class_list().contains("zoom-level-2"));
}
