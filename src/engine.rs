//! Wires the classifier, rewriter and zoom synchronizer to the live document.
//!
//! Everything runs on the page's event loop. Work triggered by a mutation batch
//! is deferred with short timers so the host has finished its own DOM writes by
//! the time we look; scroll placement waits two animation frames for layout.

use crate::classify::{classify, Signatures};
use crate::config::EngineConfig;
use crate::dom::{
    change_records, click_gesture, guard_outdent, key_chord, place_cursor_at_end, rescan,
    scroll_to_top, WebOutline,
};
use crate::error::EngineError;
use crate::gesture::{Gesture, KeyIntent};
use crate::zoom::{FocusRequest, SyncOutcome, ZoomSync};
use leptos::prelude::{document, request_animation_frame, set_timeout};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, HtmlElement, KeyboardEvent, MouseEvent, MutationObserver, MutationObserverInit,
};

type MutationCallback = Closure<dyn FnMut(js_sys::Array, MutationObserver)>;

struct Shared {
    config: EngineConfig,
    signatures: Signatures,
    zoom: RefCell<ZoomSync>,
    /// Cleared on stop so timers and frames scheduled earlier do nothing.
    running: Cell<bool>,
}

pub struct Engine {
    shared: Rc<Shared>,
    observer: MutationObserver,
    _on_mutation: MutationCallback,
    on_click: Closure<dyn FnMut(MouseEvent)>,
    on_keydown: Closure<dyn FnMut(KeyboardEvent)>,
}

impl Engine {
    pub fn start(config: EngineConfig) -> Result<Self, EngineError> {
        let shared = Rc::new(Shared {
            signatures: config.signatures(),
            zoom: RefCell::new(ZoomSync::new(config.level_horizon)),
            config,
            running: Cell::new(true),
        });
        let doc = document();
        let body = doc.body().ok_or(EngineError::MissingElement("document body"))?;

        let on_mutation = {
            let shared = Rc::clone(&shared);
            MutationCallback::new(move |records: js_sys::Array, _: MutationObserver| {
                Shared::on_mutations(&shared, &records);
            })
        };
        let observer = MutationObserver::new(on_mutation.as_ref().unchecked_ref())?;

        let on_click = {
            let shared = Rc::clone(&shared);
            Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
                if let Some(gesture) = click_gesture(&event, &shared.config) {
                    Shared::note_gesture(&shared, gesture);
                }
            })
        };
        let on_keydown = {
            let shared = Rc::clone(&shared);
            Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
                Shared::on_key(&shared, &event);
            })
        };

        let engine = Self {
            shared,
            observer,
            _on_mutation: on_mutation,
            on_click,
            on_keydown,
        };
        // The closures must outlive every registration, so a partial attach is
        // undone before they are dropped.
        if let Err(err) = engine.attach(&doc, &body) {
            engine.stop();
            return Err(err);
        }

        let timing = &engine.shared.config.timing;
        Shared::schedule_rescan(&engine.shared, Duration::from_millis(timing.initial_rescan_ms));
        Shared::schedule_level(
            &engine.shared,
            true,
            Duration::from_millis(timing.initial_level_ms),
        );
        Ok(engine)
    }

    fn attach(&self, doc: &Document, body: &HtmlElement) -> Result<(), EngineError> {
        // Capture phase, so an outdent is seen before the editor handles it.
        doc.add_event_listener_with_callback_and_bool(
            "click",
            self.on_click.as_ref().unchecked_ref(),
            true,
        )?;
        doc.add_event_listener_with_callback_and_bool(
            "keydown",
            self.on_keydown.as_ref().unchecked_ref(),
            true,
        )?;

        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        init.set_attributes(true);
        init.set_attribute_filter(&js_sys::Array::of1(&JsValue::from_str("class")));
        self.observer.observe_with_options(body, &init)?;
        Ok(())
    }

    /// Detaches from the document and removes the zoom marker and stylesheet.
    /// Safe to call on a partially attached engine.
    pub fn stop(self) {
        self.shared.running.set(false);
        self.observer.disconnect();

        let doc = document();
        for (kind, listener) in [
            ("click", self.on_click.as_ref()),
            ("keydown", self.on_keydown.as_ref()),
        ] {
            if let Err(err) =
                doc.remove_event_listener_with_callback_and_bool(kind, listener.unchecked_ref(), true)
            {
                tracing::warn!(kind, error = %EngineError::from(err), "could not remove listener");
            }
        }

        let outline = WebOutline::new(doc, &self.shared.config);
        self.shared.zoom.borrow_mut().deactivate(&outline);
    }
}

impl Shared {
    fn on_mutations(this: &Rc<Self>, records: &js_sys::Array) {
        if !this.running.get() {
            return;
        }
        let changes = change_records(records);
        let zoom_active = this.zoom.borrow().is_active();
        let plan = classify(&changes, &this.signatures, zoom_active);
        if plan.is_idle() {
            return;
        }
        tracing::trace!(?plan, records = changes.len(), "mutation batch");

        let timing = &this.config.timing;
        if plan.needs_markup_rescan {
            Shared::schedule_rescan(this, timing.rescan_delay());
        }
        if plan.needs_forced_level_detection {
            Shared::schedule_level(this, true, timing.level_delay());
        }
        if plan.needs_cached_level_reuse {
            Shared::schedule_level(this, false, timing.level_delay());
        }
    }

    fn schedule_rescan(this: &Rc<Self>, delay: Duration) {
        let shared = Rc::clone(this);
        set_timeout(
            move || {
                if shared.running.get() {
                    rescan(&document(), &shared.config);
                }
            },
            delay,
        );
    }

    fn schedule_level(this: &Rc<Self>, force: bool, delay: Duration) {
        let shared = Rc::clone(this);
        set_timeout(move || Shared::sync_level(&shared, force), delay);
    }

    fn sync_level(this: &Rc<Self>, force: bool) {
        if !this.running.get() {
            return;
        }
        let outline = WebOutline::new(document(), &this.config);
        let outcome = this.zoom.borrow_mut().sync(&outline, force);
        if let SyncOutcome::Detected {
            focus: Some(request),
            ..
        } = outcome
        {
            Shared::focus_line(this, request);
        }
    }

    /// Scrolls the focused line to the top once the host has laid it out, then
    /// optionally parks the caret at its end.
    fn focus_line(this: &Rc<Self>, request: FocusRequest<HtmlElement>) {
        let shared = Rc::clone(this);
        request_animation_frame(move || {
            request_animation_frame(move || {
                if !shared.running.get() {
                    return;
                }
                scroll_to_top(&request.line);
                if !request.place_cursor {
                    return;
                }
                let delay = shared.config.timing.cursor_delay();
                set_timeout(
                    move || {
                        let placed = place_cursor_at_end(
                            &document(),
                            &request.line,
                            &shared.config.selectors.content,
                        );
                        if let Err(err) = placed {
                            tracing::warn!(%err, "cursor placement abandoned");
                        }
                    },
                    delay,
                );
            });
        });
    }

    fn note_gesture(this: &Rc<Self>, gesture: Gesture) {
        this.zoom.borrow_mut().state_mut().note_gesture(gesture);
        tracing::debug!(?gesture, "zoom gesture");
        Shared::schedule_level(this, gesture.invalidates_cache(), this.config.timing.level_delay());
    }

    fn on_key(this: &Rc<Self>, event: &KeyboardEvent) {
        match this.config.shortcuts.intent(&key_chord(event)) {
            Some(KeyIntent::Zoom(gesture)) => Shared::note_gesture(this, gesture),
            Some(KeyIntent::Outdent) => {
                let focused = this.zoom.borrow().state().cached_level;
                guard_outdent(event, focused, &this.config);
            }
            None => {}
        }
    }
}
