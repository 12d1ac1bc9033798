//! Fingerprint-gated rewriting of rendered text spans.
//!
//! The host re-renders search results and task lists freely, so the same span
//! can be handed to us many times. A span remembers the fingerprint of the text
//! we last wrote into it; when its current content still hashes to that value
//! there is nothing to do and the span is left alone.

use crate::markup::{fingerprint, has_formatting, rewrite};

/// A leaf text container in the rendered document.
pub trait TextSpan {
    fn text(&self) -> String;

    fn write(&self, text: &str);

    /// Fingerprint of the text last written by [`refresh_span`], if any.
    fn fingerprint(&self) -> Option<String> {
        None
    }

    fn stamp(&self, _fingerprint: &str) {}
}

/// An element matched by a rescan selector.
pub trait SpanContainer {
    type Span: TextSpan;

    /// The container itself when it holds only text.
    fn as_leaf(&self) -> Option<Self::Span>;

    /// Direct text-node children, for containers that mix text and elements.
    fn text_children(&self) -> Vec<Self::Span>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Refresh {
    /// No formatting trigger in the text.
    Skipped,
    /// Already clean, or still holding what we last wrote.
    Unchanged,
    Rewritten,
}

/// Rewrites one span in place. `always` bypasses the trigger pre-check for
/// containers whose markup has no trigger substring (breadcrumb checkboxes).
pub fn refresh_span<S: TextSpan>(span: &S, always: bool) -> Refresh {
    refresh_with(span, always, rewrite)
}

fn refresh_with<S: TextSpan>(span: &S, always: bool, strip: fn(&str) -> String) -> Refresh {
    let current = span.text();
    if !always && !has_formatting(&current) {
        return Refresh::Skipped;
    }
    if span.fingerprint().as_deref() == Some(fingerprint(&current).as_str()) {
        return Refresh::Unchanged;
    }

    let next = strip(&current);
    if next == current {
        return Refresh::Unchanged;
    }
    span.write(&next);
    span.stamp(&fingerprint(&next));
    Refresh::Rewritten
}

/// Refreshes a matched container and returns how many spans were rewritten.
///
/// Containers with element children are only touched through their own text
/// nodes so links and icons inside them survive.
pub fn refresh_container<C: SpanContainer>(container: &C, always: bool) -> usize {
    if let Some(leaf) = container.as_leaf() {
        return usize::from(refresh_span(&leaf, always) == Refresh::Rewritten);
    }
    container
        .text_children()
        .iter()
        .filter(|span| {
            refresh_with(*span, always, rewrite_between_elements) == Refresh::Rewritten
        })
        .count()
}

/// Text nodes sitting next to sibling elements keep one space at each edge
/// that had whitespace, otherwise words would glue onto the neighbouring link.
fn rewrite_between_elements(text: &str) -> String {
    let core = rewrite(text);
    if core.is_empty() {
        return core;
    }
    let lead = if text.starts_with(char::is_whitespace) { " " } else { "" };
    let trail = if text.ends_with(char::is_whitespace) { " " } else { "" };
    format!("{lead}{core}{trail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeSpan {
        text: RefCell<String>,
        hash: RefCell<Option<String>>,
        writes: Cell<usize>,
        stamps: Cell<usize>,
    }

    impl FakeSpan {
        fn new(text: &str) -> Self {
            Self {
                text: RefCell::new(text.to_string()),
                ..Self::default()
            }
        }
    }

    impl TextSpan for &FakeSpan {
        fn text(&self) -> String {
            self.text.borrow().clone()
        }

        fn write(&self, text: &str) {
            self.writes.set(self.writes.get() + 1);
            *self.text.borrow_mut() = text.to_string();
        }

        fn fingerprint(&self) -> Option<String> {
            self.hash.borrow().clone()
        }

        fn stamp(&self, fingerprint: &str) {
            self.stamps.set(self.stamps.get() + 1);
            *self.hash.borrow_mut() = Some(fingerprint.to_string());
        }
    }

    struct FakeContainer<'a> {
        leaf: Option<&'a FakeSpan>,
        children: Vec<&'a FakeSpan>,
    }

    impl<'a> SpanContainer for FakeContainer<'a> {
        type Span = &'a FakeSpan;

        fn as_leaf(&self) -> Option<Self::Span> {
            self.leaf
        }

        fn text_children(&self) -> Vec<Self::Span> {
            self.children.clone()
        }
    }

    #[test]
    fn rewrites_and_stamps_fresh_span() {
        let span = FakeSpan::new("see [[Page|Label]]");
        assert_eq!(refresh_span(&&span, false), Refresh::Rewritten);
        assert_eq!(*span.text.borrow(), "see Label");
        assert_eq!(span.hash.borrow().clone(), Some(fingerprint("see Label")));
    }

    #[test]
    fn stamped_span_is_not_touched_again() {
        let span = FakeSpan::new("**done** [[x]]");
        refresh_span(&&span, true);
        assert_eq!((span.writes.get(), span.stamps.get()), (1, 1));

        assert_eq!(refresh_span(&&span, true), Refresh::Unchanged);
        assert_eq!(refresh_span(&&span, false), Refresh::Skipped);
        assert_eq!((span.writes.get(), span.stamps.get()), (1, 1));
    }

    #[test]
    fn clean_text_is_never_stamped() {
        let span = FakeSpan::new("already_clean");
        assert_eq!(refresh_span(&&span, false), Refresh::Unchanged);
        assert_eq!(span.hash.borrow().clone(), None);
        assert_eq!(span.writes.get(), 0);
    }

    #[test]
    fn host_rerender_with_new_markup_is_rewritten() {
        let span = FakeSpan::new("[[A]]");
        refresh_span(&&span, false);
        *span.text.borrow_mut() = "[[B|Other]]".to_string();
        assert_eq!(refresh_span(&&span, false), Refresh::Rewritten);
        assert_eq!(*span.text.borrow(), "Other");
    }

    #[test]
    fn breadcrumb_checkbox_needs_always() {
        let span = FakeSpan::new("[ ] Plan trip");
        assert_eq!(refresh_span(&&span, false), Refresh::Skipped);
        assert_eq!(refresh_span(&&span, true), Refresh::Rewritten);
        assert_eq!(*span.text.borrow(), "Plan trip");
    }

    #[test]
    fn mixed_container_rewrites_text_children_only() {
        let first = FakeSpan::new("[[One]] and ");
        let second = FakeSpan::new(" plain");
        let container = FakeContainer {
            leaf: None,
            children: vec![&first, &second],
        };
        assert_eq!(refresh_container(&container, false), 1);
        assert_eq!(*first.text.borrow(), "One and ");
        assert_eq!(*second.text.borrow(), " plain");
    }

    #[test]
    fn leaf_container_is_refreshed_whole() {
        let leaf = FakeSpan::new("==hi==");
        let container = FakeContainer {
            leaf: Some(&leaf),
            children: Vec::new(),
        };
        assert_eq!(refresh_container(&container, false), 1);
        assert_eq!(refresh_container(&container, false), 0);
    }
}
