//! Decides what a batch of observed mutations asks us to do.

/// The view of a DOM element the classifier needs.
pub trait WatchedNode {
    fn has_class(&self, class: &str) -> bool;

    /// True when some descendant carries `class`.
    fn has_descendant(&self, class: &str) -> bool;

    /// True when this node or one of its ancestors carries `class`.
    fn is_within(&self, class: &str) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    ChildList,
    Attributes,
}

#[derive(Clone, Debug)]
pub struct ChangeRecord<N> {
    pub kind: ChangeKind,
    pub target: N,
    /// Element nodes only; text nodes never match a signature.
    pub added: Vec<N>,
    pub attribute: Option<String>,
}

/// Class names the classifier matches against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signatures {
    /// Containers whose arrival means fresh markup and a possible zoom change.
    pub containers: Vec<String>,
    /// Targets whose content changes in place ("show more context", task re-renders).
    pub content_targets: Vec<String>,
    pub list_line: String,
    pub scroller: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    pub needs_markup_rescan: bool,
    pub needs_forced_level_detection: bool,
    pub needs_cached_level_reuse: bool,
}

impl Classification {
    pub fn is_idle(self) -> bool {
        !(self.needs_markup_rescan
            || self.needs_forced_level_detection
            || self.needs_cached_level_reuse)
    }
}

pub fn classify<N: WatchedNode>(
    records: &[ChangeRecord<N>],
    signatures: &Signatures,
    zoom_active: bool,
) -> Classification {
    let mut out = Classification::default();
    let mut scrolled = false;

    for record in records {
        let container_added = record
            .added
            .iter()
            .any(|node| signatures.matches_container(node));
        let target_matches = signatures.matches_container_class(&record.target)
            || signatures
                .content_targets
                .iter()
                .any(|class| record.target.has_class(class));

        if container_added || target_matches {
            out.needs_markup_rescan = true;
        }
        if container_added {
            out.needs_forced_level_detection = true;
        }

        match record.kind {
            ChangeKind::Attributes => {
                let class_changed = record.attribute.as_deref() == Some("class");
                if class_changed && zoom_active && record.target.has_class(&signatures.list_line)
                {
                    out.needs_forced_level_detection = true;
                }
            }
            ChangeKind::ChildList => {
                if record.target.is_within(&signatures.scroller) {
                    scrolled = true;
                }
            }
        }
    }

    out.needs_cached_level_reuse = scrolled && !out.needs_forced_level_detection;
    out
}

impl Signatures {
    fn matches_container_class<N: WatchedNode>(&self, node: &N) -> bool {
        self.containers.iter().any(|class| node.has_class(class))
    }

    fn matches_container<N: WatchedNode>(&self, node: &N) -> bool {
        self.containers
            .iter()
            .any(|class| node.has_class(class) || node.has_descendant(class))
    }
}
