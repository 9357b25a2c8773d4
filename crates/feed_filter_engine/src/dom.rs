//! Observable HTML document.
//!
//! A small host model of a live page: an HTML tree that can grow and shrink,
//! per-element display state, and mutation observers that receive queued
//! change records in batches at explicit delivery checkpoints.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use ego_tree::{NodeId, NodeRef};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Children were added to or removed from `target`.
    ChildList,
    /// An attribute of `target` changed.
    Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
    pub attribute: Option<&'static str>,
}

/// One delivery to one observer: every record queued for it since the last checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationBatch {
    pub seq: u64,
    pub records: Vec<MutationRecord>,
}

impl MutationBatch {
    /// Nodes added by child-list records, in record order.
    pub fn added_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.records
            .iter()
            .filter(|record| record.kind == MutationKind::ChildList)
            .flat_map(|record| record.added.iter().copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub subtree: bool,
    pub attributes: bool,
}

impl ObserveOptions {
    pub fn child_list_subtree() -> Self {
        Self {
            child_list: true,
            subtree: true,
            attributes: false,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ObserveError {
    #[error("document does not support mutation observation")]
    Unsupported,
    #[error("observe target is not a node of this document")]
    UnknownTarget,
    #[error("observe options select no mutation kinds")]
    NothingToObserve,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DomError {
    #[error("node is not part of this document")]
    UnknownNode,
    #[error("the document root cannot be removed")]
    RootRemoval,
}

pub type MutationCallback = Box<dyn FnMut(&mut Document, &MutationBatch)>;

/// Subscription returned by [`Document::observe`].
#[derive(Debug, Clone)]
pub struct ObserverHandle {
    id: u64,
    live: Rc<Cell<bool>>,
}

impl ObserverHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// False once disconnected or once the document was reloaded.
    pub fn is_live(&self) -> bool {
        self.live.get()
    }
}

struct Observer {
    id: u64,
    target: NodeId,
    options: ObserveOptions,
    live: Rc<Cell<bool>>,
    queue: Vec<MutationRecord>,
    callback: Rc<RefCell<MutationCallback>>,
}

/// Records taken from one observer's queue at a checkpoint.
struct PendingBatch {
    observer: u64,
    live: Rc<Cell<bool>>,
    callback: Rc<RefCell<MutationCallback>>,
    records: Vec<MutationRecord>,
}

pub struct Document {
    baseline: String,
    html: Html,
    hidden: HashSet<NodeId>,
    observers: Vec<Observer>,
    observation_supported: bool,
    next_observer_id: u64,
    batch_seq: u64,
    delivering: bool,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.html.tree.nodes().count())
            .field("hidden", &self.hidden.len())
            .field("observers", &self.observers.len())
            .field("observation_supported", &self.observation_supported)
            .finish()
    }
}

impl Document {
    /// Parse `markup` as a full page; the markup becomes the reload baseline.
    pub fn parse(markup: &str) -> Self {
        Self {
            baseline: markup.to_string(),
            html: Html::parse_document(markup),
            hidden: HashSet::new(),
            observers: Vec::new(),
            observation_supported: true,
            next_observer_id: 1,
            batch_seq: 0,
            delivering: false,
        }
    }

    /// A host without tree observation; [`Document::observe`] always fails.
    pub fn without_observation(markup: &str) -> Self {
        Self {
            observation_supported: false,
            ..Self::parse(markup)
        }
    }

    /// Page reload: back to the baseline markup, observers dropped, nothing hidden.
    pub fn reload(&mut self) {
        for observer in self.observers.drain(..) {
            observer.live.set(false);
        }
        self.html = Html::parse_document(&self.baseline);
        self.hidden.clear();
    }

    pub fn root(&self) -> NodeId {
        self.html.tree.root().id()
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_, Node>> {
        self.html.tree.get(id)
    }

    pub fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.node(id).and_then(ElementRef::wrap)
    }

    /// Connected elements matching `selector`, in document order.
    pub fn select(&self, selector: &Selector) -> Vec<NodeId> {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|element| selector.matches(element))
            .map(|element| element.id())
            .collect()
    }

    /// First element matching `selector`, in document order.
    pub fn select_first(&self, selector: &Selector) -> Option<NodeId> {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|element| selector.matches(element))
            .map(|element| element.id())
    }

    /// `node` itself or its nearest ancestor matching `selector`, climbing at most `max_depth` levels.
    pub fn closest(&self, node: NodeId, selector: &Selector, max_depth: usize) -> Option<NodeId> {
        let start = self.node(node)?;
        std::iter::once(start)
            .chain(start.ancestors())
            .take(max_depth.saturating_add(1))
            .filter_map(ElementRef::wrap)
            .find(|element| selector.matches(element))
            .map(|element| element.id())
    }

    /// Concatenated descendant text, like `textContent`.
    pub fn text_content(&self, node: NodeId) -> String {
        match self.node(node) {
            Some(node) => node
                .descendants()
                .filter_map(|n| n.value().as_text())
                .map(|text| &**text)
                .collect(),
            None => String::new(),
        }
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        let root = self.root();
        match self.node(node) {
            Some(n) => n.id() == root || n.ancestors().last().map(|a| a.id()) == Some(root),
            None => false,
        }
    }

    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.hidden.contains(&node)
    }

    /// Connected elements currently removed from layout.
    pub fn hidden_count(&self) -> usize {
        self.hidden
            .iter()
            .filter(|id| self.is_connected(**id))
            .count()
    }

    /// Append every top-level node of `markup` under `parent`; returns the new node ids.
    pub fn append_fragment(&mut self, parent: NodeId, markup: &str) -> Result<Vec<NodeId>, DomError> {
        if self.node(parent).is_none() {
            return Err(DomError::UnknownNode);
        }
        let fragment = Html::parse_fragment(markup);
        let mut added = Vec::new();
        for top in fragment.root_element().children() {
            added.push(self.graft(parent, top)?);
        }
        if !added.is_empty() {
            self.queue_record(MutationRecord {
                kind: MutationKind::ChildList,
                target: parent,
                added: added.clone(),
                removed: Vec::new(),
                attribute: None,
            });
        }
        Ok(added)
    }

    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        if node == self.root() {
            return Err(DomError::RootRemoval);
        }
        let parent = self
            .node(node)
            .ok_or(DomError::UnknownNode)?
            .parent()
            .map(|p| p.id());
        let Some(parent) = parent else {
            // Already detached.
            return Ok(());
        };
        let subtree: Vec<NodeId> = self
            .node(node)
            .map(|removed| removed.descendants().map(|n| n.id()).collect())
            .unwrap_or_default();
        for id in &subtree {
            self.hidden.remove(id);
        }
        if let Some(mut node_mut) = self.html.tree.get_mut(node) {
            node_mut.detach();
        }
        self.queue_record(MutationRecord {
            kind: MutationKind::ChildList,
            target: parent,
            added: Vec::new(),
            removed: vec![node],
            attribute: None,
        });
        Ok(())
    }

    /// Remove an element from layout (`display: none`). False when already hidden or not an element.
    pub fn set_display_none(&mut self, node: NodeId) -> bool {
        if self.element(node).is_none() || !self.hidden.insert(node) {
            return false;
        }
        self.queue_record(MutationRecord {
            kind: MutationKind::Attributes,
            target: node,
            added: Vec::new(),
            removed: Vec::new(),
            attribute: Some("style"),
        });
        true
    }

    pub fn observe(
        &mut self,
        target: NodeId,
        options: ObserveOptions,
        callback: MutationCallback,
    ) -> Result<ObserverHandle, ObserveError> {
        if !self.observation_supported {
            return Err(ObserveError::Unsupported);
        }
        if !options.child_list && !options.attributes {
            return Err(ObserveError::NothingToObserve);
        }
        if self.node(target).is_none() {
            return Err(ObserveError::UnknownTarget);
        }
        let id = self.next_observer_id;
        self.next_observer_id += 1;
        let live = Rc::new(Cell::new(true));
        self.observers.push(Observer {
            id,
            target,
            options,
            live: live.clone(),
            queue: Vec::new(),
            callback: Rc::new(RefCell::new(callback)),
        });
        Ok(ObserverHandle { id, live })
    }

    /// Cancel a subscription. Unknown or already cancelled handles are ignored,
    /// and calling this from inside a callback is fine.
    pub fn disconnect(&mut self, handle: &ObserverHandle) {
        handle.live.set(false);
        self.observers.retain(|observer| observer.id != handle.id);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Records waiting for the next checkpoint, across all observers.
    pub fn pending_records(&self) -> usize {
        self.observers.iter().map(|o| o.queue.len()).sum()
    }

    /// Delivery checkpoint: hands each observer its queued records as one batch.
    ///
    /// Records queued by callbacks wait for the next checkpoint. Returns the number
    /// of batches delivered; 0 when called from inside a callback. If a callback
    /// panics, batches not yet delivered go back to their observers' queues and the
    /// panic resumes; the next checkpoint delivers them.
    pub fn deliver_mutations(&mut self) -> usize {
        if self.delivering {
            return 0;
        }
        let ready: Vec<PendingBatch> = self
            .observers
            .iter_mut()
            .filter(|observer| !observer.queue.is_empty())
            .map(|observer| PendingBatch {
                observer: observer.id,
                live: observer.live.clone(),
                callback: observer.callback.clone(),
                records: std::mem::take(&mut observer.queue),
            })
            .collect();

        self.delivering = true;
        let mut delivered = 0;
        let mut pending = ready.into_iter();
        while let Some(next) = pending.next() {
            // An earlier callback in this round may have disconnected this observer.
            if !next.live.get() {
                continue;
            }
            self.batch_seq += 1;
            let batch = MutationBatch {
                seq: self.batch_seq,
                records: next.records,
            };
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                let mut callback = next.callback.borrow_mut();
                (&mut **callback)(self, &batch);
            }));
            if let Err(payload) = outcome {
                self.delivering = false;
                self.requeue(pending);
                panic::resume_unwind(payload);
            }
            delivered += 1;
        }
        self.delivering = false;
        delivered
    }

    fn requeue(&mut self, undelivered: impl Iterator<Item = PendingBatch>) {
        for mut batch in undelivered {
            if !batch.live.get() {
                continue;
            }
            if let Some(observer) = self.observers.iter_mut().find(|o| o.id == batch.observer) {
                batch.records.append(&mut observer.queue);
                observer.queue = batch.records;
            }
        }
    }

    /// Page markup with every hidden element left out.
    pub fn filtered_html(&self) -> String {
        let mut copy = self.html.clone();
        for id in &self.hidden {
            if let Some(mut node) = copy.tree.get_mut(*id) {
                node.detach();
            }
        }
        copy.html()
    }

    fn graft(&mut self, parent: NodeId, source: NodeRef<'_, Node>) -> Result<NodeId, DomError> {
        let mut top = None;
        let mut stack = vec![(source, parent)];
        while let Some((src, dst_parent)) = stack.pop() {
            let mut dst = self.html.tree.get_mut(dst_parent).ok_or(DomError::UnknownNode)?;
            let new_id = dst.append(src.value().clone()).id();
            top.get_or_insert(new_id);
            let children: Vec<_> = src.children().collect();
            for child in children.into_iter().rev() {
                stack.push((child, new_id));
            }
        }
        top.ok_or(DomError::UnknownNode)
    }

    fn queue_record(&mut self, record: MutationRecord) {
        let interested: Vec<usize> = self
            .observers
            .iter()
            .enumerate()
            .filter(|(_, observer)| observer.live.get() && self.wants(observer, &record))
            .map(|(index, _)| index)
            .collect();
        for index in interested {
            self.observers[index].queue.push(record.clone());
        }
    }

    fn wants(&self, observer: &Observer, record: &MutationRecord) -> bool {
        let kind_wanted = match record.kind {
            MutationKind::ChildList => observer.options.child_list,
            MutationKind::Attributes => observer.options.attributes,
        };
        if !kind_wanted {
            return false;
        }
        if record.target == observer.target {
            return true;
        }
        observer.options.subtree
            && self
                .node(record.target)
                .is_some_and(|n| n.ancestors().any(|a| a.id() == observer.target))
    }
}
