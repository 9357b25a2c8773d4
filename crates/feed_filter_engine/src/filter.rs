//! Live keyword filter over an observable document.
//!
//! Activation subscribes to child-list mutations on the document root first
//! and only then runs a full pass, so nothing inserted in between is missed.
//! Each delivered batch is evaluated against the nodes it reports as added
//! (and their descendants), never against the whole tree. Items are only
//! ever hidden; revealing them again takes a fresh document baseline.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use ego_tree::NodeId;
use feed_filter_core::{first_match, KeywordSet};
use feed_logging::{feed_debug, feed_error, feed_trace, with_batch_seq};

use crate::dom::{Document, MutationBatch, ObserveError, ObserveOptions, ObserverHandle};
use crate::selectors::CompiledSelectors;

/// Work done by one evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassReport {
    pub roots_scanned: usize,
    pub text_nodes_examined: usize,
    pub items_hidden: usize,
}

/// Running totals for one activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterStats {
    pub full_passes: u64,
    pub batches: u64,
    pub text_nodes_examined: u64,
    pub items_hidden: u64,
    pub last_batch: PassReport,
}

impl FilterStats {
    fn record_pass(&mut self, report: &PassReport) {
        self.full_passes += 1;
        self.accumulate(report);
    }

    fn record_batch(&mut self, report: &PassReport) {
        self.batches += 1;
        self.last_batch = *report;
        self.accumulate(report);
    }

    fn accumulate(&mut self, report: &PassReport) {
        self.text_nodes_examined += report.text_nodes_examined as u64;
        self.items_hidden += report.items_hidden as u64;
    }
}

/// Hide every item under `roots` whose title matches `keywords`.
///
/// Roots nested inside another root, or no longer attached to the document,
/// are skipped. A root sitting inside a title element (e.g. replaced title text)
/// re-evaluates that title. Items already hidden are left alone.
pub fn evaluate(
    doc: &mut Document,
    roots: &[NodeId],
    keywords: &KeywordSet,
    selectors: &CompiledSelectors,
) -> PassReport {
    let mut report = PassReport::default();
    if keywords.is_empty() {
        return report;
    }

    let root_set: HashSet<NodeId> = roots.iter().copied().collect();
    let mut scanned: HashSet<NodeId> = HashSet::new();
    let mut seen_text: HashSet<NodeId> = HashSet::new();
    let mut settled: HashSet<NodeId> = HashSet::new();
    let mut to_hide: Vec<(NodeId, &str)> = Vec::new();

    for &root in roots {
        if !scanned.insert(root) || !doc.is_connected(root) || nested_in(doc, root, &root_set) {
            continue;
        }
        report.roots_scanned += 1;

        let Some(root_ref) = doc.node(root) else {
            continue;
        };
        let mut text_nodes: Vec<NodeId> = root_ref
            .descendants()
            .filter_map(scraper::ElementRef::wrap)
            .filter(|element| selectors.item_text.matches(element))
            .map(|element| element.id())
            .collect();
        if let Some(owner) = root_ref
            .parent()
            .and_then(|parent| doc.closest(parent.id(), &selectors.item_text, selectors.max_container_depth))
        {
            text_nodes.push(owner);
        }

        for text_node in text_nodes {
            if !seen_text.insert(text_node) {
                continue;
            }
            report.text_nodes_examined += 1;
            let Some(container) =
                doc.closest(text_node, &selectors.item_container, selectors.max_container_depth)
            else {
                // Page chrome reusing the title style.
                continue;
            };
            if settled.contains(&container) || doc.is_hidden(container) {
                continue;
            }
            let text = doc.text_content(text_node);
            if let Some(keyword) = first_match(&text, keywords) {
                settled.insert(container);
                to_hide.push((container, keyword));
            }
        }
    }

    for (container, keyword) in to_hide {
        if doc.set_display_none(container) {
            report.items_hidden += 1;
            feed_trace!("hid item {:?} (keyword `{}`)", container, keyword);
        }
    }
    report
}

fn nested_in(doc: &Document, node: NodeId, roots: &HashSet<NodeId>) -> bool {
    doc.node(node)
        .is_some_and(|n| n.ancestors().any(|ancestor| roots.contains(&ancestor.id())))
}

/// One activation: the keyword snapshot, its subscription and its counters.
#[derive(Debug)]
pub struct EngineState {
    keywords: KeywordSet,
    subscription: Option<ObserverHandle>,
    stats: Rc<RefCell<FilterStats>>,
}

impl EngineState {
    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    /// Subscribed and not cancelled by a deactivate or a page reload.
    pub fn is_active(&self) -> bool {
        self.subscription.as_ref().is_some_and(ObserverHandle::is_live)
    }

    pub fn stats(&self) -> FilterStats {
        *self.stats.borrow()
    }

    /// Cancel the subscription. Calling it again is a no-op; hidden items stay hidden.
    pub fn deactivate(&mut self, doc: &mut Document) {
        if let Some(handle) = self.subscription.take() {
            doc.disconnect(&handle);
            feed_debug!("filter deactivated (observer {})", handle.id());
        }
    }
}

/// Owns at most one [`EngineState`] per document.
#[derive(Debug)]
pub struct LiveFilter {
    selectors: Rc<CompiledSelectors>,
    state: Option<EngineState>,
}

impl LiveFilter {
    pub fn new(selectors: CompiledSelectors) -> Self {
        Self {
            selectors: Rc::new(selectors),
            state: None,
        }
    }

    pub fn state(&self) -> Option<&EngineState> {
        self.state.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.state.as_ref().is_some_and(EngineState::is_active)
    }

    /// Replace any previous activation with one filtering on `keywords`.
    pub fn activate(
        &mut self,
        doc: &mut Document,
        keywords: KeywordSet,
    ) -> Result<&EngineState, ObserveError> {
        if let Some(mut prior) = self.state.take() {
            prior.deactivate(doc);
        }

        let stats = Rc::new(RefCell::new(FilterStats::default()));
        let callback = {
            let keywords = keywords.clone();
            let selectors = Rc::clone(&self.selectors);
            let stats = Rc::clone(&stats);
            Box::new(move |doc: &mut Document, batch: &MutationBatch| {
                with_batch_seq(batch.seq, || {
                    let roots: Vec<NodeId> = batch.added_nodes().collect();
                    let report = evaluate(doc, &roots, &keywords, &selectors);
                    stats.borrow_mut().record_batch(&report);
                    feed_debug!(
                        "batch: {} added roots, {} scanned, {} titles, {} hidden",
                        roots.len(),
                        report.roots_scanned,
                        report.text_nodes_examined,
                        report.items_hidden
                    );
                });
            })
        };

        let root = doc.root();
        let subscription = doc
            .observe(root, ObserveOptions::child_list_subtree(), callback)
            .inspect_err(|err| feed_error!("filter activation failed: {err}"))?;

        let report = with_batch_seq(0, || evaluate(doc, &[root], &keywords, &self.selectors));
        stats.borrow_mut().record_pass(&report);
        feed_debug!(
            "filter activated with {} keywords (observer {}): initial pass hid {} of {} titles",
            keywords.len(),
            subscription.id(),
            report.items_hidden,
            report.text_nodes_examined
        );

        Ok(&*self.state.insert(EngineState {
            keywords,
            subscription: Some(subscription),
            stats,
        }))
    }

    pub fn deactivate(&mut self, doc: &mut Document) {
        if let Some(state) = self.state.as_mut() {
            state.deactivate(doc);
        }
    }
}
