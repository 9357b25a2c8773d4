use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

use feed_filter_core::KeywordSet;
use feed_filter_engine::{
    Document, ItemSelectors, LiveFilter, MutationBatch, MutationKind, NodeId, ObserveError,
    ObserveOptions, Selector,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(feed_logging::initialize_for_tests);
}

const FEED: &str = r#"<html><body>
    <ytd-masthead><yt-formatted-string>React to this: site banner</yt-formatted-string></ytd-masthead>
    <div id="contents">
        <ytd-rich-item-renderer class="seed"><div id="details"><h3 class="title"><yt-formatted-string>Learning React Hooks</yt-formatted-string></h3></div></ytd-rich-item-renderer>
        <ytd-rich-item-renderer class="seed"><div id="details"><h3 class="title">Vue Basics</h3></div></ytd-rich-item-renderer>
    </div>
</body></html>"#;

fn item(title: &str) -> String {
    format!(r#"<ytd-video-renderer><h3 class="title">{title}</h3></ytd-video-renderer>"#)
}

fn keywords(raw: &[&str]) -> KeywordSet {
    KeywordSet::from_raw(raw.iter().copied())
}

fn css(selector: &str) -> Selector {
    Selector::parse(selector).unwrap()
}

fn contents(doc: &Document) -> NodeId {
    doc.select_first(&css("#contents")).unwrap()
}

fn new_filter() -> LiveFilter {
    LiveFilter::new(ItemSelectors::default().compile().unwrap())
}

fn hidden_titles(doc: &Document) -> Vec<String> {
    doc.select(&css("ytd-video-renderer, ytd-rich-item-renderer"))
        .into_iter()
        .filter(|id| doc.is_hidden(*id))
        .map(|id| doc.text_content(id).trim().to_string())
        .collect()
}

#[test]
fn initial_pass_hides_matching_items_only() {
    init_logging();
    let mut doc = Document::parse(FEED);
    let mut filter = new_filter();

    let state = filter.activate(&mut doc, keywords(&["react"])).unwrap();

    assert!(state.is_active());
    assert_eq!(state.stats().full_passes, 1);
    assert_eq!(hidden_titles(&doc), vec!["Learning React Hooks".to_string()]);
    // The banner matches but has no item container.
    assert_eq!(doc.hidden_count(), 1);
}

#[test]
fn inserted_items_are_filtered_on_delivery() {
    init_logging();
    let mut doc = Document::parse(FEED);
    let mut filter = new_filter();
    filter.activate(&mut doc, keywords(&["react"])).unwrap();

    let feed = contents(&doc);
    let markup = format!("{}{}", item("React in 100 seconds"), item("Svelte tour"));
    doc.append_fragment(feed, &markup).unwrap();
    assert_eq!(doc.deliver_mutations(), 1);

    assert_eq!(
        hidden_titles(&doc),
        vec![
            "Learning React Hooks".to_string(),
            "React in 100 seconds".to_string()
        ]
    );
    let stats = filter.state().unwrap().stats();
    assert_eq!(stats.batches, 1);
    assert_eq!(stats.last_batch.text_nodes_examined, 2);
    assert_eq!(stats.last_batch.items_hidden, 1);
}

#[test]
fn empty_keyword_set_never_hides() {
    init_logging();
    let mut doc = Document::parse(FEED);
    let mut filter = new_filter();
    filter.activate(&mut doc, KeywordSet::empty()).unwrap();

    let feed = contents(&doc);
    doc.append_fragment(feed, &item("React again")).unwrap();
    doc.deliver_mutations();

    assert!(filter.is_active());
    assert_eq!(doc.hidden_count(), 0);
}

#[test]
fn large_batch_work_is_bounded_to_inserted_items() {
    init_logging();
    let prior: String = (0..200).map(|i| item(&format!("Clip {i} xyz"))).collect();
    let mut doc = Document::parse(&format!(
        r#"<html><body><div id="contents">{prior}</div></body></html>"#
    ));
    let mut filter = new_filter();
    filter.activate(&mut doc, keywords(&["a"])).unwrap();
    assert_eq!(doc.hidden_count(), 0);

    let batch: String = (0..500).map(|i| item(&format!("Video {i} about a topic"))).collect();
    let feed = contents(&doc);
    let added = doc.append_fragment(feed, &batch).unwrap();
    assert_eq!(added.len(), 500);
    assert_eq!(doc.deliver_mutations(), 1);

    let stats = filter.state().unwrap().stats();
    assert_eq!(stats.batches, 1);
    assert_eq!(stats.last_batch.roots_scanned, 500);
    assert_eq!(stats.last_batch.text_nodes_examined, 500);
    assert_eq!(stats.last_batch.items_hidden, 500);
    assert_eq!(doc.hidden_count(), 500);
}

#[test]
fn reactivation_leaves_only_the_latest_subscription() {
    init_logging();
    let mut doc = Document::parse(FEED);
    let mut filter = new_filter();
    filter.activate(&mut doc, keywords(&["react"])).unwrap();
    filter.activate(&mut doc, keywords(&["vue"])).unwrap();
    assert_eq!(doc.observer_count(), 1);

    let feed = contents(&doc);
    doc.append_fragment(feed, &format!("{}{}", item("React Native"), item("Vue Router")))
        .unwrap();
    assert_eq!(doc.deliver_mutations(), 1);

    // Earlier hides stay; the first keyword set no longer fires.
    assert_eq!(
        hidden_titles(&doc),
        vec![
            "Learning React Hooks".to_string(),
            "Vue Basics".to_string(),
            "Vue Router".to_string()
        ]
    );
    let state = filter.state().unwrap();
    assert_eq!(state.keywords(), &keywords(&["vue"]));
    assert_eq!(state.stats().batches, 1);
}

#[test]
fn own_hides_do_not_trigger_another_batch() {
    init_logging();
    let mut doc = Document::parse(FEED);
    let mut filter = new_filter();
    filter.activate(&mut doc, keywords(&["react"])).unwrap();

    let root = doc.root();
    let style_writes = Rc::new(RefCell::new(0usize));
    let sink = style_writes.clone();
    doc.observe(
        root,
        ObserveOptions {
            child_list: false,
            subtree: true,
            attributes: true,
        },
        Box::new(move |_: &mut Document, batch: &MutationBatch| {
            *sink.borrow_mut() += batch
                .records
                .iter()
                .filter(|r| r.kind == MutationKind::Attributes)
                .count();
        }),
    )
    .unwrap();

    let feed = contents(&doc);
    let batch: String = (0..10).map(|i| item(&format!("React part {i}"))).collect();
    doc.append_fragment(feed, &batch).unwrap();
    assert_eq!(doc.deliver_mutations(), 1);
    // The spy sees the ten style writes on the next checkpoint; the filter sees nothing.
    assert_eq!(doc.deliver_mutations(), 1);
    assert_eq!(*style_writes.borrow(), 10);
    assert_eq!(doc.deliver_mutations(), 0);
    assert_eq!(doc.pending_records(), 0);
    assert_eq!(filter.state().unwrap().stats().batches, 1);
}

#[test]
fn evaluating_twice_hides_the_same_set() {
    init_logging();
    let mut doc = Document::parse(FEED);
    let selectors = ItemSelectors::default().compile().unwrap();
    let root = doc.root();
    let set = keywords(&["react", "vue"]);

    feed_filter_engine::evaluate(&mut doc, &[root], &set, &selectors);
    let once = hidden_titles(&doc);
    let again = feed_filter_engine::evaluate(&mut doc, &[root, root], &set, &selectors);

    assert_eq!(again.items_hidden, 0);
    assert_eq!(hidden_titles(&doc), once);
}

#[test]
fn items_inserted_before_and_right_after_activation_are_covered() {
    init_logging();
    let mut doc = Document::parse(FEED);
    let feed = contents(&doc);
    doc.append_fragment(feed, &item("React before activation")).unwrap();

    let mut filter = new_filter();
    filter.activate(&mut doc, keywords(&["react"])).unwrap();
    doc.append_fragment(feed, &item("React right after")).unwrap();
    doc.deliver_mutations();

    assert_eq!(
        hidden_titles(&doc),
        vec![
            "Learning React Hooks".to_string(),
            "React before activation".to_string(),
            "React right after".to_string()
        ]
    );
}

#[test]
fn retitled_item_is_reevaluated() {
    init_logging();
    let mut doc = Document::parse(FEED);
    let mut filter = new_filter();
    filter.activate(&mut doc, keywords(&["react"])).unwrap();

    let vue_title = doc
        .select(&css("h3.title"))
        .into_iter()
        .find(|id| doc.text_content(*id) == "Vue Basics")
        .unwrap();
    doc.append_fragment(vue_title, " vs React").unwrap();
    doc.deliver_mutations();

    assert_eq!(
        hidden_titles(&doc),
        vec![
            "Learning React Hooks".to_string(),
            "Vue Basics vs React".to_string()
        ]
    );
}

#[test]
fn nested_and_removed_roots_are_not_double_processed() {
    init_logging();
    let mut doc = Document::parse(FEED);
    let mut filter = new_filter();
    filter.activate(&mut doc, keywords(&["react"])).unwrap();

    let feed = contents(&doc);
    let shelf = doc.append_fragment(feed, "<div class='shelf'></div>").unwrap()[0];
    doc.append_fragment(shelf, &item("React shelf item")).unwrap();
    let gone = doc.append_fragment(feed, &item("React removed")).unwrap()[0];
    doc.remove(gone).unwrap();
    doc.deliver_mutations();

    let last = filter.state().unwrap().stats().last_batch;
    assert_eq!(last.roots_scanned, 1);
    assert_eq!(last.text_nodes_examined, 1);
    assert_eq!(last.items_hidden, 1);
}

#[test]
fn container_lookup_respects_depth_limit() {
    init_logging();
    let selectors = ItemSelectors {
        max_container_depth: 1,
        ..ItemSelectors::default()
    };
    let mut doc = Document::parse(FEED);
    let mut filter = LiveFilter::new(selectors.compile().unwrap());
    filter.activate(&mut doc, keywords(&["react"])).unwrap();

    // Seeded titles sit two or more levels below their containers.
    assert_eq!(doc.hidden_count(), 0);

    let feed = contents(&doc);
    doc.append_fragment(feed, &item("React shallow")).unwrap();
    doc.deliver_mutations();
    assert_eq!(hidden_titles(&doc), vec!["React shallow".to_string()]);
}

#[test]
fn deactivation_from_inside_a_callback_is_safe() {
    init_logging();
    let mut doc = Document::parse(FEED);
    let filter = Rc::new(RefCell::new(new_filter()));

    let root = doc.root();
    let handle = filter.clone();
    doc.observe(
        root,
        ObserveOptions::child_list_subtree(),
        Box::new(move |doc: &mut Document, _: &MutationBatch| {
            handle.borrow_mut().deactivate(doc);
        }),
    )
    .unwrap();
    filter
        .borrow_mut()
        .activate(&mut doc, keywords(&["svelte"]))
        .unwrap();

    let feed = contents(&doc);
    doc.append_fragment(feed, &item("Svelte tour")).unwrap();
    assert_eq!(doc.deliver_mutations(), 1);

    assert!(!filter.borrow().is_active());
    assert_eq!(doc.hidden_count(), 0);
    assert_eq!(doc.observer_count(), 1);
}

#[test]
fn unsupported_host_leaves_page_unfiltered() {
    init_logging();
    let mut doc = Document::without_observation(FEED);
    let mut filter = new_filter();

    let result = filter.activate(&mut doc, keywords(&["react"])).map(|_| ());

    assert_eq!(result, Err(ObserveError::Unsupported));
    assert!(!filter.is_active());
    assert_eq!(doc.hidden_count(), 0);
}
