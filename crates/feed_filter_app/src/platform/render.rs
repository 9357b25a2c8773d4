use feed_filter_core::AdminViewModel;
use feed_filter_engine::{CompiledSelectors, Document, FilterStats};

/// What a filter run did to one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageSummary {
    pub items: usize,
    pub hidden_titles: Vec<String>,
    pub stats: Option<FilterStats>,
}

impl PageSummary {
    pub fn collect(document: &Document, selectors: &CompiledSelectors, stats: Option<FilterStats>) -> Self {
        let hidden_titles = document
            .select(selectors.item_container())
            .into_iter()
            .filter(|id| document.is_hidden(*id))
            .map(|id| collapse_whitespace(&document.text_content(id)))
            .collect();
        Self {
            items: document.select(selectors.item_container()).len(),
            hidden_titles,
            stats,
        }
    }
}

pub(crate) fn render_admin(view: &AdminViewModel) -> String {
    let mut out = String::new();
    let status = if view.enabled { "enabled" } else { "disabled" };
    out.push_str(&format!(
        "Filtering {} ({} keywords) [{}]\n",
        status,
        view.keywords.len(),
        view.toggle_label
    ));
    for keyword in &view.keywords {
        out.push_str(&format!("  - {keyword}\n"));
    }
    if let Some(error) = &view.last_error {
        out.push_str(&format!("Warning: {error}\n"));
    }
    out
}

pub(crate) fn render_page(name: &str, summary: &PageSummary) -> String {
    let mut out = format!(
        "{}: {} items, {} hidden\n",
        name,
        summary.items,
        summary.hidden_titles.len()
    );
    for title in &summary.hidden_titles {
        out.push_str(&format!("  x {title}\n"));
    }
    if let Some(stats) = &summary.stats {
        out.push_str(&format!(
            "  ({} batches, {} titles examined)\n",
            stats.batches, stats.text_nodes_examined
        ));
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
