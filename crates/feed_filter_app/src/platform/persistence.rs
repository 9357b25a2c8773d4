use std::fs;
use std::path::Path;

use anyhow::Context;
use feed_filter_engine::{decode_page, write_atomic, Document, ItemSelectors};
use feed_logging::{feed_info, feed_warn};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct KeywordExport<'a> {
    exported_utc: String,
    keywords: &'a [String],
}

/// Selector overrides from a RON file, or the built-in defaults.
pub(crate) fn load_selectors(path: Option<&Path>) -> anyhow::Result<ItemSelectors> {
    let Some(path) = path else {
        return Ok(ItemSelectors::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading selectors from {}", path.display()))?;
    let selectors: ItemSelectors = ron::from_str(&content)
        .with_context(|| format!("parsing selectors in {}", path.display()))?;
    feed_info!("Loaded item selectors from {:?}", path);
    Ok(selectors)
}

/// Decode a saved HTML file; `Document` baseline is the decoded markup.
pub(crate) fn load_page(path: &Path) -> anyhow::Result<Document> {
    let bytes = fs::read(path).with_context(|| format!("reading page {}", path.display()))?;
    let decoded = decode_page(&bytes, None)
        .with_context(|| format!("decoding page {}", path.display()))?;
    if decoded.encoding_label != "UTF-8" {
        feed_warn!("{:?} decoded as {}", path, decoded.encoding_label);
    }
    Ok(Document::parse(&decoded.html))
}

pub(crate) fn read_fragment(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path).with_context(|| format!("reading fragment {}", path.display()))?;
    let decoded = decode_page(&bytes, None)
        .with_context(|| format!("decoding fragment {}", path.display()))?;
    Ok(decoded.html)
}

pub(crate) fn export_json(keywords: &[String], exported_utc: String) -> anyhow::Result<String> {
    let export = KeywordExport {
        exported_utc,
        keywords,
    };
    Ok(serde_json::to_string_pretty(&export)?)
}

/// Write the export to `out`, or return it for printing when `out` is `None`.
pub(crate) fn write_export(out: Option<&Path>, content: &str) -> anyhow::Result<Option<String>> {
    match out {
        Some(path) => {
            write_atomic(path, content)
                .with_context(|| format!("writing export to {}", path.display()))?;
            feed_info!("Exported keywords to {:?}", path);
            Ok(None)
        }
        None => Ok(Some(content.to_string())),
    }
}

pub(crate) fn write_filtered_page(path: &Path, document: &Document) -> anyhow::Result<()> {
    write_atomic(path, &document.filtered_html())
        .with_context(|| format!("writing filtered page to {}", path.display()))
}
