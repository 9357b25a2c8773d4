use scraper::Selector;
use serde::{Deserialize, Serialize};

const DEFAULT_MAX_CONTAINER_DEPTH: usize = 32;

/// Which elements carry item titles and which ancestor is the hideable item.
///
/// Tied to the host page's markup, so it is loaded from configuration rather
/// than fixed in code. The defaults match the video feed layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemSelectors {
    pub item_text: Vec<String>,
    pub item_container: Vec<String>,
    /// Ancestor levels climbed when resolving a container.
    pub max_container_depth: usize,
}

impl Default for ItemSelectors {
    fn default() -> Self {
        Self {
            item_text: vec!["h3.title".to_string(), "yt-formatted-string".to_string()],
            item_container: vec![
                "ytd-video-renderer".to_string(),
                "ytd-rich-item-renderer".to_string(),
            ],
            max_container_depth: DEFAULT_MAX_CONTAINER_DEPTH,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("no {role} selectors configured")]
    Empty { role: &'static str },
    #[error("invalid {role} selector `{selector}`: {message}")]
    Invalid {
        role: &'static str,
        selector: String,
        message: String,
    },
}

impl ItemSelectors {
    pub fn compile(&self) -> Result<CompiledSelectors, SelectorError> {
        Ok(CompiledSelectors {
            item_text: compile_group("item text", &self.item_text)?,
            item_container: compile_group("item container", &self.item_container)?,
            max_container_depth: self.max_container_depth,
        })
    }
}

fn compile_group(role: &'static str, selectors: &[String]) -> Result<Selector, SelectorError> {
    let parts: Vec<&str> = selectors
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        return Err(SelectorError::Empty { role });
    }
    let joined = parts.join(", ");
    Selector::parse(&joined).map_err(|err| SelectorError::Invalid {
        role,
        selector: joined.clone(),
        message: err.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub(crate) item_text: Selector,
    pub(crate) item_container: Selector,
    pub(crate) max_container_depth: usize,
}

impl CompiledSelectors {
    pub fn item_text(&self) -> &Selector {
        &self.item_text
    }

    pub fn item_container(&self) -> &Selector {
        &self.item_container
    }

    pub fn max_container_depth(&self) -> usize {
        self.max_container_depth
    }
}
