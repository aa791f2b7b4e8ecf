//! Lesson icon with a one-shot placeholder fallback.

use storefront_catalog::CatalogItem;

use crate::config::ClientConfig;

/// Icon source for one rendered lesson.
///
/// A broken icon is swapped for the placeholder exactly once; if the
/// placeholder fails too, it stays put instead of looping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemIcon {
    src: String,
    placeholder: String,
    fell_back: bool,
}

impl ItemIcon {
    pub fn new(src: Option<&str>, placeholder: impl Into<String>) -> Self {
        let placeholder = placeholder.into();
        match src.map(str::trim).filter(|s| !s.is_empty()) {
            Some(src) => Self {
                src: src.to_string(),
                placeholder,
                fell_back: false,
            },
            None => Self {
                src: placeholder.clone(),
                placeholder,
                fell_back: true,
            },
        }
    }

    pub fn for_item(item: &CatalogItem, config: &ClientConfig) -> Self {
        Self::new(item.icon.as_deref(), config.placeholder_icon.clone())
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn is_placeholder(&self) -> bool {
        self.fell_back
    }

    /// Report a load failure. Returns `true` if the source was swapped.
    pub fn on_load_error(&mut self) -> bool {
        if self.fell_back {
            return false;
        }
        tracing::debug!(broken = %self.src, placeholder = %self.placeholder, "icon fallback");
        self.src = self.placeholder.clone();
        self.fell_back = true;
        true
    }
}
