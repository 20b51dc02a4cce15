//! Page element snapshots shared by all session implementations.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Snapshot of one DOM element: its rendered text and attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageElement {
    pub text: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl PageElement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Link target, resolved to an absolute URL by the session.
    pub fn href(&self) -> Option<&str> {
        self.attr("href")
    }
}

/// Element to click: a CSS selector, optionally narrowed to elements whose
/// text contains a given string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickTarget {
    pub selector: String,
    pub text: Option<String>,
}

impl ClickTarget {
    pub fn selector(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            text: None,
        }
    }

    pub fn with_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            text: Some(text.into()),
        }
    }

    pub fn matches_text(&self, element_text: &str) -> bool {
        self.text
            .as_deref()
            .map_or(true, |needle| element_text.contains(needle))
    }
}

impl fmt::Display for ClickTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => write!(f, "{} containing {:?}", self.selector, text),
            None => write!(f, "{}", self.selector),
        }
    }
}
