//! Reduxer - source-keyed auxiliary artifacts
//!
//! Produced by the capture pipeline and only read by the publish layer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Files captured for one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default)]
    pub img: Option<PathBuf>,
    #[serde(default)]
    pub pdf: Option<PathBuf>,
    #[serde(default)]
    pub raw: Option<PathBuf>,
    #[serde(default)]
    pub txt: Option<PathBuf>,
    #[serde(default)]
    pub har: Option<PathBuf>,
    #[serde(default)]
    pub htm: Option<PathBuf>,
    #[serde(default)]
    pub warc: Option<PathBuf>,
    #[serde(default)]
    pub media: Option<PathBuf>,
}

/// Readability output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
}

/// Everything captured for a single source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(default)]
    pub artifact: Artifact,
    #[serde(default)]
    pub article: Option<Article>,
}

/// Source -> Bundle store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reduxer {
    bundles: HashMap<String, Bundle>,
}

impl Reduxer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, bundle: Bundle) {
        self.bundles.insert(source.into(), bundle);
    }

    /// Bundle captured for `source`
    pub fn load(&self, source: &str) -> Option<&Bundle> {
        self.bundles.get(source)
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}
