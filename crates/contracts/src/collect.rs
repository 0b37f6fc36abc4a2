//! Collect - archive outcome records
//!
//! One `Collect` per (page, archive slot) attempt.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Archive service that produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    /// Internet Archive
    Ia,
    /// archive.today
    Is,
    /// IPFS
    Ip,
    /// Telegraph
    Ph,
}

impl Slot {
    /// All slots in display order
    pub const ALL: [Slot; 4] = [Slot::Ia, Slot::Is, Slot::Ip, Slot::Ph];

    /// Short identifier (`ia`, `is`, `ip`, `ph`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Ia => "ia",
            Slot::Is => "is",
            Slot::Ip => "ip",
            Slot::Ph => "ph",
        }
    }

    /// Human readable service name
    pub fn display_name(&self) -> &'static str {
        match self {
            Slot::Ia => "Internet Archive",
            Slot::Is => "archive.today",
            Slot::Ip => "IPFS",
            Slot::Ph => "Telegraph",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One archive outcome for one page in one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collect {
    /// Originally requested page
    pub source: String,

    /// Archived copy location, empty when archiving failed
    #[serde(default)]
    pub destination: String,

    /// Archive service
    pub slot: Slot,
}

impl Collect {
    pub fn new(source: impl Into<String>, destination: impl Into<String>, slot: Slot) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            slot,
        }
    }

    /// Whether the slot produced an archived copy
    pub fn is_archived(&self) -> bool {
        !self.destination.trim().is_empty()
    }
}

/// Partition collects by their source.
///
/// Every input record lands in exactly one group; relative order within a
/// group follows the input.
pub fn group_by_source(cols: &[Collect]) -> HashMap<String, Vec<Collect>> {
    let mut parts: HashMap<String, Vec<Collect>> = HashMap::new();
    for col in cols {
        parts.entry(col.source.clone()).or_default().push(col.clone());
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Collect> {
        vec![
            Collect::new("https://example.com/", "https://web.archive.org/x", Slot::Ia),
            Collect::new("https://example.org/", "", Slot::Ia),
            Collect::new("https://example.com/", "https://archive.ph/y", Slot::Is),
            Collect::new("https://example.org/", "https://telegra.ph/z", Slot::Ph),
            Collect::new("https://example.com/", "", Slot::Ip),
        ]
    }

    #[test]
    fn test_group_by_source_is_lossless() {
        let cols = sample();
        let parts = group_by_source(&cols);

        assert_eq!(parts.len(), 2);
        let total: usize = parts.values().map(Vec::len).sum();
        assert_eq!(total, cols.len());

        for (source, part) in &parts {
            assert!(part.iter().all(|c| &c.source == source));
        }
        for col in &cols {
            let count = parts[&col.source].iter().filter(|c| *c == col).count();
            assert_eq!(count, 1, "record {col:?} must appear exactly once");
        }
    }

    #[test]
    fn test_group_keeps_input_order() {
        let parts = group_by_source(&sample());
        let slots: Vec<Slot> = parts["https://example.com/"].iter().map(|c| c.slot).collect();
        assert_eq!(slots, vec![Slot::Ia, Slot::Is, Slot::Ip]);
    }

    #[test]
    fn test_group_empty() {
        assert!(group_by_source(&[]).is_empty());
    }

    #[test]
    fn test_collect_json_shape() {
        let col: Collect = serde_json::from_str(
            r#"{"source":"https://example.com/","destination":"https://archive.ph/a","slot":"is"}"#,
        )
        .unwrap();
        assert_eq!(col.slot, Slot::Is);
        assert!(col.is_archived());

        let failed: Collect =
            serde_json::from_str(r#"{"source":"https://example.com/","slot":"ip"}"#).unwrap();
        assert!(!failed.is_archived());
    }
}
