//! Message rendering
//!
//! Destinations treat the body as an opaque string; [`PlainText`] is the
//! stock renderer.

use std::collections::BTreeMap;
use std::fmt::Write;

use contracts::{Collect, Reduxer};

/// Turns a record set (and optional bundle) into an outbound message body
pub trait Render: Send + Sync {
    fn render(&self, destination: &str, cols: &[Collect], reduxer: Option<&Reduxer>) -> String;
}

/// One block per source, sorted by source:
///
/// ```text
/// Example Domain
/// https://example.com
/// ia: https://web.archive.org/...
/// is: -
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl Render for PlainText {
    fn render(&self, _destination: &str, cols: &[Collect], reduxer: Option<&Reduxer>) -> String {
        let mut by_source: BTreeMap<&str, Vec<&Collect>> = BTreeMap::new();
        for col in cols {
            by_source.entry(col.source.as_str()).or_default().push(col);
        }

        let mut out = String::new();
        for (source, group) in by_source {
            if !out.is_empty() {
                out.push('\n');
            }
            let title = reduxer
                .and_then(|r| r.load(source))
                .and_then(|b| b.article.as_ref())
                .map(|a| a.title.trim())
                .filter(|t| !t.is_empty());
            if let Some(title) = title {
                let _ = writeln!(out, "{title}");
            }
            let _ = writeln!(out, "{source}");

            let mut group = group;
            group.sort_by_key(|c| c.slot);
            for col in group {
                let dest = if col.is_archived() {
                    col.destination.as_str()
                } else {
                    "-"
                };
                let _ = writeln!(out, "{}: {}", col.slot, dest);
            }
        }
        out
    }
}
