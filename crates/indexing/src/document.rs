//! Search documents built from archive records.

use contracts::{group_by_source, Collect, Slot};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// One indexed document per source page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub source: String,
    pub ia: String,
    pub is: String,
    pub ip: String,
    pub ph: String,
}

impl Document {
    fn new(source: String) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            source,
            ia: String::new(),
            is: String::new(),
            ip: String::new(),
            ph: String::new(),
        }
    }

    fn set(&mut self, slot: Slot, destination: String) {
        match slot {
            Slot::Ia => self.ia = destination,
            Slot::Is => self.is = destination,
            Slot::Ip => self.ip = destination,
            Slot::Ph => self.ph = destination,
        }
    }
}

/// Build documents, sorted by source. Invalid destination URLs are blanked.
pub fn documents(cols: &[Collect]) -> Vec<Document> {
    let mut docs: Vec<Document> = group_by_source(cols)
        .into_iter()
        .map(|(source, part)| {
            let mut doc = Document::new(source);
            for col in part {
                let destination = match Url::parse(&col.destination) {
                    Ok(_) => col.destination,
                    Err(_) => String::new(),
                };
                doc.set(col.slot, destination);
            }
            doc
        })
        .collect();
    docs.sort_by(|a, b| a.source.cmp(&b.source));
    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_one_per_source() {
        let cols = vec![
            Collect::new("https://example.com/", "https://web.archive.org/web/1/https://example.com/", Slot::Ia),
            Collect::new("https://example.com/", "not a url", Slot::Is),
            Collect::new("https://example.org/", "https://telegra.ph/example", Slot::Ph),
        ];

        let docs = documents(&cols);
        assert_eq!(docs.len(), 2);

        let com = &docs[0];
        assert_eq!(com.source, "https://example.com/");
        assert!(com.ia.starts_with("https://web.archive.org/"));
        assert_eq!(com.is, "");
        assert_eq!(com.ph, "");

        let org = &docs[1];
        assert_eq!(org.ph, "https://telegra.ph/example");
        assert_ne!(com.id, org.id);
    }
}
