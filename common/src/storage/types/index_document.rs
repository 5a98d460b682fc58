use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

static DOCUMENT_SEQUENCE: AtomicU64 = AtomicU64::new(0);
static LAST_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Process-unique, time-ordered document id: a zero-padded millisecond
/// timestamp followed by a zero-padded monotonic sequence number, so ids sort
/// lexicographically in creation order.
pub fn next_document_id() -> String {
    compose_id(Utc::now().timestamp_millis().max(0))
}

/// The timestamp part never goes below the highest one already issued, so a
/// wall clock stepping backwards cannot reorder ids.
fn compose_id(now_millis: i64) -> String {
    let millis = LAST_MILLIS
        .fetch_max(now_millis, Ordering::Relaxed)
        .max(now_millis);
    let sequence = DOCUMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{millis:013}-{sequence:020}")
}

/// One result URL as written to the index store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexDocument {
    pub id: String,
    pub doc_type: String,
    pub url: String,
}

/// Stored record body; the id travels as the record key.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentBody {
    pub url: String,
    pub doc_type: String,
}

impl IndexDocument {
    pub fn new(doc_type: &str, url: impl Into<String>) -> Self {
        Self {
            id: next_document_id(),
            doc_type: doc_type.to_string(),
            url: url.into(),
        }
    }

    pub fn body(&self) -> DocumentBody {
        DocumentBody {
            url: self.url.clone(),
            doc_type: self.doc_type.clone(),
        }
    }
}
