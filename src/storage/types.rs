use thiserror::Error;

use crate::feed::Item;

// ============================================================================
// Error Types
// ============================================================================

/// Head store errors with user-friendly messages
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another process holds the database lock
    #[error("Head store is locked by another process. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Head store migration failed: {0}")]
    Migration(String),

    /// The store was used after `close()`
    #[error("Head store is closed")]
    Closed,

    /// Failure reported by a custom store implementation
    #[error("Head store backend error: {0}")]
    Backend(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Map a sqlx error, recognising SQLite lock conditions
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return StoreError::InstanceLocked;
        }
        StoreError::Database(err)
    }
}

// SQLITE_BUSY (5), SQLITE_LOCKED (6)
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
}

// ============================================================================
// Data Structures
// ============================================================================

/// Last-seen checkpoint for one feed.
///
/// Captures the newest item at the end of the previous successful poll.
/// Empty strings are stored as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct HeadMarker {
    pub title: Option<String>,
    pub updated: Option<String>,
    pub published: Option<String>,
}

impl HeadMarker {
    pub fn from_item(item: &Item) -> Self {
        Self {
            title: non_empty(&item.title),
            updated: item.updated.as_deref().and_then(non_empty),
            published: item.published.as_deref().and_then(non_empty),
        }
    }

    /// Title used as the diff key; an absent title compares as `""`.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_from_item_copies_fields() {
        let item = Item {
            title: "C".into(),
            published: Some("2024-03-02T09:00:00Z".into()),
            updated: Some("2024-03-02T10:00:00Z".into()),
            ..Item::default()
        };
        let head = HeadMarker::from_item(&item);
        assert_eq!(head.title(), "C");
        assert_eq!(head.published.as_deref(), Some("2024-03-02T09:00:00Z"));
        assert_eq!(head.updated.as_deref(), Some("2024-03-02T10:00:00Z"));
    }

    #[test]
    fn test_head_from_untitled_item() {
        let head = HeadMarker::from_item(&Item {
            updated: Some(String::new()),
            ..Item::default()
        });
        assert_eq!(head, HeadMarker::default());
        assert_eq!(head.title(), "");
    }

    #[test]
    fn test_lock_messages_detected() {
        assert!(is_lock_message("error returned from database: (code: 5) database is locked"));
        assert!(is_lock_message("SQLITE_BUSY"));
        assert!(!is_lock_message("no such table: feed_heads"));
        assert!(!is_lock_message("unable to open database file"));
    }
}
