//! The query text, its mutation counter and the suggestion suppression flag.

/// Monotonic tag stamped on every query mutation and every request issued for it
pub type Seq = u64;

/// Outcome of a [`QueryStore::set_query`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryChange {
    pub seq: Seq,
    /// The text differs from the previous value
    pub changed: bool,
    /// The text is now empty
    pub became_empty: bool,
}

#[derive(Debug, Clone, Default)]
pub struct QueryStore {
    text: String,
    seq: Seq,
    committed: Option<String>,
    suppressed: bool,
}

impl QueryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn seq(&self) -> Seq {
        self.seq
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Length in characters, which is what the suggestion threshold counts
    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// The last submitted or accepted text
    pub fn committed(&self) -> Option<&str> {
        self.committed.as_deref()
    }

    /// A response tagged `seq` still describes the current query
    pub fn is_current(&self, seq: Seq) -> bool {
        self.seq == seq
    }

    /// Record a new value. Every call advances the sequence number, so
    /// requests issued before it become stale even if the text is unchanged.
    pub fn set_query(&mut self, text: impl Into<String>) -> QueryChange {
        let text = text.into();
        let changed = text != self.text;
        self.text = text;
        self.seq += 1;

        if self.committed.as_deref() != Some(self.text.as_str()) {
            self.suppressed = false;
        }

        QueryChange {
            seq: self.seq,
            changed,
            became_empty: self.text.is_empty(),
        }
    }

    /// Mark the current text as submitted and suppress suggestions until it is edited
    pub fn commit(&mut self) -> Seq {
        self.committed = Some(self.text.clone());
        self.suppressed = true;
        self.seq
    }
}
