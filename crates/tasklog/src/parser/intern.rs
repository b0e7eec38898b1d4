use std::sync::Arc;
use dashmap::DashSet;
use once_cell::sync::Lazy;

static EMPTY: Lazy<Arc<str>> = Lazy::new(|| Arc::from(""));

/// Shared string pool for the short, highly repetitive fields of a log
/// (timestamps, process/thread ids, source files, function names).
///
/// The first occurrence of a string is stored; every later equal string
/// returns the same `Arc<str>`. Pooled content is never mutated.
/// The empty string is served from a static instance and not counted.
#[derive(Debug, Default)]
pub struct InternPool {
    entries: DashSet<Arc<str>>,
}

impl InternPool {
    pub fn new() -> Self {
        Self {
            entries: DashSet::new(),
        }
    }

    /// Return the canonical instance for `s`.
    pub fn intern(&self, s: &str) -> Arc<str> {
        if s.is_empty() {
            return Arc::clone(&EMPTY);
        }
        if let Some(existing) = self.entries.get(s) {
            return Arc::clone(existing.key());
        }
        let interned: Arc<str> = Arc::from(s);
        self.entries.insert(Arc::clone(&interned));
        interned
    }

    /// Absent input maps to the empty string.
    pub fn intern_opt(&self, s: Option<&str>) -> Arc<str> {
        self.intern(s.unwrap_or(""))
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of distinct pooled strings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
