use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use smol_str::SmolStr;

/// Ordered list of unique strings.
///
/// Iteration follows first-insertion order. Empty strings are never stored:
/// inserting one is treated as "already present".
#[derive(Debug, Clone, Default)]
pub struct StrList {
    items: IndexSet<SmolStr, FxBuildHasher>,
}

impl StrList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value`, returning `true` if it was not present before.
    pub fn insert(&mut self, value: &str) -> bool {
        if value.is_empty() || self.items.contains(value) {
            return false;
        }
        self.items.insert(SmolStr::new(value))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|s| s.as_str())
    }

    pub fn join(&self, delimiter: &str) -> String {
        self.iter().collect::<Vec<_>>().join(delimiter)
    }

    pub fn to_vec(&self) -> Vec<SmolStr> {
        self.items.iter().cloned().collect()
    }
}
