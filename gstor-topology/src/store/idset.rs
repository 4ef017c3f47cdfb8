use serde::{Deserialize, Serialize};

/// Sorted, duplicate-free set of entity ids.
///
/// Membership lists (a cluster's nodes, a node's devices, ...) are kept in
/// lexicographic order so iteration is deterministic. `insert` and `remove`
/// are the only mutators.
///
/// An empty set is stored as "absent". Decoding an absent or unsorted list
/// always yields a valid, possibly empty, set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<Vec<String>>", into = "Option<Vec<String>>")]
pub struct IdSet(Vec<String>);

impl IdSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add `id`. Returns `false` and leaves the set unchanged if already present.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        match self.0.binary_search(&id) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, id);
                true
            }
        }
    }

    /// Remove `id`. Returns whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.0.binary_search_by(|probe| probe.as_str().cmp(id)) {
            Ok(pos) => {
                self.0.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0
            .binary_search_by(|probe| probe.as_str().cmp(id))
            .is_ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

impl From<Option<Vec<String>>> for IdSet {
    fn from(ids: Option<Vec<String>>) -> Self {
        let mut ids = ids.unwrap_or_default();
        ids.sort();
        ids.dedup();
        Self(ids)
    }
}

impl From<IdSet> for Option<Vec<String>> {
    fn from(set: IdSet) -> Self {
        if set.0.is_empty() { None } else { Some(set.0) }
    }
}

impl FromIterator<String> for IdSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Some(iter.into_iter().collect::<Vec<_>>()).into()
    }
}

impl<'a> IntoIterator for &'a IdSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
