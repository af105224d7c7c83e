use crate::reification::{ReificationRow, ReificationStatementMask};
use graph_rdb_model::Subject;

/// The merged state of all rows of one reification node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReificationCacheEntry {
    node: Subject,
    mask: ReificationStatementMask,
    row_count: usize,
}

impl ReificationCacheEntry {
    /// Merges the masks of `rows`. The entry is complete if one of the rows is complete.
    pub fn from_rows(node: Subject, rows: &[ReificationRow]) -> Self {
        let mask = rows
            .iter()
            .fold(ReificationStatementMask::EMPTY, |mask, row| mask | row.mask());
        Self {
            node,
            mask,
            row_count: rows.len(),
        }
    }

    pub fn node(&self) -> &Subject {
        &self.node
    }

    pub fn mask(&self) -> ReificationStatementMask {
        self.mask
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }
}

/// Remembers the state of the most recently inspected reification node.
///
/// Only a single node is cached. Looking up another node evicts the previous entry.
#[derive(Debug, Default)]
pub struct ReificationCache {
    entry: Option<ReificationCacheEntry>,
}

impl ReificationCache {
    pub fn get(&self, node: &Subject) -> Option<&ReificationCacheEntry> {
        self.entry.as_ref().filter(|entry| entry.node == *node)
    }

    /// Stores the state of `node`, replacing whatever was cached before.
    pub fn load(&mut self, node: &Subject, rows: &[ReificationRow]) -> &ReificationCacheEntry {
        self.entry
            .insert(ReificationCacheEntry::from_rows(node.clone(), rows))
    }

    /// Drops the entry of `node` if it is cached.
    pub fn invalidate(&mut self, node: &Subject) {
        if self.get(node).is_some() {
            self.entry = None;
        }
    }

    pub fn flush(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_rdb_model::{NamedNode, Term};

    fn row(node: &Subject, subject: bool, has_type: bool) -> ReificationRow {
        ReificationRow {
            row_id: 0,
            node: node.clone(),
            subject: subject.then(|| Term::from(NamedNode::new_unchecked("http://example.com/s"))),
            predicate: None,
            object: None,
            has_type,
        }
    }

    #[test]
    fn single_slot() {
        let a: Subject = NamedNode::new_unchecked("http://example.com/a").into();
        let b: Subject = NamedNode::new_unchecked("http://example.com/b").into();
        let mut cache = ReificationCache::default();

        cache.load(&a, &[row(&a, true, false), row(&a, false, true)]);
        let entry = cache.get(&a).cloned();
        assert_eq!(entry.as_ref().map(ReificationCacheEntry::row_count), Some(2));
        assert_eq!(entry.map(|e| e.mask().to_string()), Some("ST".to_owned()));

        cache.load(&b, &[]);
        assert!(cache.get(&a).is_none());
        assert_eq!(cache.get(&b).map(ReificationCacheEntry::row_count), Some(0));

        cache.invalidate(&a);
        assert!(cache.get(&b).is_some());
        cache.invalidate(&b);
        assert!(cache.get(&b).is_none());
    }
}
