use std::collections::{BTreeSet, HashMap};

use crate::error::MatchError;
use crate::model::{NameRecord, PoolTag};
use crate::normalize::{name_tokens, normalize};

/// Registration records still available for assignment, in insertion order.
///
/// Records live in fixed slots; claiming empties the slot rather than
/// shifting later records, so a slot index stays valid for the whole run.
/// `by_name` maps canonical full name to the live slots holding it.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    tag: PoolTag,
    slots: Vec<Option<NameRecord>>,
    by_name: HashMap<String, BTreeSet<usize>>,
    live: usize,
}

impl CandidatePool {
    pub fn new(tag: PoolTag, records: Vec<NameRecord>) -> Self {
        let mut by_name: HashMap<String, BTreeSet<usize>> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            by_name.entry(normalize(&record.full_name)).or_default().insert(i);
        }
        Self {
            tag,
            live: records.len(),
            slots: records.into_iter().map(Some).collect(),
            by_name,
        }
    }

    pub fn tag(&self) -> PoolTag {
        self.tag
    }

    /// Number of unclaimed records.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn get(&self, index: usize) -> Option<&NameRecord> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Unclaimed records with their slot index, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &NameRecord)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|r| (i, r)))
    }

    /// First unclaimed slot whose canonical full name equals `name`'s.
    pub fn find_index_by_name(&self, name: &str) -> Option<usize> {
        self.by_name
            .get(&normalize(name))
            .and_then(|slots| slots.iter().next().copied())
    }

    /// Remove and return the record at `index`.
    pub fn claim(&mut self, index: usize) -> Result<NameRecord, MatchError> {
        let record = self
            .slots
            .get_mut(index)
            .and_then(Option::take)
            .ok_or(MatchError::IndexOutOfRange { pool: self.tag, index })?;

        let key = normalize(&record.full_name);
        if let Some(slots) = self.by_name.get_mut(&key) {
            slots.remove(&index);
            if slots.is_empty() {
                self.by_name.remove(&key);
            }
        }
        self.live -= 1;
        Ok(record)
    }

    /// Unclaimed records, consuming the pool.
    pub fn into_remaining(self) -> Vec<NameRecord> {
        self.slots.into_iter().flatten().collect()
    }
}

/// Both partitions of the registration roster for one run.
#[derive(Debug, Clone)]
pub struct PoolSet {
    pub checked_in: CandidatePool,
    pub not_checked_in: CandidatePool,
}

impl PoolSet {
    pub fn new(checked_in: Vec<NameRecord>, not_checked_in: Vec<NameRecord>) -> Self {
        Self {
            checked_in: CandidatePool::new(PoolTag::CheckedIn, checked_in),
            not_checked_in: CandidatePool::new(PoolTag::NotCheckedIn, not_checked_in),
        }
    }

    pub fn get(&self, tag: PoolTag) -> &CandidatePool {
        match tag {
            PoolTag::CheckedIn => &self.checked_in,
            PoolTag::NotCheckedIn => &self.not_checked_in,
        }
    }

    pub fn get_mut(&mut self, tag: PoolTag) -> &mut CandidatePool {
        match tag {
            PoolTag::CheckedIn => &mut self.checked_in,
            PoolTag::NotCheckedIn => &mut self.not_checked_in,
        }
    }

    pub fn total_len(&self) -> usize {
        self.checked_in.len() + self.not_checked_in.len()
    }
}

/// Match-relevant name tokens: full-name tokens, then auxiliary surnames.
/// All tokens are normalized; blank auxiliary tokens are skipped.
pub fn components_for(record: &NameRecord) -> Vec<String> {
    let mut parts = name_tokens(&record.full_name);
    parts.extend(
        record
            .extra_name_tokens
            .iter()
            .map(|t| normalize(t))
            .filter(|t| !t.is_empty()),
    );
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(names: &[&str]) -> CandidatePool {
        CandidatePool::new(
            PoolTag::CheckedIn,
            names.iter().map(|n| NameRecord::new(*n)).collect(),
        )
    }

    #[test]
    fn find_index_is_case_insensitive() {
        let p = pool(&["Alex Lee", "Priya Patel"]);
        assert_eq!(p.find_index_by_name("PRIYA PATEL"), Some(1));
        assert_eq!(p.find_index_by_name(" alex lee "), Some(0));
        assert_eq!(p.find_index_by_name("Nobody"), None);
    }

    #[test]
    fn claim_removes_record() {
        let mut p = pool(&["Alex Lee", "Priya Patel"]);
        let claimed = p.claim(0).unwrap();
        assert_eq!(claimed.full_name, "Alex Lee");
        assert_eq!(p.len(), 1);
        assert_eq!(p.find_index_by_name("Alex Lee"), None);
        assert!(p.get(0).is_none());
        // Remaining slot keeps its index
        assert_eq!(p.find_index_by_name("Priya Patel"), Some(1));
        let remaining: Vec<_> = p.iter().map(|(i, r)| (i, r.full_name.clone())).collect();
        assert_eq!(remaining, vec![(1, "Priya Patel".to_string())]);
    }

    #[test]
    fn claim_twice_fails() {
        let mut p = pool(&["Alex Lee"]);
        p.claim(0).unwrap();
        assert_eq!(
            p.claim(0).unwrap_err(),
            MatchError::IndexOutOfRange { pool: PoolTag::CheckedIn, index: 0 }
        );
        assert!(p.is_empty());
    }

    #[test]
    fn claim_out_of_range() {
        let mut p = pool(&["Alex Lee"]);
        assert!(matches!(p.claim(5), Err(MatchError::IndexOutOfRange { index: 5, .. })));
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn duplicate_names_resolve_in_order() {
        let mut p = pool(&["Alex Lee", "Sam Wu", "alex lee"]);
        assert_eq!(p.find_index_by_name("Alex Lee"), Some(0));
        p.claim(0).unwrap();
        assert_eq!(p.find_index_by_name("Alex Lee"), Some(2));
        p.claim(2).unwrap();
        assert_eq!(p.find_index_by_name("Alex Lee"), None);
    }

    #[test]
    fn into_remaining_keeps_order() {
        let mut p = pool(&["A One", "B Two", "C Three"]);
        p.claim(1).unwrap();
        let names: Vec<_> = p.into_remaining().into_iter().map(|r| r.full_name).collect();
        assert_eq!(names, vec!["A One", "C Three"]);
    }

    #[test]
    fn components_append_buyer_surname() {
        let record = NameRecord::new("Mia Tran")
            .with_extra_token("Nguyen")
            .with_extra_token(" ");
        assert_eq!(components_for(&record), vec!["MIA", "TRAN", "NGUYEN"]);
    }

    #[test]
    fn pool_set_routes_by_tag() {
        let mut pools = PoolSet::new(
            vec![NameRecord::new("Alex Lee")],
            vec![NameRecord::new("Sam Wu"), NameRecord::new("Kai Ito")],
        );
        assert_eq!(pools.total_len(), 3);
        assert_eq!(pools.get(PoolTag::NotCheckedIn).len(), 2);
        pools.get_mut(PoolTag::NotCheckedIn).claim(1).unwrap();
        assert_eq!(pools.total_len(), 2);
    }
}
