//! Word-to-object association table with pluggable hashing/comparison and
//! DFS-based spell correction.

pub mod correct;
pub mod trie;

use std::cell::RefCell;
use std::collections::HashMap;

use crate::object_table::Collectible;
use crate::undo::{UndoRecord, Undoable};
use crate::value::{ObjectId, PropId};

use trie::Trie;

/// Capability set a dictionary comparator must implement. A generic
/// comparator's callbacks would run
/// through the interpreter's recursive-call mechanism in a full VM; that
/// plumbing is out of scope here, so this trait is the seam a host
/// implements directly or satisfies with [`StringComparator`].
pub trait Comparator {
    /// Hash of `s`, used to bucket entries.
    fn calc_hash(&self, s: &str) -> u64;

    /// Match quality between a stored `candidate` and a lookup `query`:
    /// zero means no match, any non-zero value is exposed to callers as the
    /// match quality.
    fn match_values(&self, candidate: &str, query: &str) -> i32;

    /// Canonical form of `s` used as the hash-table/trie key (e.g. folds
    /// case); identity by default.
    fn normalize_key(&self, s: &str) -> String {
        s.to_string()
    }

    /// If set, spell correction may accept a match once the built word
    /// reaches this length even with unconsumed input left over.
    fn truncation_len(&self) -> Option<usize> {
        None
    }
}

/// The byte-exact comparator used when no custom comparator object is
/// installed: FNV-1a hash, exact string equality.
pub struct StringComparator {
    case_fold: bool,
}

impl StringComparator {
    /// A comparator with exact (case-sensitive) matching.
    pub fn new() -> Self {
        Self { case_fold: false }
    }

    /// A comparator that folds ASCII case before hashing/matching/keying.
    pub fn case_folding() -> Self {
        Self { case_fold: true }
    }
}

impl Default for StringComparator {
    fn default() -> Self {
        Self::new()
    }
}

impl Comparator for StringComparator {
    fn calc_hash(&self, s: &str) -> u64 {
        fnv1a(&self.normalize_key(s))
    }

    fn match_values(&self, candidate: &str, query: &str) -> i32 {
        if self.normalize_key(candidate) == self.normalize_key(query) {
            1
        } else {
            0
        }
    }

    fn normalize_key(&self, s: &str) -> String {
        if self.case_fold {
            s.to_lowercase()
        } else {
            s.to_string()
        }
    }
}

fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in s.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// One word-to-object association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub obj: ObjectId,
    pub prop: Option<PropId>,
    pub from_image: bool,
}

enum DictUndo {
    Add { index: usize },
    Remove { index: usize, word: String, assoc: Association },
    ComparatorChange { old: RefCell<Option<Box<dyn Comparator>>> },
}

/// A dictionary instance.
pub struct Dictionary {
    id: ObjectId,
    comparator: Box<dyn Comparator>,
    /// Flat, tombstone-on-delete entry store so undo records can reference
    /// entries by stable index.
    entries: Vec<Option<(String, Association)>>,
    /// Normalized-key → entry indices; the dictionary's hash table.
    index: HashMap<String, Vec<usize>>,
    trie: Option<Trie>,
    modified_since_load: bool,
}

impl Dictionary {
    /// A new, empty dictionary using the default [`StringComparator`].
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            comparator: Box::new(StringComparator::new()),
            entries: Vec::new(),
            index: HashMap::new(),
            trie: None,
            modified_since_load: false,
        }
    }

    /// Whether any mutation has occurred since the dictionary was
    /// loaded/restored.
    pub fn modified_since_load(&self) -> bool {
        self.modified_since_load
    }

    /// Insert one word/object/property association.
    pub fn add(&mut self, word: &str, obj: ObjectId, prop: Option<PropId>, from_image: bool) -> UndoRecord {
        let index = self.entries.len();
        self.entries.push(Some((word.to_string(), Association { obj, prop, from_image })));
        let key = self.comparator.normalize_key(word);
        self.index.entry(key.clone()).or_default().push(index);
        if let Some(trie) = &mut self.trie {
            trie.insert(&key);
        }
        self.modified_since_load = true;
        UndoRecord::new(self.id, index as i64, Box::new(DictUndo::Add { index }))
    }

    /// Insert one association per word in `words`.
    pub fn add_all(&mut self, words: &[&str], obj: ObjectId, prop: Option<PropId>, from_image: bool) -> Vec<UndoRecord> {
        words.iter().map(|w| self.add(w, obj, prop, from_image)).collect()
    }

    /// Remove the association matching `word`/`obj`/`prop` (`prop = None`
    /// matches any property), if present.
    pub fn del(&mut self, word: &str, obj: ObjectId, prop: Option<PropId>) -> Option<UndoRecord> {
        let key = self.comparator.normalize_key(word);
        let bucket = self.index.get_mut(&key)?;
        let pos = bucket.iter().position(|&idx| {
            matches!(&self.entries[idx], Some((_, a)) if a.obj == obj && (prop.is_none() || a.prop == prop))
        })?;
        let index = bucket.remove(pos);
        if bucket.is_empty() {
            self.index.remove(&key);
        }
        let (word, assoc) = self.entries[index].take().expect("index pointed at a live entry");
        if let Some(trie) = &mut self.trie {
            trie.remove(&key);
        }
        self.modified_since_load = true;
        Some(UndoRecord::new(self.id, index as i64, Box::new(DictUndo::Remove { index, word, assoc })))
    }

    /// Remove the association for each word in `words`, skipping words with
    /// no matching entry.
    pub fn del_all(&mut self, words: &[&str], obj: ObjectId, prop: Option<PropId>) -> Vec<UndoRecord> {
        words.iter().filter_map(|w| self.del(w, obj, prop)).collect()
    }

    /// All `(obj, match_quality)` pairs matching `query`, optionally
    /// filtered to a single property.
    pub fn find(&self, query: &str, prop: Option<PropId>) -> Vec<(ObjectId, i32)> {
        let key = self.comparator.normalize_key(query);
        let Some(bucket) = self.index.get(&key) else {
            return Vec::new();
        };
        bucket
            .iter()
            .filter_map(|&idx| self.entries[idx].as_ref())
            .filter(|(_, a)| prop.is_none() || a.prop == prop)
            .filter_map(|(word, a)| {
                let quality = self.comparator.match_values(word, query);
                (quality != 0).then_some((a.obj, quality))
            })
            .collect()
    }

    /// True if any entry matches `query`, optionally counting only matches
    /// for which `filter` returns `true` on the match quality.
    pub fn is_defined(&self, query: &str, filter: Option<&dyn Fn(i32) -> bool>) -> bool {
        self.find(query, None).into_iter().any(|(_, quality)| filter.map_or(true, |f| f(quality)))
    }

    /// Invoke `f(obj, word, prop)` for every live association, over a
    /// snapshot taken before iteration begins.
    pub fn for_each_word(&self, f: &mut dyn FnMut(ObjectId, &str, Option<PropId>)) {
        let snapshot: Vec<(String, Association)> = self.entries.iter().flatten().cloned().collect();
        for (word, assoc) in &snapshot {
            f(assoc.obj, word, assoc.prop);
        }
    }

    /// Install a new comparator, rebuilding the hash table (and trie, if
    /// built) under it.
    pub fn set_comparator(&mut self, new: Box<dyn Comparator>) -> UndoRecord {
        let old = std::mem::replace(&mut self.comparator, new);
        self.rebuild_index();
        self.modified_since_load = true;
        UndoRecord::new(
            self.id,
            0,
            Box::new(DictUndo::ComparatorChange { old: RefCell::new(Some(old)) }),
        )
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (idx, slot) in self.entries.iter().enumerate() {
            if let Some((word, _)) = slot {
                let key = self.comparator.normalize_key(word);
                self.index.entry(key).or_default().push(idx);
            }
        }
        if self.trie.is_some() {
            self.trie = Some(self.build_trie());
        }
    }

    fn build_trie(&self) -> Trie {
        let keys: Vec<String> = self.entries.iter().flatten().map(|(w, _)| self.comparator.normalize_key(w)).collect();
        Trie::build(keys.iter().map(|s| s.as_str()))
    }

    /// Spell-correct `word`, lazily building the trie on first use.
    pub fn correct(&mut self, word: &str, max_dist: u32) -> Vec<(String, u32, u32)> {
        if self.trie.is_none() {
            self.trie = Some(self.build_trie());
        }
        let key = self.comparator.normalize_key(word);
        correct::correct(self.trie.as_ref().expect("just built"), &key, max_dist, self.comparator.truncation_len())
    }
}

impl Undoable for Dictionary {
    fn apply_undo(&mut self, record: &UndoRecord) {
        match record.extra::<DictUndo>() {
            Some(DictUndo::Add { index }) => {
                if let Some((word, _)) = self.entries[*index].take() {
                    let key = self.comparator.normalize_key(&word);
                    if let Some(bucket) = self.index.get_mut(&key) {
                        bucket.retain(|&i| i != *index);
                        if bucket.is_empty() {
                            self.index.remove(&key);
                        }
                    }
                    if let Some(trie) = &mut self.trie {
                        trie.remove(&key);
                    }
                }
            }
            Some(DictUndo::Remove { index, word, assoc }) => {
                self.entries[*index] = Some((word.clone(), assoc.clone()));
                let key = self.comparator.normalize_key(word);
                self.index.entry(key.clone()).or_default().push(*index);
                if let Some(trie) = &mut self.trie {
                    trie.insert(&key);
                }
            }
            Some(DictUndo::ComparatorChange { old }) => {
                if let Some(prev) = old.borrow_mut().take() {
                    self.comparator = prev;
                    self.rebuild_index();
                }
            }
            None => {}
        }
    }
}

impl Collectible for Dictionary {
    /// Dictionary references into the object graph are weak, so the
    /// dictionary itself never keeps a referenced object alive.
    fn mark_refs(&self, _visit: &mut dyn FnMut(ObjectId)) {}

    fn remove_stale_weak_refs(&mut self, is_dying: &dyn Fn(ObjectId) -> bool) {
        let dying_indices: Vec<(usize, String)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().filter(|(_, a)| is_dying(a.obj)).map(|(w, _)| (idx, w.clone())))
            .collect();
        for (idx, word) in dying_indices {
            self.entries[idx] = None;
            let key = self.comparator.normalize_key(&word);
            if let Some(bucket) = self.index.get_mut(&key) {
                bucket.retain(|&i| i != idx);
                if bucket.is_empty() {
                    self.index.remove(&key);
                }
            }
            if let Some(trie) = &mut self.trie {
                trie.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> ObjectId {
        ObjectId::new(n).unwrap()
    }

    #[test]
    fn add_then_find_returns_association_with_quality() {
        let mut dict = Dictionary::new(id(1));
        dict.add("lamp", id(2), None, false);
        let matches = dict.find("lamp", None);
        assert_eq!(matches, vec![(id(2), 1)]);
    }

    #[test]
    fn add_then_undo_removes_the_association() {
        let mut dict = Dictionary::new(id(1));
        let rec = dict.add("lamp", id(2), None, false);
        dict.apply_undo(&rec);
        assert!(dict.find("lamp", None).is_empty());
    }

    #[test]
    fn del_then_undo_restores_the_association() {
        let mut dict = Dictionary::new(id(1));
        dict.add("lamp", id(2), None, false);
        let rec = dict.del("lamp", id(2), None).unwrap();
        assert!(dict.find("lamp", None).is_empty());
        dict.apply_undo(&rec);
        assert_eq!(dict.find("lamp", None), vec![(id(2), 1)]);
    }

    #[test]
    fn set_comparator_undo_restores_previous_matching_behavior() {
        let mut dict = Dictionary::new(id(1));
        dict.add("Lamp", id(2), None, false);
        assert!(dict.find("lamp", None).is_empty());
        let rec = dict.set_comparator(Box::new(StringComparator::case_folding()));
        assert_eq!(dict.find("lamp", None), vec![(id(2), 1)]);
        dict.apply_undo(&rec);
        assert!(dict.find("lamp", None).is_empty());
    }

    #[test]
    fn weak_refs_to_dying_objects_are_dropped() {
        let mut dict = Dictionary::new(id(1));
        dict.add("lamp", id(2), None, false);
        dict.remove_stale_weak_refs(&|o| o == id(2));
        assert!(dict.find("lamp", None).is_empty());
    }

    #[test]
    fn correct_finds_close_misspelling() {
        let mut dict = Dictionary::new(id(1));
        dict.add("lamp", id(2), None, false);
        let corrections = dict.correct("lams", 2);
        assert!(corrections.iter().any(|(w, d, _)| w == "lamp" && *d == 1));
    }

    #[test]
    fn for_each_word_visits_every_live_entry() {
        let mut dict = Dictionary::new(id(1));
        dict.add("lamp", id(2), None, false);
        dict.add("sword", id(3), None, false);
        let mut seen = Vec::new();
        dict.for_each_word(&mut |obj, word, _| seen.push((obj, word.to_string())));
        seen.sort_by_key(|(o, _)| o.get());
        assert_eq!(seen, vec![(id(2), "lamp".to_string()), (id(3), "sword".to_string())]);
    }
}
