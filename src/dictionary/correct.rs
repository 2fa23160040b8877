//! Bounded edit-distance spell correction over a [`Trie`].
//!
//! The search is an explicit depth-first walk over the pair (input
//! position, trie node), carried on a plain `Vec` stack rather than
//! recursion, enumerating insertion/deletion/replacement/transposition
//! edits as it goes.

use std::collections::HashMap;

use super::trie::{Trie, TrieNode};

#[derive(Clone, Copy, PartialEq, Eq)]
enum EditKind {
    None,
    Insertion,
    Deletion,
    Replacement,
}

struct SearchState<'t> {
    node: &'t TrieNode,
    pos: usize,
    built: String,
    distance: u32,
    replacements: u32,
    last_edit: EditKind,
    /// Set when `last_edit == Replacement`: the input position and
    /// original character that were just replaced, consulted by the
    /// transposition transition on the very next step.
    pending_swap: Option<(usize, char)>,
}

/// Spell-correct `input` against `trie`, returning `(word, distance,
/// replacements)` triples for every distinct correction within `max_dist`
/// edits, excluding exact matches (distance 0). `truncation_len`, when set,
/// lets a match accept once the built word reaches that length even if
/// `input` has unconsumed characters left, for comparators that impose a
/// truncation length on matching.
pub fn correct(trie: &Trie, input: &str, max_dist: u32, truncation_len: Option<usize>) -> Vec<(String, u32, u32)> {
    let chars: Vec<char> = input.chars().collect();
    let mut best: HashMap<String, (u32, u32)> = HashMap::new();

    let mut stack = vec![SearchState {
        node: trie.root(),
        pos: 0,
        built: String::new(),
        distance: 0,
        replacements: 0,
        last_edit: EditKind::None,
        pending_swap: None,
    }];

    while let Some(state) = stack.pop() {
        let input_exhausted = state.pos >= chars.len();
        let prefix_reached_truncation = truncation_len.is_some_and(|n| state.built.chars().count() >= n);

        if (input_exhausted || prefix_reached_truncation) && state.node.word_count() > 0 {
            let entry = best.entry(state.built.clone()).or_insert((state.distance, state.replacements));
            if (state.distance, state.replacements) < *entry {
                *entry = (state.distance, state.replacements);
            }
        }

        if prefix_reached_truncation {
            continue;
        }

        // No-change: current input character matches a trie edge exactly.
        if let Some(&c) = chars.get(state.pos) {
            if let Some(child) = state.node.child(c) {
                stack.push(SearchState {
                    node: child,
                    pos: state.pos + 1,
                    built: push_char(&state.built, c),
                    distance: state.distance,
                    replacements: state.replacements,
                    last_edit: EditKind::None,
                    pending_swap: None,
                });
            }
        }

        if state.distance >= max_dist {
            continue;
        }

        // Transposition: only immediately after the replacement that set up
        // the swap, and only if the next input character is the one that
        // replacement discarded.
        if state.last_edit == EditKind::Replacement {
            if let Some((swap_pos, orig_char)) = state.pending_swap {
                if swap_pos + 1 == state.pos {
                    if let Some(&next_input) = chars.get(state.pos) {
                        if next_input == orig_char {
                            if let Some(child) = state.node.child(orig_char) {
                                stack.push(SearchState {
                                    node: child,
                                    pos: state.pos + 1,
                                    built: push_char(&state.built, orig_char),
                                    distance: state.distance - 1,
                                    replacements: state.replacements - 1,
                                    last_edit: EditKind::None,
                                    pending_swap: None,
                                });
                            }
                        }
                    }
                }
            }
        }

        // Insertion: extra input character, disallowed right after a deletion.
        if state.last_edit != EditKind::Deletion {
            if state.pos < chars.len() {
                stack.push(SearchState {
                    node: state.node,
                    pos: state.pos + 1,
                    built: state.built.clone(),
                    distance: state.distance + 1,
                    replacements: state.replacements,
                    last_edit: EditKind::Insertion,
                    pending_swap: None,
                });
            }
        }

        // Deletion: missing input character, disallowed right after an insertion.
        if state.last_edit != EditKind::Insertion {
            for (&edge, child) in state.node.children() {
                stack.push(SearchState {
                    node: child,
                    pos: state.pos,
                    built: push_char(&state.built, edge),
                    distance: state.distance + 1,
                    replacements: state.replacements,
                    last_edit: EditKind::Deletion,
                    pending_swap: None,
                });
            }
        }

        // Replacement: advance both, substituting the trie's edge character.
        if let Some(&c) = chars.get(state.pos) {
            for (&edge, child) in state.node.children() {
                if edge == c {
                    continue;
                }
                stack.push(SearchState {
                    node: child,
                    pos: state.pos + 1,
                    built: push_char(&state.built, edge),
                    distance: state.distance + 1,
                    replacements: state.replacements + 1,
                    last_edit: EditKind::Replacement,
                    pending_swap: Some((state.pos, c)),
                });
            }
        }
    }

    best.into_iter()
        .filter(|(_, (distance, _))| *distance > 0)
        .map(|(word, (distance, replacements))| (word, distance, replacements))
        .collect()
}

fn push_char(built: &str, c: char) -> String {
    let mut s = String::with_capacity(built.len() + c.len_utf8());
    s.push_str(built);
    s.push(c);
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_is_excluded() {
        let trie = Trie::build(["hello"].into_iter());
        let results = correct(&trie, "hello", 2, None);
        assert!(results.is_empty());
    }

    #[test]
    fn single_substitution_is_found_at_distance_one() {
        let trie = Trie::build(["hello"].into_iter());
        let results = correct(&trie, "hellp", 2, None);
        assert!(results.iter().any(|(w, d, _)| w == "hello" && *d == 1));
    }

    #[test]
    fn transposition_costs_one_not_two() {
        let trie = Trie::build(["form"].into_iter());
        let results = correct(&trie, "from", 1, None);
        assert!(results.iter().any(|(w, d, _)| w == "form" && *d == 1));
    }

    #[test]
    fn insertion_and_deletion_are_found() {
        let trie = Trie::build(["cat"].into_iter());
        let missing = correct(&trie, "ct", 1, None);
        assert!(missing.iter().any(|(w, d, _)| w == "cat" && *d == 1));
        let extra = correct(&trie, "cats", 1, None);
        assert!(extra.iter().any(|(w, d, _)| w == "cat" && *d == 1));
    }

    #[test]
    fn distance_beyond_max_dist_is_pruned() {
        let trie = Trie::build(["completely"].into_iter());
        let results = correct(&trie, "x", 2, None);
        assert!(results.is_empty());
    }
}
