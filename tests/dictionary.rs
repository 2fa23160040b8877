use ifvm_metaclasses::dictionary::{Dictionary, StringComparator};
use ifvm_metaclasses::undo::{UndoJournal, Undoable};
use ifvm_metaclasses::value::ObjectId;

fn id(n: u32) -> ObjectId {
    ObjectId::new(n).unwrap()
}

#[test]
fn add_find_del_round_trip_through_the_undo_journal() {
    let mut dict = Dictionary::new(id(1));
    let mut journal = UndoJournal::new();

    let sp = journal.savepoint();
    journal.add_record(dict.add("lamp", id(2), None, false));
    journal.add_record(dict.add("sword", id(3), None, false));
    assert_eq!(dict.find("lamp", None), vec![(id(2), 1)]);

    journal.rollback_to(sp, |record| dict.apply_undo(record));
    assert!(dict.find("lamp", None).is_empty());
    assert!(dict.find("sword", None).is_empty());
}

#[test]
fn set_comparator_rebuild_then_undo_restores_exact_matching() {
    let mut dict = Dictionary::new(id(1));
    let mut journal = UndoJournal::new();

    dict.add("Key", id(2), None, false);
    let sp = journal.savepoint();
    journal.add_record(dict.set_comparator(Box::new(StringComparator::case_folding())));
    assert_eq!(dict.find("key", None), vec![(id(2), 1)]);

    journal.rollback_to(sp, |record| dict.apply_undo(record));
    assert!(dict.find("key", None).is_empty());
    assert_eq!(dict.find("Key", None), vec![(id(2), 1)]);
}

#[test]
fn is_defined_respects_a_quality_filter() {
    let mut dict = Dictionary::new(id(1));
    dict.add("torch", id(2), None, false);
    assert!(dict.is_defined("torch", None));
    assert!(!dict.is_defined("torch", Some(&|q| q > 5)));
}

#[test]
fn correct_excludes_exact_matches_but_finds_near_misses() {
    let mut dict = Dictionary::new(id(1));
    dict.add("brass lantern", id(2), None, false);
    assert!(dict.correct("brass lantern", 2).is_empty());
    let near = dict.correct("brass lanturn", 2);
    assert!(near.iter().any(|(w, d, _)| w == "brass lantern" && *d > 0));
}

#[test]
fn weak_reference_gc_hook_trims_associations_for_dying_objects() {
    use ifvm_metaclasses::object_table::Collectible;

    let mut dict = Dictionary::new(id(1));
    dict.add("lamp", id(2), None, false);
    dict.add("lamp", id(3), None, false);
    dict.remove_stale_weak_refs(&|o| o == id(2));

    let remaining = dict.find("lamp", None);
    assert_eq!(remaining, vec![(id(3), 1)]);
}
