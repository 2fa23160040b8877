use ifvm_metaclasses::stringbuffer::{StringBuffer, STRBUF_MAX_LEN};
use ifvm_metaclasses::undo::{UndoJournal, Undoable};
use ifvm_metaclasses::value::ObjectId;

fn id(n: u32) -> ObjectId {
    ObjectId::new(n).unwrap()
}

#[test]
fn every_mutation_rolls_back_to_byte_exact_contents() {
    let mut buf = StringBuffer::new(id(1), 256, 16);
    let mut journal = UndoJournal::new();

    journal.add_record(buf.append("once upon a time").unwrap());
    let sp = journal.savepoint();
    journal.add_record(buf.insert(6, "XXX").unwrap());
    journal.add_record(buf.delete(1, Some(4)).unwrap());
    journal.add_record(buf.splice(1, 3, "replaced").unwrap());

    let before = buf.to_string_value();
    journal.rollback_to(sp, |record| buf.apply_undo(record));
    assert_ne!(buf.to_string_value(), before);
    assert_eq!(buf.to_string_value(), "once upon a time");
}

#[test]
fn negative_indices_and_substr_defaults_match_from_the_back_convention() {
    let mut buf = StringBuffer::new(id(1), 256, 16);
    buf.append("hello world").unwrap();
    assert_eq!(buf.substr(-5, None).unwrap(), "world");
    assert_eq!(buf.char_at(-1).unwrap(), 'd');
}

#[test]
fn growth_chunking_still_honors_the_configured_maximum() {
    let mut buf = StringBuffer::new(id(1), 32, 16);
    assert!(buf.append(&"x".repeat(32)).is_ok());
    assert!(buf.append("y").is_err());
}

#[test]
fn construction_with_extreme_parameters_still_yields_a_usable_buffer() {
    let mut buf = StringBuffer::new(id(1), usize::MAX, 4);
    buf.append("hello").unwrap();
    assert_eq!(buf.length(), 5);
    assert!(STRBUF_MAX_LEN > 0);
}
