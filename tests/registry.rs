use ifvm_metaclasses::registry::{builtin_descriptors, DependencyRecord, DispatchOutcome, MetaclassRegistry, PropMapping};
use ifvm_metaclasses::value::PropId;

#[test]
fn loading_an_unknown_metaclass_is_an_error() {
    let mut registry = MetaclassRegistry::new(builtin_descriptors());
    let result = registry.load_dependency(DependencyRecord {
        name_with_version: "nonexistent-meta/000000".to_string(),
        func_count: 1,
        min_prop: 1,
        max_prop: 1,
        prop_map: Vec::new(),
    });
    assert!(result.is_err());
}

#[test]
fn loading_a_newer_version_than_the_host_descriptor_is_too_old() {
    let mut registry = MetaclassRegistry::new(builtin_descriptors());
    let result = registry.load_dependency(DependencyRecord {
        name_with_version: "bignumber/999999".to_string(),
        func_count: 1,
        min_prop: 1,
        max_prop: 1,
        prop_map: Vec::new(),
    });
    assert!(result.is_err());
}

#[test]
fn prop_to_func_index_inverse_matches_func_index_to_prop() {
    let mut registry = MetaclassRegistry::new(builtin_descriptors());
    let prop = PropId::new(10).unwrap();
    let descriptor_index = registry
        .load_dependency(DependencyRecord {
            name_with_version: "bignumber/030000".to_string(),
            func_count: 24,
            min_prop: 10,
            max_prop: 10,
            prop_map: vec![PropMapping { prop, func_index: 3 }],
        })
        .unwrap();

    let entry = registry.entry_for_descriptor(descriptor_index).unwrap();
    let func_index = entry.prop_to_func_index(prop).unwrap();
    assert_eq!(entry.func_index_to_prop(func_index), Some(prop));

    match registry.resolve_prop(descriptor_index, prop) {
        DispatchOutcome::Found(idx) => assert_eq!(idx, func_index),
        DispatchOutcome::NotFound => panic!("expected a mapped property"),
    }
}

#[test]
fn unmapped_property_is_not_found_not_an_error() {
    let mut registry = MetaclassRegistry::new(builtin_descriptors());
    let descriptor_index = registry
        .load_dependency(DependencyRecord {
            name_with_version: "bignumber/030000".to_string(),
            func_count: 24,
            min_prop: 10,
            max_prop: 12,
            prop_map: Vec::new(),
        })
        .unwrap();

    let stray = PropId::new(11).unwrap();
    assert!(matches!(registry.resolve_prop(descriptor_index, stray), DispatchOutcome::NotFound));
}

#[test]
fn save_then_restore_snapshot_round_trips_bindings() {
    let mut registry = MetaclassRegistry::new(builtin_descriptors());
    let prop = PropId::new(5).unwrap();
    registry
        .load_dependency(DependencyRecord {
            name_with_version: "dictionary2/000000".to_string(),
            func_count: 8,
            min_prop: 5,
            max_prop: 5,
            prop_map: vec![PropMapping { prop, func_index: 1 }],
        })
        .unwrap();

    let snapshot = registry.snapshot_for_save();
    let mut fresh = MetaclassRegistry::new(builtin_descriptors());
    fresh.restore_from_snapshot(snapshot).unwrap();

    assert_eq!(fresh.entries().len(), 1);
}
