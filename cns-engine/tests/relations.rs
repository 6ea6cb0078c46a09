//! Integration tests for the manager/association relation indexes

use cns_core::*;
use cns_engine::*;

fn setup() -> (Store, tempfile::TempDir) {
    let (engine, temp) = StorageEngine::temp().unwrap();
    (Store::new(engine), temp)
}

fn manager(name: &str) -> Manager {
    Manager {
        id: ManagerId::generate(),
        email: format!("{}@example.com", name.to_lowercase()),
        name: name.to_string(),
        titles: "Portfolio Manager".to_string(),
        initials: name[..1].to_string(),
    }
}

#[test]
fn associations_of_is_sorted_by_legal_name() {
    let (store, _temp) = setup();
    let a = manager("Alice");
    store.insert_manager(a.clone()).unwrap();
    for name in ["Pine Ridge", "Bay Club", "Lakeside"] {
        store
            .insert_association(Association {
                id: AssociationId::generate(),
                legal_name: name.to_string(),
                filter_name: name.to_lowercase(),
                location: "Miami".to_string(),
                manager_id: a.id.clone(),
            })
            .unwrap();
    }

    let names: Vec<_> = store
        .associations_of(&a.id)
        .unwrap()
        .into_iter()
        .map(|x| x.legal_name)
        .collect();
    assert_eq!(names, vec!["Bay Club", "Lakeside", "Pine Ridge"]);
}

#[test]
fn manager_ids_sharing_a_prefix_do_not_mix() {
    let (store, _temp) = setup();
    let mut short = manager("Short");
    short.id = ManagerId::parse("M1").unwrap();
    let mut long = manager("Long");
    long.id = ManagerId::parse("M10").unwrap();
    store.insert_manager(short.clone()).unwrap();
    store.insert_manager(long.clone()).unwrap();

    for owner in [&short.id, &long.id, &long.id] {
        store
            .insert_association(Association {
                id: AssociationId::generate(),
                legal_name: "Assoc".to_string(),
                filter_name: "assoc".to_string(),
                location: "Naples".to_string(),
                manager_id: owner.clone(),
            })
            .unwrap();
    }

    assert_eq!(store.count_owned(&short.id).unwrap(), 1);
    assert_eq!(store.count_owned(&long.id).unwrap(), 2);
}

#[test]
fn association_edit_without_owner_change_keeps_index() {
    let (store, _temp) = setup();
    let a = manager("Alice");
    store.insert_manager(a.clone()).unwrap();
    let x = Association {
        id: AssociationId::generate(),
        legal_name: "Old Name".to_string(),
        filter_name: "old".to_string(),
        location: "Tampa".to_string(),
        manager_id: a.id.clone(),
    };
    store.insert_association(x.clone()).unwrap();

    let updated = store
        .update_association(&x.id, |assoc| {
            assoc.legal_name = "New Name".to_string();
            Ok(())
        })
        .unwrap();
    assert_eq!(updated.legal_name, "New Name");
    assert_eq!(store.count_owned(&a.id).unwrap(), 1);
    assert_eq!(store.associations_of(&a.id).unwrap()[0].legal_name, "New Name");
}

#[test]
fn updates_to_missing_rows_are_not_found() {
    let (store, _temp) = setup();
    let err = store.update_manager(&ManagerId::generate(), |_| {}).unwrap_err();
    assert_eq!(err.to_string(), "Manager not found");
    assert_eq!(err.status_code(), 404);

    let err = store
        .update_association(&AssociationId::generate(), |_| Ok(()))
        .unwrap_err();
    assert_eq!(err.to_string(), "Association not found");
}
