//! Property-based tests for the stores and the borrowing session.

use std::collections::BTreeMap;

use proptest::prelude::*;

use crate::{
    io::FileInventoryStore,
    types::{
        Account, AccountRegistry, BorrowLedger, BorrowSession, Inventory, InventoryStore,
        MemoryAccountRegistry, MemoryBorrowLedger, MemoryInventoryStore, MAX_PICKS,
    },
};

const MATERIALS: [&str; 3] = ["Beaker", "Flask", "Pipette"];

/// One admin edit: `Some(quantity)` upserts, `None` deletes
fn edits() -> impl Strategy<Value = Vec<(usize, Option<u32>)>> {
    prop::collection::vec(
        (0..MATERIALS.len(), prop::option::of(0u32..50)),
        0..24,
    )
}

fn as_map(inventory: &Inventory) -> BTreeMap<String, u32> {
    inventory
        .iter()
        .map(|item| (item.name().to_owned(), item.quantity()))
        .collect()
}

fn apply_edits<I: InventoryStore>(
    store: &mut I,
    edits: &[(usize, Option<u32>)],
) -> BTreeMap<String, u32> {
    let mut expected = BTreeMap::new();
    for (index, edit) in edits {
        let name = MATERIALS[*index];
        match edit {
            Some(quantity) => {
                store.upsert(name, *quantity).unwrap();
                expected.insert(name.to_owned(), *quantity);
            }
            None => {
                store.delete(name).unwrap();
                expected.remove(name);
            }
        }
    }
    expected
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_file_inventory_reload_matches_edits(edits in edits()) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.txt");
        let expected = apply_edits(&mut FileInventoryStore::new(&path), &edits);
        let reloaded = FileInventoryStore::new(&path).load().unwrap();
        prop_assert_eq!(as_map(&reloaded), expected);
    }

    #[test]
    fn test_memory_inventory_load_matches_edits(edits in edits()) {
        let mut store = MemoryInventoryStore::new();
        let expected = apply_edits(&mut store, &edits);
        prop_assert_eq!(as_map(&store.load().unwrap()), expected);
    }

    #[test]
    fn test_picks_respect_capacity_and_stock(
        start in prop::collection::vec(0u32..10, MATERIALS.len()),
        picks in prop::collection::vec((0..=MATERIALS.len(), 0u32..6), 0..30),
        restocked in prop::collection::vec(prop::option::of(0u32..10), MATERIALS.len()),
    ) {
        let mut store = MemoryInventoryStore::new();
        for (name, quantity) in MATERIALS.iter().zip(&start) {
            store.upsert(name, *quantity).unwrap();
        }
        let mut session = BorrowSession::new(store.load().unwrap());
        let mut picked = [0u32; MATERIALS.len()];
        for (index, quantity) in picks {
            // The index one past the end names a material that is not stocked
            let name = MATERIALS.get(index).copied().unwrap_or("Burette");
            if session.add_pick(name, quantity).is_ok() {
                picked[index] += quantity;
            }
            prop_assert!(session.len() <= MAX_PICKS);
        }
        for (total, available) in picked.iter().zip(&start) {
            prop_assert!(total <= available);
        }

        // Stock edited between picking and committing; the commit clamps against it
        for (name, quantity) in MATERIALS.iter().zip(&restocked) {
            if let Some(quantity) = quantity {
                store.upsert(name, *quantity).unwrap();
            }
        }
        let before = store.load().unwrap();
        let count = session.len();
        let mut ledger = MemoryBorrowLedger::new();
        let account = Account::new("Ana", "1001");
        if count == 0 {
            prop_assert!(session.commit(&mut store, &mut ledger, &account, "2024-03-02 07:30").is_err());
            prop_assert!(ledger.records().unwrap().is_empty());
        } else {
            let committed = session
                .commit(&mut store, &mut ledger, &account, "2024-03-02 07:30")
                .unwrap();
            prop_assert_eq!(committed.len(), count);
            let records = ledger.records().unwrap();
            prop_assert_eq!(records.len(), 1);
            prop_assert_eq!(records[0].materials().len(), count);
        }
        let after = store.load().unwrap();
        for (name, total) in MATERIALS.iter().zip(picked) {
            let expected = before.quantity(name).unwrap().saturating_sub(total);
            prop_assert_eq!(after.quantity(name), Some(expected));
        }
    }

    #[test]
    fn test_authenticate_needs_both_fields(
        name in "[A-Za-z]{1,8}",
        student_id in "[0-9]{1,8}",
        other_name in "[A-Za-z]{1,8}",
        other_id in "[0-9]{1,8}",
    ) {
        let mut registry = MemoryAccountRegistry::new();
        prop_assert!(registry.register(Account::new(name.clone(), student_id.clone())).unwrap());
        prop_assert!(registry.authenticate(&name, &student_id).unwrap());
        prop_assert_eq!(
            registry.authenticate(&other_name, &student_id).unwrap(),
            other_name == name
        );
        prop_assert_eq!(
            registry.authenticate(&name, &other_id).unwrap(),
            other_id == student_id
        );
        prop_assert!(!registry.register(Account::new(other_name.clone(), student_id.clone())).unwrap());
        prop_assert!(!registry.register(Account::new(name.clone(), other_id.clone())).unwrap());
        prop_assert_eq!(registry.accounts().unwrap().len(), 1);
    }
}
