//! Cart ledger scenarios, including persistence through the file store.

use std::sync::Arc;

use rust_decimal::Decimal;

use shopfront_client::cart::{CartIdentity, CartStore, any_archival};
use shopfront_client::storage::{JsonFileStore, KeyValueStore};
use shopfront_core::{CartEntry, ProductId};
use shopfront_integration_tests::harness;

struct FixedIdentity(Option<String>);

impl CartIdentity for FixedIdentity {
    fn cart_login(&self) -> Option<String> {
        self.0.clone()
    }
}

fn entry(id: i64, quantity: u32) -> CartEntry {
    CartEntry {
        product_id: ProductId::new(id),
        name: format!("Product {id}"),
        price: Decimal::new(2500, 2),
        quantity,
        image_url: None,
        archival: false,
    }
}

// =============================================================================
// Ledger Semantics Against the Shared Store
// =============================================================================

#[test]
fn first_add_to_an_empty_cart_inserts_a_single_unit() {
    let h = harness();
    h.store.set(
        shopfront_client::session::keys::JWT_TOKEN,
        &shopfront_integration_tests::mint_token("client1", 600),
    );

    h.cart.add_to_cart(&entry(1, 1));

    let entries = h.cart.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries.first().map(|e| e.quantity), Some(1));
    assert_eq!(h.cart.total_quantity(), 1);
    assert!(h.store.get("client1-cart").is_some());
}

#[test]
fn quantity_steps_by_one_toward_the_supplied_value() {
    let h = harness();

    // Anonymous ledger; walk the stored quantity up to 3.
    h.cart.add_to_cart(&entry(1, 1));
    h.cart.add_to_cart(&entry(1, 9));
    h.cart.add_to_cart(&entry(1, 9));
    assert_eq!(h.cart.entries().first().map(|e| e.quantity), Some(3));

    // Supplying 5 from stored 3 moves one step at a time, not to 5.
    h.cart.add_to_cart(&entry(1, 5));
    assert_eq!(h.cart.entries().first().map(|e| e.quantity), Some(4));
    h.cart.add_to_cart(&entry(1, 5));
    assert_eq!(h.cart.entries().first().map(|e| e.quantity), Some(5));

    // Stepping down clamps at one.
    for _ in 0..10 {
        h.cart.add_to_cart(&entry(1, 1));
    }
    assert_eq!(h.cart.entries().first().map(|e| e.quantity), Some(1));
}

#[test]
fn totals_stay_consistent_across_arbitrary_operations() {
    let h = harness();

    h.cart.add_to_cart(&entry(1, 1));
    h.cart.add_to_cart(&entry(2, 1));
    h.cart.add_to_cart(&entry(2, 7));
    h.cart.add_to_cart(&entry(3, 1));
    h.cart.remove_product(ProductId::new(1));
    h.cart.remove_product(ProductId::new(99)); // absent: no-op

    let expected: u32 = h.cart.entries().iter().map(|e| e.quantity).sum();
    assert_eq!(h.cart.total_quantity(), expected);
    assert_eq!(h.cart.total_quantity(), 3);
}

#[test]
fn clearing_leaves_an_empty_parseable_ledger() {
    let h = harness();
    h.cart.add_to_cart(&entry(1, 1));

    h.cart.clear();

    assert!(h.cart.entries().is_empty());
    assert_eq!(h.store.get("anonymous-cart"), Some("[]".to_owned()));
}

#[test]
fn archival_entries_flag_the_whole_ledger() {
    let h = harness();
    h.cart.add_to_cart(&entry(1, 1));

    let mut archival = entry(2, 1);
    archival.archival = true;
    h.cart.add_to_cart(&archival);

    assert!(any_archival(&h.cart.entries()));
}

// =============================================================================
// Persistence Through the File Store
// =============================================================================

#[test]
fn ledger_survives_process_restart_via_the_file_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("storage.json");
    let identity = || Arc::new(FixedIdentity(Some("client1".to_owned())));

    {
        let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&path));
        let cart = CartStore::new(store, identity());
        cart.add_to_cart(&entry(1, 1));
        cart.add_to_cart(&entry(1, 3));
        cart.add_to_cart(&entry(2, 1));
    }

    // A fresh process opens the same file and sees the same ledger.
    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&path));
    let cart = CartStore::new(store, identity());

    assert_eq!(cart.total_quantity(), 3);
    let quantities: Vec<u32> = cart.entries().iter().map(|e| e.quantity).collect();
    assert_eq!(quantities, vec![2, 1]);
}

#[test]
fn corrupt_ledger_on_disk_reads_as_empty_without_erroring() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("storage.json");
    std::fs::write(
        &path,
        r#"{"client1-cart": "this is not a json array of entries"}"#,
    )
    .expect("seed file");

    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&path));
    let cart = CartStore::new(store, Arc::new(FixedIdentity(Some("client1".to_owned()))));

    assert!(cart.entries().is_empty());
    assert_eq!(cart.total_quantity(), 0);

    // The ledger recovers on the next write.
    cart.add_to_cart(&entry(1, 1));
    assert_eq!(cart.total_quantity(), 1);
}
