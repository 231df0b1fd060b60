//! Integration tests for the persisted cart store.

use std::time::Duration;

use cart::{CART_KEY, Cart, CartStore, FileStorage, InMemoryStorage, Product, Storage};
use common::{Money, ProductId};
use tokio::sync::mpsc;

fn paracetamol() -> Product {
    Product::new(1, "Paracetamol 500mg", Money::from_minor(10000)).with_stock(12)
}

fn vitamin_c() -> Product {
    Product::new(2, "Vitamin C", Money::from_minor(5000)).with_image("/img/vitc.png")
}

#[tokio::test]
async fn test_persist_then_rehydrate_yields_same_items() {
    let storage = InMemoryStorage::new();
    let store = CartStore::open(storage.clone()).await;
    store.add(paracetamol(), 2).await.unwrap();
    store.add(vitamin_c(), 1).await.unwrap();
    let before = store.snapshot().await;

    let reopened = CartStore::open(storage).await;
    let after = reopened.snapshot().await;

    assert_eq!(before, after);
    assert_eq!(after.get(ProductId::new(1)).unwrap().quantity, 2);
    assert_eq!(after.get(ProductId::new(2)).unwrap().quantity, 1);
}

#[tokio::test]
async fn test_every_mutation_is_persisted() {
    let storage = InMemoryStorage::new();
    let store = CartStore::open(storage.clone()).await;

    store.add(paracetamol(), 1).await.unwrap();
    store.set_quantity(ProductId::new(1), 4).await.unwrap();
    let raw = storage.get(CART_KEY).await.unwrap().unwrap();
    let persisted: Cart = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted.get(ProductId::new(1)).unwrap().quantity, 4);

    store.remove(ProductId::new(1)).await.unwrap();
    let raw = storage.get(CART_KEY).await.unwrap().unwrap();
    assert_eq!(raw, "[]");
}

#[tokio::test]
async fn test_malformed_persisted_cart_starts_empty() {
    let storage = InMemoryStorage::new();
    storage.put_raw(CART_KEY, "{\"oops\": true").await;

    let store = CartStore::open(storage).await;
    assert!(store.snapshot().await.is_empty());
}

#[tokio::test]
async fn test_rehydrate_keeps_readable_entries() {
    let storage = InMemoryStorage::new();
    storage
        .put_raw(
            CART_KEY,
            r#"[
                {"product_id":1,"name":"Paracetamol","unit_price":10000,"quantity":2},
                {"product_id":"2","name":"Vitamin C","unit_price":5000,"quantity":"3"},
                {"product_id":3,"name":"Plaster","unit_price":2000,"quantity":"a few"},
                {"product_id":4,"name":"Syrup","unit_price":1500,"quantity":-1}
            ]"#,
        )
        .await;

    let store = CartStore::open(storage).await;
    let cart = store.snapshot().await;

    assert_eq!(cart.len(), 2);
    assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 2);
    assert_eq!(cart.get(ProductId::new(2)).unwrap().quantity, 3);
    assert!(cart.get(ProductId::new(3)).is_none());
    assert!(cart.get(ProductId::new(4)).is_none());
}

#[tokio::test]
async fn test_failed_write_keeps_in_memory_change() {
    let storage = InMemoryStorage::new();
    let store = CartStore::open(storage.clone()).await;
    storage.set_fail_on_write(true).await;

    let result = store.add(paracetamol(), 1).await;

    assert!(result.is_err());
    assert_eq!(store.snapshot().await.len(), 1);
    assert!(storage.get(CART_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_sessions_converge_on_last_write() {
    let storage = InMemoryStorage::new();
    let tab_a = CartStore::open(storage.clone()).await;
    let tab_b = CartStore::open(storage.clone()).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let listener = tab_b.on_external_change(move |cart| {
        let _ = tx.send(cart.clone());
    });

    tab_a.add(paracetamol(), 3).await.unwrap();

    let seen = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seen.get(ProductId::new(1)).unwrap().quantity, 3);
    assert_eq!(tab_b.snapshot().await, tab_a.snapshot().await);

    listener.abort();
}

#[tokio::test]
async fn test_own_writes_do_not_trigger_handler() {
    let storage = InMemoryStorage::new();
    let tab = CartStore::open(storage).await;

    let (tx, mut rx) = mpsc::unbounded_channel::<Cart>();
    let listener = tab.on_external_change(move |cart| {
        let _ = tx.send(cart.clone());
    });

    tab.add(vitamin_c(), 1).await.unwrap();

    let result = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(result.is_err(), "handler should not fire for own writes");

    listener.abort();
}

#[tokio::test]
async fn test_refresh_picks_up_changes_from_another_process() {
    let dir = std::env::temp_dir().join(format!("cart-refresh-{}", uuid::Uuid::new_v4()));
    let first = CartStore::open(FileStorage::open(&dir).await.unwrap()).await;
    // A separate FileStorage on the same directory shares no notification channel.
    let second = CartStore::open(FileStorage::open(&dir).await.unwrap()).await;

    first.add(paracetamol(), 2).await.unwrap();
    assert!(second.snapshot().await.is_empty());

    let refreshed = second.refresh().await;
    assert_eq!(refreshed.get(ProductId::new(1)).unwrap().quantity, 2);

    let _ = tokio::fs::remove_dir_all(dir).await;
}
