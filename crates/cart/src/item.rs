//! Cart contents and the pure merge/adjust rules applied to them.

use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

/// A product as offered by the catalog, used as the source for a new cart entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Money,
    /// Quantity on hand when the product was viewed, if known.
    pub stock: Option<u32>,
    pub image_ref: Option<String>,
}

impl Product {
    /// Creates a product with no stock or image information.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, unit_price: Money) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            stock: None,
            image_ref: None,
        }
    }

    /// Sets the known stock level.
    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = Some(stock);
        self
    }

    /// Sets the image reference.
    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }
}

/// One product line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    #[serde(deserialize_with = "common::types::lenient_u32")]
    pub quantity: u32,
    /// Upper bound the UI uses to stop increments; not enforced here.
    #[serde(default)]
    pub stock_hint: Option<u32>,
    #[serde(default)]
    pub image_ref: Option<String>,
}

impl CartItem {
    /// Returns `unit_price * quantity`.
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    /// Returns true if the quantity has reached the known stock level.
    pub fn at_stock_limit(&self) -> bool {
        self.stock_hint.is_some_and(|stock| self.quantity >= stock)
    }
}

/// The set of items a customer intends to buy.
///
/// Holds at most one entry per product and never an entry with quantity zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<CartItem>", from = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl From<Vec<CartItem>> for Cart {
    fn from(items: Vec<CartItem>) -> Self {
        Cart::from_items(items)
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart from raw items, merging duplicates and dropping empty lines.
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            if item.quantity == 0 {
                continue;
            }
            match cart.item_mut(item.product_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
                None => cart.items.push(item),
            }
        }
        cart
    }

    /// Returns the items in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Returns the entry for a product, if present.
    pub fn get(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    fn item_mut(&mut self, product_id: ProductId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| i.product_id == product_id)
    }

    /// Returns the number of distinct products.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the cart has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds `quantity` units of a product, merging with an existing entry.
    ///
    /// A quantity of zero leaves the cart unchanged.
    pub fn add(&mut self, product: Product, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(existing) = self.item_mut(product.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
            return;
        }
        self.items.push(CartItem {
            product_id: product.id,
            name: product.name,
            unit_price: product.unit_price,
            quantity,
            stock_hint: product.stock,
            image_ref: product.image_ref,
        });
    }

    /// Overwrites the quantity of an existing entry; `quantity <= 0` removes it.
    ///
    /// Returns true if the cart changed.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove(product_id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.item_mut(product_id) {
            Some(item) if item.quantity != quantity => {
                item.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    /// Removes the entry for a product. Returns true if one was present.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.items.len() != before
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of all line subtotals.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    /// Total units across all entries.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Subtotal plus a flat shipping fee; the amount shown at checkout.
    pub fn total_with_shipping(&self, shipping_fee: Money) -> Money {
        self.subtotal() + shipping_fee
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, price: i64) -> Product {
        Product::new(id, format!("Product {id}"), Money::from_minor(price))
    }

    #[test]
    fn test_add_twice_merges_into_one_entry() {
        let mut cart = Cart::new();
        cart.add(product(1, 10000), 2);
        cart.add(product(1, 10000), 3);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 5);
    }

    #[test]
    fn test_add_zero_is_noop() {
        let mut cart = Cart::new();
        cart.add(product(1, 10000), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_zero_equals_remove() {
        let mut a = Cart::new();
        a.add(product(1, 10000), 2);
        a.add(product(2, 5000), 1);
        let mut b = a.clone();

        assert!(a.set_quantity(ProductId::new(1), 0));
        assert!(b.remove(ProductId::new(1)));
        assert_eq!(a, b);
    }

    #[test]
    fn test_set_quantity_negative_removes() {
        let mut cart = Cart::new();
        cart.add(product(1, 10000), 2);
        cart.set_quantity(ProductId::new(1), -4);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_overwrites_without_stock_bound() {
        let mut cart = Cart::new();
        cart.add(product(1, 10000).with_stock(2), 1);
        assert!(cart.set_quantity(ProductId::new(1), 9));

        let item = cart.get(ProductId::new(1)).unwrap();
        assert_eq!(item.quantity, 9);
        assert!(item.at_stock_limit());
    }

    #[test]
    fn test_set_quantity_on_missing_item_is_noop() {
        let mut cart = Cart::new();
        assert!(!cart.set_quantity(ProductId::new(3), 2));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_missing_item_is_noop() {
        let mut cart = Cart::new();
        cart.add(product(1, 10000), 1);
        assert!(!cart.remove(ProductId::new(99)));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_total_with_shipping_example() {
        let mut cart = Cart::new();
        cart.add(product(1, 10000), 2);
        cart.add(product(2, 5000), 1);

        assert_eq!(cart.subtotal().minor(), 25000);
        assert_eq!(cart.total_quantity(), 3);
        assert_eq!(
            cart.total_with_shipping(Money::from_minor(10000)).minor(),
            35000
        );
    }

    #[test]
    fn test_from_items_merges_duplicates_and_drops_empty() {
        let item = |id: i64, qty: u32| CartItem {
            product_id: ProductId::new(id),
            name: "x".to_string(),
            unit_price: Money::from_minor(100),
            quantity: qty,
            stock_hint: None,
            image_ref: None,
        };
        let cart = Cart::from_items(vec![item(1, 1), item(2, 0), item(1, 4)]);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 5);
    }

    #[test]
    fn test_deserialize_merges_duplicates_and_drops_empty_lines() {
        let json = r#"[
            {"product_id":1,"name":"Syrup","unit_price":1500,"quantity":2},
            {"product_id":2,"name":"Balm","unit_price":800,"quantity":0},
            {"product_id":1,"name":"Syrup","unit_price":1500,"quantity":"3"}
        ]"#;
        let cart: Cart = serde_json::from_str(json).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 5);
    }

    #[test]
    fn test_deserialize_accepts_items_without_optional_fields() {
        let json = r#"[{"product_id":"7","name":"Syrup","unit_price":1500,"quantity":2}]"#;
        let cart: Cart = serde_json::from_str(json).unwrap();

        let item = cart.get(ProductId::new(7)).unwrap();
        assert_eq!(item.quantity, 2);
        assert_eq!(item.stock_hint, None);
    }
}
