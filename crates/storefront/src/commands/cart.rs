//! `storefront cart ...`

use std::io::Write;

use cart::{Cart, Product};
use common::{Money, ProductId};

use super::line;
use crate::App;
use crate::error::{Result, StorefrontError};

/// A product to put in the cart, as given on the command line.
#[derive(Debug, Clone)]
pub struct AddItem {
    pub product_id: i64,
    pub name: String,
    pub unit_price: i64,
    pub quantity: u32,
    pub stock: Option<u32>,
    pub image: Option<String>,
}

impl AddItem {
    fn into_product(self) -> Result<Product> {
        if self.product_id <= 0 {
            return Err(StorefrontError::InvalidInput(format!(
                "product id must be positive, got {}",
                self.product_id
            )));
        }
        if self.unit_price < 0 {
            return Err(StorefrontError::InvalidInput(format!(
                "unit price must not be negative, got {}",
                self.unit_price
            )));
        }
        let mut product = Product::new(self.product_id, self.name, Money::from_minor(self.unit_price));
        if let Some(stock) = self.stock {
            product = product.with_stock(stock);
        }
        if let Some(image) = self.image {
            product = product.with_image(image);
        }
        Ok(product)
    }
}

pub async fn add(app: &App, item: AddItem, out: &mut dyn Write) -> Result<()> {
    let quantity = item.quantity;
    let product = item.into_product()?;
    let name = product.name.clone();
    app.store().add(product, quantity).await?;
    line(out, format_args!("Added {quantity} × {name}"))?;
    show(app, out).await
}

pub async fn set(app: &App, product_id: i64, quantity: i64, out: &mut dyn Write) -> Result<()> {
    app.store()
        .set_quantity(ProductId::new(product_id), quantity)
        .await?;
    show(app, out).await
}

pub async fn remove(app: &App, product_id: i64, out: &mut dyn Write) -> Result<()> {
    app.store().remove(ProductId::new(product_id)).await?;
    show(app, out).await
}

pub async fn clear(app: &App, out: &mut dyn Write) -> Result<()> {
    app.store().clear().await?;
    line(out, "Cart cleared")
}

pub async fn show(app: &App, out: &mut dyn Write) -> Result<()> {
    let cart = app.store().snapshot().await;
    render(&cart, app.config().checkout.shipping_fee, out)
}

/// Prints the cart with its totals.
pub fn render(cart: &Cart, shipping_fee: Money, out: &mut dyn Write) -> Result<()> {
    if cart.is_empty() {
        return line(out, "Cart is empty");
    }

    for item in cart.items() {
        let limit = if item.at_stock_limit() {
            "  (stock limit reached)"
        } else {
            ""
        };
        line(
            out,
            format_args!(
                "#{:<6} {:<30} {:>4} × {:>12} = {:>12}{limit}",
                item.product_id,
                item.name,
                item.quantity,
                item.unit_price.to_string(),
                item.subtotal().to_string(),
            ),
        )?;
    }
    line(out, format_args!("Items:    {}", cart.total_quantity()))?;
    line(out, format_args!("Subtotal: {}", cart.subtotal()))?;
    line(out, format_args!("Shipping: {shipping_fee}"))?;
    line(
        out,
        format_args!("Total:    {}", cart.total_with_shipping(shipping_fee)),
    )
}
