//! `storefront profile ...`

use std::io::Write;

use cart::CustomerProfile;
use checkout::{Field, ShippingProfile, validate};
use common::CustomerId;

use super::{line, signed_in};
use crate::App;
use crate::error::{Result, StorefrontError};

/// Customer details as given on the command line.
#[derive(Debug, Clone)]
pub struct ProfileInput {
    pub customer_id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

/// Saves the signed-in customer, replacing any previous one.
pub async fn set(app: &App, input: ProfileInput, out: &mut dyn Write) -> Result<()> {
    let id = CustomerId::new(input.customer_id);
    if !id.is_valid() {
        return Err(StorefrontError::InvalidInput(format!(
            "customer id must be positive, got {id}"
        )));
    }

    let profile = CustomerProfile {
        id,
        name: input.name,
        email: input.email,
        phone: input.phone,
        address: input.address,
        city: input.city,
        postal_code: input.postal_code,
    };
    let store = app.store();
    profile.save(store.storage(), store.session()).await?;
    tracing::info!(customer_id = %id, "customer profile saved");

    line(out, format_args!("Saved profile for customer #{id}"))?;
    show(app, out).await
}

/// Prints the shipping details checkout would use.
pub async fn show(app: &App, out: &mut dyn Write) -> Result<()> {
    let customer = signed_in(app).await?;
    let shipping = ShippingProfile::from_customer(&customer);

    line(out, format_args!("Customer #{}", customer.id))?;
    render(&shipping, out)
}

/// Prints each shipping field and any validation problems.
pub fn render(shipping: &ShippingProfile, out: &mut dyn Write) -> Result<()> {
    let errors = validate(shipping);
    for field in Field::ALL {
        let value = shipping.get(field);
        match errors.get(field) {
            Some(message) => line(out, format_args!("{:<12} {value:<40} ! {message}", field.as_str()))?,
            None => line(out, format_args!("{:<12} {value}", field.as_str()))?,
        }
    }
    if errors.is_empty() {
        line(out, "Ready for checkout")
    } else {
        line(
            out,
            format_args!("{} field(s) need attention before checkout", errors.len()),
        )
    }
}
