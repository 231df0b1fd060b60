//! Command implementations. Each writes its human-readable output to `out`.

pub mod cart;
pub mod checkout;
pub mod orders;
pub mod profile;

use std::io::Write;

use ::cart::CustomerProfile;

use crate::App;
use crate::error::{Result, StorefrontError};

fn stdout_error(e: std::io::Error) -> StorefrontError {
    StorefrontError::io("<stdout>", e)
}

/// Writes one line of command output.
pub(crate) fn line(out: &mut dyn Write, text: impl std::fmt::Display) -> Result<()> {
    writeln!(out, "{text}").map_err(stdout_error)
}

/// Returns the signed-in customer or fails with [`StorefrontError::NoCustomer`].
pub(crate) async fn signed_in(app: &App) -> Result<CustomerProfile> {
    app.store()
        .customer_profile()
        .await
        .ok_or(StorefrontError::NoCustomer)
}
