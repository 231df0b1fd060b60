//! Checkout configuration loaded from environment variables.

use std::time::Duration;

use common::Money;

/// Checkout settings with sensible defaults.
///
/// Reads from environment variables:
/// - `STOREFRONT_API_BASE_URL`: remote service root (default: `"http://localhost:3000/api"`)
/// - `STOREFRONT_SHIPPING_FEE`: flat fee in minor units (default: `10000`)
/// - `STOREFRONT_PAYMENT_METHOD`: recorded on the order header (default: `"transfer"`)
/// - `STOREFRONT_REDIRECT_DELAY_SECS`: delay before returning home (default: `5`)
/// - `STOREFRONT_HTTP_TIMEOUT_SECS`: request timeout (default: unset)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    pub api_base_url: String,
    pub shipping_fee: Money,
    pub payment_method: String,
    pub redirect_delay: Duration,
    pub http_timeout: Option<Duration>,
}

impl CheckoutConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let secs = |key: &str| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
        };

        Self {
            api_base_url: lookup("STOREFRONT_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            shipping_fee: lookup("STOREFRONT_SHIPPING_FEE")
                .and_then(|v| v.trim().parse::<i64>().ok())
                .filter(|fee| *fee >= 0)
                .map(Money::from_minor)
                .unwrap_or(defaults.shipping_fee),
            payment_method: lookup("STOREFRONT_PAYMENT_METHOD")
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(defaults.payment_method),
            redirect_delay: secs("STOREFRONT_REDIRECT_DELAY_SECS")
                .unwrap_or(defaults.redirect_delay),
            http_timeout: secs("STOREFRONT_HTTP_TIMEOUT_SECS").filter(|d| !d.is_zero()),
        }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api".to_string(),
            shipping_fee: Money::from_minor(10000),
            payment_method: "transfer".to_string(),
            redirect_delay: Duration::from_secs(5),
            http_timeout: None,
        }
    }
}
