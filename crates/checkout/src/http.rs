//! REST client for the remote order, catalog and payment services.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{CustomerId, OrderId, ProductId};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, Result};
use crate::services::orders::{NewOrder, NewOrderLine, OrderLineRecord, OrderRecord, OrderService};
use crate::services::payment::{PaymentRequest, PaymentService, PaymentSession};
use crate::services::stock::{StockRecord, StockService};

/// HTTP client implementing every remote service trait against one base URL.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    client: reqwest::Client,
    base_url: String,
}

/// Payment provider response. Both fields are optional on the wire.
#[derive(Debug, Deserialize)]
struct PaymentResponse {
    #[serde(default)]
    redirect_url: Option<String>,
    #[serde(default, alias = "token")]
    session_id: Option<String>,
}

impl RestClient {
    /// Creates a client for `base_url`. Without a timeout, requests wait as
    /// long as the transport allows.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|source| CheckoutError::Http {
            operation: "build http client",
            source,
        })?;

        Ok(Self {
            inner: Arc::new(RestClientInner {
                client,
                base_url: base_url.into().trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Creates a client from checkout configuration.
    pub fn from_config(config: &CheckoutConfig) -> Result<Self> {
        Self::new(config.api_base_url.clone(), config.http_timeout)
    }

    /// Returns the base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    async fn send(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|source| CheckoutError::Http { operation, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(operation, status = status.as_u16(), "remote request rejected");
            return Err(CheckoutError::Remote {
                operation,
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        self.send(operation, request)
            .await?
            .json::<T>()
            .await
            .map_err(|source| CheckoutError::Http { operation, source })
    }
}

/// Extracts the remote-assigned order id, which may arrive as `id` or
/// `order_id`, as a number or a numeric string.
fn order_id_from_response(body: &serde_json::Value) -> Option<OrderId> {
    ["id", "order_id"]
        .iter()
        .filter_map(|key| body.get(*key))
        .filter_map(|value| serde_json::from_value::<OrderId>(value.clone()).ok())
        .find(OrderId::is_valid)
}

#[async_trait]
impl OrderService for RestClient {
    #[tracing::instrument(skip(self, order), fields(customer_id = %order.customer_id))]
    async fn create_order(&self, order: &NewOrder) -> Result<OrderId> {
        let request = self.inner.client.post(self.url("/orders")).json(order);
        let body: serde_json::Value = self.send_json("create order", request).await?;
        order_id_from_response(&body).ok_or(CheckoutError::MissingOrderId)
    }

    #[tracing::instrument(skip(self, line), fields(order_id = %line.order_id, product_id = %line.product_id))]
    async fn create_order_line(&self, line: &NewOrderLine) -> Result<()> {
        let request = self.inner.client.post(self.url("/order-lines")).json(line);
        self.send("create order line", request).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_orders(&self, customer_id: CustomerId) -> Result<Vec<OrderRecord>> {
        let url = self.url(&format!("/orders?customer_id={customer_id}"));
        let orders: Vec<OrderRecord> = self
            .send_json("list orders", self.inner.client.get(url))
            .await?;
        // The service may ignore the filter.
        Ok(orders
            .into_iter()
            .filter(|o| o.customer_id == customer_id)
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLineRecord>> {
        let url = self.url(&format!("/order-lines?order_id={order_id}"));
        let lines: Vec<OrderLineRecord> = self
            .send_json("list order lines", self.inner.client.get(url))
            .await?;
        Ok(lines
            .into_iter()
            .filter(|l| l.order_id == order_id)
            .collect())
    }

    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    async fn replace_order(&self, order: &OrderRecord) -> Result<()> {
        let url = self.url(&format!("/orders/{}", order.id));
        self.send("update order", self.inner.client.put(url).json(order))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl StockService for RestClient {
    #[tracing::instrument(skip(self))]
    async fn fetch_stock(&self, product_id: ProductId) -> Result<StockRecord> {
        let url = self.url(&format!("/products/{product_id}"));
        self.send_json("fetch product", self.inner.client.get(url))
            .await
    }

    #[tracing::instrument(skip(self, record), fields(stock = record.stock))]
    async fn replace_stock(&self, product_id: ProductId, record: &StockRecord) -> Result<()> {
        let url = self.url(&format!("/products/{product_id}"));
        self.send("update product", self.inner.client.put(url).json(record))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PaymentService for RestClient {
    #[tracing::instrument(skip(self, request), fields(external_order_ref = %request.external_order_ref))]
    async fn request_session(&self, request: &PaymentRequest) -> Result<PaymentSession> {
        let http = self.inner.client.post(self.url("/payments")).json(request);
        let response: PaymentResponse = self.send_json("request payment", http).await?;

        Ok(PaymentSession {
            session_id: response.session_id,
            amount: request.amount,
            redirect_url: response.redirect_url.filter(|url| !url.trim().is_empty()),
        })
    }
}
