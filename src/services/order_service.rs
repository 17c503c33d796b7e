use crate::client::ApiClient;
use crate::domain::catalog::{CreateOrderDto, Order, UpdateOrderDto};
use crate::error::Result;
use serde_json::Value;

pub const ORDERS_PATH: &str = "/orders";

#[derive(Debug, Clone)]
pub struct OrderService {
    client: ApiClient,
}

impl OrderService {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Lists orders, optionally only those whose customer name matches.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn get_all(&self, customer_name: Option<&str>) -> Result<Vec<Order>> {
        let mut request = self.client.get(ORDERS_PATH);
        if let Some(name) = customer_name.filter(|n| !n.is_empty()) {
            request = request.query("customerName", name);
        }
        request.send().await
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn get_by_id(&self, id: i64) -> Result<Order> {
        self.client.get(format!("{ORDERS_PATH}/{id}")).send().await
    }

    #[tracing::instrument(skip(self, dto), fields(lines = dto.order_details.len()), err(level = "warn"))]
    pub async fn create(&self, dto: &CreateOrderDto) -> Result<Order> {
        let order: Order = self.client.post(ORDERS_PATH).json(dto).send().await?;
        tracing::info!(order_id = order.id, total = order.total(), "Order created");
        Ok(order)
    }

    /// Changes status, for example marking an order paid or cancelling it with a reason.
    #[tracing::instrument(skip(self, dto), err(level = "warn"))]
    pub async fn update(&self, id: i64, dto: &UpdateOrderDto) -> Result<Order> {
        self.client.patch(format!("{ORDERS_PATH}/{id}")).json(dto).send().await
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn remove(&self, id: i64) -> Result<()> {
        self.client.delete(format!("{ORDERS_PATH}/{id}")).send::<Value>().await.map(drop)
    }
}
