use crate::client::ApiClient;
use crate::domain::catalog::{CreateProductDto, Product, UpdateProductDto};
use crate::error::Result;

pub const PRODUCTS_PATH: &str = "/products";

#[derive(Debug, Clone)]
pub struct ProductService {
    client: ApiClient,
}

impl ProductService {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Lists products, optionally narrowed to one category.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn get_all(&self, category_id: Option<i64>) -> Result<Vec<Product>> {
        let mut request = self.client.get(PRODUCTS_PATH);
        if let Some(category_id) = category_id {
            request = request.query("categoryId", category_id);
        }
        request.send().await
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn get_by_id(&self, id: i64) -> Result<Product> {
        self.client.get(format!("{PRODUCTS_PATH}/{id}")).send().await
    }

    #[tracing::instrument(skip(self, dto), fields(name = %dto.name), err(level = "warn"))]
    pub async fn create(&self, dto: &CreateProductDto) -> Result<Product> {
        self.client.post(PRODUCTS_PATH).json(dto).send().await
    }

    #[tracing::instrument(skip(self, dto), err(level = "warn"))]
    pub async fn update(&self, id: i64, dto: &UpdateProductDto) -> Result<Product> {
        self.client.patch(format!("{PRODUCTS_PATH}/{id}")).json(dto).send().await
    }

    /// Marks the product deleted and returns it with `deletedAt` set.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn soft_delete(&self, id: i64) -> Result<Product> {
        self.client.delete(format!("{PRODUCTS_PATH}/{id}")).send().await
    }
}
