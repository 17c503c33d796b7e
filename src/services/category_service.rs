use crate::client::ApiClient;
use crate::domain::catalog::{Category, CreateCategoryDto, UpdateCategoryDto};
use crate::error::Result;

pub const CATEGORIES_PATH: &str = "/categories";

#[derive(Debug, Clone)]
pub struct CategoryService {
    client: ApiClient,
}

impl CategoryService {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn get_all(&self) -> Result<Vec<Category>> {
        self.client.get(CATEGORIES_PATH).send().await
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn get_by_id(&self, id: i64) -> Result<Category> {
        self.client.get(format!("{CATEGORIES_PATH}/{id}")).send().await
    }

    #[tracing::instrument(skip(self, dto), fields(name = %dto.name), err(level = "warn"))]
    pub async fn create(&self, dto: &CreateCategoryDto) -> Result<Category> {
        self.client.post(CATEGORIES_PATH).json(dto).send().await
    }

    #[tracing::instrument(skip(self, dto), err(level = "warn"))]
    pub async fn update(&self, id: i64, dto: &UpdateCategoryDto) -> Result<Category> {
        self.client.patch(format!("{CATEGORIES_PATH}/{id}")).json(dto).send().await
    }

    /// Soft-deletes the category; the backend answers with the archived row.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn remove(&self, id: i64) -> Result<Category> {
        self.client.delete(format!("{CATEGORIES_PATH}/{id}")).send().await
    }
}
