use crate::client::ApiClient;
use crate::domain::catalog::RevenueReport;
use crate::error::Result;

pub const DAILY_REVENUE_PATH: &str = "/revenue/daily";
pub const RANGE_REVENUE_PATH: &str = "/revenue/range";

/// Read-only revenue reports. Dates are `YYYY-MM-DD` strings.
#[derive(Debug, Clone)]
pub struct RevenueService {
    client: ApiClient,
}

impl RevenueService {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Revenue for `date`, or for today when the backend picks the default.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn daily(&self, date: Option<&str>) -> Result<RevenueReport> {
        let mut request = self.client.get(DAILY_REVENUE_PATH);
        if let Some(date) = date {
            request = request.query("date", date);
        }
        request.send().await
    }

    /// One report per day from `start_date` to `end_date`, both inclusive.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn range(&self, start_date: &str, end_date: &str) -> Result<Vec<RevenueReport>> {
        self.client.get(RANGE_REVENUE_PATH).query("startDate", start_date).query("endDate", end_date).send().await
    }
}
