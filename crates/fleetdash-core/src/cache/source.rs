// Where the telemetry cache gets its reports from. The HTTP client is the
// production implementation; tests substitute counting fakes.

use std::future::Future;

use fleetdash_api::{EventRecord, EventsQuery, FleetClient, SummaryQuery, SummaryRecord};

use crate::error::CoreError;

/// Backend for summary and event reports.
pub trait ReportSource: Send + Sync {
    fn fetch_summary(
        &self,
        query: SummaryQuery,
    ) -> impl Future<Output = Result<Vec<SummaryRecord>, CoreError>> + Send;

    fn fetch_events(
        &self,
        query: EventsQuery,
    ) -> impl Future<Output = Result<Vec<EventRecord>, CoreError>> + Send;
}

impl ReportSource for FleetClient {
    async fn fetch_summary(&self, query: SummaryQuery) -> Result<Vec<SummaryRecord>, CoreError> {
        Ok(self.summary(&query).await?)
    }

    async fn fetch_events(&self, query: EventsQuery) -> Result<Vec<EventRecord>, CoreError> {
        Ok(self.events(&query).await?)
    }
}
