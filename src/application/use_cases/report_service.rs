use std::sync::Arc;

use tracing::info;

use crate::domain::error::Result;
use crate::domain::report::{ReportSummary, SalesReport};
use crate::infrastructure::db::ReportRepository;
use crate::infrastructure::pdf;

/// Read-side operations over stored reports: history, lookup, deletion and
/// the PDF download.
pub struct ReportService {
    repository: Arc<ReportRepository>,
    history_limit: u32,
}

impl ReportService {
    pub fn new(repository: Arc<ReportRepository>, history_limit: u32) -> Self {
        Self {
            repository,
            history_limit,
        }
    }

    /// The most recent uploads, chart blobs excluded.
    pub async fn history(&self) -> Result<Vec<ReportSummary>> {
        self.repository.list_recent(self.history_limit).await
    }

    pub async fn get(&self, id: &str) -> Result<SalesReport> {
        self.repository.get_report(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.repository.delete_report(id).await?;
        info!(id, "report deleted");
        Ok(())
    }

    /// Fetch a report and assemble its downloadable PDF.
    pub async fn download_pdf(&self, id: &str) -> Result<Vec<u8>> {
        let report = self.repository.get_report(id).await?;
        pdf::render_report_pdf(&report)
    }
}
