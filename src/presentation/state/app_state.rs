use std::sync::Arc;

use crate::application::ports::{
    ProgressPublisher, RelevanceOracle, ResultExporter, SpreadsheetReader,
};
use crate::application::services::{BatchScheduler, JobStore, OracleClient, Pacer};
use crate::infrastructure::progress::ProgressBroadcaster;
use crate::infrastructure::spreadsheet::{XlsxItemReader, XlsxResultExporter};
use crate::presentation::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<BatchScheduler>,
    pub job_store: Arc<JobStore>,
    pub broadcaster: ProgressBroadcaster,
    pub spreadsheet_reader: Arc<dyn SpreadsheetReader>,
    pub result_exporter: Arc<dyn ResultExporter>,
    pub settings: Settings,
}

impl AppState {
    /// Wires the pipeline around `oracle` with the `.xlsx` reader and exporter.
    pub fn new(settings: Settings, oracle: Arc<dyn RelevanceOracle>) -> Self {
        let pacer = Arc::new(Pacer::new(
            settings.pacing.capacity,
            settings.pacing.refill_period(),
        ));
        let oracle_client = Arc::new(OracleClient::new(oracle, pacer, settings.retry.policy()));
        let job_store = Arc::new(JobStore::new());
        let broadcaster = ProgressBroadcaster::new(settings.progress.channel_capacity);
        let publisher: Arc<dyn ProgressPublisher> = Arc::new(broadcaster.clone());

        let scheduler = Arc::new(BatchScheduler::new(
            oracle_client,
            Arc::clone(&job_store),
            publisher,
            settings.batch.policy(),
        ));

        Self {
            scheduler,
            job_store,
            broadcaster,
            spreadsheet_reader: Arc::new(XlsxItemReader),
            result_exporter: Arc::new(XlsxResultExporter),
            settings,
        }
    }
}
