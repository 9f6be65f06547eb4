use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use salescope::application::{AnalyzeSalesUseCase, ReportService};
use salescope::infrastructure::chart::ChartRenderer;
use salescope::infrastructure::config::AppConfig;
use salescope::infrastructure::db::ReportRepository;
use salescope::interfaces::http::{start_server, AppState};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env).init();

    let config = AppConfig::load().map_err(io::Error::other)?;
    info!(host = %config.host, port = config.port, db = %config.database_path, "startup");

    let repository = Arc::new(
        ReportRepository::connect(Path::new(&config.database_path))
            .await
            .map_err(io::Error::other)?,
    );

    let state = Arc::new(AppState {
        analyzer: AnalyzeSalesUseCase::new(
            repository.clone(),
            ChartRenderer::new(config.chart_width, config.chart_height),
        ),
        reports: ReportService::new(repository, config.history_limit),
    });

    start_server(&config, state)?.await
}
