use actix_cors::Cors;
use actix_web::{delete, dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::application::{AnalyzeSalesUseCase, ReportService};
use crate::domain::error::AppError;
use crate::domain::report::ReportSummary;
use crate::infrastructure::config::AppConfig;

/// Shared handler state: one use case per concern, all holding the same
/// repository handle.
pub struct AppState {
    pub analyzer: AnalyzeSalesUseCase,
    pub reports: ReportService,
}

#[derive(Deserialize)]
struct UploadQuery {
    filename: Option<String>,
}

#[derive(Serialize)]
struct UploadResponse {
    message: String,
    id: String,
    used_column: String,
    date_column: Option<String>,
    total: f64,
    average: f64,
    /// Base64-encoded PNG, ready for an <img> data URL.
    chart: String,
}

#[derive(Serialize)]
struct HistoryEntry {
    id: String,
    filename: String,
    upload_date: String,
    value_column: String,
    date_column: Option<String>,
    total: f64,
    average: f64,
}

impl From<ReportSummary> for HistoryEntry {
    fn from(summary: ReportSummary) -> Self {
        Self {
            id: summary.id,
            filename: summary.filename,
            upload_date: summary.uploaded_at.format("%Y-%m-%d %H:%M").to_string(),
            value_column: summary.value_column,
            date_column: summary.date_column,
            total: summary.total,
            average: summary.average,
        }
    }
}

/// Map a domain error onto a response: analysis failures are the caller's
/// problem (400), missing records are 404, everything else is a 500 that
/// gets logged.
fn error_response(err: &AppError) -> HttpResponse {
    match err {
        AppError::Decode(_)
        | AppError::EmptyTable(_)
        | AppError::NoNumericColumn(_)
        | AppError::ValidationError(_)
        | AppError::ParseError(_) => {
            HttpResponse::BadRequest().json(serde_json::json!({ "error": err.to_string() }))
        }
        AppError::NotFound(_) => {
            HttpResponse::NotFound().json(serde_json::json!({ "error": "Not found" }))
        }
        _ => {
            error!(%err, "request failed");
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": err.to_string() }))
        }
    }
}

#[post("/reports")]
async fn upload_report(
    data: web::Data<AppState>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> impl Responder {
    if body.is_empty() {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "No CSV file uploaded" }));
    }

    let filename = query
        .filename
        .clone()
        .unwrap_or_else(|| "upload.csv".to_string());
    info!(filename = %filename, bytes = body.len(), "analyzing upload");

    match data.analyzer.execute(&body, &filename).await {
        Ok(report) => HttpResponse::Created().json(UploadResponse {
            message: "Success".to_string(),
            id: report.id,
            used_column: report.value_column,
            date_column: report.date_column,
            total: report.total,
            average: report.average,
            chart: BASE64.encode(&report.chart_png),
        }),
        Err(e) => error_response(&e),
    }
}

#[get("/reports/history")]
async fn report_history(data: web::Data<AppState>) -> impl Responder {
    match data.reports.history().await {
        Ok(summaries) => {
            let entries: Vec<HistoryEntry> = summaries.into_iter().map(Into::into).collect();
            HttpResponse::Ok().json(entries)
        }
        Err(e) => error_response(&e),
    }
}

#[delete("/reports/{id}")]
async fn delete_report(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match data.reports.delete(&path).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "message": "Deleted" })),
        Err(e) => error_response(&e),
    }
}

#[get("/reports/{id}/pdf")]
async fn download_pdf(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match data.reports.download_pdf(&path).await {
        Ok(pdf) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header(("Content-Disposition", "attachment; filename=\"report.pdf\""))
            .body(pdf),
        Err(e) => error_response(&e),
    }
}

pub fn start_server(config: &AppConfig, state: Arc<AppState>) -> std::io::Result<Server> {
    let data = web::Data::from(state);

    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .app_data(data.clone())
            .app_data(web::PayloadConfig::new(16 * 1024 * 1024))
            .service(
                web::scope("/api")
                    .service(upload_report)
                    .service(report_history)
                    .service(delete_report)
                    .service(download_pdf),
            )
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::chart::ChartRenderer;
    use crate::infrastructure::db::ReportRepository;
    use actix_web::{http::StatusCode, test};

    async fn test_state() -> web::Data<AppState> {
        let repository = Arc::new(ReportRepository::connect_in_memory().await.unwrap());
        web::Data::new(AppState {
            analyzer: AnalyzeSalesUseCase::new(repository.clone(), ChartRenderer::new(400, 200)),
            reports: ReportService::new(repository, 5),
        })
    }

    macro_rules! test_app {
        ($state:expr) => {
            test::init_service(
                App::new().app_data($state.clone()).service(
                    web::scope("/api")
                        .service(upload_report)
                        .service(report_history)
                        .service(delete_report)
                        .service(download_pdf),
                ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_upload_analyzes_and_stores() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/reports?filename=sales.csv")
            .set_payload(&b"date,sales\n2024-01-02,$50\n2024-01-01,$70"[..])
            .to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp["message"], "Success");
        assert_eq!(resp["used_column"], "sales");
        assert_eq!(resp["date_column"], "date");
        assert_eq!(resp["total"], 120.0);
        assert_eq!(resp["average"], 60.0);
        assert!(!resp["chart"].as_str().unwrap().is_empty());

        let req = test::TestRequest::get().uri("/api/reports/history").to_request();
        let history: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(history.as_array().unwrap().len(), 1);
        assert_eq!(history[0]["filename"], "sales.csv");
    }

    #[actix_web::test]
    async fn test_upload_rejects_empty_body() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::post().uri("/api/reports").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_upload_rejects_non_numeric_table() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_payload(&b"name,city\nA,Pune\nB,Delhi"[..])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_delete_then_missing() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_payload(&b"a,b\n1,2"[..])
            .to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let id = resp["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::delete()
            .uri(&format!("/api/reports/{}", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/reports/{}", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_pdf_download() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/reports?filename=q1.csv")
            .set_payload(&b"date,sales\n2024-01-01,10\n2024-01-02,20"[..])
            .to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let id = resp["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/api/reports/{}/pdf", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        assert!(body.starts_with(b"%PDF"));
    }

    #[actix_web::test]
    async fn test_pdf_for_missing_report_is_not_found() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::get()
            .uri("/api/reports/nope/pdf")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
