pub mod use_cases;

pub use use_cases::analyze_sales::AnalyzeSalesUseCase;
pub use use_cases::report_service::ReportService;
