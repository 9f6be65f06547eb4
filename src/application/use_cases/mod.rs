pub mod analyze_sales;
pub mod report_service;
