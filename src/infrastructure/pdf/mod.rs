// ============================================================
// PDF RENDERER
// ============================================================
// Assemble the downloadable one-page report document

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::domain::error::{AppError, Result};
use crate::domain::report::SalesReport;

// A4 in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;

// The chart is displayed at a fixed size regardless of its pixel
// dimensions.
const CHART_DISPLAY_WIDTH: i64 = 400;
const CHART_DISPLAY_HEIGHT: i64 = 250;

/// Build a PDF with the report title, the two statistics and the embedded
/// trend chart.
pub fn render_report_pdf(report: &SalesReport) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let chart_id = doc.add_object(chart_xobject(&report.chart_png)?);

    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
        "XObject" => dictionary! { "Chart" => chart_id },
    });

    let mut operations: Vec<Operation> = Vec::new();
    operations.extend(text_line("Sales Analysis Report", 20, 60, PAGE_HEIGHT - 80));
    operations.extend(text_line(
        &format!("File: {}", report.filename),
        11,
        60,
        PAGE_HEIGHT - 115,
    ));
    operations.extend(text_line(
        &format!("Date: {}", report.uploaded_at.format("%Y-%m-%d %H:%M")),
        11,
        60,
        PAGE_HEIGHT - 132,
    ));
    operations.extend(text_line(
        &format!("Total: ${:.2}", report.total),
        14,
        60,
        PAGE_HEIGHT - 165,
    ));
    operations.extend(text_line(
        &format!("Average: ${:.2}", report.average),
        14,
        60,
        PAGE_HEIGHT - 185,
    ));

    // Place the chart below the statistics block.
    let chart_y = PAGE_HEIGHT - 215 - CHART_DISPLAY_HEIGHT;
    operations.push(Operation::new("q", vec![]));
    operations.push(Operation::new(
        "cm",
        vec![
            CHART_DISPLAY_WIDTH.into(),
            0.into(),
            0.into(),
            CHART_DISPLAY_HEIGHT.into(),
            60.into(),
            chart_y.into(),
        ],
    ));
    operations.push(Operation::new("Do", vec!["Chart".into()]));
    operations.push(Operation::new("Q", vec![]));

    let content = Content { operations };
    let encoded = content
        .encode()
        .map_err(|e| AppError::PdfError(format!("Failed to encode page content: {}", e)))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| AppError::PdfError(format!("Failed to serialize PDF: {}", e)))?;
    Ok(buffer)
}

/// Decode the chart PNG back to raw RGB and wrap it as an image XObject.
fn chart_xobject(png: &[u8]) -> Result<Stream> {
    let img = image::load_from_memory(png)
        .map_err(|e| AppError::PdfError(format!("Failed to decode chart image: {}", e)))?
        .to_rgb8();
    let (width, height) = img.dimensions();

    Ok(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        img.into_raw(),
    ))
}

/// The BT..ET operation group for one line of Helvetica text.
fn text_line(text: &str, size: i64, x: i64, y: i64) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::SeriesPoint;
    use crate::infrastructure::chart::ChartRenderer;
    use chrono::Utc;

    fn sample_report() -> SalesReport {
        let series = vec![
            SeriesPoint::new("2024-01-01", 70.0),
            SeriesPoint::new("2024-01-02", 50.0),
        ];
        let chart_png = ChartRenderer::new(400, 250)
            .render(&series, "date", "Trend (sales)")
            .unwrap();

        SalesReport {
            id: "r-1".to_string(),
            filename: "sales.csv".to_string(),
            uploaded_at: Utc::now(),
            value_column: "sales".to_string(),
            date_column: Some("date".to_string()),
            total: 120.0,
            average: 60.0,
            series,
            chart_png,
        }
    }

    #[test]
    fn test_renders_pdf_document() {
        let pdf = render_report_pdf(&sample_report()).unwrap();

        assert!(pdf.starts_with(b"%PDF-1.5"));
        assert!(pdf.len() > 500);
    }

    #[test]
    fn test_pdf_roundtrips_through_lopdf() {
        let pdf = render_report_pdf(&sample_report()).unwrap();
        let doc = Document::load_mem(&pdf).unwrap();

        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_invalid_chart_bytes_fail() {
        let mut report = sample_report();
        report.chart_png = vec![1, 2, 3];

        let err = render_report_pdf(&report).unwrap_err();
        assert!(matches!(err, AppError::PdfError(_)));
    }
}
