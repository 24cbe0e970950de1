//! Integration tests for the repairdoc rendering pipeline.
//!
//! These tests exercise the full path from JSON input to PDF output.
//! They verify:
//! - Work-order JSON decodes leniently
//! - Rows land on the right pages and every page is full
//! - Totals do not depend on pagination
//! - PDF output is structurally valid

use repairdoc::font::FontContext;
use repairdoc::format::{format_number, format_str, format_value};
use repairdoc::layout::{flatten, LayoutEngine, Row};
use repairdoc::model::*;
use repairdoc::render::SheetRenderer;
use repairdoc::style::RenderConfig;
use repairdoc::RepairDocError;

// ─── Helpers ────────────────────────────────────────────────────

fn make_task(code: &str, material: (f64, f64)) -> Task {
    Task {
        code: code.to_string(),
        name: format!("작업 {code}"),
        unit: "m2".to_string(),
        unit_count: 1.0,
        material_cost: material.0,
        material_price: material.1,
        total_cost: material.0,
        total_price: material.1,
        ..Default::default()
    }
}

fn make_process(name: &str, task_count: usize) -> Process {
    let tasks = (0..task_count)
        .map(|i| make_task(&format!("{name}-{i}"), (100.0, 120.0)))
        .collect();
    Process::new(name, "2026-04-30", tasks)
}

fn engine(rows_per_page: usize) -> LayoutEngine {
    LayoutEngine::new(rows_per_page).unwrap()
}

fn render_to_pdf(document: &RepairDocument) -> Vec<u8> {
    repairdoc::render(document, &RenderConfig::default(), &FontContext::new()).unwrap()
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 50, "PDF too small to be valid");
    assert!(bytes.starts_with(b"%PDF-1.7"), "Missing PDF header");
    assert!(
        bytes.windows(5).any(|w| w == b"%%EOF"),
        "Missing %%EOF marker"
    );
    assert!(
        bytes.windows(4).any(|w| w == b"xref"),
        "Missing xref table"
    );
    assert!(
        bytes.windows(7).any(|w| w == b"trailer"),
        "Missing trailer"
    );
}

fn count_pdf_pages(bytes: &[u8]) -> usize {
    let text = String::from_utf8_lossy(bytes);
    text.matches("/Type /Page ").count()
}

// ─── Basic Pipeline Tests ───────────────────────────────────────

#[test]
fn test_empty_document_still_renders_a_table_page() {
    let pages = engine(15).layout(&[]);
    assert_eq!(pages.len(), 1);
    assert!(pages[0].rows.iter().all(Row::is_blank));

    let bytes = render_to_pdf(&RepairDocument::default());
    assert_valid_pdf(&bytes);
    // One table page plus the summary page
    assert_eq!(count_pdf_pages(&bytes), 2);
}

#[test]
fn test_flatten_order_and_count() {
    let processes = vec![make_process("A", 2), make_process("B", 0), make_process("C", 1)];
    let rows = flatten(&processes);
    assert_eq!(rows.len(), 3 + 3);

    let shape: Vec<char> = rows
        .iter()
        .map(|r| if r.is_header() { 'H' } else { 'T' })
        .collect();
    assert_eq!(shape, vec!['H', 'T', 'T', 'H', 'H', 'T']);
}

#[test]
fn test_every_page_has_exactly_capacity_rows() {
    let processes: Vec<Process> = (0..7).map(|i| make_process(&format!("P{i}"), i + 1)).collect();
    for capacity in [1, 2, 3, 5, 15] {
        for page in engine(capacity).layout(&processes) {
            assert_eq!(page.rows.len(), capacity, "capacity {capacity}");
        }
    }
}

// ─── Page Assignment Tests ──────────────────────────────────────

#[test]
fn test_header_never_orphaned_at_any_boundary() {
    let processes: Vec<Process> = (0..9).map(|i| make_process(&format!("P{i}"), (i * 3) % 7 + 1)).collect();
    for capacity in [2, 3, 4, 5, 6, 15] {
        let pages = engine(capacity).layout(&processes);
        for (i, page) in pages.iter().enumerate() {
            let last = &page.rows[capacity - 1];
            let more_follow = pages[i + 1..].iter().any(|p| p.content_rows() > 0);
            assert!(
                !(last.is_header() && more_follow),
                "capacity {capacity}: page {i} ends with an orphaned header"
            );
        }
    }
}

#[test]
fn test_fourteen_rows_then_header_moves_header_to_next_page() {
    // 1 header + 13 tasks = 14 rows, then the next header would take slot 15
    let processes = vec![make_process("방수", 13), make_process("도장", 2)];
    let pages = engine(15).layout(&processes);

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].content_rows(), 14);
    assert!(pages[0].rows[14].is_blank());
    assert!(matches!(
        &pages[1].rows[0],
        Row::ProcessHeader { process_name, .. } if process_name == "도장"
    ));
}

#[test]
fn test_forty_rows_produce_three_pages_without_loss() {
    // 4 processes of 9 tasks = 40 rows
    let processes: Vec<Process> = (0..4).map(|i| make_process(&format!("P{i}"), 9)).collect();
    assert_eq!(flatten(&processes).len(), 40);

    let pages = engine(15).layout(&processes);
    assert_eq!(pages.len(), 3);

    let placed: Vec<Row> = pages
        .iter()
        .flat_map(|p| p.rows.iter().filter(|r| !r.is_blank()).cloned())
        .collect();
    assert_eq!(placed, flatten(&processes));
}

#[test]
fn test_zero_rows_per_page_is_rejected() {
    assert!(matches!(LayoutEngine::new(0), Err(RepairDocError::Config(_))));

    let config = RenderConfig {
        rows_per_page: 0,
        ..Default::default()
    };
    let result = repairdoc::render(&RepairDocument::default(), &config, &FontContext::new());
    assert!(matches!(result, Err(RepairDocError::Config(_))));
}

// ─── Totals Tests ───────────────────────────────────────────────

#[test]
fn test_material_totals_example() {
    let processes = vec![Process::new(
        "방수",
        "",
        vec![make_task("a", (1000.0, 1200.0)), make_task("b", (500.0, 600.0))],
    )];
    let layout = engine(15).layout_document(&RepairDocument {
        processes,
        ..Default::default()
    });
    assert_eq!(layout.totals.material, CostPair { cost: 1500.0, price: 1800.0 });
}

#[test]
fn test_totals_independent_of_capacity() {
    let document = RepairDocument {
        processes: (0..6).map(|i| make_process(&format!("P{i}"), i * 2 + 1)).collect(),
        ..Default::default()
    };
    let wide = engine(15).layout_document(&document);
    let narrow = engine(5).layout_document(&document);
    assert_ne!(wide.pages.len(), narrow.pages.len());
    assert_eq!(wide.totals, narrow.totals);
}

#[test]
fn test_summary_page_shows_formatted_totals() {
    let document = RepairDocument {
        processes: vec![Process::new(
            "방수",
            "",
            vec![make_task("a", (1_000_000.0, 1_234_567.0))],
        )],
        ..Default::default()
    };
    let config = RenderConfig::default();
    let fonts = FontContext::new();
    let layout = engine(config.rows_per_page).layout_document(&document);
    let pages = SheetRenderer::new(&config, &fonts).render(&layout, &document.header);

    let summary = pages.last().unwrap();
    let texts: Vec<&str> = summary.texts().collect();
    assert!(texts.contains(&"1,000,000"));
    assert!(texts.contains(&"1,234,567"));
}

// ─── JSON Deserialization Tests ─────────────────────────────────

#[test]
fn test_lenient_json_document() {
    let json = r#"{
        "header": { "contractName": "시설물 유지보수", "round": 3 },
        "processes": [
            {
                "processName": "방수공사",
                "endDate": "2026-04-12",
                "tasks": [
                    { "code": 101, "materialCost": "1,000", "materialPrice": null, "laborCost": "abc" },
                    { "name": "바탕면 정리" }
                ]
            }
        ]
    }"#;
    let document: RepairDocument = serde_json::from_str(json).unwrap();
    let task = &document.processes[0].tasks[0];
    assert_eq!(task.code, "101");
    assert_eq!(task.material_cost, 1000.0);
    assert_eq!(task.material_price, 0.0);
    assert_eq!(task.labor_cost, 0.0);
    assert_eq!(document.processes[0].tasks[1].unit_count, 0.0);

    let bytes = repairdoc::render_json(json, &RenderConfig::default(), &FontContext::new()).unwrap();
    assert_valid_pdf(&bytes);
}

#[test]
fn test_invalid_json_carries_hint() {
    let err = repairdoc::render_json("{ \"processes\": [", &RenderConfig::default(), &FontContext::new())
        .unwrap_err();
    assert!(matches!(err, RepairDocError::ParseError { .. }));
    assert!(!err.hint().is_empty());
}

// ─── Formatter Tests ────────────────────────────────────────────

#[test]
fn test_formatter_examples() {
    assert_eq!(format_number(1234567.0), "1,234,567");
    assert_eq!(format_value(&serde_json::Value::Null), "");
    assert_eq!(format_str(""), "");
    assert_eq!(format_str("1,234"), "1,234");
}

// ─── PDF Output Tests ───────────────────────────────────────────

#[test]
fn test_page_count_in_pdf_matches_layout() {
    let document = RepairDocument {
        processes: (0..4).map(|i| make_process(&format!("P{i}"), 9)).collect(),
        ..Default::default()
    };
    let bytes = render_to_pdf(&document);
    assert_valid_pdf(&bytes);
    assert_eq!(count_pdf_pages(&bytes), 3 + 1);
}

#[test]
fn test_metadata_in_output() {
    let document = RepairDocument {
        header: DocumentHeader {
            title: Some("Repair Confirmation".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let bytes = render_to_pdf(&document);
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Title (Repair Confirmation)"));
}

#[test]
fn test_rendering_is_deterministic() {
    let document = RepairDocument {
        processes: vec![make_process("A", 3)],
        ..Default::default()
    };
    assert_eq!(render_to_pdf(&document), render_to_pdf(&document));
}

// ─── Custom Font Embedding Tests ────────────────────────────────

/// Load a system TTF font for testing. Returns None if not available.
fn load_test_font() -> Option<Vec<u8>> {
    let paths = [
        "/usr/share/fonts/truetype/nanum/NanumGothic.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
    ];
    for path in &paths {
        if let Ok(data) = std::fs::read(path) {
            if ttf_parser::Face::parse(&data, 0).is_ok() {
                return Some(data);
            }
        }
    }
    None
}

fn render_with_custom_font(font_data: &[u8]) -> Vec<u8> {
    let mut fonts = FontContext::new();
    fonts
        .registry_mut()
        .register("TestFont", 400, font_data.to_vec())
        .unwrap();
    let config = RenderConfig {
        font_family: "TestFont".to_string(),
        ..Default::default()
    };
    let document = RepairDocument {
        processes: vec![make_process("Waterproofing", 2)],
        ..Default::default()
    };
    repairdoc::render(&document, &config, &fonts).unwrap()
}

#[test]
fn test_custom_font_has_cidfont_objects() {
    let font_data = match load_test_font() {
        Some(data) => data,
        None => { eprintln!("Skipping: no test TTF font found"); return; }
    };

    let bytes = render_with_custom_font(&font_data);
    assert_valid_pdf(&bytes);
    let text = String::from_utf8_lossy(&bytes);

    assert!(text.contains("CIDFontType2"), "Should contain CIDFontType2 subtype");
    assert!(text.contains("/FontFile2"), "Should contain FontFile2 reference");
    assert!(text.contains("/Type0"), "Should contain Type0 font dictionary");
    assert!(text.contains("/Identity-H"), "Should use Identity-H encoding");
    assert!(text.contains("/ToUnicode"), "Should have ToUnicode CMap");
}

#[test]
fn test_unparsable_font_is_rejected() {
    let mut fonts = FontContext::new();
    let result = fonts.registry_mut().register("Broken", 400, vec![0u8; 64]);
    assert!(matches!(result, Err(RepairDocError::FontError(_))));
}
