//! # Sheet Renderer
//!
//! Turns laid-out pages into positioned draw commands. Every content page
//! gets the same frame (title, info line, two-row column header) followed by
//! exactly `rows_per_page` body rows; a final summary page carries the
//! totals. Coordinates are in points with the origin at the top-left of the
//! page; the PDF writer flips them.

use log::warn;

use crate::font::{FontContext, FontKey};
use crate::format::format_number;
use crate::layout::{DocumentLayout, Page, Row};
use crate::model::{CostCategory, DocumentHeader, Task};
use crate::style::{Color, ColumnField, RenderConfig};
use crate::totals::TotalsSummary;

/// A fully positioned page ready for PDF serialization.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<DrawCommand>,
}

impl LayoutPage {
    /// All text drawn on the page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match e {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

/// What to draw.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: Stroke,
    },
    /// Single-line text; `y` is the baseline.
    Text {
        x: f64,
        y: f64,
        text: String,
        font: FontKey,
        font_size: f64,
        color: Color,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
    Right,
}

/// Horizontal extent of one table cell.
#[derive(Debug, Clone, Copy)]
struct Span {
    x: f64,
    width: f64,
}

/// Resolved x positions of every column.
struct ColumnGrid {
    descriptive: Vec<(ColumnField, Span)>,
    /// (category, cost sub-column, price sub-column)
    amounts: Vec<(CostCategory, Span, Span)>,
}

pub struct SheetRenderer<'a> {
    config: &'a RenderConfig,
    fonts: &'a FontContext,
    regular: FontKey,
    bold: FontKey,
}

impl<'a> SheetRenderer<'a> {
    pub fn new(config: &'a RenderConfig, fonts: &'a FontContext) -> Self {
        Self {
            config,
            fonts,
            regular: fonts.resolve_key(&config.font_family, 400),
            bold: fonts.resolve_key(&config.font_family, 700),
        }
    }

    /// Render every content page followed by the summary page.
    pub fn render(&self, layout: &DocumentLayout, header: &DocumentHeader) -> Vec<LayoutPage> {
        let total = layout.pages.len() + 1;
        if self.config.table_height() > self.config.content_height() {
            warn!(
                "table needs {:.0}pt but the page has {:.0}pt; rows will run off the page",
                self.config.table_height(),
                self.config.content_height()
            );
        }

        let mut pages: Vec<LayoutPage> = layout
            .pages
            .iter()
            .map(|page| self.render_content_page(page, header, total))
            .collect();
        pages.push(self.render_summary_page(&layout.totals, header, total));

        self.warn_unencodable(&pages);
        pages
    }

    fn render_content_page(&self, page: &Page, header: &DocumentHeader, total: usize) -> LayoutPage {
        let mut out = self.blank_page();
        let table_top = self.draw_frame(&mut out, header, page.index + 1, total);
        let grid = self.column_grid();
        self.draw_column_header(&mut out, &grid, table_top);

        let body_top = table_top + self.config.header_row_height * 2.0;
        for (i, row) in page.rows.iter().enumerate() {
            let y = body_top + i as f64 * self.config.row_height;
            self.draw_row(&mut out, &grid, row, y);
        }
        out
    }

    fn render_summary_page(
        &self,
        totals: &TotalsSummary,
        header: &DocumentHeader,
        total: usize,
    ) -> LayoutPage {
        let cfg = self.config;
        let mut out = self.blank_page();
        let mut y = self.draw_frame(&mut out, header, total, total);

        y += cfg.info_font_size + 4.0;
        self.text(&mut out, &cfg.labels.summary_title, cfg.margin.left, y, &self.bold, cfg.info_font_size + 2.0);
        y += 8.0;

        let table_width = cfg.content_width().min(480.0);
        let first = Span {
            x: cfg.margin.left,
            width: table_width * 0.3,
        };
        let cost = Span {
            x: first.x + first.width,
            width: table_width * 0.35,
        };
        let price = Span {
            x: cost.x + cost.width,
            width: table_width * 0.35,
        };
        let rh = cfg.row_height;

        let heading = [
            (first, cfg.labels.summary_category.as_str()),
            (cost, cfg.labels.cost.as_str()),
            (price, cfg.labels.price.as_str()),
        ];
        for (span, label) in heading {
            self.cell(&mut out, span, y, rh, Some(cfg.header_fill));
            self.cell_text(&mut out, label, span, y, rh, Align::Center, &self.bold);
        }
        y += rh;

        for group in &cfg.amount_columns {
            let pair = totals.pair(group.category.into());
            for span in [first, cost, price] {
                self.cell(&mut out, span, y, rh, None);
            }
            self.cell_text(&mut out, &group.label, first, y, rh, Align::Center, &self.bold);
            self.cell_text(&mut out, &format_number(pair.cost), cost, y, rh, Align::Right, &self.regular);
            self.cell_text(&mut out, &format_number(pair.price), price, y, rh, Align::Right, &self.regular);
            y += rh;
        }

        if let Some(note) = &cfg.footer_note {
            y += rh;
            for line in note.lines() {
                self.text(&mut out, line, cfg.margin.left, y, &self.regular, cfg.info_font_size);
                y += cfg.info_font_size * 1.5;
            }
        }
        out
    }

    fn blank_page(&self) -> LayoutPage {
        let (width, height) = self.config.page_dimensions();
        LayoutPage {
            width,
            height,
            elements: Vec::new(),
        }
    }

    /// Title, info line and page marker. Returns the y where the table starts.
    fn draw_frame(&self, out: &mut LayoutPage, header: &DocumentHeader, number: usize, total: usize) -> f64 {
        let cfg = self.config;
        let left = cfg.margin.left;
        let right = left + cfg.content_width();

        let title = header.title.as_deref().unwrap_or(&cfg.title);
        let title_y = cfg.margin.top + cfg.title_font_size;
        let title_w = self.fonts.measure_string(title, &self.bold, cfg.title_font_size);
        self.text(out, title, left + (cfg.content_width() - title_w) / 2.0, title_y, &self.bold, cfg.title_font_size);
        out.elements.push(DrawCommand::Line {
            x1: left,
            y1: title_y + 4.0,
            x2: right,
            y2: title_y + 4.0,
            stroke: Stroke {
                color: cfg.border_color,
                width: 1.0,
            },
        });

        let labels = &cfg.labels;
        let info: Vec<String> = [
            (&labels.contract, &header.contract_name),
            (&labels.center, &header.center),
            (&labels.round, &header.round),
            (&labels.order_number, &header.order_number),
            (&labels.issued_on, &header.issued_on),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_ref().map(|v| format!("{label}: {v}")))
        .collect();

        let info_y = title_y + 8.0 + cfg.info_font_size;
        self.text(out, &info.join("   "), left, info_y, &self.regular, cfg.info_font_size);

        let marker = format!("{number} / {total}");
        let marker_w = self.fonts.measure_string(&marker, &self.regular, cfg.info_font_size);
        self.text(out, &marker, right - marker_w, info_y, &self.regular, cfg.info_font_size);

        info_y + 8.0
    }

    fn column_grid(&self) -> ColumnGrid {
        let cfg = self.config;
        let weight: f64 = cfg.columns.iter().map(|c| c.width).sum::<f64>()
            + cfg.amount_columns.iter().map(|c| c.width * 2.0).sum::<f64>();
        let scale = cfg.content_width() / weight;

        let mut x = cfg.margin.left;
        let mut take = |w: f64| {
            let span = Span { x, width: w * scale };
            x += span.width;
            span
        };

        let descriptive = cfg.columns.iter().map(|c| (c.field, take(c.width))).collect();
        let amounts = cfg
            .amount_columns
            .iter()
            .map(|c| (CostCategory::from(c.category), take(c.width), take(c.width)))
            .collect();
        ColumnGrid { descriptive, amounts }
    }

    fn draw_column_header(&self, out: &mut LayoutPage, grid: &ColumnGrid, top: f64) {
        let cfg = self.config;
        let hr = cfg.header_row_height;
        let fill = Some(cfg.header_fill);

        for (column, (_, span)) in cfg.columns.iter().zip(&grid.descriptive) {
            self.cell(out, *span, top, hr * 2.0, fill);
            self.cell_text(out, &column.label, *span, top, hr * 2.0, Align::Center, &self.bold);
        }
        for (group, (_, cost, price)) in cfg.amount_columns.iter().zip(&grid.amounts) {
            let whole = Span {
                x: cost.x,
                width: cost.width + price.width,
            };
            self.cell(out, whole, top, hr, fill);
            self.cell_text(out, &group.label, whole, top, hr, Align::Center, &self.bold);
            for (span, label) in [(*cost, &cfg.labels.cost), (*price, &cfg.labels.price)] {
                self.cell(out, span, top + hr, hr, fill);
                self.cell_text(out, label, span, top + hr, hr, Align::Center, &self.bold);
            }
        }
    }

    fn draw_row(&self, out: &mut LayoutPage, grid: &ColumnGrid, row: &Row, y: f64) {
        let rh = self.config.row_height;
        match row {
            Row::ProcessHeader {
                process_name,
                end_date,
            } => {
                let full = Span {
                    x: self.config.margin.left,
                    width: self.config.content_width(),
                };
                self.cell(out, full, y, rh, Some(self.config.process_fill));
                let label = if end_date.is_empty() {
                    process_name.clone()
                } else {
                    format!("{process_name}  ({} {end_date})", self.config.labels.end_date)
                };
                self.cell_text(out, &label, full, y, rh, Align::Left, &self.bold);
            }
            Row::Task(task) => {
                for (field, span) in &grid.descriptive {
                    self.cell(out, *span, y, rh, None);
                    let align = if field.is_numeric() { Align::Right } else { Align::Left };
                    self.cell_text(out, &task_field(task, *field), *span, y, rh, align, &self.regular);
                }
                for (category, cost, price) in &grid.amounts {
                    let pair = task.pair(*category);
                    self.cell(out, *cost, y, rh, None);
                    self.cell(out, *price, y, rh, None);
                    self.cell_text(out, &format_number(pair.cost), *cost, y, rh, Align::Right, &self.regular);
                    self.cell_text(out, &format_number(pair.price), *price, y, rh, Align::Right, &self.regular);
                }
            }
            Row::Blank => {
                for (_, span) in &grid.descriptive {
                    self.cell(out, *span, y, rh, None);
                }
                for (_, cost, price) in &grid.amounts {
                    self.cell(out, *cost, y, rh, None);
                    self.cell(out, *price, y, rh, None);
                }
            }
        }
    }

    fn cell(&self, out: &mut LayoutPage, span: Span, y: f64, height: f64, fill: Option<Color>) {
        out.elements.push(DrawCommand::Rect {
            x: span.x,
            y,
            width: span.width,
            height,
            fill,
            stroke: Some(Stroke {
                color: self.config.border_color,
                width: self.config.border_width,
            }),
        });
    }

    #[allow(clippy::too_many_arguments)]
    fn cell_text(
        &self,
        out: &mut LayoutPage,
        text: &str,
        span: Span,
        y: f64,
        height: f64,
        align: Align,
        font: &FontKey,
    ) {
        let size = self.config.font_size;
        let pad = self.config.cell_padding;
        let fitted = self.fit_text(text, span.width - pad * 2.0, font, size);
        if fitted.is_empty() {
            return;
        }
        let w = self.fonts.measure_string(&fitted, font, size);
        let x = match align {
            Align::Left => span.x + pad,
            Align::Center => span.x + (span.width - w) / 2.0,
            Align::Right => span.x + span.width - pad - w,
        };
        // Cap height of the sheet fonts is roughly 0.7em
        let baseline = y + (height + size * 0.7) / 2.0;
        self.text(out, &fitted, x, baseline, font, size);
    }

    fn text(&self, out: &mut LayoutPage, text: &str, x: f64, y: f64, font: &FontKey, size: f64) {
        if text.is_empty() {
            return;
        }
        out.elements.push(DrawCommand::Text {
            x,
            y,
            text: text.to_string(),
            font: font.clone(),
            font_size: size,
            color: self.config.text_color,
        });
    }

    /// Truncate `text` with an ellipsis so it fits in `max_width`.
    fn fit_text(&self, text: &str, max_width: f64, font: &FontKey, size: f64) -> String {
        if self.fonts.measure_string(text, font, size) <= max_width {
            return text.to_string();
        }
        let ellipsis = self.fonts.char_width('…', font, size);
        let mut width = 0.0;
        let mut fitted = String::new();
        for ch in text.chars() {
            let w = self.fonts.char_width(ch, font, size);
            if width + w + ellipsis > max_width {
                break;
            }
            width += w;
            fitted.push(ch);
        }
        if fitted.is_empty() {
            return fitted;
        }
        fitted.push('…');
        fitted
    }

    fn warn_unencodable(&self, pages: &[LayoutPage]) {
        let missing = pages.iter().flat_map(|p| p.elements.iter()).find_map(|e| match e {
            DrawCommand::Text { text, font, .. } if !self.fonts.can_encode(text, font) => Some(text),
            _ => None,
        });
        if let Some(text) = missing {
            warn!(
                "font '{}' cannot draw {:?}; add a TrueType font that covers it under render.fonts",
                self.regular.family, text
            );
        }
    }
}

fn task_field(task: &Task, field: ColumnField) -> String {
    match field {
        ColumnField::Code => task.code.clone(),
        ColumnField::Name => task.name.clone(),
        ColumnField::Spec => task.spec.clone(),
        ColumnField::Unit => task.unit.clone(),
        ColumnField::UnitCount => format_number(task.unit_count),
        ColumnField::CalcDetail => task.calc_detail.clone(),
        ColumnField::UnitPriceId => task.unit_price_id.clone(),
    }
}
