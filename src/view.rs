// Turns a ranked view into what the user sees: the chart series with its
// styling and tooltips, and the numbered detail list.
use crate::config::AppConfig;
use crate::types::{CellValue, ChartType, DetailItem, RankedEntry, RankedView, ViewSelection};
use crate::util::format_date_mdy;
use serde::{Serialize, Serializer};

pub const UNNAMED_ITEM: &str = "Unnamed Item";
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Rgba { r, g, b, a }
    }

    pub fn opaque(self) -> Self {
        Rgba { a: 1.0, ..self }
    }

    pub fn css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.css())
    }
}

/// Slice colours for pie/doughnut charts, cycled by item position.
pub const PALETTE: [Rgba; 12] = [
    Rgba::new(59, 130, 246, 0.85),
    Rgba::new(16, 185, 129, 0.85),
    Rgba::new(249, 115, 22, 0.85),
    Rgba::new(139, 92, 246, 0.85),
    Rgba::new(236, 72, 153, 0.85),
    Rgba::new(20, 184, 166, 0.85),
    Rgba::new(245, 158, 11, 0.85),
    Rgba::new(99, 102, 241, 0.85),
    Rgba::new(239, 68, 68, 0.85),
    Rgba::new(14, 165, 233, 0.85),
    Rgba::new(217, 70, 239, 0.85),
    Rgba::new(77, 124, 15, 0.85),
];
pub const SLICE_BORDER: Rgba = Rgba::new(255, 255, 255, 0.9);
pub const PRIMARY: Rgba = Rgba::new(37, 99, 235, 1.0);
const FILL: Rgba = Rgba::new(59, 130, 246, 0.6);
const HOVER_FILL: Rgba = Rgba::new(37, 99, 235, 0.8);
const HOVER_BORDER: Rgba = Rgba::new(29, 78, 216, 1.0);

pub fn palette_color(index: usize, hover: bool) -> Rgba {
    let color = PALETTE[index % PALETTE.len()];
    if hover {
        color.opaque()
    } else {
        color
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointStyle {
    pub background: Rgba,
    pub border: Rgba,
    pub hover_background: Rgba,
    pub hover_border: Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TickAlign {
    Center,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickLayout {
    pub rotation: u16,
    pub auto_skip: bool,
    pub font_size: u8,
    pub align: TickAlign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    Top,
    Bottom,
}

/// Declarative chart description handed to a chart backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub chart_type: ChartType,
    pub title: String,
    pub dataset_label: String,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub points: Vec<PointStyle>,
    pub border_width: u8,
    pub border_radius: u8,
    pub tension: f64,
    pub legend: LegendPosition,
    pub bottom_padding: u16,
    pub ticks: Option<TickLayout>,
    pub tooltips: Vec<Vec<String>>,
}

/// "Top 10 Supply Name by Total Paid"
pub fn heading(selection: &ViewSelection, config: &AppConfig) -> String {
    format!(
        "{} {} by {}",
        selection.top_n,
        selection.label_column,
        config.display.display_name(&selection.value_column)
    )
}

/// Real dates print as `MM/DD/YYYY`; anything else prints trimmed, or
/// `N/A` when there is nothing to show.
pub fn date_or_passthrough(cell: Option<&CellValue>) -> String {
    match cell {
        Some(CellValue::Date(d)) => format_date_mdy(d),
        Some(other) => text_or_na(other),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn text_or_na(cell: &CellValue) -> String {
    let text = cell.to_text();
    let text = text.trim();
    if text.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        text.to_string()
    }
}

fn field(entry: &RankedEntry, column: &str) -> String {
    entry.record.row.get(column).map_or_else(|| NOT_AVAILABLE.to_string(), text_or_na)
}

pub fn item_label(entry: &RankedEntry, label_column: &str) -> String {
    let label = entry.record.row.trimmed(label_column);
    if label.is_empty() {
        UNNAMED_ITEM.to_string()
    } else {
        label
    }
}

pub fn detail_items(view: &RankedView, config: &AppConfig) -> Vec<DetailItem> {
    let cols = &config.columns;
    let sel = &view.selection;
    view.entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| DetailItem {
            rank: idx + 1,
            label: item_label(entry, &sel.label_column),
            status: entry.record.payment_status,
            value: config.display.format_value(&sel.value_column, entry.value),
            created_date: date_or_passthrough(entry.record.row.get(&cols.created_date)),
            paid_date: date_or_passthrough(entry.record.row.get(&cols.paid_date)),
            purpose: field(entry, &cols.purpose),
        })
        .collect()
}

/// Axis tick placement for `count` category labels; crowded axes rotate.
pub fn tick_layout(count: usize) -> (TickLayout, u16) {
    let (rotation, font_size, bottom_padding) = match count {
        n if n > 20 => (90, 9, 180),
        n if n > 12 => (75, 10, 160),
        n if n > 7 => (60, 10, 140),
        n if n > 4 => (45, 11, 110),
        _ => (0, 11, 70),
    };
    let ticks = TickLayout {
        rotation,
        auto_skip: rotation > 0,
        font_size,
        align: if rotation > 0 { TickAlign::End } else { TickAlign::Center },
    };
    (ticks, bottom_padding)
}

fn point_styles(chart_type: ChartType, count: usize) -> Vec<PointStyle> {
    (0..count)
        .map(|idx| {
            if chart_type.is_proportional() {
                PointStyle {
                    background: palette_color(idx, false),
                    border: SLICE_BORDER,
                    hover_background: palette_color(idx, true),
                    hover_border: SLICE_BORDER,
                }
            } else {
                PointStyle {
                    background: FILL,
                    border: PRIMARY,
                    hover_background: HOVER_FILL,
                    hover_border: HOVER_BORDER,
                }
            }
        })
        .collect()
}

/// Tooltip body for one data point.
pub fn tooltip_lines(view: &RankedView, index: usize, config: &AppConfig) -> Vec<String> {
    let Some(entry) = view.entries.get(index) else {
        return Vec::new();
    };
    let sel = &view.selection;
    let cols = &config.columns;
    let label = item_label(entry, &sel.label_column);
    let value = config.display.format_value(&sel.value_column, entry.value);
    let status = entry.record.payment_status;

    if sel.chart_type.is_proportional() {
        let total: f64 = view.entries.iter().map(|e| e.value).sum();
        let total = if total == 0.0 { 1.0 } else { total };
        let pct = entry.value / total * 100.0;
        return vec![format!("{}: {} ({:.1}%) ({})", label, value, pct, status)];
    }

    let dataset_label = config.display.display_name(&sel.value_column);
    let row = &entry.record.row;
    vec![
        format!("{}: {}: {} ({})", label, dataset_label, value, status),
        format!("  Requester: {}", field(entry, &cols.requester)),
        format!("  PV Code: {}", field(entry, &cols.code)),
        format!("  Create Date: {}", date_or_passthrough(row.get(&cols.created_date))),
        format!("  Paid Date: {}", date_or_passthrough(row.get(&cols.paid_date))),
        format!("  Paid By: {}", field(entry, &cols.paid_by)),
        format!("  Paid Method: {}", field(entry, &cols.payment_method)),
        format!("  Purpose: {}", field(entry, &cols.purpose)),
    ]
}

pub fn chart_series(view: &RankedView, config: &AppConfig) -> ChartSeries {
    let sel = &view.selection;
    let proportional = sel.chart_type.is_proportional();
    let labels: Vec<String> = view.entries.iter().map(|e| item_label(e, &sel.label_column)).collect();
    let value_display = config.display.display_name(&sel.value_column);
    let (ticks, bottom_padding) = if proportional {
        (None, 20)
    } else {
        let (ticks, padding) = tick_layout(labels.len());
        (Some(ticks), padding)
    };

    ChartSeries {
        chart_type: sel.chart_type,
        title: heading(sel, config),
        dataset_label: value_display.clone(),
        x_title: (!proportional).then(|| sel.label_column.clone()),
        y_title: (!proportional).then_some(value_display),
        points: point_styles(sel.chart_type, labels.len()),
        values: view.values(),
        border_width: if proportional { 3 } else { 2 },
        border_radius: if sel.chart_type == ChartType::Bar { 5 } else { 0 },
        tension: if sel.chart_type == ChartType::Line { 0.35 } else { 0.0 },
        legend: if proportional { LegendPosition::Bottom } else { LegendPosition::Top },
        bottom_padding,
        ticks,
        tooltips: (0..labels.len()).map(|i| tooltip_lines(view, i, config)).collect(),
        labels,
    }
}
