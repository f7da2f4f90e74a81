//! Response payloads: the JSON wire form produced by a classifier and the
//! strongly-typed payload each layout consumes.
//!
//! The wire form mirrors what the assistant's data source emits:
//! `{"type": "...", "data": ..., "title": ..., "description": ..., "text": ...}`.
//! Positional kinds (gantt, waterfall, heatmap, ...) carry a
//! `{"headers": [...], "rows": [[...]]}` table and are converted to typed rows
//! here, so a malformed shape is reported once at the boundary instead of
//! surfacing as broken geometry.

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::layout::numeric::{cell_number, cell_text};

/// One labelled value of a bar, line, or pie series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: String,
    pub value: f64,
}

impl DataPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesChart {
    #[serde(rename = "chartType")]
    pub chart_type: ChartType,
    pub data: Vec<DataPoint>,
}

/// Rectangular string table. Numeric JSON cells are accepted and stringified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub headers: Vec<String>,
    #[serde(deserialize_with = "deserialize_cells")]
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    pub fn new(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }
}

fn cell_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn deserialize_cells<'de, D>(deserializer: D) -> std::result::Result<Vec<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Vec<Value>> = Vec::deserialize(deserializer)?;
    Ok(raw
        .iter()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct GanttTask {
    pub id: String,
    pub name: String,
    pub start: String,
    pub duration: f64,
}

/// One waterfall row. Whether it is a total row is decided at layout time
/// from the configured marker.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterfallStep {
    pub label: String,
    pub delta: f64,
    pub running_total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapRow {
    pub label: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub row_header: String,
    pub columns: Vec<String>,
    pub rows: Vec<HeatmapRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreemapCell {
    pub category: String,
    pub label: String,
    pub budget: f64,
    pub extra: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunnelStage {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxPlotRow {
    pub category: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackedRow {
    pub label: String,
    pub segments: Vec<f64>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackedBar {
    pub category_header: String,
    pub segment_labels: Vec<String>,
    pub total_label: String,
    pub rows: Vec<StackedRow>,
    /// The trailing totals row, kept verbatim and never drawn.
    pub footer: Option<Vec<String>>,
}

/// Payload of an assistant response, one variant per renderable kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartPayload {
    Text,
    Table(TableData),
    Chart(SeriesChart),
    Gantt(Vec<GanttTask>),
    Waterfall(Vec<WaterfallStep>),
    Heatmap(Heatmap),
    Treemap(Vec<TreemapCell>),
    Funnel(Vec<FunnelStage>),
    BoxPlot(Vec<BoxPlotRow>),
    StackedBar(StackedBar),
}

impl ChartPayload {
    /// Wire name of the payload kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Table(_) => "table",
            Self::Chart(_) => "chart",
            Self::Gantt(_) => "gantt",
            Self::Waterfall(_) => "waterfall",
            Self::Heatmap(_) => "heatmap",
            Self::Treemap(_) => "treemap",
            Self::Funnel(_) => "funnel",
            Self::BoxPlot(_) => "boxplot",
            Self::StackedBar(_) => "stackedbar",
        }
    }

    pub fn is_visual(&self) -> bool {
        !matches!(self, Self::Text)
    }
}

/// JSON shape of a response before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireResponse {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// A validated assistant response.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub title: Option<String>,
    pub description: Option<String>,
    pub text: String,
    pub payload: ChartPayload,
}

impl ChatResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            title: None,
            description: None,
            text: text.into(),
            payload: ChartPayload::Text,
        }
    }

    pub fn with_payload(payload: ChartPayload) -> Self {
        Self {
            title: None,
            description: None,
            text: String::new(),
            payload,
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Parse and validate a response from its JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let wire: WireResponse =
            serde_json::from_str(json).wrap_err("Response is not valid JSON")?;
        Self::try_from(wire)
    }
}

impl TryFrom<WireResponse> for ChatResponse {
    type Error = color_eyre::Report;

    fn try_from(wire: WireResponse) -> Result<Self> {
        let kind = wire.kind.to_lowercase();
        let raw = (kind != "text" && !wire.data.is_null()).then(|| wire.data.to_string());
        let payload = parse_payload(&kind, wire.data)
            .wrap_err_with(|| format!("Invalid '{}' payload", kind))?;
        // An unrecognised shape degrades to text; keep its data readable.
        let text = match (wire.text, &payload) {
            (Some(text), _) => text,
            (None, ChartPayload::Text) => raw.unwrap_or_default(),
            (None, _) => String::new(),
        };
        Ok(Self {
            title: wire.title,
            description: wire.description,
            text,
            payload,
        })
    }
}

fn parse_payload(kind: &str, data: Value) -> Result<ChartPayload> {
    let payload = match kind {
        "text" => ChartPayload::Text,
        "table" => ChartPayload::Table(parse_table(data)?),
        "chart" => ChartPayload::Chart(serde_json::from_value(data)?),
        "gantt" => ChartPayload::Gantt(gantt_tasks(&parse_table(data)?)?),
        "waterfall" => ChartPayload::Waterfall(waterfall_steps(&parse_table(data)?)?),
        "heatmap" => ChartPayload::Heatmap(heatmap(&parse_table(data)?)?),
        "treemap" => ChartPayload::Treemap(treemap_cells(&parse_table(data)?)?),
        "funnel" => ChartPayload::Funnel(funnel_stages(&parse_table(data)?)?),
        "boxplot" => ChartPayload::BoxPlot(boxplot_rows(&parse_table(data)?)?),
        "stackedbar" => ChartPayload::StackedBar(stacked_bar(&parse_table(data)?)?),
        _ => fallback_payload(data),
    };
    Ok(payload)
}

/// Unknown kinds render as a table when the data looks like one.
fn fallback_payload(data: Value) -> ChartPayload {
    match serde_json::from_value::<TableData>(data) {
        Ok(table) if !table.headers.is_empty() => ChartPayload::Table(table),
        _ => ChartPayload::Text,
    }
}

fn parse_table(data: Value) -> Result<TableData> {
    let table: TableData = serde_json::from_value(data)?;
    if table.headers.is_empty() {
        return Err(eyre!("table has no headers"));
    }
    Ok(table)
}

fn gantt_tasks(table: &TableData) -> Result<Vec<GanttTask>> {
    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Ok(GanttTask {
                id: cell_text(row, 0),
                name: cell_text(row, 1),
                start: cell_text(row, 2),
                duration: non_negative(cell_number(row, i, 3)?, i, 3)?,
            })
        })
        .collect()
}

fn waterfall_steps(table: &TableData) -> Result<Vec<WaterfallStep>> {
    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Ok(WaterfallStep {
                label: cell_text(row, 0),
                delta: cell_number(row, i, 3)?,
                running_total: cell_number(row, i, 4).ok(),
            })
        })
        .collect()
}

fn heatmap(table: &TableData) -> Result<Heatmap> {
    let columns: Vec<String> = table.headers.iter().skip(1).cloned().collect();
    let rows = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let values = (1..=columns.len())
                .map(|c| non_negative(cell_number(row, i, c)?, i, c))
                .collect::<Result<Vec<f64>>>()?;
            Ok(HeatmapRow {
                label: cell_text(row, 0),
                values,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Heatmap {
        row_header: table.headers[0].clone(),
        columns,
        rows,
    })
}

fn treemap_cells(table: &TableData) -> Result<Vec<TreemapCell>> {
    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Ok(TreemapCell {
                category: cell_text(row, 0),
                label: cell_text(row, 1),
                budget: non_negative(cell_number(row, i, 2)?, i, 2)?,
                extra: cell_text(row, 3),
            })
        })
        .collect()
}

fn funnel_stages(table: &TableData) -> Result<Vec<FunnelStage>> {
    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Ok(FunnelStage {
                label: cell_text(row, 0),
                value: non_negative(cell_number(row, i, 1)?, i, 1)?,
            })
        })
        .collect()
}

fn boxplot_rows(table: &TableData) -> Result<Vec<BoxPlotRow>> {
    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            if row.len() < 6 {
                return Err(eyre!(
                    "row {} needs 6 fields (category, min, q1, median, q3, max), found {}",
                    i + 1,
                    row.len()
                ));
            }
            let stats = (1..=5)
                .map(|c| cell_number(row, i, c))
                .collect::<Result<Vec<f64>>>()?;
            if stats.windows(2).any(|w| w[0] > w[1]) {
                return Err(eyre!(
                    "row {}: expected min <= q1 <= median <= q3 <= max",
                    i + 1
                ));
            }
            Ok(BoxPlotRow {
                category: cell_text(row, 0),
                min: stats[0],
                q1: stats[1],
                median: stats[2],
                q3: stats[3],
                max: stats[4],
            })
        })
        .collect()
}

fn stacked_bar(table: &TableData) -> Result<StackedBar> {
    if table.headers.len() < 3 {
        return Err(eyre!(
            "stacked bar needs a category column, at least one segment, and a total column"
        ));
    }
    let last = table.headers.len() - 1;
    let segment_labels = table.headers[1..last].to_vec();
    let (body, footer) = match table.rows.split_last() {
        Some((footer, body)) => (body, Some(footer.clone())),
        None => (&table.rows[..], None),
    };
    let rows = body
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let segments = (1..last)
                .map(|c| non_negative(cell_number(row, i, c)?, i, c))
                .collect::<Result<Vec<f64>>>()?;
            Ok(StackedRow {
                label: cell_text(row, 0),
                segments,
                total: non_negative(cell_number(row, i, last)?, i, last)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(StackedBar {
        category_header: table.headers[0].clone(),
        segment_labels,
        total_label: table.headers[last].clone(),
        rows,
        footer,
    })
}

fn non_negative(v: f64, row: usize, col: usize) -> Result<f64> {
    if v < 0.0 {
        Err(eyre!(
            "row {} column {}: negative value {} is not allowed here",
            row + 1,
            col + 1,
            v
        ))
    } else {
        Ok(v)
    }
}
