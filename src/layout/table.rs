//! Table layout for `table` payloads and the unknown-kind fallback.

use crate::config::LayoutConfig;
use crate::payload::TableData;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnGeom {
    pub header: String,
    pub x: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    pub columns: Vec<ColumnGeom>,
    /// Rows padded to the header width.
    pub rows: Vec<Vec<String>>,
    pub row_height: f64,
    pub width: f64,
    pub height: f64,
}

const CELL_PADDING: f64 = 12.0;

pub fn layout_table(table: &TableData, cfg: &LayoutConfig) -> TableLayout {
    let ncols = table
        .headers
        .len()
        .max(table.rows.iter().map(|r| r.len()).max().unwrap_or(0));

    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|r| {
            let mut padded = r.clone();
            padded.resize(ncols, String::new());
            padded
        })
        .collect();

    let mut x = 0.0;
    let columns = (0..ncols)
        .map(|c| {
            let header = table.headers.get(c).cloned().unwrap_or_default();
            let longest = std::iter::once(header.chars().count())
                .chain(rows.iter().map(|r| r[c].chars().count()))
                .max()
                .unwrap_or(0);
            let width = longest as f64 * cfg.char_width + CELL_PADDING * 2.0;
            let col = ColumnGeom { header, x, width };
            x += width;
            col
        })
        .collect();

    TableLayout {
        columns,
        row_height: cfg.row_height,
        width: x,
        height: (rows.len() + 1) as f64 * cfg.row_height,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_fit_longest_cell() {
        let cfg = LayoutConfig::default();
        let table = TableData::new(
            &["Name", "Dept"],
            &[&["Priya Raman", "Engineering"], &["Li", "HR"]],
        );
        let layout = layout_table(&table, &cfg);
        assert_eq!(layout.columns.len(), 2);
        assert_eq!(layout.columns[0].width, 11.0 * cfg.char_width + 24.0);
        assert_eq!(layout.columns[1].x, layout.columns[0].width);
        assert_eq!(layout.height, 3.0 * cfg.row_height);
    }

    #[test]
    fn ragged_rows_are_padded() {
        let cfg = LayoutConfig::default();
        let table = TableData::new(&["A", "B", "C"], &[&["1"], &["1", "2", "3", "4"]]);
        let layout = layout_table(&table, &cfg);
        assert_eq!(layout.columns.len(), 4);
        assert!(layout.rows.iter().all(|r| r.len() == 4));
        assert_eq!(layout.columns[3].header, "");
    }
}
