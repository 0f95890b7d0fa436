//! Report rendering: maps a presentation kind and a dataset to a drawable shape.
//!
//! Everything here is pure. Records are never validated; a Bar record without a
//! `label` simply yields an empty label, and drawing code decides what to do
//! with it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::presentation::PresentationKind;
use crate::state::Record;

/// An sRGB color, kept framework-free so any front-end can map it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Pie slice colors, assigned cyclically by record index
pub const PIE_PALETTE: [Rgb; 5] = [
    Rgb(0x88, 0x84, 0xd8),
    Rgb(0x82, 0xca, 0x9d),
    Rgb(0xff, 0xc6, 0x58),
    Rgb(0xff, 0x80, 0x42),
    Rgb(0xa4, 0xde, 0x6c),
];

/// Category/value pair read from a Bar or Line record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    pub name: String,
    pub value: Option<f64>,
    pub color: Rgb,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Concrete shape a front-end draws for a chart entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChartView {
    /// Bar and Line
    Series(Vec<SeriesPoint>),
    Pie(Vec<PieSlice>),
    List(Vec<String>),
    Table(TableView),
    /// Pretty-printed JSON dump
    Raw(String),
}

/// A rendered report: the untouched dataset plus the view derived from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub kind: PresentationKind,
    pub data: Vec<Record>,
    pub view: ChartView,
}

/// Build a chart entry for `kind` out of `data`.
pub fn render(kind: PresentationKind, data: Vec<Record>) -> ChartEntry {
    let view = match kind {
        PresentationKind::Bar | PresentationKind::Line => {
            ChartView::Series(data.iter().map(series_point).collect())
        }
        PresentationKind::Pie => ChartView::Pie(
            data.iter()
                .enumerate()
                .map(|(i, record)| PieSlice {
                    name: field_text(record, "name"),
                    value: record.get("value").and_then(numeric),
                    color: PIE_PALETTE[i % PIE_PALETTE.len()],
                })
                .collect(),
        ),
        PresentationKind::List => ChartView::List(data.iter().map(list_line).collect()),
        PresentationKind::Table => ChartView::Table(table_view(&data)),
        PresentationKind::None => ChartView::Raw(raw_dump(&data)),
    };

    ChartEntry { kind, data, view }
}

fn series_point(record: &Record) -> SeriesPoint {
    SeriesPoint {
        label: field_text(record, "label"),
        value: record.get("value").and_then(numeric),
    }
}

fn field_text(record: &Record, key: &str) -> String {
    record.get(key).map(value_text).unwrap_or_default()
}

/// Numbers, and strings that parse as numbers (DECIMAL columns often arrive quoted)
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Human text for a value: strings unquoted, nested values as compact JSON
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => value_text(other),
    }
}

fn list_line(record: &Record) -> String {
    match record {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, value_text(v)))
            .collect::<Vec<_>>()
            .join(", "),
        scalar => value_text(scalar),
    }
}

/// Columns come from the first record only. Later records are laid out in that
/// order; their missing fields are blank and their extra fields are dropped.
fn table_view(data: &[Record]) -> TableView {
    let Some(first) = data.first() else {
        return TableView::default();
    };

    let columns: Vec<String> = match first {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => vec!["value".to_string()],
    };

    let rows = data
        .iter()
        .map(|record| match record {
            Value::Object(map) => columns
                .iter()
                .map(|col| map.get(col).map(cell_text).unwrap_or_default())
                .collect(),
            scalar => {
                let mut row = vec![String::new(); columns.len()];
                if let Some(slot) = row.first_mut() {
                    *slot = cell_text(scalar);
                }
                row
            }
        })
        .collect();

    TableView { columns, rows }
}

fn raw_dump(data: &[Record]) -> String {
    serde_json::to_string_pretty(data).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bar_passes_data_through() {
        let data = vec![json!({"label": "Jan", "value": 10}), json!({"label": "Feb", "value": 12.5})];
        let entry = render(PresentationKind::Bar, data.clone());

        assert_eq!(entry.kind, PresentationKind::Bar);
        assert_eq!(entry.data, data);
        assert_eq!(
            entry.view,
            ChartView::Series(vec![
                SeriesPoint { label: "Jan".into(), value: Some(10.0) },
                SeriesPoint { label: "Feb".into(), value: Some(12.5) },
            ])
        );
    }

    #[test]
    fn test_line_tolerates_malformed_records() {
        let data = vec![json!({"value": "not a number"}), json!(7), json!({"label": 2024, "value": "3.5"})];
        let entry = render(PresentationKind::Line, data.clone());

        assert_eq!(entry.data, data);
        let ChartView::Series(points) = entry.view else {
            panic!("expected series view");
        };
        assert_eq!(points[0], SeriesPoint { label: String::new(), value: None });
        assert_eq!(points[1], SeriesPoint { label: String::new(), value: None });
        assert_eq!(points[2], SeriesPoint { label: "2024".into(), value: Some(3.5) });
    }

    #[test]
    fn test_pie_colors_cycle_through_palette() {
        let data: Vec<Record> = (0..7)
            .map(|i| json!({"name": format!("item {}", i), "value": i}))
            .collect();
        let entry = render(PresentationKind::Pie, data);

        let ChartView::Pie(slices) = entry.view else {
            panic!("expected pie view");
        };
        assert_eq!(slices.len(), 7);
        assert_eq!(slices[0].color, PIE_PALETTE[0]);
        assert_eq!(slices[4].color, PIE_PALETTE[4]);
        assert_eq!(slices[5].color, PIE_PALETTE[0]);
        assert_eq!(slices[6].color, PIE_PALETTE[1]);
        assert_eq!(slices[3].name, "item 3");
        assert_eq!(slices[3].value, Some(3.0));
    }

    #[test]
    fn test_palette_colors() {
        assert_eq!(PIE_PALETTE[0], Rgb(0x88, 0x84, 0xd8));
        assert_eq!(PIE_PALETTE[4], Rgb(0xa4, 0xde, 0x6c));
    }

    #[test]
    fn test_list_joins_pairs_in_insertion_order() {
        let data = vec![
            json!({"zeta": "Burger", "alpha": 3, "nested": {"a": 1}}),
            json!("plain text"),
            json!(42),
        ];
        let entry = render(PresentationKind::List, data);

        assert_eq!(
            entry.view,
            ChartView::List(vec![
                "zeta: Burger, alpha: 3, nested: {\"a\":1}".to_string(),
                "plain text".to_string(),
                "42".to_string(),
            ])
        );
    }

    #[test]
    fn test_table_columns_from_first_record() {
        let entry = render(PresentationKind::Table, vec![json!({"a": 1, "b": 2}), json!({"a": 3, "b": 4})]);

        assert_eq!(
            entry.view,
            ChartView::Table(TableView {
                columns: vec!["a".into(), "b".into()],
                rows: vec![vec!["1".into(), "2".into()], vec!["3".into(), "4".into()]],
            })
        );
    }

    #[test]
    fn test_table_heterogeneous_rows_follow_first_record() {
        let data = vec![
            json!({"item": "Fries", "qty": 4}),
            json!({"qty": 2, "extra": true}),
            json!({"item": "Soda", "qty": null}),
        ];
        let ChartView::Table(table) = render(PresentationKind::Table, data).view else {
            panic!("expected table view");
        };

        assert_eq!(table.columns, vec!["item", "qty"]);
        assert_eq!(table.rows[0], vec!["Fries", "4"]);
        assert_eq!(table.rows[1], vec!["", "2"]);
        assert_eq!(table.rows[2], vec!["Soda", ""]);
    }

    #[test]
    fn test_table_empty_dataset_is_empty_table() {
        let entry = render(PresentationKind::Table, Vec::new());
        assert_eq!(entry.view, ChartView::Table(TableView::default()));
    }

    #[test]
    fn test_table_scalar_records_use_value_column() {
        let ChartView::Table(table) = render(PresentationKind::Table, vec![json!("a"), json!(2)]).view else {
            panic!("expected table view");
        };
        assert_eq!(table.columns, vec!["value"]);
        assert_eq!(table.rows, vec![vec!["a".to_string()], vec!["2".to_string()]]);
    }

    #[test]
    fn test_raw_dump_parses_back() {
        let data = vec![
            json!({"order_id": 7, "items": [{"name": "Tea", "price": 2.5}], "note": null}),
            json!("loose"),
        ];
        let ChartView::Raw(text) = render(PresentationKind::None, data.clone()).view else {
            panic!("expected raw view");
        };

        let parsed: Vec<Record> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, data);
        assert!(text.contains("\n  {"));
    }
}
