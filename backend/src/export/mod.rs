//! Rendering of normalized tables.
//!
//! - [`preview`] - bounded JSON preview reporting the full table size
//! - [`to_csv`] - complete comma-separated export with a header row
//! - [`export_filename`] - download name derived from the request alone

use serde::Serialize;
use serde_json::{Map, Value};
use std::borrow::Cow;

use crate::error::ExportError;
use crate::models::{Category, NormalizedTable, Scalar};

/// Rows shown when no limit is given.
pub const DEFAULT_PREVIEW_ROWS: usize = 20;

/// Team names used in a download filename.
const FILENAME_TEAMS: usize = 2;

/// The head of a table plus the size of the whole table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

/// Preview the first `limit` rows.
pub fn preview(table: &NormalizedTable, limit: usize) -> Preview {
    Preview {
        row_count: table.row_count(),
        column_count: table.column_count(),
        columns: table.columns().to_vec(),
        rows: table.records(limit),
    }
}

fn csv_field(cell: &Scalar) -> Cow<'_, str> {
    match cell {
        Scalar::Null => Cow::Borrowed(""),
        Scalar::Bool(b) => Cow::Owned(b.to_string()),
        Scalar::Int(n) => Cow::Owned(n.to_string()),
        // Keep a trailing ".0" so whole floats stay distinguishable from ints.
        Scalar::Float(f) if f.fract() == 0.0 && f.abs() < 1e16 => Cow::Owned(format!("{:.1}", f)),
        Scalar::Float(f) => Cow::Owned(f.to_string()),
        Scalar::Text(s) => Cow::Borrowed(s),
    }
}

/// Render the full table as CSV.
pub fn to_csv(table: &NormalizedTable) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.columns())?;
    for row in table.rows() {
        let fields: Vec<Cow<'_, str>> = row.iter().map(csv_field).collect();
        writer.write_record(fields.iter().map(|f| f.as_bytes()))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// Download filename for a request.
///
/// `{category}_{leagues}_{seasons}[_{stat}][_{teams}].csv`; the stat segment
/// only for categories with subtypes, the team segment only when filtering,
/// using at most the first two teams.
pub fn export_filename<S: AsRef<str>>(
    category: Category,
    leagues: &[S],
    seasons: &[S],
    stat_type: Option<&str>,
    teams: &[S],
) -> String {
    let join = |parts: &[S]| {
        parts
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join("_")
    };

    let mut name = format!("{}_{}_{}", category, join(leagues), join(seasons));
    if let Some(stat) = stat_type.filter(|_| category.has_stat_types()) {
        name.push('_');
        name.push_str(stat);
    }
    if !teams.is_empty() {
        name.push('_');
        name.push_str(&join(&teams[..teams.len().min(FILENAME_TEAMS)]));
    }
    name.push_str(".csv");
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: usize) -> NormalizedTable {
        NormalizedTable::new(
            vec!["team".into(), "Gls".into()],
            (0..rows)
                .map(|i| vec![Scalar::Text(format!("Team {}", i)), Scalar::Int(i as i64)])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_preview_reports_full_size() {
        let p = preview(&table(500), DEFAULT_PREVIEW_ROWS);
        assert_eq!(p.rows.len(), 20);
        assert_eq!(p.row_count, 500);
        assert_eq!(p.column_count, 2);
        assert_eq!(p.rows[19]["team"], "Team 19");
    }

    #[test]
    fn test_preview_shorter_than_limit() {
        let p = preview(&table(3), 20);
        assert_eq!(p.rows.len(), 3);
        assert_eq!(p.row_count, 3);
    }

    #[test]
    fn test_csv_escaping() {
        let table = NormalizedTable::new(
            vec!["team".into(), "note, extra".into(), "xG".into(), "W".into()],
            vec![
                vec![
                    Scalar::Text("Brighton & Hove \"Albion\"".into()),
                    Scalar::Text("line\nbreak".into()),
                    Scalar::Float(1.0),
                    Scalar::Bool(true),
                ],
                vec![
                    Scalar::Text("Arsenal".into()),
                    Scalar::Null,
                    Scalar::Float(2.35),
                    Scalar::Bool(false),
                ],
            ],
        )
        .unwrap();

        let csv = String::from_utf8(to_csv(&table).unwrap()).unwrap();
        assert_eq!(
            csv,
            "team,\"note, extra\",xG,W\n\
             \"Brighton & Hove \"\"Albion\"\"\",\"line\nbreak\",1.0,true\n\
             Arsenal,,2.35,false\n"
        );
    }

    #[test]
    fn test_csv_header_only_for_empty_table() {
        let csv = String::from_utf8(to_csv(&table(0)).unwrap()).unwrap();
        assert_eq!(csv, "team,Gls\n");
    }

    #[test]
    fn test_filename_with_stat() {
        let none: [&str; 0] = [];
        assert_eq!(
            export_filename(Category::Team, &["epl"], &["2324"], Some("shooting"), &none),
            "team_epl_2324_shooting.csv"
        );
    }

    #[test]
    fn test_filename_schedule_has_no_stat() {
        let none: [&str; 0] = [];
        assert_eq!(
            export_filename(
                Category::Schedule,
                &["laliga", "seriea"],
                &["2324", "2223"],
                Some("standard"),
                &none
            ),
            "schedule_laliga_seriea_2324_2223.csv"
        );
    }

    #[test]
    fn test_filename_uses_first_two_teams() {
        assert_eq!(
            export_filename(
                Category::Player,
                &["epl"],
                &["2324"],
                Some("keeper"),
                &["Arsenal", "Chelsea", "Everton"]
            ),
            "player_epl_2324_keeper_Arsenal_Chelsea.csv"
        );
    }
}
