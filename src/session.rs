use serde::{Deserialize, Serialize};

pub const MISSION_COUNT: usize = 20;
pub const SUCCESS_GLYPH: &str = "✅";
pub const FAILURE_GLYPH: &str = "❌";

/// First mission status column; each mission takes a (status, code) pair after it.
const FIRST_MISSION_COL: usize = 2;

pub type Cell = serde_json::Value;
pub type StudentRow = Vec<Cell>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub name: String,
    pub rows: Vec<StudentRow>,
}

/// The `{ tabs: [ { name, rows } ] }` document. Both keys are required, so a
/// web-app error reply fails to decode instead of reading as an empty sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    pub tabs: Vec<Tab>,
}

impl Directory {
    pub fn row_count(&self) -> usize {
        self.tabs.iter().map(|t| t.rows.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub name: String,
    pub tab_name: String,
    pub row_index: usize,
    pub mission_unlocked: [bool; MISSION_COUNT],
    pub mission_code: [String; MISSION_COUNT],
}

impl Session {
    pub fn unlocked_count(&self) -> usize {
        self.mission_unlocked.iter().filter(|u| **u).count()
    }
}

/// Sheet cells arrive as loose JSON. Empty-ish values (`null`, `false`, `0`,
/// `""`) count as absent, mirroring how the sheet web app exported blanks.
pub fn cell_text(cell: Option<&Cell>) -> Option<String> {
    match cell? {
        Cell::Null | Cell::Bool(false) => None,
        Cell::Bool(true) => Some("true".to_string()),
        Cell::String(s) if s.is_empty() => None,
        Cell::String(s) => Some(s.clone()),
        Cell::Number(n) => {
            if let Some(i) = n.as_i64() {
                return (i != 0).then(|| i.to_string());
            }
            let f = n.as_f64()?;
            if f == 0.0 {
                None
            } else if f.fract() == 0.0 && f.abs() < 1e15 {
                Some(format!("{}", f as i64))
            } else {
                Some(f.to_string())
            }
        }
        // Sheet cells are never arrays or objects; JSON text is good enough.
        other => Some(other.to_string()),
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Trimmed, case-insensitive equality used for login and unlock codes alike.
/// The expected side is trimmed too, so a stray space in a sheet cell does
/// not make a code impossible to enter.
pub fn codes_match(input: &str, expected: &str) -> bool {
    normalize(input) == normalize(expected)
}

pub fn decode_row(row: &[Cell]) -> ([bool; MISSION_COUNT], [String; MISSION_COUNT]) {
    let unlocked = std::array::from_fn(|m| {
        let status = cell_text(row.get(FIRST_MISSION_COL + 2 * m))
            .unwrap_or_else(|| FAILURE_GLYPH.to_string());
        status.contains(SUCCESS_GLYPH)
    });
    let codes = std::array::from_fn(|m| {
        cell_text(row.get(FIRST_MISSION_COL + 2 * m + 1)).unwrap_or_default()
    });
    (unlocked, codes)
}

pub fn status_col(mission_index: usize) -> usize {
    FIRST_MISSION_COL + 2 * mission_index
}

/// Finds the first row, in tab order then row order, whose name and login code
/// match. Collisions across tabs are not reported; the earliest row wins.
pub fn resolve(directory: &Directory, name: &str, code: &str) -> Option<Session> {
    let want_name = normalize(name);
    let want_code = normalize(code);

    for tab in &directory.tabs {
        for (row_index, row) in tab.rows.iter().enumerate() {
            let row_name = cell_text(row.first()).unwrap_or_default();
            let row_code = cell_text(row.get(1)).unwrap_or_default();
            if normalize(&row_name) != want_name || normalize(&row_code) != want_code {
                continue;
            }

            let (mission_unlocked, mission_code) = decode_row(row);
            return Some(Session {
                name: row_name.trim().to_string(),
                tab_name: tab.name.clone(),
                row_index,
                mission_unlocked,
                mission_code,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bob_row() -> StudentRow {
        vec![
            json!("Bob"),
            json!("99"),
            json!("✅"),
            json!("X1"),
            json!("❌"),
            json!("X2"),
        ]
    }

    fn directory(tabs: Vec<(&str, Vec<StudentRow>)>) -> Directory {
        Directory {
            tabs: tabs
                .into_iter()
                .map(|(name, rows)| Tab {
                    name: name.to_string(),
                    rows,
                })
                .collect(),
        }
    }

    #[test]
    fn resolves_bob_with_decoded_missions() {
        let d = directory(vec![("A", vec![bob_row()])]);
        let s = resolve(&d, "Bob", "99").expect("session");
        assert_eq!(s.name, "Bob");
        assert_eq!(s.tab_name, "A");
        assert_eq!(s.row_index, 0);
        assert!(s.mission_unlocked[0]);
        assert!(!s.mission_unlocked[1]);
        assert!(s.mission_unlocked[2..].iter().all(|u| !u));
        assert_eq!(s.mission_code[0], "X1");
        assert_eq!(s.mission_code[1], "X2");
        assert_eq!(s.mission_code[2], "");
    }

    #[test]
    fn matching_trims_and_ignores_case() {
        let d = directory(vec![(
            "Period 1",
            vec![vec![json!("  Alice "), json!("ABC1"), json!("✅ done")]],
        )]);
        let upper = resolve(&d, "Alice", "ABC1").expect("upper");
        let lower = resolve(&d, "  alice", "abc1  ").expect("lower");
        assert_eq!(upper, lower);
        assert_eq!(upper.name, "Alice");
        assert!(upper.mission_unlocked[0]);
    }

    #[test]
    fn first_match_wins_across_tabs() {
        let d = directory(vec![
            ("A", vec![vec![json!("Carl"), json!("1")]]),
            (
                "B",
                vec![
                    vec![json!("Dana"), json!("2")],
                    vec![json!("Dana"), json!("2"), json!("✅")],
                ],
            ),
            ("C", vec![vec![json!("dana"), json!("2")]]),
        ]);
        let s = resolve(&d, "Dana", "2").expect("session");
        assert_eq!(s.tab_name, "B");
        assert_eq!(s.row_index, 0);
        assert!(!s.mission_unlocked[0]);
    }

    #[test]
    fn name_and_code_must_both_match() {
        let d = directory(vec![("A", vec![bob_row()])]);
        assert!(resolve(&d, "Bob", "98").is_none());
        assert!(resolve(&d, "Rob", "99").is_none());
        assert!(resolve(&Directory::default(), "Bob", "99").is_none());
    }

    #[test]
    fn decoding_is_total_for_short_and_empty_rows() {
        let (unlocked, codes) = decode_row(&[]);
        assert_eq!(unlocked.len(), MISSION_COUNT);
        assert_eq!(codes.len(), MISSION_COUNT);
        assert!(unlocked.iter().all(|u| !u));
        assert!(codes.iter().all(|c| c.is_empty()));

        let mut full: StudentRow = vec![json!("Eve"), json!("7")];
        for m in 0..MISSION_COUNT {
            full.push(json!(SUCCESS_GLYPH));
            full.push(json!(format!("c{m}")));
        }
        full.push(json!("ignored trailing cell"));
        let (unlocked, codes) = decode_row(&full);
        assert!(unlocked.iter().all(|u| *u));
        assert_eq!(codes[19], "c19");
    }

    #[test]
    fn numeric_cells_coerce_to_text() {
        let d = directory(vec![(
            "A",
            vec![vec![json!("Finn"), json!(1234), json!(null), json!(42.0)]],
        )]);
        let s = resolve(&d, "finn", "1234").expect("session");
        assert!(!s.mission_unlocked[0]);
        assert_eq!(s.mission_code[0], "42");
        assert_eq!(cell_text(Some(&json!(0))), None);
        assert_eq!(cell_text(Some(&json!(false))), None);
        assert_eq!(cell_text(Some(&json!(2.5))).as_deref(), Some("2.5"));
    }

    #[test]
    fn codes_match_is_trimmed_and_case_insensitive() {
        assert!(codes_match(" x2 ", "X2"));
        assert!(codes_match("x2", " X2 "));
        assert!(!codes_match("x2", "X3"));
        assert!(!codes_match("x2", ""));
    }

    #[test]
    fn directory_parses_fetch_payload() {
        let d: Directory = serde_json::from_value(json!({
            "tabs": [ { "name": "A", "rows": [["Bob", "99"]] }, { "name": "B", "rows": [] } ]
        }))
        .expect("parse directory");
        assert_eq!(d.tabs.len(), 2);
        assert_eq!(d.row_count(), 1);
    }

    #[test]
    fn directory_requires_tabs_and_rows() {
        let error_reply = json!({ "error": "Script function not found: doGet" });
        assert!(serde_json::from_value::<Directory>(error_reply).is_err());
        let no_rows = json!({ "tabs": [ { "name": "B" } ] });
        assert!(serde_json::from_value::<Directory>(no_rows).is_err());
    }
}
