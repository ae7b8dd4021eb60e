use anyhow::{anyhow, Context};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::board::{DirectoryFetcher, UnlockPersister, UnlockRequest};
use crate::session::{status_col, Cell, Directory, StudentRow, Tab, MISSION_COUNT, SUCCESS_GLYPH};

pub const STORE_FILE: &str = "missionboard.sqlite3";

/// A workspace copy of the class sheet: one table of tabs, one of rows, with
/// each row stored as its JSON cell array.
pub struct SheetStore {
    conn: Connection,
}

pub fn open_store(workspace: &Path) -> anyhow::Result<SheetStore> {
    std::fs::create_dir_all(workspace)?;
    let conn = Connection::open(workspace.join(STORE_FILE))?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    init_schema(&conn)?;
    Ok(SheetStore { conn })
}

#[cfg(test)]
pub fn open_in_memory() -> anyhow::Result<SheetStore> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(SheetStore { conn })
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tabs(
            name TEXT PRIMARY KEY,
            sort_order INTEGER NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sheet_rows(
            tab_name TEXT NOT NULL,
            row_index INTEGER NOT NULL,
            cells_json TEXT NOT NULL,
            updated_at TEXT,
            PRIMARY KEY(tab_name, row_index),
            FOREIGN KEY(tab_name) REFERENCES tabs(name)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sheet_rows_tab ON sheet_rows(tab_name, row_index)",
        [],
    )?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub tab_count: usize,
    pub row_count: usize,
}

impl SheetStore {
    /// Replaces the stored sheet with `directory`. Tab names must be unique,
    /// matching worksheet names in a spreadsheet.
    pub fn import_directory(&self, directory: &Directory) -> anyhow::Result<ImportSummary> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM sheet_rows", [])?;
        tx.execute("DELETE FROM tabs", [])?;

        let now = chrono::Utc::now().to_rfc3339();
        let mut row_count = 0usize;
        for (sort_order, tab) in directory.tabs.iter().enumerate() {
            tx.execute(
                "INSERT INTO tabs(name, sort_order) VALUES(?, ?)",
                (&tab.name, sort_order as i64),
            )
            .with_context(|| format!("failed to insert tab {:?}", tab.name))?;
            for (row_index, row) in tab.rows.iter().enumerate() {
                let cells_json = serde_json::to_string(row)?;
                tx.execute(
                    "INSERT INTO sheet_rows(tab_name, row_index, cells_json, updated_at)
                     VALUES(?, ?, ?, ?)",
                    (&tab.name, row_index as i64, &cells_json, &now),
                )?;
                row_count += 1;
            }
        }
        tx.commit()?;

        Ok(ImportSummary {
            tab_count: directory.tabs.len(),
            row_count,
        })
    }

    pub fn load_directory(&self) -> anyhow::Result<Directory> {
        let mut tab_stmt = self
            .conn
            .prepare("SELECT name FROM tabs ORDER BY sort_order")?;
        let names = tab_stmt
            .query_map([], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut row_stmt = self.conn.prepare(
            "SELECT row_index, cells_json FROM sheet_rows WHERE tab_name = ? ORDER BY row_index",
        )?;
        let mut tabs = Vec::with_capacity(names.len());
        for name in names {
            let raw = row_stmt
                .query_map([&name], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            let mut rows: Vec<StudentRow> = Vec::with_capacity(raw.len());
            for (row_index, cells_json) in raw {
                let row: StudentRow = serde_json::from_str(&cells_json).with_context(|| {
                    format!("corrupt row {} in tab {:?}", row_index, name)
                })?;
                rows.push(row);
            }
            tabs.push(Tab { name, rows });
        }
        Ok(Directory { tabs })
    }

    /// Writes the success glyph into the mission's status column, growing a
    /// short row with empty cells first.
    pub fn apply_unlock(&self, tab: &str, row_index: usize, mission_index: usize) -> anyhow::Result<()> {
        if mission_index >= MISSION_COUNT {
            return Err(anyhow!("mission index {} out of range", mission_index));
        }
        let cells_json: Option<String> = self
            .conn
            .query_row(
                "SELECT cells_json FROM sheet_rows WHERE tab_name = ? AND row_index = ?",
                (tab, row_index as i64),
                |r| r.get(0),
            )
            .optional()?;
        let Some(cells_json) = cells_json else {
            return Err(anyhow!("no row {} in tab {:?}", row_index, tab));
        };

        let mut row: StudentRow = serde_json::from_str(&cells_json)
            .with_context(|| format!("corrupt row {} in tab {:?}", row_index, tab))?;
        let col = status_col(mission_index);
        if row.len() <= col {
            row.resize(col + 1, Cell::String(String::new()));
        }
        row[col] = Cell::String(SUCCESS_GLYPH.to_string());

        self.conn.execute(
            "UPDATE sheet_rows SET cells_json = ?, updated_at = ?
             WHERE tab_name = ? AND row_index = ?",
            (
                serde_json::to_string(&row)?,
                chrono::Utc::now().to_rfc3339(),
                tab,
                row_index as i64,
            ),
        )?;
        Ok(())
    }
}

impl DirectoryFetcher for SheetStore {
    fn fetch_directory(&self) -> anyhow::Result<Directory> {
        self.load_directory()
    }
}

impl UnlockPersister for SheetStore {
    fn persist_unlock(&self, req: &UnlockRequest) -> anyhow::Result<()> {
        self.apply_unlock(&req.tab, req.row_index, req.mission_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::resolve;
    use serde_json::json;

    fn sample() -> Directory {
        serde_json::from_value(json!({
            "tabs": [
                { "name": "Period 2", "rows": [["Zoe", "k9", "❌", "Z1"]] },
                { "name": "Period 1", "rows": [["Bob", "99", "✅", "X1", "❌", "X2"], ["Amy", "55"]] }
            ]
        }))
        .expect("sample directory")
    }

    #[test]
    fn import_then_load_keeps_tab_and_row_order() {
        let store = open_in_memory().expect("store");
        let summary = store.import_directory(&sample()).expect("import");
        assert_eq!(summary, ImportSummary { tab_count: 2, row_count: 3 });

        let d = store.load_directory().expect("load");
        assert_eq!(d, sample());
    }

    #[test]
    fn unlock_writes_glyph_and_pads_short_rows() {
        let store = open_in_memory().expect("store");
        store.import_directory(&sample()).expect("import");

        store.apply_unlock("Period 1", 0, 1).expect("unlock bob");
        store.apply_unlock("Period 1", 1, 3).expect("unlock amy");

        let d = store.load_directory().expect("load");
        let bob = resolve(&d, "bob", "99").expect("bob");
        assert!(bob.mission_unlocked[0] && bob.mission_unlocked[1]);
        let amy = &d.tabs[1].rows[1];
        assert_eq!(amy.len(), status_col(3) + 1);
        assert_eq!(amy[status_col(3)], json!(SUCCESS_GLYPH));
        assert_eq!(amy[2], json!(""));
    }

    #[test]
    fn unlock_unknown_row_is_an_error() {
        let store = open_in_memory().expect("store");
        store.import_directory(&sample()).expect("import");
        assert!(store.apply_unlock("Period 3", 0, 0).is_err());
        assert!(store.apply_unlock("Period 1", 5, 0).is_err());
        assert!(store.apply_unlock("Period 1", 0, MISSION_COUNT).is_err());
    }

    #[test]
    fn reimport_replaces_contents() {
        let store = open_in_memory().expect("store");
        store.import_directory(&sample()).expect("import");
        store
            .import_directory(&Directory::default())
            .expect("reimport");
        assert_eq!(store.load_directory().expect("load").tabs.len(), 0);
    }
}
