use chrono::NaiveDateTime;

use crate::error::StoreError;

/// Get a required column value from a row, returning CorruptRow on failure.
pub fn get<T: rusqlite::types::FromSql>(
    row: &rusqlite::Row<'_>,
    idx: usize,
    table: &'static str,
    column: &'static str,
) -> Result<T, StoreError> {
    row.get(idx).map_err(|e| StoreError::CorruptRow {
        table,
        column,
        detail: e.to_string(),
    })
}

/// Parse a stored timestamp column, returning CorruptRow on parse failure.
pub fn parse_timestamp(
    raw: &str,
    table: &'static str,
    column: &'static str,
) -> Result<NaiveDateTime, StoreError> {
    parley_core::timestamp::parse(raw).map_err(|e| StoreError::CorruptRow {
        table,
        column,
        detail: format!("invalid timestamp {raw:?}: {e}"),
    })
}

/// Whether an insert failed on a UNIQUE constraint.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timestamp_success() {
        let ts = parse_timestamp("2026-01-02 03:04:05", "statuses", "created_at").unwrap();
        assert_eq!(parley_core::timestamp::format(&ts), "2026-01-02 03:04:05");
    }

    #[test]
    fn parse_timestamp_failure() {
        let result = parse_timestamp("yesterday", "messages", "timestamp");
        assert!(matches!(
            result,
            Err(StoreError::CorruptRow { table: "messages", column: "timestamp", .. })
        ));
    }

    #[test]
    fn unique_violation_detected() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT UNIQUE)").unwrap();
        conn.execute("INSERT INTO t (name) VALUES ('a')", []).unwrap();
        let err = conn.execute("INSERT INTO t (name) VALUES ('a')", []).unwrap_err();
        assert!(is_unique_violation(&err));
        assert!(!is_unique_violation(&rusqlite::Error::QueryReturnedNoRows));
    }
}
