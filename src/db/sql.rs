// ABOUTME: SQL text construction for ClickHouse statements
// ABOUTME: Identifier quoting, literal escaping, and batch INSERT building

use crate::models::TableRef;

/// Quote an identifier with backticks, doubling any embedded backtick.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quote a string literal, doubling any embedded single quote.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Render a cell for a VALUES tuple. Absent cells become the SQL NULL
/// literal, never the empty string.
pub fn render_cell(cell: Option<&str>) -> String {
    match cell {
        Some(value) => quote_literal(value),
        None => "NULL".to_string(),
    }
}

/// Build a single batched INSERT covering every row.
///
/// All rows go into one statement; there is no chunking. Rows must be
/// aligned with `columns` and non-empty (the caller short-circuits the
/// zero-row case before building a statement).
pub fn build_insert(table: &TableRef, columns: &[String], rows: &[Vec<Option<String>>]) -> String {
    let column_list: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();

    let tuples: Vec<String> = rows
        .iter()
        .map(|row| {
            let cells: Vec<String> = row.iter().map(|c| render_cell(c.as_deref())).collect();
            format!("({})", cells.join(", "))
        })
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES {}",
        table.qualified(),
        column_list.join(", "),
        tuples.join(", ")
    )
}

/// Build the projection query for an export.
pub fn build_select(table: &TableRef, columns: &[String]) -> String {
    let column_list: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    format!("SELECT {} FROM {}", column_list.join(", "), table.qualified())
}

/// Build the preview query. The limit is rendered inline; it is a caller
/// integer, not user text.
pub fn build_preview(table: &TableRef, limit: u64) -> String {
    format!("SELECT * FROM {} LIMIT {}", table.qualified(), limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TableRef {
        TableRef {
            database: "db".to_string(),
            name: "t".to_string(),
        }
    }

    #[test]
    fn test_quote_literal_doubles_quotes() {
        assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
        assert_eq!(quote_literal("plain"), "'plain'");
        assert_eq!(quote_literal(""), "''");
    }

    #[test]
    fn test_render_cell_null() {
        assert_eq!(render_cell(None), "NULL");
        assert_eq!(render_cell(Some("")), "''");
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("name"), "`name`");
        assert_eq!(quote_ident("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_build_insert_batches_all_rows() {
        let columns = vec!["a".to_string(), "b".to_string()];
        let rows = vec![
            vec![Some("1".to_string()), Some("2".to_string())],
            vec![Some("3".to_string()), Some("4".to_string())],
        ];
        assert_eq!(
            build_insert(&table(), &columns, &rows),
            "INSERT INTO `db`.`t` (`a`, `b`) VALUES ('1', '2'), ('3', '4')"
        );
    }

    #[test]
    fn test_build_insert_escapes_and_nulls() {
        let columns = vec!["name".to_string(), "note".to_string()];
        let rows = vec![vec![Some("O'Brien".to_string()), None]];
        assert_eq!(
            build_insert(&table(), &columns, &rows),
            "INSERT INTO `db`.`t` (`name`, `note`) VALUES ('O''Brien', NULL)"
        );
    }

    #[test]
    fn test_build_select() {
        let columns = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            build_select(&table(), &columns),
            "SELECT `a`, `b` FROM `db`.`t`"
        );
    }

    #[test]
    fn test_build_preview_limit() {
        assert_eq!(build_preview(&table(), 0), "SELECT * FROM `db`.`t` LIMIT 0");
        assert_eq!(
            build_preview(&table(), 100),
            "SELECT * FROM `db`.`t` LIMIT 100"
        );
    }
}
