//! SQL identifier quoting for generated statements.

/// Quote an identifier for Postgres, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Render a schema-qualified table reference.
pub fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_identifiers() {
        assert_eq!(quote_ident("tokens"), "\"tokens\"");
    }

    #[test]
    fn doubles_embedded_quotes() {
        assert_eq!(quote_ident("od\"d"), "\"od\"\"d\"");
    }

    #[test]
    fn qualifies_table_references() {
        assert_eq!(qualified("arbitrage", "tokens"), "\"arbitrage\".\"tokens\"");
    }
}
