use std::fmt;

/// SQL flavor used when rendering statements.
///
/// Only identifier quoting and placeholder tokens vary; statement shapes are
/// the same for every dialect.
pub trait Dialect: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn quote(&self, identifier: &str) -> String;

    /// Placeholder for the `index`-th bound value, 1-based.
    fn bind_var(&self, index: usize) -> String;
}

/// ANSI quoting with `?` placeholders (SQLite and most embedded engines).
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDialect;

impl Dialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn quote(&self, identifier: &str) -> String {
        quote_with(identifier, '"')
    }

    fn bind_var(&self, _index: usize) -> String {
        "?".to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote(&self, identifier: &str) -> String {
        quote_with(identifier, '"')
    }

    fn bind_var(&self, index: usize) -> String {
        format!("${}", index)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

impl Dialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote(&self, identifier: &str) -> String {
        quote_with(identifier, '`')
    }

    fn bind_var(&self, _index: usize) -> String {
        "?".to_string()
    }
}

/// Quote each dot-separated part; embedded quote characters are doubled.
fn quote_with(identifier: &str, quote: char) -> String {
    identifier
        .split('.')
        .map(|part| {
            let escaped = part.replace(quote, &format!("{quote}{quote}"));
            format!("{quote}{escaped}{quote}")
        })
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_quoting() {
        let d = GenericDialect;
        assert_eq!(d.quote("users"), "\"users\"");
        assert_eq!(d.quote("public.users"), "\"public\".\"users\"");
        assert_eq!(d.quote("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(d.bind_var(3), "?");
    }

    #[test]
    fn test_postgres_placeholders() {
        let d = PostgresDialect;
        assert_eq!(d.bind_var(1), "$1");
        assert_eq!(d.bind_var(12), "$12");
    }

    #[test]
    fn test_mysql_quoting() {
        assert_eq!(MysqlDialect.quote("name"), "`name`");
    }
}
