use sqlparser::ast::Statement;
use sqlparser::dialect::DuckDbDialect;
use sqlparser::parser::Parser;

use crate::api::middleware::AppError;

/// Keywords that indicate a mutating statement. Matched as whole words
/// anywhere in the candidate, so a false positive inside a string literal
/// over-rejects rather than under-rejects.
const MUTATING_KEYWORDS: &[&str] = &[
    "insert", "update", "delete", "drop", "alter", "create", "truncate",
];

/// A validated, row-capped, read-only statement derived from untrusted
/// model output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedStatement {
    pub sql: String,
    pub max_rows: u64,
}

/// Static validation for model-generated SQL
pub struct SqlGuard;

impl SqlGuard {
    /// Validate a candidate statement and wrap it with an enforced row cap.
    ///
    /// Model-generated SQL is untrusted input: it must never write and must
    /// never return an unbounded result set. The cap is enforced twice, once
    /// inline when the statement has no LIMIT of its own, and once by an
    /// unconditional outer wrap that holds even when the inner LIMIT sits in
    /// a subquery.
    pub fn guard(candidate: &str, max_rows: u64) -> Result<GuardedStatement, AppError> {
        let stmt = candidate.trim().trim_end_matches(';').trim();
        if stmt.is_empty() {
            return Err(AppError::NoStatementProvided);
        }

        let lower = stmt.to_lowercase();
        if let Some(keyword) = Self::find_mutating_keyword(&lower) {
            return Err(AppError::MutatingKeywordDetected(keyword.to_string()));
        }

        match Self::first_keyword(&lower) {
            Some("select") => {}
            Some(other) => {
                return Err(AppError::NonSelectStatement(format!(
                    "statement starts with '{other}'"
                )))
            }
            None => return Err(AppError::NoStatementProvided),
        }

        let query = Self::parse_single_query(stmt)?;

        // Inline cap when the top level has no LIMIT of its own. Joined on
        // its own line: a trailing `--` comment in the statement would
        // otherwise swallow the cap.
        let limited = if Self::has_top_level_limit(&query) {
            stmt.to_string()
        } else {
            format!("{stmt}\nLIMIT {max_rows}")
        };

        // Outer wrap holds the cap regardless of what the inner LIMIT says;
        // the closing paren gets its own line for the same comment reason
        let sql = format!("SELECT * FROM (\n{limited}\n) AS guarded LIMIT {max_rows}");

        Ok(GuardedStatement { sql, max_rows })
    }

    fn find_mutating_keyword(lower: &str) -> Option<&'static str> {
        lower
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .filter(|token| !token.is_empty())
            .find_map(|token| MUTATING_KEYWORDS.iter().copied().find(|kw| *kw == token))
    }

    fn first_keyword(lower: &str) -> Option<&str> {
        lower
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .find(|token| !token.is_empty())
    }

    /// Parse with the DuckDB dialect and require exactly one query-form
    /// statement. This is the parser-level backstop behind the textual
    /// checks above.
    fn parse_single_query(sql: &str) -> Result<Statement, AppError> {
        let dialect = DuckDbDialect {};
        let mut statements = Parser::new(&dialect)
            .try_with_sql(sql)
            .map_err(|e| AppError::NonSelectStatement(format!("SQL parsing error: {e}")))?
            .parse_statements()
            .map_err(|e| AppError::NonSelectStatement(format!("SQL parsing error: {e}")))?;

        let stmt = match statements.pop() {
            Some(stmt) if statements.is_empty() => stmt,
            Some(_) => {
                return Err(AppError::NonSelectStatement(
                    "expected a single statement".to_string(),
                ))
            }
            None => return Err(AppError::NoStatementProvided),
        };

        match stmt {
            Statement::Query(_) => Ok(stmt),
            other => Err(AppError::NonSelectStatement(format!(
                "only SELECT queries are permitted, found: {other}"
            ))),
        }
    }

    /// LIMIT detection via the AST, avoiding false positives from
    /// identifiers or comments that merely contain the word
    fn has_top_level_limit(stmt: &Statement) -> bool {
        match stmt {
            Statement::Query(query) => query.limit_clause.is_some(),
            _ => false,
        }
    }
}

/// Rewrite bare `silver.` / `gold.` qualifiers to the resolved schema names.
/// Models often echo the logical layer names even when the catalog uses the
/// `main_` prefixed convention.
pub fn qualify_schema_names(sql: &str, silver: &str, gold: &str) -> String {
    let rewritten = replace_qualifier(sql, "silver", silver);
    replace_qualifier(&rewritten, "gold", gold)
}

fn replace_qualifier(sql: &str, base: &str, resolved: &str) -> String {
    if base.eq_ignore_ascii_case(resolved) {
        return sql.to_string();
    }

    let needle = format!("{base}.");
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut i = 0;

    while i < sql.len() {
        let qualifier_at = i + needle.len() <= sql.len()
            && bytes[i..i + needle.len()].eq_ignore_ascii_case(needle.as_bytes())
            && (i == 0 || !is_ident_byte(bytes[i - 1]));

        if qualifier_at {
            out.push_str(resolved);
            out.push('.');
            i += needle.len();
        } else {
            // advance one full character
            let ch = match sql[i..].chars().next() {
                Some(ch) => ch,
                None => break,
            };
            out.push(ch);
            i += ch.len_utf8();
        }
    }

    out
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}
