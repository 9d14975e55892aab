use crate::{Column, ErrorKind, Expression, Result, SqlRenderer};
use std::{fmt::Debug, sync::Arc};
use url::Url;

/// Conflict handling requested by an insert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Upsert {
    /// Conflict target, ignored by dialects that infer it.
    pub conflict_columns: Vec<Column>,
    /// Each one is either an [`crate::Assignment`] or a bare [`Column`] meaning "take the
    /// inserted value".
    pub assignments: Vec<Expression>,
}

/// SQL engine family: identifier quoting, placeholders and upsert syntax.
pub trait Dialect: Send + Sync + Debug {
    fn name(&self) -> &'static str;
    fn quote_char(&self) -> char;
    /// Writes the placeholder of the `index`-th argument, starting from 1.
    fn write_placeholder(&self, out: &mut String, index: usize);
    /// Appends the upsert clause to an insert rendered so far.
    fn write_upsert(&self, renderer: &mut SqlRenderer<'_>, upsert: &Upsert) -> Result<()>;
}

/// Writes `value` between `quote`, doubling any inner occurrence.
pub fn write_identifier_quoted(out: &mut String, value: &str, quote: char) {
    out.push(quote);
    for c in value.chars() {
        if c == quote {
            out.push(quote);
        }
        out.push(c);
    }
    out.push(quote);
}

/// Plain SQL: double quoted identifiers, `?` placeholders and no upsert.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardSql;

impl Dialect for StandardSql {
    fn name(&self) -> &'static str {
        "standard"
    }
    fn quote_char(&self) -> char {
        '"'
    }
    fn write_placeholder(&self, out: &mut String, _index: usize) {
        out.push('?');
    }
    fn write_upsert(&self, _renderer: &mut SqlRenderer<'_>, _upsert: &Upsert) -> Result<()> {
        Err(ErrorKind::Unsupported(format!("{} (upsert)", self.name())).into())
    }
}

/// MySQL and MariaDB: backtick quoting and `ON DUPLICATE KEY UPDATE`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySql {
    fallback: StandardSql,
}

impl MySql {
    pub const fn new() -> Self {
        Self {
            fallback: StandardSql,
        }
    }
}

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }
    fn quote_char(&self) -> char {
        '`'
    }
    fn write_placeholder(&self, out: &mut String, index: usize) {
        self.fallback.write_placeholder(out, index);
    }
    fn write_upsert(&self, renderer: &mut SqlRenderer<'_>, upsert: &Upsert) -> Result<()> {
        renderer.push_str(" ON DUPLICATE KEY UPDATE ");
        write_assignments(renderer, upsert, |renderer, column| {
            renderer.push_str("VALUES(");
            renderer.write_column(column)?;
            renderer.push(')');
            Ok(())
        })
    }
}

/// SQLite: `ON CONFLICT(...) DO UPDATE SET`, `excluded` refers to the inserted row.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sqlite {
    fallback: StandardSql,
}

impl Sqlite {
    pub const fn new() -> Self {
        Self {
            fallback: StandardSql,
        }
    }
}

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }
    fn quote_char(&self) -> char {
        self.fallback.quote_char()
    }
    fn write_placeholder(&self, out: &mut String, index: usize) {
        self.fallback.write_placeholder(out, index);
    }
    fn write_upsert(&self, renderer: &mut SqlRenderer<'_>, upsert: &Upsert) -> Result<()> {
        write_conflict_target_upsert(renderer, upsert)
    }
}

/// PostgreSQL: same upsert as SQLite, numbered `$n` placeholders.
#[derive(Debug, Default, Clone, Copy)]
pub struct Postgres {
    fallback: StandardSql,
}

impl Postgres {
    pub const fn new() -> Self {
        Self {
            fallback: StandardSql,
        }
    }
}

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }
    fn quote_char(&self) -> char {
        self.fallback.quote_char()
    }
    fn write_placeholder(&self, out: &mut String, index: usize) {
        out.push('$');
        out.push_str(&index.to_string());
    }
    fn write_upsert(&self, renderer: &mut SqlRenderer<'_>, upsert: &Upsert) -> Result<()> {
        write_conflict_target_upsert(renderer, upsert)
    }
}

fn write_conflict_target_upsert(renderer: &mut SqlRenderer<'_>, upsert: &Upsert) -> Result<()> {
    if upsert.conflict_columns.is_empty() {
        return Err(ErrorKind::InvalidArguments(format!(
            "Upsert on {} requires at least one conflict column",
            renderer.dialect().name()
        ))
        .into());
    }
    renderer.push_str(" ON CONFLICT(");
    for (i, column) in upsert.conflict_columns.iter().enumerate() {
        if i > 0 {
            renderer.push_str(", ");
        }
        renderer.write_column(column)?;
    }
    renderer.push_str(") DO UPDATE SET ");
    write_assignments(renderer, upsert, |renderer, column| {
        renderer.push_str("excluded.");
        renderer.write_column(column)
    })
}

/// Writes `col = ?` for assignments and `col = <inserted>` for bare columns.
fn write_assignments(
    renderer: &mut SqlRenderer<'_>,
    upsert: &Upsert,
    mut inserted: impl FnMut(&mut SqlRenderer<'_>, &Column) -> Result<()>,
) -> Result<()> {
    for (i, assignment) in upsert.assignments.iter().enumerate() {
        if i > 0 {
            renderer.push_str(", ");
        }
        match assignment {
            Expression::Assignment(assignment) => {
                renderer.write_column(&assignment.column)?;
                renderer.push_str(" = ");
                renderer.write_expression(&assignment.value, crate::Clause::Upsert)?;
            }
            Expression::Column(column) => {
                renderer.write_column(column)?;
                renderer.push_str(" = ");
                inserted(renderer, column)?;
            }
            other => {
                return Err(ErrorKind::UnsupportedType(format!(
                    "{other:?} cannot be used as an upsert assignment"
                ))
                .into());
            }
        }
    }
    Ok(())
}

/// Dialect matching the scheme of a connection url.
pub fn dialect_for_url(url: &str) -> Result<Arc<dyn Dialect>> {
    let parsed = Url::parse(url).map_err(|e| {
        ErrorKind::InvalidArguments(format!("Cannot parse connection url `{url}`: {e}"))
    })?;
    Ok(match parsed.scheme() {
        "mysql" | "mariadb" => Arc::new(MySql::new()),
        "sqlite" => Arc::new(Sqlite::new()),
        "postgres" | "postgresql" => Arc::new(Postgres::new()),
        scheme => {
            return Err(ErrorKind::InvalidArguments(format!(
                "No dialect is known for the `{scheme}` scheme"
            ))
            .into());
        }
    })
}
