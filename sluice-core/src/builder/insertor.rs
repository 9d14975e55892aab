use super::exec;
use crate::{
    Accessor, CancelToken, Column, ErrorKind, Expression, FieldInfo, Model, Query, Record,
    Result, RowsAffected, Scope, SqlRenderer, Upsert, col,
};

/// Builds and runs an `INSERT` of one or more records.
pub struct Insertor<'a, T: Record> {
    scope: &'a dyn Scope,
    rows: Vec<&'a T>,
    columns: Vec<String>,
    upsert: Option<Upsert>,
    cancel: CancelToken,
}

/// Pending conflict clause, completed by [`OnConflict::update`].
pub struct OnConflict<'a, T: Record> {
    insertor: Insertor<'a, T>,
    targets: Vec<Column>,
}

impl<'a, T: Record> OnConflict<'a, T> {
    /// Each assignment is either [`crate::assign`] or a bare [`crate::col`] that takes the
    /// inserted value.
    pub fn update(mut self, assignments: Vec<Expression>) -> Insertor<'a, T> {
        self.insertor.upsert = Some(Upsert {
            conflict_columns: self.targets,
            assignments,
        });
        self.insertor
    }
}

impl<'a, T: Record> Insertor<'a, T> {
    pub fn new(scope: &'a dyn Scope) -> Self {
        Self {
            scope,
            rows: Vec::new(),
            columns: Vec::new(),
            upsert: None,
            cancel: CancelToken::none(),
        }
    }

    pub fn value(mut self, row: &'a T) -> Self {
        self.rows.push(row);
        self
    }

    pub fn values(mut self, rows: impl IntoIterator<Item = &'a T>) -> Self {
        self.rows.extend(rows);
        self
    }

    /// Restricts the insert to these fields, by Rust name.
    pub fn columns<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.columns = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Conflict on the given fields, the target is ignored by dialects that infer it.
    pub fn on_conflict<S: Into<String>>(
        self,
        targets: impl IntoIterator<Item = S>,
    ) -> OnConflict<'a, T> {
        OnConflict {
            insertor: self,
            targets: targets.into_iter().map(col).collect(),
        }
    }

    /// Conflict on any unique key.
    pub fn on_duplicate_key(self) -> OnConflict<'a, T> {
        OnConflict {
            insertor: self,
            targets: Vec::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn build(&self) -> Result<Query> {
        if self.rows.is_empty() {
            return Err(ErrorKind::InsertNoValues.into());
        }
        let model = self.scope.core().registry().get::<T>()?;
        self.render(&model)
    }

    fn render(&self, model: &Model) -> Result<Query> {
        let mut fields: Vec<&FieldInfo> = Vec::with_capacity(self.columns.len());
        for name in &self.columns {
            let field = model
                .field(name)
                .ok_or_else(|| ErrorKind::UnknownField(name.clone()))?;
            fields.push(field);
        }
        if fields.is_empty() {
            fields.extend(model.fields());
        }
        let mut renderer = SqlRenderer::new(model, self.scope.core().dialect());
        renderer.push_str("INSERT INTO ");
        renderer.write_table(None);
        renderer.push_str(" (");
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                renderer.push_str(", ");
            }
            renderer.write_identifier(&field.column_name);
        }
        renderer.push_str(") VALUES ");
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                renderer.push_str(", ");
            }
            let accessor = Accessor::new(model, *row)?;
            renderer.push('(');
            for (j, field) in fields.iter().enumerate() {
                if j > 0 {
                    renderer.push_str(", ");
                }
                renderer.write_arg(accessor.fetch_field(field)?);
            }
            renderer.push(')');
        }
        if let Some(upsert) = &self.upsert {
            self.scope
                .core()
                .dialect()
                .write_upsert(&mut renderer, upsert)?;
        }
        Ok(renderer.finish())
    }

    pub async fn exec(self) -> Result<RowsAffected> {
        if self.rows.is_empty() {
            return Err(ErrorKind::InsertNoValues.into());
        }
        let model = self.scope.core().registry().get::<T>()?;
        let query = self.render(&model)?;
        exec(self.scope, query, model, self.cancel).await
    }
}
