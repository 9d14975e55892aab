use super::exec;
use crate::{
    Accessor, Assignment, CancelToken, Clause, ErrorKind, Model, Predicate, Query, Record, Result,
    RowsAffected, Scope, SqlRenderer, col,
};

/// Builds and runs an `UPDATE` over the table of `T`.
///
/// The `SET` list starts with the explicit assignments, then every non zero field of the
/// record given to [`Updater::from_record`] that was not assigned already.
pub struct Updater<'a, T: Record> {
    scope: &'a dyn Scope,
    assignments: Vec<Assignment>,
    record: Option<&'a T>,
    filters: Vec<Predicate>,
    cancel: CancelToken,
}

impl<'a, T: Record> Updater<'a, T> {
    pub fn new(scope: &'a dyn Scope) -> Self {
        Self {
            scope,
            assignments: Vec::new(),
            record: None,
            filters: Vec::new(),
            cancel: CancelToken::none(),
        }
    }

    pub fn set(mut self, assignment: Assignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    /// Partial update from a record, fields holding their zero value are skipped.
    pub fn from_record(mut self, record: &'a T) -> Self {
        self.record = Some(record);
        self
    }

    /// Adds a condition, multiple ones are joined with `AND`.
    pub fn where_(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn build(&self) -> Result<Query> {
        let model = self.scope.core().registry().get::<T>()?;
        self.render(&model)
    }

    fn render(&self, model: &Model) -> Result<Query> {
        let mut assignments = self.assignments.clone();
        if let Some(record) = self.record {
            let accessor = Accessor::new(model, record)?;
            for (field, value) in accessor.fetch_all() {
                if value.is_zero()
                    || assignments
                        .iter()
                        .any(|v| v.column.name == field.field_name)
                {
                    continue;
                }
                assignments.push(Assignment {
                    column: col(field.field_name),
                    value: value.into(),
                });
            }
        }
        if assignments.is_empty() {
            return Err(ErrorKind::UpdateNoColumns.into());
        }
        let mut renderer = SqlRenderer::new(model, self.scope.core().dialect());
        renderer.push_str("UPDATE ");
        renderer.write_table(None);
        renderer.push_str(" SET ");
        for (i, assignment) in assignments.iter().enumerate() {
            if i > 0 {
                renderer.push_str(", ");
            }
            renderer.write_column(&assignment.column)?;
            renderer.push_str(" = ");
            renderer.write_expression(&assignment.value, Clause::Set)?;
        }
        renderer.write_condition("WHERE", &self.filters, Clause::Where)?;
        Ok(renderer.finish())
    }

    pub async fn exec(self) -> Result<RowsAffected> {
        let model = self.scope.core().registry().get::<T>()?;
        let query = self.render(&model)?;
        exec(self.scope, query, model, self.cancel).await
    }
}
