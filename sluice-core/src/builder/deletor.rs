use super::exec;
use crate::{
    CancelToken, Clause, Model, Predicate, Query, Record, Result, RowsAffected, Scope,
    SqlRenderer,
};
use std::marker::PhantomData;

/// Builds and runs a `DELETE` over the table of `T`.
pub struct Deletor<'a, T: Record> {
    scope: &'a dyn Scope,
    table: Option<String>,
    filters: Vec<Predicate>,
    cancel: CancelToken,
    _record: PhantomData<fn() -> T>,
}

impl<'a, T: Record> Deletor<'a, T> {
    pub fn new(scope: &'a dyn Scope) -> Self {
        Self {
            scope,
            table: None,
            filters: Vec::new(),
            cancel: CancelToken::none(),
            _record: PhantomData,
        }
    }

    /// Deletes from `table`, written as is.
    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

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
        let mut renderer = SqlRenderer::new(model, self.scope.core().dialect());
        renderer.push_str("DELETE FROM ");
        renderer.write_table(self.table.as_deref());
        renderer.write_condition("WHERE", &self.filters, Clause::Where)?;
        Ok(renderer.finish())
    }

    pub async fn exec(self) -> Result<RowsAffected> {
        let model = self.scope.core().registry().get::<T>()?;
        let query = self.render(&model)?;
        exec(self.scope, query, model, self.cancel).await
    }
}
