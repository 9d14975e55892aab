mod deletor;
mod insertor;
mod selector;
mod updater;

pub use deletor::*;
pub use insertor::*;
pub use selector::*;
pub use updater::*;

use crate::{
    CancelToken, Context, Error, Model, OpKind, Outcome, Query, QueryResult, Result, RowsAffected,
    Scope, dispatch,
};
use std::sync::Arc;

async fn run(
    scope: &dyn Scope,
    kind: OpKind,
    query: Query,
    model: Arc<Model>,
    cancel: CancelToken,
) -> Outcome {
    log::debug!("Running {}", query);
    let mut context = Context::new(kind, query.sql, query.args)
        .with_model(model)
        .with_cancel(cancel);
    dispatch(scope, &mut context).await
}

async fn exec(
    scope: &dyn Scope,
    query: Query,
    model: Arc<Model>,
    cancel: CancelToken,
) -> Result<RowsAffected> {
    match run(scope, OpKind::Exec, query, model, cancel).await? {
        QueryResult::Affected(affected) => Ok(affected),
        QueryResult::Rows(mut rows) => {
            rows.close();
            Err(Error::msg("Expected the number of affected rows, got rows instead"))
        }
    }
}
