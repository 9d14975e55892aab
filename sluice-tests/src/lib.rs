use futures::future::{BoxFuture, FutureExt};
use log::LevelFilter;
use sluice_core::{
    CancelToken, Error, Result, RowCursor, RowSet, RowsAffected, Session, TransactionSession,
    TransactionalSession, Value,
};
use std::{collections::VecDeque, env, sync::Arc};
use tokio::sync::Mutex;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Query,
    Exec,
    Begin,
    Commit,
    Rollback,
}

/// One interaction with a [`MockSession`] or with one of its transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub kind: CallKind,
    pub statement: String,
    pub args: Vec<Value>,
}

/// What the next query or exec returns.
#[derive(Debug, Clone)]
pub enum Scripted {
    Rows(RowSet),
    Affected(RowsAffected),
    Error(String),
}

#[derive(Debug, Default)]
struct State {
    script: VecDeque<Scripted>,
    calls: Vec<Call>,
}

/// In memory session replaying scripted results in order and recording every call.
///
/// Clones share the same script and call log, so a test can keep one while the database owns
/// the other.
#[derive(Debug, Default, Clone)]
pub struct MockSession {
    state: Arc<Mutex<State>>,
}

impl MockSession {
    pub fn new() -> Self {
        Default::default()
    }

    pub async fn expect(&self, result: Scripted) -> &Self {
        self.state.lock().await.script.push_back(result);
        self
    }

    pub async fn expect_rows(&self, rows: RowSet) -> &Self {
        self.expect(Scripted::Rows(rows)).await
    }

    pub async fn expect_affected(&self, rows_affected: u64, last_affected_id: Option<i64>) -> &Self {
        self.expect(Scripted::Affected(RowsAffected {
            rows_affected,
            last_affected_id,
        }))
        .await
    }

    pub async fn expect_error(&self, message: impl Into<String>) -> &Self {
        self.expect(Scripted::Error(message.into())).await
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.state.lock().await.calls.clone()
    }

    /// Statements received so far, transaction markers included.
    pub async fn statements(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .map(|v| v.statement.clone())
            .collect()
    }

    /// Scripted results not consumed yet.
    pub async fn pending(&self) -> usize {
        self.state.lock().await.script.len()
    }
}

async fn record(state: &Mutex<State>, kind: CallKind, statement: &str, args: &[Value]) {
    state.lock().await.calls.push(Call {
        kind,
        statement: statement.into(),
        args: args.to_vec(),
    });
}

async fn replay(
    state: &Mutex<State>,
    cancel: &CancelToken,
    kind: CallKind,
    statement: &str,
    args: &[Value],
) -> Result<Scripted> {
    if cancel.is_cancelled() {
        return Err(Error::msg(format!("Cancelled before running `{statement}`")));
    }
    record(state, kind, statement, args).await;
    let next = state.lock().await.script.pop_front();
    match next {
        Some(Scripted::Error(message)) => Err(Error::msg(message)),
        Some(v) => Ok(v),
        None => Err(Error::msg(format!(
            "No scripted result left for `{statement}`"
        ))),
    }
}

async fn query(
    state: &Mutex<State>,
    cancel: &CancelToken,
    statement: &str,
    args: &[Value],
) -> Result<Box<dyn RowCursor>> {
    match replay(state, cancel, CallKind::Query, statement, args).await? {
        Scripted::Rows(rows) => Ok(Box::new(rows)),
        other => Err(Error::msg(format!(
            "Query `{statement}` expected rows but the script has {other:?}"
        ))),
    }
}

async fn exec(
    state: &Mutex<State>,
    cancel: &CancelToken,
    statement: &str,
    args: &[Value],
) -> Result<RowsAffected> {
    match replay(state, cancel, CallKind::Exec, statement, args).await? {
        Scripted::Affected(affected) => Ok(affected),
        other => Err(Error::msg(format!(
            "Exec `{statement}` expected affected rows but the script has {other:?}"
        ))),
    }
}

impl Session for MockSession {
    fn query<'s>(
        &'s self,
        cancel: &'s CancelToken,
        statement: &'s str,
        args: &'s [Value],
    ) -> BoxFuture<'s, Result<Box<dyn RowCursor>>> {
        query(&self.state, cancel, statement, args).boxed()
    }

    fn exec<'s>(
        &'s self,
        cancel: &'s CancelToken,
        statement: &'s str,
        args: &'s [Value],
    ) -> BoxFuture<'s, Result<RowsAffected>> {
        exec(&self.state, cancel, statement, args).boxed()
    }
}

impl TransactionalSession for MockSession {
    type Transaction = MockTransaction;

    fn begin(&self) -> BoxFuture<'_, Result<MockTransaction>> {
        async move {
            record(&self.state, CallKind::Begin, "BEGIN", &[]).await;
            Ok(MockTransaction {
                state: self.state.clone(),
            })
        }
        .boxed()
    }
}

/// Transaction of a [`MockSession`], shares its script and call log.
#[derive(Debug)]
pub struct MockTransaction {
    state: Arc<Mutex<State>>,
}

impl Session for MockTransaction {
    fn query<'s>(
        &'s self,
        cancel: &'s CancelToken,
        statement: &'s str,
        args: &'s [Value],
    ) -> BoxFuture<'s, Result<Box<dyn RowCursor>>> {
        query(&self.state, cancel, statement, args).boxed()
    }

    fn exec<'s>(
        &'s self,
        cancel: &'s CancelToken,
        statement: &'s str,
        args: &'s [Value],
    ) -> BoxFuture<'s, Result<RowsAffected>> {
        exec(&self.state, cancel, statement, args).boxed()
    }
}

impl TransactionSession for MockTransaction {
    fn commit(self) -> BoxFuture<'static, Result<()>> {
        async move {
            record(&self.state, CallKind::Commit, "COMMIT", &[]).await;
            Ok(())
        }
        .boxed()
    }

    fn rollback(self) -> BoxFuture<'static, Result<()>> {
        async move {
            record(&self.state, CallKind::Rollback, "ROLLBACK", &[]).await;
            Ok(())
        }
        .boxed()
    }
}
