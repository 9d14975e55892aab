use crate::{
    CancelToken, Context, Dialect, Error, Handler, Middleware, OpKind, Outcome, Pipeline,
    QueryResult, Registry, Result, RowCursor, RowsAffected, Session, StandardSql,
    TransactionSession, TransactionalSession, Value, dialect_for_url,
};
use futures::future::{self, BoxFuture, FutureExt};
use std::sync::Arc;

/// Registry, dialect and middlewares shared by a database and its transactions.
#[derive(Debug, Clone)]
pub struct Core {
    registry: Arc<Registry>,
    dialect: Arc<dyn Dialect>,
    pipeline: Pipeline,
}

impl Core {
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

/// Where builders run: a database or a transaction.
pub trait Scope: Send + Sync {
    fn core(&self) -> &Core;
    fn session(&self) -> &dyn Session;
}

/// Runs `context` through the middlewares of `scope` and then its session.
pub async fn dispatch(scope: &dyn Scope, context: &mut Context) -> Outcome {
    let handler = SessionHandler(scope.session());
    scope.core().pipeline().run(context, &handler).await
}

struct SessionHandler<'s>(&'s dyn Session);

impl Handler for SessionHandler<'_> {
    fn call<'a>(&'a self, context: &'a mut Context) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            match context.kind {
                OpKind::Query => self
                    .0
                    .query(&context.cancel, &context.statement, &context.args)
                    .await
                    .map(QueryResult::Rows),
                OpKind::Exec => self
                    .0
                    .exec(&context.cancel, &context.statement, &context.args)
                    .await
                    .map(QueryResult::Affected),
            }
        })
    }
}

/// Database handle: a session plus the fixed configuration used to compile statements.
#[derive(Debug)]
pub struct Database<S: Session> {
    core: Core,
    session: S,
}

impl<S: Session> Database<S> {
    /// Standard dialect, no middlewares.
    pub fn new(session: S) -> Self {
        Self::builder(session).build()
    }
    pub fn builder(session: S) -> DatabaseBuilder<S> {
        DatabaseBuilder {
            session,
            dialect: None,
            pipeline: Pipeline::new(),
            registry: None,
        }
    }
    pub fn session(&self) -> &S {
        &self.session
    }
}

impl<S: Session> Scope for Database<S> {
    fn core(&self) -> &Core {
        &self.core
    }
    fn session(&self) -> &dyn Session {
        &self.session
    }
}

impl<S: TransactionalSession> Database<S> {
    /// Opens a transaction sharing the configuration of this database.
    pub async fn begin(&self) -> Result<Transaction<'_, S::Transaction>> {
        let session = self.session.begin().await?;
        log::debug!("Transaction started");
        Ok(Transaction {
            core: &self.core,
            session: Some(session),
        })
    }
}

pub struct DatabaseBuilder<S: Session> {
    session: S,
    dialect: Option<Arc<dyn Dialect>>,
    pipeline: Pipeline,
    registry: Option<Arc<Registry>>,
}

impl<S: Session> DatabaseBuilder<S> {
    pub fn dialect(mut self, dialect: impl Dialect + 'static) -> Self {
        self.dialect = Some(Arc::new(dialect));
        self
    }
    /// Picks the dialect from the scheme of a connection url.
    pub fn dialect_from_url(mut self, url: &str) -> Result<Self> {
        self.dialect = Some(dialect_for_url(url)?);
        Ok(self)
    }
    /// Appends a middleware, the first one added is the outermost.
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.pipeline = self.pipeline.with(middleware);
        self
    }
    /// Shares an existing registry instead of creating a new one.
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }
    pub fn build(self) -> Database<S> {
        let dialect = self
            .dialect
            .unwrap_or_else(|| Arc::new(StandardSql) as Arc<dyn Dialect>);
        log::debug!("Database configured with the {} dialect", dialect.name());
        Database {
            core: Core {
                registry: self.registry.unwrap_or_default(),
                dialect,
                pipeline: self.pipeline,
            },
            session: self.session,
        }
    }
}

/// Open transaction, builders accept it like a [`Database`].
///
/// Once committed or rolled back every further statement fails.
pub struct Transaction<'db, T: TransactionSession> {
    core: &'db Core,
    session: Option<T>,
}

impl<T: TransactionSession> Transaction<'_, T> {
    pub async fn commit(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Err(Error::msg("The transaction is already finished"));
        };
        session.commit().await?;
        log::debug!("Transaction committed");
        Ok(())
    }
    pub async fn rollback(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Err(Error::msg("The transaction is already finished"));
        };
        session.rollback().await?;
        log::debug!("Transaction rolled back");
        Ok(())
    }
    /// Rolls back unless already committed or rolled back.
    pub async fn rollback_unless_committed(mut self) -> Result<()> {
        if self.session.is_none() {
            return Ok(());
        }
        self.rollback().await
    }
    pub fn is_finished(&self) -> bool {
        self.session.is_none()
    }
}

impl<T: TransactionSession> Scope for Transaction<'_, T> {
    fn core(&self) -> &Core {
        self.core
    }
    fn session(&self) -> &dyn Session {
        match &self.session {
            Some(session) => session,
            None => &FinishedTransaction,
        }
    }
}

struct FinishedTransaction;

impl Session for FinishedTransaction {
    fn query<'s>(
        &'s self,
        _cancel: &'s CancelToken,
        _statement: &'s str,
        _args: &'s [Value],
    ) -> BoxFuture<'s, Result<Box<dyn RowCursor>>> {
        future::ready(Err(Error::msg("The transaction is already finished"))).boxed()
    }
    fn exec<'s>(
        &'s self,
        _cancel: &'s CancelToken,
        _statement: &'s str,
        _args: &'s [Value],
    ) -> BoxFuture<'s, Result<RowsAffected>> {
        future::ready(Err(Error::msg("The transaction is already finished"))).boxed()
    }
}
