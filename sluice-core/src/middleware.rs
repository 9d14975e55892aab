use crate::{CancelToken, Model, Result, RowCursor, RowsAffected, Value, truncate_long};
use futures::future::BoxFuture;
use std::{
    collections::BTreeMap,
    fmt::{self, Debug},
    sync::Arc,
    time::Instant,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// Returns rows.
    Query,
    /// Returns the number of affected rows.
    Exec,
}

/// State shared by the middlewares of one operation.
#[derive(Debug)]
pub struct Context {
    pub statement: String,
    pub args: Vec<Value>,
    pub kind: OpKind,
    pub model: Option<Arc<Model>>,
    pub cancel: CancelToken,
    /// Free form annotations, for example tracing identifiers.
    pub metadata: BTreeMap<String, String>,
}

impl Context {
    pub fn new(kind: OpKind, statement: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            statement: statement.into(),
            args,
            kind,
            model: None,
            cancel: CancelToken::none(),
            metadata: BTreeMap::new(),
        }
    }
    pub fn with_model(mut self, model: Arc<Model>) -> Self {
        self.model = Some(model);
        self
    }
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// What the pipeline produces.
pub enum QueryResult {
    Rows(Box<dyn RowCursor>),
    Affected(RowsAffected),
}

impl Debug for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(rows) => f
                .debug_tuple("Rows")
                .field(&rows.column_names())
                .finish(),
            QueryResult::Affected(v) => f.debug_tuple("Affected").field(v).finish(),
        }
    }
}

pub type Outcome = Result<QueryResult>;

/// Innermost step of the pipeline, it runs the statement.
pub trait Handler: Send + Sync {
    fn call<'a>(&'a self, context: &'a mut Context) -> BoxFuture<'a, Outcome>;
}

/// Interceptor wrapped around the execution of every statement.
///
/// It may rewrite the context before calling [`Next::run`] and inspect the outcome afterwards.
/// Not calling `next` short circuits the rest of the chain, the middleware must then return
/// the complete outcome itself.
pub trait Middleware: Send + Sync {
    fn handle<'a>(&'a self, context: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Outcome>;
}

/// The rest of the chain after the current middleware.
pub struct Next<'a> {
    middlewares: &'a [Arc<dyn Middleware>],
    handler: &'a dyn Handler,
}

impl<'a> Next<'a> {
    pub fn run<'b>(self, context: &'b mut Context) -> BoxFuture<'b, Outcome>
    where
        'a: 'b,
    {
        match self.middlewares.split_first() {
            Some((first, rest)) => first.handle(
                context,
                Next {
                    middlewares: rest,
                    handler: self.handler,
                },
            ),
            None => self.handler.call(context),
        }
    }
}

/// Ordered middlewares, index 0 is the outermost: it sees the context first and the outcome last.
#[derive(Clone, Default)]
pub struct Pipeline {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }
    /// Appends an inner layer.
    pub fn with(mut self, middleware: impl Middleware + 'static) -> Self {
        self.push(Arc::new(middleware));
        self
    }
    pub fn push(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
    /// Runs `context` through every middleware and finally `handler`.
    pub fn run<'a>(&'a self, context: &'a mut Context, handler: &'a dyn Handler) -> BoxFuture<'a, Outcome> {
        Next {
            middlewares: &self.middlewares,
            handler,
        }
        .run(context)
    }
}

impl Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

/// Middleware built from a closure.
pub struct FnMiddleware<F>(F);

/// Wraps a closure into a [`Middleware`].
///
/// ```rust
/// use sluice_core::{Pipeline, from_fn};
/// let pipeline = Pipeline::new().with(from_fn(|context, next| {
///     Box::pin(async move {
///         context.metadata.insert("origin".into(), "docs".into());
///         next.run(context).await
///     })
/// }));
/// assert_eq!(pipeline.len(), 1);
/// ```
pub fn from_fn<F>(f: F) -> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, Outcome> + Send + Sync,
{
    FnMiddleware(f)
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, Outcome> + Send + Sync,
{
    fn handle<'a>(&'a self, context: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        (self.0)(context, next)
    }
}

/// Logs every statement once it completed.
#[derive(Debug, Clone, Copy)]
pub struct LogMiddleware {
    level: log::Level,
}

impl LogMiddleware {
    pub fn new(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LogMiddleware {
    fn default() -> Self {
        Self::new(log::Level::Debug)
    }
}

impl Middleware for LogMiddleware {
    fn handle<'a>(&'a self, context: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let start = Instant::now();
            let outcome = next.run(&mut *context).await;
            let elapsed = start.elapsed();
            match &outcome {
                Ok(..) => log::log!(
                    self.level,
                    "{:?} `{}` args: {:?} ({:?})",
                    context.kind,
                    truncate_long!(context.statement),
                    context.args,
                    elapsed,
                ),
                Err(e) => log::error!(
                    "{:?} `{}` args: {:?} failed after {:?}: {:#}",
                    context.kind,
                    truncate_long!(context.statement),
                    context.args,
                    elapsed,
                    e,
                ),
            }
            outcome
        })
    }
}
