#[cfg(test)]
mod tests {
    use sluice::{
        CancelToken, Context, Database, Deletor, ErrorKind, LogMiddleware, Middleware, MySql,
        Next, OpKind, Outcome, QueryResult, Record, RowSet, Scope, Selector, Value, col, from_fn,
        future::BoxFuture,
    };
    use sluice_tests::{MockSession, init_logs};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default, Clone, PartialEq, Record)]
    struct TestModel {
        id: i64,
        name: String,
    }

    /// Appends `name:before` and `name:after` around the rest of the chain.
    struct Trace {
        name: &'static str,
        events: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Trace {
        fn handle<'a>(&'a self, context: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Outcome> {
            Box::pin(async move {
                self.events
                    .lock()
                    .unwrap()
                    .push(format!("{}:before", self.name));
                context
                    .metadata
                    .insert(self.name.into(), context.statement.clone());
                let outcome = next.run(&mut *context).await;
                self.events
                    .lock()
                    .unwrap()
                    .push(format!("{}:after", self.name));
                outcome
            })
        }
    }

    #[tokio::test]
    async fn index_zero_is_outermost() {
        init_logs();
        let events = Arc::new(Mutex::new(Vec::new()));
        let session = MockSession::new();
        session.expect_affected(0, None).await;
        let db = Database::builder(session.clone())
            .dialect(MySql::new())
            .middleware(Trace {
                name: "outer",
                events: events.clone(),
            })
            .middleware(LogMiddleware::default())
            .middleware(Trace {
                name: "inner",
                events: events.clone(),
            })
            .build();
        assert_eq!(db.core().pipeline().len(), 3);
        Deletor::<TestModel>::new(&db).exec().await.unwrap();
        assert_eq!(
            *events.lock().unwrap(),
            ["outer:before", "inner:before", "inner:after", "outer:after"]
        );
    }

    #[tokio::test]
    async fn rewrite_before_forwarding() {
        let session = MockSession::new();
        session.expect_rows(RowSet::new(vec!["id".to_string()])).await;
        let db = Database::builder(session.clone())
            .dialect(MySql::new())
            .middleware(from_fn(|context, next| {
                Box::pin(async move {
                    assert_eq!(context.kind, OpKind::Query);
                    assert_eq!(context.model.as_ref().unwrap().table_name(), "test_model");
                    context.statement = format!("/* tagged */ {}", context.statement);
                    next.run(context).await
                })
            }))
            .build();
        let rows = Selector::<TestModel>::new(&db)
            .where_(col("id").eq(5i64))
            .get_multi()
            .await
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(
            session.statements().await,
            ["/* tagged */ SELECT * FROM `test_model` WHERE `id` = ?;"]
        );
    }

    #[tokio::test]
    async fn short_circuit_with_synthesized_rows() {
        let session = MockSession::new();
        let db = Database::builder(session.clone())
            .middleware(from_fn(|context, _next| {
                Box::pin(async move {
                    let rows = RowSet::new(vec!["id".to_string(), "name".to_string()])
                        .with_row(vec![Value::from(9i64), Value::from("cached")])?;
                    context.metadata.insert("cache".into(), "hit".into());
                    Ok(QueryResult::Rows(Box::new(rows)))
                })
            }))
            .build();
        let record = Selector::<TestModel>::new(&db).get().await.unwrap();
        assert_eq!(
            record,
            TestModel {
                id: 9,
                name: "cached".into(),
            }
        );
        assert!(session.calls().await.is_empty());
    }

    #[tokio::test]
    async fn errors_pass_through_unchanged() {
        let session = MockSession::new();
        session.expect_error("boom").await;
        let seen = Arc::new(Mutex::new(None));
        let captured = seen.clone();
        let db = Database::builder(session.clone())
            .middleware(LogMiddleware::new(log::Level::Info))
            .middleware(from_fn(move |context, next| {
                let captured = captured.clone();
                Box::pin(async move {
                    let outcome = next.run(context).await;
                    *captured.lock().unwrap() = outcome.as_ref().err().map(|e| e.to_string());
                    outcome
                })
            }))
            .build();
        let error = Deletor::<TestModel>::new(&db).exec().await.unwrap_err();
        assert_eq!(error.to_string(), "boom");
        assert!(ErrorKind::of(&error).is_none());
        assert_eq!(seen.lock().unwrap().as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn cancellation_reaches_the_session() {
        let session = MockSession::new();
        session.expect_affected(1, None).await;
        let db = Database::new(session.clone());
        let (handle, token) = CancelToken::channel();
        handle.cancel();
        let error = Deletor::<TestModel>::new(&db)
            .with_cancel(token)
            .exec()
            .await
            .unwrap_err();
        assert!(error.to_string().starts_with("Cancelled"));
        assert_eq!(session.pending().await, 1);
    }
}
