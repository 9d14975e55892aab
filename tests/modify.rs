#[cfg(test)]
mod tests {
    use sluice::{
        Database, Deletor, ErrorKind, Insertor, MySql, Postgres, Record, RowsAffected, Sqlite,
        Updater, Value, assign, col,
    };
    use sluice_tests::{CallKind, MockSession, init_logs};

    #[derive(Debug, Default, Clone, PartialEq, Record)]
    struct TestModel {
        id: i64,
        name: String,
        age: i32,
        address: Option<String>,
    }

    fn wang() -> TestModel {
        TestModel {
            id: 1,
            name: "wang".into(),
            age: 18,
            address: Some("beijing".into()),
        }
    }

    #[tokio::test]
    async fn insert_with_upsert() {
        init_logs();
        let session = MockSession::new();
        session.expect_affected(1, Some(1)).await;
        let db = Database::builder(session.clone())
            .dialect(MySql::new())
            .build();
        let row = wang();
        let affected = Insertor::new(&db)
            .value(&row)
            .columns(["id", "name", "address"])
            .on_conflict(["id"])
            .update(vec![assign("name", "shi").into()])
            .exec()
            .await
            .unwrap();
        assert_eq!(
            affected,
            RowsAffected {
                rows_affected: 1,
                last_affected_id: Some(1),
            }
        );
        let calls = session.calls().await;
        assert_eq!(calls[0].kind, CallKind::Exec);
        assert_eq!(
            calls[0].statement,
            "INSERT INTO `test_model` (`id`, `name`, `address`) VALUES (?, ?, ?) ON DUPLICATE KEY UPDATE `name` = ?;"
        );
        assert_eq!(
            calls[0].args,
            vec![
                Value::from(1i64),
                Value::from("wang"),
                Value::from("beijing"),
                Value::from("shi"),
            ]
        );
    }

    #[tokio::test]
    async fn insert_many_with_excluded() {
        let session = MockSession::new();
        session.expect_affected(2, None).await;
        let db = Database::builder(session.clone())
            .dialect(Sqlite::new())
            .build();
        let rows = [wang(), TestModel::default()];
        Insertor::new(&db)
            .values(&rows)
            .on_conflict(["id"])
            .update(vec![col("name").into(), assign("age", 0).into()])
            .exec()
            .await
            .unwrap();
        let calls = session.calls().await;
        assert_eq!(
            calls[0].statement,
            "INSERT INTO \"test_model\" (\"id\", \"name\", \"age\", \"address\") VALUES (?, ?, ?, ?), (?, ?, ?, ?) ON CONFLICT(\"id\") DO UPDATE SET \"name\" = excluded.\"name\", \"age\" = ?;"
        );
        assert_eq!(calls[0].args.len(), 9);
        assert_eq!(calls[0].args[7], Value::Varchar(None));
        assert_eq!(calls[0].args[8], Value::from(0));
    }

    #[tokio::test]
    async fn insert_nothing() {
        let session = MockSession::new();
        let db = Database::new(session.clone());
        let error = Insertor::<TestModel>::new(&db).exec().await.unwrap_err();
        assert_eq!(ErrorKind::of(&error), Some(&ErrorKind::InsertNoValues));
        let row = wang();
        let error = Insertor::new(&db)
            .value(&row)
            .on_duplicate_key()
            .update(vec![col("name").into()])
            .exec()
            .await
            .unwrap_err();
        assert!(matches!(
            ErrorKind::of(&error),
            Some(ErrorKind::Unsupported(..))
        ));
        assert!(session.calls().await.is_empty());
    }

    #[tokio::test]
    async fn update_and_delete() {
        let session = MockSession::new();
        session.expect_affected(1, None).await;
        session.expect_affected(3, None).await;
        let db = Database::builder(session.clone())
            .dialect(Postgres::new())
            .build();
        let changes = TestModel {
            age: 19,
            address: Some("shanghai".into()),
            ..Default::default()
        };
        let affected = Updater::new(&db)
            .from_record(&changes)
            .where_(col("id").eq(1i64))
            .exec()
            .await
            .unwrap();
        assert_eq!(affected.rows_affected, 1);
        let affected = Deletor::<TestModel>::new(&db)
            .where_(col("age").lt(18))
            .exec()
            .await
            .unwrap();
        assert_eq!(affected.rows_affected, 3);
        assert_eq!(
            session.statements().await,
            [
                "UPDATE \"test_model\" SET \"age\" = $1, \"address\" = $2 WHERE \"id\" = $3;",
                "DELETE FROM \"test_model\" WHERE \"age\" < $1;",
            ]
        );
        let calls = session.calls().await;
        assert_eq!(
            calls[0].args,
            vec![Value::from(19), Value::from("shanghai"), Value::from(1i64)]
        );
    }

    #[tokio::test]
    async fn update_nothing() {
        let session = MockSession::new();
        let db = Database::new(session.clone());
        let empty = TestModel::default();
        let error = Updater::new(&db)
            .from_record(&empty)
            .exec()
            .await
            .unwrap_err();
        assert_eq!(ErrorKind::of(&error), Some(&ErrorKind::UpdateNoColumns));
        assert_eq!(session.pending().await, 0);
        assert!(session.calls().await.is_empty());
    }

    #[tokio::test]
    async fn exec_expects_affected_rows() {
        let session = MockSession::new();
        session.expect_error("deadlock detected").await;
        let db = Database::new(session.clone());
        let error = Deletor::<TestModel>::new(&db).exec().await.unwrap_err();
        assert_eq!(error.to_string(), "deadlock detected");
        assert_eq!(session.statements().await, ["DELETE FROM \"test_model\";"]);
    }
}
