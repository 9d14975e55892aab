use super::run;
use crate::{
    AccessorMut, CancelToken, Clause, Error, ErrorContext, ErrorKind, Expression, Model, OpKind,
    OrderBy, Predicate, Query, QueryResult, Record, Result, RowCursor, Scope, Selectable,
    SqlRenderer, Value,
};
use std::{marker::PhantomData, sync::Arc};

/// Builds and runs a `SELECT` over the table of `T`.
pub struct Selector<'a, T: Record> {
    scope: &'a dyn Scope,
    table: Option<String>,
    columns: Vec<Selectable>,
    filters: Vec<Predicate>,
    group_by: Vec<Expression>,
    having: Vec<Predicate>,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
    cancel: CancelToken,
    _record: PhantomData<fn() -> T>,
}

impl<'a, T: Record> Selector<'a, T> {
    pub fn new(scope: &'a dyn Scope) -> Self {
        Self {
            scope,
            table: None,
            columns: Vec::new(),
            filters: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            cancel: CancelToken::none(),
            _record: PhantomData,
        }
    }

    /// Adds a column, aggregate or raw fragment to the select list.
    pub fn select(mut self, column: impl Into<Selectable>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Reads from `table`, written as is.
    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Adds a condition, multiple ones are joined with `AND`.
    pub fn where_(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn group_by(mut self, expression: impl Into<Expression>) -> Self {
        self.group_by.push(expression.into());
        self
    }

    pub fn having(mut self, predicate: Predicate) -> Self {
        self.having.push(predicate);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
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
        renderer.push_str("SELECT ");
        renderer.write_select_list(&self.columns)?;
        renderer.push_str(" FROM ");
        renderer.write_table(self.table.as_deref());
        renderer.write_condition("WHERE", &self.filters, Clause::Where)?;
        renderer.write_group_by(&self.group_by)?;
        renderer.write_condition("HAVING", &self.having, Clause::Having)?;
        renderer.write_order_by(&self.order_by)?;
        if let Some(limit) = self.limit.filter(|v| *v > 0) {
            renderer.push_str(" LIMIT ");
            renderer.write_arg(Value::from(limit));
        }
        if let Some(offset) = self.offset.filter(|v| *v > 0) {
            renderer.push_str(" OFFSET ");
            renderer.write_arg(Value::from(offset));
        }
        Ok(renderer.finish())
    }

    async fn fetch(&self) -> Result<(Arc<Model>, Box<dyn RowCursor>)> {
        let model = self.scope.core().registry().get::<T>()?;
        let query = self.render(&model)?;
        match run(
            self.scope,
            OpKind::Query,
            query,
            model.clone(),
            self.cancel.clone(),
        )
        .await?
        {
            QueryResult::Rows(rows) => Ok((model, rows)),
            QueryResult::Affected(..) => Err(Error::msg(
                "Expected rows from a select, got the number of affected rows instead",
            )),
        }
    }

    /// The first row, fails with [`ErrorKind::NoRecord`] when there is none.
    pub async fn get(self) -> Result<T>
    where
        T: Default,
    {
        let (model, mut rows) = self.fetch().await?;
        let result: Result<T> = async {
            if !rows.advance().await? {
                return Err(ErrorKind::NoRecord.into());
            }
            materialize::<T>(&model, rows.as_mut())
        }
        .await;
        rows.close();
        result
    }

    /// Every row, possibly none.
    pub async fn get_multi(self) -> Result<Vec<T>>
    where
        T: Default,
    {
        let (model, mut rows) = self.fetch().await?;
        let result: Result<Vec<T>> = async {
            let mut records = Vec::new();
            while rows.advance().await? {
                records.push(materialize::<T>(&model, rows.as_mut())?);
            }
            Ok(records)
        }
        .await;
        rows.close();
        result
    }
}

fn materialize<T: Record + Default>(model: &Model, rows: &mut dyn RowCursor) -> Result<T> {
    let mut record = T::default();
    AccessorMut::new(model, &mut record)?
        .materialize(rows)
        .with_context(|| format!("While decoding a row into `{}`", model.type_name()))?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::Selector;
    use crate::{
        ErrorKind, Value, asc, avg, builder::tests::mysql, col, count_all, desc, max, min, not,
        raw, registry::tests::TestModel, sum,
    };

    #[test]
    fn select_all() {
        let db = mysql();
        let query = Selector::<TestModel>::new(&db).build().unwrap();
        assert_eq!(query.sql, "SELECT * FROM `test_model`;");
        assert!(query.args.is_empty());
    }

    #[test]
    fn where_folds_with_and() {
        let db = mysql();
        let query = Selector::<TestModel>::new(&db)
            .where_(col("Age").eq(111).and(col("Name").eq("hha")))
            .build()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT * FROM `test_model` WHERE (`age` = ?) AND (`name` = ?);"
        );
        assert_eq!(query.args, vec![Value::from(111), Value::from("hha")]);

        let query = Selector::<TestModel>::new(&db)
            .where_(col("Age").eq(111))
            .where_(not(col("Name").eq("hha")))
            .build()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT * FROM `test_model` WHERE (`age` = ?) AND (NOT (`name` = ?));"
        );

        let query = Selector::<TestModel>::new(&db)
            .where_(raw("ID = ?").bind(18).as_predicate())
            .where_(col("Name").eq("hha"))
            .build()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT * FROM `test_model` WHERE (ID = ?) AND (`name` = ?);"
        );
        assert_eq!(query.args, vec![Value::from(18), Value::from("hha")]);
    }

    #[test]
    fn aggregates_and_aliases() {
        let db = mysql();
        let query = Selector::<TestModel>::new(&db)
            .select(max("Age"))
            .select(col("Name"))
            .select(min("Age"))
            .build()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT MAX(`age`), `name`, MIN(`age`) FROM `test_model`;"
        );
        let query = Selector::<TestModel>::new(&db)
            .select(count_all())
            .build()
            .unwrap();
        assert_eq!(query.sql, "SELECT COUNT(*) FROM `test_model`;");
        let query = Selector::<TestModel>::new(&db)
            .select(col("Age").as_("age_as"))
            .select(max("Name").as_("name_as"))
            .select(avg("Age"))
            .build()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT `age` AS `age_as`, MAX(`name`) AS `name_as`, AVG(`age`) FROM `test_model`;"
        );
    }

    #[test]
    fn group_having_order_limit() {
        let db = mysql();
        let query = Selector::<TestModel>::new(&db)
            .from("`table_test`")
            .group_by(col("Age"))
            .group_by(raw("YEAR(`age`)"))
            .having(sum("Age").gt(10))
            .having(col("Age").lt(100))
            .order_by(asc("Age"))
            .order_by(desc("Age"))
            .limit(10)
            .offset(20)
            .build()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT * FROM `table_test` GROUP BY `age`, YEAR(`age`) HAVING (SUM(`age`) > ?) AND (`age` < ?) ORDER BY `age` ASC, `age` DESC LIMIT ? OFFSET ?;"
        );
        assert_eq!(
            query.args,
            vec![
                Value::from(10),
                Value::from(100),
                Value::from(10u64),
                Value::from(20u64)
            ]
        );
    }

    #[test]
    fn zero_limit_and_offset_are_omitted() {
        let db = mysql();
        let query = Selector::<TestModel>::new(&db)
            .limit(0)
            .offset(0)
            .build()
            .unwrap();
        assert_eq!(query.sql, "SELECT * FROM `test_model`;");
        assert!(query.args.is_empty());
        let query = Selector::<TestModel>::new(&db)
            .limit(0)
            .offset(5)
            .build()
            .unwrap();
        assert_eq!(query.sql, "SELECT * FROM `test_model` OFFSET ?;");
        assert_eq!(query.args, vec![Value::from(5u64)]);
    }

    #[test]
    fn build_errors() {
        let db = mysql();
        let error = Selector::<TestModel>::new(&db)
            .where_(col("Unknown").eq(1))
            .build()
            .unwrap_err();
        assert_eq!(
            ErrorKind::of(&error),
            Some(&ErrorKind::UnknownField("Unknown".into()))
        );
        let error = Selector::<TestModel>::new(&db)
            .where_(max("Age").gt(1))
            .build()
            .unwrap_err();
        assert!(matches!(
            ErrorKind::of(&error),
            Some(ErrorKind::UnsupportedType(..))
        ));
        let error = Selector::<TestModel>::new(&db)
            .group_by(max("Age"))
            .build()
            .unwrap_err();
        assert!(matches!(
            ErrorKind::of(&error),
            Some(ErrorKind::UnsupportedType(..))
        ));
    }

    #[tokio::test]
    async fn session_errors_surface() {
        let db = mysql();
        let error = Selector::<TestModel>::new(&db).get().await.unwrap_err();
        assert_eq!(error.to_string(), "not connected");
    }
}
