use crate::{
    Aggregate, Column, Dialect, ErrorKind, Expression, Model, OrderBy, Predicate, Query, Raw,
    Result, Selectable, Value, possibly_parenthesized, write_identifier_quoted,
};

/// Clause being rendered, decides which expressions are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    Select,
    Where,
    GroupBy,
    Having,
    Set,
    Upsert,
}

impl Clause {
    pub fn allows_aggregates(&self) -> bool {
        *self != Clause::Where
    }
}

/// Recursive compiler from expressions to SQL text and positional arguments.
///
/// Arguments are appended in the same order their placeholders are written.
#[derive(Debug)]
pub struct SqlRenderer<'a> {
    model: &'a Model,
    dialect: &'a dyn Dialect,
    out: String,
    args: Vec<Value>,
}

impl<'a> SqlRenderer<'a> {
    pub fn new(model: &'a Model, dialect: &'a dyn Dialect) -> Self {
        Self {
            model,
            dialect,
            out: String::with_capacity(128),
            args: Vec::new(),
        }
    }

    pub fn model(&self) -> &'a Model {
        self.model
    }

    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    pub fn push(&mut self, c: char) {
        self.out.push(c);
    }

    pub fn push_str(&mut self, value: &str) {
        self.out.push_str(value);
    }

    pub fn write_identifier(&mut self, name: &str) {
        write_identifier_quoted(&mut self.out, name, self.dialect.quote_char());
    }

    /// The table of the model, or `table` verbatim when given.
    pub fn write_table(&mut self, table: Option<&str>) {
        match table {
            Some(table) => self.out.push_str(table),
            None => write_identifier_quoted(
                &mut self.out,
                &self.model.table_name,
                self.dialect.quote_char(),
            ),
        }
    }

    /// Quoted column of a field, followed by its alias if any.
    pub fn write_column(&mut self, column: &Column) -> Result<()> {
        if column.is_wildcard() {
            self.out.push('*');
        } else {
            let field = self
                .model
                .field(&column.name)
                .ok_or_else(|| ErrorKind::UnknownField(column.name.clone()))?;
            write_identifier_quoted(&mut self.out, &field.column_name, self.dialect.quote_char());
        }
        if let Some(alias) = &column.alias {
            self.out.push_str(" AS ");
            self.write_identifier(alias);
        }
        Ok(())
    }

    /// Placeholder bound to `value`.
    pub fn write_arg(&mut self, value: Value) {
        self.args.push(value);
        self.dialect.write_placeholder(&mut self.out, self.args.len());
    }

    /// Text of `raw`, every `?` is replaced by the placeholder of the argument bound to it.
    ///
    /// Without bound arguments the text is written untouched.
    pub fn write_raw(&mut self, raw: &Raw) -> Result<()> {
        if raw.args.is_empty() {
            self.out.push_str(&raw.text);
            return Ok(());
        }
        let mut args = raw.args.iter();
        for c in raw.text.chars() {
            if c != '?' {
                self.out.push(c);
                continue;
            }
            let Some(arg) = args.next() else {
                return Err(ErrorKind::InvalidArguments(format!(
                    "Raw fragment `{}` has more placeholders than its {} arguments",
                    raw.text,
                    raw.args.len()
                ))
                .into());
            };
            self.write_arg(arg.clone());
        }
        if args.len() > 0 {
            return Err(ErrorKind::InvalidArguments(format!(
                "Raw fragment `{}` has fewer placeholders than its {} arguments",
                raw.text,
                raw.args.len()
            ))
            .into());
        }
        Ok(())
    }

    pub fn write_aggregate(&mut self, aggregate: &Aggregate, clause: Clause) -> Result<()> {
        if !clause.allows_aggregates() {
            return Err(ErrorKind::UnsupportedType(format!(
                "Aggregate {} cannot be used in {:?}",
                aggregate.function, clause
            ))
            .into());
        }
        self.out.push_str(aggregate.function);
        self.out.push('(');
        self.write_column(&aggregate.column)?;
        self.out.push(')');
        if let Some(alias) = &aggregate.alias {
            self.out.push_str(" AS ");
            self.write_identifier(alias);
        }
        Ok(())
    }

    pub fn write_predicate(&mut self, predicate: &Predicate, clause: Clause) -> Result<()> {
        let mut separate = false;
        if let Some(left) = &predicate.left {
            self.write_operand(left, clause)?;
            separate = true;
        }
        if let Some(op) = predicate.op {
            if separate {
                self.out.push(' ');
            }
            self.out.push_str(op.as_str());
            separate = true;
        }
        if let Some(right) = &predicate.right {
            if separate {
                self.out.push(' ');
            }
            self.write_operand(right, clause)?;
        }
        Ok(())
    }

    fn write_operand(&mut self, operand: &Expression, clause: Clause) -> Result<()> {
        possibly_parenthesized!(
            self.out,
            operand.is_predicate(),
            self.write_expression(operand, clause)?
        );
        Ok(())
    }

    pub fn write_expression(&mut self, expression: &Expression, clause: Clause) -> Result<()> {
        match expression {
            Expression::Column(column) => self.write_column(column)?,
            Expression::Arg(value) => self.write_arg(value.clone()),
            Expression::Predicate(predicate) => self.write_predicate(predicate, clause)?,
            Expression::Aggregate(aggregate) => self.write_aggregate(aggregate, clause)?,
            Expression::Raw(raw) => self.write_raw(raw)?,
            Expression::Assignment(assignment) => {
                self.write_column(&assignment.column)?;
                self.out.push_str(" = ");
                self.write_expression(&assignment.value, clause)?;
            }
        }
        Ok(())
    }

    /// ` <keyword> p1 AND p2 ...`, nothing when `predicates` is empty.
    pub fn write_condition(
        &mut self,
        keyword: &str,
        predicates: &[Predicate],
        clause: Clause,
    ) -> Result<()> {
        let Some(condition) = Predicate::all(predicates.iter().cloned()) else {
            return Ok(());
        };
        self.out.push(' ');
        self.out.push_str(keyword);
        self.out.push(' ');
        self.write_predicate(&condition, clause)
    }

    /// Select list, `*` when empty.
    pub fn write_select_list(&mut self, columns: &[Selectable]) -> Result<()> {
        if columns.is_empty() {
            self.out.push('*');
            return Ok(());
        }
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            match column {
                Selectable::Column(v) => self.write_column(v)?,
                Selectable::Aggregate(v) => self.write_aggregate(v, Clause::Select)?,
                Selectable::Raw(v) => self.write_raw(v)?,
            }
        }
        Ok(())
    }

    pub fn write_group_by(&mut self, expressions: &[Expression]) -> Result<()> {
        if expressions.is_empty() {
            return Ok(());
        }
        self.out.push_str(" GROUP BY ");
        for (i, expression) in expressions.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            match expression {
                Expression::Column(..) | Expression::Raw(..) => {
                    self.write_expression(expression, Clause::GroupBy)?
                }
                other => {
                    return Err(ErrorKind::UnsupportedType(format!(
                        "{other:?} cannot be used in GROUP BY"
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }

    pub fn write_order_by(&mut self, order: &[OrderBy]) -> Result<()> {
        if order.is_empty() {
            return Ok(());
        }
        self.out.push_str(" ORDER BY ");
        for (i, v) in order.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.write_column(&v.column)?;
            self.out.push(' ');
            self.out.push_str(v.order.as_str());
        }
        Ok(())
    }

    /// Terminates the statement.
    pub fn finish(mut self) -> Query {
        self.out.push(';');
        Query {
            sql: self.out,
            args: self.args,
        }
    }
}
