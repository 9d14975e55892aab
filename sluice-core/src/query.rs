use crate::{Value, truncate_long};
use std::fmt::{self, Display};

/// Compiled statement: SQL text and its positional arguments.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Query {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Query {
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", truncate_long!(self.sql), self.args)
    }
}
