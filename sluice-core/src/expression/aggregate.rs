use crate::{Column, col};

/// Aggregate function call over a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub function: &'static str,
    pub column: Column,
    pub alias: Option<String>,
}

impl Aggregate {
    pub fn new(function: &'static str, column: Column) -> Self {
        Self {
            function,
            column,
            alias: None,
        }
    }
    pub fn as_(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

impl_comparisons!(Aggregate);

pub fn max(field: impl Into<String>) -> Aggregate {
    Aggregate::new("MAX", col(field))
}

pub fn min(field: impl Into<String>) -> Aggregate {
    Aggregate::new("MIN", col(field))
}

pub fn sum(field: impl Into<String>) -> Aggregate {
    Aggregate::new("SUM", col(field))
}

pub fn avg(field: impl Into<String>) -> Aggregate {
    Aggregate::new("AVG", col(field))
}

pub fn count(field: impl Into<String>) -> Aggregate {
    Aggregate::new("COUNT", col(field))
}

/// `COUNT(*)`
pub fn count_all() -> Aggregate {
    Aggregate::new("COUNT", col("*"))
}
