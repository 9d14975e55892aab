/// Implements the comparison builders on a left hand side expression type.
macro_rules! impl_comparisons {
    ($ty:ty) => {
        impl $ty {
            pub fn eq(self, value: impl Into<$crate::Value>) -> $crate::Predicate {
                $crate::Predicate::binary(self, $crate::Operator::Eq, $crate::arg(value))
            }
            pub fn ne(self, value: impl Into<$crate::Value>) -> $crate::Predicate {
                $crate::Predicate::binary(self, $crate::Operator::NotEq, $crate::arg(value))
            }
            pub fn lt(self, value: impl Into<$crate::Value>) -> $crate::Predicate {
                $crate::Predicate::binary(self, $crate::Operator::Less, $crate::arg(value))
            }
            pub fn le(self, value: impl Into<$crate::Value>) -> $crate::Predicate {
                $crate::Predicate::binary(self, $crate::Operator::LessEqual, $crate::arg(value))
            }
            pub fn gt(self, value: impl Into<$crate::Value>) -> $crate::Predicate {
                $crate::Predicate::binary(self, $crate::Operator::Greater, $crate::arg(value))
            }
            pub fn ge(self, value: impl Into<$crate::Value>) -> $crate::Predicate {
                $crate::Predicate::binary(self, $crate::Operator::GreaterEqual, $crate::arg(value))
            }
        }
    };
}

mod aggregate;
mod assignment;
mod column;
mod ordered;
mod predicate;
mod raw;

pub use aggregate::*;
pub use assignment::*;
pub use column::*;
pub use ordered::*;
pub use predicate::*;
pub use raw::*;

use crate::Value;

/// Node of the expression tree compiled by [`crate::SqlRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Column(Column),
    /// Bound argument, rendered as a placeholder.
    Arg(Value),
    Predicate(Box<Predicate>),
    Aggregate(Aggregate),
    Raw(Raw),
    Assignment(Box<Assignment>),
}

impl Expression {
    pub fn is_predicate(&self) -> bool {
        matches!(self, Expression::Predicate(..))
    }
}

/// Wraps a value into an argument expression.
pub fn arg(value: impl Into<Value>) -> Expression {
    Expression::Arg(value.into())
}

impl From<Column> for Expression {
    fn from(value: Column) -> Self {
        Expression::Column(value)
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::Arg(value)
    }
}

impl From<Predicate> for Expression {
    fn from(value: Predicate) -> Self {
        Expression::Predicate(Box::new(value))
    }
}

impl From<Aggregate> for Expression {
    fn from(value: Aggregate) -> Self {
        Expression::Aggregate(value)
    }
}

impl From<Raw> for Expression {
    fn from(value: Raw) -> Self {
        Expression::Raw(value)
    }
}

impl From<Assignment> for Expression {
    fn from(value: Assignment) -> Self {
        Expression::Assignment(Box::new(value))
    }
}

/// Item of a select list.
#[derive(Debug, Clone, PartialEq)]
pub enum Selectable {
    Column(Column),
    Aggregate(Aggregate),
    Raw(Raw),
}

impl From<Column> for Selectable {
    fn from(value: Column) -> Self {
        Selectable::Column(value)
    }
}

impl From<Aggregate> for Selectable {
    fn from(value: Aggregate) -> Self {
        Selectable::Aggregate(value)
    }
}

impl From<Raw> for Selectable {
    fn from(value: Raw) -> Self {
        Selectable::Raw(value)
    }
}

impl From<Selectable> for Expression {
    fn from(value: Selectable) -> Self {
        match value {
            Selectable::Column(v) => v.into(),
            Selectable::Aggregate(v) => v.into(),
            Selectable::Raw(v) => v.into(),
        }
    }
}
