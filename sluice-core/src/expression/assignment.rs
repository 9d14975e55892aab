use crate::{Column, Expression, arg, col};

/// `column = value`, used by updates and upserts.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: Column,
    pub value: Expression,
}

pub fn assign(field: impl Into<String>, value: impl Into<crate::Value>) -> Assignment {
    Assignment {
        column: col(field),
        value: arg(value),
    }
}
