use crate::{Column, col};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: Column,
    pub order: Order,
}

pub fn asc(field: impl Into<String>) -> OrderBy {
    OrderBy {
        column: col(field),
        order: Order::Asc,
    }
}

pub fn desc(field: impl Into<String>) -> OrderBy {
    OrderBy {
        column: col(field),
        order: Order::Desc,
    }
}
