use crate::Expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
    Not,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
        }
    }
}

/// `left op right`, each part optional: `NOT` has no left side and a raw predicate has
/// neither operator nor right side.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub left: Option<Expression>,
    pub op: Option<Operator>,
    pub right: Option<Expression>,
}

impl Predicate {
    pub fn binary(left: impl Into<Expression>, op: Operator, right: impl Into<Expression>) -> Self {
        Self {
            left: Some(left.into()),
            op: Some(op),
            right: Some(right.into()),
        }
    }
    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::binary(self, Operator::And, other)
    }
    pub fn or(self, other: Predicate) -> Predicate {
        Predicate::binary(self, Operator::Or, other)
    }
    /// Folds the predicates left to right with `AND`.
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Option<Predicate> {
        predicates.into_iter().reduce(Predicate::and)
    }
}

pub fn not(predicate: Predicate) -> Predicate {
    Predicate {
        left: None,
        op: Some(Operator::Not),
        right: Some(predicate.into()),
    }
}
