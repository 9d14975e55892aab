use crate::{Predicate, Value};

/// SQL text emitted verbatim with its arguments.
///
/// The text is not checked, the caller is responsible for its safety. Once arguments are bound,
/// every `?` in the text is one placeholder and they must match in number.
#[derive(Debug, Clone, PartialEq)]
pub struct Raw {
    pub text: String,
    pub args: Vec<Value>,
}

pub fn raw(text: impl Into<String>) -> Raw {
    Raw {
        text: text.into(),
        args: Vec::new(),
    }
}

impl Raw {
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }
    /// Uses the fragment as a condition on its own.
    pub fn as_predicate(self) -> Predicate {
        Predicate {
            left: Some(self.into()),
            op: None,
            right: None,
        }
    }
}
