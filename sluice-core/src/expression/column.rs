/// Reference to a record field by its Rust name, `*` passes through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub alias: Option<String>,
}

pub fn col(name: impl Into<String>) -> Column {
    Column {
        name: name.into(),
        alias: None,
    }
}

impl Column {
    pub fn as_(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
    pub fn is_wildcard(&self) -> bool {
        self.name == "*"
    }
}

impl_comparisons!(Column);
