use crate::Error;
use thiserror::Error;

/// Failure kinds raised by the compilation and execution pipeline.
///
/// They travel as the root cause of an [`anyhow::Error`], use [`ErrorKind::of`] to recover them
/// after context has been attached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("Type `{0}` cannot be mapped to a table")]
    InvalidModel(String),
    #[error("Invalid tag `{tag}` on field `{field}`, expected `key=value[,key=value...]`")]
    InvalidTags { field: String, tag: String },
    #[error("Unknown field `{0}`")]
    UnknownField(String),
    #[error("Unknown column `{0}`")]
    UnknownColumn(String),
    #[error("No record found")]
    NoRecord,
    #[error("Failed to decode column `{column}`: {reason}")]
    ScanFailed { column: String, reason: String },
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("Insert requires at least one row of values")]
    InsertNoValues,
    #[error("Update requires at least one column to set")]
    UpdateNoColumns,
    #[error("Unsupported expression: {0}")]
    UnsupportedType(String),
    #[error("Not supported by the {0} dialect")]
    Unsupported(String),
}

impl ErrorKind {
    /// The kind at the root of `error`, if any.
    pub fn of(error: &Error) -> Option<&ErrorKind> {
        error.root_cause().downcast_ref::<ErrorKind>()
    }
    pub fn is(error: &Error, kind: &ErrorKind) -> bool {
        Self::of(error) == Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorKind;
    use crate::{Error, ErrorContext};

    #[test]
    fn kind_survives_context() {
        let error: Error = ErrorKind::UnknownField("Nope".into()).into();
        let error = error.context("While building the select");
        assert_eq!(
            ErrorKind::of(&error),
            Some(&ErrorKind::UnknownField("Nope".into()))
        );
        assert_eq!(format!("{:#}", error), "While building the select: Unknown field `Nope`");
    }

    #[test]
    fn plain_errors_have_no_kind() {
        let error = Error::msg("something else");
        assert!(ErrorKind::of(&error).is_none());
        let result: crate::Result<()> = Err(error).context("wrapped");
        assert!(ErrorKind::of(&result.unwrap_err()).is_none());
    }

    #[test]
    fn scan_failed_message() {
        let error = ErrorKind::ScanFailed {
            column: "id_t".into(),
            reason: "expected i64".into(),
        };
        assert_eq!(error.to_string(), "Failed to decode column `id_t`: expected i64");
    }
}
