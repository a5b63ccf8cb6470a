use std::fmt;

/// Conditions a caller of the execution core may need to tell apart.
///
/// Functions return `eyre::Result`; these values travel inside the report
/// and are recovered with `downcast_ref::<QueryError>()`. Running out of
/// input is not an error: cursors and joins report it as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A column or record does not fit the schema it is checked against.
    Schema { message: String },
    TableNotFound { name: String },
    TableExists { name: String },
    /// `next_record` was called on a join iterator with no pending result.
    IteratorExhausted,
    InvalidConfig { message: String },
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Schema { message } => write!(f, "schema error: {}", message),
            QueryError::TableNotFound { name } => write!(f, "table '{}' not found", name),
            QueryError::TableExists { name } => write!(f, "table '{}' already exists", name),
            QueryError::IteratorExhausted => f.write_str("iterator has no more records"),
            QueryError::InvalidConfig { message } => {
                write!(f, "invalid configuration: {}", message)
            }
        }
    }
}

impl std::error::Error for QueryError {}
