//! Conditional decode of a parsed record.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::DecodeError;
use crate::schema::ParsedRecord;

// == Decode Spec ==
/// Picks one of two columns depending on the value of a third.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeSpec {
    /// Column whose value is compared
    pub column_to_check: String,
    /// Literal compared against `column_to_check`
    pub value_to_check: String,
    /// Column returned on a match
    pub column_if_value_matched: String,
    /// Column returned otherwise
    pub column_if_value_not_matched: String,
}

impl DecodeSpec {
    /// Creates a spec from its four columns and literal.
    pub fn new(
        column_to_check: impl Into<String>,
        value_to_check: impl Into<String>,
        column_if_value_matched: impl Into<String>,
        column_if_value_not_matched: impl Into<String>,
    ) -> Self {
        Self {
            column_to_check: column_to_check.into(),
            value_to_check: value_to_check.into(),
            column_if_value_matched: column_if_value_matched.into(),
            column_if_value_not_matched: column_if_value_not_matched.into(),
        }
    }
}

/// Applies `spec` to `record`.
///
/// An empty selected value reads as `None`. A `column_to_check` with no value
/// never matches. Decode errors are logged and returned to the caller.
pub fn decode_conditional(
    spec: &DecodeSpec,
    record: &dyn ParsedRecord,
) -> Result<Option<String>, DecodeError> {
    select_column(spec, record).map_err(|e| {
        error!(error = %e, column = %spec.column_to_check, "conditional decode failed");
        e
    })
}

fn select_column(
    spec: &DecodeSpec,
    record: &dyn ParsedRecord,
) -> Result<Option<String>, DecodeError> {
    let actual = record.read_field(&spec.column_to_check)?;
    let column = if actual.as_deref() == Some(spec.value_to_check.as_str()) {
        &spec.column_if_value_matched
    } else {
        &spec.column_if_value_not_matched
    };

    Ok(record.read_field(column)?.filter(|value| !value.is_empty()))
}
