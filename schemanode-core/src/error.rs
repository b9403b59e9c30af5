use alloc::string::String;
use core::fmt;

use crate::FieldState;

/// Errors raised while assembling, freezing or reading typed nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// A tri-state value was read as a concrete value while absent or null.
    InvalidUnbox {
        /// The state the value was actually in.
        state: FieldState,
    },

    /// Tried to freeze a content assembler without setting an always-present field.
    MissingRequiredField {
        /// Name of the node type.
        node: &'static str,
        /// The field that was never assigned.
        field: &'static str,
    },

    /// Asked a field for something its profile does not allow, e.g. a null
    /// bit on a field that cannot be null.
    ///
    /// This points at a mismatch between the schema and the calling code, not
    /// at bad data.
    InvalidField {
        /// Name of the node type.
        node: &'static str,
        /// The field that was misused.
        field: &'static str,
        /// What the field does not allow.
        reason: InvalidFieldReason,
    },

    /// Field index past the end of the schema.
    FieldIndexOutOfBounds {
        /// Name of the node type.
        node: &'static str,
        /// The index that was asked for.
        index: usize,
        /// Number of fields the node has.
        field_count: usize,
    },

    /// No field with that name.
    NoSuchField {
        /// Name of the node type.
        node: &'static str,
        /// The name that was looked up.
        name: String,
    },

    /// A type-erased field was read as the wrong Rust type.
    WrongType {
        /// Name of the node type.
        node: &'static str,
        /// The field that was read.
        field: &'static str,
        /// The type the caller asked for.
        expected: &'static str,
        /// The type the field is declared with.
        actual: &'static str,
    },

    /// `build` was called again on an assembler that was already frozen.
    AlreadyFrozen {
        /// Name of the node type.
        node: &'static str,
    },
}

/// Why [`NodeError::InvalidField`] was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidFieldReason {
    /// The field has no null bit.
    NotNullable,
    /// The field has no presence bit: it cannot be absent.
    NotOptional,
}

impl fmt::Display for InvalidFieldReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidFieldReason::NotNullable => write!(f, "field is not nullable"),
            InvalidFieldReason::NotOptional => write!(f, "field cannot be absent"),
        }
    }
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::InvalidUnbox { state } => {
                write!(f, "Invalid unbox: value is {state}, not present")
            }
            NodeError::MissingRequiredField { node, field } => {
                write!(f, "Missing required field {node}.{field}")
            }
            NodeError::InvalidField {
                node,
                field,
                reason,
            } => write!(f, "Invalid use of field {node}.{field}: {reason}"),
            NodeError::FieldIndexOutOfBounds {
                node,
                index,
                field_count,
            } => write!(
                f,
                "Field index {index} out of bounds ({node} has {field_count} fields)"
            ),
            NodeError::NoSuchField { node, name } => {
                write!(f, "No field named {name:?} in {node}")
            }
            NodeError::WrongType {
                node,
                field,
                expected,
                actual,
            } => write!(
                f,
                "Wrong type for {node}.{field}: expected {expected}, but the field is {actual}"
            ),
            NodeError::AlreadyFrozen { node } => {
                write!(f, "{node} content was already built")
            }
        }
    }
}

impl core::error::Error for NodeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn messages() {
        insta::assert_snapshot!(
            NodeError::InvalidUnbox { state: FieldState::Null }.to_string(),
            @"Invalid unbox: value is null, not present"
        );
        insta::assert_snapshot!(
            NodeError::MissingRequiredField { node: "Record", field: "f1" }.to_string(),
            @"Missing required field Record.f1"
        );
        insta::assert_snapshot!(
            NodeError::InvalidField {
                node: "Record",
                field: "f2",
                reason: InvalidFieldReason::NotNullable,
            }
            .to_string(),
            @"Invalid use of field Record.f2: field is not nullable"
        );
        insta::assert_snapshot!(
            NodeError::NoSuchField { node: "Record", name: "f9".into() }.to_string(),
            @r#"No field named "f9" in Record"#
        );
        insta::assert_snapshot!(
            NodeError::FieldIndexOutOfBounds { node: "Record", index: 7, field_count: 4 }.to_string(),
            @"Field index 7 out of bounds (Record has 4 fields)"
        );
    }
}
