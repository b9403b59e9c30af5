//! Field optionality profiles and the static schema emitted for every typed node.

use core::fmt;

use crate::{FieldSet, InvalidFieldReason, NodeError};

/// How a field may be left out of a node, or nulled.
///
/// Every field of a typed node falls into exactly one profile. The profile
/// decides how many presence bits the field takes, which setters the content
/// assembler offers for it and which accessors the frozen node exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldProfile {
    /// Always present, never null.
    Required,
    /// May be absent. If present, never null.
    Optional,
    /// Always present as a slot, but the value may be null.
    Nullable,
    /// May be absent. If present, may be null.
    OptionalNullable,
}

impl FieldProfile {
    /// Classifies a field from its two independent flags.
    pub const fn new(optional: bool, nullable: bool) -> Self {
        match (optional, nullable) {
            (false, false) => FieldProfile::Required,
            (true, false) => FieldProfile::Optional,
            (false, true) => FieldProfile::Nullable,
            (true, true) => FieldProfile::OptionalNullable,
        }
    }

    /// Whether the field may be absent.
    pub const fn is_optional(self) -> bool {
        matches!(self, FieldProfile::Optional | FieldProfile::OptionalNullable)
    }

    /// Whether the field may hold null.
    pub const fn is_nullable(self) -> bool {
        matches!(self, FieldProfile::Nullable | FieldProfile::OptionalNullable)
    }

    /// Whether the field must be assigned (a value, or null) before freezing.
    pub const fn is_always_present(self) -> bool {
        !self.is_optional()
    }

    /// Number of bits this field takes in a presence word.
    pub const fn bit_count(self) -> u32 {
        self.is_optional() as u32 + self.is_nullable() as u32
    }
}

impl fmt::Display for FieldProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldProfile::Required => write!(f, "required"),
            FieldProfile::Optional => write!(f, "optional"),
            FieldProfile::Nullable => write!(f, "nullable"),
            FieldProfile::OptionalNullable => write!(f, "optional nullable"),
        }
    }
}

/// Static description of one field, in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldSchema {
    /// Field name as declared.
    pub name: &'static str,
    /// Rust type of the field, as written in the declaration.
    pub type_name: &'static str,
    /// Optionality profile.
    pub profile: FieldProfile,
}

impl FieldSchema {
    /// Describes a field.
    pub const fn new(name: &'static str, type_name: &'static str, profile: FieldProfile) -> Self {
        Self {
            name,
            type_name,
            profile,
        }
    }
}

/// Static description of a typed node: its name and its fields in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeSchema {
    /// Name of the node type.
    pub name: &'static str,
    /// Fields, in declaration order. The position of a field here is its index everywhere else.
    pub fields: &'static [FieldSchema],
}

impl NodeSchema {
    /// Describes a node.
    pub const fn new(name: &'static str, fields: &'static [FieldSchema]) -> Self {
        Self { name, fields }
    }

    /// Number of declared fields.
    pub const fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// The field at `index`.
    pub fn field(&self, index: usize) -> Result<&'static FieldSchema, NodeError> {
        self.fields
            .get(index)
            .ok_or(NodeError::FieldIndexOutOfBounds {
                node: self.name,
                index,
                field_count: self.fields.len(),
            })
    }

    /// Index of the field called `name`.
    pub fn index_of(&self, name: &str) -> Result<usize, NodeError> {
        self.fields
            .iter()
            .position(|field| field.name == name)
            .ok_or_else(|| NodeError::NoSuchField {
                node: self.name,
                name: name.into(),
            })
    }

    /// Checks that every always-present field (required or nullable) was assigned.
    ///
    /// Reports the first offending field in declaration order.
    pub fn check_assigned(&self, assigned: &FieldSet) -> Result<(), NodeError> {
        for (index, field) in self.fields.iter().enumerate() {
            if field.profile.is_always_present() && !assigned.get(index) {
                crate::debug!(
                    "{}: field {} ({}) was never assigned",
                    self.name,
                    field.name,
                    field.profile
                );
                return Err(NodeError::MissingRequiredField {
                    node: self.name,
                    field: field.name,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn invalid_field(&self, index: usize, reason: InvalidFieldReason) -> NodeError {
        NodeError::InvalidField {
            node: self.name,
            field: self.fields.get(index).map_or("?", |field| field.name),
            reason,
        }
    }
}

impl fmt::Display for NodeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.name)?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {}: {} ({})", field.name, field.type_name, field.profile)?;
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[FieldSchema] = &[
        FieldSchema::new("f1", "String", FieldProfile::Required),
        FieldSchema::new("f2", "String", FieldProfile::Optional),
        FieldSchema::new("f3", "String", FieldProfile::OptionalNullable),
        FieldSchema::new("f4", "String", FieldProfile::Nullable),
    ];
    const SCHEMA: NodeSchema = NodeSchema::new("Record", FIELDS);

    #[test]
    fn profile_flags_round_trip() {
        for profile in [
            FieldProfile::Required,
            FieldProfile::Optional,
            FieldProfile::Nullable,
            FieldProfile::OptionalNullable,
        ] {
            assert_eq!(
                FieldProfile::new(profile.is_optional(), profile.is_nullable()),
                profile
            );
        }
    }

    #[test]
    fn bit_counts() {
        assert_eq!(FieldProfile::Required.bit_count(), 0);
        assert_eq!(FieldProfile::Optional.bit_count(), 1);
        assert_eq!(FieldProfile::Nullable.bit_count(), 1);
        assert_eq!(FieldProfile::OptionalNullable.bit_count(), 2);
    }

    #[test]
    fn index_of_known_and_unknown_fields() {
        assert_eq!(SCHEMA.index_of("f3").unwrap(), 2);
        let err = SCHEMA.index_of("nope").unwrap_err();
        assert_eq!(
            err,
            NodeError::NoSuchField {
                node: "Record",
                name: "nope".into()
            }
        );
    }

    #[test]
    fn field_out_of_bounds() {
        let err = SCHEMA.field(4).unwrap_err();
        assert_eq!(
            err,
            NodeError::FieldIndexOutOfBounds {
                node: "Record",
                index: 4,
                field_count: 4
            }
        );
    }

    #[test]
    fn check_assigned_reports_first_missing_slot() {
        let mut assigned = FieldSet::new(4);
        let err = SCHEMA.check_assigned(&assigned).unwrap_err();
        assert_eq!(
            err,
            NodeError::MissingRequiredField {
                node: "Record",
                field: "f1"
            }
        );

        assigned.set(0);
        // f4 is nullable: it still needs a value or an explicit null
        let err = SCHEMA.check_assigned(&assigned).unwrap_err();
        assert_eq!(
            err,
            NodeError::MissingRequiredField {
                node: "Record",
                field: "f4"
            }
        );

        assigned.set(3);
        assert!(SCHEMA.check_assigned(&assigned).is_ok());
    }

    #[test]
    fn display_schema() {
        insta::assert_snapshot!(
            SCHEMA.to_string(),
            @"Record { f1: String (required), f2: String (optional), f3: String (optional nullable), f4: String (nullable) }"
        );
    }
}
