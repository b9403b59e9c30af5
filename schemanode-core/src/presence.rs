//! Presence encoding: one packed word per node recording which optional fields
//! were set and which nullable fields hold null.
//!
//! The layout assigns bits in field declaration order. An optional field takes a
//! presence bit, a nullable field takes a null bit, an optional nullable field
//! takes both (presence first), a required field takes none. The layout is a
//! constant of each node type, computed by [`PresenceLayout::compute`], and the
//! content assembler and the node accessors read the very same constant.
//!
//! Bit positions never leave this module: [`Slot`] and [`PresenceWord`] are opaque.

use core::fmt;

use crate::{FieldState, InvalidFieldReason, NodeError, NodeSchema};

/// Where one field's bits live in a [`PresenceWord`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    presence: Option<u8>,
    null: Option<u8>,
}

impl Slot {
    /// A slot with no bits: the field is always present and never null.
    const ALWAYS_PRESENT: Slot = Slot {
        presence: None,
        null: None,
    };

    /// Whether the field can be absent.
    #[inline]
    pub const fn has_presence_bit(&self) -> bool {
        self.presence.is_some()
    }

    /// Whether the field can be null.
    #[inline]
    pub const fn has_null_bit(&self) -> bool {
        self.null.is_some()
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("presence", &self.has_presence_bit())
            .field("null", &self.has_null_bit())
            .finish()
    }
}

/// A [`Slot`] known to carry a null bit.
///
/// Only obtainable through [`PresenceLayout::nullable_slot`], which refuses
/// fields that cannot be null.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NullableSlot(Slot);

impl NullableSlot {
    /// The underlying slot.
    #[inline]
    pub const fn slot(self) -> Slot {
        self.0
    }
}

/// Bit assignment for every field of one node schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresenceLayout {
    schema: &'static NodeSchema,
    slots: &'static [Slot],
}

impl PresenceLayout {
    /// Width of a presence word.
    pub const WORD_BITS: u32 = u64::BITS;

    /// Computes the slot of every field of `schema`, in declaration order.
    ///
    /// `N` must equal the number of fields. Panics (a compile error when
    /// evaluated in a constant) if the schema needs more than
    /// [`Self::WORD_BITS`] bits.
    pub const fn compute<const N: usize>(schema: &NodeSchema) -> [Slot; N] {
        assert!(
            schema.fields.len() == N,
            "slot count must match the schema's field count"
        );

        let mut slots = [Slot::ALWAYS_PRESENT; N];
        let mut next: u32 = 0;
        let mut i = 0;
        while i < N {
            let profile = schema.fields[i].profile;
            assert!(
                next + profile.bit_count() <= Self::WORD_BITS,
                "schema needs more presence bits than fit in one word"
            );
            let presence = if profile.is_optional() {
                next += 1;
                Some((next - 1) as u8)
            } else {
                None
            };
            let null = if profile.is_nullable() {
                next += 1;
                Some((next - 1) as u8)
            } else {
                None
            };
            slots[i] = Slot { presence, null };
            i += 1;
        }
        slots
    }

    /// Pairs a schema with the slots [`Self::compute`] produced for it.
    pub const fn new(schema: &'static NodeSchema, slots: &'static [Slot]) -> Self {
        assert!(
            schema.fields.len() == slots.len(),
            "slot count must match the schema's field count"
        );
        Self { schema, slots }
    }

    /// The schema this layout was computed from.
    #[inline]
    pub const fn schema(&self) -> &'static NodeSchema {
        self.schema
    }

    /// Total number of bits used.
    pub const fn bits_used(&self) -> u32 {
        let mut used = 0;
        let mut i = 0;
        while i < self.schema.fields.len() {
            used += self.schema.fields[i].profile.bit_count();
            i += 1;
        }
        used
    }

    /// The slot of field `field`.
    ///
    /// Meant for constant contexts, where an out-of-range index is a compile
    /// error. At runtime, use [`Self::try_slot`].
    #[inline]
    pub const fn slot(&self, field: usize) -> Slot {
        self.slots[field]
    }

    /// The slot of a nullable field.
    ///
    /// Panics if the field has no null bit; evaluated in a constant, that is a
    /// compile error pointing at the schema/accessor mismatch.
    pub const fn nullable_slot(&self, field: usize) -> NullableSlot {
        let slot = self.slots[field];
        assert!(slot.has_null_bit(), "field is not nullable");
        NullableSlot(slot)
    }

    /// The slot of field `field`, or [`NodeError::FieldIndexOutOfBounds`].
    pub fn try_slot(&self, field: usize) -> Result<Slot, NodeError> {
        self.slots
            .get(field)
            .copied()
            .ok_or(NodeError::FieldIndexOutOfBounds {
                node: self.schema.name,
                index: field,
                field_count: self.slots.len(),
            })
    }

    /// The slot of a nullable field, or [`NodeError::InvalidField`].
    pub fn try_nullable_slot(&self, field: usize) -> Result<NullableSlot, NodeError> {
        let slot = self.try_slot(field)?;
        if !slot.has_null_bit() {
            return Err(self
                .schema
                .invalid_field(field, InvalidFieldReason::NotNullable));
        }
        Ok(NullableSlot(slot))
    }
}

/// Packed presence and null bits for one node instance.
///
/// A fresh word reports every optional field as absent and every nullable
/// field as not null.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PresenceWord {
    bits: u64,
}

impl PresenceWord {
    /// A word with nothing set.
    #[inline]
    pub const fn new() -> Self {
        Self { bits: 0 }
    }

    #[inline]
    const fn mask(bit: u8) -> u64 {
        1u64 << bit
    }

    /// Records that the field now holds a concrete value: present, not null.
    #[inline]
    pub fn mark_present(&mut self, slot: Slot) {
        if let Some(bit) = slot.presence {
            self.bits |= Self::mask(bit);
        }
        if let Some(bit) = slot.null {
            self.bits &= !Self::mask(bit);
        }
    }

    /// Records that the field now holds null (and, if optional, is present).
    #[inline]
    pub fn mark_null(&mut self, slot: NullableSlot) {
        let slot = slot.slot();
        if let Some(bit) = slot.presence {
            self.bits |= Self::mask(bit);
        }
        if let Some(bit) = slot.null {
            self.bits |= Self::mask(bit);
        }
    }

    /// Forgets everything recorded for the field.
    #[inline]
    pub fn mark_absent(&mut self, slot: Slot) {
        if let Some(bit) = slot.presence {
            self.bits &= !Self::mask(bit);
        }
        if let Some(bit) = slot.null {
            self.bits &= !Self::mask(bit);
        }
    }

    /// Reads the state of a field.
    ///
    /// A field without a presence bit is never absent. The null bit only counts
    /// when the field is present.
    #[inline]
    pub const fn state(&self, slot: Slot) -> FieldState {
        if let Some(bit) = slot.presence {
            if self.bits & Self::mask(bit) == 0 {
                return FieldState::Absent;
            }
        }
        if let Some(bit) = slot.null {
            if self.bits & Self::mask(bit) != 0 {
                return FieldState::Null;
            }
        }
        FieldState::Present
    }

    /// Sets the presence bit of `field`. A no-op for always-present fields.
    pub fn set(&mut self, layout: &PresenceLayout, field: usize) -> Result<(), NodeError> {
        let slot = layout.try_slot(field)?;
        if let Some(bit) = slot.presence {
            self.bits |= Self::mask(bit);
        }
        Ok(())
    }

    /// Clears the presence (and null) bit of `field`.
    ///
    /// Fails with [`NodeError::InvalidField`] if the field cannot be absent.
    pub fn clear(&mut self, layout: &PresenceLayout, field: usize) -> Result<(), NodeError> {
        let slot = layout.try_slot(field)?;
        if !slot.has_presence_bit() {
            return Err(layout
                .schema
                .invalid_field(field, InvalidFieldReason::NotOptional));
        }
        self.mark_absent(slot);
        Ok(())
    }

    /// Whether `field` was set. Always true for fields that cannot be absent.
    pub fn is_set(&self, layout: &PresenceLayout, field: usize) -> Result<bool, NodeError> {
        let slot = layout.try_slot(field)?;
        Ok(self.state(slot).exists())
    }

    /// Marks `field` as present and null.
    ///
    /// Fails with [`NodeError::InvalidField`] if the field cannot be null.
    pub fn set_null(&mut self, layout: &PresenceLayout, field: usize) -> Result<(), NodeError> {
        let slot = layout.try_nullable_slot(field)?;
        self.mark_null(slot);
        Ok(())
    }

    /// Whether `field` is present and null.
    ///
    /// Fails with [`NodeError::InvalidField`] if the field cannot be null.
    pub fn is_null(&self, layout: &PresenceLayout, field: usize) -> Result<bool, NodeError> {
        let slot = layout.try_nullable_slot(field)?;
        Ok(matches!(self.state(slot.slot()), FieldState::Null))
    }
}

impl fmt::Debug for PresenceWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PresenceWord({:#b})", self.bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldProfile, FieldSchema};

    const FIELDS: [FieldSchema; 4] = [
        FieldSchema::new("f1", "String", FieldProfile::Required),
        FieldSchema::new("f2", "String", FieldProfile::Optional),
        FieldSchema::new("f3", "String", FieldProfile::OptionalNullable),
        FieldSchema::new("f4", "String", FieldProfile::Nullable),
    ];
    const SCHEMA: NodeSchema = NodeSchema::new("Record", &FIELDS);
    const SLOTS: [Slot; 4] = PresenceLayout::compute::<4>(&SCHEMA);
    const LAYOUT: PresenceLayout = PresenceLayout::new(&SCHEMA, &SLOTS);

    #[test]
    fn layout_follows_declaration_order() {
        assert_eq!(
            SLOTS,
            [
                Slot {
                    presence: None,
                    null: None
                },
                Slot {
                    presence: Some(0),
                    null: None
                },
                Slot {
                    presence: Some(1),
                    null: Some(2)
                },
                Slot {
                    presence: None,
                    null: Some(3)
                },
            ]
        );
        assert_eq!(LAYOUT.bits_used(), 4);
    }

    #[test]
    fn layout_is_deterministic() {
        let again = PresenceLayout::compute::<4>(&SCHEMA);
        assert_eq!(SLOTS, again);
        assert_eq!(PresenceLayout::compute::<4>(&SCHEMA), again);
    }

    #[test]
    fn sixty_four_optional_fields_fit() {
        const WIDE: [FieldSchema; 64] =
            [FieldSchema::new("f", "u8", FieldProfile::Optional); 64];
        const WIDE_SCHEMA: NodeSchema = NodeSchema::new("Wide", &WIDE);
        let slots = PresenceLayout::compute::<64>(&WIDE_SCHEMA);
        assert_eq!(slots[63].presence, Some(63));
    }

    #[test]
    #[should_panic(expected = "schema needs more presence bits than fit in one word")]
    fn too_many_bits_is_rejected() {
        const TOO_WIDE: [FieldSchema; 33] =
            [FieldSchema::new("f", "u8", FieldProfile::OptionalNullable); 33];
        const TOO_WIDE_SCHEMA: NodeSchema = NodeSchema::new("TooWide", &TOO_WIDE);
        let _ = PresenceLayout::compute::<33>(&TOO_WIDE_SCHEMA);
    }

    #[test]
    fn fresh_word_states() {
        let word = PresenceWord::new();
        assert_eq!(word.state(LAYOUT.slot(0)), FieldState::Present);
        assert_eq!(word.state(LAYOUT.slot(1)), FieldState::Absent);
        assert_eq!(word.state(LAYOUT.slot(2)), FieldState::Absent);
        assert_eq!(word.state(LAYOUT.slot(3)), FieldState::Present);
    }

    #[test]
    fn set_clear_is_set() {
        let mut word = PresenceWord::new();
        assert!(!word.is_set(&LAYOUT, 1).unwrap());
        word.set(&LAYOUT, 1).unwrap();
        assert!(word.is_set(&LAYOUT, 1).unwrap());
        word.clear(&LAYOUT, 1).unwrap();
        assert!(!word.is_set(&LAYOUT, 1).unwrap());

        // required fields are always set, and setting them changes nothing
        assert!(word.is_set(&LAYOUT, 0).unwrap());
        word.set(&LAYOUT, 0).unwrap();
        assert_eq!(word, PresenceWord::new());
    }

    #[test]
    fn clearing_an_always_present_field_fails() {
        let mut word = PresenceWord::new();
        let err = word.clear(&LAYOUT, 3).unwrap_err();
        assert_eq!(
            err,
            NodeError::InvalidField {
                node: "Record",
                field: "f4",
                reason: InvalidFieldReason::NotOptional
            }
        );
    }

    #[test]
    fn null_bits() {
        let mut word = PresenceWord::new();
        word.set_null(&LAYOUT, 2).unwrap();
        assert!(word.is_set(&LAYOUT, 2).unwrap());
        assert!(word.is_null(&LAYOUT, 2).unwrap());
        assert_eq!(word.state(LAYOUT.slot(2)), FieldState::Null);

        word.mark_present(LAYOUT.slot(2));
        assert!(!word.is_null(&LAYOUT, 2).unwrap());
        assert_eq!(word.state(LAYOUT.slot(2)), FieldState::Present);

        word.set_null(&LAYOUT, 3).unwrap();
        assert_eq!(word.state(LAYOUT.slot(3)), FieldState::Null);
    }

    #[test]
    fn null_bit_on_non_nullable_field_fails() {
        let mut word = PresenceWord::new();
        for field in [0, 1] {
            let err = word.set_null(&LAYOUT, field).unwrap_err();
            assert!(matches!(
                err,
                NodeError::InvalidField {
                    reason: InvalidFieldReason::NotNullable,
                    ..
                }
            ));
            let err = word.is_null(&LAYOUT, field).unwrap_err();
            assert!(matches!(err, NodeError::InvalidField { .. }));
        }
        assert_eq!(word, PresenceWord::new());
    }

    #[test]
    fn index_out_of_bounds() {
        let mut word = PresenceWord::new();
        assert_eq!(
            word.set(&LAYOUT, 4).unwrap_err(),
            NodeError::FieldIndexOutOfBounds {
                node: "Record",
                index: 4,
                field_count: 4
            }
        );
    }

    #[test]
    fn null_bit_without_presence_is_ignored() {
        // an absent optional nullable field reads as absent even if its null bit is stale
        let word = PresenceWord { bits: 1 << 2 };
        assert_eq!(word.state(LAYOUT.slot(2)), FieldState::Absent);
        assert!(!word.is_set(&LAYOUT, 2).unwrap());
    }

    #[test]
    #[should_panic(expected = "field is not nullable")]
    fn nullable_slot_of_optional_field_panics() {
        let _ = LAYOUT.nullable_slot(1);
    }
}
