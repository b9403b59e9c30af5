//! Which accessors and setters each field profile gets.

use bitflags::bitflags;
use schemanode_core::FieldProfile;

bitflags! {
    /// The generated surface of one field.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct FieldApi: u8 {
        /// `fn f(&self) -> &T`
        const GET_PLAIN = 1 << 0;
        /// `fn f(&self) -> (bool, &T)`, true only when present and not null
        const GET_TUPLE = 1 << 1;
        /// `fn maybe_f(&self) -> Maybe<&T>`
        const GET_MAYBE = 1 << 2;
        /// `fn set_f(&mut self, T) -> &mut Self` on the content
        const SET_VALUE = 1 << 3;
        /// `fn set_f_null(&mut self) -> &mut Self` on the content
        const SET_NULL = 1 << 4;
        /// `fn set_maybe_f(&mut self, Maybe<T>) -> Result<&mut Self, NodeError>` on the content
        const SET_MAYBE = 1 << 5;
        /// The content stores the value as `Option<T>` and the node reads it without presence bits
        const ALWAYS_SET = 1 << 6;
    }
}

impl FieldApi {
    /// The surface generated for a field of `profile`.
    ///
    /// Only required fields get a plain getter. Getters of every other profile
    /// return the field state alongside the value.
    pub fn for_profile(profile: FieldProfile) -> Self {
        let mut api = FieldApi::SET_VALUE | FieldApi::SET_MAYBE;
        match profile {
            FieldProfile::Required => api |= FieldApi::GET_PLAIN | FieldApi::ALWAYS_SET,
            _ => api |= FieldApi::GET_TUPLE | FieldApi::GET_MAYBE,
        }
        if profile.is_nullable() {
            api |= FieldApi::SET_NULL;
        }
        api
    }
}
