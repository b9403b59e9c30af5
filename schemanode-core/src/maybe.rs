//! The tri-state value: absent, null, or present.

use core::fmt;

use crate::NodeError;

/// Which of the three states a field (or a [`Maybe`]) is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldState {
    /// Never set.
    Absent,
    /// Explicitly set to null.
    Null,
    /// Set to a concrete value.
    Present,
}

impl FieldState {
    /// Whether there is a usable value (present and not null).
    #[inline]
    pub const fn has_value(self) -> bool {
        matches!(self, FieldState::Present)
    }

    /// Whether the field was set at all, to a value or to null.
    #[inline]
    pub const fn exists(self) -> bool {
        !matches!(self, FieldState::Absent)
    }
}

impl fmt::Display for FieldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldState::Absent => write!(f, "absent"),
            FieldState::Null => write!(f, "null"),
            FieldState::Present => write!(f, "present"),
        }
    }
}

/// A value that may be absent, null, or present.
///
/// This is the honest answer to "what is in this field": unlike a bare value,
/// it cannot pass a zero value off as a real one. Getting the value out of an
/// absent or null `Maybe` is an error ([`NodeError::InvalidUnbox`]).
///
/// ```
/// use schemanode_core::{Maybe, NodeError, FieldState};
///
/// let name = Maybe::Present("ada");
/// assert_eq!(name.unbox(), Ok("ada"));
///
/// let nothing: Maybe<&str> = Maybe::Null;
/// assert_eq!(nothing.unbox(), Err(NodeError::InvalidUnbox { state: FieldState::Null }));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Maybe<T> {
    /// Never set.
    #[default]
    Absent,
    /// Explicitly set to null.
    Null,
    /// Set to a concrete value.
    Present(T),
}

impl<T> Maybe<T> {
    /// Pairs a field state with the value stored for it.
    ///
    /// `value` is dropped unless `state` is [`FieldState::Present`].
    #[inline]
    pub fn from_state(state: FieldState, value: T) -> Self {
        match state {
            FieldState::Absent => Maybe::Absent,
            FieldState::Null => Maybe::Null,
            FieldState::Present => Maybe::Present(value),
        }
    }

    /// The state, without the value.
    #[inline]
    pub const fn state(&self) -> FieldState {
        match self {
            Maybe::Absent => FieldState::Absent,
            Maybe::Null => FieldState::Null,
            Maybe::Present(_) => FieldState::Present,
        }
    }

    /// Whether the value was set at all (to a value or to null).
    #[inline]
    pub const fn exists(&self) -> bool {
        !matches!(self, Maybe::Absent)
    }

    /// Whether this is [`Maybe::Absent`].
    #[inline]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Maybe::Absent)
    }

    /// Whether this is [`Maybe::Null`].
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Maybe::Null)
    }

    /// Whether this holds a concrete value.
    #[inline]
    pub const fn is_present(&self) -> bool {
        matches!(self, Maybe::Present(_))
    }

    /// Takes the value out.
    ///
    /// Fails with [`NodeError::InvalidUnbox`] when absent or null. Check the
    /// state first, or be ready for the error.
    #[inline]
    pub fn unbox(self) -> Result<T, NodeError> {
        match self {
            Maybe::Present(value) => Ok(value),
            other => Err(NodeError::InvalidUnbox {
                state: other.state(),
            }),
        }
    }

    /// `(true, value)` when present, `(false, zero value)` when absent or null.
    #[inline]
    pub fn exists_and_value(self) -> (bool, T)
    where
        T: Default,
    {
        match self {
            Maybe::Present(value) => (true, value),
            _ => (false, T::default()),
        }
    }

    /// The value, or the zero value when absent or null.
    #[inline]
    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        self.exists_and_value().1
    }

    /// Collapses null and absent into `None`.
    #[inline]
    pub fn into_option(self) -> Option<T> {
        match self {
            Maybe::Present(value) => Some(value),
            _ => None,
        }
    }

    /// Borrows the value, keeping the state.
    #[inline]
    pub const fn as_ref(&self) -> Maybe<&T> {
        match self {
            Maybe::Absent => Maybe::Absent,
            Maybe::Null => Maybe::Null,
            Maybe::Present(value) => Maybe::Present(value),
        }
    }

    /// Maps a present value, keeping absent and null as they are.
    #[inline]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Maybe<U> {
        match self {
            Maybe::Absent => Maybe::Absent,
            Maybe::Null => Maybe::Null,
            Maybe::Present(value) => Maybe::Present(f(value)),
        }
    }
}

impl<T: Clone> Maybe<&T> {
    /// Clones the borrowed value.
    #[inline]
    pub fn cloned(self) -> Maybe<T> {
        self.map(T::clone)
    }
}

impl<T: fmt::Display> fmt::Display for Maybe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Maybe::Absent => write!(f, "absent"),
            Maybe::Null => write!(f, "null"),
            Maybe::Present(value) => value.fmt(f),
        }
    }
}
