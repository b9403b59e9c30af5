//! The traits every generated node pair implements, and the freeze protocol
//! shared by all content assemblers.

use core::any::{Any, type_name};
use core::fmt;

use crate::{FieldSchema, FieldSet, Maybe, NodeError, NodeSchema, PresenceLayout};

/// An immutable node produced by freezing its content assembler.
///
/// Implemented by the types `typed_node!` generates. Besides the typed
/// accessors generated per field, this trait gives a uniform, type-erased view
/// of the node: its field list, each field's profile, and each field's state
/// and value.
pub trait TypedNode: Sized + 'static {
    /// The mutable assembler that builds this node.
    type Content: NodeContent<Node = Self>;

    /// Field list, in declaration order.
    const SCHEMA: &'static NodeSchema;

    /// Presence bit assignment shared by the assembler and the accessors.
    const LAYOUT: &'static PresenceLayout;

    /// A fresh assembler with every field unset.
    fn content() -> Self::Content {
        Self::Content::default()
    }

    /// Type-erased view of the field at `index`, or `None` past the last field.
    fn field_at(&self, index: usize) -> Option<Maybe<FieldRef<'_>>>;

    /// Type-erased view of the field at `index`.
    fn field(&self, index: usize) -> Result<Maybe<FieldRef<'_>>, NodeError> {
        self.field_at(index)
            .ok_or(NodeError::FieldIndexOutOfBounds {
                node: Self::SCHEMA.name,
                index,
                field_count: Self::SCHEMA.field_count(),
            })
    }

    /// Type-erased view of the field called `name`.
    fn lookup(&self, name: &str) -> Result<Maybe<FieldRef<'_>>, NodeError> {
        let index = Self::SCHEMA.index_of(name)?;
        self.field(index)
    }

    /// Every field, in declaration order.
    fn fields(&self) -> Fields<'_, Self> {
        Fields {
            node: self,
            index: 0,
        }
    }

    /// Number of fields that are not absent (null fields count).
    fn length(&self) -> usize {
        self.fields().filter(|(_, value)| value.exists()).count()
    }
}

/// A mutable assembler that freezes into a [`TypedNode`].
pub trait NodeContent: Default {
    /// The node this assembler produces.
    type Node: TypedNode<Content = Self>;

    /// Validates the assembled fields and moves them into an immutable node.
    ///
    /// Fails with [`NodeError::MissingRequiredField`] if an always-present field
    /// was never assigned; the assembler is then left untouched and may be fixed
    /// and built again. After a successful build the assembler is spent, and
    /// building again fails with [`NodeError::AlreadyFrozen`].
    fn build(&mut self) -> Result<Self::Node, NodeError>;
}

/// Iterator over the fields of a node, see [`TypedNode::fields`].
pub struct Fields<'a, N: TypedNode> {
    node: &'a N,
    index: usize,
}

impl<'a, N: TypedNode> Iterator for Fields<'a, N> {
    type Item = (&'static FieldSchema, Maybe<FieldRef<'a>>);

    fn next(&mut self) -> Option<Self::Item> {
        let schema = N::SCHEMA.fields.get(self.index)?;
        let value = self.node.field_at(self.index)?;
        self.index += 1;
        Some((schema, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = N::SCHEMA.field_count().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<N: TypedNode> ExactSizeIterator for Fields<'_, N> {}

/// A borrowed, type-erased field value.
#[derive(Clone, Copy)]
pub struct FieldRef<'a> {
    node: &'static NodeSchema,
    field: &'static FieldSchema,
    value: &'a dyn Any,
}

impl<'a> FieldRef<'a> {
    /// Wraps the value of `field`, a field of `node`.
    pub fn new(node: &'static NodeSchema, field: &'static FieldSchema, value: &'a dyn Any) -> Self {
        Self { node, field, value }
    }

    /// Schema of the field this value belongs to.
    pub fn schema(&self) -> &'static FieldSchema {
        self.field
    }

    /// Whether the value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// The value as a `T`, or [`NodeError::WrongType`].
    pub fn get<T: Any>(&self) -> Result<&'a T, NodeError> {
        self.value
            .downcast_ref::<T>()
            .ok_or(NodeError::WrongType {
                node: self.node.name,
                field: self.field.name,
                expected: type_name::<T>(),
                actual: self.field.type_name,
            })
    }
}

impl fmt::Debug for FieldRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FieldRef({}.{}: {})",
            self.node.name, self.field.name, self.field.type_name
        )
    }
}

/// Assembler-side bookkeeping: which fields were assigned, and whether the
/// assembler was already frozen.
///
/// Generated content types embed one of these. It is never copied into the node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssemblyState {
    assigned: FieldSet,
    frozen: bool,
}

impl AssemblyState {
    /// State for an assembler of `field_count` fields, none assigned.
    pub fn new(field_count: usize) -> Self {
        Self {
            assigned: FieldSet::new(field_count),
            frozen: false,
        }
    }

    /// Records that field `index` was given a value or null.
    #[inline]
    pub fn assign(&mut self, index: usize) {
        self.assigned.set(index);
    }

    /// Records that field `index` was reset to absent.
    #[inline]
    pub fn unassign(&mut self, index: usize) {
        self.assigned.unset(index);
    }

    /// Whether field `index` was assigned.
    #[inline]
    pub fn is_assigned(&self, index: usize) -> bool {
        self.assigned.get(index)
    }

    /// Whether a node was already built from this assembler.
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Validates the assembly against `schema` and marks it frozen.
    ///
    /// Nothing changes on failure. Generated `build` methods call this before
    /// moving any field out, so a failed freeze leaves the assembler intact.
    pub fn freeze(&mut self, schema: &'static NodeSchema) -> Result<(), NodeError> {
        if self.frozen {
            crate::debug!("{}: build called on a frozen assembler", schema.name);
            return Err(NodeError::AlreadyFrozen { node: schema.name });
        }
        schema.check_assigned(&self.assigned)?;
        self.frozen = true;
        crate::trace!("{}: content frozen", schema.name);
        Ok(())
    }
}
