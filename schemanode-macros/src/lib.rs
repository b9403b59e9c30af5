#![doc = include_str!("../README.md")]

/// Declares a typed node and its content assembler. See the `schemanode`
/// crate for the syntax.
#[proc_macro]
pub fn typed_node(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    schemanode_macros_impl::typed_node(input.into()).into()
}
