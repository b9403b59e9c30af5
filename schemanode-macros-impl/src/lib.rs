#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod emit;
mod parse;
mod policy;

pub use parse::{FieldDecl, NodeDecl, ParseError, parse_node, type_name};
pub use policy::FieldApi;

use proc_macro2::TokenStream;

/// Expands a `typed_node!` invocation into the node type, its content
/// assembler, and their trait impls.
///
/// Malformed input expands to a `compile_error!` pointing at the problem.
pub fn typed_node(input: TokenStream) -> TokenStream {
    match parse_node(input) {
        Ok(decl) => emit::emit(&decl),
        Err(err) => err.to_compile_error(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    #[test]
    fn bad_input_becomes_compile_error() {
        let out = typed_node(quote! { struct A { #[node(sometimes)] a: u8 } }).to_string();
        insta::assert_snapshot!(
            out,
            @r#":: core :: compile_error ! ("unknown field option `sometimes`, expected `optional` or `nullable`") ;"#
        );
    }
}
