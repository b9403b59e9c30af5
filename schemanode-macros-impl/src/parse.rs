//! Parsing of `typed_node!` input.
//!
//! The grammar is a plain struct declaration whose fields carry
//! `#[node(optional)]` / `#[node(nullable)]` markers:
//!
//! ```text
//! (#[attr])* vis struct Name {
//!     ((#[doc ..] | #[node(optional, nullable)])* field: Type,)*
//! }
//! ```
//!
//! The struct itself may carry `#[node(content = Name)]` to rename the
//! generated assembler.

use proc_macro2::{Delimiter, Ident, Span, TokenStream, TokenTree};
use quote::{format_ident, quote_spanned};
use schemanode_core::FieldProfile;
use unsynn::{
    Any, Assign, BraceGroup, BracketGroup, Colon, Comma, CommaDelimitedVec, Cons, Either,
    EndOfStream, Except, Gt, Lt, ParenthesisGroup, ParenthesisGroupContaining, Parse, Pound,
    RArrow, ToTokens, TokenIter, keyword, unsynn,
};

use crate::FieldApi;

/// A parsed node declaration.
pub struct NodeDecl {
    /// Attributes forwarded to the node struct (derives, docs, ...).
    pub attrs: Vec<TokenStream>,
    /// Visibility of both generated types.
    pub vis: TokenStream,
    /// Name of the immutable node type.
    pub name: Ident,
    /// Name of the mutable assembler type.
    pub content: Ident,
    /// Fields in declaration order.
    pub fields: Vec<FieldDecl>,
}

/// A parsed field.
pub struct FieldDecl {
    /// `#[doc = ..]` attributes, forwarded to the field's accessors.
    pub docs: Vec<TokenStream>,
    /// Field name.
    pub name: Ident,
    /// Field type, as written.
    pub ty: TokenStream,
    /// Optionality profile derived from the `#[node(..)]` markers.
    pub profile: FieldProfile,
}

impl FieldDecl {
    /// Field name without any `r#` prefix.
    pub fn name_str(&self) -> String {
        let name = self.name.to_string();
        match name.strip_prefix("r#") {
            Some(unraw) => unraw.to_owned(),
            None => name,
        }
    }

    /// Methods generated for this field, on the node and on its content.
    pub(crate) fn generated_methods(&self) -> (Vec<String>, Vec<String>) {
        let name = self.name_str();
        let api = FieldApi::for_profile(self.profile);
        let mut node = vec![name.clone()];
        if api.contains(FieldApi::GET_MAYBE) {
            node.push(format!("maybe_{name}"));
        }
        let mut content = vec![format!("set_{name}"), format!("set_maybe_{name}")];
        if api.contains(FieldApi::SET_NULL) {
            content.push(format!("set_{name}_null"));
        }
        (node, content)
    }
}

/// A parse failure, reported as a `compile_error!` at `span`.
#[derive(Debug)]
pub struct ParseError {
    span: Span,
    message: String,
}

impl ParseError {
    fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Turns the error into tokens that fail compilation with the message.
    pub fn to_compile_error(&self) -> TokenStream {
        let message = &self.message;
        quote_spanned! {self.span=>
            ::core::compile_error!(#message);
        }
    }
}

keyword! {
    KStruct = "struct";
    KPub = "pub";
    KNode = "node";
    KDoc = "doc";
    KDerive = "derive";
}

unsynn! {
    /// `#[...]`
    struct OuterAttr {
        _pound: Pound,
        body: BracketGroup,
    }

    /// `pub` or `pub(..)`
    struct Visibility {
        _pub: KPub,
        restriction: Option<ParenthesisGroup>,
    }

    /// The inside of `#[node(..)]`.
    struct NodeAttr {
        _node: KNode,
        options: ParenthesisGroupContaining<CommaDelimitedVec<NodeOption>>,
    }

    /// `optional`, `nullable` or `content = Name`
    struct NodeOption {
        key: Ident,
        value: Option<Cons<Assign, Ident>>,
    }

    /// `derive(..)`
    struct DeriveAttr {
        _derive: KDerive,
        traits: ParenthesisGroup,
    }

    /// A token tree, or a whole `<..>` run so that its commas stay inside the type.
    struct AngleTokenTree(
        Either<RArrow, Cons<Lt, Vec<Cons<Except<Gt>, AngleTokenTree>>, Gt>, TokenTree>,
    );

    /// Type tokens up to the next top-level comma.
    struct FieldType {
        tokens: Any<Cons<Except<Comma>, AngleTokenTree>>,
    }

    /// `(#[..])* vis? name: Type ,?`
    struct FieldDef {
        attrs: Any<OuterAttr>,
        vis: Option<Visibility>,
        name: Ident,
        _colon: Colon,
        ty: FieldType,
        _comma: Option<Comma>,
    }
}

impl OuterAttr {
    fn span(&self) -> Span {
        self.body.0.span()
    }

    fn to_stream(&self) -> TokenStream {
        self.to_token_stream()
    }

    fn is_doc(&self) -> bool {
        KDoc::parse(&mut self.body.0.stream().to_token_iter()).is_ok()
    }

    /// The options of a `#[node(..)]` attribute, `None` for any other attribute.
    fn node_options(&self) -> Result<Option<Vec<NodeOption>>, ParseError> {
        let stream = self.body.0.stream();
        if KNode::parse(&mut stream.to_token_iter()).is_err() {
            return Ok(None);
        }
        let attr = NodeAttr::parse_all(&mut stream.to_token_iter()).map_err(|_| {
            ParseError::new(
                self.span(),
                "expected `#[node(..)]` with a comma-separated option list",
            )
        })?;
        Ok(Some(
            attr.options
                .content
                .into_iter()
                .map(|delimited| delimited.value)
                .collect(),
        ))
    }

    fn derives_default(&self) -> bool {
        let Ok(derive) = DeriveAttr::parse_all(&mut self.body.0.stream().to_token_iter()) else {
            return false;
        };
        derive
            .traits
            .0
            .stream()
            .into_iter()
            .any(|tt| matches!(tt, TokenTree::Ident(ident) if ident == "Default"))
    }
}

/// Parses a `T` from `tokens`, reporting `expected {what}` at the offending token.
fn expect<T: Parse>(tokens: &mut TokenIter, what: &str, end: Span) -> Result<T, ParseError> {
    let at = tokens.clone().next();
    T::parse(tokens).map_err(|_| match at {
        Some(tt) => ParseError::new(tt.span(), format!("expected {what}, found `{tt}`")),
        None => ParseError::new(end, format!("expected {what}")),
    })
}

fn struct_options(options: Vec<NodeOption>) -> Result<Option<Ident>, ParseError> {
    let mut content = None;
    for option in options {
        match option.value {
            Some(Cons { second: name, .. }) if option.key == "content" => content = Some(name),
            _ => {
                return Err(ParseError::new(
                    option.key.span(),
                    format!("unknown node option `{}`, expected `content = Name`", option.key),
                ));
            }
        }
    }
    Ok(content)
}

fn field_profile(options: Vec<NodeOption>, optional: &mut bool, nullable: &mut bool) -> Result<(), ParseError> {
    for option in options {
        let flag = option.key;
        let slot = if flag == "optional" {
            &mut *optional
        } else if flag == "nullable" {
            &mut *nullable
        } else {
            return Err(ParseError::new(
                flag.span(),
                format!("unknown field option `{flag}`, expected `optional` or `nullable`"),
            ));
        };
        if option.value.is_some() {
            return Err(ParseError::new(flag.span(), format!("`{flag}` takes no value")));
        }
        if *slot {
            return Err(ParseError::new(flag.span(), format!("duplicate `{flag}`")));
        }
        *slot = true;
    }
    Ok(())
}

impl FieldDef {
    fn into_decl(self) -> Result<FieldDecl, ParseError> {
        let mut docs = Vec::new();
        let mut optional = false;
        let mut nullable = false;
        for attr in self.attrs.iter().map(|attr| &attr.value) {
            if let Some(options) = attr.node_options()? {
                field_profile(options, &mut optional, &mut nullable)?;
            } else if attr.is_doc() {
                docs.push(attr.to_stream());
            } else {
                return Err(ParseError::new(
                    attr.span(),
                    "only doc comments and `#[node(..)]` are allowed on typed node fields",
                ));
            }
        }

        if self.vis.is_some() {
            return Err(ParseError::new(
                self.name.span(),
                "typed node fields are private; read them through the generated accessors",
            ));
        }

        let ty = self.ty.to_token_stream();
        if ty.is_empty() {
            return Err(ParseError::new(
                self.name.span(),
                format!("expected a type for field `{}`", self.name),
            ));
        }

        Ok(FieldDecl {
            docs,
            name: self.name,
            ty,
            profile: FieldProfile::new(optional, nullable),
        })
    }
}

/// Rejects fields whose generated methods clash with each other or with the
/// fixed `content`, `new` and `build`.
fn check_generated_names(fields: &[FieldDecl]) -> Result<(), ParseError> {
    if let Some(field) = fields.iter().find(|f| f.name_str().starts_with("__")) {
        return Err(ParseError::new(
            field.name.span(),
            "field names starting with `__` are reserved for generated bookkeeping",
        ));
    }

    let mut node: Vec<(String, Option<&FieldDecl>)> = vec![("content".to_owned(), None)];
    let mut content: Vec<(String, Option<&FieldDecl>)> =
        vec![("new".to_owned(), None), ("build".to_owned(), None)];
    for field in fields {
        let (on_node, on_content) = field.generated_methods();
        node.extend(on_node.into_iter().map(|name| (name, Some(field))));
        content.extend(on_content.into_iter().map(|name| (name, Some(field))));
    }

    for methods in [&node, &content] {
        for (index, (method, owner)) in methods.iter().enumerate() {
            let Some((_, Some(other))) = methods[index + 1..].iter().find(|(m, _)| m == method) else {
                continue;
            };
            let message = match owner {
                None if method == "content" => {
                    "`content` is reserved for the node's assembler constructor".to_owned()
                }
                None => format!(
                    "field `{}` would generate `{method}`, which the assembler already defines",
                    other.name_str()
                ),
                Some(owner) => format!(
                    "fields `{}` and `{}` both generate `{method}`",
                    owner.name_str(),
                    other.name_str()
                ),
            };
            return Err(ParseError::new(other.name.span(), message));
        }
    }
    Ok(())
}

/// Parses the whole `typed_node!` input.
pub fn parse_node(input: TokenStream) -> Result<NodeDecl, ParseError> {
    let end = Span::call_site();
    let mut tokens = input.to_token_iter();

    let struct_attrs = expect::<Any<OuterAttr>>(&mut tokens, "attributes", end)?;
    let mut attrs = Vec::new();
    let mut content = None;
    for attr in struct_attrs.iter().map(|attr| &attr.value) {
        if let Some(options) = attr.node_options()? {
            if content.is_some() {
                return Err(ParseError::new(attr.span(), "duplicate `#[node(content = ..)]`"));
            }
            content = struct_options(options)?;
        } else if attr.derives_default() {
            return Err(ParseError::new(
                attr.span(),
                "typed nodes are only created by building their content; `Default` cannot be derived",
            ));
        } else {
            attrs.push(attr.to_stream());
        }
    }

    let vis = match Visibility::parse(&mut tokens) {
        Ok(vis) => vis.to_token_stream(),
        Err(_) => TokenStream::new(),
    };
    expect::<KStruct>(&mut tokens, "`struct`", end)?;
    let name = expect::<Ident>(&mut tokens, "a node name", end)?;
    if let Some(tt) = tokens.clone().next()
        && Lt::parse(&mut tokens).is_ok()
    {
        return Err(ParseError::new(tt.span(), "generic typed nodes are not supported"));
    }
    let body = expect::<BraceGroup>(&mut tokens, "`{` with the node's fields", end)?;
    if let Some(tt) = tokens.clone().next() {
        return Err(ParseError::new(tt.span(), "unexpected tokens after the node body"));
    }

    let body_end = body.0.span();
    let mut body = body.0.stream().to_token_iter();
    let mut fields: Vec<FieldDecl> = Vec::new();
    while tokens_remain(&body) {
        let field = expect::<FieldDef>(&mut body, "a field `name: Type`", body_end)?.into_decl()?;
        if fields.iter().any(|f| f.name_str() == field.name_str()) {
            return Err(ParseError::new(
                field.name.span(),
                format!("duplicate field `{}`", field.name_str()),
            ));
        }
        fields.push(field);
    }
    check_generated_names(&fields)?;

    let content = content.unwrap_or_else(|| format_ident!("{}Content", name));
    Ok(NodeDecl {
        attrs,
        vis,
        name,
        content,
        fields,
    })
}

fn tokens_remain(tokens: &TokenIter) -> bool {
    EndOfStream::parse(&mut tokens.clone()).is_err()
}

/// Renders type tokens the way a person would write them, e.g. `Vec<String>`.
pub fn type_name(ty: &TokenStream) -> String {
    let mut out = String::new();
    write_tokens(ty.clone(), &mut out);
    out
}

fn write_tokens(tokens: TokenStream, out: &mut String) {
    let mut prev_word = false;
    for tt in tokens {
        match tt {
            TokenTree::Ident(ident) => {
                if prev_word {
                    out.push(' ');
                }
                out.push_str(&ident.to_string());
                prev_word = true;
            }
            TokenTree::Literal(lit) => {
                if prev_word {
                    out.push(' ');
                }
                out.push_str(&lit.to_string());
                prev_word = true;
            }
            TokenTree::Punct(p) => {
                out.push(p.as_char());
                if p.as_char() == ',' || p.as_char() == ';' {
                    out.push(' ');
                }
                prev_word = false;
            }
            TokenTree::Group(group) => {
                let (open, close) = match group.delimiter() {
                    Delimiter::Parenthesis => ("(", ")"),
                    Delimiter::Bracket => ("[", "]"),
                    Delimiter::Brace => ("{", "}"),
                    Delimiter::None => ("", ""),
                };
                out.push_str(open);
                write_tokens(group.stream(), out);
                out.push_str(close);
                prev_word = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    #[test]
    fn parses_profiles_in_declaration_order() {
        let decl = parse_node(quote! {
            /// A record.
            #[derive(Debug, Clone, PartialEq)]
            pub struct Record {
                /// Always there.
                f1: String,
                #[node(optional)]
                f2: String,
                #[node(optional, nullable)]
                f3: String,
                #[node(nullable)]
                f4: String,
            }
        })
        .unwrap();

        assert_eq!(decl.name.to_string(), "Record");
        assert_eq!(decl.content.to_string(), "RecordContent");
        assert_eq!(decl.vis.to_string(), "pub");
        assert_eq!(decl.attrs.len(), 2);
        let profiles: Vec<_> = decl.fields.iter().map(|f| (f.name_str(), f.profile)).collect();
        assert_eq!(
            profiles,
            [
                ("f1".to_owned(), FieldProfile::Required),
                ("f2".to_owned(), FieldProfile::Optional),
                ("f3".to_owned(), FieldProfile::OptionalNullable),
                ("f4".to_owned(), FieldProfile::Nullable),
            ]
        );
        assert_eq!(decl.fields[0].docs.len(), 1);
    }

    #[test]
    fn content_name_can_be_overridden() {
        let decl = parse_node(quote! {
            #[node(content = RecordBuilder)]
            pub(crate) struct Record { id: u64 }
        })
        .unwrap();
        assert_eq!(decl.content.to_string(), "RecordBuilder");
        assert_eq!(decl.vis.to_string(), "pub (crate)");
    }

    #[test]
    fn generic_field_types_keep_their_commas() {
        let decl = parse_node(quote! {
            struct Index {
                entries: std::collections::BTreeMap<String, Vec<u8>>,
                #[node(optional)]
                callback: fn(u8) -> u8,
            }
        })
        .unwrap();
        assert_eq!(decl.fields.len(), 2);
        assert_eq!(
            type_name(&decl.fields[0].ty),
            "std::collections::BTreeMap<String, Vec<u8>>"
        );
        assert_eq!(type_name(&decl.fields[1].ty), "fn(u8)->u8");
    }

    #[test]
    fn arrows_inside_generics_do_not_close_them() {
        let decl = parse_node(quote! {
            struct Hooks {
                on_read: Box<dyn Fn(u8) -> u8 + Send>,
                pairs: Vec<(u8, u16)>,
            }
        })
        .unwrap();
        assert_eq!(decl.fields.len(), 2);
        assert_eq!(type_name(&decl.fields[0].ty), "Box<dyn Fn(u8)->u8+Send>");
        assert_eq!(type_name(&decl.fields[1].ty), "Vec<(u8, u16)>");
    }

    #[test]
    fn raw_field_names() {
        let decl = parse_node(quote! { struct Kw { r#type: String } }).unwrap();
        assert_eq!(decl.fields[0].name_str(), "type");
    }

    #[test]
    fn type_names() {
        assert_eq!(type_name(&quote!(&'static str)), "&'static str");
        assert_eq!(type_name(&quote!(Option<u32>)), "Option<u32>");
        assert_eq!(type_name(&quote!([u8; 32])), "[u8; 32]");
    }

    fn error_of(input: TokenStream) -> String {
        match parse_node(input) {
            Ok(_) => panic!("expected a parse error"),
            Err(err) => err.message().to_owned(),
        }
    }

    #[test]
    fn rejects_unknown_field_option() {
        assert_eq!(
            error_of(quote! { struct A { #[node(maybe)] a: u8 } }),
            "unknown field option `maybe`, expected `optional` or `nullable`"
        );
    }

    #[test]
    fn rejects_duplicate_option_and_field() {
        assert_eq!(
            error_of(quote! { struct A { #[node(optional, optional)] a: u8 } }),
            "duplicate `optional`"
        );
        assert_eq!(
            error_of(quote! { struct A { a: u8, a: u16 } }),
            "duplicate field `a`"
        );
    }

    #[test]
    fn rejects_public_fields_and_default() {
        assert_eq!(
            error_of(quote! { struct A { pub a: u8 } }),
            "typed node fields are private; read them through the generated accessors"
        );
        assert_eq!(
            error_of(quote! { #[derive(Debug, Default)] struct A { a: u8 } }),
            "typed nodes are only created by building their content; `Default` cannot be derived"
        );
    }

    #[test]
    fn rejects_names_that_clash_with_generated_methods() {
        assert_eq!(
            error_of(quote! { struct A { #[node(optional)] x: u8, maybe_x: u8 } }),
            "fields `x` and `maybe_x` both generate `maybe_x`"
        );
        assert_eq!(
            error_of(quote! { struct A { maybe_x: u8, x: u8 } }),
            "fields `maybe_x` and `x` both generate `set_maybe_x`"
        );
        assert_eq!(
            error_of(quote! { struct A { #[node(nullable)] x: u8, x_null: u8 } }),
            "fields `x` and `x_null` both generate `set_x_null`"
        );
        assert_eq!(
            error_of(quote! { struct A { content: u8 } }),
            "`content` is reserved for the node's assembler constructor"
        );
        assert_eq!(
            error_of(quote! { struct A { __presence: u64 } }),
            "field names starting with `__` are reserved for generated bookkeeping"
        );
    }

    #[test]
    fn unrelated_prefixes_are_accepted() {
        let decl = parse_node(quote! {
            struct A {
                set: u8,
                maybe: u8,
                #[node(optional)]
                x: u8,
                newest: u8,
                builder: u8,
            }
        })
        .unwrap();
        assert_eq!(decl.fields.len(), 5);
    }

    #[test]
    fn rejects_malformed_node_attributes() {
        assert_eq!(
            error_of(quote! { struct A { #[node(optional = yes)] a: u8 } }),
            "`optional` takes no value"
        );
        assert_eq!(
            error_of(quote! { struct A { #[node] a: u8 } }),
            "expected `#[node(..)]` with a comma-separated option list"
        );
        assert_eq!(
            error_of(quote! { #[node(builder = B)] struct A { a: u8 } }),
            "unknown node option `builder`, expected `content = Name`"
        );
        assert_eq!(
            error_of(quote! { struct A { #[serde(skip)] a: u8 } }),
            "only doc comments and `#[node(..)]` are allowed on typed node fields"
        );
    }

    #[test]
    fn rejects_generics_and_missing_struct() {
        assert_eq!(
            error_of(quote! { struct A<T> { a: T } }),
            "generic typed nodes are not supported"
        );
        assert_eq!(
            error_of(quote! { enum A { B } }),
            "expected `struct`, found `enum`"
        );
        assert_eq!(
            error_of(quote! { struct A { a: u8 } struct B {} }),
            "unexpected tokens after the node body"
        );
    }
}
