//! Code generation for a parsed node declaration.

use proc_macro2::{Ident, Literal, TokenStream};
use quote::{format_ident, quote};
use schemanode_core::FieldProfile;

use crate::parse::{FieldDecl, NodeDecl, type_name};
use crate::policy::FieldApi;

fn profile_tokens(profile: FieldProfile) -> TokenStream {
    match profile {
        FieldProfile::Required => quote!(::schemanode::FieldProfile::Required),
        FieldProfile::Optional => quote!(::schemanode::FieldProfile::Optional),
        FieldProfile::Nullable => quote!(::schemanode::FieldProfile::Nullable),
        FieldProfile::OptionalNullable => quote!(::schemanode::FieldProfile::OptionalNullable),
    }
}

fn doc(text: String) -> TokenStream {
    quote!(#[doc = #text])
}

/// Per-field pieces of the generated code.
struct FieldCode {
    node_field: TokenStream,
    content_field: TokenStream,
    content_init: TokenStream,
    take: TokenStream,
    consts: TokenStream,
    getters: TokenStream,
    setters: TokenStream,
    view_arm: TokenStream,
}

fn emit_field(decl: &NodeDecl, index: usize, field: &FieldDecl, consts: &Ident) -> FieldCode {
    let api = FieldApi::for_profile(field.profile);
    let FieldDecl { docs, name, ty, .. } = field;
    let node_name = decl.name.to_string();
    let field_name = field.name_str();
    let idx = Literal::usize_unsuffixed(index);
    let slot = format_ident!("SLOT_{}", index);
    let null_slot = format_ident!("NULL_{}", index);
    let maybe_getter = format_ident!("maybe_{}", field_name);
    let set = format_ident!("set_{}", field_name);
    let set_null = format_ident!("set_{}_null", field_name);
    let set_maybe = format_ident!("set_maybe_{}", field_name);

    let mut consts_code = TokenStream::new();
    if !api.contains(FieldApi::ALWAYS_SET) {
        consts_code.extend(quote! {
            pub(super) const #slot: ::schemanode::Slot = LAYOUT.slot(#idx);
        });
    }
    if api.contains(FieldApi::SET_NULL) {
        consts_code.extend(quote! {
            pub(super) const #null_slot: ::schemanode::NullableSlot = LAYOUT.nullable_slot(#idx);
        });
    }

    let (content_field, content_init, take) = if api.contains(FieldApi::ALWAYS_SET) {
        (
            quote!(#name: ::core::option::Option<#ty>),
            quote!(#name: ::core::option::Option::None),
            quote! {
                #name: self.#name.take().ok_or(::schemanode::NodeError::MissingRequiredField {
                    node: #node_name,
                    field: #field_name,
                })?
            },
        )
    } else {
        (
            quote!(#name: #ty),
            quote!(#name: ::core::default::Default::default()),
            quote!(#name: ::core::mem::take(&mut self.#name)),
        )
    };

    let mut getters = TokenStream::new();
    if api.contains(FieldApi::GET_PLAIN) {
        getters.extend(quote! {
            #(#docs)*
            #[inline]
            pub fn #name(&self) -> &#ty {
                &self.#name
            }
        });
    }
    if api.contains(FieldApi::GET_TUPLE) {
        let text = format!(
            " `(true, value)` when `{field_name}` is present; `(false, zero value)` when it is absent or null."
        );
        let tuple_doc = doc(text);
        getters.extend(quote! {
            #(#docs)*
            #[doc = ""]
            #tuple_doc
            #[inline]
            pub fn #name(&self) -> (bool, &#ty) {
                (self.__presence.state(#consts::#slot).has_value(), &self.#name)
            }
        });
    }
    if api.contains(FieldApi::GET_MAYBE) {
        let maybe_doc = doc(format!(" `{field_name}` with its state: absent, null, or present."));
        getters.extend(quote! {
            #maybe_doc
            #[inline]
            pub fn #maybe_getter(&self) -> ::schemanode::Maybe<&#ty> {
                ::schemanode::Maybe::from_state(self.__presence.state(#consts::#slot), &self.#name)
            }
        });
    }

    let mut setters = TokenStream::new();
    let set_doc = doc(format!(" Sets `{field_name}`. A later set replaces this value."));
    if api.contains(FieldApi::ALWAYS_SET) {
        setters.extend(quote! {
            #set_doc
            #[doc = ""]
            #(#docs)*
            pub fn #set(&mut self, value: #ty) -> &mut Self {
                self.#name = ::core::option::Option::Some(value);
                self.__assembly.assign(#idx);
                self
            }
        });
    } else {
        setters.extend(quote! {
            #set_doc
            #[doc = ""]
            #(#docs)*
            pub fn #set(&mut self, value: #ty) -> &mut Self {
                self.#name = value;
                self.__presence.mark_present(#consts::#slot);
                self.__assembly.assign(#idx);
                self
            }
        });
    }
    if api.contains(FieldApi::SET_NULL) {
        let null_doc = doc(format!(" Sets `{field_name}` to null."));
        setters.extend(quote! {
            #null_doc
            pub fn #set_null(&mut self) -> &mut Self {
                self.#name = ::core::default::Default::default();
                self.__presence.mark_null(#consts::#null_slot);
                self.__assembly.assign(#idx);
                self
            }
        });
    }
    if api.contains(FieldApi::SET_MAYBE) {
        let null_arm = if api.contains(FieldApi::SET_NULL) {
            quote!(::core::result::Result::Ok(self.#set_null()))
        } else {
            quote! {
                ::core::result::Result::Err(::schemanode::NodeError::InvalidField {
                    node: #node_name,
                    field: #field_name,
                    reason: ::schemanode::InvalidFieldReason::NotNullable,
                })
            }
        };
        let absent = if api.contains(FieldApi::ALWAYS_SET) {
            quote! {
                self.#name = ::core::option::Option::None;
            }
        } else {
            quote! {
                self.#name = ::core::default::Default::default();
                self.__presence.mark_absent(#consts::#slot);
            }
        };
        let maybe_doc = doc(format!(
            " Sets `{field_name}` from a tri-state value. `Absent` un-assigns the field."
        ));
        setters.extend(quote! {
            #maybe_doc
            pub fn #set_maybe(
                &mut self,
                value: ::schemanode::Maybe<#ty>,
            ) -> ::core::result::Result<&mut Self, ::schemanode::NodeError> {
                match value {
                    ::schemanode::Maybe::Present(value) => ::core::result::Result::Ok(self.#set(value)),
                    ::schemanode::Maybe::Null => #null_arm,
                    ::schemanode::Maybe::Absent => {
                        #absent
                        self.__assembly.unassign(#idx);
                        ::core::result::Result::Ok(self)
                    }
                }
            }
        });
    }

    let view_arm = if api.contains(FieldApi::GET_MAYBE) {
        quote! {
            #idx => ::core::option::Option::Some(
                self.#maybe_getter()
                    .map(|value| ::schemanode::FieldRef::new(schema, &schema.fields[#idx], value)),
            ),
        }
    } else {
        quote! {
            #idx => ::core::option::Option::Some(::schemanode::Maybe::Present(
                ::schemanode::FieldRef::new(schema, &schema.fields[#idx], &self.#name),
            )),
        }
    };

    FieldCode {
        node_field: quote!(#name: #ty),
        content_field,
        content_init,
        take,
        consts: consts_code,
        getters,
        setters,
        view_arm,
    }
}

/// Generates the node, its content assembler, their layout constants and
/// the `TypedNode`/`NodeContent` impls.
pub fn emit(decl: &NodeDecl) -> TokenStream {
    let NodeDecl {
        attrs,
        vis,
        name,
        content,
        fields,
    } = decl;
    let consts = format_ident!("__schemanode_{}", name);
    let node_name = name.to_string();
    let field_count = Literal::usize_unsuffixed(fields.len());

    let schemas = fields.iter().map(|field| {
        let field_name = field.name_str();
        let ty = type_name(&field.ty);
        let profile = profile_tokens(field.profile);
        quote!(::schemanode::FieldSchema::new(#field_name, #ty, #profile))
    });

    let code: Vec<FieldCode> = fields
        .iter()
        .enumerate()
        .map(|(index, field)| emit_field(decl, index, field, &consts))
        .collect();
    let node_fields = code.iter().map(|c| &c.node_field);
    let content_fields = code.iter().map(|c| &c.content_field);
    let content_inits = code.iter().map(|c| &c.content_init);
    let takes = code.iter().map(|c| &c.take);
    let field_consts = code.iter().map(|c| &c.consts);
    let getters = code.iter().map(|c| &c.getters);
    let setters = code.iter().map(|c| &c.setters);
    let view_arms = code.iter().map(|c| &c.view_arm);

    let content_doc = doc(format!(
        " Mutable assembler for [`{node_name}`]. Set fields, then call `build` to freeze it."
    ));
    let content_fn_doc = doc(format!(" A fresh [`{content}`] with every field unset."));

    quote! {
        #[doc(hidden)]
        #[allow(non_snake_case)]
        mod #consts {
            pub(super) const FIELDS: [::schemanode::FieldSchema; #field_count] = [#(#schemas),*];
            pub(super) const SCHEMA: ::schemanode::NodeSchema =
                ::schemanode::NodeSchema::new(#node_name, &FIELDS);
            pub(super) const SLOTS: [::schemanode::Slot; #field_count] =
                ::schemanode::PresenceLayout::compute::<#field_count>(&SCHEMA);
            pub(super) const LAYOUT: ::schemanode::PresenceLayout =
                ::schemanode::PresenceLayout::new(&SCHEMA, &SLOTS);
            #(#field_consts)*
        }

        #(#attrs)*
        #vis struct #name {
            #(#node_fields,)*
            __presence: ::schemanode::PresenceWord,
        }

        impl #name {
            #content_fn_doc
            #[inline]
            pub fn content() -> #content {
                <#content as ::core::default::Default>::default()
            }

            #(#getters)*
        }

        impl ::schemanode::TypedNode for #name {
            type Content = #content;

            const SCHEMA: &'static ::schemanode::NodeSchema = &#consts::SCHEMA;
            const LAYOUT: &'static ::schemanode::PresenceLayout = &#consts::LAYOUT;

            fn field_at(
                &self,
                index: usize,
            ) -> ::core::option::Option<::schemanode::Maybe<::schemanode::FieldRef<'_>>> {
                let schema: &'static ::schemanode::NodeSchema = <Self as ::schemanode::TypedNode>::SCHEMA;
                match index {
                    #(#view_arms)*
                    _ => {
                        let _ = schema;
                        ::core::option::Option::None
                    }
                }
            }
        }

        #content_doc
        #vis struct #content {
            #(#content_fields,)*
            __presence: ::schemanode::PresenceWord,
            __assembly: ::schemanode::AssemblyState,
        }

        impl ::core::default::Default for #content {
            fn default() -> Self {
                Self {
                    #(#content_inits,)*
                    __presence: ::schemanode::PresenceWord::new(),
                    __assembly: ::schemanode::AssemblyState::new(#field_count),
                }
            }
        }

        impl #content {
            #content_fn_doc
            #[inline]
            pub fn new() -> Self {
                <Self as ::core::default::Default>::default()
            }

            #(#setters)*

            /// Freezes the assembled fields into an immutable node.
            ///
            /// Fails if an always-present field was never set, leaving the
            /// assembler as it was. Once a node was built, the assembler is
            /// spent and building again fails.
            pub fn build(&mut self) -> ::core::result::Result<#name, ::schemanode::NodeError> {
                self.__assembly.freeze(&#consts::SCHEMA)?;
                ::core::result::Result::Ok(#name {
                    #(#takes,)*
                    __presence: self.__presence,
                })
            }
        }

        impl ::schemanode::NodeContent for #content {
            type Node = #name;

            fn build(&mut self) -> ::core::result::Result<#name, ::schemanode::NodeError> {
                #content::build(self)
            }
        }
    }
}
