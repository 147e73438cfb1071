use crate::crate_paths::get_domglue_crate;
use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Result, parse_macro_input, parse_quote};

/// Per-field options from `#[js(...)]` and `#[serde(...)]`
#[derive(Debug, Default)]
struct FieldAttr {
	name: Option<String>,
	serde_rename: Option<String>,
	skip: bool,
}

impl FieldAttr {
	fn from_attrs(attrs: &[syn::Attribute]) -> Result<Self> {
		let mut parsed = Self::default();

		for attr in attrs {
			if attr.path().is_ident("js") {
				attr.parse_nested_meta(|meta| {
					if meta.path.is_ident("name") {
						let value: syn::LitStr = meta.value()?.parse()?;
						parsed.name = Some(value.value());
						Ok(())
					} else if meta.path.is_ident("skip") {
						parsed.skip = true;
						Ok(())
					} else {
						Err(meta.error("unsupported js attribute, expected `name` or `skip`"))
					}
				})?;
			} else if attr.path().is_ident("serde") {
				attr.parse_nested_meta(|meta| {
					if meta.path.is_ident("rename") {
						if meta.input.peek(syn::Token![=]) {
							let value: syn::LitStr = meta.value()?.parse()?;
							parsed.serde_rename = Some(value.value());
						} else {
							// rename(serialize = "..", deserialize = "..")
							meta.parse_nested_meta(|inner| {
								let value: syn::LitStr = inner.value()?.parse()?;
								if inner.path.is_ident("serialize") {
									parsed.serde_rename = Some(value.value());
								}
								Ok(())
							})?;
						}
					} else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
						parsed.skip = true;
					} else if meta.input.peek(syn::Token![=]) {
						meta.value()?.parse::<syn::Expr>()?;
					} else if !meta.input.is_empty() && !meta.input.peek(syn::Token![,]) {
						meta.input.parse::<proc_macro2::TokenTree>()?;
					}
					Ok(())
				})?;
			}
		}

		Ok(parsed)
	}
}

/// Derive Marshal implementation
pub(crate) fn derive(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let input = parse_macro_input!(input as DeriveInput);

	match derive_impl(input) {
		Ok(tokens) => tokens.into(),
		Err(err) => err.to_compile_error().into(),
	}
}

fn derive_impl(mut input: DeriveInput) -> Result<TokenStream> {
	let krate = get_domglue_crate();

	let fields = match &input.data {
		Data::Struct(data) => &data.fields,
		Data::Enum(data) => {
			return Err(syn::Error::new_spanned(
				data.enum_token,
				"Marshal cannot be derived for enums; implement it by hand or use to_dynamic",
			));
		}
		Data::Union(data) => {
			return Err(syn::Error::new_spanned(
				data.union_token,
				"Marshal cannot be derived for unions",
			));
		}
	};

	let body = match fields {
		Fields::Named(named) => {
			let mut sets = Vec::new();
			for field in &named.named {
				let attr = FieldAttr::from_attrs(&field.attrs)?;
				if attr.skip {
					continue;
				}
				let Some(ident) = &field.ident else {
					continue;
				};
				let key = attr
					.name
					.or(attr.serde_rename)
					.unwrap_or_else(|| ident.unraw().to_string());
				sets.push(quote! {
					object.set(#key, &self.#ident)?;
				});
			}
			quote! {
				let object = #krate::marshal::new_object()?;
				#(#sets)*
				::core::result::Result::Ok(object)
			}
		}
		Fields::Unnamed(unnamed) => {
			let mut sets = Vec::new();
			let mut position = 0usize;
			for (index, field) in unnamed.unnamed.iter().enumerate() {
				let attr = FieldAttr::from_attrs(&field.attrs)?;
				if attr.skip {
					continue;
				}
				let member = syn::Index::from(index);
				sets.push(quote! {
					array.set_index(#position, &self.#member)?;
				});
				position += 1;
			}
			quote! {
				let array = #krate::marshal::new_array()?;
				#(#sets)*
				::core::result::Result::Ok(array)
			}
		}
		Fields::Unit => quote! {
			::core::result::Result::Ok(#krate::value::DynamicValue::null())
		},
	};

	let type_params: Vec<_> = input.generics.type_params().map(|p| p.ident.clone()).collect();
	let where_clause = input.generics.make_where_clause();
	for param in type_params {
		where_clause
			.predicates
			.push(parse_quote!(#param: #krate::marshal::Marshal));
	}

	let name = &input.ident;
	let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

	Ok(quote! {
		impl #impl_generics #krate::marshal::Marshal for #name #ty_generics #where_clause {
			fn marshal(&self) -> #krate::error::Result<#krate::value::DynamicValue> {
				#body
			}
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn field_attr(field: syn::Field) -> FieldAttr {
		FieldAttr::from_attrs(&field.attrs).unwrap()
	}

	#[rstest]
	fn test_js_name_wins_over_serde_rename() {
		// Arrange
		let field: syn::Field = parse_quote! {
			#[serde(rename = "wire")]
			#[js(name = "dom")]
			value: u32
		};

		// Act
		let attr = field_attr(field);

		// Assert
		assert_eq!(attr.name.or(attr.serde_rename).as_deref(), Some("dom"));
	}

	#[rstest]
	fn test_serde_attributes_are_tolerated() {
		let field: syn::Field = parse_quote! {
			#[serde(default, rename(serialize = "out", deserialize = "in"), with = "module")]
			value: u32
		};
		let attr = field_attr(field);
		assert_eq!(attr.serde_rename.as_deref(), Some("out"));
		assert!(!attr.skip);
	}

	#[rstest]
	#[case(parse_quote!(#[js(skip)] cache: Vec<u8>))]
	#[case(parse_quote!(#[serde(skip)] cache: Vec<u8>))]
	#[case(parse_quote!(#[serde(skip_serializing)] cache: Vec<u8>))]
	fn test_skip(#[case] field: syn::Field) {
		assert!(field_attr(field).skip);
	}

	#[rstest]
	fn test_unknown_js_attribute_is_rejected() {
		let field: syn::Field = parse_quote!(#[js(rename = "x")] value: u32);
		assert!(FieldAttr::from_attrs(&field.attrs).is_err());
	}

	#[rstest]
	fn test_enum_is_rejected() {
		let input: DeriveInput = parse_quote! {
			enum Shape { Circle, Square }
		};
		let err = derive_impl(input).unwrap_err();
		assert!(err.to_string().contains("enums"));
	}

	#[rstest]
	fn test_unit_struct_is_null() {
		let input: DeriveInput = parse_quote! {
			struct Marker;
		};
		let tokens = derive_impl(input).unwrap().to_string();
		assert!(tokens.contains("DynamicValue :: null ()"));
		assert!(!tokens.contains("new_object"));
	}

	#[rstest]
	fn test_generic_struct_gets_marshal_bound() {
		let input: DeriveInput = parse_quote! {
			struct Pair<T> { left: T, right: T }
		};
		let tokens = derive_impl(input).unwrap().to_string();
		assert!(tokens.contains("T : :: domglue"));
		assert!(tokens.contains("\"left\""));
	}

	#[rstest]
	fn test_raw_identifier_is_unprefixed() {
		let input: DeriveInput = parse_quote! {
			struct Keyword { r#type: String }
		};
		let tokens = derive_impl(input).unwrap().to_string();
		assert!(tokens.contains("\"type\""));
		assert!(!tokens.contains("r#type\""));
	}
}
