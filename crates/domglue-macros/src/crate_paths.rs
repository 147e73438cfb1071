//! Resolution of the domglue crate path using proc_macro_crate
//!
//! Generated code has to name the crate that defines `Marshal`. Users may
//! depend on the `domglue` facade, on `domglue-core` directly, or be inside
//! `domglue-core` itself.

use proc_macro2::{Span, TokenStream};
use quote::quote;

/// Returns the path under which `marshal::Marshal` is reachable.
///
/// # Strategy
///
/// 1. `domglue-core` as a dependency (or itself, through its
///    `extern crate self as domglue_core`): `::domglue_core`
/// 2. `domglue` facade: `::domglue`
/// 3. Fallback: `::domglue`
pub(crate) fn get_domglue_crate() -> TokenStream {
	use proc_macro_crate::{FoundCrate, crate_name};

	match crate_name("domglue-core") {
		Ok(FoundCrate::Itself) => return quote!(::domglue_core),
		Ok(FoundCrate::Name(name)) => {
			let ident = syn::Ident::new(&name, Span::call_site());
			return quote!(::#ident);
		}
		Err(_) => {}
	}

	match crate_name("domglue") {
		Ok(FoundCrate::Itself) => quote!(crate),
		Ok(FoundCrate::Name(name)) => {
			let ident = syn::Ident::new(&name, Span::call_site());
			quote!(::#ident)
		}
		Err(_) => quote!(::domglue),
	}
}
