//! Procedural macros for domglue
//!
//! - `#[derive(Marshal)]`: converts a struct into a foreign object, one
//!   property per field, in declaration order.
//!
//! Field attributes:
//!
//! - `#[js(name = "...")]`: property name override
//! - `#[js(skip)]`: leave the field out
//!
//! Without `#[js(name)]`, a `#[serde(rename = "...")]` on the field is
//! honoured, so types that already derive `Serialize` keep their wire names.

use proc_macro::TokenStream;

mod crate_paths;
mod marshal_derive;

/// Derives `Marshal` for a struct.
///
/// Named structs become objects, tuple structs become arrays and unit
/// structs become `null`, as they do through serde. Enums and unions are
/// rejected.
///
/// # Example
///
/// ```ignore
/// use domglue::Marshal;
///
/// #[derive(Marshal)]
/// struct Config {
///     name: String,
///     values: Vec<i32>,
///     #[js(name = "maxRetries")]
///     max_retries: u32,
///     #[js(skip)]
///     cache: Vec<u8>,
/// }
/// ```
#[proc_macro_derive(Marshal, attributes(js, serde))]
pub fn derive_marshal(input: TokenStream) -> TokenStream {
	marshal_derive::derive(input)
}
