#![recursion_limit = "128"]
//! # Stockroom Derive Macros
//!
//! ### `Entity`
//!
//! Derives `stockroom::model::Entity` for structs with named fields, so they
//! can be stored through a typed `Repository`.
//!
//! - `collection = "..."` names the collection (defaults to the struct name)
//! - `id = "..."` names the identifier field (defaults to `id`); it must be
//!   an `Option<RecordId>` serialized as `_id`
//!
//! ```rust,ignore
//! use serde::{Deserialize, Serialize};
//! use stockroom::collection::RecordId;
//! use stockroom_derive::Entity;
//!
//! #[derive(Entity, Serialize, Deserialize)]
//! #[entity(collection = "locations", id = "id")]
//! pub struct Location {
//!     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
//!     pub id: Option<RecordId>,
//!     pub code: String,
//! }
//! ```

extern crate proc_macro;
mod entity;

use crate::entity::generate_entity_for_struct;
use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Struct(ref data) => match generate_entity_for_struct(&ast, data) {
            Ok(token_stream) => token_stream,
            Err(e) => e.to_compile_error().into(),
        },
        Data::Enum(_) => syn::Error::new_spanned(
            &ast,
            "Cannot derive Entity for enums. Only structs are supported.",
        )
        .to_compile_error()
        .into(),
        Data::Union(_) => syn::Error::new_spanned(
            &ast,
            "Cannot derive Entity for unions. Only structs are supported.",
        )
        .to_compile_error()
        .into(),
    }
}
