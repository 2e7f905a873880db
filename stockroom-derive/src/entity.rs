use proc_macro::TokenStream;
use quote::quote;
use syn::{DataStruct, DeriveInput, Fields, GenericArgument, LitStr, PathArguments, Result, Type};

pub(crate) fn generate_entity_for_struct(
    ast: &DeriveInput,
    data: &DataStruct,
) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let mut collection = name.to_string();
    let mut id_field_name = "id".to_string();

    for attr in &ast.attrs {
        if attr.path().is_ident("entity") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("collection") {
                    let s: LitStr = meta.value()?.parse()?;
                    collection = s.value();
                    Ok(())
                } else if meta.path.is_ident("id") {
                    let s: LitStr = meta.value()?.parse()?;
                    id_field_name = s.value();
                    Ok(())
                } else {
                    Err(meta.error("Unknown entity attribute, expected `collection` or `id`"))
                }
            })?;
        }
    }

    if collection.is_empty()
        || !collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(syn::Error::new_spanned(
            ast,
            format!("Invalid collection name {:?}", collection),
        ));
    }

    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            ast,
            format!(
                "Failed to derive Entity for struct '{}': only structs with named fields are supported",
                name
            ),
        ));
    };

    let id_field = fields
        .named
        .iter()
        .find(|field| field.ident.as_ref().is_some_and(|ident| ident == &id_field_name))
        .ok_or_else(|| {
            syn::Error::new_spanned(ast, format!("Field {} not found in struct", id_field_name))
        })?;

    if !is_option(&id_field.ty) {
        return Err(syn::Error::new_spanned(
            &id_field.ty,
            "The id field must be an Option<RecordId>",
        ));
    }

    let id_ident = &id_field.ident;
    let gen = quote! {
        impl #impl_generics stockroom::model::Entity for #name #ty_generics #where_clause {
            const COLLECTION: &'static str = #collection;

            fn entity_id(&self) -> Option<stockroom::collection::RecordId> {
                self.#id_ident.clone()
            }

            fn set_entity_id(&mut self, id: stockroom::collection::RecordId) {
                self.#id_ident = Some(id);
            }
        }
    };

    Ok(TokenStream::from(gen))
}

fn is_option(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    path.path.segments.last().is_some_and(|segment| {
        segment.ident == "Option"
            && matches!(
                &segment.arguments,
                PathArguments::AngleBracketed(args)
                    if matches!(args.args.first(), Some(GenericArgument::Type(_)))
            )
    })
}
