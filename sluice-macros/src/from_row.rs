use crate::column_name::column_name;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Fields, ItemStruct, Type};

/// `Option<T>` fields may be absent from the row.
fn is_option(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    path.qself.is_none()
        && path
            .path
            .segments
            .last()
            .is_some_and(|s| s.ident == "Option")
}

pub(crate) fn from_row(item: &ItemStruct) -> TokenStream {
    let Fields::Named(fields) = &item.fields else {
        panic!(
            "FromRow can only be derived for structs with named fields, `{}` is not",
            item.ident
        );
    };
    let name = &item.ident;
    let (impl_generics, ty_generics, where_clause) = item.generics.split_for_impl();
    let idents: Vec<_> = fields
        .named
        .iter()
        .map(|f| f.ident.clone().expect("Field is expected to have a name"))
        .collect();
    let types: Vec<_> = fields.named.iter().map(|f| &f.ty).collect();
    let columns: Vec<_> = fields.named.iter().map(column_name).collect();
    let holders = idents.iter().zip(&types).map(|(ident, ty)| {
        quote! {
            let mut #ident: ::std::option::Option<#ty> = ::std::option::Option::None;
        }
    });
    let assignments = idents
        .iter()
        .zip(&types)
        .zip(&columns)
        .map(|((ident, ty), column)| {
            quote! {
                if __n__ == #column {
                    #ident = ::std::option::Option::Some(
                        <#ty as ::sluice::AsValue>::try_from_value(__v__)
                            .map_err(|e| e.context(format!("While decoding the column `{}`", #column)))?,
                    );
                    continue;
                }
            }
        });
    let result = idents.iter().zip(&types).zip(&columns).map(|((ident, ty), column)| {
        if is_option(ty) {
            return quote! { #ident: #ident.flatten() };
        }
        quote! {
            #ident: #ident.ok_or_else(|| ::sluice::Error::msg(format!(
                "Column `{}` does not exist in the row provided",
                #column
            )))?
        }
    });
    quote! {
        impl #impl_generics ::sluice::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: ::sluice::RowLabeled) -> ::sluice::Result<Self> {
                #(#holders)*
                for (__n__, __v__) in ::std::iter::zip(row.labels.iter(), row.values.into_vec()) {
                    #(#assignments)*
                }
                ::std::result::Result::Ok(Self {
                    #(#result,)*
                })
            }
        }
        impl #impl_generics ::sluice::DescribeFields for #name #ty_generics #where_clause {
            fn fields() -> ::sluice::Fields {
                ::sluice::Fields::new([
                    #(::sluice::Field::of::<#types>(#columns)),*
                ])
            }
        }
    }
}
