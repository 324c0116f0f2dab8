mod column_name;
mod from_row;

use from_row::from_row;
use proc_macro::TokenStream;
use syn::{ItemStruct, parse_macro_input};

/// Implements `FromRow` and `DescribeFields` for a struct with named fields.
///
/// Each field is read from the column with the same name, `#[column_name("...")]` overrides it.
#[proc_macro_derive(FromRow, attributes(column_name))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    from_row(&item).into()
}
