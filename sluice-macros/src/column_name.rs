use syn::{Field, LitStr};

pub(crate) fn column_name(field: &Field) -> String {
    let default_name = field
        .ident
        .as_ref()
        .expect("Field is expected to have a name")
        .to_string();
    field
        .attrs
        .iter()
        .find_map(|attr| {
            if attr.meta.path().is_ident("column_name") {
                let Ok(v) = attr
                    .meta
                    .require_list()
                    .and_then(|v| v.parse_args::<LitStr>())
                else {
                    panic!(
                        "Error while parsing `column_name`, use it like #[column_name(\"{}\")]",
                        &default_name
                    );
                };
                return Some(v.value());
            }
            None
        })
        .unwrap_or(default_name)
}
