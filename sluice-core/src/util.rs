use std::fmt::{self, Display};

pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Displays at most 497 bytes of a query, cut on a character boundary.
pub struct TruncateLong<'a>(pub &'a str);

impl Display for TruncateLong<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const LIMIT: usize = 497;
        if self.0.len() <= LIMIT {
            return f.write_str(self.0.trim_end());
        }
        let end = (0..=LIMIT)
            .rev()
            .find(|i| self.0.is_char_boundary(*i))
            .unwrap_or_default();
        write!(f, "{}...", self.0[..end].trim_end())
    }
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        $crate::TruncateLong(::std::convert::AsRef::<str>::as_ref(&$query))
    };
}
