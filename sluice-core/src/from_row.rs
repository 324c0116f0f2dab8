use crate::{Fields, Result, RowLabeled, Value};
use std::collections::{BTreeMap, HashMap};

/// Build a typed object from one labeled row.
///
/// Usually derived with `#[derive(FromRow)]`, which matches struct fields to column labels.
pub trait FromRow: Sized {
    fn from_row(row: RowLabeled) -> Result<Self>;
}

/// Types that know the field descriptor decoding their rows, derived together with `FromRow`.
pub trait DescribeFields {
    fn fields() -> Fields;
}

impl FromRow for RowLabeled {
    fn from_row(row: RowLabeled) -> Result<Self> {
        Ok(row)
    }
}

impl FromRow for BTreeMap<String, Value> {
    fn from_row(row: RowLabeled) -> Result<Self> {
        Ok(row.labels.iter().cloned().zip(row.values.into_vec()).collect())
    }
}

impl FromRow for HashMap<String, Value> {
    fn from_row(row: RowLabeled) -> Result<Self> {
        Ok(row.labels.iter().cloned().zip(row.values.into_vec()).collect())
    }
}
