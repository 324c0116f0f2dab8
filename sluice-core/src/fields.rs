use crate::{AsValue, Context, Result, Row, RowLabeled, RowNames, Value};
use std::{borrow::Cow, iter, ops::Deref, sync::Arc};

/// How a column value is turned into the field value.
#[derive(Debug, Clone)]
pub enum Decode {
    /// Keep the value produced by the driver.
    Raw,
    /// Convert into the type of the given value (usually a typed NULL).
    As(Value),
    /// Custom decoder.
    With(fn(Value) -> Result<Value>),
}

impl Decode {
    pub fn decode(&self, value: Value) -> Result<Value> {
        match self {
            Decode::Raw => Ok(value),
            Decode::As(ty) => value.try_as(ty),
            Decode::With(f) => f(value),
        }
    }
}

/// One output column of a query: its name and its decode rule.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: Cow<'static, str>,
    pub decode: Decode,
}

impl Field {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            decode: Decode::Raw,
        }
    }
    /// Field decoded into the native type `T`.
    pub fn of<T: AsValue>(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            decode: Decode::As(T::as_empty_value()),
        }
    }
    pub fn with(name: impl Into<Cow<'static, str>>, decode: fn(Value) -> Result<Value>) -> Self {
        Self {
            name: name.into(),
            decode: Decode::With(decode),
        }
    }
}

/// Ordered field descriptor, aligned by position with the columns of the query.
#[derive(Debug, Clone)]
pub struct Fields {
    fields: Arc<[Field]>,
    labels: RowNames,
}

impl Fields {
    pub fn new(fields: impl IntoIterator<Item = Field>) -> Self {
        let fields: Arc<[Field]> = fields.into_iter().collect();
        let labels = fields.iter().map(|f| f.name.to_string()).collect();
        Self { fields, labels }
    }
    pub fn labels(&self) -> &RowNames {
        &self.labels
    }
}

impl Deref for Fields {
    type Target = [Field];
    fn deref(&self) -> &Self::Target {
        &self.fields
    }
}

impl FromIterator<Field> for Fields {
    fn from_iter<T: IntoIterator<Item = Field>>(iter: T) -> Self {
        Fields::new(iter)
    }
}

/// Decode one positional row through the field descriptor.
///
/// # Panics
/// When the row width differs from the number of fields: the descriptor does not describe this query.
pub fn map_row(fields: &Fields, row: Row) -> Result<RowLabeled> {
    assert_eq!(
        fields.len(),
        row.len(),
        "The field descriptor declares {} fields but the row has {} columns",
        fields.len(),
        row.len(),
    );
    let values = iter::zip(fields.iter(), row.into_vec())
        .map(|(field, value)| {
            field
                .decode
                .decode(value)
                .with_context(|| format!("While decoding the field `{}`", field.name))
        })
        .collect::<Result<Row>>()?;
    Ok(RowLabeled::new(fields.labels.clone(), values))
}
