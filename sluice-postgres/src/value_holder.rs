use byteorder::{NetworkEndian, ReadBytesExt};
use bytes::{BufMut, BytesMut};
use postgres_types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};
use rust_decimal::Decimal;
use sluice_core::Value;
use std::{
    error::Error,
    fmt::Write,
    io::Read,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    str,
};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

type BoxError = Box<dyn Error + Sync + Send>;

/// A [`Value`] crossing the Postgres binary protocol, as a parameter or as a column.
///
/// Every column can be read. Types without a native counterpart become `Varchar` when Postgres
/// has a textual form for them (json, jsonb, enums, inet, cidr, interval) and the raw `Blob`
/// otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueHolder(pub Value);

impl From<Value> for ValueHolder {
    fn from(value: Value) -> Self {
        ValueHolder(value)
    }
}

impl From<ValueHolder> for Value {
    fn from(value: ValueHolder) -> Self {
        value.0
    }
}

impl<'a> FromSql<'a> for ValueHolder {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        decode(ty, raw).map(ValueHolder)
    }

    fn from_sql_null(ty: &Type) -> Result<Self, BoxError> {
        Ok(ValueHolder(postgres_type_to_value(ty)))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn decode(ty: &Type, raw: &[u8]) -> Result<Value, BoxError> {
    match ty.kind() {
        Kind::Array(member) => {
            let values = Vec::<ValueHolder>::from_sql(ty, raw)?;
            return Ok(Value::List(
                Some(values.into_iter().map(Into::into).collect()),
                Box::new(postgres_type_to_value(member)),
            ));
        }
        Kind::Domain(inner) => return decode(inner, raw),
        Kind::Enum(..) => return Ok(Value::Varchar(Some(str::from_utf8(raw)?.into()))),
        _ => {}
    }
    let value: Value = match *ty {
        Type::BOOL => bool::from_sql(ty, raw)?.into(),
        Type::CHAR => i8::from_sql(ty, raw)?.into(),
        Type::INT2 => i16::from_sql(ty, raw)?.into(),
        Type::INT4 => i32::from_sql(ty, raw)?.into(),
        Type::INT8 => i64::from_sql(ty, raw)?.into(),
        Type::OID => u32::from_sql(ty, raw)?.into(),
        Type::FLOAT4 => f32::from_sql(ty, raw)?.into(),
        Type::FLOAT8 => f64::from_sql(ty, raw)?.into(),
        Type::NUMERIC => Decimal::from_sql(ty, raw)?.into(),
        Type::TEXT
        | Type::VARCHAR
        | Type::BPCHAR
        | Type::NAME
        | Type::JSON
        | Type::XML
        | Type::UNKNOWN => String::from_sql(ty, raw)?.into(),
        Type::JSONB => match raw.split_first() {
            Some((1, json)) => Value::Varchar(Some(str::from_utf8(json)?.into())),
            _ => return Err("Unsupported jsonb format version".into()),
        },
        Type::BYTEA => Value::Blob(Some(raw.into())),
        Type::DATE => Date::from_sql(ty, raw)?.into(),
        Type::TIME => Time::from_sql(ty, raw)?.into(),
        Type::TIMESTAMP => PrimitiveDateTime::from_sql(ty, raw)?.into(),
        Type::TIMESTAMPTZ => OffsetDateTime::from_sql(ty, raw)?.into(),
        Type::UUID => Uuid::from_sql(ty, raw)?.into(),
        Type::INET | Type::CIDR => Value::Varchar(Some(decode_inet(raw)?)),
        Type::INTERVAL => Value::Varchar(Some(decode_interval(raw)?)),
        _ => Value::Blob(Some(raw.into())),
    };
    Ok(value)
}

impl ToSql for ValueHolder {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError>
    where
        Self: Sized,
    {
        if self.0.is_null() {
            return Ok(IsNull::Yes);
        }
        let is_array = matches!(ty.kind(), Kind::Array(..));
        match (&self.0, is_array) {
            (Value::List(Some(values), ..), true) => {
                return values
                    .iter()
                    .cloned()
                    .map(ValueHolder)
                    .collect::<Vec<_>>()
                    .to_sql(ty, out);
            }
            (Value::List(..), false) => {
                return Err(format!("Cannot bind a list to the non-array type `{}`", ty).into());
            }
            (value, true) => {
                return Err(format!("Cannot bind `{}` to the array type `{}`", value, ty).into());
            }
            _ => {}
        }
        match &self.0 {
            Value::Varchar(Some(v)) if *ty == Type::JSONB => {
                out.put_u8(1);
                out.put_slice(v.as_bytes());
                Ok(IsNull::No)
            }
            Value::Varchar(Some(v)) if matches!(*ty, Type::INET | Type::CIDR) => {
                encode_inet(v, *ty == Type::CIDR, out)
            }
            Value::Boolean(Some(v)) => v.to_sql(ty, out),
            Value::Int8(Some(v)) => v.to_sql(ty, out),
            Value::Int16(Some(v)) => v.to_sql(ty, out),
            Value::Int32(Some(v)) => v.to_sql(ty, out),
            Value::Int64(Some(v)) => v.to_sql(ty, out),
            Value::UInt8(Some(v)) => (*v as i16).to_sql(ty, out),
            Value::UInt16(Some(v)) => (*v as i32).to_sql(ty, out),
            Value::UInt32(Some(v)) => v.to_sql(ty, out),
            Value::UInt64(Some(v)) => Decimal::from(*v).to_sql(ty, out),
            Value::Float32(Some(v)) => v.to_sql(ty, out),
            Value::Float64(Some(v)) => v.to_sql(ty, out),
            Value::Decimal(Some(v)) => v.to_sql(ty, out),
            Value::Varchar(Some(v)) => v.to_sql(ty, out),
            Value::Blob(Some(v)) => (&v[..]).to_sql(ty, out),
            Value::Date(Some(v)) => v.to_sql(ty, out),
            Value::Time(Some(v)) => v.to_sql(ty, out),
            Value::Timestamp(Some(v)) => v.to_sql(ty, out),
            Value::TimestampWithTimezone(Some(v)) => v.to_sql(ty, out),
            Value::Uuid(Some(v)) => v.to_sql(ty, out),
            // NULLs, handled above
            _ => Ok(IsNull::Yes),
        }
    }

    fn accepts(_ty: &Type) -> bool
    where
        Self: Sized,
    {
        true
    }

    to_sql_checked!();
}

/// Empty value of the type Postgres declared, used to coerce parameters with [`Value::try_as`].
///
/// Types that cannot be written from a [`Value`] map to [`Value::Null`].
pub fn postgres_type_to_value(ty: &Type) -> Value {
    match ty.kind() {
        Kind::Array(member) => return Value::List(None, Box::new(postgres_type_to_value(member))),
        Kind::Domain(inner) => return postgres_type_to_value(inner),
        Kind::Enum(..) => return Value::Varchar(None),
        _ => {}
    }
    match *ty {
        Type::BOOL => Value::Boolean(None),
        Type::CHAR => Value::Int8(None),
        Type::INT2 => Value::Int16(None),
        Type::INT4 => Value::Int32(None),
        Type::INT8 => Value::Int64(None),
        Type::OID => Value::UInt32(None),
        Type::FLOAT4 => Value::Float32(None),
        Type::FLOAT8 => Value::Float64(None),
        Type::NUMERIC => Value::Decimal(None),
        Type::TEXT
        | Type::VARCHAR
        | Type::BPCHAR
        | Type::NAME
        | Type::JSON
        | Type::JSONB
        | Type::XML
        | Type::UNKNOWN
        | Type::INET
        | Type::CIDR => Value::Varchar(None),
        Type::BYTEA => Value::Blob(None),
        Type::DATE => Value::Date(None),
        Type::TIME => Value::Time(None),
        Type::TIMESTAMP => Value::Timestamp(None),
        Type::TIMESTAMPTZ => Value::TimestampWithTimezone(None),
        Type::UUID => Value::Uuid(None),
        _ => Value::Null,
    }
}

const INET_V4: u8 = 2;
const INET_V6: u8 = 3;

fn decode_inet(mut raw: &[u8]) -> Result<String, BoxError> {
    let family = raw.read_u8()?;
    let bits = raw.read_u8()?;
    let is_cidr = raw.read_u8()? != 0;
    let len = raw.read_u8()?;
    let (address, max) = match (family, len) {
        (INET_V4, 4) => {
            let mut octets = [0; 4];
            raw.read_exact(&mut octets)?;
            (IpAddr::from(Ipv4Addr::from(octets)), 32)
        }
        (INET_V6, 16) => {
            let mut octets = [0; 16];
            raw.read_exact(&mut octets)?;
            (IpAddr::from(Ipv6Addr::from(octets)), 128)
        }
        _ => return Err(format!("Unknown inet address family {}", family).into()),
    };
    Ok(if is_cidr || bits != max {
        format!("{}/{}", address, bits)
    } else {
        address.to_string()
    })
}

fn encode_inet(text: &str, is_cidr: bool, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    let (address, bits) = match text.split_once('/') {
        Some((address, bits)) => (address.trim().parse::<IpAddr>()?, Some(bits.trim().parse()?)),
        None => (text.trim().parse::<IpAddr>()?, None),
    };
    let (family, max) = match address {
        IpAddr::V4(..) => (INET_V4, 32),
        IpAddr::V6(..) => (INET_V6, 128),
    };
    let bits: u8 = bits.unwrap_or(max);
    if bits > max {
        return Err(format!("Invalid netmask in the address `{}`", text).into());
    }
    out.put_u8(family);
    out.put_u8(bits);
    out.put_u8(is_cidr as u8);
    match address {
        IpAddr::V4(v) => {
            out.put_u8(4);
            out.put_slice(&v.octets());
        }
        IpAddr::V6(v) => {
            out.put_u8(16);
            out.put_slice(&v.octets());
        }
    }
    Ok(IsNull::No)
}

fn decode_interval(mut raw: &[u8]) -> Result<String, BoxError> {
    let micros = raw.read_i64::<NetworkEndian>()?;
    let days = raw.read_i32::<NetworkEndian>()?;
    let months = raw.read_i32::<NetworkEndian>()?;
    Ok(format_interval(months, days, micros))
}

/// ISO 8601 duration, the same text Postgres produces with `IntervalStyle = iso_8601`.
pub fn format_interval(months: i32, days: i32, micros: i64) -> String {
    const MICROS_IN_HOUR: i64 = 3_600_000_000;
    const MICROS_IN_MINUTE: i64 = 60_000_000;
    let mut out = String::from("P");
    for (value, unit) in [
        (months as i64 / 12, 'Y'),
        (months as i64 % 12, 'M'),
        (days as i64, 'D'),
    ] {
        if value != 0 {
            let _ = write!(out, "{}{}", value, unit);
        }
    }
    let hours = micros / MICROS_IN_HOUR;
    let minutes = micros % MICROS_IN_HOUR / MICROS_IN_MINUTE;
    let seconds = micros % MICROS_IN_MINUTE;
    if hours != 0 || minutes != 0 || seconds != 0 {
        out.push('T');
        for (value, unit) in [(hours, 'H'), (minutes, 'M')] {
            if value != 0 {
                let _ = write!(out, "{}{}", value, unit);
            }
        }
        if seconds != 0 {
            let sign = if seconds < 0 { "-" } else { "" };
            let seconds = seconds.unsigned_abs();
            let _ = write!(out, "{}{}", sign, seconds / 1_000_000);
            let fraction = seconds % 1_000_000;
            if fraction != 0 {
                let fraction = format!("{:06}", fraction);
                let _ = write!(out, ".{}", fraction.trim_end_matches('0'));
            }
            out.push('S');
        }
    }
    if out.len() == 1 {
        out.push_str("T0S");
    }
    out
}
