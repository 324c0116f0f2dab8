use sluice::{
    Client, Decode, Field, Fields, FromRow, Param, PlaceholderValues, Query, Result, RowLabeled,
    Session, Value,
};
use std::sync::LazyLock;
use time::{Date, Month, PrimitiveDateTime, Time, macros::datetime};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Sensor reading decoded by a hand written field descriptor instead of the derive.
#[derive(Debug, PartialEq)]
struct Reading {
    sensor: Uuid,
    taken_at: PrimitiveDateTime,
    celsius: f64,
    tags: Vec<String>,
    raw: Box<[u8]>,
}

impl FromRow for Reading {
    fn from_row(row: RowLabeled) -> Result<Self> {
        let mut values = row.values.into_vec().into_iter();
        let mut next = || values.next().unwrap_or_default();
        Ok(Self {
            sensor: sluice::AsValue::try_from_value(next())?,
            taken_at: sluice::AsValue::try_from_value(next())?,
            celsius: sluice::AsValue::try_from_value(next())?,
            tags: sluice::AsValue::try_from_value(next())?,
            raw: sluice::AsValue::try_from_value(next())?,
        })
    }
}

fn fahrenheit_to_celsius(value: Value) -> Result<Value> {
    let fahrenheit: f64 = sluice::AsValue::try_from_value(value)?;
    Ok(((fahrenheit - 32.0) * 5.0 / 9.0).into())
}

pub async fn readings<C: Client>(session: &Session<C>) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    // Setup
    session
        .query("DROP TABLE IF EXISTS sluice_readings", vec![])
        .await
        .expect("Failed to drop the sluice_readings table");
    session
        .query(
            "CREATE TABLE sluice_readings (
                sensor UUID NOT NULL,
                taken_at TIMESTAMP NOT NULL,
                fahrenheit DOUBLE PRECISION NOT NULL,
                tags TEXT[] NOT NULL,
                raw BYTEA NOT NULL
            )",
            vec![],
        )
        .await
        .expect("Failed to create the sluice_readings table");

    let sensor = Uuid::parse_str("b1a7f6c4-1f0e-4d2b-9a55-3c1b2d4e5f60").unwrap();
    let taken_at = datetime!(2024-07-01 06:30:00);
    let inserted = session
        .query(
            "INSERT INTO sluice_readings VALUES ($1, $2, $3, $4, $5), ($1, $6, $7, $8, $9)",
            vec![
                sensor.into(),
                taken_at.into(),
                Value::Int32(Some(212)),
                vec!["roof".to_string(), "north".to_string()].into(),
                Value::Blob(Some([0x01, 0xff].into())),
                PrimitiveDateTime::new(
                    Date::from_calendar_date(2024, Month::July, 1).unwrap(),
                    Time::from_hms(18, 0, 0).unwrap(),
                )
                .into(),
                Value::Float32(Some(32.0)),
                Vec::<String>::new().into(),
                Value::Blob(Some(Box::default())),
            ],
        )
        .await
        .expect("Failed to insert the readings");
    assert_eq!(inserted.row_count, 2);

    let fields = Fields::new([
        Field::of::<Uuid>("sensor"),
        Field::new("taken_at"),
        Field::with("celsius", fahrenheit_to_celsius),
        Field::of::<Vec<String>>("tags"),
        Field {
            name: "raw".into(),
            decode: Decode::Raw,
        },
    ]);
    let query = session.prepare_query::<Reading>(
        Query::with_params(
            "SELECT sensor, taken_at, fahrenheit, tags, raw FROM sluice_readings WHERE sensor = $1 ORDER BY taken_at",
            [Param::placeholder("sensor")],
        ),
        Some(fields),
        Some("readings_by_sensor"),
    );
    let values = PlaceholderValues::from([("sensor".to_string(), Value::from(sensor))]);
    let readings = query
        .execute(&values)
        .await
        .expect("Failed to select the readings")
        .into_mapped()
        .expect("An execution with fields must map the rows");
    assert_eq!(readings.len(), 2);
    assert_eq!(readings[0].sensor, sensor);
    assert_eq!(readings[0].taken_at, taken_at);
    assert_eq!(readings[0].celsius, 100.0);
    assert_eq!(readings[0].tags, ["roof", "north"]);
    assert_eq!(&*readings[0].raw, [0x01, 0xff]);
    assert_eq!(readings[1].celsius, 0.0);
    assert!(readings[1].tags.is_empty());
    assert!(readings[1].raw.is_empty());

    // The raw shapes keep the stored values
    let rows = query
        .values(&values)
        .await
        .expect("Failed to select the raw readings");
    assert_eq!(rows[0][2], Value::Float64(Some(212.0)));
    let rows = query
        .values(&PlaceholderValues::from([(
            "sensor".to_string(),
            Value::from(Uuid::nil()),
        )]))
        .await
        .expect("Failed to select the readings of a missing sensor");
    assert!(rows.is_empty());

    // Types without a native value still decode
    let rows = session
        .query(
            "SELECT '{\"a\": [1, 2]}'::JSONB, INTERVAL '1 day 2 hours', '10.0.0.0/8'::CIDR, \
                $1::INET, INT4RANGE(1, 5), NULL::JSONB",
            vec!["192.168.0.1".into()],
        )
        .await
        .expect("Failed to select the types without a native value");
    let row = &rows.rows[0];
    assert_eq!(row[0], Value::from(r#"{"a": [1, 2]}"#));
    assert_eq!(row[1], Value::from("P1DT2H"));
    assert_eq!(row[2], Value::from("10.0.0.0/8"));
    assert_eq!(row[3], Value::from("192.168.0.1"));
    assert!(matches!(row[4], Value::Blob(Some(..))));
    assert_eq!(row[5], Value::Varchar(None));
}
