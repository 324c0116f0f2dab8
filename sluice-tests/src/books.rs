use rust_decimal::Decimal;
use sluice::{
    AsValue, Client, DescribeFields, FromRow, Param, PlaceholderValues, Query, Row, RowLabeled,
    Session, Value,
};
use std::{collections::BTreeMap, sync::LazyLock};
use time::{Date, Month};
use tokio::sync::Mutex;

#[derive(FromRow, Debug, PartialEq)]
struct Book {
    id: i32,
    title: String,
    #[column_name("list_price")]
    price: Decimal,
    published: Option<Date>,
}

fn placeholders<const N: usize>(values: [(&str, Value); N]) -> PlaceholderValues {
    values
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

pub async fn books<C: Client>(session: &Session<C>) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    // Setup
    session
        .query("DROP TABLE IF EXISTS sluice_books", vec![])
        .await
        .expect("Failed to drop the sluice_books table");
    session
        .query(
            "CREATE TABLE sluice_books (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                list_price NUMERIC(8, 2) NOT NULL,
                published DATE
            )",
            vec![],
        )
        .await
        .expect("Failed to create the sluice_books table");

    // Insert through a named statement, the connection parses it once
    let insert = session.prepare_query::<RowLabeled>(
        Query::with_params(
            "INSERT INTO sluice_books (id, title, list_price, published) VALUES ($1, $2, $3, $4)",
            [
                Param::placeholder("id"),
                Param::placeholder("title"),
                Param::placeholder("price"),
                Param::placeholder("published"),
            ],
        ),
        None,
        Some("insert_book"),
    );
    let books = [
        (
            1_i64,
            "The Left Hand of Darkness",
            Decimal::new(1250, 2),
            Date::from_calendar_date(1969, Month::March, 1).ok(),
        ),
        (2, "Solaris", Decimal::new(990, 2), None),
        (
            3,
            "Roadside Picnic",
            Decimal::new(2100, 2),
            Date::from_calendar_date(1972, Month::January, 10).ok(),
        ),
    ];
    for (id, title, price, published) in books {
        let result = insert
            .execute(&placeholders([
                ("id", id.into()),
                ("title", title.into()),
                ("price", price.into()),
                ("published", published.as_value()),
            ]))
            .await
            .expect("Failed to insert a book")
            .into_raw()
            .expect("An execution without fields must return the raw result");
        assert_eq!(result.row_count, 1);
        assert!(result.rows.is_empty());
    }

    // Mapped through the field descriptor
    let cheap = session.prepare_query::<Book>(
        Query::with_params(
            "SELECT id, title, list_price, published FROM sluice_books WHERE list_price <= $1 ORDER BY id",
            [Param::placeholder("max_price")],
        ),
        Some(Book::fields()),
        Some("cheap_books"),
    );
    let found = cheap
        .execute(&placeholders([("max_price", Decimal::new(15, 0).into())]))
        .await
        .expect("Failed to select the cheap books")
        .into_mapped()
        .expect("An execution with fields must map the rows");
    assert_eq!(
        found,
        [
            Book {
                id: 1,
                title: "The Left Hand of Darkness".into(),
                price: Decimal::new(1250, 2),
                published: Date::from_calendar_date(1969, Month::March, 1).ok(),
            },
            Book {
                id: 2,
                title: "Solaris".into(),
                price: Decimal::new(990, 2),
                published: None,
            },
        ]
    );
    let found = cheap
        .execute(&placeholders([("max_price", Value::Int32(Some(5)))]))
        .await
        .expect("Failed to select the cheap books again")
        .into_mapped()
        .expect("An execution with fields must map the rows");
    assert!(found.is_empty());

    // Unmapped shapes of the same statement
    let rows = cheap
        .all(&placeholders([("max_price", Decimal::new(10, 0).into())]))
        .await
        .expect("Failed to fetch the labeled rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].names(), ["id", "title", "list_price", "published"]);
    assert_eq!(rows[0].get_column("title"), Some(&Value::from("Solaris")));
    assert_eq!(rows[0].get_column("published"), Some(&Value::Date(None)));
    let rows = cheap
        .values(&placeholders([("max_price", Decimal::new(100, 0).into())]))
        .await
        .expect("Failed to fetch the positional rows");
    assert_eq!(
        rows.iter().map(|r| r[0].clone()).collect::<Vec<_>>(),
        [
            Value::Int32(Some(1)),
            Value::Int32(Some(2)),
            Value::Int32(Some(3))
        ]
    );

    // Ad-hoc queries
    let count = session
        .query("SELECT COUNT(*) AS total FROM sluice_books", vec![])
        .await
        .expect("Failed to count the books");
    assert_eq!(&*count.columns, ["total"]);
    assert_eq!(count.rows.len(), 1);
    assert_eq!(i64::try_from_value(count.rows[0][0].clone()).unwrap(), 3);

    let updated = session
        .query(
            "UPDATE sluice_books SET list_price = list_price * 2 WHERE id > $1",
            vec![1.into()],
        )
        .await
        .expect("Failed to update the books");
    assert_eq!(updated.row_count, 2);
    assert!(updated.rows.is_empty());

    let objects = session
        .query_objects::<Book>(
            "SELECT id, title, list_price, published FROM sluice_books WHERE id = $1",
            vec![Value::Int64(Some(3))],
        )
        .await
        .expect("Failed to query the books as objects");
    assert_eq!(objects.row_count, 1);
    assert_eq!(objects.rows[0].title, "Roadside Picnic");
    assert_eq!(objects.rows[0].price, Decimal::new(4200, 2));

    let maps = session
        .query_objects::<BTreeMap<String, Value>>(
            "SELECT title FROM sluice_books ORDER BY id DESC LIMIT 1",
            vec![],
        )
        .await
        .expect("Failed to query the books as maps");
    assert_eq!(
        maps.rows,
        [BTreeMap::from([(
            "title".to_string(),
            Value::from("Roadside Picnic")
        )])]
    );

    // Literals and placeholders together
    let titles = session.prepare_query::<RowLabeled>(
        Query::with_params(
            "SELECT title FROM sluice_books WHERE id BETWEEN $1 AND $2 ORDER BY id",
            [Param::from(2), Param::placeholder("upper")],
        ),
        None,
        None,
    );
    let rows = titles
        .values(&placeholders([("upper", 3.into())]))
        .await
        .expect("Failed to select the titles");
    assert_eq!(
        rows,
        [
            Row::from([Value::from("Solaris")]),
            Row::from([Value::from("Roadside Picnic")])
        ]
    );
}
