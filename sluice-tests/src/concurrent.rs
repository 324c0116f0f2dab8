use sluice::{AsValue, Client, Param, PlaceholderValues, Query, RowLabeled, Session, Value};

pub async fn concurrent<C: Client>(session: &Session<C>) {
    let square = session.prepare_query::<RowLabeled>(
        Query::with_params(
            "SELECT $1::BIGINT * $1::BIGINT AS square, $2::TEXT AS label",
            [Param::placeholder("n"), Param::placeholder("label")],
        ),
        None,
        Some("square"),
    );
    let square = &square;
    let call = move |n: i64| {
        let values = PlaceholderValues::from([
            ("n".to_string(), Value::from(n)),
            ("label".to_string(), Value::from(format!("call {n}"))),
        ]);
        async move { square.all(&values).await }
    };
    let (a, b, c) = tokio::join!(call(3), call(4), call(5));
    for (n, rows) in [(3_i64, a), (4, b), (5, c)] {
        let rows = rows.expect("Concurrent call failed");
        assert_eq!(rows.len(), 1);
        assert_eq!(
            i64::try_from_value(rows[0].values[0].clone()).unwrap(),
            n * n
        );
        assert_eq!(
            rows[0].get_column("label"),
            Some(&Value::from(format!("call {n}")))
        );
    }

    // The same template keeps working afterwards
    for n in 0..10_i64 {
        let rows = call(n).await.expect("Sequential call failed");
        assert_eq!(rows[0].values[0], Value::Int64(Some(n * n)));
    }
}
