use crate::silent_logs;
use sluice::{
    Client, Param, PlaceholderValues, Query, RowLabeled, Session, SessionError, Value,
};

fn execution_code(error: &sluice::Error) -> Option<&str> {
    match error.downcast_ref::<SessionError>() {
        Some(SessionError::QueryExecution { code, .. }) => code.as_deref(),
        other => panic!("Expected a query execution error, got {:?}: {:#}", other, error),
    }
}

pub async fn failures<C: Client>(session: &Session<C>) {
    session
        .query("DROP TABLE IF EXISTS sluice_accounts", vec![])
        .await
        .expect("Failed to drop the sluice_accounts table");
    session
        .query(
            "CREATE TABLE sluice_accounts (name TEXT PRIMARY KEY, balance BIGINT NOT NULL)",
            vec![],
        )
        .await
        .expect("Failed to create the sluice_accounts table");

    silent_logs! {
        // Rejected by the server
        let error = session
            .query("SELEC name FROM sluice_accounts", vec![])
            .await
            .expect_err("A malformed statement must fail");
        assert_eq!(execution_code(&error), Some("42601"));

        let insert = session.prepare_query::<RowLabeled>(
            Query::with_params(
                "INSERT INTO sluice_accounts (name, balance) VALUES ($1, $2)",
                [Param::placeholder("name"), Param::from(100_i64)],
            ),
            None,
            Some("insert_account"),
        );
        let values = PlaceholderValues::from([("name".to_string(), Value::from("erin"))]);
        insert.execute(&values).await.expect("Failed to insert the account");
        let error = insert
            .execute(&values)
            .await
            .expect_err("A duplicate key must fail");
        assert_eq!(execution_code(&error), Some("23505"));

        let error = session
            .query("SELECT * FROM sluice_missing_table", vec![])
            .await
            .expect_err("A missing table must fail");
        assert_eq!(execution_code(&error), Some("42P01"));

        // Arity mismatch is reported before reaching the server
        let error = session
            .query("SELECT name FROM sluice_accounts WHERE name = $1", vec![])
            .await
            .expect_err("A missing parameter must fail");
        assert_eq!(execution_code(&error), None);

        // Values the driver cannot encode fail on the client, without a code
        let error = session
            .query("SELECT $1::INET", vec!["not an address".into()])
            .await
            .expect_err("A malformed address must fail");
        assert_eq!(execution_code(&error), None);

        let error = session
            .query("SELECT $1::INT4RANGE", vec!["[1,5)".into()])
            .await
            .expect_err("A range parameter cannot be bound");
        assert_eq!(execution_code(&error), None);
        assert!(format!("{:#}", error).contains("cannot be bound"));

        let error = session
            .query(
                "SELECT $1::JSONB",
                vec![vec!["a".to_string(), "b".to_string()].into()],
            )
            .await
            .expect_err("A list is not a json document");
        assert_eq!(execution_code(&error), None);

        // Never reaches the connection
        let error = insert
            .execute(&PlaceholderValues::new())
            .await
            .expect_err("An unresolved placeholder must fail");
        assert_eq!(
            error.downcast_ref::<SessionError>(),
            Some(&SessionError::UnresolvedPlaceholder {
                name: "name".into()
            })
        );
    }

    // The connection is still usable after the failures
    let total = session
        .query("SELECT COUNT(*) FROM sluice_accounts", vec![])
        .await
        .expect("Failed to count the accounts");
    assert_eq!(total.rows[0][0], Value::Int64(Some(1)));
}
