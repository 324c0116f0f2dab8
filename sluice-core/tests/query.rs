#[cfg(test)]
mod tests {
    use sluice_core::{
        AsValue, Field, Fields, Param, PlaceholderValues, Query, ResultSet, Row, RowLabeled,
        RowNames, Rows, SessionError, Value, fill_placeholders, map_row,
    };

    #[test]
    fn fill_literals_and_placeholders() {
        let params = [
            Param::from(10),
            Param::placeholder("name"),
            Param::from("fixed"),
            Param::placeholder("name"),
        ];
        let values = PlaceholderValues::from([("name".to_string(), Value::from("alice"))]);
        assert_eq!(
            fill_placeholders(&params, &values).unwrap(),
            [
                Value::Int32(Some(10)),
                "alice".into(),
                "fixed".into(),
                "alice".into()
            ]
        );
        assert!(fill_placeholders(&[], &values).unwrap().is_empty());
    }

    #[test]
    fn fill_missing_placeholder() {
        let params = [Param::placeholder("id"), Param::placeholder("limit")];
        let values = PlaceholderValues::from([("id".to_string(), Value::Int64(Some(1)))]);
        let error = fill_placeholders(&params, &values).unwrap_err();
        assert_eq!(
            error.downcast_ref::<SessionError>(),
            Some(&SessionError::UnresolvedPlaceholder {
                name: "limit".into()
            })
        );
        assert_eq!(
            error.to_string(),
            "No value for placeholder `limit` was provided"
        );
    }

    #[test]
    fn fill_null_placeholder() {
        let params = [Param::placeholder("deleted_at")];
        let values = PlaceholderValues::from([("deleted_at".to_string(), Value::Null)]);
        assert_eq!(
            fill_placeholders(&params, &values).unwrap(),
            [Value::Null]
        );
    }

    #[test]
    fn query_builder() {
        let mut builder = Query::builder();
        builder
            .push("UPDATE accounts SET balance = ")
            .push_bind(Param::placeholder("balance"))
            .push(" WHERE id = ")
            .push_bind(42_i64)
            .push(" AND owner = ")
            .push_bind("carol");
        let query = builder.build();
        assert_eq!(
            query.sql,
            "UPDATE accounts SET balance = $1 WHERE id = $2 AND owner = $3"
        );
        assert_eq!(query.placeholders().collect::<Vec<_>>(), ["balance"]);
        assert_eq!(query.params[1], Param::Value(Value::Int64(Some(42))));
        assert!(query.params[0].is_placeholder());
    }

    #[test]
    fn query_display_truncates() {
        let long = format!("SELECT {} FROM t", "x, ".repeat(300));
        let query = Query::new(long);
        let shown = query.to_string();
        assert!(shown.ends_with("..."));
        assert!(shown.len() <= 500);
        let query = Query::new("SELECT 'è'".repeat(60));
        assert!(query.to_string().ends_with("..."));
    }

    #[test]
    fn map_row_decodes_fields() {
        let fields = Fields::new([
            Field::of::<i64>("id"),
            Field::new("name"),
            Field::with("active", |v| Ok((!bool::try_from_value(v)?).into())),
        ]);
        let row: Row = [Value::Int16(Some(3)), "dave".into(), Value::Boolean(Some(false))].into();
        let mapped = map_row(&fields, row).unwrap();
        assert_eq!(mapped.names(), ["id", "name", "active"]);
        assert_eq!(
            mapped.values(),
            [Value::Int64(Some(3)), "dave".into(), Value::Boolean(Some(true))]
        );
    }

    #[test]
    fn map_row_decode_error() {
        let fields = Fields::new([Field::of::<i32>("id"), Field::of::<String>("name")]);
        let row: Row = [Value::Int32(Some(1)), Value::Int32(Some(2))].into();
        let error = map_row(&fields, row).unwrap_err();
        assert!(format!("{:#}", error).contains("While decoding the field `name`"));
    }

    #[test]
    #[should_panic]
    fn map_row_width_mismatch() {
        let fields = Fields::new([Field::new("id")]);
        let _ = map_row(&fields, Row::default());
    }

    #[test]
    fn result_set_shapes() {
        let columns: RowNames = ["a".to_string(), "b".to_string()].into();
        let rows: Vec<Row> = vec![
            [Value::Int32(Some(1)), Value::Int32(Some(2))].into(),
            [Value::Int32(Some(3)), Value::Int32(Some(4))].into(),
        ];
        let result = ResultSet {
            columns: columns.clone(),
            rows: Rows::Values(rows.clone()),
            row_count: 2,
        };
        let labeled = result.clone().into_labeled().unwrap();
        assert_eq!(labeled[1].get_column("b"), Some(&Value::Int32(Some(4))));
        assert_eq!(result.into_values(), rows);
        let result = ResultSet {
            columns: columns.clone(),
            rows: Rows::Labeled(
                rows.iter()
                    .cloned()
                    .map(|v| RowLabeled::new(columns.clone(), v))
                    .collect(),
            ),
            row_count: 2,
        };
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.into_values(), rows);
        let broken = ResultSet {
            columns,
            rows: Rows::Values(vec![[Value::Null].into()]),
            row_count: 1,
        };
        assert!(broken.into_labeled().is_err());
    }

    #[test]
    fn get_column_on_short_row() {
        let row = RowLabeled::new(
            ["a".to_string(), "b".to_string(), "c".to_string()].into(),
            [Value::Int32(Some(1))].into(),
        );
        assert_eq!(row.get_column("a"), Some(&Value::Int32(Some(1))));
        assert_eq!(row.get_column("c"), None);
        assert_eq!(row.get_column("z"), None);
    }
}
