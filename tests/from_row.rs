#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use sluice::{
        AsValue, Client, DescribeFields, FromRow, Param, PlaceholderValues, Query, QueryRequest,
        Result, ResultSet, RowLabeled, RowMode, RowNames, Rows, Session, SessionOptions, Value,
    };
    use std::sync::Arc;
    use time::{Date, Month};
    use uuid::Uuid;

    #[derive(FromRow, Debug, PartialEq)]
    struct Product {
        id: Uuid,
        #[column_name("product_name")]
        name: String,
        price: Decimal,
        discontinued: Option<Date>,
        tags: Vec<String>,
    }

    fn labels(names: &[&str]) -> RowNames {
        names.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn derive_reads_columns_by_name() {
        let id = Uuid::parse_str("0b6e0d1f-8a43-4c3c-9c59-5b8a4e1d9e2f").unwrap();
        let row = RowLabeled::new(
            labels(&["tags", "price", "id", "discontinued", "product_name"]),
            [
                vec!["tools".to_string()].as_value(),
                Value::Decimal(Some(Decimal::new(1999, 2))),
                id.as_value(),
                Value::Date(None),
                "Hammer".into(),
            ]
            .into(),
        );
        let product = Product::from_row(row).expect("Could not decode the product");
        assert_eq!(
            product,
            Product {
                id,
                name: "Hammer".into(),
                price: Decimal::new(1999, 2),
                discontinued: None,
                tags: vec!["tools".into()],
            }
        );
    }

    #[test]
    fn derive_reports_missing_and_invalid_columns() {
        let row = RowLabeled::new(
            labels(&["id", "product_name"]),
            [Value::Uuid(Some(Uuid::nil())), "Saw".into()].into(),
        );
        let error = Product::from_row(row).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Column `price` does not exist in the row provided"
        );
        let row = RowLabeled::new(labels(&["id"]), [Value::Boolean(Some(true))].into());
        let error = Product::from_row(row).unwrap_err();
        assert!(format!("{:#}", error).contains("While decoding the column `id`"));
    }

    #[test]
    fn derive_defaults_missing_optional_columns() {
        let row = RowLabeled::new(
            labels(&["id", "product_name", "price", "tags"]),
            [
                Value::Uuid(Some(Uuid::nil())),
                "Level".into(),
                Value::Int32(Some(7)),
                Vec::<String>::new().as_value(),
            ]
            .into(),
        );
        let product = Product::from_row(row).expect("The optional column can be absent");
        assert_eq!(product.discontinued, None);
        assert_eq!(product.price, Decimal::new(7, 0));

        // Required columns are still required
        let row = RowLabeled::new(
            labels(&["id", "product_name", "price", "discontinued"]),
            [
                Value::Uuid(Some(Uuid::nil())),
                "Level".into(),
                Value::Int32(Some(7)),
                Value::Date(None),
            ]
            .into(),
        );
        let error = Product::from_row(row).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Column `tags` does not exist in the row provided"
        );
    }

    #[test]
    fn derive_describes_fields() {
        let fields = Product::fields();
        assert_eq!(
            fields.iter().map(|f| f.name.as_ref()).collect::<Vec<_>>(),
            ["id", "product_name", "price", "discontinued", "tags"]
        );
        assert_eq!(
            &**fields.labels(),
            ["id", "product_name", "price", "discontinued", "tags"]
        );
    }

    struct Inventory;

    impl Client for Inventory {
        async fn query(&self, request: QueryRequest<'_>, params: Vec<Value>) -> Result<ResultSet> {
            assert_eq!(request.row_mode, RowMode::Array);
            assert_eq!(request.name, Some("product_by_name"));
            let name = String::try_from_value(params.into_iter().next().unwrap_or_default())?;
            Ok(ResultSet {
                columns: labels(&["id", "product_name", "price", "discontinued", "tags"]),
                rows: Rows::Values(vec![
                    [
                        Value::Uuid(Some(Uuid::nil())),
                        name.as_value(),
                        Value::Int64(Some(12)),
                        Date::from_calendar_date(2024, Month::December, 31)
                            .unwrap()
                            .as_value(),
                        Value::List(Some(vec![]), Box::new(Value::Varchar(None))),
                    ]
                    .into(),
                ]),
                row_count: 1,
            })
        }
    }

    #[tokio::test]
    async fn derive_with_session() {
        let session = Session::from_shared(Arc::new(Inventory), SessionOptions::default());
        let prepared = session.prepare_query::<Product>(
            Query::with_params(
                "SELECT id, product_name, price, discontinued, tags FROM products WHERE product_name = $1",
                [Param::placeholder("name")],
            ),
            Some(Product::fields()),
            Some("product_by_name"),
        );
        let products = prepared
            .execute(&PlaceholderValues::from([(
                "name".to_string(),
                Value::from("Drill"),
            )]))
            .await
            .expect("Execute failed")
            .into_mapped()
            .expect("Products should be mapped");
        assert_eq!(
            products,
            [Product {
                id: Uuid::nil(),
                name: "Drill".into(),
                price: Decimal::new(12, 0),
                discontinued: Date::from_calendar_date(2024, Month::December, 31).ok(),
                tags: vec![],
            }]
        );
    }
}
