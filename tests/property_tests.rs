//! Property-based tests for values, rows, statements and quoting

use clinicdb::{Row, Statement, Value};
use proptest::prelude::*;

// ============================================================================
// Value Round Trips
// ============================================================================

proptest! {
    /// Test that Bool values round trip correctly
    #[test]
    fn test_bool_round_trip(value in any::<bool>()) {
        let val = Value::from(value);
        assert_eq!(val.as_bool(), Some(value));
        assert!(!val.is_null());
        assert_eq!(val.type_name(), "bool");
    }

    /// Test that Int values round trip correctly
    #[test]
    fn test_int_round_trip(value in any::<i64>()) {
        let val = Value::from(value);
        assert_eq!(val.as_int(), Some(value));
        assert!(!val.is_null());
        assert_eq!(val.type_name(), "int");
    }

    /// Test that i32 sources widen without loss
    #[test]
    fn test_int_widening(value in any::<i32>()) {
        let val = Value::from(value);
        assert_eq!(val.as_int(), Some(i64::from(value)));
    }

    /// Test that Double values round trip correctly (excluding NaN and infinities)
    #[test]
    fn test_double_round_trip(value in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
        let val = Value::from(value);
        assert_eq!(val.as_double(), Some(value));
        assert!(!val.is_null());
        assert_eq!(val.type_name(), "double");
    }

    /// Test that Text values round trip correctly
    #[test]
    fn test_text_round_trip(value in ".*") {
        let val = Value::from(value.clone());
        assert_eq!(val.as_string(), value);
        assert_eq!(val.as_str(), Some(value.as_str()));
        assert!(!val.is_null());
        assert_eq!(val.type_name(), "text");
    }

    /// Test that Bytes values round trip correctly
    #[test]
    fn test_bytes_round_trip(value in prop::collection::vec(any::<u8>(), 0..1000)) {
        let val = Value::from(value.clone());
        assert_eq!(val.as_bytes(), Some(value.as_slice()));
        assert!(!val.is_null());
        assert_eq!(val.type_name(), "bytes");
    }
}

// ============================================================================
// Type Conversions
// ============================================================================

proptest! {
    /// Test that Int to Double conversion works
    #[test]
    fn test_int_to_double_conversion(value in any::<i32>()) {
        let val = Value::from(i64::from(value));
        assert_eq!(val.as_double(), Some(f64::from(value)));
    }

    /// Test that numeric text parses back to the number it prints as
    #[test]
    fn test_text_parses_as_int(value in any::<i64>()) {
        let val = Value::from(value.to_string());
        assert_eq!(val.as_int(), Some(value));
    }

    /// Test that any value can be converted to string without panicking
    #[test]
    fn test_to_string_never_panics(value in prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>().prop_filter("finite", |v| v.is_finite()).prop_map(Value::from),
        ".*".prop_map(Value::from),
        prop::collection::vec(any::<u8>(), 0..100).prop_map(Value::from),
    ]) {
        let _ = value.as_string();
        let _ = value.type_name();
    }
}

// ============================================================================
// Null and Empty-Key Handling
// ============================================================================

proptest! {
    /// Test that Option::None creates Null values
    #[test]
    fn test_null_from_none(_value in 0..100u32) {
        let val = Value::from(Option::<i64>::None);
        assert!(val.is_null());
        assert_eq!(val.type_name(), "null");
        assert_eq!(val.as_int(), None);
        assert_eq!(val.as_string(), "");
    }

    /// Test that Option::Some creates non-Null values
    #[test]
    fn test_some_not_null(value in any::<i64>()) {
        let val = Value::from(Some(value));
        assert!(!val.is_null());
        assert_eq!(val.as_int(), Some(value));
    }

    /// Test that an integer key is empty exactly when it is zero
    #[test]
    fn test_empty_key_int(value in any::<i64>()) {
        assert_eq!(Value::from(value).is_empty_key(), value == 0);
    }

    /// Test that a text key is empty exactly for blank and literal zero
    #[test]
    fn test_empty_key_text(value in ".*") {
        let expected = value.is_empty() || value == "0";
        assert_eq!(Value::from(value).is_empty_key(), expected);
    }
}

// ============================================================================
// Row Properties
// ============================================================================

proptest! {
    /// Test that rows store and retrieve mixed values
    #[test]
    fn test_row_operations(
        int_val in any::<i64>(),
        text_val in ".*",
        double_val in any::<f64>().prop_filter("finite", |v| v.is_finite())
    ) {
        let mut row = Row::new();
        row.set("int_col", int_val);
        row.set("text_col", text_val.clone());
        row.set("double_col", double_val);

        assert_eq!(row.get("int_col").and_then(Value::as_int), Some(int_val));
        assert_eq!(row.get("text_col").map(Value::as_string), Some(text_val));
        assert_eq!(row.get("double_col").and_then(Value::as_double), Some(double_val));
    }

    /// Test that missing columns resolve to None rather than panicking
    #[test]
    fn test_row_missing_column(name in "[a-z]{3,10}") {
        let row = Row::new();
        assert!(!row.contains(&name));
        assert!(row.get(&name).is_none());
    }

    /// Test that writes keep first-seen field order and take the last value
    #[test]
    fn test_row_upsert_last_write_wins(names in prop::collection::vec("[a-z]{1,3}", 1..24)) {
        let mut row = Row::new();
        for (i, name) in names.iter().enumerate() {
            row.set(name.clone(), i as i64);
        }

        let mut first_seen: Vec<&str> = Vec::new();
        for name in &names {
            if !first_seen.contains(&name.as_str()) {
                first_seen.push(name);
            }
        }
        assert_eq!(row.len(), first_seen.len());
        let order: Vec<&str> = row.names().iter().map(String::as_str).collect();
        assert_eq!(order, first_seen);

        for (name, value) in row.iter() {
            let last = names.iter().rposition(|n| n == name).unwrap();
            assert_eq!(value.as_int(), Some(last as i64));
        }
    }

    /// Test that building from pairs preserves insertion order
    #[test]
    fn test_row_from_pairs_order(values in prop::collection::vec(any::<i64>(), 0..16)) {
        let pairs: Vec<(String, Value)> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("col_{i}"), Value::from(*v)))
            .collect();
        let row = Row::from_pairs(pairs);

        assert_eq!(row.len(), values.len());
        for (i, v) in values.iter().enumerate() {
            assert_eq!(row.get(&format!("col_{i}")).and_then(Value::as_int), Some(*v));
        }
        let expected: Vec<String> = (0..values.len()).map(|i| format!("col_{i}")).collect();
        assert_eq!(row.names(), expected.as_slice());
    }

    /// Test that cloned rows keep every field
    #[test]
    fn test_row_clone(values in prop::collection::vec(any::<i64>(), 0..20)) {
        let mut row = Row::new();
        for (i, val) in values.iter().enumerate() {
            row.set(format!("col_{i}"), *val);
        }

        let cloned = row.clone();
        assert_eq!(cloned.len(), row.len());
        for (i, val) in values.iter().enumerate() {
            assert_eq!(cloned.get(&format!("col_{i}")).and_then(Value::as_int), Some(*val));
        }
    }
}

// ============================================================================
// Statement Window Properties
// ============================================================================

proptest! {
    /// Test that the staged SQL is always a prefix of the executed SQL
    #[test]
    fn test_window_preserves_sql_prefix(
        sql in "[A-Za-z0-9 ,*=']{1,60}",
        offset in any::<i64>(),
        limit in any::<i64>()
    ) {
        let stmt = Statement::new(sql.clone()).offset(offset).limit(limit);
        assert!(stmt.to_sql().starts_with(&sql));
        assert_eq!(stmt.sql(), sql);
    }

    /// Test that negative bounds clamp to zero
    #[test]
    fn test_window_clamps_negative_bounds(
        offset in i64::MIN..0,
        limit in i64::MIN..0
    ) {
        let stmt = Statement::new("SELECT 1").offset(offset).limit(limit);
        assert_eq!(stmt.row_offset(), 0);
        assert_eq!(stmt.row_limit(), 0);
        assert_eq!(stmt.to_sql(), "SELECT 1");
    }

    /// Test that any nonzero bound appends exactly one window clause
    #[test]
    fn test_window_clause_shape(
        offset in 0i64..10_000,
        limit in 0i64..10_000
    ) {
        let stmt = Statement::new("SELECT 1").offset(offset).limit(limit);
        let rendered = stmt.to_sql().into_owned();
        if offset == 0 && limit == 0 {
            assert_eq!(rendered, "SELECT 1");
        } else {
            assert_eq!(rendered, format!("SELECT 1 LIMIT {offset}, {limit}"));
        }
    }
}

// ============================================================================
// Serialization Properties
// ============================================================================

proptest! {
    /// Test that value serialization never panics
    #[test]
    fn test_json_serialization_no_panic(value in prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>().prop_filter("finite", |v| v.is_finite()).prop_map(Value::from),
        ".*".prop_map(Value::from),
    ]) {
        let result = serde_json::to_string(&value);
        assert!(result.is_ok());
    }

    /// Test that non-float values survive a serde round trip unchanged
    #[test]
    fn test_json_round_trip(value in prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        ".*".prop_map(Value::from),
        prop::collection::vec(any::<u8>(), 0..50).prop_map(Value::from),
    ]) {
        let text = serde_json::to_string(&value).expect("Serialization failed");
        let back: Value = serde_json::from_str(&text).expect("Deserialization failed");
        assert_eq!(back, value);
    }
}

// ============================================================================
// Quoting Properties
// ============================================================================

#[cfg(feature = "sqlite")]
mod quoting {
    use clinicdb::{Connector, SqliteConnector, Statement, Value};
    use once_cell::sync::Lazy;
    use proptest::prelude::*;

    // One connection is enough for the pure quoting surface; the round-trip
    // test opens its own so table state stays per-case.
    static DB: Lazy<SqliteConnector> =
        Lazy::new(|| SqliteConnector::memory().expect("Failed to open in-memory database"));

    proptest! {
        /// Test that quoted text survives a trip through the server
        #[test]
        fn test_quoted_text_round_trips(body in "[^\\x00]{0,24}") {
            let db = SqliteConnector::memory().expect("Failed to open in-memory database");
            db.execute(&Statement::new("CREATE TABLE notes (body TEXT)"))
                .expect("Failed to create table");

            let quoted = db.quote(&Value::from(body.as_str()), true);
            db.execute(&Statement::new(format!(
                "INSERT INTO notes (body) VALUES ({quoted})"
            )))
            .expect("Failed to insert");

            let row = db
                .query_assoc(&Statement::new("SELECT body FROM notes"))
                .expect("Query failed")
                .expect("Row missing");
            assert_eq!(row.get("body").map(Value::as_string), Some(body));
        }

        /// Test that integers render bare and parse back
        #[test]
        fn test_integer_quoting_is_bare(value in any::<i64>()) {
            let rendered = DB.quote(&Value::from(value), true);
            assert_eq!(rendered, value.to_string());
            assert_eq!(rendered.parse::<i64>().ok(), Some(value));
        }

        /// Test that non-finite doubles render as NULL
        #[test]
        fn test_nonfinite_double_quotes_to_null(value in prop_oneof![
            Just(f64::NAN),
            Just(f64::INFINITY),
            Just(f64::NEG_INFINITY),
        ]) {
            assert_eq!(DB.quote(&Value::from(value), true), "NULL");
        }

        /// Test that escaped text never leaves a lone quote behind
        #[test]
        fn test_escape_doubles_every_quote(text in ".{0,40}") {
            let escaped = DB.escape(&text, false);
            let mut chars = escaped.chars().peekable();
            while let Some(c) = chars.next() {
                if c == '\'' {
                    assert_eq!(chars.next(), Some('\''));
                }
            }
        }

        /// Test that dotted names quote each segment
        #[test]
        fn test_quote_name_segments(a in "[a-z_]{1,8}", b in "[a-z_]{1,8}") {
            let joined = format!("{a}.{b}");
            assert_eq!(DB.quote_name(&joined, None), format!("`{a}`.`{b}`"));
            assert_eq!(
                DB.quote_name(&a, Some(b.as_str())),
                format!("`{a}` AS `{b}`")
            );
        }
    }
}
