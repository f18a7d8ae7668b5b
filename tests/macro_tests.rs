use colbin::{colbin, Binary, DocMap, DocOptions, Document, Number, Value};
use serde::Serialize;

#[test]
fn test_colbin_macro_null() {
    let value = colbin!(null);
    assert_eq!(value, Value::Null);
}

#[test]
fn test_colbin_macro_booleans() {
    assert_eq!(colbin!(true), Value::Bool(true));
    assert_eq!(colbin!(false), Value::Bool(false));
}

#[test]
fn test_colbin_macro_numbers_keep_width() {
    assert_eq!(colbin!(42), Value::Number(Number::I32(42)));
    assert_eq!(colbin!(42u8), Value::Number(Number::U8(42)));
    assert_eq!(colbin!(42u16), Value::Number(Number::U16(42)));
    assert_eq!(colbin!(42u32), Value::Number(Number::U32(42)));
    assert_eq!(colbin!((-123i64)), Value::Number(Number::I64(-123)));
    assert_eq!(colbin!(3.5f32), Value::Number(Number::Float(3.5)));
}

#[test]
fn test_colbin_macro_strings() {
    assert_eq!(colbin!("hello world"), Value::String("hello world".to_string()));
    assert_eq!(colbin!(""), Value::String(String::new()));
}

#[test]
fn test_colbin_macro_arrays() {
    assert_eq!(colbin!([]), Value::array(vec![]));

    let mixed = colbin!([1u8, "two", null, [true]]);
    assert_eq!(
        mixed,
        Value::array(vec![
            Value::from(1u8),
            Value::from("two"),
            Value::Null,
            Value::array(vec![Value::Bool(true)]),
        ])
    );
}

#[test]
fn test_colbin_macro_objects() {
    assert_eq!(colbin!({}), Value::object(DocMap::new()));

    let user = colbin!({
        "name": "Alice",
        "age": 30u8,
        "address": {
            "city": "Lyon"
        },
    });
    let map = user.as_object().unwrap();
    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["name", "age", "address"]);
    assert_eq!(map.get("age").and_then(Value::as_u64), Some(30));
    assert_eq!(
        map.get("address")
            .and_then(Value::as_object)
            .and_then(|a| a.get("city"))
            .and_then(Value::as_str),
        Some("Lyon")
    );
}

#[test]
fn test_colbin_macro_duplicate_keys_are_kept() {
    let value = colbin!({"tag": "a", "tag": "b"});
    let map = value.as_object().unwrap();
    assert_eq!(map.len(), 2);
    let tags: Vec<_> = map.get_all("tag").filter_map(Value::as_str).collect();
    assert_eq!(tags, vec!["a", "b"]);
}

#[test]
fn test_colbin_macro_expressions() {
    #[derive(Serialize)]
    struct Point {
        x: u8,
        y: u8,
    }

    let point = Point { x: 1, y: 2 };
    let raw = vec![0xcau8, 0xfe];
    let value = colbin!({"point": point, "raw": raw});
    assert_eq!(
        value.to_string(),
        r#"{"point": {"x": 1, "y": 2}, "raw": [202, 254]}"#
    );
}

#[test]
fn test_colbin_macro_binary_expression() {
    // Expressions go through serde, which only knows raw bytes
    let blob = Binary::with_extension(vec![1u8, 2, 3], "png");
    let value = colbin!([(Value::from(blob)), 1u8]);
    let binary = value.as_array().unwrap()[0].as_binary().unwrap();
    assert_eq!(binary.data, vec![1, 2, 3]);
    assert_eq!(binary.type_name(), "application/octet-stream");
}

#[test]
fn test_colbin_macro_into_document() {
    let value = colbin!({"list": [1u8, 2u8], "ok": true});
    let doc = Document::from_value(&value, DocOptions::new()).unwrap();
    assert_eq!(doc.to_value().unwrap(), value);
    assert_eq!(doc.to_json().unwrap(), r#"{"list": [1, 2], "ok": true}"#);
}
