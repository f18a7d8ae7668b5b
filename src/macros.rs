/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// Arrays and objects nest; any other token tree goes through
/// [`to_value`](crate::to_value), so number literals keep their suffix type
/// (`7u8` becomes a `u8` field, an unsuffixed `7` an `i32`). A negative number
/// is two tokens and has to be wrapped in parentheses.
///
/// ```rust
/// use colbin::{colbin, Value};
///
/// let value = colbin!({
///     "id": 7u8,
///     "delta": (-3i16),
///     "tags": ["a", "b"],
///     "extra": null
/// });
/// assert_eq!(value.to_string(), r#"{"id": 7, "delta": -3, "tags": ["a", "b"], "extra": null}"#);
/// ```
#[macro_export]
macro_rules! colbin {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::array(vec![$($crate::colbin!($elem)),*])
    };

    ({}) => {
        $crate::Value::object($crate::DocMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::DocMap::new();
        $(
            object.insert($key, $crate::colbin!($value));
        )*
        $crate::Value::object(object)
    }};

    ($s:expr) => {{
        $crate::to_value(&$s).unwrap_or($crate::Value::Null)
    }};
}

#[cfg(test)]
mod tests {
    use crate::{DocMap, Number, Value};

    #[test]
    fn test_colbin_macro_primitives() {
        assert_eq!(colbin!(null), Value::Null);
        assert_eq!(colbin!(true), Value::Bool(true));
        assert_eq!(colbin!(42), Value::Number(Number::I32(42)));
        assert_eq!(colbin!(42u64), Value::Number(Number::U64(42)));
        assert_eq!(colbin!((-1i8)), Value::Number(Number::I8(-1)));
        assert_eq!(colbin!(3.5f32), Value::Number(Number::Float(3.5)));
        assert_eq!(colbin!("hello"), Value::String("hello".to_string()));
    }

    #[test]
    fn test_colbin_macro_containers() {
        assert_eq!(colbin!([]), Value::array(vec![]));
        assert_eq!(colbin!({}), Value::object(DocMap::new()));

        let obj = colbin!({
            "name": "Alice",
            "pair": [1u8, null],
            "name": "Bob"
        });
        let map = obj.as_object().unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("name"), Some(&Value::from("Alice")));
        assert_eq!(
            map.get("pair"),
            Some(&Value::array(vec![Value::from(1u8), Value::Null]))
        );
    }
}
