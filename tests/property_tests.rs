//! Property-based tests for the encoding and mutation guarantees
//!
//! These complement the example-based tests by checking invariants across
//! generated documents: varuint widths, value round-trips (columns
//! included), symmetric insert/remove and logarithmic column growth.

use colbin::varuint::{decode_varuint, varuint_bytes, varuint_len};
use colbin::{ColumnType, Derivation, DocMap, DocOptions, Document, Root, Scalar, Value};
use proptest::prelude::*;

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<u8>().prop_map(Value::from),
        any::<u32>().prop_map(Value::from),
        any::<i16>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f32>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Value::from),
        ".{0,12}".prop_map(Value::from),
    ]
}

fn column_of<T>(ty: ColumnType, items: Vec<Option<T>>) -> Value
where
    T: Into<Scalar>,
{
    Value::column(ty, items.into_iter().map(Scalar::from).collect())
}

/// Columns whose values never collide with the null sentinel.
fn arb_column() -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::collection::vec(prop::option::of(0u8..u8::MAX), 0..8)
            .prop_map(|items| column_of(ColumnType::U8, items)),
        prop::collection::vec(prop::option::of(0u64..u64::MAX), 0..8)
            .prop_map(|items| column_of(ColumnType::U64, items)),
        prop::collection::vec(prop::option::of((i16::MIN + 1)..=i16::MAX), 0..8)
            .prop_map(|items| column_of(ColumnType::I16, items)),
        prop::collection::vec(
            prop::option::of(any::<f32>().prop_filter("finite", |f| f.is_finite())),
            0..8
        )
        .prop_map(|items| column_of(ColumnType::Float, items)),
        prop::collection::vec(prop::option::of(any::<bool>()), 0..8)
            .prop_map(|items| column_of(ColumnType::Bool, items)),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![4 => arb_scalar(), 1 => arb_column()];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::array),
            prop::collection::vec(("[a-z]{1,8}", inner), 0..6).prop_map(|entries| {
                let mut map = DocMap::new();
                for (key, value) in entries {
                    map.insert(key, value);
                }
                Value::object(map)
            }),
        ]
    })
}

fn arb_root() -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::collection::vec(arb_value(), 0..6).prop_map(Value::array),
        prop::collection::vec(("[a-z]{1,8}", arb_value()), 0..6).prop_map(|entries| {
            let mut map = DocMap::new();
            for (key, value) in entries {
                map.insert(key, value);
            }
            Value::object(map)
        }),
    ]
}

proptest! {
    #[test]
    fn prop_varuint_is_minimal(v in any::<u64>()) {
        let bytes = varuint_bytes(v);
        prop_assert_eq!(bytes.len(), varuint_len(v));
        prop_assert_eq!(decode_varuint(&bytes).unwrap(), (v, bytes.len()));
        if bytes.len() > 1 {
            prop_assert_ne!(bytes[bytes.len() - 1], 0);
        }
    }

    #[test]
    fn prop_value_round_trip(value in arb_root()) {
        let doc = Document::from_value(&value, DocOptions::new()).unwrap();
        prop_assert_eq!(doc.to_value().unwrap(), value.clone());

        let reopened = Document::from_bytes(doc.as_bytes().to_vec()).unwrap();
        prop_assert_eq!(reopened.to_value().unwrap(), value);
    }

    #[test]
    fn prop_shrink_preserves_value(value in arb_root()) {
        let mut doc = Document::from_value(&value, DocOptions::new()).unwrap();
        let before = doc.len();
        doc.shrink().unwrap();
        prop_assert!(doc.len() <= before);
        prop_assert_eq!(doc.to_value().unwrap(), value.clone());

        let packed = Document::from_value(&value, DocOptions::compact()).unwrap();
        prop_assert_eq!(doc.as_bytes(), packed.as_bytes());
    }

    #[test]
    fn prop_insert_then_remove_restores_bytes(
        items in prop::collection::vec(any::<u8>(), 0..12),
        at in any::<prop::sample::Index>(),
        text in "[a-z]{0,20}",
    ) {
        let value = Value::array(items.iter().copied().map(Value::from).collect());
        let mut doc = Document::from_value(&value, DocOptions::compact()).unwrap();
        let original = doc.as_bytes().to_vec();
        let idx = at.index(items.len() + 1);

        {
            let Root::Array(mut root) = doc.root_mut().unwrap() else {
                panic!("expected array root");
            };
            for _ in 0..=idx {
                root.next().unwrap();
            }
            let mut ins = root.insert_here().unwrap();
            ins.insert_string(&text).unwrap();
            ins.finish().unwrap();
        }
        let found = doc.find(&idx.to_string()).unwrap();
        prop_assert_eq!(found.as_str(), Some(text.as_str()));

        {
            let Root::Array(mut root) = doc.root_mut().unwrap() else {
                panic!("expected array root");
            };
            for _ in 0..=idx {
                root.next().unwrap();
            }
            root.remove().unwrap();
        }
        prop_assert_eq!(doc.as_bytes(), original.as_slice());
    }

    #[test]
    fn prop_column_growth_is_logarithmic(n in 1usize..3000) {
        let mut doc = Document::with_options(DocOptions::compact());
        let growths = {
            let mut ins = doc.inserter().unwrap();
            ins.begin_column(ColumnType::U32, Derivation::default()).unwrap();
            for i in 0..n {
                ins.insert(i as u32).unwrap();
            }
            let growths = ins.column_growths();
            ins.end_column().unwrap();
            ins.finish().unwrap();
            growths
        };
        let bound = (n as f64).ln() / 1.7f64.ln() + 2.0;
        prop_assert!((growths as f64) <= bound, "{} growths for {} appends", growths, n);
        prop_assert_eq!(doc.find(&format!("0.{}", n - 1)).unwrap().as_u64(), Some((n - 1) as u64));
    }
}
