use colbin::codec::MAX_DEPTH;
use colbin::{
    colbin, from_slice, ColumnType, Derivation, DocKey, DocOptions, Document, Error, FieldType,
    IterState, KeyKind, Root, RootKind, Scalar, Value,
};

fn sample() -> Document {
    let mut doc = Document::new();
    {
        let mut ins = doc.inserter().unwrap();
        ins.insert(1u8).unwrap();
        ins.begin_object(Derivation::UnsortedSet).unwrap();
        ins.insert_prop_string("name", "probe").unwrap();
        ins.insert_prop("weight", 2.5f32).unwrap();
        ins.begin_prop_column("samples", ColumnType::I16, Derivation::default())
            .unwrap();
        for v in [-3i16, 0, 12] {
            ins.insert(v).unwrap();
        }
        ins.insert(None::<i16>).unwrap();
        ins.end_column().unwrap();
        ins.end_object().unwrap();
        ins.insert_string("tail").unwrap();
        ins.finish().unwrap();
    }
    doc
}

#[test]
fn test_empty_document_layout() {
    let doc = Document::with_options(DocOptions::compact());
    let mut expected = vec![b'?'];
    expected.extend_from_slice(&[0; 8]);
    expected.extend_from_slice(b"[]");
    assert_eq!(doc.as_bytes(), expected.as_slice());
    assert_eq!(doc.to_json().unwrap(), "[]");
    assert_eq!(doc.key().unwrap(), DocKey::None);
    assert_eq!(doc.commit_hash().unwrap(), 0);
}

#[test]
fn test_nested_build_renders() {
    let doc = sample();
    assert_eq!(
        doc.to_json().unwrap(),
        r#"[1, {"name": "probe", "weight": 2.50, "samples": [-3, 0, 12, null]}, "tail"]"#
    );
}

#[test]
fn test_iterate_root_and_nested_object() {
    let doc = sample();
    let Root::Array(mut root) = doc.root().unwrap() else {
        panic!("expected array root");
    };
    assert_eq!(root.state(), IterState::BeforeFirst);
    assert_eq!(root.u64_value(), Err(Error::NotPositioned));

    assert!(root.next().unwrap());
    assert_eq!(root.state(), IterState::Positioned);
    assert_eq!(root.current_field_type().unwrap(), FieldType::U8);
    assert_eq!(root.u64_value().unwrap(), 1);

    assert!(root.next().unwrap());
    {
        let mut obj = root.object_value().unwrap();
        assert_eq!(obj.derivation(), Derivation::UnsortedSet);
        let mut keys = Vec::new();
        while obj.next().unwrap() {
            keys.push(obj.key().unwrap().to_string());
        }
        assert_eq!(keys, vec!["name", "weight", "samples"]);
        assert_eq!(obj.state(), IterState::AtEnd);
        assert!(obj.key().is_err());
    }

    assert!(root.next().unwrap());
    assert_eq!(root.string_value().unwrap(), "tail");
    assert!(!root.has_next().unwrap());
    assert!(!root.next().unwrap());
    assert!(!root.next().unwrap());
    assert_eq!(root.state(), IterState::AtEnd);

    root.rewind().unwrap();
    assert_eq!(root.state(), IterState::BeforeFirst);
    assert!(root.next().unwrap());
    assert_eq!(root.u64_value().unwrap(), 1);
}

#[test]
fn test_seek_key_and_column_access() {
    let doc = sample();
    let Root::Array(mut root) = doc.root().unwrap() else {
        panic!("expected array root");
    };
    root.next().unwrap();
    root.next().unwrap();
    let mut obj = root.into_object().unwrap();
    assert!(obj.seek_key("samples").unwrap());
    let column = obj.into_column().unwrap();
    assert_eq!(column.element_type(), ColumnType::I16);
    assert_eq!(column.value_count(), 4);
    assert_eq!(column.at(0).unwrap(), Scalar::from(-3i16));
    assert_eq!(column.at(3).unwrap(), Scalar::Null);
    assert!(matches!(column.at(4), Err(Error::OutOfBounds { .. })));
}

#[test]
fn test_read_only_root_rejects_mutation() {
    let doc = sample();
    let Root::Array(mut root) = doc.root().unwrap() else {
        panic!("expected array root");
    };
    root.next().unwrap();
    assert_eq!(root.set_current(2u8), Err(Error::WriteProtected));
    assert_eq!(root.remove(), Err(Error::WriteProtected));
}

#[test]
fn test_root_mut_edits_in_place() {
    let mut doc = sample();
    {
        let Root::Array(mut root) = doc.root_mut().unwrap() else {
            panic!("expected array root");
        };
        root.next().unwrap();
        root.set_current(7u8).unwrap();
        root.next().unwrap();
        root.remove().unwrap();
        assert!(root.next().unwrap());
        assert_eq!(root.string_value().unwrap(), "tail");
    }
    assert_eq!(doc.to_json().unwrap(), r#"[7, "tail"]"#);
}

#[test]
fn test_bytes_round_trip() {
    let doc = sample();
    let reopened = Document::from_bytes(doc.as_bytes().to_vec()).unwrap();
    assert_eq!(reopened.to_value().unwrap(), doc.to_value().unwrap());
    assert_eq!(reopened.root_kind(), RootKind::Array);
    assert_eq!(from_slice(doc.as_bytes()).unwrap(), doc.to_value().unwrap());
}

#[test]
fn test_from_bytes_rejects_malformed_input() {
    let doc = Document::from_value(&colbin!({"a": 1u8}), DocOptions::compact()).unwrap();
    let bytes = doc.as_bytes().to_vec();

    let mut truncated = bytes.clone();
    truncated.pop();
    assert!(Document::from_bytes(truncated).is_err());

    let mut trailing = bytes.clone();
    trailing.push(b'n');
    assert!(matches!(
        Document::from_bytes(trailing),
        Err(Error::Corrupted { .. })
    ));

    let mut bad_key = bytes.clone();
    bad_key[0] = b'#';
    assert_eq!(
        Document::from_bytes(bad_key),
        Err(Error::Corrupted {
            offset: 0,
            marker: b'#'
        })
    );

    let mut scalar_root = vec![b'?'];
    scalar_root.extend_from_slice(&[0; 8]);
    scalar_root.push(b'n');
    assert!(matches!(
        Document::from_bytes(scalar_root),
        Err(Error::Corrupted { offset: 9, .. })
    ));

    assert!(Document::from_bytes(Vec::new()).is_err());
}

#[test]
fn test_document_keys() {
    let doc = Document::with_options(
        DocOptions::compact().with_key(KeyKind::String("orders/17".to_string())),
    );
    assert_eq!(doc.key().unwrap(), DocKey::String("orders/17".to_string()));
    assert_eq!(doc.key().unwrap().to_string(), "orders/17");
    assert_eq!(doc.as_bytes()[0], b'!');
    assert_eq!(doc.root_offset(), 1 + 1 + 9 + 8);

    let reopened = Document::from_bytes(doc.as_bytes().to_vec()).unwrap();
    assert_eq!(reopened.key().unwrap(), doc.key().unwrap());

    let signed = Document::with_options(DocOptions::compact().with_key(KeyKind::Signed(-7)));
    assert_eq!(signed.key().unwrap(), DocKey::Signed(-7));
    assert_eq!(signed.root_offset(), 17);
}

#[test]
fn test_binary_fields() {
    let mut doc = Document::with_options(DocOptions::compact().with_root(RootKind::Object));
    {
        let mut ins = doc.inserter().unwrap();
        ins.insert_prop_binary("logo", &[1, 2, 3], "png").unwrap();
        ins.insert_prop_custom_binary("blob", b"hi", "app/x").unwrap();
        ins.insert_prop_binary("other", &[], "unknown").unwrap();
        ins.finish().unwrap();
    }
    let logo = doc.find("logo").unwrap();
    assert_eq!(logo.result_type(), Some(FieldType::Binary));
    let binary = logo.value().and_then(Value::as_binary).unwrap();
    assert_eq!(binary.type_name(), "image/png");
    assert_eq!(binary.data, vec![1, 2, 3]);
    assert_eq!(
        logo.to_json().unwrap(),
        r#"{"type": "image/png", "encoding": "base64", "binary-string": "AQID"}"#
    );

    let blob = doc.find("blob").unwrap();
    assert_eq!(blob.result_type(), Some(FieldType::CustomBinary));
    assert_eq!(blob.value().and_then(Value::as_binary).unwrap().type_name(), "app/x");

    let other = doc.find("other").unwrap();
    assert_eq!(
        other.value().and_then(Value::as_binary).unwrap().type_name(),
        "application/octet-stream"
    );
}

#[test]
fn test_key_colliding_with_end_marker() {
    let key = "k".repeat(125);
    let mut doc = Document::with_options(DocOptions::compact().with_root(RootKind::Object));
    {
        let mut ins = doc.inserter().unwrap();
        ins.insert_prop(&key, true).unwrap();
        ins.finish().unwrap();
    }
    let root = doc.root_offset() as usize;
    assert_eq!(&doc.as_bytes()[root + 1..root + 3], &[0xfd, 0x00]);
    assert_eq!(doc.find(&key).unwrap().as_bool(), Some(true));
    assert_eq!(doc.len(), root + 1 + 2 + 125 + 1 + 1);
}

#[test]
fn test_empty_key_is_rejected() {
    let mut doc = Document::with_options(DocOptions::compact().with_root(RootKind::Object));
    let mut ins = doc.inserter().unwrap();
    assert!(matches!(ins.insert_prop("", 1u8), Err(Error::NullArgument(_))));
    assert!(matches!(ins.insert(1u8), Err(Error::NullArgument(_))));
}

#[test]
fn test_shrink_drops_reserved_space() {
    let mut doc = Document::new();
    {
        let mut ins = doc.inserter().unwrap();
        ins.insert(true).unwrap();
        ins.finish().unwrap();
    }
    let padded = doc.len();
    doc.shrink().unwrap();
    assert!(doc.len() < padded);
    assert_eq!(doc.len(), 9 + 1 + 1 + 1);
    assert_eq!(doc.to_json().unwrap(), "[true]");
}

#[test]
fn test_from_value_scalar_root() {
    let doc = Document::from_value(&Value::from("alone"), DocOptions::new()).unwrap();
    assert_eq!(doc.root_kind(), RootKind::Array);
    assert_eq!(doc.to_json().unwrap(), r#"["alone"]"#);
}

#[test]
fn test_column_rejects_values_equal_to_null_sentinel() {
    let column = Value::array(vec![Value::column(
        ColumnType::U8,
        vec![Scalar::from(u8::MAX)],
    )]);
    assert!(matches!(
        Document::from_value(&column, DocOptions::new()),
        Err(Error::TypeMismatch { .. })
    ));

    let mut doc = Document::with_options(DocOptions::compact());
    {
        let mut ins = doc.inserter().unwrap();
        ins.begin_column(ColumnType::I64, Derivation::default())
            .unwrap();
        assert!(matches!(ins.insert(i64::MIN), Err(Error::TypeMismatch { .. })));
        ins.insert(i64::MIN + 1).unwrap();
        ins.insert(None::<i64>).unwrap();
        ins.end_column().unwrap();
        ins.finish().unwrap();
    }
    assert_eq!(doc.find("0.0").unwrap().as_i64(), Some(i64::MIN + 1));
    assert!(doc.find("0.1").unwrap().is_null());

    let mut rev = doc.revise();
    assert!(matches!(rev.set("0.0", i64::MIN), Err(Error::TypeMismatch { .. })));
    assert_eq!(rev.target().as_bytes(), doc.as_bytes());
}

#[test]
fn test_deeply_nested_input_is_rejected() {
    let mut bytes = vec![b'?'];
    bytes.extend_from_slice(&[0; 8]);
    bytes.extend(std::iter::repeat(b'[').take(200_000));
    assert_eq!(
        Document::from_bytes(bytes).map(|_| ()),
        Err(Error::Corrupted {
            offset: 9 + MAX_DEPTH as u64,
            marker: b'['
        })
    );
}

#[test]
fn test_inserter_nesting_limit() {
    let mut doc = Document::with_options(DocOptions::compact());
    {
        let mut ins = doc.inserter().unwrap();
        for _ in 1..MAX_DEPTH {
            ins.begin_array(Derivation::default()).unwrap();
        }
        assert_eq!(
            ins.begin_array(Derivation::default()),
            Err(Error::StackOverflow(MAX_DEPTH))
        );
        for _ in 1..MAX_DEPTH {
            ins.end_array().unwrap();
        }
        ins.finish().unwrap();
    }
    let reopened = Document::from_bytes(doc.as_bytes().to_vec()).unwrap();
    assert_eq!(reopened.to_value().unwrap(), doc.to_value().unwrap());
}
