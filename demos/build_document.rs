//! Building a nested document with the inserter, then reading it back.
//!
//! Run with: cargo run --example build_document

use colbin::{ColumnType, Derivation, DocOptions, Document, KeyKind, Root, RootKind};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let options = DocOptions::new()
        .with_root(RootKind::Object)
        .with_key(KeyKind::String("station/lyon-02".to_string()));
    let mut doc = Document::with_options(options);

    {
        let mut ins = doc.inserter()?;
        ins.insert_prop_string("name", "Lyon Part-Dieu")?;
        ins.insert_prop("elevation", 173u16)?;
        ins.insert_prop("active", true)?;

        ins.begin_prop_object("location", Derivation::UnsortedSet)?;
        ins.insert_prop("lat", 45.76f32)?;
        ins.insert_prop("lon", 4.86f32)?;
        ins.end_object()?;

        ins.begin_prop_array("tags", Derivation::SortedSet)?;
        for tag in ["rail", "tram", "urban"] {
            ins.insert_string(tag)?;
        }
        ins.end_array()?;

        ins.begin_prop_column("hourly", ColumnType::I16, Derivation::default())?;
        for reading in [12i16, 14, 15] {
            ins.insert(reading)?;
        }
        ins.insert(None::<i16>)?;
        ins.end_column()?;

        ins.insert_prop_binary("logo", &[0x89, b'P', b'N', b'G'], "png")?;
        ins.finish()?;
    }

    println!("Key:  {}", doc.key()?);
    println!("JSON: {}", doc.to_json()?);
    println!("Size: {} bytes", doc.len());

    if let Root::Object(mut root) = doc.root()? {
        while root.next()? {
            println!("  {:<10} {}", root.key()?, root.current_field_type()?);
        }
    }

    doc.shrink()?;
    println!("Size after shrink: {} bytes", doc.len());

    let reopened = Document::from_bytes(doc.as_bytes().to_vec())?;
    assert_eq!(reopened.to_value()?, doc.to_value()?);
    println!("✓ Reopened from bytes");

    Ok(())
}
