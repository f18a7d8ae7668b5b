//! Columns: packed fixed-width slots with null sentinels.
//!
//! Run with: cargo run --example columns

use colbin::{ColumnType, Derivation, DocOptions, Document, Root, Scalar};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let mut doc = Document::with_options(DocOptions::compact());

    let growths = {
        let mut ins = doc.inserter()?;
        ins.begin_column(ColumnType::U32, Derivation::SortedSet)?;
        for i in 0..1_000u32 {
            ins.insert(i * 3)?;
        }
        let growths = ins.column_growths();
        ins.end_column()?;

        ins.begin_column(ColumnType::Bool, Derivation::default())?;
        ins.insert(true)?;
        ins.insert(None::<bool>)?;
        ins.insert(false)?;
        ins.end_column()?;
        ins.finish()?;
        growths
    };
    println!("1000 appends, {} reallocations", growths);

    if let Root::Array(mut root) = doc.root_mut()? {
        root.next()?;
        let mut numbers = root.column_value()?;
        println!(
            "{} slots of {}, {}",
            numbers.value_count(),
            numbers.element_type(),
            numbers.derivation()
        );
        println!("slot 500 = {}", numbers.at(500)?);

        numbers.set(500, None::<u32>)?;
        println!("slot 500 after clearing = {}", numbers.at(500)?);
        assert_eq!(numbers.at(500)?, Scalar::Null);

        numbers.remove_at(0)?;
        println!("slot 0 after removing the first = {}", numbers.at(0)?);
    }

    let flags = doc.find("1")?;
    println!("flags = {}", flags.to_json().unwrap_or_default());
    println!("flags.1 is null: {}", doc.find("1.1")?.is_null());

    Ok(())
}
