//! Dot-path lookups and updates inside revisions.
//!
//! Run with: cargo run --example revisions

use colbin::{to_document, DocOptions, Error as ColbinError, PathStatus};
use serde::Serialize;
use std::error::Error;

#[derive(Serialize)]
struct Order {
    id: u32,
    customer: String,
    lines: Vec<Line>,
}

#[derive(Serialize)]
struct Line {
    sku: String,
    quantity: u8,
}

fn main() -> Result<(), Box<dyn Error>> {
    let order = Order {
        id: 1042,
        customer: "ACME".to_string(),
        lines: vec![
            Line {
                sku: "BOLT-M6".to_string(),
                quantity: 40,
            },
            Line {
                sku: "NUT-M6".to_string(),
                quantity: 40,
            },
        ],
    };
    let doc = to_document(&order, DocOptions::new())?;
    println!("v{}: {}", doc.commit_hash()?, doc.to_json()?);

    let mut rev = doc.revise();
    rev.set("lines.0.quantity", 50u8)?;
    rev.set("lines.1.quantity", 1000u16)?;
    rev.remove("customer")?;
    match rev.set_string("lines.0.sku", "BOLT-M8") {
        Err(ColbinError::NotImplemented(what)) => println!("skipped: {}", what),
        other => println!("unexpected: {:?}", other),
    }
    let doc = rev.commit()?;
    println!("v{}: {}", doc.commit_hash()?, doc.to_json()?);

    let mut rev = doc.revise();
    rev.set("id", 0u32)?;
    rev.abort();
    println!("after abort, id = {:?}", doc.find("id")?.as_u64());

    for path in ["lines.1.quantity", "lines.7", "id.x", "lines.sku"] {
        let found = doc.find(path)?;
        match found.status() {
            PathStatus::Resolved => println!(
                "{:<18} {} = {}",
                path,
                found.result_type().map(|t| t.to_string()).unwrap_or_default(),
                found.to_json().unwrap_or_default()
            ),
            status => println!("{:<18} {:?}", path, status),
        }
    }

    Ok(())
}
