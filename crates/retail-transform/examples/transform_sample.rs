//! Example: running the transform stage over a small in-memory extract
//!
//! ```bash
//! RUST_LOG=debug cargo run -p retail-transform --example transform_sample
//! ```

use retail_ir::{Column, ColumnType, ExtractedDataset, Table, Value};
use retail_transform::{TransformOptions, Transformer};

fn text(name: &str) -> Column {
    Column::nullable(name, ColumnType::Text(50))
}

fn int(name: &str) -> Column {
    Column::nullable(name, ColumnType::Integer)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let stock = Table::from_rows(
        vec![text("product"), text("color"), int("total_on_hand"), int("in_transit")],
        vec![
            vec![Value::text("A"), Value::text("Red"), Value::Integer(100), Value::Integer(20)],
            vec![Value::text("A"), Value::text("Red"), Value::Integer(200), Value::Integer(50)],
            vec![Value::text("B"), Value::text("Blue"), Value::Integer(150), Value::Integer(30)],
            vec![Value::text("C"), Value::text("Black"), Value::Integer(10), Value::Integer(10)],
        ],
    )?;

    let store = Table::from_rows(
        vec![int("store_id"), text("state"), text("city")],
        vec![
            vec![Value::Integer(1), Value::text("SP"), Value::text("São Paulo")],
            vec![Value::Integer(2), Value::text("RJ"), Value::text("Rio de Janeiro")],
        ],
    )?;

    let products = Table::from_rows(
        vec![text("article"), text("description")],
        vec![vec![Value::text("A"), Value::text("Basic tee")]],
    )?;

    let sales = Table::from_rows(
        vec![int("store_id"), text("product"), text("color"), int("units_sold")],
        vec![
            vec![Value::Integer(1), Value::text("A"), Value::text("Red"), Value::Integer(23)],
            vec![Value::Integer(2), Value::text("B"), Value::text("Blue"), Value::Integer(12)],
            vec![Value::Integer(2), Value::text("C"), Value::text("Black"), Value::Null],
        ],
    )?;

    let transformer = Transformer::new(TransformOptions {
        parallel: true,
        ..Default::default()
    });
    let bundle = transformer.transform(ExtractedDataset {
        stock,
        store,
        products,
        sales,
    })?;

    println!("Bundle fingerprint: {}", bundle.fingerprint()?);
    for (name, table) in bundle.iter() {
        println!("\n{} ({} rows)", name, table.len());
        println!("  {}", table.column_names().join(" | "));
        for row in table.rows() {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            println!("  {}", cells.join(" | "));
        }
    }

    Ok(())
}
