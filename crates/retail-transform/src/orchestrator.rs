//! Transform orchestration
//!
//! Dependency order:
//! 1. clean stock, store, products, sales (independent)
//! 2. available_stock <- stock
//! 3. sales_velocity  <- sales, available_stock
//! 4. sales_by_region <- sales, store (independent of 2-3)
//! 5. assemble the bundle
//!
//! With `parallel` set, step 1 runs one scoped thread per table and step 4
//! runs alongside steps 2-3. Output is identical either way.

use std::panic;
use std::thread;
use std::time::Instant;

use retail_ir::contract::{AVAILABLE_STOCK, PRODUCTS, SALES, SALES_BY_REGION, SALES_VELOCITY, STOCK, STORE};
use retail_ir::{ExtractedDataset, Table, TransformedBundle};
use serde::{Deserialize, Serialize};

use crate::{available_stock, sales_by_region, sales_velocity, Cleaner, FillPolicy, TransformError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformOptions {
    #[serde(default)]
    pub fill_policy: FillPolicy,
    #[serde(default)]
    pub parallel: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Transformer {
    cleaner: Cleaner,
    parallel: bool,
}

impl Transformer {
    pub fn new(options: TransformOptions) -> Self {
        Self {
            cleaner: Cleaner::new(options.fill_policy),
            parallel: options.parallel,
        }
    }

    /// Run every transform over the extract and return the complete bundle.
    ///
    /// Either all seven tables are produced or an error is returned.
    pub fn transform(&self, dataset: ExtractedDataset) -> Result<TransformedBundle, TransformError> {
        let started = Instant::now();
        tracing::info!(
            stock = dataset.stock.len(),
            store = dataset.store.len(),
            products = dataset.products.len(),
            sales = dataset.sales.len(),
            parallel = self.parallel,
            "Starting transform"
        );

        let [stock, store, products, sales] = self.clean_all(&dataset)?;
        drop(dataset);

        let (derived, by_region) = if self.parallel {
            thread::scope(|scope| {
                let region = scope.spawn(|| sales_by_region(&sales, &store));
                let derived = stock_branch(&stock, &sales);
                (derived, join_scoped(region))
            })
        } else {
            (stock_branch(&stock, &sales), sales_by_region(&sales, &store))
        };
        let (available, velocity) = derived?;
        let by_region = by_region?;

        let bundle = TransformedBundle::new()
            .with_table(SALES, sales)
            .with_table(STOCK, stock)
            .with_table(STORE, store)
            .with_table(PRODUCTS, products)
            .with_table(AVAILABLE_STOCK, available)
            .with_table(SALES_VELOCITY, velocity)
            .with_table(SALES_BY_REGION, by_region);

        for (name, table) in bundle.iter() {
            tracing::debug!(table = name, rows = table.len(), "Bundle table ready");
        }
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Transform complete"
        );

        Ok(bundle)
    }

    fn clean_all(&self, dataset: &ExtractedDataset) -> Result<[Table; 4], TransformError> {
        let inputs = [&dataset.stock, &dataset.store, &dataset.products, &dataset.sales];

        let [stock, store, products, sales] = if self.parallel {
            let cleaner = self.cleaner;
            thread::scope(|scope| {
                inputs
                    .map(|table| scope.spawn(move || cleaner.clean(table)))
                    .map(join_scoped)
            })
        } else {
            inputs.map(|table| self.cleaner.clean(table))
        };

        Ok([stock?, store?, products?, sales?])
    }
}

fn stock_branch(stock: &Table, sales: &Table) -> Result<(Table, Table), TransformError> {
    let available = available_stock(stock)?;
    let velocity = sales_velocity(sales, &available)?;
    Ok((available, velocity))
}

fn join_scoped<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|payload| panic::resume_unwind(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use retail_ir::{Column, ColumnType, Value, BUNDLE_TABLES};

    fn text(columns: &[&str]) -> Vec<Column> {
        columns
            .iter()
            .map(|c| Column::nullable(*c, ColumnType::Text(50)))
            .collect()
    }

    fn dataset() -> ExtractedDataset {
        let mut stock_cols = text(&["product", "color"]);
        stock_cols.push(Column::nullable("total_on_hand", ColumnType::Integer));
        stock_cols.push(Column::nullable("in_transit", ColumnType::Integer));
        let stock = Table::from_rows(
            stock_cols,
            vec![
                vec![Value::text("A"), Value::text("Red"), Value::Integer(100), Value::Integer(20)],
                vec![Value::text("A"), Value::text("Red"), Value::Integer(100), Value::Integer(20)],
                vec![Value::text("B"), Value::text("Blue"), Value::Integer(10), Value::Integer(10)],
            ],
        )
        .unwrap();

        let mut store_cols = vec![Column::nullable("store_id", ColumnType::Integer)];
        store_cols.extend(text(&["state", "city"]));
        let store = Table::from_rows(
            store_cols,
            vec![vec![Value::Integer(1), Value::text("SP"), Value::text("Campinas")]],
        )
        .unwrap();

        let products = Table::from_rows(text(&["article"]), vec![vec![Value::text("A")]]).unwrap();

        let mut sales_cols = vec![Column::nullable("store_id", ColumnType::Integer)];
        sales_cols.extend(text(&["product", "color"]));
        sales_cols.push(Column::nullable("units_sold", ColumnType::Integer));
        let sales = Table::from_rows(
            sales_cols,
            vec![
                vec![Value::Integer(1), Value::text("A"), Value::text("Red"), Value::Integer(8)],
                vec![Value::Integer(1), Value::text("B"), Value::text("Blue"), Value::Integer(2)],
                vec![Value::Integer(7), Value::text("A"), Value::text("Red"), Value::Null],
            ],
        )
        .unwrap();

        ExtractedDataset {
            stock,
            store,
            products,
            sales,
        }
    }

    #[test]
    fn test_bundle_has_all_tables() {
        let bundle = Transformer::default().transform(dataset()).unwrap();
        assert_eq!(bundle.names().collect::<Vec<_>>(), BUNDLE_TABLES.to_vec());

        // duplicate stock row removed before aggregation
        assert_eq!(bundle.get(STOCK).unwrap().len(), 2);
        let available = bundle.get(AVAILABLE_STOCK).unwrap();
        assert_eq!(available.value(0, "available_quantity"), Some(&Value::Integer(80)));

        // B/Blue has zero available stock; the null-units sale was filled with 0
        let velocity = bundle.get(SALES_VELOCITY).unwrap();
        assert_eq!(velocity.len(), 2);
        assert_eq!(velocity.value(1, "units_sold"), Some(&Value::Integer(0)));

        let region = bundle.get(SALES_BY_REGION).unwrap();
        assert_eq!(region.value(0, "total_units_sold"), Some(&Value::Integer(10)));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = Transformer::default().transform(dataset()).unwrap();
        let parallel = Transformer::new(TransformOptions {
            parallel: true,
            ..Default::default()
        })
        .transform(dataset())
        .unwrap();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_structural_error_yields_no_bundle() {
        let mut data = dataset();
        data.stock = Table::from_rows(text(&["product"]), vec![vec![Value::text("A")]]).unwrap();

        let err = Transformer::default().transform(data).unwrap_err();
        assert!(matches!(err, TransformError::MissingColumn { ref column, .. } if column == "color"));
    }
}
