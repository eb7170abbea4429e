//! Sales velocity: units sold relative to available stock

use retail_ir::contract::col;
use retail_ir::{Column, ColumnType, Table, Value};

use crate::join::inner_join;
use crate::{require_columns, TransformError};

const VELOCITY_TYPE: ColumnType = ColumnType::Decimal {
    precision: 18,
    scale: 6,
};

/// Join sales to available stock on `(product, color)` and append
/// `velocity = units_sold / available_quantity`.
///
/// Rows without a stock match are dropped, and so are rows whose velocity
/// is undefined: zero available stock or a non-numeric operand. Output
/// columns are the sales columns, `available_quantity`, then `velocity`.
pub fn sales_velocity(sales: &Table, available_stock: &Table) -> Result<Table, TransformError> {
    require_columns(sales, "sales", &[col::PRODUCT, col::COLOR, col::UNITS_SOLD])?;
    require_columns(
        available_stock,
        "available_stock",
        &[col::PRODUCT, col::COLOR, col::AVAILABLE_QUANTITY],
    )?;

    let joined = inner_join(sales, available_stock, &[col::PRODUCT, col::COLOR])?;
    let units = joined.require_column(col::UNITS_SOLD)?;
    let available = joined.require_column(col::AVAILABLE_QUANTITY)?;

    let mut columns = joined.columns().to_vec();
    columns.push(Column::nullable(col::VELOCITY, VELOCITY_TYPE));
    let mut out = Table::new(columns)?;

    let mut undefined = 0usize;
    for row in joined.rows() {
        let velocity = row[units]
            .as_decimal()
            .zip(row[available].as_decimal())
            .and_then(|(units, available)| units.checked_div(available));

        match velocity {
            Some(v) => {
                let mut row = row.clone();
                row.push(Value::Decimal(v));
                out.push_row(row)?;
            }
            None => undefined += 1,
        }
    }

    tracing::debug!(
        joined = joined.len(),
        undefined,
        rows = out.len(),
        "Computed sales velocity"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use retail_ir::Decimal;

    fn sales(rows: &[(&str, &str, i64)]) -> Table {
        Table::from_rows(
            vec![
                Column::required("product", ColumnType::Text(50)),
                Column::required("color", ColumnType::Text(50)),
                Column::nullable("units_sold", ColumnType::Integer),
            ],
            rows.iter()
                .map(|(p, c, u)| vec![Value::text(*p), Value::text(*c), Value::Integer(*u)])
                .collect(),
        )
        .unwrap()
    }

    fn stock(rows: &[(&str, &str, i64)]) -> Table {
        Table::from_rows(
            vec![
                Column::nullable("product", ColumnType::Text(255)),
                Column::nullable("color", ColumnType::Text(255)),
                Column::nullable("available_quantity", ColumnType::BigInt),
            ],
            rows.iter()
                .map(|(p, c, q)| vec![Value::text(*p), Value::text(*c), Value::Integer(*q)])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_zero_stock_row_dropped() {
        let out = sales_velocity(
            &sales(&[("A", "Red", 10), ("B", "Blue", 15), ("C", "Black", 5)]),
            &stock(&[("A", "Red", 100), ("B", "Blue", 50), ("C", "Black", 0)]),
        )
        .unwrap();

        assert_eq!(
            out.column_names(),
            vec!["product", "color", "units_sold", "available_quantity", "velocity"]
        );
        assert_eq!(
            out.rows(),
            &[
                vec![
                    Value::text("A"),
                    Value::text("Red"),
                    Value::Integer(10),
                    Value::Integer(100),
                    Value::Decimal(Decimal::new(1, 1)),
                ],
                vec![
                    Value::text("B"),
                    Value::text("Blue"),
                    Value::Integer(15),
                    Value::Integer(50),
                    Value::Decimal(Decimal::new(3, 1)),
                ],
            ]
        );
    }

    #[test]
    fn test_unmatched_sales_excluded() {
        let out = sales_velocity(
            &sales(&[("A", "Red", 10), ("A", "Green", 4)]),
            &stock(&[("A", "Red", 20), ("Q", "Red", 20)]),
        )
        .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out.value(0, "color"), Some(&Value::text("Red")));
    }

    #[test]
    fn test_null_units_are_undefined() {
        let mut input = sales(&[]);
        input
            .push_row(vec![Value::text("A"), Value::text("Red"), Value::Null])
            .unwrap();

        let out = sales_velocity(&input, &stock(&[("A", "Red", 20)])).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_negative_stock_gives_negative_velocity() {
        let out = sales_velocity(&sales(&[("A", "Red", 6)]), &stock(&[("A", "Red", -3)])).unwrap();
        assert_eq!(out.value(0, "velocity"), Some(&Value::Decimal(Decimal::from(-2))));
    }
}
