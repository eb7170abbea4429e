//! Cell conversion between pipeline values and DuckDB

use chrono::NaiveDate;
use duckdb::types::{Value as DuckValue, ValueRef};
use retail_ir::{ColumnType, Decimal, Value};
use rust_decimal::RoundingStrategy;

/// Days from 0001-01-01 (day 1) to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Parameter for a cell bound into `CAST(? AS <type>)`.
///
/// Decimals are rounded to `scale` when the destination declares one; dates
/// and decimals travel as text and are cast by DuckDB.
pub(crate) fn to_param(value: &Value, scale: Option<u32>) -> DuckValue {
    match value {
        Value::Null => DuckValue::Null,
        Value::Integer(i) => DuckValue::BigInt(*i),
        Value::Decimal(d) => {
            let d = match scale {
                Some(s) => d.round_dp_with_strategy(s, RoundingStrategy::MidpointAwayFromZero),
                None => *d,
            };
            DuckValue::Text(d.to_string())
        }
        Value::Text(s) => DuckValue::Text(s.clone()),
        Value::Date(d) => DuckValue::Text(d.format("%Y-%m-%d").to_string()),
    }
}

/// Scale of a `DECIMAL(p,s)` type name as reported by information_schema
pub(crate) fn decimal_scale(data_type: &str) -> Option<u32> {
    let args = data_type.strip_prefix("DECIMAL(")?.strip_suffix(')')?;
    let (_, scale) = args.split_once(',')?;
    scale.trim().parse().ok()
}

/// Convert a result cell, or `None` when the DuckDB type has no counterpart
pub(crate) fn from_value_ref(value: ValueRef<'_>) -> Option<Value> {
    let value = match value {
        ValueRef::Null => Value::Null,
        ValueRef::TinyInt(i) => Value::Integer(i.into()),
        ValueRef::SmallInt(i) => Value::Integer(i.into()),
        ValueRef::Int(i) => Value::Integer(i.into()),
        ValueRef::BigInt(i) => Value::Integer(i),
        ValueRef::UTinyInt(i) => Value::Integer(i.into()),
        ValueRef::USmallInt(i) => Value::Integer(i.into()),
        ValueRef::UInt(i) => Value::Integer(i.into()),
        // SUM over BIGINT comes back as HUGEINT
        ValueRef::HugeInt(i) => Value::Integer(i64::try_from(i).ok()?),
        ValueRef::UBigInt(i) => Value::Integer(i64::try_from(i).ok()?),
        ValueRef::Float(f) => Value::Decimal(Decimal::from_f64_retain(f.into())?),
        ValueRef::Double(f) => Value::Decimal(Decimal::from_f64_retain(f)?),
        ValueRef::Decimal(d) => Value::Decimal(d),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Date32(days) => Value::Date(NaiveDate::from_num_days_from_ce_opt(
            days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?,
        )?),
        _ => return None,
    };
    Some(value)
}

/// Column type for a query result column, from its first non-null cell
pub(crate) fn infer_type<'a>(values: impl IntoIterator<Item = &'a Value>) -> ColumnType {
    for value in values {
        match value {
            Value::Null => continue,
            Value::Integer(_) => return ColumnType::BigInt,
            Value::Decimal(d) => {
                return ColumnType::Decimal {
                    precision: 38,
                    scale: d.scale() as u8,
                }
            }
            Value::Date(_) => return ColumnType::Date,
            Value::Text(_) => break,
        }
    }
    ColumnType::Text(255)
}
