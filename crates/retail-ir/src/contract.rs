//! Stage contracts: the raw extract and the transformed bundle

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::Table;

pub const STOCK: &str = "stock";
pub const STORE: &str = "store";
pub const PRODUCTS: &str = "products";
pub const SALES: &str = "sales";
pub const AVAILABLE_STOCK: &str = "available_stock";
pub const SALES_VELOCITY: &str = "sales_velocity";
pub const SALES_BY_REGION: &str = "sales_by_region";

/// Logical names of the raw extract
pub const RAW_TABLES: [&str; 4] = [STOCK, STORE, PRODUCTS, SALES];

/// Destination names of the transformed bundle, in insertion order
pub const BUNDLE_TABLES: [&str; 7] = [
    SALES,
    STOCK,
    STORE,
    PRODUCTS,
    AVAILABLE_STOCK,
    SALES_VELOCITY,
    SALES_BY_REGION,
];

/// Canonical column names referenced by the transform stage
pub mod col {
    pub const PRODUCT: &str = "product";
    pub const COLOR: &str = "color";
    pub const TOTAL_ON_HAND: &str = "total_on_hand";
    pub const IN_TRANSIT: &str = "in_transit";
    pub const STORE_ID: &str = "store_id";
    pub const STATE: &str = "state";
    pub const CITY: &str = "city";
    pub const UNITS_SOLD: &str = "units_sold";
    pub const AVAILABLE_QUANTITY: &str = "available_quantity";
    pub const VELOCITY: &str = "velocity";
    pub const TOTAL_UNITS_SOLD: &str = "total_units_sold";
}

#[derive(Debug, Error, PartialEq)]
pub enum ContractError {
    #[error("Missing table: {0}")]
    MissingTable(String),

    #[error("Unexpected table: {0}")]
    UnexpectedTable(String),
}

/// The four raw tables produced by extraction
#[derive(Debug, Clone)]
pub struct ExtractedDataset {
    pub stock: Table,
    pub store: Table,
    pub products: Table,
    pub sales: Table,
}

impl ExtractedDataset {
    /// Build from a name -> table mapping holding exactly the four raw names
    pub fn from_tables(mut tables: HashMap<String, Table>) -> Result<Self, ContractError> {
        let mut take = |name: &str| {
            tables
                .remove(name)
                .ok_or_else(|| ContractError::MissingTable(name.to_string()))
        };

        let dataset = Self {
            stock: take(STOCK)?,
            store: take(STORE)?,
            products: take(PRODUCTS)?,
            sales: take(SALES)?,
        };

        if let Some(extra) = tables.into_keys().min() {
            return Err(ContractError::UnexpectedTable(extra));
        }

        Ok(dataset)
    }
}

/// Named tables handed from transform to load.
///
/// Keeps insertion order; inserting an existing name replaces its table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformedBundle {
    tables: Vec<(String, Table)>,
}

impl TransformedBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: impl Into<String>, table: Table) -> Self {
        self.insert(name, table);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, table: Table) {
        let name = name.into();
        match self.tables.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = table,
            None => self.tables.push((name, table)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.tables.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// SHA-256 over the canonical JSON of every table, in bundle order
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let mut hasher = Sha256::new();
        for (name, table) in &self.tables {
            hasher.update(name.as_bytes());
            serde_json::to_writer(&mut hasher, table)?;
        }
        Ok(format!("{:x}", hasher.finalize()))
    }
}
