//! Stock picker
//!
//! Searchable view over the static catalog. Committing a choice hands the
//! selected stock to the caller-supplied callback; the picker itself does no I/O.

use crate::catalog::{Stock, StockCatalog};
use crate::error::SageError;
use crate::Result;
use tracing::debug;

pub type SelectionCallback = Box<dyn Fn(Stock) + Send + Sync>;

pub struct StockPicker {
    catalog: StockCatalog,
    query: String,
    selected: Option<Stock>,
    on_select: SelectionCallback,
}

impl StockPicker {
    pub fn new<F>(catalog: StockCatalog, on_select: F) -> Self
    where
        F: Fn(Stock) + Send + Sync + 'static,
    {
        Self {
            catalog,
            query: String::new(),
            selected: None,
            on_select: Box::new(on_select),
        }
    }

    pub fn catalog(&self) -> &StockCatalog {
        &self.catalog
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Stocks matching the current query, in catalog order
    pub fn results(&self) -> Vec<&Stock> {
        self.catalog.search(&self.query)
    }

    pub fn selected(&self) -> Option<&Stock> {
        self.selected.as_ref()
    }

    /// Commit a choice by symbol and notify the callback.
    /// Unknown symbols leave the picker untouched.
    pub fn commit(&mut self, symbol: &str) -> Result<Stock> {
        let stock = self
            .catalog
            .by_symbol(symbol)
            .cloned()
            .ok_or_else(|| SageError::UnknownSymbol(symbol.trim().to_string()))?;

        debug!(symbol = %stock.symbol, "Stock committed");

        self.selected = Some(stock.clone());
        (self.on_select)(stock.clone());
        Ok(stock)
    }
}
