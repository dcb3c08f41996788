//! Static stock catalog
//!
//! The fixed list of popular US stocks offered by the picker.
//! Loaded once, never mutated.

use serde::Serialize;

/// A selectable stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stock {
    pub symbol: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
}

impl Stock {
    fn from_entry(entry: &(&str, &str, &str)) -> Self {
        let (symbol, name, sector) = *entry;
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            sector: (!sector.is_empty()).then(|| sector.to_string()),
        }
    }

    /// Sector label, falling back to a generic one
    pub fn sector_label(&self) -> &str {
        self.sector.as_deref().unwrap_or("Stock")
    }
}

/// Static table: (symbol, name, sector)
const POPULAR_STOCKS: &[(&str, &str, &str)] = &[
    ("AAPL", "Apple Inc.", "Technology"),
    ("MSFT", "Microsoft Corporation", "Technology"),
    ("GOOGL", "Alphabet Inc.", "Technology"),
    ("AMZN", "Amazon.com Inc.", "Consumer Cyclical"),
    ("META", "Meta Platforms, Inc.", "Technology"),
    ("TSLA", "Tesla, Inc.", "Automotive"),
    ("NVDA", "NVIDIA Corporation", "Technology"),
    ("JPM", "JPMorgan Chase & Co.", "Financial Services"),
    ("V", "Visa Inc.", "Financial Services"),
    ("WMT", "Walmart Inc.", "Consumer Defensive"),
    ("PG", "Procter & Gamble Co.", "Consumer Defensive"),
    ("JNJ", "Johnson & Johnson", "Healthcare"),
    ("MA", "Mastercard Incorporated", "Financial Services"),
    ("UNH", "UnitedHealth Group Incorporated", "Healthcare"),
    ("HD", "The Home Depot, Inc.", "Consumer Cyclical"),
    ("BAC", "Bank of America Corporation", "Financial Services"),
    ("PFE", "Pfizer Inc.", "Healthcare"),
    ("DIS", "The Walt Disney Company", "Communication Services"),
    ("NFLX", "Netflix, Inc.", "Communication Services"),
    ("ADBE", "Adobe Inc.", "Technology"),
    ("CMCSA", "Comcast Corporation", "Communication Services"),
    ("CSCO", "Cisco Systems, Inc.", "Technology"),
    ("INTC", "Intel Corporation", "Technology"),
    ("VZ", "Verizon Communications Inc.", "Communication Services"),
    ("KO", "The Coca-Cola Company", "Consumer Defensive"),
    ("PEP", "PepsiCo, Inc.", "Consumer Defensive"),
    ("ABT", "Abbott Laboratories", "Healthcare"),
    ("MRK", "Merck & Co., Inc.", "Healthcare"),
    ("NKE", "NIKE, Inc.", "Consumer Cyclical"),
    ("T", "AT&T Inc.", "Communication Services"),
];

/// Read-only catalog of selectable stocks
#[derive(Debug, Clone)]
pub struct StockCatalog {
    stocks: Vec<Stock>,
}

impl StockCatalog {
    /// Catalog of popular US stocks
    pub fn popular() -> Self {
        Self {
            stocks: POPULAR_STOCKS.iter().map(Stock::from_entry).collect(),
        }
    }

    pub fn all(&self) -> &[Stock] {
        &self.stocks
    }

    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }

    /// Exact symbol lookup; input case is ignored
    pub fn by_symbol(&self, symbol: &str) -> Option<&Stock> {
        let wanted = symbol.trim().to_uppercase();
        self.stocks.iter().find(|s| s.symbol == wanted)
    }

    /// Case-insensitive substring match on symbol and name, catalog order.
    /// A blank query matches everything.
    pub fn search(&self, query: &str) -> Vec<&Stock> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.stocks.iter().collect();
        }

        self.stocks
            .iter()
            .filter(|s| {
                s.symbol.to_lowercase().contains(&needle)
                    || s.name.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

impl Default for StockCatalog {
    fn default() -> Self {
        Self::popular()
    }
}
