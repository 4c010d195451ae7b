//! Tracked symbol list

/// Ordered set of tradable symbols
///
/// Symbols are stored trimmed and uppercased; duplicates and blanks are
/// dropped, first occurrence wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watchlist {
    symbols: Vec<String>,
}

impl Watchlist {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for symbol in symbols {
            let symbol = Self::normalize(symbol.as_ref());
            if !symbol.is_empty() && !normalized.contains(&symbol) {
                normalized.push(symbol);
            }
        }
        Self { symbols: normalized }
    }

    /// Canonical form of a user-supplied symbol
    pub fn normalize(symbol: &str) -> String {
        symbol.trim().to_uppercase()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        let symbol = Self::normalize(symbol);
        self.symbols.iter().any(|s| *s == symbol)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Default for Watchlist {
    fn default() -> Self {
        Self::new(stocksim_common::config::DEFAULT_WATCHLIST)
    }
}
