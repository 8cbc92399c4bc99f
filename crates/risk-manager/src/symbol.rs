use serde::{Deserialize, Serialize};
use std::fmt;

/// Compact identifier for the fixed universe of supported symbols.
///
/// Positions live in an array indexed by this enum, so fill and mark
/// updates are a bounds-free array access instead of a map probe. An
/// unsupported symbol string translates to `None` at the boundary; it
/// never allocates a new slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Symbol {
    Btc = 0,
    Eth = 1,
    Sol = 2,
    Bnb = 3,
}

pub const SYMBOL_COUNT: usize = 4;

impl Symbol {
    pub const ALL: [Symbol; SYMBOL_COUNT] = [Symbol::Btc, Symbol::Eth, Symbol::Sol, Symbol::Bnb];

    #[inline]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BTCUSDT" | "BTC" => Some(Symbol::Btc),
            "ETHUSDT" | "ETH" => Some(Symbol::Eth),
            "SOLUSDT" | "SOL" => Some(Symbol::Sol),
            "BNBUSDT" | "BNB" => Some(Symbol::Bnb),
            _ => None,
        }
    }

    #[inline]
    pub fn pair(self) -> &'static str {
        match self {
            Symbol::Btc => "BTCUSDT",
            Symbol::Eth => "ETHUSDT",
            Symbol::Sol => "SOLUSDT",
            Symbol::Bnb => "BNBUSDT",
        }
    }

    #[inline]
    pub fn short(self) -> &'static str {
        match self {
            Symbol::Btc => "BTC",
            Symbol::Eth => "ETH",
            Symbol::Sol => "SOL",
            Symbol::Bnb => "BNB",
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pair())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_symbols() {
        assert_eq!(Symbol::parse("BTCUSDT"), Some(Symbol::Btc));
        assert_eq!(Symbol::parse("BTC"), Some(Symbol::Btc));
        assert_eq!(Symbol::parse("ETHUSDT"), Some(Symbol::Eth));
        assert_eq!(Symbol::parse("SOLUSDT"), Some(Symbol::Sol));
        assert_eq!(Symbol::parse("BNBUSDT"), Some(Symbol::Bnb));
    }

    #[test]
    fn test_unknown_symbol_is_none() {
        assert_eq!(Symbol::parse("DOGEUSDT"), None);
        assert_eq!(Symbol::parse(""), None);
        assert_eq!(Symbol::parse("btcusdt"), None);
    }

    #[test]
    fn test_indexes_are_dense() {
        for (i, sym) in Symbol::ALL.iter().enumerate() {
            assert_eq!(sym.index(), i);
        }
    }
}
