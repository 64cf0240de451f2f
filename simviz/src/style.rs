//! Color and marker assignment for categorical series.

use std::collections::HashMap;
use std::hash::Hash;

use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

/// Qualitative palette (#636EFA, #EF553B, ...).
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(0x63, 0x6E, 0xFA),
    RGBColor(0xEF, 0x55, 0x3B),
    RGBColor(0x00, 0xCC, 0x96),
    RGBColor(0xAB, 0x63, 0xFA),
    RGBColor(0xFF, 0xA1, 0x5A),
    RGBColor(0x19, 0xD3, 0xF3),
    RGBColor(0xFF, 0x66, 0x92),
    RGBColor(0xB6, 0xE8, 0x80),
    RGBColor(0xFF, 0x97, 0xFF),
    RGBColor(0xFE, 0xCB, 0x52),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerSymbol {
    Circle,
    Square,
    Diamond,
    Cross,
    X,
    TriangleUp,
    TriangleDown,
}

pub const DEFAULT_SYMBOLS: [MarkerSymbol; 7] = [
    MarkerSymbol::Circle,
    MarkerSymbol::Square,
    MarkerSymbol::Diamond,
    MarkerSymbol::Cross,
    MarkerSymbol::X,
    MarkerSymbol::TriangleUp,
    MarkerSymbol::TriangleDown,
];

/// Value to color/symbol assignment for one figure.
#[derive(Clone, Debug)]
pub struct StyleMaps<K> {
    pub colors: HashMap<K, RGBColor>,
    pub symbols: HashMap<K, MarkerSymbol>,
}

impl<K: Eq + Hash> StyleMaps<K> {
    pub fn color(&self, key: &K) -> RGBColor {
        self.colors.get(key).copied().unwrap_or(PALETTE[0])
    }

    pub fn symbol(&self, key: &K) -> MarkerSymbol {
        self.symbols
            .get(key)
            .copied()
            .unwrap_or(MarkerSymbol::Circle)
    }
}

/// Assigns `PALETTE[i % 10]` and `symbols[i % len]` to the i-th value.
///
/// Encodings repeat once there are more values than palette entries. An
/// empty or missing symbol list falls back to [`DEFAULT_SYMBOLS`].
pub fn style_maps<K>(values: &[K], symbols: Option<&[MarkerSymbol]>) -> StyleMaps<K>
where
    K: Eq + Hash + Clone,
{
    let symbols = match symbols {
        Some(list) if !list.is_empty() => list,
        _ => &DEFAULT_SYMBOLS[..],
    };
    let colors = values
        .iter()
        .enumerate()
        .map(|(i, v)| (v.clone(), PALETTE[i % PALETTE.len()]))
        .collect();
    let symbols = values
        .iter()
        .enumerate()
        .map(|(i, v)| (v.clone(), symbols[i % symbols.len()]))
        .collect();
    StyleMaps { colors, symbols }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_follows_index_modulo_palette() {
        let values: Vec<i64> = (0..23).map(|i| 100 + i * 50).collect();
        let maps = style_maps(&values, None);
        for (i, v) in values.iter().enumerate() {
            assert_eq!(maps.color(v), PALETTE[i % PALETTE.len()]);
            assert_eq!(maps.symbol(v), DEFAULT_SYMBOLS[i % DEFAULT_SYMBOLS.len()]);
        }
        // the 11th value reuses the first color
        assert_eq!(maps.color(&values[10]), maps.color(&values[0]));
    }

    #[test]
    fn assignment_is_deterministic() {
        let values = vec![250, 500, 1000];
        let a = style_maps(&values, None);
        let b = style_maps(&values, None);
        for v in &values {
            assert_eq!(a.color(v), b.color(v));
            assert_eq!(a.symbol(v), b.symbol(v));
        }
    }

    #[test]
    fn custom_symbols_cycle() {
        let custom = [MarkerSymbol::Square, MarkerSymbol::X];
        let maps = style_maps(&["a", "b", "c"], Some(&custom));
        assert_eq!(maps.symbol(&"a"), MarkerSymbol::Square);
        assert_eq!(maps.symbol(&"b"), MarkerSymbol::X);
        assert_eq!(maps.symbol(&"c"), MarkerSymbol::Square);
    }

    #[test]
    fn empty_symbol_list_uses_defaults() {
        let maps = style_maps(&[1, 2], Some(&[]));
        assert_eq!(maps.symbol(&2), MarkerSymbol::Square);
    }
}
