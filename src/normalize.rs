// src/normalize.rs
//
// Turns scraped cell strings into values with fixed units. Everything here is
// pure; arithmetic is done in fixed point so that truncation is exact.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::error::NormalizeError;

static PARENTHESIZED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*\)").expect("valid regex"));
static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*\]").expect("valid regex"));
static NON_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9.]+").expect("valid regex"));

/// km² per square mile, as 258999 / 100000.
const SQ_MI_TO_KM2: (i128, i128) = (258_999, 100_000);
/// Applied to every magnitude-worded GDP figure, never to bare numbers.
const GDP_ADJUSTMENT: (i128, i128) = (11, 10);

const GDP_MAGNITUDES: &[(&str, i128)] = &[
    ("trillion", 1_000_000_000_000),
    ("billion", 1_000_000_000),
    ("million", 1_000_000),
];

/// What a column holds once normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    /// Share of world population, `%` removed, kept as text.
    Percentage,
    /// Head count, separators removed, kept as text.
    Population,
    /// Whole square kilometres.
    AreaKm2,
    /// Whole US dollars.
    GdpUsd,
}

impl ColumnKind {
    pub fn is_integer(self) -> bool {
        matches!(self, ColumnKind::AreaKm2 | ColumnKind::GdpUsd)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Int(i64),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
        }
    }
}

/// Annotation removal followed by the column's own conversion.
pub fn normalize(kind: ColumnKind, raw: &str) -> Result<Value, NormalizeError> {
    let cleaned = strip_annotations(raw);
    Ok(match kind {
        ColumnKind::Text => Value::Text(cleaned),
        ColumnKind::Percentage => Value::Text(normalize_percentage(&cleaned)),
        ColumnKind::Population => Value::Text(normalize_population(&cleaned)),
        ColumnKind::AreaKm2 => Value::Int(normalize_area(&cleaned)?),
        ColumnKind::GdpUsd => Value::Int(normalize_gdp(&cleaned)?),
    })
}

/// Drop `(...)` and `[...]` spans (greedy, so `a (b) c (d)` loses `(b) c (d)`).
pub fn strip_annotations(raw: &str) -> String {
    let s = PARENTHESIZED.replace_all(raw, "");
    let s = BRACKETED.replace_all(&s, "");
    s.trim().to_string()
}

pub fn normalize_percentage(s: &str) -> String {
    s.trim_matches('%').to_string()
}

pub fn normalize_population(s: &str) -> String {
    s.replace(',', "")
}

/// Area in whole km². Square miles are converted; ranges keep their lower end.
pub fn normalize_area(raw: &str) -> Result<i64, NormalizeError> {
    let s = raw.replace(',', "");
    let lower = s.split('-').next().unwrap_or_default();

    if s.contains("sq mi") {
        let n = Fixed::parse(raw, &numeric_only(lower))?;
        n.scale(raw, SQ_MI_TO_KM2.0, SQ_MI_TO_KM2.1)
    } else {
        let lower = lower.replace("km²", "").replace("km2", "");
        let n = Fixed::parse(raw, &numeric_only(&lower))?;
        n.scale(raw, 1, 1)
    }
}

/// GDP in whole dollars. Worded magnitudes carry the 1.1 adjustment; a bare
/// figure is taken as-is and must be an integer.
pub fn normalize_gdp(raw: &str) -> Result<i64, NormalizeError> {
    let s = raw.replace('$', "");

    for &(word, magnitude) in GDP_MAGNITUDES {
        if s.contains(word) {
            let n = Fixed::parse(raw, &numeric_only(&s))?;
            return n.scale(raw, magnitude * GDP_ADJUSTMENT.0, GDP_ADJUSTMENT.1);
        }
    }

    let digits = numeric_only(&s);
    if digits.is_empty() {
        return Err(NormalizeError::Empty {
            raw: raw.to_string(),
        });
    }
    digits.parse::<i64>().map_err(|_| NormalizeError::Malformed {
        raw: raw.to_string(),
        digits,
    })
}

fn numeric_only(s: &str) -> String {
    NON_NUMERIC.replace_all(s, "").into_owned()
}

/// Decimal as `mantissa / 10^scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fixed {
    mantissa: i128,
    scale: u32,
}

impl Fixed {
    fn parse(raw: &str, digits: &str) -> Result<Self, NormalizeError> {
        if digits.is_empty() {
            return Err(NormalizeError::Empty {
                raw: raw.to_string(),
            });
        }
        let malformed = || NormalizeError::Malformed {
            raw: raw.to_string(),
            digits: digits.to_string(),
        };

        let (int_part, frac_part) = match digits.split_once('.') {
            Some((_, frac)) if frac.contains('.') => return Err(malformed()),
            Some((int, frac)) => (int, frac),
            None => (digits, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(malformed());
        }

        let mut mantissa: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(i128::from(b - b'0')))
                .ok_or_else(|| NormalizeError::Overflow {
                    raw: raw.to_string(),
                })?;
        }

        Ok(Fixed {
            mantissa,
            scale: frac_part.len() as u32,
        })
    }

    /// `self * num / den`, truncated toward zero.
    fn scale(self, raw: &str, num: i128, den: i128) -> Result<i64, NormalizeError> {
        let overflow = || NormalizeError::Overflow {
            raw: raw.to_string(),
        };
        let divisor = 10i128
            .checked_pow(self.scale)
            .and_then(|p| p.checked_mul(den))
            .ok_or_else(overflow)?;
        let product = self.mantissa.checked_mul(num).ok_or_else(overflow)?;
        i64::try_from(product / divisor).map_err(|_| overflow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_parenthesized_and_bracketed_suffixes() {
        assert_eq!(strip_annotations("India (details)"), "India");
        assert_eq!(strip_annotations("17.7%[3]"), "17.7%");
        assert_eq!(strip_annotations("  China[a] "), "China");
        assert_eq!(strip_annotations("1,234 km2 (476 sq mi)[12]"), "1,234 km2");
        assert_eq!(strip_annotations("no annotations"), "no annotations");
    }

    #[test]
    fn annotation_match_is_greedy() {
        assert_eq!(strip_annotations("a (b) c (d) e"), "a  e");
    }

    #[test]
    fn percentage_and_population_stay_text() {
        assert_eq!(
            normalize(ColumnKind::Percentage, "17.7%[4]").unwrap(),
            Value::Text("17.7".into())
        );
        assert_eq!(
            normalize(ColumnKind::Population, "1,402,112,000").unwrap(),
            Value::Text("1402112000".into())
        );
        assert_eq!(
            normalize(ColumnKind::Text, "India (more)").unwrap(),
            Value::Text("India".into())
        );
    }

    #[test]
    fn area_in_square_miles_is_converted() {
        // 1234 * 2.58999 = 3196.04766
        assert_eq!(normalize_area("1,234 sq mi").unwrap(), 3196);
        assert_eq!(normalize_area("100-200 sq mi").unwrap(), 258);
    }

    #[test]
    fn area_in_km2_is_truncated() {
        assert_eq!(normalize_area("500").unwrap(), 500);
        assert_eq!(normalize_area("3,287,263 km2").unwrap(), 3_287_263);
        assert_eq!(normalize_area("0.44 km²").unwrap(), 0);
        assert_eq!(normalize_area("21.3-25").unwrap(), 21);
        assert_eq!(
            normalize(ColumnKind::AreaKm2, "756,096 km2 (291,930 sq mi)[4]").unwrap(),
            Value::Int(756_096)
        );
    }

    #[test]
    fn gdp_magnitudes_carry_adjustment() {
        assert_eq!(normalize_gdp("$1.5 trillion").unwrap(), 1_650_000_000_000);
        assert_eq!(normalize_gdp("$200 million").unwrap(), 220_000_000);
        assert_eq!(normalize_gdp("$2.3 trillion").unwrap(), 2_530_000_000_000);
        assert_eq!(normalize_gdp("$298.231 billion").unwrap(), 328_054_100_000);
    }

    #[test]
    fn bare_gdp_has_no_adjustment() {
        assert_eq!(normalize_gdp("$42").unwrap(), 42);
        assert_eq!(normalize_gdp("$1,000").unwrap(), 1000);
    }

    #[test]
    fn malformed_numbers_are_errors() {
        assert!(matches!(
            normalize_area("unknown"),
            Err(NormalizeError::Empty { .. })
        ));
        assert!(matches!(
            normalize_area("1.2.3"),
            Err(NormalizeError::Malformed { .. })
        ));
        assert!(matches!(
            normalize_gdp("$42.5"),
            Err(NormalizeError::Malformed { .. })
        ));
        assert!(matches!(
            normalize_gdp("n/a"),
            Err(NormalizeError::Empty { .. })
        ));
        assert!(matches!(
            normalize_gdp("$99999999999999999999 trillion"),
            Err(NormalizeError::Overflow { .. })
        ));
    }

    #[test]
    fn normalizing_twice_is_a_no_op() {
        let cases = [
            (ColumnKind::Text, "India [b]"),
            (ColumnKind::Percentage, "17.7%"),
            (ColumnKind::Population, "1,402,112,000"),
            (ColumnKind::AreaKm2, "1,234 sq mi"),
            (ColumnKind::AreaKm2, "3,287,263 km2"),
            (ColumnKind::GdpUsd, "$1.5 trillion"),
            (ColumnKind::GdpUsd, "$42"),
        ];
        for (kind, raw) in cases {
            let once = normalize(kind, raw).unwrap();
            let twice = normalize(kind, &once.to_string()).unwrap();
            assert_eq!(once, twice, "{kind:?} {raw:?}");
        }
    }
}
