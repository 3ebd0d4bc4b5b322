//! Brazilian number formatting for the KPI display.

use crate::data::summary::Aggregate;

/// Shown in place of a statistic that is undefined.
pub const UNAVAILABLE: &str = "indisponível";

/// Group the digits of a non-negative integer string with `.`.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// `1234.567` → `"R$ 1.234,57"`.
pub fn brl(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}R$ {},{frac_part}", group_thousands(int_part))
}

/// `12345.6` → `"12.346"`.
pub fn quantity(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let sign = if value < 0.0 && rounded != "0" { "-" } else { "" };
    format!("{sign}{}", group_thousands(&rounded))
}

pub fn brl_or_unavailable(value: Aggregate<f64>) -> String {
    value.available().map(brl).unwrap_or_else(|| UNAVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency() {
        assert_eq!(brl(0.0), "R$ 0,00");
        assert_eq!(brl(8.5), "R$ 8,50");
        assert_eq!(brl(999.999), "R$ 1.000,00");
        assert_eq!(brl(1234567.891), "R$ 1.234.567,89");
        assert_eq!(brl(-12.3), "-R$ 12,30");
    }

    #[test]
    fn quantities() {
        assert_eq!(quantity(8.0), "8");
        assert_eq!(quantity(1234.4), "1.234");
        assert_eq!(quantity(1000000.0), "1.000.000");
    }

    #[test]
    fn unavailable_is_not_zero() {
        assert_eq!(brl_or_unavailable(Aggregate::Unavailable), UNAVAILABLE);
        assert_eq!(brl_or_unavailable(Aggregate::Available(0.0)), "R$ 0,00");
    }
}
