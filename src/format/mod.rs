//! Number formatting for the terminal dashboard.

/// Prefix shown in front of every market-cap figure.
pub const DEFAULT_CURRENCY_PREFIX: &str = "R$";

const TRILLION: f64 = 1e12;
const BILLION: f64 = 1e9;
const MILLION: f64 = 1e6;

/// Abbreviate a market cap with the default currency prefix.
/// 1_500_000_000 → "R$ 1.5B" | 999 → "R$ 999"
#[cfg(test)]
pub fn format_market_cap(value: f64) -> String {
    format_market_cap_with(value, DEFAULT_CURRENCY_PREFIX)
}

/// First matching magnitude wins; anything below a million is printed in full
/// with thousands separators. Zero and negatives go through the same ladder.
pub fn format_market_cap_with(value: f64, prefix: &str) -> String {
    if value >= TRILLION {
        format!("{} {:.1}T", prefix, value / TRILLION)
    } else if value >= BILLION {
        format!("{} {:.1}B", prefix, value / BILLION)
    } else if value >= MILLION {
        format!("{} {:.1}M", prefix, value / MILLION)
    } else {
        format!("{} {}", prefix, group_digits(value))
    }
}

/// Format a number with `,` thousands separators and at most three fraction
/// digits, dropping trailing zeros.
/// 1234567.0 → "1,234,567" | 1234.5678 → "1,234.568" | -42000.0 → "-42,000"
pub fn group_digits(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let mut out: String = grouped.chars().rev().collect();

    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }

    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    if value.is_sign_negative() && !is_zero {
        out.insert(0, '-');
    }
    out
}

/// Two-decimal price. Missing prices render as "N/A".
pub fn format_price(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "N/A".to_string(),
    }
}

/// Daily change as "+1.23 (0.45%)". The sign is only added for non-negative
/// moves; negatives carry their own.
pub fn format_change(change: Option<f64>, change_percent: Option<f64>) -> String {
    let Some(change) = change else {
        return "N/A".to_string();
    };
    let sign = if change >= 0.0 { "+" } else { "" };
    match change_percent {
        Some(pct) => format!("{}{:.2} ({:.2}%)", sign, change, pct),
        None => format!("{}{:.2}", sign, change),
    }
}
