//! Utility functions and helpers

use chrono::Utc;
use num_format::{Locale, ToFormattedString};

/// Calculate percentage change
pub fn calculate_percentage_change(old_value: f64, new_value: f64) -> f64 {
    if old_value > 0.0 {
        ((new_value - old_value) / old_value) * 100.0
    } else {
        0.0
    }
}

/// Format a USD amount with thousands separators and two decimals
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() {
        return "unavailable".to_string();
    }
    // Sub-dollar prices keep six decimals
    if value.abs() < 1.0 {
        return format!("${:.6}", value);
    }

    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 { "-" } else { "" };
    format!(
        "{}${}.{:02}",
        sign,
        (cents / 100).to_formatted_string(&Locale::en),
        cents % 100
    )
}

/// Format an optional price, `None` renders as "unavailable"
pub fn format_price(value: Option<f64>) -> String {
    value.map(format_usd).unwrap_or_else(|| "unavailable".to_string())
}

/// Current wall-clock time in unix milliseconds
pub fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

/// Substitute `{name}` placeholders in an endpoint template
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{}}}", key), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_change() {
        assert_eq!(calculate_percentage_change(100.0, 110.0), 10.0);
        assert_eq!(calculate_percentage_change(0.0, 110.0), 0.0);
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(2500.0), "$2,500.00");
        assert_eq!(format_usd(1234567.891), "$1,234,567.89");
        assert_eq!(format_usd(999.5), "$999.50");
        assert_eq!(format_usd(1999.999), "$2,000.00");
        assert_eq!(format_usd(-1500.0), "-$1,500.00");
        assert_eq!(format_usd(0.5), "$0.500000");
        assert_eq!(format_price(None), "unavailable");
    }

    #[test]
    fn test_render_template() {
        let url = render_template(
            "https://api.example.com/{coin_id}/chart?days={days}",
            &[("coin_id", "ethereum"), ("days", "7")],
        );
        assert_eq!(url, "https://api.example.com/ethereum/chart?days=7");
    }
}
