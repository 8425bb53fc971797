use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{AggregateResult, ReportWindow};
use crate::report::STORE_TIMESTAMP_FORMAT;

#[derive(Debug, Clone)]
pub struct ReportStyle {
    pub title: String,
    pub currency_symbol: String,
}

pub fn format_summary(
    result: Option<&AggregateResult>,
    window: &ReportWindow,
    style: &ReportStyle,
) -> String {
    let Some(result) = result else {
        return format!(
            "📊 *{}*\nNo transactions found for {} ({}).",
            style.title, window.label, window.zone_name
        );
    };

    format!(
        "📊 *{title} for {label} ({zone})*\n\
         *(Time Range: {start} UTC to {end} UTC)*\n\
         • Total Transactions: `{total}`\n\
         • Total Successful Amount: `{currency}{amount}`\n\
         • Successful Transactions: `{success}`\n\
         • Failed Transactions: `{failed}`",
        title = style.title,
        label = window.label,
        zone = window.zone_name,
        start = window.start.format(STORE_TIMESTAMP_FORMAT),
        end = window.end.format(STORE_TIMESTAMP_FORMAT),
        total = result.total_count,
        currency = style.currency_symbol,
        amount = format_amount(result.success_amount_sum),
        success = result.success_count,
        failed = result.failure_count,
    )
}

/// Text sent in place of the summary when the record store could not be queried.
pub fn format_failure(cause: &str, window: &ReportWindow, style: &ReportStyle) -> String {
    format!(
        "❌ *Error generating {} for {} ({})*: {}",
        style.title, window.label, window.zone_name, cause
    )
}

fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let fixed = format!("{:.2}", rounded.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(fixed.len() + whole.len() / 3 + 1);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        grouped.push('-');
    }
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped.push('.');
    grouped.push_str(fraction);
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn window() -> ReportWindow {
        ReportWindow {
            start: Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap(),
            label: "2024-03-09".to_string(),
            zone_name: "EDT".to_string(),
        }
    }

    fn style() -> ReportStyle {
        ReportStyle {
            title: "Daily Transaction Summary".to_string(),
            currency_symbol: "$".to_string(),
        }
    }

    fn result(amount: &str) -> AggregateResult {
        AggregateResult {
            total_count: 1204,
            success_amount_sum: Decimal::from_str(amount).unwrap(),
            success_count: 1200,
            failure_count: 4,
            amount_anomalies: 0,
        }
    }

    #[test]
    fn renders_sections_in_order() {
        let text = format_summary(Some(&result("1234567.891")), &window(), &style());
        assert_eq!(
            text,
            "📊 *Daily Transaction Summary for 2024-03-09 (EDT)*\n\
             *(Time Range: 2024-03-10 00:00:00 UTC to 2024-03-10 23:59:59 UTC)*\n\
             • Total Transactions: `1204`\n\
             • Total Successful Amount: `$1,234,567.89`\n\
             • Successful Transactions: `1200`\n\
             • Failed Transactions: `4`"
        );
    }

    #[test]
    fn empty_result_names_the_label_and_no_figures() {
        let text = format_summary(None, &window(), &style());
        assert_eq!(text, "📊 *Daily Transaction Summary*\nNo transactions found for 2024-03-09 (EDT).");
        assert!(!text.contains("Total"));
    }

    #[test]
    fn formatting_is_deterministic() {
        let result = result("150");
        let first = format_summary(Some(&result), &window(), &style());
        let second = format_summary(Some(&result), &window(), &style());
        assert_eq!(first, second);
    }

    #[test]
    fn amounts_get_separators_and_two_places() {
        assert_eq!(format_amount(Decimal::ZERO), "0.00");
        assert_eq!(format_amount(Decimal::from_str("150").unwrap()), "150.00");
        assert_eq!(format_amount(Decimal::from_str("999.999").unwrap()), "1,000.00");
        assert_eq!(format_amount(Decimal::from_str("100000").unwrap()), "100,000.00");
        assert_eq!(format_amount(Decimal::from_str("0.125").unwrap()), "0.13");
        assert_eq!(format_amount(Decimal::from_str("-4321.5").unwrap()), "-4,321.50");
        assert_eq!(format_amount(Decimal::from_str("-0.001").unwrap()), "0.00");
    }

    #[test]
    fn failure_text_carries_the_cause() {
        let text = format_failure("connection refused", &window(), &style());
        assert_eq!(
            text,
            "❌ *Error generating Daily Transaction Summary for 2024-03-09 (EDT)*: connection refused"
        );
    }
}
