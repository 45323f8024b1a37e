use crate::core::models::PricePoint;
use anyhow::Result;
use notify_rust::Notification;
use rust_decimal::Decimal;

/// First price point strictly above `threshold`, scanning in stored order.
///
/// Prices that do not parse as decimals never trigger.
pub fn first_above_threshold(prices: &[PricePoint], threshold: Decimal) -> Option<&PricePoint> {
    prices
        .iter()
        .find(|point| point.price_value().is_some_and(|value| value > threshold))
}

/// One `"<date> <price>"` line per price point.
pub fn format_price_alert(prices: &[PricePoint]) -> String {
    prices
        .iter()
        .map(|point| format!("{} {}", point.timestamp.format("%Y-%m-%d %H:%M:%S"), point.price))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn send_desktop_price_alert(sender: &str, urgent: bool, prices: &[PricePoint]) -> Result<()> {
    let urgency = if urgent {
        notify_rust::Urgency::Critical
    } else {
        notify_rust::Urgency::Normal
    };

    Notification::new()
        .summary(&format!("{sender}: high electricity prices tomorrow"))
        .body(&format_price_alert(prices))
        .appname("electric-eye")
        .urgency(urgency)
        .timeout(notify_rust::Timeout::Milliseconds(10_000))
        .show()?;

    tracing::info!(sender, n_prices = prices.len(), "Sent desktop price alert");

    Ok(())
}
