use crate::cli::daemon_get;
use crate::core::models::PricePoint;
use crate::core::settings::Settings;
use anyhow::Result;
use rust_decimal::Decimal;

pub async fn run(settings: &Settings, tomorrow: bool, json: bool) -> Result<()> {
    let path = format!("/api/prices?current={}", !tomorrow);
    let prices: Vec<PricePoint> = daemon_get(settings, &path).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prices)?);
        return Ok(());
    }

    let label = if tomorrow { "tomorrow" } else { "today" };
    if prices.is_empty() {
        println!("No prices cached for {}", label);
        return Ok(());
    }

    println!("Prices for {}:", label);
    for line in format_lines(&prices, settings.polling.price_threshold) {
        println!("{}", line);
    }

    Ok(())
}

/// One line per hour; prices above `threshold` are flagged.
fn format_lines(prices: &[PricePoint], threshold: Decimal) -> Vec<String> {
    prices
        .iter()
        .map(|p| {
            let flag = match p.price_value() {
                Some(value) if value > threshold => " !",
                _ => "",
            };
            format!("  {:02}:00  {:>8}{}", p.hour, p.price, flag)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn point(hour: u32, price: &str) -> PricePoint {
        PricePoint {
            timestamp: NaiveDate::from_ymd_opt(2026, 9, 2)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            price: price.to_string(),
            hour,
        }
    }

    #[test]
    fn test_expensive_hours_are_flagged() {
        let lines = format_lines(
            &[point(1, "0.05"), point(2, "0.15"), point(3, "n/a")],
            Decimal::new(1, 1),
        );

        assert_eq!(lines[0], "  01:00      0.05");
        assert_eq!(lines[1], "  02:00      0.15 !");
        assert!(!lines[2].ends_with('!'));
    }
}
