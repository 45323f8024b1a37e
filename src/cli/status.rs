use crate::cli::daemon_get;
use crate::core::models::{Poller, PollerStatus};
use crate::core::settings::Settings;
use anyhow::Result;

const RECENT_ENTRIES: usize = 10;

#[derive(Debug)]
struct PollerSummary {
    entries: usize,
    failures: usize,
    last_success: Option<String>,
    last_failure: Option<String>,
}

pub async fn run(
    settings: &Settings,
    json: bool,
    poller_filter: Option<String>,
    failures_only: bool,
) -> Result<()> {
    let pollers = select_pollers(poller_filter.as_deref())?;
    let entries: Vec<PollerStatus> = daemon_get(settings, "/api/status").await?;
    let entries = filter_entries(entries, &pollers, failures_only);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print_text_output(&pollers, &entries);
    }

    Ok(())
}

fn select_pollers(filter: Option<&str>) -> Result<Vec<Poller>> {
    let all = [Poller::Price, Poller::Charger];
    let Some(filter) = filter else {
        return Ok(all.to_vec());
    };

    let selected: Vec<Poller> = all.into_iter().filter(|p| p.matches(filter)).collect();
    if selected.is_empty() {
        anyhow::bail!("Unknown poller: {}. Valid pollers: price, charger", filter);
    }
    Ok(selected)
}

fn filter_entries(entries: Vec<PollerStatus>, pollers: &[Poller], failures_only: bool) -> Vec<PollerStatus> {
    entries
        .into_iter()
        .filter(|e| pollers.contains(&e.poller))
        .filter(|e| !failures_only || !e.success)
        .collect()
}

fn summarize(poller: Poller, entries: &[PollerStatus]) -> PollerSummary {
    let own: Vec<&PollerStatus> = entries.iter().filter(|e| e.poller == poller).collect();
    let describe = |e: &&PollerStatus| format!("{} {}", e.timestamp.format("%Y-%m-%d %H:%M:%S"), e.reason);

    PollerSummary {
        entries: own.len(),
        failures: own.iter().filter(|e| !e.success).count(),
        last_success: own.iter().rev().find(|e| e.success).map(describe),
        last_failure: own.iter().rev().find(|e| !e.success).map(describe),
    }
}

fn print_text_output(pollers: &[Poller], entries: &[PollerStatus]) {
    for (i, poller) in pollers.iter().enumerate() {
        if i > 0 {
            println!();
        }

        let summary = summarize(*poller, entries);
        println!(
            "{} ({} entries, {} failures)",
            poller.name(),
            summary.entries,
            summary.failures
        );

        if let Some(last) = &summary.last_success {
            println!("  Last success: {}", last);
        }
        if let Some(last) = &summary.last_failure {
            println!("  Last failure: {}", last);
        }

        let own: Vec<&PollerStatus> = entries.iter().filter(|e| e.poller == *poller).collect();
        for entry in own.iter().skip(own.len().saturating_sub(RECENT_ENTRIES)) {
            println!(
                "  {} {:<4} {}",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                if entry.success { "ok" } else { "FAIL" },
                entry.reason
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(poller: Poller, minute: u32, success: bool, reason: &str) -> PollerStatus {
        PollerStatus {
            timestamp: NaiveDate::from_ymd_opt(2026, 9, 1)
                .unwrap()
                .and_hms_opt(12, minute, 0)
                .unwrap(),
            poller,
            success,
            reason: reason.to_string(),
        }
    }

    fn sample() -> Vec<PollerStatus> {
        vec![
            entry(Poller::Price, 0, true, "Running in the polling loop"),
            entry(Poller::Price, 1, false, "Price update failed"),
            entry(Poller::Charger, 2, true, "Got charger reading 10"),
            entry(Poller::Charger, 3, false, "Attempt 1/3 failed"),
            entry(Poller::Charger, 4, true, "Got charger reading 12"),
        ]
    }

    #[test]
    fn test_select_pollers() {
        assert_eq!(select_pollers(None).unwrap(), vec![Poller::Price, Poller::Charger]);
        assert_eq!(select_pollers(Some("charger")).unwrap(), vec![Poller::Charger]);
        assert!(select_pollers(Some("heatpump")).is_err());
    }

    #[test]
    fn test_filter_failures_for_one_poller() {
        let filtered = filter_entries(sample(), &[Poller::Charger], true);

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].reason, "Attempt 1/3 failed");
    }

    #[test]
    fn test_summary() {
        let summary = summarize(Poller::Charger, &sample());

        assert_eq!(summary.entries, 3);
        assert_eq!(summary.failures, 1);
        assert_eq!(
            summary.last_success.as_deref(),
            Some("2026-09-01 12:04:00 Got charger reading 12")
        );
        assert!(summary.last_failure.unwrap().ends_with("Attempt 1/3 failed"));
    }
}
