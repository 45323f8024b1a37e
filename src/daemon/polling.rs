/// Fires once each time the wall-clock hour moves forward.
///
/// The first observation always fires. After that an hour fires when it is
/// later than the last fired hour, or when the clock wraps from 23 to 0.
#[derive(Debug, Clone, Default)]
pub struct HourEdge {
    last_hour: Option<u32>,
}

impl HourEdge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_hour(&self) -> Option<u32> {
        self.last_hour
    }

    pub fn fires(&mut self, hour: u32) -> bool {
        let fire = match self.last_hour {
            None => true,
            Some(last) => hour > last || (last == 23 && hour == 0),
        };

        if fire {
            self.last_hour = Some(hour);
        }
        fire
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta, Timelike};

    #[test]
    fn test_first_observation_fires() {
        let mut edge = HourEdge::new();

        assert!(edge.fires(9));
        assert!(!edge.fires(9));
        assert_eq!(edge.last_hour(), Some(9));
    }

    #[test]
    fn test_one_firing_per_hour_at_thirty_second_ticks() {
        let mut edge = HourEdge::new();
        edge.fires(9);

        let start = NaiveDate::from_ymd_opt(2026, 4, 1)
            .unwrap()
            .and_hms_opt(9, 30, 15)
            .unwrap();
        let fired = (0..120)
            .map(|tick| start + TimeDelta::seconds(30 * tick))
            .filter(|now| edge.fires(now.hour()))
            .count();

        assert_eq!(fired, 1);
        assert_eq!(edge.last_hour(), Some(10));
    }

    #[test]
    fn test_midnight_wraparound() {
        let mut edge = HourEdge::new();
        edge.fires(23);

        assert!(!edge.fires(23));
        assert!(edge.fires(0));
        assert!(!edge.fires(0));
        assert!(edge.fires(1));
    }

    #[test]
    fn test_skipped_midnight_waits_for_later_hour() {
        let mut edge = HourEdge::new();
        edge.fires(22);

        // 23:00 was missed entirely; 00:xx is not later than 22.
        assert!(!edge.fires(0));
        assert!(edge.fires(23));
    }
}
