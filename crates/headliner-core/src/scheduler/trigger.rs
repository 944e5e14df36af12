use chrono::{NaiveDate, NaiveDateTime, Timelike};

/// Decides when the top-of-hour digest is due.
///
/// An hour fires at most once. A poll that lands late, but still inside the
/// catch-up window after minute 0, fires the hour it belongs to.
#[derive(Debug, Clone)]
pub struct HourlyTrigger {
    catch_up_minutes: u32,
    last_fired: Option<(NaiveDate, u32)>,
}

impl HourlyTrigger {
    /// `catch_up_minutes` is clamped to 1..=59
    pub fn new(catch_up_minutes: u32) -> Self {
        Self {
            catch_up_minutes: catch_up_minutes.clamp(1, 59),
            last_fired: None,
        }
    }

    /// Catch-up window derived from the poll interval, so that one missed
    /// poll never skips an hour
    pub fn for_poll_interval(poll_interval_secs: u64) -> Self {
        let minutes = poll_interval_secs.div_ceil(60) + 1;
        Self::new(u32::try_from(minutes).unwrap_or(59))
    }

    fn hour_key(now: NaiveDateTime) -> (NaiveDate, u32) {
        (now.date(), now.hour())
    }

    /// Returns true exactly once per hour, on the first poll inside the window
    pub fn should_fire(&mut self, now: NaiveDateTime) -> bool {
        let key = Self::hour_key(now);
        if self.last_fired == Some(key) || now.minute() >= self.catch_up_minutes {
            return false;
        }
        self.last_fired = Some(key);
        true
    }

    /// Record a run outside the schedule (the startup run) so the current
    /// hour does not fire again
    pub fn mark_fired(&mut self, now: NaiveDateTime) {
        self.last_fired = Some(Self::hour_key(now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 2)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn test_fires_on_the_hour() {
        let mut trigger = HourlyTrigger::new(1);
        assert!(!trigger.should_fire(at(9, 59, 30)));
        assert!(trigger.should_fire(at(10, 0, 30)));
    }

    #[test]
    fn test_no_double_fire_in_same_minute() {
        let mut trigger = HourlyTrigger::new(1);
        assert!(trigger.should_fire(at(10, 0, 0)));
        assert!(!trigger.should_fire(at(10, 0, 45)));
        assert!(!trigger.should_fire(at(10, 0, 59)));
    }

    #[test]
    fn test_late_poll_inside_window_still_fires() {
        let mut trigger = HourlyTrigger::for_poll_interval(60);
        assert!(!trigger.should_fire(at(9, 59, 55)));
        // Poll delayed past minute 0
        assert!(trigger.should_fire(at(10, 1, 20)));
        assert!(!trigger.should_fire(at(10, 1, 50)));
    }

    #[test]
    fn test_fires_every_hour() {
        let mut trigger = HourlyTrigger::new(1);
        let fired: Vec<u32> = (0..24)
            .flat_map(|h| (0..60).map(move |m| (h, m)))
            .filter(|&(h, m)| trigger.should_fire(at(h, m, 10)))
            .map(|(h, _)| h)
            .collect();
        assert_eq!(fired, (0..24).collect::<Vec<_>>());
    }

    #[test]
    fn test_mark_fired_suppresses_current_hour() {
        let mut trigger = HourlyTrigger::new(1);
        trigger.mark_fired(at(10, 0, 5));
        assert!(!trigger.should_fire(at(10, 0, 40)));
        assert!(trigger.should_fire(at(11, 0, 3)));
    }

    #[test]
    fn test_same_hour_next_day_fires() {
        let mut trigger = HourlyTrigger::new(1);
        assert!(trigger.should_fire(at(10, 0, 0)));
        let next_day = NaiveDate::from_ymd_opt(2024, 5, 3)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert!(trigger.should_fire(next_day));
    }

    #[test]
    fn test_window_is_clamped() {
        let mut trigger = HourlyTrigger::new(0);
        assert!(trigger.should_fire(at(10, 0, 0)));
        let mut wide = HourlyTrigger::for_poll_interval(u64::MAX);
        assert!(wide.should_fire(at(10, 58, 0)));
    }
}
