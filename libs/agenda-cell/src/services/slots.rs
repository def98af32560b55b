// libs/agenda-cell/src/services/slots.rs
use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{SlotTime, CLOSING_HOUR, OPENING_HOUR, SLOT_MINUTES};

/// Days shown per week: Monday through Saturday.
pub const WEEK_DAYS: usize = 6;

/// Normalize an anchor date to the Monday of its containing week. Weeks start
/// on Monday; a Sunday anchor maps to the Monday six days earlier.
pub fn week_start(anchor: NaiveDate) -> NaiveDate {
    let offset = anchor.weekday().num_days_from_monday() as i64;
    anchor - Duration::days(offset)
}

/// The six day columns (Monday..Saturday) of the week containing `anchor`.
pub fn week_days(anchor: NaiveDate) -> Vec<NaiveDate> {
    let monday = week_start(anchor);
    (0..WEEK_DAYS as i64)
        .map(|offset| monday + Duration::days(offset))
        .collect()
}

/// The ordered half-hour tokens of a day column: 09:00 up to but excluding
/// 20:00, 22 tokens in all.
pub fn time_slots() -> Vec<SlotTime> {
    let mut slots = Vec::new();
    for hour in OPENING_HOUR..CLOSING_HOUR {
        for minute in [0, SLOT_MINUTES] {
            if let Some(slot) = SlotTime::new(hour, minute) {
                slots.push(slot);
            }
        }
    }
    slots
}

/// The full bookable grid for the week containing `anchor`. Deterministic and
/// independent of the appointment set.
#[derive(Debug, Clone)]
pub struct WeekGrid {
    pub days: Vec<NaiveDate>,
    pub times: Vec<SlotTime>,
}

pub fn week_grid(anchor: NaiveDate) -> WeekGrid {
    WeekGrid {
        days: week_days(anchor),
        times: time_slots(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn grid_has_twenty_two_tokens() {
        let slots = time_slots();
        assert_eq!(slots.len(), 22);
        assert_eq!(slots.first().unwrap().to_string(), "09:00");
        assert_eq!(slots.last().unwrap().to_string(), "19:30");
    }

    #[test]
    fn tokens_are_ordered_and_half_hour_spaced() {
        let slots = time_slots();
        for pair in slots.windows(2) {
            let gap = pair[1].as_time() - pair[0].as_time();
            assert_eq!(gap.num_minutes(), 30);
        }
    }

    #[test]
    fn midweek_anchor_normalizes_to_monday() {
        // 2025-03-13 is a Thursday
        let anchor = NaiveDate::from_ymd_opt(2025, 3, 13).unwrap();
        let monday = week_start(anchor);
        assert_eq!(monday, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(monday.weekday(), Weekday::Mon);
    }

    #[test]
    fn sunday_anchor_maps_to_previous_monday() {
        // 2025-03-16 is a Sunday; its week started 2025-03-10
        let anchor = NaiveDate::from_ymd_opt(2025, 3, 16).unwrap();
        assert_eq!(
            week_start(anchor),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
    }

    #[test]
    fn monday_anchor_is_already_normalized() {
        let anchor = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(week_start(anchor), anchor);
    }

    #[test]
    fn week_runs_monday_through_saturday() {
        let days = week_days(NaiveDate::from_ymd_opt(2025, 3, 13).unwrap());
        assert_eq!(days.len(), 6);
        assert_eq!(days[0].weekday(), Weekday::Mon);
        assert_eq!(days[5].weekday(), Weekday::Sat);
    }
}
