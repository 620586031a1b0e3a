//! Recurrence calculator.
//!
//! Pure calendar arithmetic: given the instant a definition was scheduled
//! for and its frequency, compute the next scheduled instant. Advancing
//! from the previous *scheduled* instant (never from wall-clock now) keeps
//! long-running schedules from drifting.

use chrono::{DateTime, Duration, Months, Utc};

use crate::Frequency;

/// Next occurrence after `current`, or `None` when the schedule ends.
///
/// `Once` never has a further occurrence. Month and year steps preserve
/// the day-of-month where it exists and clamp to the last valid day of
/// the target month otherwise (Jan 31 -> Feb 28/29, Feb 29 -> Feb 28 on
/// non-leap years); `chrono::Months` implements exactly that rule.
pub fn next_occurrence(current: DateTime<Utc>, frequency: Frequency) -> Option<DateTime<Utc>> {
    match frequency {
        Frequency::Once => None,
        Frequency::Daily => current.checked_add_signed(Duration::days(1)),
        Frequency::Weekly => current.checked_add_signed(Duration::weeks(1)),
        Frequency::Monthly => current.checked_add_months(Months::new(1)),
        Frequency::Yearly => current.checked_add_months(Months::new(12)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn once_has_no_further_occurrence() {
        assert_eq!(next_occurrence(utc(2024, 1, 31), Frequency::Once), None);
        assert_eq!(next_occurrence(utc(1970, 1, 1), Frequency::Once), None);
    }

    #[test]
    fn daily_and_weekly_advance_by_fixed_spans() {
        assert_eq!(
            next_occurrence(utc(2024, 2, 28), Frequency::Daily),
            Some(utc(2024, 2, 29))
        );
        assert_eq!(
            next_occurrence(utc(2023, 2, 28), Frequency::Daily),
            Some(utc(2023, 3, 1))
        );
        assert_eq!(
            next_occurrence(utc(2024, 12, 30), Frequency::Weekly),
            Some(utc(2025, 1, 6))
        );
    }

    #[test]
    fn monthly_clamps_to_end_of_month() {
        // 2024 is a leap year.
        assert_eq!(
            next_occurrence(utc(2024, 1, 31), Frequency::Monthly),
            Some(utc(2024, 2, 29))
        );
        assert_eq!(
            next_occurrence(utc(2023, 1, 31), Frequency::Monthly),
            Some(utc(2023, 2, 28))
        );
        assert_eq!(
            next_occurrence(utc(2024, 3, 31), Frequency::Monthly),
            Some(utc(2024, 4, 30))
        );
        // Mid-month days are preserved as-is.
        assert_eq!(
            next_occurrence(utc(2024, 5, 15), Frequency::Monthly),
            Some(utc(2024, 6, 15))
        );
    }

    #[test]
    fn yearly_clamps_leap_day() {
        assert_eq!(
            next_occurrence(utc(2024, 2, 29), Frequency::Yearly),
            Some(utc(2025, 2, 28))
        );
        assert_eq!(
            next_occurrence(utc(2024, 7, 1), Frequency::Yearly),
            Some(utc(2025, 7, 1))
        );
    }

    #[test]
    fn repeating_frequencies_strictly_increase() {
        for freq in [
            Frequency::Daily,
            Frequency::Weekly,
            Frequency::Monthly,
            Frequency::Yearly,
        ] {
            let mut current = utc(2024, 1, 31);
            for _ in 0..36 {
                let next = next_occurrence(current, freq).unwrap();
                assert!(next > current, "{freq:?} did not advance past {current}");
                current = next;
            }
        }
    }

    #[test]
    fn preserves_time_of_day() {
        let current = Utc.with_ymd_and_hms(2024, 1, 31, 13, 45, 30).unwrap();
        let next = next_occurrence(current, Frequency::Monthly).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 2, 29, 13, 45, 30).unwrap());
    }
}
