//! Deadline derivation.

use chrono::{DateTime, Duration, Utc};

use super::Periodicity;

/// Length of one period in days, or `None` when the cadence is unknown.
fn period_days(periodicity: &Periodicity) -> Option<i64> {
    match periodicity {
        Periodicity::Daily => Some(1),
        Periodicity::Weekly => Some(7),
        Periodicity::Other(_) => None,
    }
}

/// `anchor + duration × period-length`.
///
/// An unrecognized periodicity leaves the anchor unchanged.
pub fn calculate_deadline(
    periodicity: &Periodicity,
    duration: u32,
    anchor: DateTime<Utc>,
) -> DateTime<Utc> {
    match period_days(periodicity) {
        Some(days) => anchor + Duration::days(days * i64::from(duration)),
        None => anchor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 23, 16, 30, 0).unwrap()
    }

    #[test]
    fn daily_one_period_is_one_day() {
        assert_eq!(
            calculate_deadline(&Periodicity::Daily, 1, t0()),
            Utc.with_ymd_and_hms(2024, 6, 24, 16, 30, 0).unwrap()
        );
    }

    #[test]
    fn weekly_four_periods_is_twenty_eight_days() {
        assert_eq!(
            calculate_deadline(&Periodicity::Weekly, 4, t0()),
            t0() + Duration::days(28)
        );
    }

    #[test]
    fn unknown_cadence_does_not_move_the_deadline() {
        let other = Periodicity::Other("monthly".into());
        assert_eq!(calculate_deadline(&other, 12, t0()), t0());
    }

    proptest! {
        #[test]
        fn deadline_is_exact_multiple_of_period(n in 1u32..10_000, offset in 0i64..4_000_000_000) {
            let anchor = DateTime::<Utc>::from_timestamp(offset, 0).unwrap();
            prop_assert_eq!(
                calculate_deadline(&Periodicity::Daily, n, anchor),
                anchor + Duration::days(i64::from(n))
            );
            prop_assert_eq!(
                calculate_deadline(&Periodicity::Weekly, n, anchor),
                anchor + Duration::days(7 * i64::from(n))
            );
        }
    }
}
