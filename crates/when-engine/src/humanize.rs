//! Human-readable rendering of the gap between two instants.

use chrono::{DateTime, Utc};

use crate::delta::CalendarDelta;

/// Render `target` relative to `source` as a short phrase.
///
/// The gap is decomposed calendar-aware (months keep their real lengths) and
/// rendered largest unit first: `"2 days and 4 hours"`, `"1 year, 2 months
/// and 3 days"`. At most three components are shown; smaller ones are
/// silently dropped. A target at or before the source gets an `" ago"`
/// suffix; a zero gap is `"now"`.
///
/// Sub-second remainders are never rendered. When both the second and
/// sub-second components are non-zero, one whole second is added and the
/// fraction dropped.
pub fn human_delta(target: DateTime<Utc>, source: DateTime<Utc>) -> String {
    let (mut delta, suffix) = if target > source {
        (CalendarDelta::between(target, source), "")
    } else {
        (CalendarDelta::between(source, target), " ago")
    };

    if delta.microseconds != 0 && delta.seconds != 0 {
        delta.seconds += 1;
        if delta.seconds == 60 {
            delta.seconds = 0;
            delta.minutes += 1;
            if delta.minutes == 60 {
                delta.minutes = 0;
                delta.hours += 1;
                if delta.hours == 24 {
                    delta.hours = 0;
                    delta.days += 1;
                }
            }
        }
    }

    let components = [
        (delta.years, "years"),
        (delta.months, "months"),
        (delta.days, "days"),
        (delta.hours, "hours"),
        (delta.minutes, "minutes"),
        (delta.seconds, "seconds"),
    ];

    let mut output = Vec::new();
    for (value, unit) in components {
        if value == 0 {
            continue;
        }
        if value > 1 {
            output.push(format!("{value} {unit}"));
        } else {
            // Singular: drop the trailing character.
            output.push(format!("{value} {}", &unit[..unit.len() - 1]));
        }
    }

    match output.len() {
        0 => "now".to_string(),
        1 => format!("{}{suffix}", output[0]),
        2 => format!("{} and {}{suffix}", output[0], output[1]),
        _ => format!("{}, {} and {}{suffix}", output[0], output[1], output[2]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 18, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_zero_gap_is_now() {
        assert_eq!(human_delta(anchor(), anchor()), "now");
    }

    #[test]
    fn test_singular_component() {
        assert_eq!(human_delta(anchor() + Duration::days(1), anchor()), "1 day");
    }

    #[test]
    fn test_plural_component() {
        assert_eq!(
            human_delta(anchor() + Duration::days(2), anchor()),
            "2 days"
        );
    }

    #[test]
    fn test_two_components_join_with_and() {
        assert_eq!(
            human_delta(anchor() + Duration::hours(2) + Duration::minutes(5), anchor()),
            "2 hours and 5 minutes"
        );
    }

    #[test]
    fn test_sub_second_folds_into_one_second() {
        let target = anchor() + Duration::seconds(90) + Duration::milliseconds(500);
        assert_eq!(human_delta(target, anchor()), "1 minute and 31 seconds");
    }

    #[test]
    fn test_sub_second_without_seconds_is_dropped() {
        let target = anchor() + Duration::minutes(2) + Duration::milliseconds(500);
        assert_eq!(human_delta(target, anchor()), "2 minutes");
    }

    #[test]
    fn test_sub_second_only_is_now() {
        let target = anchor() + Duration::milliseconds(500);
        assert_eq!(human_delta(target, anchor()), "now");
    }

    #[test]
    fn test_second_fold_cascades_into_minutes() {
        let target = anchor() + Duration::seconds(59) + Duration::milliseconds(500);
        assert_eq!(human_delta(target, anchor()), "1 minute");
    }

    #[test]
    fn test_only_first_three_components_render() {
        // 1 year, 2 months, 3 days, 4 hours — hours must be dropped.
        let target = Utc.with_ymd_and_hms(2027, 4, 21, 18, 30, 0).unwrap();
        assert_eq!(
            human_delta(target, anchor()),
            "1 year, 2 months and 3 days"
        );
    }

    #[test]
    fn test_past_direction_gets_suffix() {
        assert_eq!(
            human_delta(anchor() - Duration::hours(2), anchor()),
            "2 hours ago"
        );
        assert_eq!(
            human_delta(anchor() - Duration::days(1), anchor()),
            "1 day ago"
        );
    }

    #[test]
    fn test_calendar_aware_months() {
        // Mar 5 → Apr 5 is exactly one month, despite March's 31 days.
        let source = Utc.with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap();
        let target = Utc.with_ymd_and_hms(2026, 4, 5, 10, 0, 0).unwrap();
        assert_eq!(human_delta(target, source), "1 month");
    }
}
