//! Compact duration grammar: `10m`, `2d12h`, `1y2mo3w4d5h6m7s`.
//!
//! Ordered unit groups, each optional, concatenated with no separators.
//! Every group carries a digit-count ceiling sized to its unit, which both
//! bounds scanning and caps absurd values without explicit range checks.
//! Matching zero groups is a no-match, not a zero duration.

use crate::delta::{CalendarDelta, TimeUnit};

/// One grammar group: unit, digit ceiling, accepted suffixes.
///
/// Suffix alternatives are ordered longest first so `mins` wins over `min`
/// wins over `m`.
const GROUPS: [(TimeUnit, usize, &[&str]); 7] = [
    (TimeUnit::Years, 1, &["years", "year", "y"]),
    (TimeUnit::Months, 2, &["months", "month", "mo"]),
    (TimeUnit::Weeks, 4, &["weeks", "week", "w"]),
    (TimeUnit::Days, 5, &["days", "day", "d"]),
    (TimeUnit::Hours, 5, &["hours", "hour", "h"]),
    (TimeUnit::Minutes, 5, &["minutes", "minute", "mins", "min", "m"]),
    (TimeUnit::Seconds, 5, &["seconds", "second", "secs", "sec", "s"]),
];

/// Match the grammar against the entire input.
///
/// Returns `None` unless every byte of `input` is consumed by at least one
/// group.
pub fn parse(input: &str) -> Option<CalendarDelta> {
    match parse_prefix(input) {
        Some((delta, end)) if end == input.len() => Some(delta),
        _ => None,
    }
}

/// Match the grammar anchored at the start of `input`.
///
/// Returns the parsed fields and the byte offset one past the last consumed
/// character, so callers can treat the tail as a separate payload
/// (`"2d12h water the plants"`).
pub fn parse_prefix(input: &str) -> Option<(CalendarDelta, usize)> {
    let mut delta = CalendarDelta::default();
    let mut pos = 0;
    let mut matched = false;

    for (unit, ceiling, suffixes) in GROUPS {
        if let Some((value, end)) = scan_group(input, pos, ceiling, suffixes) {
            delta.set(unit, value);
            pos = end;
            matched = true;
        }
    }

    matched.then_some((delta, pos))
}

/// Scan one `<digits><suffix>` group at `pos`.
///
/// A digit run longer than `ceiling` fails the group without consuming
/// anything: no suffix starts with a digit, so there is no shorter split the
/// grammar could have taken instead.
fn scan_group(input: &str, pos: usize, ceiling: usize, suffixes: &[&str]) -> Option<(u64, usize)> {
    let rest = &input[pos..];
    let run = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(rest.len(), |(i, _)| i);
    if run == 0 || run > ceiling {
        return None;
    }

    let value: u64 = rest[..run].parse().ok()?;
    let after = pos + run;
    for suffix in suffixes {
        if input
            .get(after..after + suffix.len())
            .is_some_and(|s| s.eq_ignore_ascii_case(suffix))
        {
            return Some((value, after + suffix.len()));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_single_group() {
        let delta = parse("10m").unwrap();
        assert_eq!(delta.minutes, 10);
        assert_eq!(delta.seconds, 0);
    }

    #[test]
    fn test_parse_compound() {
        let delta = parse("2d12h").unwrap();
        assert_eq!(delta.days, 2);
        assert_eq!(delta.hours, 12);
    }

    #[test]
    fn test_parse_every_group() {
        let delta = parse("1y2mo3w4d5h6m7s").unwrap();
        assert_eq!(delta.years, 1);
        assert_eq!(delta.months, 2);
        assert_eq!(delta.weeks, 3);
        assert_eq!(delta.days, 4);
        assert_eq!(delta.hours, 5);
        assert_eq!(delta.minutes, 6);
        assert_eq!(delta.seconds, 7);
    }

    #[test]
    fn test_parse_longhand_suffixes() {
        let delta = parse("15minutes").unwrap();
        assert_eq!(delta.minutes, 15);
        let delta = parse("9months").unwrap();
        assert_eq!(delta.months, 9);
    }

    #[test]
    fn test_parse_case_insensitive() {
        let delta = parse("2MO").unwrap();
        assert_eq!(delta.months, 2);
    }

    #[test]
    fn test_parse_empty_is_no_match() {
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_parse_plain_text_is_no_match() {
        assert_eq!(parse("abc"), None);
        assert_eq!(parse("tomorrow"), None);
    }

    #[test]
    fn test_parse_bare_number_is_no_match() {
        assert_eq!(parse("10"), None);
    }

    #[test]
    fn test_parse_rejects_spaces() {
        assert_eq!(parse("15 minutes"), None);
    }

    #[test]
    fn test_parse_digit_ceiling() {
        // Years take a single digit; nothing else can absorb "12y".
        assert_eq!(parse("12y"), None);
        assert_eq!(parse("123456s"), None);
    }

    #[test]
    fn test_parse_out_of_order_groups_fail() {
        // Hours come before minutes in the grammar; there is no backtrack.
        assert_eq!(parse("6m5h"), None);
    }

    #[test]
    fn test_prefix_returns_tail_offset() {
        let (delta, end) = parse_prefix("10m water the plants").unwrap();
        assert_eq!(delta.minutes, 10);
        assert_eq!(end, 3);
    }

    #[test]
    fn test_prefix_requires_leading_match() {
        assert_eq!(parse_prefix("water the plants 10m"), None);
    }

    #[test]
    fn test_full_parse_rejects_trailing_payload() {
        assert_eq!(parse("10m water the plants"), None);
    }

    proptest! {
        #[test]
        fn prop_canonical_rendering_reparses(
            years in proptest::option::of(0u64..=9),
            months in proptest::option::of(0u64..=99),
            weeks in proptest::option::of(0u64..=9999),
            days in proptest::option::of(0u64..=99_999),
            hours in proptest::option::of(0u64..=99_999),
            minutes in proptest::option::of(0u64..=99_999),
            seconds in proptest::option::of(0u64..=99_999),
        ) {
            let fields = [
                (years, TimeUnit::Years, "y"),
                (months, TimeUnit::Months, "mo"),
                (weeks, TimeUnit::Weeks, "w"),
                (days, TimeUnit::Days, "d"),
                (hours, TimeUnit::Hours, "h"),
                (minutes, TimeUnit::Minutes, "m"),
                (seconds, TimeUnit::Seconds, "s"),
            ];
            prop_assume!(fields.iter().any(|(v, _, _)| v.is_some()));

            let mut rendered = String::new();
            let mut expected = CalendarDelta::default();
            for (value, unit, suffix) in fields {
                if let Some(v) = value {
                    rendered.push_str(&format!("{v}{suffix}"));
                    expected.set(unit, v);
                }
            }

            prop_assert_eq!(parse(&rendered), Some(expected));
        }

        #[test]
        fn prop_arbitrary_input_never_panics(s in "\\PC*") {
            let _ = parse(&s);
            let _ = parse_prefix(&s);
        }
    }
}
