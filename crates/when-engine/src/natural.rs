//! Natural-language date/time resolution with span reporting.
//!
//! The resolver recognizes a fixed vocabulary of expressions — anchored words
//! ("tomorrow"), weekdays, month-day dates, clock and named times, unit
//! durations, and date+time combinations — and can either resolve a whole
//! string ([`NaturalResolver::resolve`]) or locate the leftmost, longest
//! parseable phrase inside free text ([`NaturalResolver::scan`]), reporting
//! the byte span of what it matched.
//!
//! If an expression cannot be parsed it is simply not a match; this module
//! never guesses. Day-relative words are interpreted in the configured
//! timezone against an explicit reference instant supplied by the caller.

use std::collections::HashMap;

use chrono::{
    DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;
use serde::Serialize;

use crate::delta::TimeUnit;
use crate::error::{Result, WhenError};

/// Windows wider than this cannot be produced by the expression grammar
/// ("next tuesday at 2:30pm" is four tokens).
const MAX_WINDOW: usize = 5;

// ── Match metadata ──────────────────────────────────────────────────────────

/// Granularity of a natural-language match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Accuracy {
    /// Date-level: "tomorrow", "next friday", "3 days".
    Day,
    /// Bare half-day ambiguity: "midnight" with no explicit day.
    HalfDay,
    /// Clock-level: "5pm", "17:00", "in 2 hours".
    Clock,
}

/// What a match pinned down, and how precisely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParseStatus {
    pub has_date: bool,
    pub has_time: bool,
    pub accuracy: Accuracy,
}

/// Byte offsets of a match within the scanned input.
///
/// Always on char boundaries; `start <= end <= input.len()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

/// A phrase located by [`NaturalResolver::scan`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NaturalMatch {
    /// Candidate instant, before time-of-day defaulting.
    pub dt: DateTime<Utc>,
    pub status: ParseStatus,
    pub span: MatchSpan,
}

// ── Resolver construction ───────────────────────────────────────────────────

/// Configuration for building a [`NaturalResolver`].
///
/// Built once at startup; the resolver is immutable afterwards.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Timezone in which day-relative words ("tomorrow", "midnight") are
    /// interpreted. Resolved instants are always returned in UTC.
    pub timezone: Tz,
    /// Unit aliases layered on top of the built-in vocabulary.
    pub unit_aliases: Vec<(String, TimeUnit)>,
}

impl Default for ResolverConfig {
    /// UTC, plus the colloquial "mins"/"secs" abbreviations.
    fn default() -> Self {
        ResolverConfig {
            timezone: Tz::UTC,
            unit_aliases: vec![
                ("mins".to_string(), TimeUnit::Minutes),
                ("secs".to_string(), TimeUnit::Seconds),
            ],
        }
    }
}

/// Natural-language resolver with a fixed, immutable vocabulary.
#[derive(Debug, Clone)]
pub struct NaturalResolver {
    tz: Tz,
    units: HashMap<String, TimeUnit>,
}

impl Default for NaturalResolver {
    fn default() -> Self {
        NaturalResolver::new(ResolverConfig::default())
    }
}

impl NaturalResolver {
    pub fn new(config: ResolverConfig) -> Self {
        let mut units = builtin_units();
        for (alias, unit) in config.unit_aliases {
            units.insert(alias.to_ascii_lowercase(), unit);
        }
        NaturalResolver {
            tz: config.timezone,
            units,
        }
    }

    /// The timezone day-relative words are interpreted in.
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    // ── Resolution entry points ─────────────────────────────────────────

    /// Resolve `input` where the entire string is one time expression.
    ///
    /// Surrounding whitespace and quote/punctuation framing are ignored;
    /// anything else unparsed is a miss.
    pub fn resolve(&self, input: &str, now: DateTime<Utc>) -> Option<(DateTime<Utc>, ParseStatus)> {
        let tokens = tokenize(input);
        if tokens.is_empty() {
            return None;
        }
        let lowered: Vec<String> = tokens
            .iter()
            .map(|t| t.text.to_ascii_lowercase())
            .collect();
        let parts: Vec<&str> = lowered.iter().map(String::as_str).collect();
        let now_local = now.with_timezone(&self.tz);
        self.parse_tokens(&parts, &now_local)
            .map(|(dt, status)| (dt.with_timezone(&Utc), status))
    }

    /// Find the leftmost, longest time phrase inside free text.
    ///
    /// Tokenizes on whitespace (shedding quote/punctuation framing from token
    /// edges, so a phrase after an opening quote begins at offset 1) and tries
    /// windows of up to [`MAX_WINDOW`] tokens, widest first, at each start
    /// position. The span always refers to the original input.
    pub fn scan(&self, input: &str, now: DateTime<Utc>) -> Option<NaturalMatch> {
        let tokens = tokenize(input);
        let now_local = now.with_timezone(&self.tz);

        for i in 0..tokens.len() {
            let widest = MAX_WINDOW.min(tokens.len() - i);
            for width in (1..=widest).rev() {
                let lowered: Vec<String> = tokens[i..i + width]
                    .iter()
                    .map(|t| t.text.to_ascii_lowercase())
                    .collect();
                let parts: Vec<&str> = lowered.iter().map(String::as_str).collect();
                if let Some((dt, status)) = self.parse_tokens(&parts, &now_local) {
                    let span = MatchSpan {
                        start: tokens[i].start,
                        end: tokens[i + width - 1].end,
                    };
                    tracing::debug!(start = span.start, end = span.end, "natural-language match");
                    return Some(NaturalMatch {
                        dt: dt.with_timezone(&Utc),
                        status,
                        span,
                    });
                }
            }
        }
        None
    }

    /// Fill in what the phrase left unsaid.
    ///
    /// A match with no time of day inherits `now`'s, so "tomorrow" fires at
    /// the same clock time tomorrow. A bare-midnight match moves onto the day
    /// after `now`'s day: the next midnight, not the one just passed.
    pub fn apply_defaults(
        &self,
        dt: DateTime<Utc>,
        status: ParseStatus,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let now_local = now.with_timezone(&self.tz);
        let local = dt.with_timezone(&self.tz);

        let local = if status.has_time {
            local
        } else {
            self.local_datetime(local.date_naive(), now_local.time())?
        };

        let local = if status.accuracy == Accuracy::HalfDay {
            let date = now_local.date_naive().succ_opt().ok_or_else(|| {
                WhenError::OutOfRange("next day is past the end of the calendar".to_string())
            })?;
            self.local_datetime(date, local.time())?
        } else {
            local
        };

        Ok(local.with_timezone(&Utc))
    }

    // ── Expression grammar ──────────────────────────────────────────────

    /// Parse a whole token window as one expression.
    ///
    /// Every token must be consumed; partial coverage is the scanner's job.
    /// Attempts are ordered most-specific first.
    fn parse_tokens(
        &self,
        tokens: &[&str],
        now: &DateTime<Tz>,
    ) -> Option<(DateTime<Tz>, ParseStatus)> {
        if let &[token] = tokens {
            if token == "now" {
                return Some((
                    *now,
                    ParseStatus {
                        has_date: true,
                        has_time: true,
                        accuracy: Accuracy::Clock,
                    },
                ));
            }
            if let Some(dt) = try_rfc3339(token) {
                return Some((
                    dt.with_timezone(&self.tz),
                    ParseStatus {
                        has_date: true,
                        has_time: true,
                        accuracy: Accuracy::Clock,
                    },
                ));
            }
            if let Some(date) = try_iso_date(token) {
                return self.date_only(date);
            }
        }

        if let Some(hit) = self.try_duration(tokens, now) {
            return Some(hit);
        }

        if let Some(date) = try_date_tokens(tokens, now) {
            return self.date_only(date);
        }

        if let Some((time, accuracy)) = try_time_tokens(strip_at(tokens)) {
            let dt = self.local_datetime_opt(now.date_naive(), time)?;
            return Some((
                dt,
                ParseStatus {
                    has_date: false,
                    has_time: true,
                    accuracy,
                },
            ));
        }

        // Combined "<date> [at] <time>": longest date prefix wins.
        for split in (1..tokens.len()).rev() {
            let Some(date) = try_date_tokens(&tokens[..split], now) else {
                continue;
            };
            let rest = strip_at(&tokens[split..]);
            if rest.is_empty() {
                continue;
            }
            if let Some((time, _)) = try_time_tokens(rest) {
                let dt = self.local_datetime_opt(date, time)?;
                // An explicit day disarms the bare-midnight ambiguity.
                return Some((
                    dt,
                    ParseStatus {
                        has_date: true,
                        has_time: true,
                        accuracy: Accuracy::Clock,
                    },
                ));
            }
        }

        None
    }

    /// Durations: `[in] <n|a|an> <unit> [ago]`.
    fn try_duration(
        &self,
        tokens: &[&str],
        now: &DateTime<Tz>,
    ) -> Option<(DateTime<Tz>, ParseStatus)> {
        let (tokens, anchored) = match tokens {
            ["in", rest @ ..] => (rest, true),
            _ => (tokens, false),
        };
        let (tokens, backwards) = match tokens {
            [rest @ .., "ago"] => (rest, true),
            _ => (tokens, false),
        };
        // "in ... ago" is nonsense
        if anchored && backwards {
            return None;
        }
        let &[count, unit] = tokens else {
            return None;
        };

        let count: u64 = match count {
            "a" | "an" => 1,
            other => other.parse().ok().filter(|n| *n <= 1_000_000)?,
        };
        let unit = *self.units.get(unit)?;
        let dt = offset_from(*now, unit, count, backwards)?;

        let status = if unit.is_date_sized() {
            ParseStatus {
                has_date: true,
                has_time: false,
                accuracy: Accuracy::Day,
            }
        } else {
            ParseStatus {
                has_date: false,
                has_time: true,
                accuracy: Accuracy::Clock,
            }
        };
        Some((dt, status))
    }

    fn date_only(&self, date: NaiveDate) -> Option<(DateTime<Tz>, ParseStatus)> {
        let dt = self.local_datetime_opt(date, NaiveTime::MIN)?;
        Some((
            dt,
            ParseStatus {
                has_date: true,
                has_time: false,
                accuracy: Accuracy::Day,
            },
        ))
    }

    /// Resolve a naive local datetime, treating DST gaps/folds as a no-match.
    fn local_datetime_opt(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Tz>> {
        self.tz.from_local_datetime(&date.and_time(time)).single()
    }

    /// Resolve a naive local datetime, surfacing DST gaps/folds as errors.
    fn local_datetime(&self, date: NaiveDate, time: NaiveTime) -> Result<DateTime<Tz>> {
        self.local_datetime_opt(date, time).ok_or_else(|| {
            tracing::error!(
                %date,
                %time,
                timezone = %self.tz,
                "local time is ambiguous or nonexistent"
            );
            WhenError::OutOfRange(format!(
                "{date} {time} is ambiguous or nonexistent in {}",
                self.tz
            ))
        })
    }
}

/// Built-in unit vocabulary. Colloquial plural abbreviations ("mins",
/// "secs") are deliberately absent: they arrive via [`ResolverConfig`].
fn builtin_units() -> HashMap<String, TimeUnit> {
    let table = [
        ("year", TimeUnit::Years),
        ("years", TimeUnit::Years),
        ("yr", TimeUnit::Years),
        ("yrs", TimeUnit::Years),
        ("month", TimeUnit::Months),
        ("months", TimeUnit::Months),
        ("week", TimeUnit::Weeks),
        ("weeks", TimeUnit::Weeks),
        ("wk", TimeUnit::Weeks),
        ("wks", TimeUnit::Weeks),
        ("day", TimeUnit::Days),
        ("days", TimeUnit::Days),
        ("hour", TimeUnit::Hours),
        ("hours", TimeUnit::Hours),
        ("hr", TimeUnit::Hours),
        ("hrs", TimeUnit::Hours),
        ("minute", TimeUnit::Minutes),
        ("minutes", TimeUnit::Minutes),
        ("min", TimeUnit::Minutes),
        ("second", TimeUnit::Seconds),
        ("seconds", TimeUnit::Seconds),
        ("sec", TimeUnit::Seconds),
    ];
    table
        .into_iter()
        .map(|(alias, unit)| (alias.to_string(), unit))
        .collect()
}

// ── Tokenization ────────────────────────────────────────────────────────────

/// A whitespace-separated word with its framing stripped.
#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

fn is_frame(c: char) -> bool {
    matches!(c, '"' | ',' | '.' | '!')
}

/// Split on whitespace, shedding quote/punctuation framing from token edges
/// while keeping byte offsets into the original input.
fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in input.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                push_token(input, s, i, &mut tokens);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        push_token(input, s, input.len(), &mut tokens);
    }
    tokens
}

fn push_token<'a>(input: &'a str, mut start: usize, mut end: usize, out: &mut Vec<Token<'a>>) {
    let word = &input[start..end];
    start += word.len() - word.trim_start_matches(is_frame).len();
    let word = &input[start..end];
    end -= word.len() - word.trim_end_matches(is_frame).len();
    if start < end {
        out.push(Token {
            text: &input[start..end],
            start,
            end,
        });
    }
}

// ── Date and time word parsers ──────────────────────────────────────────────

/// Drop a single leading "at" before a time ("at 5pm", "at noon").
fn strip_at<'a>(tokens: &'a [&'a str]) -> &'a [&'a str] {
    match tokens {
        ["at", rest @ ..] if !rest.is_empty() => rest,
        _ => tokens,
    }
}

/// A date named by one to three tokens: anchored words, weekdays with an
/// optional modifier, or month-day forms.
fn try_date_tokens(tokens: &[&str], now: &DateTime<Tz>) -> Option<NaiveDate> {
    match tokens {
        &[word] => {
            if let Some(date) = try_anchored_date(word, now) {
                return Some(date);
            }
            // A bare weekday means the next occurrence, never today.
            parse_weekday(word).map(|wd| next_weekday(now.date_naive(), wd))
        }
        &[modifier, word] if matches!(modifier, "next" | "this" | "last") => {
            let weekday = parse_weekday(word)?;
            let today = now.date_naive();
            Some(match modifier {
                "next" => next_weekday(today, weekday),
                "this" => this_weekday(today, weekday),
                _ => last_weekday(today, weekday),
            })
        }
        _ => try_month_day(tokens, now),
    }
}

fn try_anchored_date(word: &str, now: &DateTime<Tz>) -> Option<NaiveDate> {
    let today = now.date_naive();
    match word {
        "today" => Some(today),
        "tomorrow" => today.succ_opt(),
        "yesterday" => today.pred_opt(),
        _ => None,
    }
}

/// Month-day dates: "march 5", "5 march", "june 3rd", optional trailing year.
fn try_month_day(tokens: &[&str], now: &DateTime<Tz>) -> Option<NaiveDate> {
    let (first, second, year) = match tokens {
        &[a, b] => (a, b, now.year()),
        &[a, b, y] => (a, b, y.parse().ok().filter(|y| (1970..=9999).contains(y))?),
        _ => return None,
    };
    let (month, day) = if let Some(month) = parse_month(first) {
        (month, parse_day_number(second)?)
    } else if let Some(month) = parse_month(second) {
        (month, parse_day_number(first)?)
    } else {
        return None;
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Clock or named time over one or two tokens ("5pm", "17:00", "5 pm", "noon").
fn try_time_tokens(tokens: &[&str]) -> Option<(NaiveTime, Accuracy)> {
    match tokens {
        &[word] => {
            if let Some(named) = named_time(word) {
                return Some(named);
            }
            parse_clock(word).map(|t| (t, Accuracy::Clock))
        }
        &[digits, meridiem] if matches!(meridiem, "am" | "pm") => {
            parse_clock(&format!("{digits}{meridiem}")).map(|t| (t, Accuracy::Clock))
        }
        _ => None,
    }
}

/// Named times of day. Bare "midnight" is ambiguous to a half day: which
/// midnight is meant gets settled against the reference time later.
fn named_time(word: &str) -> Option<(NaiveTime, Accuracy)> {
    let (hour, accuracy) = match word {
        "morning" => (9, Accuracy::Clock),
        "noon" => (12, Accuracy::Clock),
        "afternoon" => (13, Accuracy::Clock),
        "evening" => (18, Accuracy::Clock),
        "night" => (21, Accuracy::Clock),
        "midnight" => (0, Accuracy::HalfDay),
        _ => return None,
    };
    NaiveTime::from_hms_opt(hour, 0, 0).map(|t| (t, accuracy))
}

/// Parse a clock time: "17:00", "17:00:30", "5pm", "5:30pm", "5:30:00pm".
fn parse_clock(s: &str) -> Option<NaiveTime> {
    // 24-hour forms first
    if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M:%S") {
        return Some(t);
    }
    if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M") {
        return Some(t);
    }

    let (body, is_pm) = if let Some(body) = s.strip_suffix("pm") {
        (body, true)
    } else if let Some(body) = s.strip_suffix("am") {
        (body, false)
    } else {
        return None;
    };
    if body.is_empty() {
        return None;
    }

    let mut parts = body.split(':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = match parts.next() {
        Some(p) => p.parse().ok()?,
        None => 0,
    };
    let second: u32 = match parts.next() {
        Some(p) => p.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() || hour == 0 || hour > 12 {
        return None;
    }

    let hour24 = match (hour, is_pm) {
        (12, true) => 12,
        (12, false) => 0,
        (h, true) => h + 12,
        (h, false) => h,
    };
    NaiveTime::from_hms_opt(hour24, minute, second)
}

/// `now` shifted by `count` units, forwards or backwards, calendar-aware.
fn offset_from(now: DateTime<Tz>, unit: TimeUnit, count: u64, backwards: bool) -> Option<DateTime<Tz>> {
    match unit {
        TimeUnit::Years | TimeUnit::Months => {
            let factor = if unit == TimeUnit::Years { 12 } else { 1 };
            let months = Months::new(u32::try_from(count.checked_mul(factor)?).ok()?);
            if backwards {
                now.checked_sub_months(months)
            } else {
                now.checked_add_months(months)
            }
        }
        TimeUnit::Weeks | TimeUnit::Days => {
            let factor = if unit == TimeUnit::Weeks { 7 } else { 1 };
            let days = Days::new(count.checked_mul(factor)?);
            if backwards {
                now.checked_sub_days(days)
            } else {
                now.checked_add_days(days)
            }
        }
        _ => {
            let factor = match unit {
                TimeUnit::Hours => 3600,
                TimeUnit::Minutes => 60,
                _ => 1,
            };
            let seconds = Duration::try_seconds(i64::try_from(count).ok()?.checked_mul(factor)?)?;
            if backwards {
                now.checked_sub_signed(seconds)
            } else {
                now.checked_add_signed(seconds)
            }
        }
    }
}

fn try_rfc3339(token: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&token.to_ascii_uppercase())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn try_iso_date(token: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(token, "%Y-%m-%d").ok()
}

/// Parse a weekday name (full or abbreviated).
fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Parse a month name to number (1-12).
fn parse_month(s: &str) -> Option<u32> {
    match s {
        "january" | "jan" => Some(1),
        "february" | "feb" => Some(2),
        "march" | "mar" => Some(3),
        "april" | "apr" => Some(4),
        "may" => Some(5),
        "june" | "jun" => Some(6),
        "july" | "jul" => Some(7),
        "august" | "aug" => Some(8),
        "september" | "sep" | "sept" => Some(9),
        "october" | "oct" => Some(10),
        "november" | "nov" => Some(11),
        "december" | "dec" => Some(12),
        _ => None,
    }
}

/// Day-of-month with an optional ordinal suffix: "5", "5th", "23rd".
fn parse_day_number(s: &str) -> Option<u32> {
    let digits = s
        .strip_suffix("st")
        .or_else(|| s.strip_suffix("nd"))
        .or_else(|| s.strip_suffix("rd"))
        .or_else(|| s.strip_suffix("th"))
        .unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|d| (1..=31).contains(d))
}

/// The next occurrence of `weekday` strictly after `today`.
fn next_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (i64::from(weekday.num_days_from_monday())
        - i64::from(today.weekday().num_days_from_monday())
        + 7)
        % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    today + Duration::days(ahead)
}

/// `weekday` within the current Monday-started week; may be in the past.
fn this_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let diff = i64::from(weekday.num_days_from_monday())
        - i64::from(today.weekday().num_days_from_monday());
    today + Duration::days(diff)
}

/// The closest occurrence of `weekday` strictly before `today`.
fn last_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let back = (i64::from(today.weekday().num_days_from_monday())
        - i64::from(weekday.num_days_from_monday())
        + 7)
        % 7;
    let back = if back == 0 { 7 } else { back };
    today - Duration::days(back)
}

// ── Tests ───────────────────────────────────────────────────────────────────
