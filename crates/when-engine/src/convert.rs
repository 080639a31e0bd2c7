//! Input splitting: separate the time expression from the command payload.
//!
//! [`TimeConverter`] owns the two-stage strategy — compact duration grammar
//! first, natural-language scan second — plus the positional rules for where
//! a time phrase may sit inside the input. A phrase must open the input
//! (optionally wrapped in double quotes) or close it; anything in the middle
//! is rejected rather than guessed at.
//!
//! Callers that only need a single expression resolved, with no payload, use
//! the policy variants [`TimeConverter::parse_time`] /
//! [`TimeConverter::parse_future`] instead of the full conversion.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::delta::CalendarDelta;
use crate::error::{BoxError, Result, WhenError};
use crate::natural::{NaturalResolver, ResolverConfig};
use crate::short;

// ── Results ─────────────────────────────────────────────────────────────────

/// A time resolved from a single expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedTime {
    /// The resolved instant.
    pub dt: DateTime<Utc>,
    /// Whether the phrase resolved to an instant before the reference time
    /// ("yesterday", "30 minutes ago").
    pub past: bool,
}

/// The outcome of a full conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion<T = String> {
    /// The input exactly as given.
    pub raw: String,
    /// The resolved instant.
    pub dt: DateTime<Utc>,
    /// The reference instant the resolution was anchored on.
    pub now: DateTime<Utc>,
    /// The non-time part of the input.
    pub remaining: String,
    /// The remainder parser's output; the remaining text verbatim when no
    /// parser is involved.
    pub payload: T,
}

/// A caller-supplied parser for the non-time part of the input.
///
/// May suspend (awaiting external validation, lookups, ...); its outcome is
/// forwarded without modification.
#[async_trait]
pub trait RemainderParser: Send + Sync {
    type Value: Send;

    async fn parse(&self, remaining: &str) -> std::result::Result<Self::Value, BoxError>;
}

// ── Converter ───────────────────────────────────────────────────────────────

/// Two-stage time-expression converter.
#[derive(Debug, Clone, Default)]
pub struct TimeConverter {
    resolver: NaturalResolver,
}

impl TimeConverter {
    pub fn new(config: ResolverConfig) -> Self {
        TimeConverter {
            resolver: NaturalResolver::new(config),
        }
    }

    pub fn resolver(&self) -> &NaturalResolver {
        &self.resolver
    }

    // ── Single-expression resolution ────────────────────────────────────

    /// Resolve `input` as a compact duration; the entire string must match.
    ///
    /// Compact durations are future-relative by construction: the grammar has
    /// no sign and no unit counts below zero.
    pub fn parse_short(&self, input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let delta = short::parse(input).ok_or(WhenError::NoTimeFound)?;
        apply_short_delta(&delta, input, now)
    }

    /// Resolve `input` as a natural-language expression.
    ///
    /// Never fails on a past instant; the `past` flag reports it instead.
    pub fn parse_human(&self, input: &str, now: DateTime<Utc>) -> Result<ResolvedTime> {
        let (dt, status) = self
            .resolver
            .resolve(input, now)
            .ok_or(WhenError::NoTimeFound)?;
        let dt = self.resolver.apply_defaults(dt, status, now)?;
        Ok(ResolvedTime { dt, past: dt < now })
    }

    /// Resolve `input` by either strategy: grammar first, language second.
    pub fn parse_time(&self, input: &str, now: DateTime<Utc>) -> Result<ResolvedTime> {
        if let Some(delta) = short::parse(input) {
            let dt = apply_short_delta(&delta, input, now)?;
            return Ok(ResolvedTime { dt, past: false });
        }
        self.parse_human(input, now)
    }

    /// Like [`parse_time`](Self::parse_time), but anything not strictly in
    /// the future is rejected.
    pub fn parse_future(&self, input: &str, now: DateTime<Utc>) -> Result<ResolvedTime> {
        let resolved = self.parse_time(input, now)?;
        if resolved.past {
            return Err(WhenError::TimeInPast);
        }
        Ok(resolved)
    }

    // ── Full conversion ─────────────────────────────────────────────────

    /// Split `input` into a resolved instant and the remaining payload.
    ///
    /// When no time expression is found at all, the whole input is payload
    /// and the instant is `now` — deferring the "was a time required?"
    /// question to the caller. A resolved instant before `now` is always
    /// rejected here.
    pub fn convert(&self, input: &str, now: DateTime<Utc>) -> Result<Conversion> {
        let (dt, remaining) = self.split(input, now)?;
        check_not_past(dt, now)?;
        Ok(Conversion {
            raw: input.to_string(),
            dt,
            now,
            remaining: remaining.clone(),
            payload: remaining,
        })
    }

    /// Like [`convert`](Self::convert), delegating the remaining text to
    /// `parser`. This is the only suspension point in the crate; the
    /// parser's failure propagates unchanged.
    pub async fn convert_with<P>(
        &self,
        input: &str,
        now: DateTime<Utc>,
        parser: &P,
    ) -> Result<Conversion<P::Value>>
    where
        P: RemainderParser + ?Sized,
    {
        let (dt, remaining) = self.split(input, now)?;
        check_not_past(dt, now)?;
        let payload = parser
            .parse(&remaining)
            .await
            .map_err(WhenError::Remainder)?;
        Ok(Conversion {
            raw: input.to_string(),
            dt,
            now,
            remaining,
            payload,
        })
    }

    // ── Splitting ───────────────────────────────────────────────────────

    /// Separate the time expression from the payload.
    fn split(&self, input: &str, now: DateTime<Utc>) -> Result<(DateTime<Utc>, String)> {
        // Strategy 1: compact duration anchored at the start.
        if let Some((delta, end)) = short::parse_prefix(input) {
            tracing::debug!(consumed = end, "matched compact duration prefix");
            let dt = apply_short_delta(&delta, &input[..end], now)?;
            return Ok((dt, input[end..].trim().to_string()));
        }

        // Strategy 2: natural language over a normalized argument.
        let argument = normalize_argument(input);

        let Some(hit) = self.resolver.scan(argument, now) else {
            return Ok((now, argument.to_string()));
        };

        let dt = self.resolver.apply_defaults(hit.dt, hit.status, now)?;
        let (begin, end) = (hit.span.start, hit.span.end);

        if begin > 1 && end != argument.len() {
            return Err(WhenError::MisplacedTime);
        }

        let remaining = if begin <= 1 {
            if begin == 1 {
                // One character in: only a quoted phrase earns that offset.
                if !argument.starts_with('"') {
                    return Err(WhenError::MissingOpeningQuote);
                }
                if !argument[end..].starts_with('"') {
                    return Err(WhenError::MissingClosingQuote);
                }
                strip_leading_punctuation(&argument[end + 1..])
            } else {
                strip_leading_punctuation(&argument[end..])
            }
        } else {
            // end == argument.len(): the payload sits in front.
            argument[..begin].trim()
        };

        Ok((dt, remaining.to_string()))
    }
}

/// Apply a parsed compact duration to the anchor.
fn apply_short_delta(
    delta: &CalendarDelta,
    expression: &str,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    delta.add_to(now).ok_or_else(|| {
        tracing::error!(expression, "compact duration left the representable range");
        WhenError::OutOfRange(format!("'{expression}' overflows the calendar"))
    })
}

/// Conversions always demand the present or future.
fn check_not_past(dt: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
    if dt < now {
        return Err(WhenError::TimeInPast);
    }
    Ok(())
}

/// Trim the fillers command phrasing wraps a time in: a trailing "from now",
/// a leading "for ", and the "me to/in/at" of phrasings like
/// "remind me in 2 hours to ...". The expression grammar handles none of
/// these.
fn normalize_argument(input: &str) -> &str {
    let mut argument = input;
    if let Some(stripped) = argument.strip_suffix(" from now") {
        argument = stripped.trim_end();
    }
    if let Some(stripped) = argument.strip_prefix("for ") {
        argument = stripped.trim_start();
    }
    for filler in ["me to ", "me in ", "me at "] {
        if let Some(stripped) = argument.strip_prefix(filler) {
            argument = stripped;
            break;
        }
    }
    argument
}

/// Strip the ` ,.!` characters a payload may lead with after a time phrase.
fn strip_leading_punctuation(s: &str) -> &str {
    s.trim_start_matches([' ', ',', '.', '!'])
}

// ── Tests ───────────────────────────────────────────────────────────────────
