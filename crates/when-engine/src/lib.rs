//! # when-engine
//!
//! Free-form time expression parsing for command interfaces.
//!
//! Users of chat and command-line tools type times the way they speak:
//! `10m`, `"2 days" water the plants`, `me in 2 hours to stretch`,
//! `do the thing tomorrow at 5pm`. This crate turns such input into an
//! absolute UTC instant plus the part of the input that was not the time —
//! the command payload — enforcing where a time phrase may sit (the very
//! start or end of the input, optionally double-quoted) and, when the caller
//! asks, that the instant is not in the past.
//!
//! Resolution is two-staged: a compact duration grammar
//! (`1y2mo3w4d5h6m7s`) is tried first, then a natural-language resolver for
//! dates, weekdays, clock times, and unit durations. Both are anchored on an
//! explicit reference instant the caller provides (no system clock access),
//! keeping every operation deterministic and testable.
//!
//! # Modules
//!
//! - [`short`] — compact duration grammar (`10m`, `2d12h`)
//! - [`natural`] — natural-language resolution with match-span reporting
//! - [`convert`] — input splitting, constraint policies, payload delegation
//! - [`humanize`] — human-readable rendering of the gap between two instants
//! - [`delta`] — calendar-aware duration fields and arithmetic
//! - [`error`] — error types
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use when_engine::TimeConverter;
//!
//! let now = Utc.with_ymd_and_hms(2026, 2, 18, 14, 30, 0).unwrap();
//! let converter = TimeConverter::default();
//!
//! let conv = converter.convert("10m water the plants", now).unwrap();
//! assert_eq!(conv.dt, now + chrono::Duration::minutes(10));
//! assert_eq!(conv.remaining, "water the plants");
//! ```

pub mod convert;
pub mod delta;
pub mod error;
pub mod humanize;
pub mod natural;
pub mod short;

pub use convert::{Conversion, RemainderParser, ResolvedTime, TimeConverter};
pub use delta::{CalendarDelta, TimeUnit};
pub use error::{BoxError, Result, WhenError};
pub use humanize::human_delta;
pub use natural::{
    Accuracy, MatchSpan, NaturalMatch, NaturalResolver, ParseStatus, ResolverConfig,
};
