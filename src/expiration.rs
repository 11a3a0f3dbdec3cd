//! Requested lifetimes and the expiration normalization policy.
//!
//! Callers ask for a lifetime when caching a value. That request is signed
//! (a negative request is legal input) and is normalized exactly once, at
//! store time:
//!
//! | Requested | Effective |
//! |-----------|-----------|
//! | `< 0` | `0` (backend default, no explicit expiry) |
//! | `0 ..< 1s` | [`DEFAULT_TTL`] (one hour) |
//! | `>= 1s` | unchanged |
//!
//! ```
//! use tag_cache::expiration::{Ttl, DEFAULT_TTL};
//! use std::time::Duration;
//!
//! assert_eq!(Ttl::from_secs(-5).normalize(), Duration::ZERO);
//! assert_eq!(Ttl::from_millis(500).normalize(), DEFAULT_TTL);
//! assert_eq!(Ttl::from_secs(2).normalize(), Duration::from_secs(2));
//! ```

use std::fmt;
use std::time::Duration;

/// Smallest requested lifetime that is honoured as given.
pub const MIN_TTL: Duration = Duration::from_secs(1);

/// Lifetime substituted for sub-second requests.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// A caller-requested lifetime, possibly negative.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ttl {
    negative: bool,
    magnitude: Duration,
}

impl Ttl {
    /// A zero-length request. Normalizes to [`DEFAULT_TTL`].
    pub const ZERO: Ttl = Ttl {
        negative: false,
        magnitude: Duration::ZERO,
    };

    /// A non-negative request of `duration`.
    pub const fn new(duration: Duration) -> Self {
        Ttl {
            negative: false,
            magnitude: duration,
        }
    }

    /// A negative request of `-duration`.
    ///
    /// `Ttl::negative(Duration::ZERO)` is the same as [`Ttl::ZERO`].
    pub const fn negative(duration: Duration) -> Self {
        Ttl {
            negative: !duration.is_zero(),
            magnitude: duration,
        }
    }

    /// A request of `secs` seconds; negative values are negative requests.
    pub fn from_secs(secs: i64) -> Self {
        Self::from_signed(secs < 0, Duration::from_secs(secs.unsigned_abs()))
    }

    /// A request of `millis` milliseconds; negative values are negative requests.
    pub fn from_millis(millis: i64) -> Self {
        Self::from_signed(millis < 0, Duration::from_millis(millis.unsigned_abs()))
    }

    fn from_signed(negative: bool, magnitude: Duration) -> Self {
        if negative {
            Self::negative(magnitude)
        } else {
            Self::new(magnitude)
        }
    }

    /// Whether the request is below zero.
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Map the request to the lifetime the backend is asked to enforce.
    ///
    /// Pure and total. A zero result means "no explicit expiry".
    pub fn normalize(self) -> Duration {
        if self.negative {
            Duration::ZERO
        } else if self.magnitude < MIN_TTL {
            DEFAULT_TTL
        } else {
            self.magnitude
        }
    }

    /// Normalized lifetime in the form backends accept.
    pub(crate) fn backend_ttl(self) -> Option<Duration> {
        let effective = self.normalize();
        (!effective.is_zero()).then_some(effective)
    }
}

impl Default for Ttl {
    fn default() -> Self {
        Ttl::ZERO
    }
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Ttl::new(duration)
    }
}

impl fmt::Debug for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-{:?}", self.magnitude)
        } else {
            write!(f, "{:?}", self.magnitude)
        }
    }
}
