use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

/// Noeq epoch: Monday, June 17, 2013 11:48:00.000 UTC
pub const NOEQ_EPOCH: Duration = Duration::from_millis(1_371_487_680_000);

/// A trait for time sources that return a wall-clock timestamp.
///
/// This abstraction allows you to plug in the real system clock or a mocked
/// time source in tests.
///
/// The unit is **milliseconds since the UNIX epoch**. Implementations are
/// expected to follow the wall clock, including its adjustments: detecting a
/// clock that moves backwards is the job of [`ClockGuard`], not the source.
///
/// # Example
///
/// ```
/// use noeq::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource<u64> for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// ```
///
/// [`ClockGuard`]: crate::ClockGuard
pub trait TimeSource<T> {
    /// Returns the current time in milliseconds since the UNIX epoch.
    fn current_millis(&self) -> T;
}

impl<T, S: TimeSource<T> + ?Sized> TimeSource<T> for &S {
    fn current_millis(&self) -> T {
        (**self).current_millis()
    }
}

/// The system wall clock, sampled on every call.
///
/// A clock set before 1970 reads as `0`, which the epoch check then rejects.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl TimeSource<u64> for SystemClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }
}
