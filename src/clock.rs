//! Gregorian 100-nanosecond clock and the clock sequence state behind version 1 UUIDs.

use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use rand::{rngs::OsRng, RngCore};
use tracing::debug;

/// Number of 100-nanosecond intervals between 1582-10-15T00:00:00Z (the start of the Gregorian
/// calendar) and 1970-01-01T00:00:00Z.
pub const GREGORIAN_OFFSET: u64 = 0x01b2_1dd2_1381_4000;

/// Distance, in 100-nanosecond ticks, that the system clock may advance while still lagging the
/// last issued tick before the clock sequence is reseeded.
pub const DRIFT_RESEED_TICKS: u64 = 10_000;

const TICKS_PER_SECOND: u64 = 10_000_000;

/// Mask of the 13-bit clock sequence issued by [`ClockSequencer`].
pub const SEQUENCE_MASK: u16 = (1 << 13) - 1;

/// A reading of the wall clock relative to the Unix epoch.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct WallTime {
    /// Whole seconds since 1970-01-01T00:00:00Z.
    pub seconds: u64,
    /// Sub-second offset in nanoseconds, below 1,000,000,000.
    pub nanos: u32,
}

/// A trait for wall-clock sources.
///
/// This abstraction allows you to plug in the system clock or a scripted clock in tests.
///
/// # Example
///
/// ```
/// use rfcuuid::{WallClock, WallTime};
///
/// struct FixedTime;
/// impl WallClock for FixedTime {
///     fn now(&self) -> WallTime {
///         WallTime { seconds: 1_212_926_400, nanos: 0 }
///     }
/// }
///
/// assert_eq!(FixedTime.now().seconds, 1_212_926_400);
/// ```
pub trait WallClock {
    /// Returns the current time.
    fn now(&self) -> WallTime;
}

impl<T: WallClock + ?Sized> WallClock for &T {
    fn now(&self) -> WallTime {
        (**self).now()
    }
}

impl<T: WallClock + ?Sized> WallClock for Arc<T> {
    fn now(&self) -> WallTime {
        (**self).now()
    }
}

impl<T: WallClock + ?Sized> WallClock for Box<T> {
    fn now(&self) -> WallTime {
        (**self).now()
    }
}

/// The operating system's real-time clock.
///
/// A system time before the Unix epoch reads as the epoch itself.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> WallTime {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        WallTime {
            seconds: elapsed.as_secs(),
            nanos: elapsed.subsec_nanos(),
        }
    }
}

/// Adapts a [`WallClock`] to 100-nanosecond ticks counted from the Gregorian epoch.
#[derive(Clone, Debug, Default)]
pub struct MonotonicClockSource<C> {
    clock: C,
}

impl<C: WallClock> MonotonicClockSource<C> {
    /// Wraps `clock`.
    pub const fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Returns the current tick: `seconds × 10^7 + nanos / 100 + GREGORIAN_OFFSET`.
    pub fn current_tick(&self) -> u64 {
        let WallTime { seconds, nanos } = self.clock.now();
        seconds
            .saturating_mul(TICKS_PER_SECOND)
            .saturating_add((nanos / 100) as u64)
            .saturating_add(GREGORIAN_OFFSET)
    }
}

/// A timestamp and clock sequence pair issued by [`ClockSequencer`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Tick {
    /// 100-nanosecond intervals since the Gregorian epoch.
    pub tick: u64,
    /// 13-bit clock sequence.
    pub sequence: u16,
}

/// Issues strictly increasing 100-nanosecond ticks together with an anti-collision clock
/// sequence.
///
/// Issued ticks follow the system clock while it advances. Requests arriving faster than the
/// clock resolution receive the last issued tick plus one, so ticks never repeat even when the
/// clock stands still or moves backwards. The clock sequence is reseeded from the random source
/// whenever the system clock regresses, and when the system clock advanced by more than the drift
/// threshold while still lagging the issued ticks.
///
/// This type is not synchronized; callers sharing one instance across threads wrap it in a mutex.
///
/// # Examples
///
/// ```rust
/// use rfcuuid::{ClockSequencer, SystemClock};
///
/// let mut s = ClockSequencer::new(SystemClock);
/// let a = s.issue();
/// let b = s.issue();
/// assert!(a.tick < b.tick);
/// ```
#[derive(Debug)]
pub struct ClockSequencer<C, R = OsRng> {
    source: MonotonicClockSource<C>,
    rng: R,
    last_system_tick: u64,
    last_issued_tick: u64,
    sequence: u16,
    drift_threshold: u64,
}

impl<C: WallClock> ClockSequencer<C> {
    /// Creates a sequencer reading `clock` and seeding the clock sequence from the operating
    /// system's random number generator.
    pub fn new(clock: C) -> Self {
        Self::with_rng(clock, OsRng)
    }
}

impl<C: WallClock, R: RngCore> ClockSequencer<C, R> {
    /// Creates a sequencer with a specified random number generator for clock sequence seeding.
    pub fn with_rng(clock: C, mut rng: R) -> Self {
        let sequence = rng.next_u32() as u16 & SEQUENCE_MASK;
        Self {
            source: MonotonicClockSource::new(clock),
            rng,
            last_system_tick: 0,
            last_issued_tick: 0,
            sequence,
            drift_threshold: DRIFT_RESEED_TICKS,
        }
    }

    /// Replaces the drift threshold, which defaults to [`DRIFT_RESEED_TICKS`].
    pub fn with_drift_threshold(mut self, ticks: u64) -> Self {
        self.drift_threshold = ticks;
        self
    }

    /// Returns the current clock sequence.
    pub const fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Issues the next `(tick, sequence)` pair.
    pub fn issue(&mut self) -> Tick {
        let mut current = self.source.current_tick();
        let previous_system_tick = self.last_system_tick;

        if current < previous_system_tick {
            self.reseed();
            debug!(
                current,
                previous_system_tick,
                sequence = self.sequence,
                "system clock regressed; clock sequence reseeded"
            );
        }
        self.last_system_tick = current;

        if current <= self.last_issued_tick {
            if current > previous_system_tick.saturating_add(self.drift_threshold) {
                self.reseed();
                debug!(
                    current,
                    last_issued_tick = self.last_issued_tick,
                    sequence = self.sequence,
                    "issued ticks ran ahead of system clock; clock sequence reseeded"
                );
            }
            current = self.last_issued_tick.saturating_add(1);
        }

        self.last_issued_tick = current;
        Tick {
            tick: current,
            sequence: self.sequence,
        }
    }

    /// Draws a new clock sequence while keeping the issued tick state.
    pub fn reseed(&mut self) {
        self.sequence = self.rng.next_u32() as u16 & SEQUENCE_MASK;
    }
}
