//! A Rust implementation of RFC 4122 UUIDs
//!
//! ```rust
//! use rfcuuid::{uuid1, uuid4, uuid5, Uuid};
//!
//! let uuid = uuid1();
//! println!("{}", uuid); // e.g. "1cef0eca-3728-11dd-af02-0013723f3004"
//! println!("{:?}", uuid.as_bytes()); // as 16-byte big-endian array
//!
//! let uuid = uuid4();
//! println!("{}", uuid); // e.g. "2ca4b2ce-6c13-40d4-bccf-37d222820f6f"
//!
//! let uuid = uuid5(&Uuid::NAMESPACE_DNS, "python.org");
//! assert_eq!(uuid.to_string(), "886313e1-3b8a-5372-9b90-0c9aee199e5d");
//! ```
//!
//! See [RFC 4122](https://www.rfc-editor.org/rfc/rfc4122).
//!
//! # Field and bit layout
//!
//! Time-based (version 1) identifiers have the following bit layout:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                          time_low                             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |       time_mid                |  ver  |       time_hi         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |var|        clock_seq          |          node (0-1)           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         node (2-5)                            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Where:
//!
//! - The 60-bit timestamp counts 100-nanosecond intervals since 1582-10-15T00:00:00Z and is
//!   split into `time_low` (bits 0-31), `time_mid` (bits 32-47), and `time_hi` (bits 48-59).
//! - The 4-bit `ver` field is set at `0001`.
//! - The 2-bit `var` field is set at `10`.
//! - The 14-bit `clock_seq` field carries a randomly seeded clock sequence. The generator only
//!   ever issues 13-bit values, reseeding them whenever the system clock moves backwards.
//! - The 48-bit `node` field is a hardware address of the host, an explicitly configured value,
//!   or, as a last resort, a value synthesized from the host name with the multicast bit set.
//!
//! The generator issues strictly increasing timestamps: requests arriving faster than the clock
//! resolution, or while the clock stands still or moves backwards, receive the last issued
//! timestamp plus one. Consequently the timestamp may run ahead of the real-time clock under
//! sustained load.
//!
//! # Generator and configuration
//!
//! [`Generator`] is shared across threads and may be reconfigured while in use:
//!
//! ```rust
//! use rfcuuid::{Generator, GeneratorConfig, Mode, Version};
//!
//! let g = Generator::new();
//! assert_eq!(g.generate()?.version(), Version::TimeSpace);
//!
//! g.reconfigure(GeneratorConfig {
//!     mode: Mode::Random,
//!     ..Default::default()
//! })?;
//! assert_eq!(g.generate()?.version(), Version::Random);
//! # Ok::<(), rfcuuid::Error>(())
//! ```
//!
//! # Crate features
//!
//! Default features:
//!
//! - `global_gen`: enables the process-wide default generator and the [`uuid1()`], [`uuid3()`],
//!   [`uuid4()`], and [`uuid5()`] entry point functions.
//!
//! Optional features:
//!
//! - `serde`: enables serialization/deserialization of [`Uuid`], [`Mode`], and
//!   [`GeneratorConfig`] via serde.

#![cfg_attr(docsrs, feature(doc_cfg))]

mod uuid;
pub use uuid::{Format, Uuid, Variant, Version};

pub mod clock;
pub use clock::{ClockSequencer, MonotonicClockSource, SystemClock, Tick, WallClock, WallTime};

pub mod node;
pub use node::{HardwareAddressSource, Node, NodeOrigin, NodeResolver, SystemInterfaces};

pub mod config;
pub use config::{ConfigLookup, EnvLookup, GeneratorConfig};

mod generator;
pub use generator::{Generator, GeneratorBuilder, Iter, Mode};

mod error;
pub use error::{ConfigError, Error, Result, ValidationError};

mod global_gen;
#[cfg(feature = "global_gen")]
pub use global_gen::{global, uuid1, uuid3, uuid4, uuid5};
