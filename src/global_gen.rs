//! Default generator and entry point functions.

#![cfg(feature = "global_gen")]
#![cfg_attr(docsrs, doc(cfg(feature = "global_gen")))]

#[cfg(unix)]
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use crate::{
    generator::{Generator, Mode, Resources},
    Uuid,
};

/// Returns the process-wide global generator, creating one if none exists.
///
/// On Unix, this function discards the cached resources of the generator when the process ID
/// changes (i.e., upon process forks) so that a child does not repeat the clock sequence state of
/// its parent.
///
/// # Examples
///
/// ```rust
/// use rfcuuid::{global, Mode, Version};
///
/// let uuid = global().generate_with(Mode::Random, None, None)?;
/// assert_eq!(uuid.version(), Version::Random);
/// # Ok::<(), rfcuuid::Error>(())
/// ```
pub fn global() -> &'static Generator {
    static G: OnceLock<Generator> = OnceLock::new();
    #[cfg(unix)]
    static PID: AtomicU32 = AtomicU32::new(0);

    let g = G.get_or_init(|| {
        #[cfg(unix)]
        PID.store(std::process::id(), Ordering::Relaxed);
        Generator::new()
    });

    #[cfg(unix)]
    {
        let pid = std::process::id();
        if PID.swap(pid, Ordering::Relaxed) != pid {
            g.reset();
        }
    }
    g
}

fn global_resources() -> Arc<Resources> {
    global().resources()
}

/// Generates a time-based (version 1) UUID.
///
/// This function employs the global generator, whose clock sequencer guarantees process-wide
/// uniqueness of the issued timestamps.
///
/// # Examples
///
/// ```rust
/// let uuid = rfcuuid::uuid1();
/// println!("{}", uuid); // e.g., "1cef0eca-3728-11dd-af02-0013723f3004"
///
/// let uuid_string: String = rfcuuid::uuid1().to_string();
/// ```
pub fn uuid1() -> Uuid {
    global_resources().time_based()
}

/// Generates a random (version 4) UUID.
///
/// # Examples
///
/// ```rust
/// let uuid = rfcuuid::uuid4();
/// println!("{}", uuid); // e.g., "2ca4b2ce-6c13-40d4-bccf-37d222820f6f"
/// ```
pub fn uuid4() -> Uuid {
    global_resources().random()
}

/// Generates a name-based UUID from an MD5 digest (version 3).
///
/// ```rust
/// use rfcuuid::{uuid3, Uuid};
///
/// let uuid = uuid3(&Uuid::NAMESPACE_DNS, "python.org");
/// assert_eq!(uuid.to_string(), "6fa459ea-ee8a-3ca4-894e-db77e160355e");
/// ```
pub fn uuid3(namespace: &Uuid, name: impl AsRef<[u8]>) -> Uuid {
    global_resources().name_based(Mode::NameMd5, Some(namespace), name.as_ref())
}

/// Generates a name-based UUID from a SHA-1 digest (version 5).
///
/// ```rust
/// use rfcuuid::{uuid5, Uuid};
///
/// let uuid = uuid5(&Uuid::NAMESPACE_DNS, "python.org");
/// assert_eq!(uuid.to_string(), "886313e1-3b8a-5372-9b90-0c9aee199e5d");
/// ```
pub fn uuid5(namespace: &Uuid, name: impl AsRef<[u8]>) -> Uuid {
    global_resources().name_based(Mode::NameSha1, Some(namespace), name.as_ref())
}

#[cfg(test)]
mod tests_v1 {
    use super::uuid1;
    use crate::{Variant, Version};

    const N_SAMPLES: usize = 100_000;
    thread_local!(static SAMPLES: Vec<String> = (0..N_SAMPLES).map(|_| uuid1().into()).collect());

    /// Generates canonical string
    #[test]
    fn generates_canonical_string() {
        let pattern = r"^[0-9a-f]{8}-[0-9a-f]{4}-1[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$";
        let re = regex::Regex::new(pattern).unwrap();
        SAMPLES.with(|samples| {
            for e in samples {
                assert!(re.is_match(e));
            }
        });
    }

    /// Generates 100k identifiers without collision
    #[test]
    fn generates_100k_identifiers_without_collision() {
        use std::collections::HashSet;
        SAMPLES.with(|samples| {
            let s: HashSet<&String> = samples.iter().collect();
            assert_eq!(s.len(), N_SAMPLES);
        });
    }

    /// Shares one node across calls
    #[test]
    fn shares_one_node_across_calls() {
        SAMPLES.with(|samples| {
            let node = &samples[0][24..];
            assert!(samples.iter().all(|e| &e[24..] == node));
        });
    }

    /// Sets correct variant and version bits
    #[test]
    fn sets_correct_variant_and_version_bits() {
        for _ in 0..1_000 {
            let e = uuid1();
            assert_eq!(e.variant(), Variant::Rfc4122);
            assert_eq!(e.version(), Version::TimeSpace);
        }
    }

    /// Generates no IDs sharing same timestamp under multithreading
    #[test]
    fn generates_no_ids_sharing_same_timestamp_under_multithreading(
    ) -> Result<(), Box<dyn std::error::Error>> {
        use std::{collections::HashSet, sync::mpsc, thread};

        let (tx, rx) = mpsc::channel();
        for _ in 0..4 {
            let tx = tx.clone();
            thread::Builder::new()
                .spawn(move || {
                    for _ in 0..10_000 {
                        tx.send(uuid1()).unwrap();
                    }
                })
                .map_err(|err| format!("failed to spawn thread: {:?}", err))?;
        }
        drop(tx);

        let mut s = HashSet::new();
        while let Ok(e) = rx.recv() {
            s.insert(e.timestamp()?);
        }

        assert_eq!(s.len(), 4 * 10_000);
        Ok(())
    }
}
