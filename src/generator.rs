//! RFC 4122 UUID generator and related types.

use std::{fmt, iter::FusedIterator, str, sync::Arc};

use md5::Md5;
use parking_lot::{Mutex, RwLock};
use rand::{
    rngs::{adapter::ReseedingRng, OsRng},
    RngCore, SeedableRng,
};
use rand_chacha::ChaCha12Core;
use sha1::{digest::FixedOutputReset, Digest, Sha1};
use tracing::{debug, info};

use crate::{
    clock::{ClockSequencer, SystemClock, Tick, WallClock},
    config::{ConfigLookup, GeneratorConfig},
    error::{ConfigError, Error, Result},
    node::{HardwareAddressSource, Node, NodeResolver, SystemInterfaces},
    uuid::{Format, Uuid, Version},
};

const MAX_TICK: u64 = (1 << 60) - 1;

/// The generation algorithm of a [`Generator`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Mode {
    /// Version 1: timestamp, clock sequence, and node.
    #[default]
    TimeSpace,
    /// Version 4: random.
    Random,
    /// Version 3: MD5 hash of a namespace and a name.
    NameMd5,
    /// Version 5: SHA-1 hash of a namespace and a name.
    NameSha1,
}

impl Mode {
    /// Returns the version stamped into UUIDs generated in this mode.
    pub const fn version(self) -> Version {
        match self {
            Self::TimeSpace => Version::TimeSpace,
            Self::Random => Version::Random,
            Self::NameMd5 => Version::NameMd5,
            Self::NameSha1 => Version::NameSha1,
        }
    }

    /// Returns `true` if this mode derives UUIDs from names.
    pub const fn is_name_based(self) -> bool {
        matches!(self, Self::NameMd5 | Self::NameSha1)
    }
}

impl str::FromStr for Mode {
    type Err = Error;

    /// Accepts a version number (`1`, `3`, `4`, `5`) or a name (`time`, `md5`, `random`, `sha1`),
    /// case-insensitively.
    fn from_str(src: &str) -> Result<Self> {
        match src.trim().to_ascii_lowercase().as_str() {
            "1" | "time" | "time_space" | "timespace" => Ok(Self::TimeSpace),
            "3" | "md5" | "name_md5" => Ok(Self::NameMd5),
            "4" | "random" => Ok(Self::Random),
            "5" | "sha1" | "name_sha1" => Ok(Self::NameSha1),
            _ => Err(ConfigError::UnsupportedVersion(src.to_owned()).into()),
        }
    }
}

type SharedClock = Arc<dyn WallClock + Send + Sync>;
type SharedHardware = Arc<dyn HardwareAddressSource + Send + Sync>;
type RngFactory = Arc<dyn Fn() -> Box<dyn RngCore + Send> + Send + Sync>;

/// Generates RFC 4122 UUIDs of versions 1, 3, 4, and 5 and is safe to share across threads.
///
/// A generator holds an immutable [`GeneratorConfig`] snapshot and a bundle of mutable resources
/// built from it: the node resolver, the name digests, and the random number generator. Each
/// resource sits behind its own lock, held only while that resource is used.
/// [`reconfigure()`](Generator::reconfigure) swaps the snapshot and discards the bundle, which is
/// rebuilt on the next call; calls already in flight finish with the bundle they started with.
///
/// The clock sequencer lives for the whole lifetime of the generator and is shared by every
/// bundle; a rebuild only reseeds its clock sequence. Time-based UUIDs from one generator thus
/// never collide, and timestamps never decrease across reconfigurations, regardless of the number
/// of threads calling [`generate()`](Generator::generate).
///
/// # Examples
///
/// ```rust
/// use rfcuuid::{Generator, Mode, Uuid, Version};
///
/// let g = Generator::new();
/// let uuid = g.generate()?;
/// assert_eq!(uuid.version(), Version::TimeSpace);
///
/// let g = Generator::builder().mode(Mode::NameSha1).build()?;
/// let a = g.generate_in(&Uuid::NAMESPACE_DNS, "python.org")?;
/// assert_eq!(a.to_string(), "886313e1-3b8a-5372-9b90-0c9aee199e5d");
/// # Ok::<(), rfcuuid::Error>(())
/// ```
///
/// # Generator functions
///
/// | Method              | Mode                | Namespace                   |
/// | ------------------- | ------------------- | --------------------------- |
/// | [`generate`]        | configured, no name | n/a                         |
/// | [`generate_named`]  | configured, named   | configured namespace root   |
/// | [`generate_in`]     | configured, named   | argument                    |
/// | [`generate_with`]   | argument            | argument                    |
///
/// [`generate`]: Generator::generate
/// [`generate_named`]: Generator::generate_named
/// [`generate_in`]: Generator::generate_in
/// [`generate_with`]: Generator::generate_with
pub struct Generator {
    sequencer: Arc<Mutex<ClockSequencer<SharedClock>>>,
    hardware: SharedHardware,
    rng: RngFactory,
    state: RwLock<State>,
}

struct State {
    config: Arc<GeneratorConfig>,
    resources: Option<Arc<Resources>>,
}

impl Generator {
    /// Creates a time-based generator reading the system clock and the host's interfaces.
    pub fn new() -> Self {
        Self::from_parts(
            GeneratorConfig::default(),
            Arc::new(SystemClock),
            Arc::new(SystemInterfaces),
            Arc::new(default_rng),
        )
    }

    /// Returns a builder to customize the configuration and collaborators.
    pub fn builder() -> GeneratorBuilder {
        GeneratorBuilder::default()
    }

    fn from_parts(
        config: GeneratorConfig,
        clock: SharedClock,
        hardware: SharedHardware,
        rng: RngFactory,
    ) -> Self {
        Self {
            sequencer: Arc::new(Mutex::new(ClockSequencer::new(clock))),
            hardware,
            rng,
            state: RwLock::new(State {
                config: Arc::new(config),
                resources: None,
            }),
        }
    }

    /// Returns a copy of the current configuration snapshot.
    pub fn config(&self) -> GeneratorConfig {
        GeneratorConfig::clone(&self.state.read().config)
    }

    /// Generates a UUID in the configured mode.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingName`] if the generator is configured for a name-based mode.
    pub fn generate(&self) -> Result<Uuid> {
        let resources = self.resources();
        resources.generate(resources.config.mode, None, None)
    }

    /// Generates a name-based UUID under the configured namespace root, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NameNotApplicable`] unless the generator is configured for a
    /// name-based mode.
    pub fn generate_named(&self, name: impl AsRef<[u8]>) -> Result<Uuid> {
        let resources = self.resources();
        let config = &resources.config;
        resources.generate(
            config.mode,
            config.namespace_root.as_ref(),
            Some(name.as_ref()),
        )
    }

    /// Generates a name-based UUID under `namespace`, overriding the configured namespace root
    /// for this call.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NameNotApplicable`] unless the generator is configured for a
    /// name-based mode.
    pub fn generate_in(&self, namespace: &Uuid, name: impl AsRef<[u8]>) -> Result<Uuid> {
        let resources = self.resources();
        resources.generate(
            resources.config.mode,
            Some(namespace),
            Some(name.as_ref()),
        )
    }

    /// Generates a UUID in an explicitly requested mode, independent of the configured one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingName`] if `mode` is name-based and `name` is `None`, or
    /// [`ConfigError::NameNotApplicable`] if `mode` is not name-based and `name` is `Some`.
    pub fn generate_with(
        &self,
        mode: Mode,
        namespace: Option<&Uuid>,
        name: Option<&[u8]>,
    ) -> Result<Uuid> {
        self.resources().generate(mode, namespace, name)
    }

    /// Returns an infinite iterator that yields the result of [`generate()`](Self::generate)
    /// for each call of `next()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rfcuuid::Generator;
    ///
    /// let g = Generator::new();
    /// g.iter()
    ///     .take(4)
    ///     .for_each(|e| println!("{}", e.unwrap()));
    /// ```
    pub fn iter(&self) -> Iter<'_> {
        Iter(self)
    }

    /// Returns the node used for time-based UUIDs, resolving it if necessary.
    pub fn node(&self) -> Node {
        self.resources().node.resolve()
    }

    /// Parses any accepted string representation; see [`Uuid::parse_str()`].
    pub fn parse(&self, src: &str) -> Result<Uuid> {
        Uuid::parse_str(src)
    }

    /// Returns the canonical string representation of `value`.
    pub fn format(&self, value: &Uuid) -> String {
        value.format(Format::Canonical)
    }

    /// Replaces the configuration snapshot and discards all cached resources.
    ///
    /// # Errors
    ///
    /// Returns an error without touching the current state if `config` is invalid.
    pub fn reconfigure(&self, config: GeneratorConfig) -> Result<()> {
        config.validate()?;
        info!(mode = ?config.mode, "reconfiguring generator");
        let mut state = self.state.write();
        state.config = Arc::new(config);
        state.resources = None;
        Ok(())
    }

    /// Reconfigures from a named configuration lookup; see [`GeneratorConfig::from_lookup()`].
    pub fn reconfigure_from<L: ConfigLookup + ?Sized>(&self, lookup: &L) -> Result<()> {
        self.reconfigure(GeneratorConfig::from_lookup(lookup)?)
    }

    /// Discards cached resources while keeping the configuration.
    #[cfg_attr(not(feature = "global_gen"), allow(dead_code))]
    pub(crate) fn reset(&self) {
        self.state.write().resources = None;
    }

    /// Returns the resource bundle, building it under the write lock if it was discarded.
    pub(crate) fn resources(&self) -> Arc<Resources> {
        if let Some(resources) = &self.state.read().resources {
            return Arc::clone(resources);
        }

        let mut guard = self.state.write();
        let state = &mut *guard;
        let config = &state.config;
        Arc::clone(state.resources.get_or_insert_with(|| {
            debug!(mode = ?config.mode, "building generator resources");
            Arc::new(Resources::new(
                Arc::clone(config),
                Arc::clone(&self.sequencer),
                Arc::clone(&self.hardware),
                (self.rng)(),
            ))
        }))
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Generator")
            .field("config", &state.config)
            .field("resources", &state.resources)
            .finish_non_exhaustive()
    }
}

/// The default random number generator, emulating the strategy of [`rand::rngs::ThreadRng`].
fn default_rng() -> Box<dyn RngCore + Send> {
    Box::new(ReseedingRng::new(
        ChaCha12Core::from_entropy(),
        1024 * 64,
        OsRng,
    ))
}

/// Mutable state derived from one configuration snapshot.
pub(crate) struct Resources {
    config: Arc<GeneratorConfig>,
    sequencer: Arc<Mutex<ClockSequencer<SharedClock>>>,
    node: NodeResolver,
    digest: Mutex<NameDigest>,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl Resources {
    fn new(
        config: Arc<GeneratorConfig>,
        sequencer: Arc<Mutex<ClockSequencer<SharedClock>>>,
        hardware: SharedHardware,
        rng: Box<dyn RngCore + Send>,
    ) -> Self {
        // tick state carries over; only the clock sequence is redrawn
        sequencer.lock().reseed();
        Self {
            sequencer,
            node: NodeResolver::new(config.node, hardware),
            digest: Mutex::new(NameDigest::default()),
            rng: Mutex::new(rng),
            config,
        }
    }

    fn generate(&self, mode: Mode, namespace: Option<&Uuid>, name: Option<&[u8]>) -> Result<Uuid> {
        match (mode, name) {
            (Mode::TimeSpace, None) => Ok(self.time_based()),
            (Mode::Random, None) => Ok(self.random()),
            (Mode::NameMd5 | Mode::NameSha1, Some(name)) => {
                Ok(self.name_based(mode, namespace, name))
            }
            (Mode::NameMd5 | Mode::NameSha1, None) => Err(ConfigError::MissingName.into()),
            (Mode::TimeSpace | Mode::Random, Some(_)) => {
                Err(ConfigError::NameNotApplicable(mode).into())
            }
        }
    }

    pub(crate) fn time_based(&self) -> Uuid {
        let Tick { tick, sequence } = self.sequencer.lock().issue();
        let node = self.node.resolve();
        Uuid::new_v1(tick & MAX_TICK, sequence, node.value())
    }

    pub(crate) fn random(&self) -> Uuid {
        let mut bytes = [0u8; 16];
        self.rng.lock().fill_bytes(&mut bytes);
        Uuid::stamp(bytes, Version::Random)
    }

    pub(crate) fn name_based(&self, mode: Mode, namespace: Option<&Uuid>, name: &[u8]) -> Uuid {
        let bytes = self.digest.lock().hash(mode, namespace, name);
        Uuid::stamp(bytes, mode.version())
    }
}

impl fmt::Debug for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resources")
            .field("sequence", &self.sequencer.lock().sequence())
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

/// Digest instances reused across calls; each use leaves them reset.
#[derive(Default)]
struct NameDigest {
    md5: Md5,
    sha1: Sha1,
}

impl NameDigest {
    fn hash(&mut self, mode: Mode, namespace: Option<&Uuid>, name: &[u8]) -> [u8; 16] {
        match mode {
            Mode::NameSha1 => digest_first_16(&mut self.sha1, namespace, name),
            _ => digest_first_16(&mut self.md5, namespace, name),
        }
    }
}

fn digest_first_16<D: Digest + FixedOutputReset>(
    digest: &mut D,
    namespace: Option<&Uuid>,
    name: &[u8],
) -> [u8; 16] {
    if let Some(namespace) = namespace {
        Digest::update(digest, namespace.as_bytes());
    }
    Digest::update(digest, name);
    let output = digest.finalize_reset();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&output[..16]);
    bytes
}

/// Builds a [`Generator`] with a custom configuration and collaborators.
#[derive(Default)]
pub struct GeneratorBuilder {
    config: GeneratorConfig,
    clock: Option<SharedClock>,
    hardware: Option<SharedHardware>,
    rng: Option<RngFactory>,
}

impl GeneratorBuilder {
    /// Sets the generation mode.
    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Sets an explicit 48-bit node, bypassing hardware address resolution.
    pub fn node(mut self, node: u64) -> Self {
        self.config.node = Some(node);
        self
    }

    /// Sets the namespace root hashed before names in name-based modes.
    pub fn namespace_root(mut self, namespace: Uuid) -> Self {
        self.config.namespace_root = Some(namespace);
        self
    }

    /// Replaces the whole configuration snapshot.
    pub fn config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the wall clock read by the time-based mode. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: impl WallClock + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Sets the hardware address source. Defaults to [`SystemInterfaces`].
    pub fn hardware(mut self, hardware: impl HardwareAddressSource + Send + Sync + 'static) -> Self {
        self.hardware = Some(Arc::new(hardware));
        self
    }

    /// Sets a factory for the random number generator of the random mode. The factory is called
    /// again whenever resources are rebuilt after reconfiguration.
    pub fn rng<R, F>(mut self, factory: F) -> Self
    where
        R: RngCore + Send + 'static,
        F: Fn() -> R + Send + Sync + 'static,
    {
        self.rng = Some(Arc::new(move || Box::new(factory()) as Box<dyn RngCore + Send>));
        self
    }

    /// Validates the configuration and creates the generator.
    pub fn build(self) -> Result<Generator> {
        self.config.validate()?;
        Ok(Generator::from_parts(
            self.config,
            self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            self.hardware.unwrap_or_else(|| Arc::new(SystemInterfaces)),
            self.rng.unwrap_or_else(|| Arc::new(default_rng)),
        ))
    }
}

/// Infinite iterator returned by [`Generator::iter()`].
#[derive(Debug)]
pub struct Iter<'a>(&'a Generator);

impl Iterator for Iter<'_> {
    type Item = Result<Uuid>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.0.generate())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl FusedIterator for Iter<'_> {}

#[cfg(test)]
mod tests {
    use super::{Generator, Mode};
    use crate::{
        clock::{tests::ScriptedClock, GREGORIAN_OFFSET},
        config::GeneratorConfig,
        error::{ConfigError, Error},
        node::NodeOrigin,
        uuid::{Uuid, Variant, Version},
    };
    use rand::{rngs::StdRng, SeedableRng};
    use std::{collections::HashSet, sync::Arc, thread};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    }

    /// Generates no duplicates from three threads sharing one generator
    #[test]
    fn generates_no_duplicates_from_three_threads_sharing_one_generator() {
        const N_THREADS: usize = 3;
        const N_PER_THREAD: usize = 100_000;

        let g = Generator::builder().node(0x0013_723f_3004).build().unwrap();
        let samples = thread::scope(|s| {
            let handles = (0..N_THREADS)
                .map(|_| {
                    s.spawn(|| {
                        (0..N_PER_THREAD)
                            .map(|_| g.generate().unwrap())
                            .collect::<Vec<_>>()
                    })
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect::<Vec<_>>()
        });

        let set: HashSet<Uuid> = samples.iter().copied().collect();
        assert_eq!(set.len(), N_THREADS * N_PER_THREAD);
        let ticks: HashSet<u64> = samples.iter().map(|e| e.timestamp().unwrap()).collect();
        assert_eq!(ticks.len(), N_THREADS * N_PER_THREAD);
    }

    /// Generates non-decreasing timestamps within a thread
    #[test]
    fn generates_non_decreasing_timestamps_within_a_thread() {
        let g = Generator::new();
        let mut prev = g.generate().unwrap().timestamp().unwrap();
        for _ in 0..100_000 {
            let curr = g.generate().unwrap().timestamp().unwrap();
            assert!(prev <= curr);
            prev = curr;
        }
    }

    /// Encodes up-to-date timestamp
    #[test]
    fn encodes_up_to_date_timestamp() {
        use std::time;
        let g = Generator::new();
        for _ in 0..1_000 {
            let ts_now = time::SystemTime::now()
                .duration_since(time::UNIX_EPOCH)
                .expect("clock may have gone backwards")
                .as_micros() as i64;
            let ts = (g.generate().unwrap().timestamp().unwrap() - GREGORIAN_OFFSET) / 10;
            assert!((ts_now - ts as i64).abs() < 16_000);
        }
    }

    /// Keeps issuing unique values with a stopped or rewound clock
    #[test]
    fn keeps_issuing_unique_values_with_a_stopped_or_rewound_clock() {
        init_tracing();
        let clock = Arc::new(ScriptedClock::at(10_000_000));
        let g = Generator::builder()
            .clock(Arc::clone(&clock))
            .node(1)
            .build()
            .unwrap();

        let mut prev = g.generate().unwrap();
        assert_eq!(prev.timestamp(), Ok(GREGORIAN_OFFSET + 10_000_000));
        for i in 0..10_000u64 {
            clock.set(10_000_000 - i.min(500) * 10);
            let curr = g.generate().unwrap();
            assert!(prev.timestamp().unwrap() < curr.timestamp().unwrap());
            prev = curr;
        }
    }

    /// Lays out time-based fields per RFC 4122
    #[test]
    fn lays_out_time_based_fields_per_rfc4122() {
        let ts = 0x1dd_3728_1cef_0ecau64;
        let g = Generator::builder()
            .clock(ScriptedClock::at(ts - GREGORIAN_OFFSET))
            .node(0x0013_723f_3004)
            .build()
            .unwrap();
        let e = g.generate().unwrap();
        let text = e.to_string();
        assert!(text.starts_with("1cef0eca-3728-11dd-"), "{text}");
        assert!(text.ends_with("-0013723f3004"), "{text}");
        assert_eq!(e.variant(), Variant::Rfc4122);
        assert!(e.clock_sequence().unwrap() < 1 << 13);
    }

    /// Sets constant bits and random bits properly in random mode
    #[test]
    fn sets_constant_bits_and_random_bits_properly_in_random_mode() {
        const N_SAMPLES: usize = 100_000;
        let g = Generator::builder().mode(Mode::Random).build().unwrap();
        let samples = g
            .iter()
            .take(N_SAMPLES)
            .map(|e| e.unwrap().to_string())
            .collect::<Vec<_>>();

        let re = regex::Regex::new(
            r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$",
        )
        .unwrap();
        assert!(samples.iter().all(|e| re.is_match(e)));

        // count '1' of each bit
        let mut bins = [0u32; 128];
        for e in &samples {
            let mut it = bins.iter_mut().rev();
            for c in e.chars().rev() {
                if let Some(mut num) = c.to_digit(16) {
                    for _ in 0..4 {
                        *it.next().unwrap() += num & 1;
                        num >>= 1;
                    }
                }
            }
        }

        // test if constant bits are all set to 1 or 0
        let n = N_SAMPLES as u32;
        assert_eq!(bins[48], 0, "version bit 48");
        assert_eq!(bins[49], n, "version bit 49");
        assert_eq!(bins[50], 0, "version bit 50");
        assert_eq!(bins[51], 0, "version bit 51");
        assert_eq!(bins[64], n, "variant bit 64");
        assert_eq!(bins[65], 0, "variant bit 65");

        // test if random bits are set to 1 at ~50% probability
        // set margin based on binom dist 99.999% confidence interval
        let margin = 4.417173 * (0.5 * 0.5 / N_SAMPLES as f64).sqrt();
        for i in (0..48).chain(52..64).chain(66..128) {
            let p = bins[i] as f64 / N_SAMPLES as f64;
            assert!((p - 0.5).abs() < margin, "random bit {i}: {p}");
        }
    }

    /// Uses injected random number generator
    #[test]
    fn uses_injected_random_number_generator() {
        let a = Generator::builder()
            .mode(Mode::Random)
            .rng(|| StdRng::seed_from_u64(42))
            .build()
            .unwrap();
        let b = Generator::builder()
            .mode(Mode::Random)
            .rng(|| StdRng::seed_from_u64(42))
            .build()
            .unwrap();
        let xs = a.iter().take(8).collect::<Result<Vec<_>, _>>().unwrap();
        let ys = b.iter().take(8).collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(xs, ys);
    }

    /// Matches known name-based vectors
    #[test]
    fn matches_known_name_based_vectors() {
        let g = Generator::builder().mode(Mode::NameMd5).build().unwrap();
        assert_eq!(
            g.generate_in(&Uuid::NAMESPACE_DNS, "python.org")
                .unwrap()
                .to_string(),
            "6fa459ea-ee8a-3ca4-894e-db77e160355e"
        );

        let g = Generator::builder().mode(Mode::NameSha1).build().unwrap();
        assert_eq!(
            g.generate_in(&Uuid::NAMESPACE_DNS, "python.org")
                .unwrap()
                .to_string(),
            "886313e1-3b8a-5372-9b90-0c9aee199e5d"
        );
    }

    /// Derives name-based values deterministically
    #[test]
    fn derives_name_based_values_deterministically() {
        let root = Uuid::NAMESPACE_URL;
        let g = Generator::new();

        let a = g.generate_with(Mode::NameMd5, Some(&root), Some(b"x")).unwrap();
        let b = g.generate_with(Mode::NameMd5, Some(&root), Some(b"x")).unwrap();
        let c = g.generate_with(Mode::NameMd5, Some(&root), Some(b"y")).unwrap();
        let d = g.generate_with(Mode::NameSha1, Some(&root), Some(b"x")).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(a.version(), Version::NameMd5);
        assert_eq!(d.version(), Version::NameSha1);
        assert_eq!(a.variant(), Variant::Rfc4122);

        // without a namespace, only the name is hashed
        let e = g.generate_with(Mode::NameMd5, None, Some(b"x")).unwrap();
        assert_ne!(a, e);
        assert_eq!(e, g.generate_with(Mode::NameMd5, None, Some(b"x")).unwrap());
    }

    /// Lets explicit parent override configured namespace root
    #[test]
    fn lets_explicit_parent_override_configured_namespace_root() {
        let g = Generator::builder()
            .mode(Mode::NameSha1)
            .namespace_root(Uuid::NAMESPACE_OID)
            .build()
            .unwrap();
        let configured = g.generate_named("x").unwrap();
        assert_eq!(
            configured,
            g.generate_in(&Uuid::NAMESPACE_OID, "x").unwrap()
        );
        assert_ne!(
            configured,
            g.generate_in(&Uuid::NAMESPACE_X500, "x").unwrap()
        );
        assert_eq!(configured, g.generate_named(b"x").unwrap());
    }

    /// Refuses name-based generation without a name
    #[test]
    fn refuses_name_based_generation_without_a_name() {
        for mode in [Mode::NameMd5, Mode::NameSha1] {
            let g = Generator::builder().mode(mode).build().unwrap();
            assert_eq!(
                g.generate(),
                Err(Error::Configuration(ConfigError::MissingName))
            );
            assert_eq!(
                g.generate_with(mode, None, None),
                Err(Error::Configuration(ConfigError::MissingName))
            );
        }
    }

    /// Refuses names in non-name modes
    #[test]
    fn refuses_names_in_non_name_modes() {
        for mode in [Mode::TimeSpace, Mode::Random] {
            let g = Generator::builder().mode(mode).build().unwrap();
            assert_eq!(
                g.generate_named("x"),
                Err(Error::Configuration(ConfigError::NameNotApplicable(mode)))
            );
        }
    }

    /// Rejects conflicting configuration at build time
    #[test]
    fn rejects_conflicting_configuration_at_build_time() {
        assert!(matches!(
            Generator::builder()
                .namespace_root(Uuid::NAMESPACE_DNS)
                .build(),
            Err(Error::Configuration(ConfigError::Conflict(_)))
        ));
        assert!(matches!(
            Generator::builder().node(1 << 48).build(),
            Err(Error::Validation(_))
        ));
    }

    /// Resolves and reports node origin
    #[test]
    fn resolves_and_reports_node_origin() {
        let g = Generator::builder().node(0x0013_723f_3004).build().unwrap();
        assert_eq!(g.node().origin(), NodeOrigin::Explicit);

        let g = Generator::builder()
            .hardware(vec![[0x00, 0x13, 0x72, 0x3f, 0x30, 0x04]])
            .build()
            .unwrap();
        assert_eq!(g.node().origin(), NodeOrigin::Hardware);
        assert_eq!(g.generate().unwrap().node(), Ok(0x0013_723f_3004));

        let g = Generator::builder().hardware(Vec::<[u8; 6]>::new()).build().unwrap();
        let node = g.node();
        assert_eq!(node.origin(), NodeOrigin::Synthesized);
        assert_eq!(g.generate().unwrap().node(), Ok(node.value()));
    }

    /// Switches mode and node on reconfiguration
    #[test]
    fn switches_mode_and_node_on_reconfiguration() {
        init_tracing();
        let g = Generator::builder().node(1).build().unwrap();
        assert_eq!(g.generate().unwrap().node(), Ok(1));

        g.reconfigure(GeneratorConfig {
            node: Some(2),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(g.generate().unwrap().node(), Ok(2));

        g.reconfigure(GeneratorConfig {
            mode: Mode::Random,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(g.generate().unwrap().version(), Version::Random);
        assert_eq!(g.config().mode, Mode::Random);

        // invalid configuration leaves the current one in place
        assert!(g
            .reconfigure(GeneratorConfig {
                mode: Mode::TimeSpace,
                namespace_root: Some(Uuid::NAMESPACE_DNS),
                ..Default::default()
            })
            .is_err());
        assert_eq!(g.config().mode, Mode::Random);
    }

    /// Survives reconfiguration racing with generation
    #[test]
    fn survives_reconfiguration_racing_with_generation() {
        let g = Generator::builder().node(1).build().unwrap();
        thread::scope(|s| {
            for _ in 0..3 {
                s.spawn(|| {
                    for _ in 0..20_000 {
                        let e = g.generate().unwrap();
                        assert_eq!(e.version(), Version::TimeSpace);
                        assert!(matches!(e.node(), Ok(1 | 2)));
                    }
                });
            }
            s.spawn(|| {
                for i in 0..200u64 {
                    g.reconfigure(GeneratorConfig {
                        node: Some(1 + i % 2),
                        ..Default::default()
                    })
                    .unwrap();
                    thread::yield_now();
                }
            });
        });
    }

    /// Keeps values unique and timestamps increasing across reconfigurations
    #[test]
    fn keeps_values_unique_and_timestamps_increasing_across_reconfigurations() {
        let clock = Arc::new(ScriptedClock::at(10_000_000));
        let g = Generator::builder()
            .clock(Arc::clone(&clock))
            .node(1)
            .build()
            .unwrap();

        let mut set = HashSet::new();
        let mut prev = 0u64;
        for i in 0..2_000u64 {
            // stopped, then rewound clock
            clock.set(10_000_000 - i.min(100));
            for _ in 0..5 {
                let e = g.generate().unwrap();
                let ts = e.timestamp().unwrap();
                assert!(prev < ts, "timestamp went from {prev} to {ts}");
                prev = ts;
                assert!(set.insert(e));
            }
            g.reconfigure(GeneratorConfig {
                node: Some(1),
                ..Default::default()
            })
            .unwrap();
        }
        assert_eq!(set.len(), 10_000);
    }

    /// Keeps values unique per thread while reconfiguring concurrently
    #[test]
    fn keeps_values_unique_per_thread_while_reconfiguring_concurrently() {
        const N_THREADS: usize = 3;
        const N_PER_THREAD: usize = 20_000;

        let g = Generator::builder()
            .clock(ScriptedClock::at(10_000_000))
            .node(1)
            .build()
            .unwrap();
        let samples = thread::scope(|s| {
            let handles = (0..N_THREADS)
                .map(|_| {
                    s.spawn(|| {
                        let mut prev = 0u64;
                        let mut values = Vec::with_capacity(N_PER_THREAD);
                        for _ in 0..N_PER_THREAD {
                            let e = g.generate().unwrap();
                            let ts = e.timestamp().unwrap();
                            assert!(prev < ts);
                            prev = ts;
                            values.push(e);
                        }
                        values
                    })
                })
                .collect::<Vec<_>>();
            s.spawn(|| {
                for _ in 0..500 {
                    g.reconfigure(GeneratorConfig {
                        node: Some(1),
                        ..Default::default()
                    })
                    .unwrap();
                    thread::yield_now();
                }
            });
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect::<Vec<_>>()
        });

        let set: HashSet<Uuid> = samples.iter().copied().collect();
        assert_eq!(set.len(), N_THREADS * N_PER_THREAD);
    }

    /// Delegates parse and format to value type
    #[test]
    fn delegates_parse_and_format_to_value_type() {
        let g = Generator::new();
        for _ in 0..1_000 {
            let e = g.generate().unwrap();
            assert_eq!(g.parse(&g.format(&e)), Ok(e));
        }
        let text = "{1CEF0ECA-3728-11DD-AF02-0013723F3004}";
        assert_eq!(
            g.format(&g.parse(text).unwrap()),
            "1cef0eca-3728-11dd-af02-0013723f3004"
        );
    }

    /// Parses mode names and numbers
    #[test]
    fn parses_mode_names_and_numbers() {
        assert_eq!("1".parse::<Mode>(), Ok(Mode::TimeSpace));
        assert_eq!("Random".parse::<Mode>(), Ok(Mode::Random));
        assert_eq!(" md5 ".parse::<Mode>(), Ok(Mode::NameMd5));
        assert_eq!("5".parse::<Mode>(), Ok(Mode::NameSha1));
        assert_eq!(
            "2".parse::<Mode>(),
            Err(Error::Configuration(ConfigError::UnsupportedVersion(
                "2".to_owned()
            )))
        );
    }

    #[cfg(feature = "serde")]
    /// Serializes mode as snake case
    #[test]
    fn serializes_mode_as_snake_case() {
        use serde_test::{assert_tokens, Token};
        assert_tokens(
            &Mode::NameSha1,
            &[Token::UnitVariant {
                name: "Mode",
                variant: "name_sha1",
            }],
        );
    }
}
