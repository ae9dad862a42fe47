use std::{fmt, str};

use fstr::FStr;

use crate::error::{Error, Result, ValidationError};

/// Represents a Universally Unique IDentifier as specified by RFC 4122.
///
/// A `Uuid` is an immutable 16-byte big-endian value. Every instance has passed the layout
/// validation performed by [`Uuid::from_bytes()`]: the variant is one of NCS, RFC 4122, or
/// Microsoft, and an RFC 4122 value carries one of the five defined versions. Derived fields such
/// as [`version()`](Uuid::version) and [`timestamp()`](Uuid::timestamp) are pure functions of the
/// bytes.
///
/// Values compare by unsigned byte-wise lexicographic order over all 16 bytes.
///
/// # Examples
///
/// ```rust
/// use rfcuuid::{Uuid, Variant, Version};
///
/// let x = "1cef0eca-3728-11dd-af02-0013723f3004".parse::<Uuid>()?;
/// assert_eq!(x.version(), Version::TimeSpace);
/// assert_eq!(x.variant(), Variant::Rfc4122);
/// assert_eq!(x.node()?, 0x0013_723f_3004);
/// # Ok::<(), rfcuuid::Error>(())
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Uuid([u8; 16]);

/// The layout family selected by the top bits of byte 8.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Variant {
    /// `0xx`: reserved for NCS backward compatibility (includes the nil UUID).
    Ncs,
    /// `10x`: the layout specified by RFC 4122.
    Rfc4122,
    /// `110`: reserved for Microsoft backward compatibility.
    Microsoft,
    /// `111`: reserved for future definition. Never accepted by [`Uuid::from_bytes()`].
    Future,
}

impl Variant {
    /// Decodes the variant from the value of byte 8.
    pub const fn from_byte(octet: u8) -> Self {
        if octet & 0x80 == 0 {
            Self::Ncs
        } else if octet & 0x40 == 0 {
            Self::Rfc4122
        } else if octet & 0x20 == 0 {
            Self::Microsoft
        } else {
            Self::Future
        }
    }

    /// Returns the numeric variant code (0, 2, 6, or 7).
    pub const fn code(self) -> u8 {
        match self {
            Self::Ncs => 0,
            Self::Rfc4122 => 2,
            Self::Microsoft => 6,
            Self::Future => 7,
        }
    }
}

/// The sub-type of a UUID selecting its generation algorithm, from the high nibble of byte 6.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Version {
    /// Version 1: Gregorian timestamp, clock sequence, and node.
    TimeSpace,
    /// Version 2: DCE security. Recognized when decoding, never generated.
    DceSecurity,
    /// Version 3: MD5 hash of a namespace and a name.
    NameMd5,
    /// Version 4: random.
    Random,
    /// Version 5: SHA-1 hash of a namespace and a name.
    NameSha1,
    /// Any other nibble; only permitted in NCS and Microsoft variant values.
    NonConformant(u8),
}

impl Version {
    /// Decodes the version from a 4-bit nibble.
    pub const fn from_nibble(nibble: u8) -> Self {
        match nibble & 0x0f {
            1 => Self::TimeSpace,
            2 => Self::DceSecurity,
            3 => Self::NameMd5,
            4 => Self::Random,
            5 => Self::NameSha1,
            n => Self::NonConformant(n),
        }
    }

    /// Returns the 4-bit nibble this version is encoded as.
    pub const fn nibble(self) -> u8 {
        match self {
            Self::TimeSpace => 1,
            Self::DceSecurity => 2,
            Self::NameMd5 => 3,
            Self::Random => 4,
            Self::NameSha1 => 5,
            Self::NonConformant(n) => n,
        }
    }
}

/// The string representations a [`Uuid`] can be rendered in.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Format {
    /// `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`
    #[default]
    Canonical,
    /// 32 hexadecimal digits without separators.
    Unformatted,
    /// Canonical form wrapped in braces, as used in the Windows registry.
    Registry,
    /// Canonical form prefixed with `urn:uuid:`.
    Urn,
}

const URN_PREFIX: &str = "urn:uuid:";

impl Uuid {
    /// Nil UUID (00000000-0000-0000-0000-000000000000)
    pub const NIL: Self = Self([0x00; 16]);

    /// Namespace for fully-qualified domain names (RFC 4122, Appendix C).
    pub const NAMESPACE_DNS: Self = Self::namespace(0x10);

    /// Namespace for URLs.
    pub const NAMESPACE_URL: Self = Self::namespace(0x11);

    /// Namespace for ISO object identifiers.
    pub const NAMESPACE_OID: Self = Self::namespace(0x12);

    /// Namespace for X.500 distinguished names.
    pub const NAMESPACE_X500: Self = Self::namespace(0x14);

    /// The predefined namespaces differ only in the last octet of `time_low`.
    const fn namespace(octet: u8) -> Self {
        Self([
            0x6b, 0xa7, 0xb8, octet, 0x9d, 0xad, 0x11, 0xd1, 0x80, 0xb4, 0x00, 0xc0, 0x4f, 0xd4,
            0x30, 0xc8,
        ])
    }

    /// Creates a UUID from a 16-byte big-endian array, validating the variant and version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if byte 8 carries the reserved `111` variant pattern or if an
    /// RFC 4122 variant value carries a version nibble outside `1..=5`.
    pub const fn from_bytes(bytes: [u8; 16]) -> Result<Self> {
        match Variant::from_byte(bytes[8]) {
            Variant::Future => Err(Error::Validation(ValidationError::InvalidVariant(
                bytes[8] & 0xe0,
            ))),
            Variant::Rfc4122 => match Version::from_nibble(bytes[6] >> 4) {
                Version::NonConformant(n) => {
                    Err(Error::Validation(ValidationError::InvalidVersion(n)))
                }
                _ => Ok(Self(bytes)),
            },
            Variant::Ncs | Variant::Microsoft => Ok(Self(bytes)),
        }
    }

    /// Creates a UUID from its most and least significant 64-bit halves.
    pub const fn from_u64_pair(hi: u64, lo: u64) -> Result<Self> {
        Self::from_u128(((hi as u128) << 64) | lo as u128)
    }

    /// Creates a UUID from a 128-bit unsigned integer.
    pub const fn from_u128(src: u128) -> Result<Self> {
        Self::from_bytes(src.to_be_bytes())
    }

    /// Creates a version 1 UUID from its field values.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] if `timestamp` exceeds 60 bits, `clock_sequence`
    /// exceeds 14 bits, or `node` exceeds 48 bits.
    pub fn from_fields_v1(timestamp: u64, clock_sequence: u16, node: u64) -> Result<Self> {
        check_range("timestamp", timestamp, 60)?;
        check_range("clock sequence", clock_sequence as u64, 14)?;
        check_range("node", node, 48)?;
        Ok(Self::new_v1(timestamp, clock_sequence, node))
    }

    /// Lays out version 1 fields, discarding bits beyond each field's width.
    pub(crate) const fn new_v1(timestamp: u64, clock_sequence: u16, node: u64) -> Self {
        let ts = timestamp.to_be_bytes();
        let seq = (0x8000 | (clock_sequence & 0x3fff)).to_be_bytes();
        let node = node.to_be_bytes();
        Self([
            ts[4],
            ts[5],
            ts[6],
            ts[7],
            ts[2],
            ts[3],
            0x10 | (ts[0] & 0x0f),
            ts[1],
            seq[0],
            seq[1],
            node[2],
            node[3],
            node[4],
            node[5],
            node[6],
            node[7],
        ])
    }

    /// Overwrites the version nibble and the variant bits of `bytes` with the RFC 4122 pattern.
    pub(crate) const fn stamp(mut bytes: [u8; 16], version: Version) -> Self {
        bytes[6] = (version.nibble() << 4) | (bytes[6] & 0x0f);
        bytes[8] = 0x80 | (bytes[8] & 0x3f);
        Self(bytes)
    }

    /// Returns a reference to the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Returns a copy of the underlying byte array.
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }

    /// Returns the value as a 128-bit unsigned integer.
    pub const fn as_u128(&self) -> u128 {
        u128::from_be_bytes(self.0)
    }

    /// Returns the most and least significant 64-bit halves.
    pub const fn as_u64_pair(&self) -> (u64, u64) {
        let n = self.as_u128();
        ((n >> 64) as u64, n as u64)
    }

    /// Returns the variant encoded in byte 8.
    pub const fn variant(&self) -> Variant {
        Variant::from_byte(self.0[8])
    }

    /// Returns the version encoded in the high nibble of byte 6.
    pub const fn version(&self) -> Version {
        Version::from_nibble(self.0[6] >> 4)
    }

    /// Returns the 60-bit count of 100-nanosecond intervals since 1582-10-15T00:00:00Z.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] unless this is a version 1 UUID.
    pub fn timestamp(&self) -> Result<u64> {
        self.require_time_based("timestamp")?;
        let b = &self.0;
        let time_low = u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as u64;
        let time_mid = u16::from_be_bytes([b[4], b[5]]) as u64;
        let time_hi = (u16::from_be_bytes([b[6], b[7]]) & 0x0fff) as u64;
        Ok((time_hi << 48) | (time_mid << 32) | time_low)
    }

    /// Returns the clock sequence: 14 bits for RFC 4122 values, 13 bits for other variants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] unless this is a version 1 UUID.
    pub fn clock_sequence(&self) -> Result<u16> {
        self.require_time_based("clock_sequence")?;
        let mask = match self.variant() {
            Variant::Rfc4122 => 0x3fff,
            _ => 0x1fff,
        };
        Ok(u16::from_be_bytes([self.0[8], self.0[9]]) & mask)
    }

    /// Returns the 48-bit node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] unless this is a version 1 UUID.
    pub fn node(&self) -> Result<u64> {
        self.require_time_based("node")?;
        let mut buf = [0u8; 8];
        buf[2..].copy_from_slice(&self.0[10..]);
        Ok(u64::from_be_bytes(buf))
    }

    fn require_time_based(&self, operation: &'static str) -> Result<()> {
        match self.version() {
            Version::TimeSpace => Ok(()),
            version => Err(Error::UnsupportedOperation { operation, version }),
        }
    }

    /// Returns the 8-4-4-4-12 hexadecimal string representation stored in a stack-allocated
    /// string type that can be dereferenced as `str` and [`Display`](fmt::Display)ed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rfcuuid::Uuid;
    ///
    /// let x = "00000300-0000-0000-C000-000000000046".parse::<Uuid>()?;
    /// let y = x.encode();
    /// assert_eq!(y, "00000300-0000-0000-c000-000000000046");
    /// assert_eq!(format!("{}", y), "00000300-0000-0000-c000-000000000046");
    /// # Ok::<(), rfcuuid::Error>(())
    /// ```
    pub fn encode(&self) -> FStr<36> {
        let mut buffer = [0u8; 36];
        self.write_hex(&mut buffer, true);
        debug_assert!(buffer.is_ascii());
        // SAFETY: `write_hex` fills the buffer with ASCII characters only.
        unsafe { FStr::from_inner_unchecked(buffer) }
    }

    /// Returns the 32-digit hexadecimal representation without hyphens.
    pub fn to_unformatted_hex(&self) -> FStr<32> {
        let mut buffer = [0u8; 32];
        self.write_hex(&mut buffer, false);
        debug_assert!(buffer.is_ascii());
        // SAFETY: `write_hex` fills the buffer with ASCII characters only.
        unsafe { FStr::from_inner_unchecked(buffer) }
    }

    /// Returns the canonical representation wrapped in braces, e.g. `{00000300-...-000000000046}`.
    pub fn to_registry_form(&self) -> String {
        format!("{{{}}}", self.encode())
    }

    /// Returns the canonical representation prefixed with `urn:uuid:`.
    pub fn to_urn(&self) -> String {
        format!("{}{}", URN_PREFIX, self.encode())
    }

    /// Renders the value in the requested [`Format`].
    pub fn format(&self, format: Format) -> String {
        match format {
            Format::Canonical => self.encode().to_string(),
            Format::Unformatted => self.to_unformatted_hex().to_string(),
            Format::Registry => self.to_registry_form(),
            Format::Urn => self.to_urn(),
        }
    }

    fn write_hex(&self, buffer: &mut [u8], hyphenate: bool) {
        const DIGITS: &[u8; 16] = b"0123456789abcdef";

        let mut buf_iter = buffer.iter_mut();
        for (i, e) in self.0.iter().enumerate() {
            let e = *e as usize;
            if let Some(d) = buf_iter.next() {
                *d = DIGITS[e >> 4];
            }
            if let Some(d) = buf_iter.next() {
                *d = DIGITS[e & 15];
            }
            if hyphenate && (i == 3 || i == 5 || i == 7 || i == 9) {
                if let Some(d) = buf_iter.next() {
                    *d = b'-';
                }
            }
        }
    }

    /// Parses any accepted string representation.
    ///
    /// After stripping an optional case-insensitive `urn:uuid:` prefix, the input must be one of
    /// the 36-character canonical form, the 32-character unformatted form, or the 38-character
    /// braced registry form. Hexadecimal digits are case-insensitive.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rfcuuid::Uuid;
    ///
    /// let canonical: Uuid = "urn:uuid:1cef0eca-3728-11dd-af02-0013723f3004".parse()?;
    /// let registry: Uuid = "{1CEF0ECA-3728-11DD-AF02-0013723F3004}".parse()?;
    /// let unformatted: Uuid = "1cef0eca372811ddaf020013723f3004".parse()?;
    /// assert_eq!(canonical, registry);
    /// assert_eq!(canonical, unformatted);
    /// # Ok::<(), rfcuuid::Error>(())
    /// ```
    pub fn parse_str(src: &str) -> Result<Self> {
        let (offset, body) = match src.get(..URN_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(URN_PREFIX) => {
                (URN_PREFIX.len(), &src[URN_PREFIX.len()..])
            }
            _ => (0, src),
        };

        let body = body.as_bytes();
        let bytes = match body.len() {
            36 => decode_hex(body, offset, true)?,
            32 => decode_hex(body, offset, false)?,
            38 => {
                if body[0] != b'{' {
                    return Err(ValidationError::InvalidCharacter(offset).into());
                }
                if body[37] != b'}' {
                    return Err(ValidationError::InvalidCharacter(offset + 37).into());
                }
                decode_hex(&body[1..37], offset + 1, true)?
            }
            len => return Err(ValidationError::InvalidLength(len).into()),
        };
        Self::from_bytes(bytes)
    }
}

fn check_range(field: &'static str, value: u64, bits: u32) -> Result<()> {
    if value >> bits == 0 {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange { field, value, bits }.into())
    }
}

/// Decodes 32 hex digits, with hyphens at 8, 13, 18 and 23 when `hyphenated`.
fn decode_hex(src: &[u8], offset: usize, hyphenated: bool) -> Result<[u8; 16]> {
    let mut dst = [0u8; 16];
    let mut digits = 0;
    for (i, &c) in src.iter().enumerate() {
        let hyphen_slot = hyphenated && matches!(i, 8 | 13 | 18 | 23);
        if c == b'-' || hyphen_slot {
            if c == b'-' && hyphen_slot {
                continue;
            }
            return Err(ValidationError::InvalidHyphen.into());
        }
        let nibble = (c as char)
            .to_digit(16)
            .ok_or(ValidationError::InvalidCharacter(offset + i))? as u8;
        dst[digits / 2] |= if digits % 2 == 0 { nibble << 4 } else { nibble };
        digits += 1;
    }
    debug_assert_eq!(digits, 32);
    Ok(dst)
}

impl fmt::Display for Uuid {
    /// Returns the 8-4-4-4-12 canonical hexadecimal string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl str::FromStr for Uuid {
    type Err = Error;

    /// See [`Uuid::parse_str()`].
    fn from_str(src: &str) -> Result<Self> {
        Self::parse_str(src)
    }
}

impl From<Uuid> for [u8; 16] {
    fn from(src: Uuid) -> Self {
        src.0
    }
}

impl TryFrom<[u8; 16]> for Uuid {
    type Error = Error;

    fn try_from(src: [u8; 16]) -> Result<Self> {
        Self::from_bytes(src)
    }
}

impl TryFrom<&[u8]> for Uuid {
    type Error = Error;

    fn try_from(src: &[u8]) -> Result<Self> {
        <[u8; 16]>::try_from(src)
            .map_err(|_| Error::from(ValidationError::InvalidLength(src.len())))
            .and_then(Self::from_bytes)
    }
}

impl AsRef<[u8]> for Uuid {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Uuid> for u128 {
    fn from(src: Uuid) -> Self {
        src.as_u128()
    }
}

impl TryFrom<u128> for Uuid {
    type Error = Error;

    fn try_from(src: u128) -> Result<Self> {
        Self::from_u128(src)
    }
}

impl From<Uuid> for String {
    fn from(src: Uuid) -> Self {
        src.to_string()
    }
}

impl TryFrom<String> for Uuid {
    type Error = Error;

    fn try_from(src: String) -> Result<Self> {
        src.parse()
    }
}

impl TryFrom<&str> for Uuid {
    type Error = Error;

    fn try_from(src: &str) -> Result<Self> {
        src.parse()
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{fmt, Uuid};
    use serde::{de, Deserializer, Serializer};

    impl serde::Serialize for Uuid {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.serialize_str(&self.encode())
            } else {
                serializer.serialize_bytes(self.as_bytes())
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for Uuid {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            if deserializer.is_human_readable() {
                deserializer.deserialize_str(VisitorImpl)
            } else {
                deserializer.deserialize_bytes(VisitorImpl)
            }
        }
    }

    struct VisitorImpl;

    impl<'de> de::Visitor<'de> for VisitorImpl {
        type Value = Uuid;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "an RFC 4122 UUID representation")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value.parse::<Self::Value>().map_err(de::Error::custom)
        }

        fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
            Self::Value::try_from(value).map_err(de::Error::custom)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::Uuid;
        use serde_test::{assert_de_tokens_error, assert_tokens, Configure, Token};

        /// Serializes and deserializes prepared cases correctly
        #[test]
        fn serializes_and_deserializes_prepared_cases_correctly() {
            let cases = [
                ("00000000-0000-0000-0000-000000000000", &[0u8; 16]),
                (
                    "1cef0eca-3728-11dd-af02-0013723f3004",
                    &[
                        28, 239, 14, 202, 55, 40, 17, 221, 175, 2, 0, 19, 114, 63, 48, 4,
                    ],
                ),
                (
                    "00000300-0000-0000-c000-000000000046",
                    &[0, 0, 3, 0, 0, 0, 0, 0, 192, 0, 0, 0, 0, 0, 0, 70],
                ),
                (
                    "6fa459ea-ee8a-3ca4-894e-db77e160355e",
                    &[
                        111, 164, 89, 234, 238, 138, 60, 164, 137, 78, 219, 119, 225, 96, 53, 94,
                    ],
                ),
            ];

            for (text, bytes) in cases {
                let e = text.parse::<Uuid>().unwrap();
                assert_tokens(&e.readable(), &[Token::String(text)]);
                assert_tokens(&e.compact(), &[Token::Bytes(bytes)]);
            }
        }

        /// Rejects reserved variant on deserialization
        #[test]
        fn rejects_reserved_variant_on_deserialization() {
            assert_de_tokens_error::<serde_test::Readable<Uuid>>(
                &[Token::Str("1cef0eca-3728-11dd-ef02-0013723f3004")],
                "invalid UUID: reserved variant bits 0xe0 in byte 8",
            );
        }
    }
}
