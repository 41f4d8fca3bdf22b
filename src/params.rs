//! Hash parameters and their normalisation.
//!
//! Callers fill in as much of [`HashParameters`] as they care about;
//! [`HashParameters::normalize`] resolves the rest and rejects anything out
//! of range before a single byte of engine memory is touched.

use serde::{Deserialize, Serialize};

use crate::error::HashError;

pub const DEFAULT_OUTPUT_LENGTH: u32 = 32;
pub const DEFAULT_PARALLELISM: u32 = 1;
pub const MAX_PARALLELISM: u32 = 255;

/// Argon2 algorithm variant.
///
/// - `Argon2d` accesses memory in a password-dependent order. Best GPU
///   resistance, exposed to side channels.
/// - `Argon2i` accesses memory in a password-independent order.
/// - `Argon2id` (default) does the first half pass like Argon2i and the
///   rest like Argon2d.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Argon2d,
    Argon2i,
    #[default]
    Argon2id,
}

impl Variant {
    /// Code passed to the engine.
    pub const fn code(self) -> u32 {
        match self {
            Variant::Argon2d => 0,
            Variant::Argon2i => 1,
            Variant::Argon2id => 2,
        }
    }

    /// Memory cost in KiB, per the OWASP password storage cheat sheet.
    pub const fn default_memory_cost(self) -> u32 {
        match self {
            Variant::Argon2i => 12288,
            Variant::Argon2d | Variant::Argon2id => 19456,
        }
    }

    pub const fn default_time_cost(self) -> u32 {
        match self {
            Variant::Argon2i => 3,
            Variant::Argon2d | Variant::Argon2id => 2,
        }
    }
}

/// Argon2 protocol version. `V0x10` overwrites blocks on later passes,
/// `V0x13` (default) XORs into them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Version {
    V0x10,
    #[default]
    V0x13,
}

impl Version {
    pub const fn code(self) -> u32 {
        match self {
            Version::V0x10 => 0x10,
            Version::V0x13 => 0x13,
        }
    }
}

impl From<Version> for u32 {
    fn from(version: Version) -> Self {
        version.code()
    }
}

impl TryFrom<u32> for Version {
    type Error = HashError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0x10 => Ok(Version::V0x10),
            0x13 => Ok(Version::V0x13),
            other => Err(HashError::Validation(format!(
                "unsupported version {other:#x}, expected 0x10 or 0x13"
            ))),
        }
    }
}

/// Partially specified parameters. Every unset field gets a default during
/// [`normalize`](HashParameters::normalize).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HashParameters {
    pub secret: Option<Vec<u8>>,
    pub associated_data: Option<Vec<u8>>,
    pub variant: Option<Variant>,
    pub version: Option<Version>,
    /// Passes over memory, 1..=2^32-1.
    pub time_cost: Option<u32>,
    /// KiB of memory, 1..=2^32-1.
    pub memory_cost: Option<u32>,
    /// Lanes, 1..=255.
    pub parallelism: Option<u32>,
    pub output_length: Option<u32>,
}

impl HashParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variant(mut self, variant: Variant) -> Self {
        self.variant = Some(variant);
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    pub fn time_cost(mut self, time_cost: u32) -> Self {
        self.time_cost = Some(time_cost);
        self
    }

    pub fn memory_cost(mut self, memory_cost: u32) -> Self {
        self.memory_cost = Some(memory_cost);
        self
    }

    pub fn parallelism(mut self, parallelism: u32) -> Self {
        self.parallelism = Some(parallelism);
        self
    }

    pub fn output_length(mut self, output_length: u32) -> Self {
        self.output_length = Some(output_length);
        self
    }

    pub fn secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn associated_data(mut self, associated_data: impl Into<Vec<u8>>) -> Self {
        self.associated_data = Some(associated_data.into());
        self
    }

    /// Resolves defaults and validates ranges.
    pub fn normalize(&self) -> Result<Normalized<'_>, HashError> {
        let variant = self.variant.unwrap_or_default();
        let version = self.version.unwrap_or_default();
        let time_cost = self.time_cost.unwrap_or(variant.default_time_cost());
        let memory_cost = self.memory_cost.unwrap_or(variant.default_memory_cost());
        let parallelism = self.parallelism.unwrap_or(DEFAULT_PARALLELISM);
        let output_length = self.output_length.unwrap_or(DEFAULT_OUTPUT_LENGTH);

        if time_cost < 1 {
            return Err(HashError::Validation(
                "time cost must be at least 1".to_string(),
            ));
        }
        if memory_cost < 1 {
            return Err(HashError::Validation(
                "memory cost must be at least 1 KiB".to_string(),
            ));
        }
        if !(1..=MAX_PARALLELISM).contains(&parallelism) {
            return Err(HashError::Validation(format!(
                "parallelism must be between 1 and {MAX_PARALLELISM}, got {parallelism}"
            )));
        }
        if output_length < 1 {
            return Err(HashError::Validation(
                "output length must be at least 1 byte".to_string(),
            ));
        }

        Ok(Normalized {
            variant,
            version,
            time_cost,
            memory_cost,
            parallelism,
            output_length,
            secret: self.secret.as_deref(),
            associated_data: self.associated_data.as_deref(),
        })
    }
}

/// Parameters with every numeric field resolved, ready for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalized<'a> {
    pub variant: Variant,
    pub version: Version,
    pub time_cost: u32,
    pub memory_cost: u32,
    pub parallelism: u32,
    pub output_length: u32,
    pub secret: Option<&'a [u8]>,
    pub associated_data: Option<&'a [u8]>,
}
