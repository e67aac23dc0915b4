//! Argon2 cost parameters and header-only parameter inspection

use serde::Serialize;

use crate::error::{AbcryptError, ErrorCategory, ErrorKind, Result};
use crate::format::Header;

/// The Argon2 cost parameters used to encrypt a container.
///
/// Holds no secret material. Values of this type are always within the
/// limits accepted by Argon2.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[repr(C)]
pub struct Params {
    memory_cost: u32,
    time_cost: u32,
    parallelism: u32,
}

impl Params {
    /// Reads the parameters from the header of `ciphertext`.
    ///
    /// Neither the header MAC nor the payload is checked, so this works
    /// without the passphrase and on containers with a corrupted payload.
    pub fn new(ciphertext: &[u8]) -> Result<Self> {
        Header::parse(ciphertext).map(|h| h.params())
    }

    /// Validates and builds parameters from raw costs.
    ///
    /// `memory_cost` is in KiB and must be at least `8 * parallelism`;
    /// `time_cost` and `parallelism` must be at least 1.
    pub fn from_costs(memory_cost: u32, time_cost: u32, parallelism: u32) -> Result<Self> {
        argon2::Params::new(memory_cost, time_cost, parallelism, None)
            .map(Self::from)
            .map_err(|e| {
                AbcryptError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::InvalidArgon2Params,
                    "invalid Argon2 parameters",
                    e,
                )
            })
    }

    /// Memory size in KiB.
    pub const fn memory_cost(&self) -> u32 {
        self.memory_cost
    }

    /// Number of iterations.
    pub const fn time_cost(&self) -> u32 {
        self.time_cost
    }

    /// Degree of parallelism.
    pub const fn parallelism(&self) -> u32 {
        self.parallelism
    }
}

/// The OWASP-recommended costs: 19 MiB, 2 iterations, 1 lane.
impl Default for Params {
    fn default() -> Self {
        argon2::Params::default().into()
    }
}

impl From<argon2::Params> for Params {
    fn from(params: argon2::Params) -> Self {
        Self {
            memory_cost: params.m_cost(),
            time_cost: params.t_cost(),
            parallelism: params.p_cost(),
        }
    }
}

impl TryFrom<Params> for argon2::Params {
    type Error = AbcryptError;

    fn try_from(params: Params) -> Result<Self> {
        Self::new(
            params.memory_cost,
            params.time_cost,
            params.parallelism,
            None,
        )
        .map_err(|e| {
            AbcryptError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::InvalidArgon2Params,
                "invalid Argon2 parameters",
                e,
            )
        })
    }
}

/// Reads the Argon2 cost parameters of an encrypted container.
pub fn read_params(ciphertext: &[u8]) -> Result<Params> {
    Params::new(ciphertext)
}
