use super::{BoundaryAllocator, ForeignBuffer};
use crate::engine::{Engine, HashArgs};
use crate::error::HashError;
use crate::params::Normalized;

/// Regions prepared for one `hash` call. The output region is allocated by
/// the host and must hold exactly `output_length` bytes.
#[derive(Debug)]
pub struct Invocation<'a> {
    pub password: &'a ForeignBuffer,
    pub salt: &'a ForeignBuffer,
    pub secret: &'a ForeignBuffer,
    pub associated_data: &'a ForeignBuffer,
    pub output: &'a ForeignBuffer,
}

/// Lays out the positional arguments of the engine's `hash` export:
///
/// ```text
/// password addr/len, salt addr/len, secret addr/len, ad addr/len,
/// output addr/len, variant, time cost, memory cost, parallelism,
/// output length, version
/// ```
///
/// Absent buffers encode as `(0, 0)`.
pub fn encode(invocation: &Invocation<'_>, params: &Normalized<'_>) -> HashArgs {
    [
        invocation.password.addr(),
        invocation.password.len(),
        invocation.salt.addr(),
        invocation.salt.len(),
        invocation.secret.addr(),
        invocation.secret.len(),
        invocation.associated_data.addr(),
        invocation.associated_data.len(),
        invocation.output.addr(),
        invocation.output.len(),
        params.variant.code(),
        params.time_cost,
        params.memory_cost,
        params.parallelism,
        params.output_length,
        params.version.code(),
    ]
}

/// Runs the engine's `hash` export. On return the output region holds the
/// tag; on failure the engine's message has already been decoded and its
/// buffer released.
pub fn invoke<E: Engine + ?Sized>(
    allocator: &mut BoundaryAllocator<'_, E>,
    invocation: Invocation<'_>,
    params: &Normalized<'_>,
) -> Result<(), HashError> {
    let args = encode(&invocation, params);

    tracing::debug!(
        variant = ?params.variant,
        version = ?params.version,
        time_cost = params.time_cost,
        memory_cost = params.memory_cost,
        parallelism = params.parallelism,
        output_length = params.output_length,
        "Invoking engine hash"
    );

    allocator.target().hash(args).map_err(|trap| {
        let err = HashError::from(trap);
        tracing::warn!("Engine hash call failed: {err}");
        err
    })
}
