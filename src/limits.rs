use crate::error::SpawnError;

/// Slot pool capacity when none is configured.
pub const DEFAULT_CAPACITY: usize = 10;

/// Upper bound on the pool capacity.
pub const MAX_CAPACITY: usize = 4096;

/// Per-task hold when none is configured.
pub const DEFAULT_HOLD_MS: u64 = 1000;

/// Number of logical CPUs on the host.
/// Fixed for the lifetime of the process.
pub fn processor_count() -> usize {
    num_cpus::get()
}

/// Reject a capacity of zero or one above `MAX_CAPACITY`.
pub fn validate_capacity(capacity: usize) -> Result<usize, SpawnError> {
    if capacity == 0 || capacity > MAX_CAPACITY {
        return Err(SpawnError::InvalidCapacity {
            capacity,
            max: MAX_CAPACITY,
        });
    }
    Ok(capacity)
}
