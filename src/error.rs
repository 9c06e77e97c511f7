use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("invalid capacity {capacity}: must be between 1 and {max}")]
    InvalidCapacity { capacity: usize, max: usize },

    #[error("config capacity {config} does not match pool capacity {pool}")]
    CapacityMismatch { config: usize, pool: usize },

    #[error("slot pool closed")]
    PoolClosed,

    #[error("progress template: {0}")]
    ProgressTemplate(#[from] indicatif::style::TemplateError),
}
