use kmc_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type SimResult<T> = Result<T, SimError>;
