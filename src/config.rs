use std::path::PathBuf;

use thiserror::Error;

use crate::planning::{Identity, LedgerId};

#[derive(Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("Usage: planbook <state_file> [<ledger_id> <transactions_csv>]")]
    Usage,
    #[error("invalid ledger id `{0}`")]
    InvalidLedgerId(String),
}

/// Transactions to load into a ledger before reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRequest {
    pub ledger: LedgerId,
    pub csv_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub state_path: PathBuf,
    pub import: Option<ImportRequest>,
}

impl Config {
    /// Builds a config from the process arguments, program name included.
    pub fn from_args(args: &[String]) -> Result<Config, ConfigError> {
        match args {
            [_, state] => Ok(Config {
                state_path: PathBuf::from(state),
                import: None,
            }),
            [_, state, ledger, csv_path] => {
                let ledger = ledger
                    .parse::<u32>()
                    .map(LedgerId::from_raw)
                    .map_err(|_| ConfigError::InvalidLedgerId(ledger.clone()))?;

                Ok(Config {
                    state_path: PathBuf::from(state),
                    import: Some(ImportRequest {
                        ledger,
                        csv_path: PathBuf::from(csv_path),
                    }),
                })
            },
            _ => Err(ConfigError::Usage),
        }
    }
}
