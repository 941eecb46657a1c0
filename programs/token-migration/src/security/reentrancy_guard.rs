//! Reentrancy Guard
//!
//! Call-scoped lock persisted in the config account. Every operation that moves
//! tokens enters it first, so a nested invocation issued from inside a token
//! transfer sees `Entered` and fails before touching any state.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    msg,
    program_error::ProgramError,
};

use crate::{
    error::MigrationError,
    host::MigrationHost,
    state::MigrationConfig,
};

/// Reentrancy guard states
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReentrancyState {
    /// Not entered - ready for new operation
    NotEntered,
    /// Entered - operation in progress
    Entered,
}

impl ReentrancyState {
    /// Enter guarded section
    pub fn enter(&mut self) -> Result<(), ProgramError> {
        match self {
            ReentrancyState::NotEntered => {
                *self = ReentrancyState::Entered;
                Ok(())
            }
            ReentrancyState::Entered => {
                msg!("Reentrancy detected");
                Err(MigrationError::ReentrantCall.into())
            }
        }
    }

    /// Exit guarded section
    pub fn exit(&mut self) -> Result<(), ProgramError> {
        match self {
            ReentrancyState::Entered => {
                *self = ReentrancyState::NotEntered;
                Ok(())
            }
            ReentrancyState::NotEntered => {
                msg!("Invalid exit state: {:?}", self);
                Err(MigrationError::InvalidGuardState.into())
            }
        }
    }

    pub fn is_entered(&self) -> bool {
        *self == ReentrancyState::Entered
    }
}

/// Run `body` inside the guard.
///
/// The entered state is stored before `body` runs and cleared afterwards on both
/// the success and the error path. The config is reloaded before release so that
/// changes `body` (or a nested call) persisted are kept.
pub fn with_reentrancy_guard<H, T, F>(host: &mut H, body: F) -> Result<T, ProgramError>
where
    H: MigrationHost + ?Sized,
    F: FnOnce(&mut H, &MigrationConfig) -> Result<T, ProgramError>,
{
    let mut config = host.load_config()?;
    config.reentrancy.enter()?;
    host.store_config(&config)?;

    let result = body(host, &config);

    let mut config = host.load_config()?;
    config.reentrancy.exit()?;
    host.store_config(&config)?;

    result
}
