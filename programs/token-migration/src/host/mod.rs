//! Boundary between the migration engine and the world it runs in.
//!
//! The engine never touches accounts or token programs directly. Everything it
//! reads or changes outside its own locals goes through `MigrationHost`: the
//! on-chain implementation is `ProgramHost`, the in-memory one is
//! `crate::simulator::LedgerSimulator`.

pub mod program_host;

pub use program_host::*;

use solana_program::{
    clock::UnixTimestamp,
    entrypoint::ProgramResult,
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::{
    events::MigrationEvent,
    state::{MigrationConfig, UserMigrationRecord},
};

pub trait MigrationHost {
    /// Key that owns the engine's vaults
    fn engine_id(&self) -> Pubkey;

    fn now(&self) -> Result<UnixTimestamp, ProgramError>;

    /// Fails with `NotInitialized` before `initialize` ran
    fn load_config(&self) -> Result<MigrationConfig, ProgramError>;

    fn store_config(&mut self, config: &MigrationConfig) -> ProgramResult;

    /// Absent records load as the zero record
    fn load_record(&self, user: &Pubkey) -> Result<UserMigrationRecord, ProgramError>;

    fn store_record(&mut self, user: &Pubkey, record: &UserMigrationRecord) -> ProgramResult;

    fn balance_of(&self, mint: &Pubkey, owner: &Pubkey) -> Result<u64, ProgramError>;

    /// Move `amount` out of the engine's vault
    fn transfer(&mut self, mint: &Pubkey, to: &Pubkey, amount: u64) -> ProgramResult;

    /// Move `amount` out of `owner`'s account; `owner` has signed
    fn transfer_from(
        &mut self,
        mint: &Pubkey,
        owner: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> ProgramResult;

    fn emit(&mut self, event: MigrationEvent);
}
