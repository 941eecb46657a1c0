//! Program Derived Address (PDA) derivation functions

use solana_program::{
    account_info::AccountInfo,
    program_error::ProgramError,
    pubkey::Pubkey,
};
use spl_associated_token_account::get_associated_token_address;

use crate::error::MigrationError;

/// PDA seed constants
pub mod seeds {
    pub const MIGRATION_CONFIG: &[u8] = b"migration_config";
    pub const USER_MIGRATION: &[u8] = b"user_migration";
}

/// Config account; also the authority of both vaults
pub struct MigrationConfigPDA;
impl MigrationConfigPDA {
    pub fn derive(program_id: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[seeds::MIGRATION_CONFIG], program_id)
    }
}

pub struct UserMigrationPDA;
impl UserMigrationPDA {
    pub fn derive(program_id: &Pubkey, user: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[seeds::USER_MIGRATION, user.as_ref()], program_id)
    }
}

/// Canonical vault of the engine for `mint`
pub fn vault_address(program_id: &Pubkey, mint: &Pubkey) -> Pubkey {
    let (config, _) = MigrationConfigPDA::derive(program_id);
    get_associated_token_address(&config, mint)
}

/// Check that `account` sits at `expected`
pub fn verify_address(account: &AccountInfo, expected: &Pubkey) -> Result<(), ProgramError> {
    if account.key != expected {
        return Err(MigrationError::InvalidPda.into());
    }
    Ok(())
}
