use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::{
    error::MigrationError,
    security::ReentrancyState,
};

/// Global configuration of the migration engine
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Is initialized flag
    pub is_initialized: bool,

    /// Only key allowed to pause, unpause, withdraw and hand over ownership
    pub owner: Pubkey,

    /// Legacy mint being migrated away from
    pub source_mint: Pubkey,

    /// Successor mint paid out of the reserve
    pub target_mint: Pubkey,

    /// Wallet receiving swept source tokens
    pub treasury: Pubkey,

    /// Migrations and deposits are rejected while set
    pub is_paused: bool,

    /// Persisted reentrancy status of transfer-guarded operations
    pub reentrancy: ReentrancyState,

    /// Config PDA bump
    pub bump: u8,
}

impl MigrationConfig {
    pub const DISCRIMINATOR: [u8; 8] = [77, 73, 71, 95, 67, 79, 78, 70]; // "MIG_CONF"

    pub const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        32 + // owner
        32 + // source_mint
        32 + // target_mint
        32 + // treasury
        1 + // is_paused
        1 + // reentrancy
        1; // bump

    /// Fresh configuration, paused until the owner opens it
    pub fn new(
        owner: Pubkey,
        source_mint: Pubkey,
        target_mint: Pubkey,
        treasury: Pubkey,
        bump: u8,
    ) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            owner,
            source_mint,
            target_mint,
            treasury,
            is_paused: true,
            reentrancy: ReentrancyState::NotEntered,
            bump,
        }
    }

    pub fn validate(&self) -> Result<(), ProgramError> {
        if self.discriminator != Self::DISCRIMINATOR || !self.is_initialized {
            return Err(MigrationError::NotInitialized.into());
        }
        Ok(())
    }

    pub fn is_owner(&self, key: &Pubkey) -> bool {
        self.owner == *key
    }

    /// True for the two mints this engine was configured with
    pub fn is_configured_mint(&self, mint: &Pubkey) -> bool {
        *mint == self.source_mint || *mint == self.target_mint
    }

    pub fn load(account: &AccountInfo) -> Result<Self, ProgramError> {
        let data = account.data.borrow();
        let config = Self::deserialize(&mut &data[..])
            .map_err(|_| ProgramError::from(MigrationError::NotInitialized))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, account: &AccountInfo) -> Result<(), ProgramError> {
        self.serialize(&mut &mut account.data.borrow_mut()[..])?;
        Ok(())
    }
}
