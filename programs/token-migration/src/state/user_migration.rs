use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    clock::UnixTimestamp,
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::{
    constants::{COOLDOWN_PERIOD, MAX_PER_MIGRATION},
    error::MigrationError,
};

/// Per-user migration history, created on the first successful migration
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UserMigrationRecord {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Wallet this record belongs to
    pub user: Pubkey,

    /// Sum of every successful migration amount
    pub total_migrated: u64,

    /// Amount moved by the latest migration
    pub last_migration_amount: u64,

    /// Unix timestamp of the latest migration
    pub last_migration_timestamp: UnixTimestamp,

    /// Record PDA bump
    pub bump: u8,
}

impl UserMigrationRecord {
    pub const DISCRIMINATOR: [u8; 8] = [77, 73, 71, 95, 85, 83, 69, 82]; // "MIG_USER"

    pub const LEN: usize = 8 + // discriminator
        32 + // user
        8 + // total_migrated
        8 + // last_migration_amount
        8 + // last_migration_timestamp
        1; // bump

    /// Zero record for a user that never migrated
    pub fn new(user: Pubkey, bump: u8) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            user,
            bump,
            ..Default::default()
        }
    }

    /// Only a migration of exactly the cap starts a cooldown window
    pub fn is_cooling_down(&self, now: UnixTimestamp) -> bool {
        self.last_migration_amount == MAX_PER_MIGRATION
            && now < self.last_migration_timestamp.saturating_add(COOLDOWN_PERIOD)
    }

    pub fn record_migration(
        &mut self,
        amount: u64,
        now: UnixTimestamp,
    ) -> Result<(), ProgramError> {
        self.total_migrated = self
            .total_migrated
            .checked_add(amount)
            .ok_or(MigrationError::ArithmeticOverflow)?;
        self.last_migration_amount = amount;
        self.last_migration_timestamp = now;
        Ok(())
    }

    pub fn load(account: &AccountInfo) -> Result<Self, ProgramError> {
        let data = account.data.borrow();
        let record = Self::deserialize(&mut &data[..])?;
        if record.discriminator != Self::DISCRIMINATOR {
            return Err(ProgramError::InvalidAccountData);
        }
        Ok(record)
    }

    pub fn save(&self, account: &AccountInfo) -> Result<(), ProgramError> {
        self.serialize(&mut &mut account.data.borrow_mut()[..])?;
        Ok(())
    }
}
