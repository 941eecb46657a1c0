use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use spl_associated_token_account::get_associated_token_address;

use crate::{
    error::MigrationError,
    pda::{vault_address, MigrationConfigPDA, UserMigrationPDA},
};

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum MigrationInstruction {
    /// Create the migration config. The engine starts paused.
    /// Accounts:
    /// 0. `[signer, writable]` Owner (payer)
    /// 1. `[writable]` Migration config PDA
    /// 2. `[]` System program
    Initialize {
        source_mint: Pubkey,
        target_mint: Pubkey,
        treasury: Pubkey,
    },

    /// Migrate an explicit amount
    /// Accounts:
    /// 0. `[signer, writable]` User (pays for the record on first migration)
    /// 1. `[writable]` Migration config PDA
    /// 2. `[writable]` User migration record PDA
    /// 3. `[writable]` User source token account
    /// 4. `[writable]` User target token account
    /// 5. `[writable]` Source vault
    /// 6. `[writable]` Target vault
    /// 7. `[]` Token program
    /// 8. `[]` System program
    Migrate {
        amount: u64,
    },

    /// Migrate the user's whole source balance
    /// Accounts: same as `Migrate`
    MigrateAll,

    /// Deposit target tokens into the reserve
    /// Accounts:
    /// 0. `[signer]` Depositor
    /// 1. `[writable]` Migration config PDA
    /// 2. `[writable]` Depositor target token account
    /// 3. `[writable]` Target vault
    /// 4. `[]` Token program
    FeedReserve {
        amount: u64,
    },

    /// Sweep the source vault to the treasury
    /// Accounts:
    /// 0. `[signer]` Owner
    /// 1. `[writable]` Migration config PDA
    /// 2. `[writable]` Source vault
    /// 3. `[writable]` Treasury source token account
    /// 4. `[]` Token program
    Withdraw,

    /// Accounts:
    /// 0. `[signer]` Owner
    /// 1. `[writable]` Migration config PDA
    Pause,

    /// Accounts:
    /// 0. `[signer]` Owner
    /// 1. `[writable]` Migration config PDA
    Unpause,

    /// Accounts:
    /// 0. `[signer]` Owner
    /// 1. `[writable]` Migration config PDA
    TransferOwnership {
        new_owner: Pubkey,
    },
}

impl MigrationInstruction {
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(input).map_err(|_| MigrationError::InvalidInstruction.into())
    }

    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        Ok(self.try_to_vec()?)
    }
}

// Helper functions to create instructions

pub fn initialize(
    program_id: &Pubkey,
    owner: &Pubkey,
    source_mint: &Pubkey,
    target_mint: &Pubkey,
    treasury: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let (config, _) = MigrationConfigPDA::derive(program_id);
    let accounts = vec![
        AccountMeta::new(*owner, true),
        AccountMeta::new(config, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    let data = MigrationInstruction::Initialize {
        source_mint: *source_mint,
        target_mint: *target_mint,
        treasury: *treasury,
    }
    .pack()?;

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

fn migration_accounts(
    program_id: &Pubkey,
    user: &Pubkey,
    source_mint: &Pubkey,
    target_mint: &Pubkey,
) -> Vec<AccountMeta> {
    let (config, _) = MigrationConfigPDA::derive(program_id);
    let (record, _) = UserMigrationPDA::derive(program_id, user);
    vec![
        AccountMeta::new(*user, true),
        AccountMeta::new(config, false),
        AccountMeta::new(record, false),
        AccountMeta::new(get_associated_token_address(user, source_mint), false),
        AccountMeta::new(get_associated_token_address(user, target_mint), false),
        AccountMeta::new(vault_address(program_id, source_mint), false),
        AccountMeta::new(vault_address(program_id, target_mint), false),
        AccountMeta::new_readonly(spl_token::id(), false),
        AccountMeta::new_readonly(system_program::id(), false),
    ]
}

/// Migrate from the user's associated token accounts
pub fn migrate(
    program_id: &Pubkey,
    user: &Pubkey,
    source_mint: &Pubkey,
    target_mint: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: migration_accounts(program_id, user, source_mint, target_mint),
        data: MigrationInstruction::Migrate { amount }.pack()?,
    })
}

pub fn migrate_all(
    program_id: &Pubkey,
    user: &Pubkey,
    source_mint: &Pubkey,
    target_mint: &Pubkey,
) -> Result<Instruction, ProgramError> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: migration_accounts(program_id, user, source_mint, target_mint),
        data: MigrationInstruction::MigrateAll.pack()?,
    })
}

pub fn feed_reserve(
    program_id: &Pubkey,
    depositor: &Pubkey,
    target_mint: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let (config, _) = MigrationConfigPDA::derive(program_id);
    let accounts = vec![
        AccountMeta::new_readonly(*depositor, true),
        AccountMeta::new(config, false),
        AccountMeta::new(get_associated_token_address(depositor, target_mint), false),
        AccountMeta::new(vault_address(program_id, target_mint), false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: MigrationInstruction::FeedReserve { amount }.pack()?,
    })
}

pub fn withdraw(
    program_id: &Pubkey,
    owner: &Pubkey,
    source_mint: &Pubkey,
    treasury: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let (config, _) = MigrationConfigPDA::derive(program_id);
    let accounts = vec![
        AccountMeta::new_readonly(*owner, true),
        AccountMeta::new(config, false),
        AccountMeta::new(vault_address(program_id, source_mint), false),
        AccountMeta::new(get_associated_token_address(treasury, source_mint), false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: MigrationInstruction::Withdraw.pack()?,
    })
}

fn owner_instruction(
    program_id: &Pubkey,
    owner: &Pubkey,
    instruction: MigrationInstruction,
) -> Result<Instruction, ProgramError> {
    let (config, _) = MigrationConfigPDA::derive(program_id);
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*owner, true),
            AccountMeta::new(config, false),
        ],
        data: instruction.pack()?,
    })
}

pub fn pause(program_id: &Pubkey, owner: &Pubkey) -> Result<Instruction, ProgramError> {
    owner_instruction(program_id, owner, MigrationInstruction::Pause)
}

pub fn unpause(program_id: &Pubkey, owner: &Pubkey) -> Result<Instruction, ProgramError> {
    owner_instruction(program_id, owner, MigrationInstruction::Unpause)
}

pub fn transfer_ownership(
    program_id: &Pubkey,
    owner: &Pubkey,
    new_owner: &Pubkey,
) -> Result<Instruction, ProgramError> {
    owner_instruction(
        program_id,
        owner,
        MigrationInstruction::TransferOwnership {
            new_owner: *new_owner,
        },
    )
}
