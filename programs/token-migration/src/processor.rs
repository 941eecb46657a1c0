use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::{
    engine::MigrationEngine,
    error::MigrationError,
    host::{create_pda_account, ProgramHost},
    instructions::MigrationInstruction,
    pda::{seeds, verify_address, MigrationConfigPDA},
    state::MigrationConfig,
};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = MigrationInstruction::unpack(instruction_data)?;

    match instruction {
        MigrationInstruction::Initialize {
            source_mint,
            target_mint,
            treasury,
        } => {
            msg!("Instruction: Initialize");
            process_initialize(program_id, accounts, source_mint, target_mint, treasury)
        }

        MigrationInstruction::Migrate { amount } => {
            msg!("Instruction: Migrate");
            process_migrate(program_id, accounts, Some(amount))
        }

        MigrationInstruction::MigrateAll => {
            msg!("Instruction: MigrateAll");
            process_migrate(program_id, accounts, None)
        }

        MigrationInstruction::FeedReserve { amount } => {
            msg!("Instruction: FeedReserve");
            process_feed_reserve(program_id, accounts, amount)
        }

        MigrationInstruction::Withdraw => {
            msg!("Instruction: Withdraw");
            process_withdraw(program_id, accounts)
        }

        MigrationInstruction::Pause => {
            msg!("Instruction: Pause");
            process_owner_action(program_id, accounts, OwnerAction::Pause)
        }

        MigrationInstruction::Unpause => {
            msg!("Instruction: Unpause");
            process_owner_action(program_id, accounts, OwnerAction::Unpause)
        }

        MigrationInstruction::TransferOwnership { new_owner } => {
            msg!("Instruction: TransferOwnership");
            process_owner_action(
                program_id,
                accounts,
                OwnerAction::TransferOwnership(new_owner),
            )
        }
    }
}

/// Create the config PDA and hand it to the engine
fn process_initialize(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    source_mint: Pubkey,
    target_mint: Pubkey,
    treasury: Pubkey,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let owner_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;

    // Verify owner is signer
    if !owner_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let (config_key, config_bump) = MigrationConfigPDA::derive(program_id);
    verify_address(config_info, &config_key)?;

    if !config_info.data_is_empty() {
        return Err(MigrationError::AlreadyInitialized.into());
    }

    create_pda_account(
        owner_info,
        config_info,
        system_program,
        program_id,
        MigrationConfig::LEN,
        &[seeds::MIGRATION_CONFIG, &[config_bump]],
    )?;

    let mut host = ProgramHost::new(program_id, config_info, owner_info)?;
    MigrationEngine::initialize(
        &mut host,
        owner_info.key,
        &source_mint,
        &target_mint,
        &treasury,
        config_bump,
    )
}

/// `amount` of `None` migrates the whole source balance
fn process_migrate(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    amount: Option<u64>,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let user_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let record_info = next_account_info(account_info_iter)?;
    let user_source_info = next_account_info(account_info_iter)?;
    let user_target_info = next_account_info(account_info_iter)?;
    let source_vault_info = next_account_info(account_info_iter)?;
    let target_vault_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;

    let mut host = ProgramHost::new(program_id, config_info, user_info)?
        .with_record(record_info, system_program)
        .with_token_accounts(
            token_program,
            vec![
                user_source_info,
                user_target_info,
                source_vault_info,
                target_vault_info,
            ],
        )?;

    let record = match amount {
        Some(amount) => MigrationEngine::migrate(&mut host, user_info.key, amount)?,
        None => MigrationEngine::migrate_all(&mut host, user_info.key)?,
    };

    msg!(
        "Migration record - total: {}, last amount: {}, at: {}",
        record.total_migrated,
        record.last_migration_amount,
        record.last_migration_timestamp
    );

    Ok(())
}

fn process_feed_reserve(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    amount: u64,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let depositor_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let depositor_target_info = next_account_info(account_info_iter)?;
    let target_vault_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;

    let mut host = ProgramHost::new(program_id, config_info, depositor_info)?
        .with_token_accounts(token_program, vec![depositor_target_info, target_vault_info])?;

    MigrationEngine::feed_reserve(&mut host, depositor_info.key, amount)
}

fn process_withdraw(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let owner_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let source_vault_info = next_account_info(account_info_iter)?;
    let treasury_source_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;

    let mut host = ProgramHost::new(program_id, config_info, owner_info)?
        .with_token_accounts(token_program, vec![source_vault_info, treasury_source_info])?;

    let amount = MigrationEngine::withdraw(&mut host, owner_info.key)?;
    msg!("Treasury sweep complete: {} units", amount);

    Ok(())
}

enum OwnerAction {
    Pause,
    Unpause,
    TransferOwnership(Pubkey),
}

fn process_owner_action(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    action: OwnerAction,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let owner_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;

    let mut host = ProgramHost::new(program_id, config_info, owner_info)?;

    match action {
        OwnerAction::Pause => MigrationEngine::pause(&mut host, owner_info.key),
        OwnerAction::Unpause => MigrationEngine::unpause(&mut host, owner_info.key),
        OwnerAction::TransferOwnership(new_owner) => {
            MigrationEngine::transfer_ownership(&mut host, owner_info.key, &new_owner)
        }
    }
}
