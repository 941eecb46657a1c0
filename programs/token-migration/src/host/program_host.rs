//! On-chain host: config and records live in program accounts, balances in SPL
//! token accounts, transfers are CPIs into the token program.

use solana_program::{
    account_info::AccountInfo,
    clock::{Clock, UnixTimestamp},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};
use spl_associated_token_account::get_associated_token_address;
use spl_token::{instruction as token_instruction, state::Account as TokenAccount};

use crate::{
    error::MigrationError,
    events::MigrationEvent,
    host::MigrationHost,
    pda::{seeds, verify_address, MigrationConfigPDA, UserMigrationPDA},
    state::{MigrationConfig, UserMigrationRecord},
};

pub struct ProgramHost<'a, 'info> {
    program_id: &'a Pubkey,
    config_info: &'a AccountInfo<'info>,
    config_bump: u8,
    authority_info: &'a AccountInfo<'info>,
    record_info: Option<&'a AccountInfo<'info>>,
    system_program: Option<&'a AccountInfo<'info>>,
    token_program: Option<&'a AccountInfo<'info>>,
    token_accounts: Vec<&'a AccountInfo<'info>>,
}

impl<'a, 'info> ProgramHost<'a, 'info> {
    /// `authority_info` is the signer the engine treats as caller
    pub fn new(
        program_id: &'a Pubkey,
        config_info: &'a AccountInfo<'info>,
        authority_info: &'a AccountInfo<'info>,
    ) -> Result<Self, ProgramError> {
        if !authority_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (config_key, config_bump) = MigrationConfigPDA::derive(program_id);
        verify_address(config_info, &config_key)?;

        Ok(Self {
            program_id,
            config_info,
            config_bump,
            authority_info,
            record_info: None,
            system_program: None,
            token_program: None,
            token_accounts: Vec::new(),
        })
    }

    pub fn with_record(
        mut self,
        record_info: &'a AccountInfo<'info>,
        system_program: &'a AccountInfo<'info>,
    ) -> Self {
        self.record_info = Some(record_info);
        self.system_program = Some(system_program);
        self
    }

    pub fn with_token_accounts(
        mut self,
        token_program: &'a AccountInfo<'info>,
        token_accounts: Vec<&'a AccountInfo<'info>>,
    ) -> Result<Self, ProgramError> {
        if *token_program.key != spl_token::id() {
            return Err(ProgramError::IncorrectProgramId);
        }
        self.token_program = Some(token_program);
        self.token_accounts = token_accounts;
        Ok(self)
    }

    fn token_program(&self) -> Result<&'a AccountInfo<'info>, ProgramError> {
        self.token_program.ok_or(ProgramError::NotEnoughAccountKeys)
    }

    fn record_account(&self, user: &Pubkey) -> Result<(&'a AccountInfo<'info>, u8), ProgramError> {
        let record_info = self.record_info.ok_or(ProgramError::NotEnoughAccountKeys)?;
        let (record_key, bump) = UserMigrationPDA::derive(self.program_id, user);
        verify_address(record_info, &record_key)?;
        Ok((record_info, bump))
    }

    /// Provided token account of `owner` for `mint`. Engine-owned accounts must
    /// be the canonical vault.
    fn token_account(
        &self,
        mint: &Pubkey,
        owner: &Pubkey,
    ) -> Result<(&'a AccountInfo<'info>, TokenAccount), ProgramError> {
        for info in &self.token_accounts {
            if *info.owner != spl_token::id() {
                continue;
            }
            let account = match TokenAccount::unpack(&info.data.borrow()) {
                Ok(account) => account,
                Err(_) => continue,
            };
            if account.mint != *mint || account.owner != *owner {
                continue;
            }
            if *owner == *self.config_info.key
                && *info.key != get_associated_token_address(owner, mint)
            {
                msg!("Engine token account {} is not the canonical vault", info.key);
                return Err(MigrationError::InvalidTokenAccount.into());
            }
            return Ok((*info, account));
        }

        msg!("No token account for mint {} owned by {}", mint, owner);
        Err(MigrationError::InvalidTokenAccount.into())
    }
}

impl<'a, 'info> MigrationHost for ProgramHost<'a, 'info> {
    fn engine_id(&self) -> Pubkey {
        *self.config_info.key
    }

    fn now(&self) -> Result<UnixTimestamp, ProgramError> {
        Ok(Clock::get()?.unix_timestamp)
    }

    fn load_config(&self) -> Result<MigrationConfig, ProgramError> {
        if self.config_info.owner != self.program_id {
            return Err(MigrationError::NotInitialized.into());
        }
        MigrationConfig::load(self.config_info)
    }

    fn store_config(&mut self, config: &MigrationConfig) -> ProgramResult {
        if self.config_info.owner != self.program_id {
            return Err(ProgramError::IncorrectProgramId);
        }
        config.save(self.config_info)
    }

    fn load_record(&self, user: &Pubkey) -> Result<UserMigrationRecord, ProgramError> {
        let (record_info, bump) = self.record_account(user)?;
        if record_info.data_is_empty() {
            return Ok(UserMigrationRecord::new(*user, bump));
        }
        if record_info.owner != self.program_id {
            return Err(ProgramError::IncorrectProgramId);
        }
        UserMigrationRecord::load(record_info)
    }

    fn store_record(&mut self, user: &Pubkey, record: &UserMigrationRecord) -> ProgramResult {
        let (record_info, bump) = self.record_account(user)?;

        if record_info.data_is_empty() {
            let system_program = self
                .system_program
                .ok_or(ProgramError::NotEnoughAccountKeys)?;
            create_pda_account(
                self.authority_info,
                record_info,
                system_program,
                self.program_id,
                UserMigrationRecord::LEN,
                &[seeds::USER_MIGRATION, user.as_ref(), &[bump]],
            )?;
            msg!("Created migration record for {}", user);
        }

        record.save(record_info)
    }

    fn balance_of(&self, mint: &Pubkey, owner: &Pubkey) -> Result<u64, ProgramError> {
        let (_, account) = self.token_account(mint, owner)?;
        Ok(account.amount)
    }

    fn transfer(&mut self, mint: &Pubkey, to: &Pubkey, amount: u64) -> ProgramResult {
        let engine_id = self.engine_id();
        let (source, _) = self.token_account(mint, &engine_id)?;
        let (destination, _) = self.token_account(mint, to)?;
        let token_program = self.token_program()?;

        invoke_signed(
            &token_instruction::transfer(
                token_program.key,
                source.key,
                destination.key,
                self.config_info.key,
                &[],
                amount,
            )?,
            &[
                source.clone(),
                destination.clone(),
                self.config_info.clone(),
                token_program.clone(),
            ],
            &[&[seeds::MIGRATION_CONFIG, &[self.config_bump]]],
        )
    }

    fn transfer_from(
        &mut self,
        mint: &Pubkey,
        owner: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> ProgramResult {
        if owner != self.authority_info.key || !self.authority_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (source, _) = self.token_account(mint, owner)?;
        let (destination, _) = self.token_account(mint, to)?;
        let token_program = self.token_program()?;

        invoke(
            &token_instruction::transfer(
                token_program.key,
                source.key,
                destination.key,
                owner,
                &[],
                amount,
            )?,
            &[
                source.clone(),
                destination.clone(),
                self.authority_info.clone(),
                token_program.clone(),
            ],
        )
    }

    fn emit(&mut self, event: MigrationEvent) {
        event.emit();
    }
}

/// Create a program-owned PDA account, tolerating lamports pre-sent to the
/// address.
pub fn create_pda_account<'info>(
    payer: &AccountInfo<'info>,
    new_account: &AccountInfo<'info>,
    system_program: &AccountInfo<'info>,
    program_id: &Pubkey,
    space: usize,
    signer_seeds: &[&[u8]],
) -> ProgramResult {
    let rent = Rent::get()?;
    let required_lamports = rent.minimum_balance(space);
    let current_lamports = new_account.lamports();

    if current_lamports == 0 {
        return invoke_signed(
            &system_instruction::create_account(
                payer.key,
                new_account.key,
                required_lamports,
                space as u64,
                program_id,
            ),
            &[payer.clone(), new_account.clone(), system_program.clone()],
            &[signer_seeds],
        );
    }

    let top_up = required_lamports.saturating_sub(current_lamports);
    if top_up > 0 {
        invoke(
            &system_instruction::transfer(payer.key, new_account.key, top_up),
            &[payer.clone(), new_account.clone(), system_program.clone()],
        )?;
    }
    invoke_signed(
        &system_instruction::allocate(new_account.key, space as u64),
        &[new_account.clone(), system_program.clone()],
        &[signer_seeds],
    )?;
    invoke_signed(
        &system_instruction::assign(new_account.key, program_id),
        &[new_account.clone(), system_program.clone()],
        &[signer_seeds],
    )
}
