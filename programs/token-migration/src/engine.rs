use solana_program::{
    clock::UnixTimestamp,
    entrypoint::ProgramResult,
    msg,
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::{
    constants::MAX_PER_MIGRATION,
    error::MigrationError,
    events::{self, MigrationEvent},
    host::MigrationHost,
    security::with_reentrancy_guard,
    state::{MigrationConfig, UserMigrationRecord},
};

/// Migration state machine.
///
/// Every operation loads what it needs from the host, validates, and only then
/// moves tokens. Migrations follow pull -> record -> push: the caller's record is
/// persisted after the legacy tokens arrive and before the successor tokens
/// leave the reserve.
pub struct MigrationEngine;

impl MigrationEngine {
    /// Create the configuration. The engine starts paused.
    pub fn initialize<H: MigrationHost + ?Sized>(
        host: &mut H,
        owner: &Pubkey,
        source_mint: &Pubkey,
        target_mint: &Pubkey,
        treasury: &Pubkey,
        bump: u8,
    ) -> ProgramResult {
        if host.load_config().is_ok() {
            return Err(MigrationError::AlreadyInitialized.into());
        }

        let config = MigrationConfig::new(*owner, *source_mint, *target_mint, *treasury, bump);
        host.store_config(&config)?;

        host.emit(MigrationEvent::Initialized(events::Initialized {
            owner: *owner,
            source_mint: *source_mint,
            target_mint: *target_mint,
            treasury: *treasury,
        }));

        msg!("Migration engine initialized, owner: {}", owner);
        Ok(())
    }

    /// Migrate `amount` legacy tokens into successor tokens, 1:1
    pub fn migrate<H: MigrationHost + ?Sized>(
        host: &mut H,
        caller: &Pubkey,
        amount: u64,
    ) -> Result<UserMigrationRecord, ProgramError> {
        with_reentrancy_guard(host, |host, config| {
            if config.is_paused {
                return Err(MigrationError::Paused.into());
            }
            if amount == 0 {
                return Err(MigrationError::AmountCannotBeZero.into());
            }
            if amount > MAX_PER_MIGRATION {
                return Err(MigrationError::ExceedsMaxMigrationLimit.into());
            }

            let engine_id = host.engine_id();
            Self::ensure_balance(host, config, &config.source_mint, caller, amount)?;
            Self::ensure_balance(host, config, &config.target_mint, &engine_id, amount)?;

            let now = host.now()?;
            Self::ensure_not_cooling_down(host, caller, now)?;

            Self::execute_migration(host, config, caller, amount, now)
        })
    }

    /// Migrate the caller's whole legacy balance. The per-call cap does not apply.
    pub fn migrate_all<H: MigrationHost + ?Sized>(
        host: &mut H,
        caller: &Pubkey,
    ) -> Result<UserMigrationRecord, ProgramError> {
        with_reentrancy_guard(host, |host, config| {
            if config.is_paused {
                return Err(MigrationError::Paused.into());
            }

            let now = host.now()?;
            Self::ensure_not_cooling_down(host, caller, now)?;

            let amount = Self::checked_balance(host, config, &config.source_mint, caller)?;
            if amount == 0 {
                return Err(MigrationError::InsufficientBalance.into());
            }

            let engine_id = host.engine_id();
            Self::ensure_balance(host, config, &config.target_mint, &engine_id, amount)?;

            Self::execute_migration(host, config, caller, amount, now)
        })
    }

    /// Deposit successor tokens into the reserve. Open to anyone.
    pub fn feed_reserve<H: MigrationHost + ?Sized>(
        host: &mut H,
        caller: &Pubkey,
        amount: u64,
    ) -> ProgramResult {
        with_reentrancy_guard(host, |host, config| {
            if config.is_paused {
                return Err(MigrationError::Paused.into());
            }
            if amount == 0 {
                return Err(MigrationError::AmountCannotBeZero.into());
            }
            // Deposits share the per-migration ceiling
            if amount > MAX_PER_MIGRATION {
                return Err(MigrationError::ExceedsMaxMigrationLimit.into());
            }

            Self::ensure_balance(host, config, &config.target_mint, caller, amount)?;

            let engine_id = host.engine_id();
            host.transfer_from(&config.target_mint, caller, &engine_id, amount)?;

            host.emit(MigrationEvent::ReserveFed(events::ReserveFed {
                depositor: *caller,
                amount,
            }));

            msg!("Reserve fed by {}: {} units", caller, amount);
            Ok(())
        })
    }

    /// Sweep every collected legacy token to the treasury. Owner only.
    pub fn withdraw<H: MigrationHost + ?Sized>(
        host: &mut H,
        caller: &Pubkey,
    ) -> Result<u64, ProgramError> {
        with_reentrancy_guard(host, |host, config| {
            if !config.is_owner(caller) {
                return Err(MigrationError::NotOwner.into());
            }

            let engine_id = host.engine_id();
            let amount = Self::checked_balance(host, config, &config.source_mint, &engine_id)?;
            if amount == 0 {
                return Err(MigrationError::InsufficientBalance.into());
            }

            host.transfer(&config.source_mint, &config.treasury, amount)?;

            host.emit(MigrationEvent::Withdrawn(events::Withdrawn {
                treasury: config.treasury,
                amount,
            }));

            msg!("Withdrew {} legacy units to treasury {}", amount, config.treasury);
            Ok(amount)
        })
    }

    /// Reject migrations and deposits. Repeating the call is not an error.
    pub fn pause<H: MigrationHost + ?Sized>(host: &mut H, caller: &Pubkey) -> ProgramResult {
        Self::set_paused(host, caller, true)
    }

    pub fn unpause<H: MigrationHost + ?Sized>(host: &mut H, caller: &Pubkey) -> ProgramResult {
        Self::set_paused(host, caller, false)
    }

    pub fn transfer_ownership<H: MigrationHost + ?Sized>(
        host: &mut H,
        caller: &Pubkey,
        new_owner: &Pubkey,
    ) -> ProgramResult {
        let mut config = host.load_config()?;
        if !config.is_owner(caller) {
            return Err(MigrationError::NotOwner.into());
        }
        if *new_owner == Pubkey::default() {
            return Err(MigrationError::InvalidNewOwner.into());
        }

        let previous_owner = config.owner;
        config.owner = *new_owner;
        host.store_config(&config)?;

        host.emit(MigrationEvent::OwnershipTransferred(events::OwnershipTransferred {
            previous_owner,
            new_owner: *new_owner,
        }));

        msg!("Ownership transferred from {} to {}", previous_owner, new_owner);
        Ok(())
    }

    /// Successor tokens currently available for migration
    pub fn reserve<H: MigrationHost + ?Sized>(host: &H) -> Result<u64, ProgramError> {
        let config = host.load_config()?;
        let engine_id = host.engine_id();
        Self::checked_balance(host, &config, &config.target_mint, &engine_id)
    }

    fn set_paused<H: MigrationHost + ?Sized>(
        host: &mut H,
        caller: &Pubkey,
        paused: bool,
    ) -> ProgramResult {
        let mut config = host.load_config()?;
        if !config.is_owner(caller) {
            return Err(MigrationError::NotOwner.into());
        }

        config.is_paused = paused;
        host.store_config(&config)?;

        let event = if paused {
            MigrationEvent::Paused(events::Paused { account: *caller })
        } else {
            MigrationEvent::Unpaused(events::Unpaused { account: *caller })
        };
        host.emit(event);

        msg!("Migration {}", if paused { "PAUSED" } else { "unpaused" });
        Ok(())
    }

    /// Pull, record, push. Callers have validated amount, balances and cooldown.
    fn execute_migration<H: MigrationHost + ?Sized>(
        host: &mut H,
        config: &MigrationConfig,
        caller: &Pubkey,
        amount: u64,
        now: UnixTimestamp,
    ) -> Result<UserMigrationRecord, ProgramError> {
        let engine_id = host.engine_id();

        host.transfer_from(&config.source_mint, caller, &engine_id, amount)?;

        let mut record = host.load_record(caller)?;
        record.record_migration(amount, now)?;
        host.store_record(caller, &record)?;

        host.transfer(&config.target_mint, caller, amount)?;

        host.emit(MigrationEvent::Migrated(events::Migrated {
            user: *caller,
            total_migrated: record.total_migrated,
            last_migration_amount: record.last_migration_amount,
            last_migration_timestamp: record.last_migration_timestamp,
        }));

        msg!(
            "Migrated {} units for {}, total: {}",
            amount,
            caller,
            record.total_migrated
        );
        Ok(record)
    }

    fn ensure_not_cooling_down<H: MigrationHost + ?Sized>(
        host: &H,
        caller: &Pubkey,
        now: UnixTimestamp,
    ) -> ProgramResult {
        let record = host.load_record(caller)?;
        if record.is_cooling_down(now) {
            msg!(
                "Max migration at {} still cooling down at {}",
                record.last_migration_timestamp,
                now
            );
            return Err(MigrationError::NotAllowedForOneDay.into());
        }
        Ok(())
    }

    fn ensure_balance<H: MigrationHost + ?Sized>(
        host: &H,
        config: &MigrationConfig,
        mint: &Pubkey,
        holder: &Pubkey,
        amount: u64,
    ) -> ProgramResult {
        let balance = Self::checked_balance(host, config, mint, holder)?;
        if balance < amount {
            msg!("Insufficient balance: have {}, need {}", balance, amount);
            return Err(MigrationError::InsufficientBalance.into());
        }
        Ok(())
    }

    /// Balance read restricted to the two configured mints
    fn checked_balance<H: MigrationHost + ?Sized>(
        host: &H,
        config: &MigrationConfig,
        mint: &Pubkey,
        holder: &Pubkey,
    ) -> Result<u64, ProgramError> {
        if !config.is_configured_mint(mint) {
            return Err(MigrationError::InvalidTokenAddress.into());
        }
        host.balance_of(mint, holder)
    }
}
