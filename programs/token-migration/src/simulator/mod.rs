//! In-memory host for running the migration engine off-chain.
//!
//! Token balances are plain `(mint, owner) -> amount` entries. A transfer hook
//! can be attached per mint; it runs after the value moved and before the
//! transfer returns, which is where a programmable token would call back into
//! the engine. `execute` wraps an operation the way a transaction does: on
//! error every change it made is rolled back.

use std::collections::HashMap;

use solana_program::{
    clock::UnixTimestamp,
    entrypoint::ProgramResult,
    program_error::ProgramError,
    pubkey::Pubkey,
};
use spl_token::error::TokenError;

use crate::{
    error::MigrationError,
    events::MigrationEvent,
    host::MigrationHost,
    state::{MigrationConfig, UserMigrationRecord},
};

/// A completed token movement, as seen by a transfer hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferNotice {
    pub mint: Pubkey,
    pub from: Pubkey,
    pub to: Pubkey,
    pub amount: u64,
}

pub type TransferHook = Box<dyn FnMut(&mut LedgerSimulator, &TransferNotice) -> ProgramResult>;

#[derive(Debug, Clone, Default)]
struct SimulatorState {
    config: Option<MigrationConfig>,
    records: HashMap<Pubkey, UserMigrationRecord>,
    balances: HashMap<(Pubkey, Pubkey), u64>,
    events: Vec<MigrationEvent>,
    now: UnixTimestamp,
}

pub struct LedgerSimulator {
    engine_id: Pubkey,
    state: SimulatorState,
    hooks: HashMap<Pubkey, TransferHook>,
}

impl LedgerSimulator {
    pub fn new(engine_id: Pubkey) -> Self {
        Self {
            engine_id,
            state: SimulatorState::default(),
            hooks: HashMap::new(),
        }
    }

    /// Write a config directly, bypassing `initialize`
    pub fn install_config(&mut self, config: MigrationConfig) {
        self.state.config = Some(config);
    }

    pub fn mint_to(&mut self, mint: &Pubkey, owner: &Pubkey, amount: u64) {
        *self.state.balances.entry((*mint, *owner)).or_insert(0) += amount;
    }

    pub fn balance(&self, mint: &Pubkey, owner: &Pubkey) -> u64 {
        self.state
            .balances
            .get(&(*mint, *owner))
            .copied()
            .unwrap_or(0)
    }

    /// Stored record, `None` until the user's first migration
    pub fn record(&self, user: &Pubkey) -> Option<&UserMigrationRecord> {
        self.state.records.get(user)
    }

    pub fn events(&self) -> &[MigrationEvent] {
        &self.state.events
    }

    pub fn now(&self) -> UnixTimestamp {
        self.state.now
    }

    pub fn set_time(&mut self, now: UnixTimestamp) {
        self.state.now = now;
    }

    pub fn advance_time(&mut self, seconds: i64) {
        self.state.now += seconds;
    }

    pub fn set_transfer_hook<F>(&mut self, mint: &Pubkey, hook: F)
    where
        F: FnMut(&mut LedgerSimulator, &TransferNotice) -> ProgramResult + 'static,
    {
        self.hooks.insert(*mint, Box::new(hook));
    }

    pub fn clear_transfer_hook(&mut self, mint: &Pubkey) {
        self.hooks.remove(mint);
    }

    /// Run `operation` atomically: state is restored if it fails
    pub fn execute<T, F>(&mut self, operation: F) -> Result<T, ProgramError>
    where
        F: FnOnce(&mut Self) -> Result<T, ProgramError>,
    {
        let snapshot = self.state.clone();
        let result = operation(self);
        if result.is_err() {
            self.state = snapshot;
        }
        result
    }

    fn move_tokens(
        &mut self,
        mint: &Pubkey,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> ProgramResult {
        let from_balance = self.balance(mint, from);
        if from_balance < amount {
            return Err(TokenError::InsufficientFunds.into());
        }
        if from != to {
            let to_balance = self
                .balance(mint, to)
                .checked_add(amount)
                .ok_or(TokenError::Overflow)?;
            self.state.balances.insert((*mint, *from), from_balance - amount);
            self.state.balances.insert((*mint, *to), to_balance);
        }

        // The hook is taken out while it runs so a nested transfer of the
        // same mint does not recurse into it.
        if let Some(mut hook) = self.hooks.remove(mint) {
            let notice = TransferNotice {
                mint: *mint,
                from: *from,
                to: *to,
                amount,
            };
            let outcome = hook(self, &notice);
            self.hooks.entry(*mint).or_insert(hook);
            outcome?;
        }

        Ok(())
    }
}

impl MigrationHost for LedgerSimulator {
    fn engine_id(&self) -> Pubkey {
        self.engine_id
    }

    fn now(&self) -> Result<UnixTimestamp, ProgramError> {
        Ok(self.state.now)
    }

    fn load_config(&self) -> Result<MigrationConfig, ProgramError> {
        let config = self
            .state
            .config
            .clone()
            .ok_or(MigrationError::NotInitialized)?;
        config.validate()?;
        Ok(config)
    }

    fn store_config(&mut self, config: &MigrationConfig) -> ProgramResult {
        self.state.config = Some(config.clone());
        Ok(())
    }

    fn load_record(&self, user: &Pubkey) -> Result<UserMigrationRecord, ProgramError> {
        Ok(self
            .state
            .records
            .get(user)
            .cloned()
            .unwrap_or_else(|| UserMigrationRecord::new(*user, 0)))
    }

    fn store_record(&mut self, user: &Pubkey, record: &UserMigrationRecord) -> ProgramResult {
        self.state.records.insert(*user, record.clone());
        Ok(())
    }

    fn balance_of(&self, mint: &Pubkey, owner: &Pubkey) -> Result<u64, ProgramError> {
        Ok(self.balance(mint, owner))
    }

    fn transfer(&mut self, mint: &Pubkey, to: &Pubkey, amount: u64) -> ProgramResult {
        let engine_id = self.engine_id;
        self.move_tokens(mint, &engine_id, to, amount)
    }

    fn transfer_from(
        &mut self,
        mint: &Pubkey,
        owner: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> ProgramResult {
        self.move_tokens(mint, owner, to, amount)
    }

    fn emit(&mut self, event: MigrationEvent) {
        self.state.events.push(event);
    }
}
