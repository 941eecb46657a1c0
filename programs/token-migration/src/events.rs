//! Event logging for the migration program
//!
//! Events are borsh-encoded and written to the program log so indexers can
//! follow migrations without reading account state.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    msg,
    pubkey::Pubkey,
};

pub const EVENT_LOG_PREFIX: &str = "TOKEN_MIGRATION_EVENT";

/// Event type discriminator
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Initialized = 1,
    Migrated = 2,
    ReserveFed = 3,
    Withdrawn = 4,
    Paused = 5,
    Unpaused = 6,
    OwnershipTransferred = 7,
}

pub trait Event: BorshSerialize {
    fn event_type() -> EventType;

    fn emit(&self) {
        msg!("{}", EVENT_LOG_PREFIX);
        msg!("TYPE:{:?}", Self::event_type());

        if let Ok(data) = self.try_to_vec() {
            msg!("DATA:{}", bs58::encode(&data).into_string());
        }
    }
}

macro_rules! define_event {
    ($name:ident { $($field:ident: $type:ty),* $(,)? }) => {
        #[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            $(pub $field: $type,)*
        }

        impl Event for $name {
            fn event_type() -> EventType {
                EventType::$name
            }
        }
    };
}

define_event!(Initialized {
    owner: Pubkey,
    source_mint: Pubkey,
    target_mint: Pubkey,
    treasury: Pubkey,
});

define_event!(Migrated {
    user: Pubkey,
    total_migrated: u64,
    last_migration_amount: u64,
    last_migration_timestamp: UnixTimestamp,
});

define_event!(ReserveFed {
    depositor: Pubkey,
    amount: u64,
});

define_event!(Withdrawn {
    treasury: Pubkey,
    amount: u64,
});

define_event!(Paused {
    account: Pubkey,
});

define_event!(Unpaused {
    account: Pubkey,
});

define_event!(OwnershipTransferred {
    previous_owner: Pubkey,
    new_owner: Pubkey,
});

/// Every event the engine can raise, handed to the host's event sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationEvent {
    Initialized(Initialized),
    Migrated(Migrated),
    ReserveFed(ReserveFed),
    Withdrawn(Withdrawn),
    Paused(Paused),
    Unpaused(Unpaused),
    OwnershipTransferred(OwnershipTransferred),
}

impl MigrationEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            MigrationEvent::Initialized(_) => Initialized::event_type(),
            MigrationEvent::Migrated(_) => Migrated::event_type(),
            MigrationEvent::ReserveFed(_) => ReserveFed::event_type(),
            MigrationEvent::Withdrawn(_) => Withdrawn::event_type(),
            MigrationEvent::Paused(_) => Paused::event_type(),
            MigrationEvent::Unpaused(_) => Unpaused::event_type(),
            MigrationEvent::OwnershipTransferred(_) => OwnershipTransferred::event_type(),
        }
    }

    /// Write the event to the program log
    pub fn emit(&self) {
        match self {
            MigrationEvent::Initialized(event) => event.emit(),
            MigrationEvent::Migrated(event) => event.emit(),
            MigrationEvent::ReserveFed(event) => event.emit(),
            MigrationEvent::Withdrawn(event) => event.emit(),
            MigrationEvent::Paused(event) => event.emit(),
            MigrationEvent::Unpaused(event) => event.emit(),
            MigrationEvent::OwnershipTransferred(event) => event.emit(),
        }
    }
}

/// Decode the `DATA:` payload of a logged event
pub fn decode_event_data<T: BorshDeserialize>(encoded: &str) -> Option<T> {
    let bytes = bs58::decode(encoded).into_vec().ok()?;
    T::try_from_slice(&bytes).ok()
}
