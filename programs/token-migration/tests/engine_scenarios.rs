use std::{cell::RefCell, rc::Rc};

use solana_program::{program_error::ProgramError, pubkey::Pubkey};
use token_migration::{
    constants::{COOLDOWN_PERIOD, MAX_PER_MIGRATION, ONE_TOKEN},
    engine::MigrationEngine,
    error::MigrationError,
    events::{self, MigrationEvent},
    host::MigrationHost,
    security::ReentrancyState,
    simulator::LedgerSimulator,
    state::UserMigrationRecord,
};

const START_TIME: i64 = 1_700_000_000;

struct Setup {
    sim: LedgerSimulator,
    engine: Pubkey,
    owner: Pubkey,
    treasury: Pubkey,
    source: Pubkey,
    target: Pubkey,
}

impl Setup {
    /// Freshly initialized engine, still paused
    fn new() -> Self {
        let engine = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let treasury = Pubkey::new_unique();
        let source = Pubkey::new_unique();
        let target = Pubkey::new_unique();

        let mut sim = LedgerSimulator::new(engine);
        sim.set_time(START_TIME);
        MigrationEngine::initialize(&mut sim, &owner, &source, &target, &treasury, 255).unwrap();

        Self {
            sim,
            engine,
            owner,
            treasury,
            source,
            target,
        }
    }

    /// Unpaused engine with `reserve` target tokens in the vault
    fn open(reserve: u64) -> Self {
        let mut setup = Self::new();
        let owner = setup.owner;
        MigrationEngine::unpause(&mut setup.sim, &owner).unwrap();
        setup.sim.mint_to(&setup.target, &setup.engine, reserve);
        setup
    }

    fn user_with(&mut self, source_amount: u64) -> Pubkey {
        let user = Pubkey::new_unique();
        self.sim.mint_to(&self.source, &user, source_amount);
        user
    }

    fn migrate(&mut self, user: &Pubkey, amount: u64) -> Result<UserMigrationRecord, ProgramError> {
        self.sim
            .execute(|sim| MigrationEngine::migrate(sim, user, amount))
    }

    fn migrate_all(&mut self, user: &Pubkey) -> Result<UserMigrationRecord, ProgramError> {
        self.sim.execute(|sim| MigrationEngine::migrate_all(sim, user))
    }

    fn reserve(&self) -> u64 {
        self.sim.balance(&self.target, &self.engine)
    }
}

#[test]
fn test_fresh_deploy_is_paused() {
    let mut setup = Setup::new();
    let user = setup.user_with(ONE_TOKEN);
    setup.sim.mint_to(&setup.target, &setup.engine, ONE_TOKEN);

    assert_eq!(
        setup.migrate(&user, ONE_TOKEN),
        Err(MigrationError::Paused.into())
    );
    assert_eq!(setup.migrate_all(&user), Err(MigrationError::Paused.into()));

    let stranger = Pubkey::new_unique();
    assert_eq!(
        setup.sim.execute(|sim| MigrationEngine::withdraw(sim, &stranger)),
        Err(MigrationError::NotOwner.into())
    );
    assert_eq!(
        MigrationEngine::unpause(&mut setup.sim, &stranger),
        Err(MigrationError::NotOwner.into())
    );
}

#[test]
fn test_single_unit_migration() {
    let mut setup = Setup::open(ONE_TOKEN);
    let user = setup.user_with(ONE_TOKEN);

    let record = setup.migrate(&user, ONE_TOKEN).unwrap();

    assert_eq!(setup.sim.balance(&setup.source, &user), 0);
    assert_eq!(setup.sim.balance(&setup.target, &user), ONE_TOKEN);
    assert_eq!(setup.sim.balance(&setup.source, &setup.engine), ONE_TOKEN);
    assert_eq!(setup.reserve(), 0);

    assert_eq!(record.total_migrated, ONE_TOKEN);
    assert_eq!(record.last_migration_amount, ONE_TOKEN);
    assert_eq!(record.last_migration_timestamp, START_TIME);
    assert_eq!(setup.sim.record(&user), Some(&record));

    assert_eq!(
        setup.sim.events().last(),
        Some(&MigrationEvent::Migrated(events::Migrated {
            user,
            total_migrated: ONE_TOKEN,
            last_migration_amount: ONE_TOKEN,
            last_migration_timestamp: START_TIME,
        }))
    );
}

#[test]
fn test_migration_conserves_balances() {
    let mut setup = Setup::open(50 * ONE_TOKEN);
    let user = setup.user_with(20 * ONE_TOKEN);

    for amount in [ONE_TOKEN, 3 * ONE_TOKEN, 7 * ONE_TOKEN] {
        let reserve_before = setup.reserve();
        let user_source_before = setup.sim.balance(&setup.source, &user);
        let user_target_before = setup.sim.balance(&setup.target, &user);
        let engine_source_before = setup.sim.balance(&setup.source, &setup.engine);

        setup.migrate(&user, amount).unwrap();

        assert_eq!(setup.reserve(), reserve_before - amount);
        assert_eq!(setup.sim.balance(&setup.source, &user), user_source_before - amount);
        assert_eq!(setup.sim.balance(&setup.target, &user), user_target_before + amount);
        assert_eq!(
            setup.sim.balance(&setup.source, &setup.engine),
            engine_source_before + amount
        );
    }

    let record = setup.sim.record(&user).unwrap();
    assert_eq!(record.total_migrated, 11 * ONE_TOKEN);
    assert_eq!(record.last_migration_amount, 7 * ONE_TOKEN);
}

#[test]
fn test_total_migrated_sums_migrate_and_migrate_all() {
    let mut setup = Setup::open(100 * ONE_TOKEN);
    let user = setup.user_with(10 * ONE_TOKEN);

    setup.migrate(&user, 4 * ONE_TOKEN).unwrap();
    setup.sim.advance_time(60);
    let record = setup.migrate_all(&user).unwrap();

    assert_eq!(record.total_migrated, 10 * ONE_TOKEN);
    assert_eq!(record.last_migration_amount, 6 * ONE_TOKEN);
    assert_eq!(record.last_migration_timestamp, START_TIME + 60);
    assert_eq!(setup.sim.balance(&setup.source, &user), 0);
}

#[test]
fn test_max_migration_boundary() {
    let mut setup = Setup::open(2 * MAX_PER_MIGRATION);
    let user = setup.user_with(2 * MAX_PER_MIGRATION);

    assert_eq!(
        setup.migrate(&user, MAX_PER_MIGRATION + 1),
        Err(MigrationError::ExceedsMaxMigrationLimit.into())
    );
    assert!(setup.sim.record(&user).is_none());

    setup.migrate(&user, MAX_PER_MIGRATION).unwrap();
    assert_eq!(setup.sim.balance(&setup.target, &user), MAX_PER_MIGRATION);
}

#[test]
fn test_zero_amount_rejected() {
    let mut setup = Setup::open(ONE_TOKEN);
    let user = setup.user_with(ONE_TOKEN);

    assert_eq!(
        setup.migrate(&user, 0),
        Err(MigrationError::AmountCannotBeZero.into())
    );
}

#[test]
fn test_cooldown_after_max_migration() {
    let mut setup = Setup::open(3 * MAX_PER_MIGRATION);
    let user = setup.user_with(3 * MAX_PER_MIGRATION);

    setup.migrate(&user, MAX_PER_MIGRATION).unwrap();

    setup.sim.advance_time(COOLDOWN_PERIOD - 1);
    assert_eq!(
        setup.migrate(&user, ONE_TOKEN),
        Err(MigrationError::NotAllowedForOneDay.into())
    );
    assert_eq!(
        setup.migrate_all(&user),
        Err(MigrationError::NotAllowedForOneDay.into())
    );

    setup.sim.advance_time(1);
    let record = setup.migrate(&user, ONE_TOKEN).unwrap();
    assert_eq!(record.total_migrated, MAX_PER_MIGRATION + ONE_TOKEN);
}

#[test]
fn test_below_cap_migrations_never_cool_down() {
    let mut setup = Setup::open(3 * MAX_PER_MIGRATION);
    let user = setup.user_with(3 * MAX_PER_MIGRATION);

    setup.migrate(&user, MAX_PER_MIGRATION - 1).unwrap();
    setup.migrate(&user, MAX_PER_MIGRATION - 1).unwrap();
    // Back to back, same timestamp: only the cap triggers the window
    setup.migrate(&user, MAX_PER_MIGRATION).unwrap();
    assert_eq!(
        setup.migrate(&user, 1),
        Err(MigrationError::NotAllowedForOneDay.into())
    );
}

#[test]
fn test_cooldown_is_per_account() {
    let mut setup = Setup::open(2 * MAX_PER_MIGRATION);
    let alice = setup.user_with(MAX_PER_MIGRATION);
    let bob = setup.user_with(MAX_PER_MIGRATION);

    setup.migrate(&alice, MAX_PER_MIGRATION).unwrap();
    setup.migrate(&bob, MAX_PER_MIGRATION).unwrap();
}

#[test]
fn test_migrate_all_bypasses_per_call_cap() {
    let mut setup = Setup::open(3 * MAX_PER_MIGRATION);
    let user = setup.user_with(3 * MAX_PER_MIGRATION);

    let record = setup.migrate_all(&user).unwrap();
    assert_eq!(record.last_migration_amount, 3 * MAX_PER_MIGRATION);
    assert_eq!(setup.sim.balance(&setup.target, &user), 3 * MAX_PER_MIGRATION);

    // Above the cap is not equal to the cap, so no cooldown follows
    setup.sim.mint_to(&setup.source, &user, ONE_TOKEN);
    setup.sim.mint_to(&setup.target, &setup.engine, ONE_TOKEN);
    setup.migrate(&user, ONE_TOKEN).unwrap();
}

#[test]
fn test_migrate_all_with_short_reserve_leaves_state_unchanged() {
    let mut setup = Setup::open(ONE_TOKEN / 2);
    let user = setup.user_with(ONE_TOKEN);
    let events_before = setup.sim.events().len();

    assert_eq!(
        setup.migrate_all(&user),
        Err(MigrationError::InsufficientBalance.into())
    );

    assert_eq!(setup.sim.balance(&setup.source, &user), ONE_TOKEN);
    assert_eq!(setup.sim.balance(&setup.target, &user), 0);
    assert_eq!(setup.reserve(), ONE_TOKEN / 2);
    assert!(setup.sim.record(&user).is_none());
    assert_eq!(setup.sim.events().len(), events_before);
}

#[test]
fn test_migrate_all_with_empty_balance() {
    let mut setup = Setup::open(ONE_TOKEN);
    let user = Pubkey::new_unique();

    assert_eq!(
        setup.migrate_all(&user),
        Err(MigrationError::InsufficientBalance.into())
    );
}

#[test]
fn test_insufficient_user_balance_and_reserve() {
    let mut setup = Setup::open(ONE_TOKEN);
    let poor = setup.user_with(ONE_TOKEN / 2);
    let rich = setup.user_with(2 * ONE_TOKEN);

    assert_eq!(
        setup.migrate(&poor, ONE_TOKEN),
        Err(MigrationError::InsufficientBalance.into())
    );
    assert_eq!(
        setup.migrate(&rich, 2 * ONE_TOKEN),
        Err(MigrationError::InsufficientBalance.into())
    );
    assert_eq!(setup.reserve(), ONE_TOKEN);
}

#[test]
fn test_pause_unpause_toggle() {
    let mut setup = Setup::open(2 * ONE_TOKEN);
    let owner = setup.owner;
    let user = setup.user_with(2 * ONE_TOKEN);

    MigrationEngine::pause(&mut setup.sim, &owner).unwrap();
    // Repeating is accepted
    MigrationEngine::pause(&mut setup.sim, &owner).unwrap();
    assert_eq!(
        setup.migrate(&user, ONE_TOKEN),
        Err(MigrationError::Paused.into())
    );

    MigrationEngine::unpause(&mut setup.sim, &owner).unwrap();
    MigrationEngine::unpause(&mut setup.sim, &owner).unwrap();
    assert!(!setup.sim.load_config().unwrap().is_paused);
    setup.migrate(&user, ONE_TOKEN).unwrap();

    assert!(setup
        .sim
        .events()
        .contains(&MigrationEvent::Paused(events::Paused { account: owner })));
    assert!(setup
        .sim
        .events()
        .contains(&MigrationEvent::Unpaused(events::Unpaused { account: owner })));
}

#[test]
fn test_feed_reserve() {
    let mut setup = Setup::open(0);
    let funder = Pubkey::new_unique();
    setup.sim.mint_to(&setup.target, &funder, 2 * MAX_PER_MIGRATION);

    setup
        .sim
        .execute(|sim| MigrationEngine::feed_reserve(sim, &funder, 5 * ONE_TOKEN))
        .unwrap();
    assert_eq!(setup.reserve(), 5 * ONE_TOKEN);
    assert_eq!(
        setup.sim.events().last(),
        Some(&MigrationEvent::ReserveFed(events::ReserveFed {
            depositor: funder,
            amount: 5 * ONE_TOKEN,
        }))
    );

    assert_eq!(
        setup.sim.execute(|sim| MigrationEngine::feed_reserve(sim, &funder, 0)),
        Err(MigrationError::AmountCannotBeZero.into())
    );
    assert_eq!(
        setup
            .sim
            .execute(|sim| MigrationEngine::feed_reserve(sim, &funder, MAX_PER_MIGRATION + 1)),
        Err(MigrationError::ExceedsMaxMigrationLimit.into())
    );

    let broke = Pubkey::new_unique();
    assert_eq!(
        setup.sim.execute(|sim| MigrationEngine::feed_reserve(sim, &broke, ONE_TOKEN)),
        Err(MigrationError::InsufficientBalance.into())
    );
    assert_eq!(setup.reserve(), 5 * ONE_TOKEN);
}

#[test]
fn test_feed_reserve_rejected_while_paused() {
    let mut setup = Setup::new();
    let funder = Pubkey::new_unique();
    setup.sim.mint_to(&setup.target, &funder, ONE_TOKEN);

    assert_eq!(
        setup.sim.execute(|sim| MigrationEngine::feed_reserve(sim, &funder, ONE_TOKEN)),
        Err(MigrationError::Paused.into())
    );
}

#[test]
fn test_withdraw_sweeps_to_treasury() {
    let mut setup = Setup::new();
    let owner = setup.owner;
    setup.sim.mint_to(&setup.source, &setup.engine, ONE_TOKEN);

    // Administrative operations work while paused
    let amount = setup
        .sim
        .execute(|sim| MigrationEngine::withdraw(sim, &owner))
        .unwrap();

    assert_eq!(amount, ONE_TOKEN);
    assert_eq!(setup.sim.balance(&setup.source, &setup.treasury), ONE_TOKEN);
    assert_eq!(setup.sim.balance(&setup.source, &setup.engine), 0);
    assert_eq!(
        setup.sim.events().last(),
        Some(&MigrationEvent::Withdrawn(events::Withdrawn {
            treasury: setup.treasury,
            amount: ONE_TOKEN,
        }))
    );

    assert_eq!(
        setup.sim.execute(|sim| MigrationEngine::withdraw(sim, &owner)),
        Err(MigrationError::InsufficientBalance.into())
    );
}

#[test]
fn test_migrated_tokens_flow_to_treasury() {
    let mut setup = Setup::open(10 * ONE_TOKEN);
    let owner = setup.owner;
    let user = setup.user_with(4 * ONE_TOKEN);

    setup.migrate_all(&user).unwrap();
    setup
        .sim
        .execute(|sim| MigrationEngine::withdraw(sim, &owner))
        .unwrap();

    assert_eq!(setup.sim.balance(&setup.source, &setup.treasury), 4 * ONE_TOKEN);
    assert_eq!(setup.reserve(), 6 * ONE_TOKEN);
}

#[test]
fn test_reentrant_migrate_from_outbound_transfer_fails() {
    let mut setup = Setup::open(10 * ONE_TOKEN);
    let attacker = setup.user_with(4 * ONE_TOKEN);
    let target = setup.target;

    let attempts: Rc<RefCell<Vec<(Result<UserMigrationRecord, ProgramError>, UserMigrationRecord)>>> =
        Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&attempts);
    setup.sim.set_transfer_hook(&target, move |sim, notice| {
        if notice.to == attacker {
            let seen = sim.load_record(&attacker)?;
            let nested = MigrationEngine::migrate(sim, &attacker, ONE_TOKEN);
            log.borrow_mut().push((nested, seen));
        }
        Ok(())
    });

    setup.migrate(&attacker, 2 * ONE_TOKEN).unwrap();

    let attempts = attempts.borrow();
    assert_eq!(attempts.len(), 1);
    let (nested, seen) = &attempts[0];
    assert_eq!(*nested, Err(MigrationError::ReentrantCall.into()));
    // The record was already persisted when the successor tokens left the vault
    assert_eq!(seen.total_migrated, 2 * ONE_TOKEN);
    assert_eq!(seen.last_migration_amount, 2 * ONE_TOKEN);

    assert_eq!(setup.sim.balance(&setup.target, &attacker), 2 * ONE_TOKEN);
    assert_eq!(setup.reserve(), 8 * ONE_TOKEN);
    assert_eq!(
        setup.sim.load_config().unwrap().reentrancy,
        ReentrancyState::NotEntered
    );
}

#[test]
fn test_reentrant_calls_from_inbound_transfer_fail() {
    let mut setup = Setup::open(10 * ONE_TOKEN);
    let owner = setup.owner;
    let attacker = setup.user_with(4 * ONE_TOKEN);
    let source = setup.source;

    let results = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&results);
    setup.sim.set_transfer_hook(&source, move |sim, _| {
        log.borrow_mut()
            .push(MigrationEngine::migrate_all(sim, &attacker).map(|_| ()));
        log.borrow_mut()
            .push(MigrationEngine::feed_reserve(sim, &attacker, ONE_TOKEN));
        log.borrow_mut()
            .push(MigrationEngine::withdraw(sim, &owner).map(|_| ()));
        Ok(())
    });

    setup.migrate(&attacker, ONE_TOKEN).unwrap();

    let reentrant: ProgramError = MigrationError::ReentrantCall.into();
    assert_eq!(
        *results.borrow(),
        vec![
            Err(reentrant.clone()),
            Err(reentrant.clone()),
            Err(reentrant)
        ]
    );
    assert_eq!(setup.sim.record(&attacker).unwrap().total_migrated, ONE_TOKEN);
    assert_eq!(setup.sim.balance(&setup.source, &setup.engine), ONE_TOKEN);
}

#[test]
fn test_failing_transfer_hook_reverts_whole_migration() {
    let mut setup = Setup::open(10 * ONE_TOKEN);
    let user = setup.user_with(3 * ONE_TOKEN);
    let target = setup.target;

    setup
        .sim
        .set_transfer_hook(&target, |_, _| Err(ProgramError::Custom(0xdead)));

    assert_eq!(
        setup.migrate(&user, ONE_TOKEN),
        Err(ProgramError::Custom(0xdead))
    );

    assert_eq!(setup.sim.balance(&setup.source, &user), 3 * ONE_TOKEN);
    assert_eq!(setup.sim.balance(&setup.source, &setup.engine), 0);
    assert_eq!(setup.reserve(), 10 * ONE_TOKEN);
    assert!(setup.sim.record(&user).is_none());
    assert_eq!(
        setup.sim.load_config().unwrap().reentrancy,
        ReentrancyState::NotEntered
    );

    setup.sim.clear_transfer_hook(&target);
    setup.migrate(&user, ONE_TOKEN).unwrap();
}

#[test]
fn test_lock_released_after_failed_migration() {
    let mut setup = Setup::open(ONE_TOKEN);
    let user = setup.user_with(ONE_TOKEN);

    // Not wrapped in execute: the guard itself must release on the error path
    assert_eq!(
        MigrationEngine::migrate(&mut setup.sim, &user, 2 * ONE_TOKEN),
        Err(MigrationError::InsufficientBalance.into())
    );
    assert_eq!(
        setup.sim.load_config().unwrap().reentrancy,
        ReentrancyState::NotEntered
    );

    setup.migrate(&user, ONE_TOKEN).unwrap();
}

#[test]
fn test_pause_during_transfer_survives_lock_release() {
    let mut setup = Setup::open(10 * ONE_TOKEN);
    let owner = setup.owner;
    let target = setup.target;
    let user = setup.user_with(5 * ONE_TOKEN);

    // Pause moves no tokens, so it is allowed while the lock is held
    setup.sim.set_transfer_hook(&target, move |sim, _| {
        MigrationEngine::pause(sim, &owner)
    });

    setup.migrate(&user, ONE_TOKEN).unwrap();
    assert_eq!(setup.sim.balance(&target, &user), ONE_TOKEN);

    let config = setup.sim.load_config().unwrap();
    assert!(config.is_paused);
    assert_eq!(config.reentrancy, ReentrancyState::NotEntered);

    setup.sim.clear_transfer_hook(&target);
    assert_eq!(
        setup.migrate(&user, ONE_TOKEN),
        Err(MigrationError::Paused.into())
    );
}
