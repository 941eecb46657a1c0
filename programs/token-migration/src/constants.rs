//! Compile-time limits of the migration engine

/// Decimals shared by the legacy and successor mints
pub const TOKEN_DECIMALS: u8 = 9;

/// One whole token in base units
pub const ONE_TOKEN: u64 = 1_000_000_000;

/// Ceiling on a single explicit migration (and on a single reserve deposit)
pub const MAX_PER_MIGRATION: u64 = 100_000 * ONE_TOKEN;

/// Wait imposed after a migration of exactly `MAX_PER_MIGRATION` (seconds)
pub const COOLDOWN_PERIOD: i64 = 24 * 60 * 60;
