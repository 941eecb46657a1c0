use num_derive::FromPrimitive;
use solana_program::{
    decode_error::DecodeError,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, FromPrimitive, PartialEq, Eq)]
pub enum MigrationError {
    #[error("Migration is paused")]
    Paused = 0,

    #[error("Amount cannot be zero")]
    AmountCannotBeZero = 1,

    #[error("Amount exceeds max migration limit")]
    ExceedsMaxMigrationLimit = 2,

    #[error("Insufficient balance")]
    InsufficientBalance = 3,

    #[error("Max migration already made in the last 24 hours")]
    NotAllowedForOneDay = 4,

    #[error("Caller is not the owner")]
    NotOwner = 5,

    #[error("Invalid token address")]
    InvalidTokenAddress = 6,

    #[error("Reentrant call")]
    ReentrantCall = 7,

    #[error("Invalid reentrancy guard state")]
    InvalidGuardState = 8,

    #[error("Already initialized")]
    AlreadyInitialized = 9,

    #[error("Not initialized")]
    NotInitialized = 10,

    #[error("Invalid PDA")]
    InvalidPda = 11,

    #[error("Invalid token account")]
    InvalidTokenAccount = 12,

    #[error("Invalid new owner")]
    InvalidNewOwner = 13,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow = 14,

    #[error("Invalid instruction")]
    InvalidInstruction = 15,
}

impl PrintProgramError for MigrationError {
    fn print<E>(&self) {
        use solana_program::msg;
        msg!("MigrationError: {}", self);
    }
}

impl From<MigrationError> for ProgramError {
    fn from(e: MigrationError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for MigrationError {
    fn type_of() -> &'static str {
        "MigrationError"
    }
}
