// Token Migration Program
// Native Solana implementation - one-way 1:1 conversion of a legacy mint into its successor

use solana_program::{
    account_info::AccountInfo,
    entrypoint,
    entrypoint::ProgramResult,
    msg,
    pubkey::Pubkey,
};

pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod host;
pub mod instructions;
pub mod pda;
pub mod processor;
pub mod security;
#[cfg(all(not(target_arch = "bpf"), not(target_os = "solana")))]
pub mod simulator;
pub mod state;

// Declare program ID
solana_program::declare_id!("TokMig1111111111111111111111111111111111111");

#[cfg(not(feature = "no-entrypoint"))]
entrypoint!(process);

pub fn process(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    msg!("Token Migration Program entrypoint");
    processor::process_instruction(program_id, accounts, instruction_data)
}
