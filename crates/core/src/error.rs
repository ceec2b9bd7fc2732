//! Error types for user-facing failures.
//!
//! Only conditions caused by input (malformed quantities, an unusable
//! register base, a damaged plan file) are reported through [`Error`].
//! A solver or verifier disagreement inside [`crate::plan`] is a defect and
//! panics instead.

use thiserror::Error;

use crate::cpu::SimError;
use crate::verify::VerifyError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid quantity '{input}': {reason}")]
    InvalidQuantity { input: String, reason: &'static str },

    #[error("'{input}' is not a {expected}")]
    WrongUnit { input: String, expected: &'static str },

    #[error("cycle count does not fit in 64 bits")]
    CycleOverflow,

    #[error("register base r{base} cannot hold {depth} loop counter(s): LDI only reaches r16..r31")]
    RegisterRange { base: u8, depth: usize },

    #[error("plan file: {0}")]
    Io(#[from] std::io::Error),

    #[error("plan file: {0}")]
    PlanFormat(String),

    #[error("plan file rejected: {0}")]
    PlanRejected(#[from] VerifyError),

    #[error("simulation: {0}")]
    Simulation(#[from] SimError),
}
