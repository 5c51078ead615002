//! Error types for loading and running story files
//!
//! Runtime errors (`ZError`) are always fatal: the run loop wraps them in a
//! `RuntimeFault` carrying the program counter and the instruction that was
//! executing. Failures while building the interpreter's tables are reported
//! separately as `LoadError`, before any instruction runs.

use crate::instruction::InstructionClass;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZError {
    #[error("address 0x{address:05x} is outside the {len}-byte memory image")]
    OutOfBounds { address: usize, len: usize },

    #[error("cannot decode opcode byte 0x{opcode_byte:02x} at 0x{pc:05x}")]
    Decode { pc: usize, opcode_byte: u8 },

    #[error("{class} opcode 0x{opcode:02x} is not implemented")]
    UnimplementedOpcode { class: InstructionClass, opcode: u8 },

    #[error("expected at least {expected} operands, found {found}")]
    OperandCount { expected: usize, found: usize },

    #[error("invalid variable index {0}")]
    InvalidVariableIndex(u16),

    #[error("local variable L{0:02} read before it was written")]
    UnsetLocal(u8),

    #[error("evaluation stack underflow")]
    StackUnderflow,

    #[error("invalid object number {0}")]
    InvalidObject(u16),

    #[error("object {object} has no property {property}")]
    MissingProperty { object: u16, property: u8 },

    #[error("routine at 0x{address:05x} declares {locals} locals (maximum 15)")]
    InvalidRoutine { address: usize, locals: u8 },

    #[error("division by zero")]
    DivisionByZero,

    #[error("instruction limit of {0} reached")]
    InstructionLimit(u64),

    #[error("i/o error: {0}")]
    Io(String),
}

/// A fatal runtime error together with where it happened.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("execution halted at 0x{pc:05x} [{context}]: {source}")]
pub struct RuntimeFault {
    pub pc: usize,
    pub context: String,
    #[source]
    pub source: ZError,
}

/// Errors raised while building the interpreter, before `run` is allowed to start.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("story file is too small to hold a header ({0} bytes)")]
    TooSmall(usize),

    #[error("unsupported story file version {0} (expected 1-3)")]
    UnsupportedVersion(u8),

    #[error("failed to load {table}: {source}")]
    Table {
        table: &'static str,
        #[source]
        source: ZError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl LoadError {
    pub(crate) fn table(table: &'static str) -> impl FnOnce(ZError) -> LoadError {
        move |source| LoadError::Table { table, source }
    }
}

impl From<std::io::Error> for ZError {
    fn from(e: std::io::Error) -> Self {
        ZError::Io(e.to_string())
    }
}
