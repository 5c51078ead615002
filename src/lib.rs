//! A Z-machine interpreter for version 1-3 story files.
//!
//! Load a story image with [`Interpreter::new`], attach a line source with
//! [`Interpreter::with_input`] if the story reads input, then call
//! [`Interpreter::run`].

#[macro_use]
extern crate lazy_static;

pub mod abbreviations;
pub mod config;
pub mod dictionary;
pub mod dispatch;
pub mod error;
pub mod frame;
pub mod globals;
pub mod header;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod io;
pub mod memory;
pub mod object;
pub mod opcodes_display;
pub mod opcodes_math;
pub mod opcodes_memory;
pub mod opcodes_object;
pub mod opcodes_stack;
pub mod text;
pub mod zrand;

#[cfg(test)]
mod test_utils;

pub use config::Config;
pub use error::{LoadError, RuntimeFault, ZError};
pub use interpreter::{ExecutionResult, Interpreter, State};
pub use io::{CaptureOutput, ConsoleOutput, LineSource, OutputSink, ScriptedInput, StdinInput};

/*
Layout of a small version 3 story, as the loader sees it
Dynamic 00000   header (64 bytes)
        00040   abbreviation table, 96 word addresses
        00102   property defaults, 31 words
        00140   object records, 9 bytes each
        002f0   object names and property lists
        006e3   global variables, 240 words
Static  00b48   parser tables
        0124d   dictionary
High    01a0a   routines
        05d56   strings
*/
