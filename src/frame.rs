use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;

use crate::error::ZError;
use crate::memory::Memory;
use log::debug;

/// Maximum number of local variables per routine
pub const MAX_LOCALS: usize = 15;

/// One activation record: program counter, evaluation stack and locals.
///
/// Locals the routine never declared (or the main routine, which has none)
/// stay `None`, and reading one is a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub pc: usize,
    /// Address of the routine header, 0 for the main routine
    pub routine: usize,
    stack: Vec<u16>,
    locals: [Option<u16>; MAX_LOCALS],
}

impl Frame {
    /// The outermost frame, starting at the header's initial PC with no locals
    pub fn main(pc: usize) -> Self {
        Frame {
            pc,
            routine: 0,
            stack: Vec::new(),
            locals: [None; MAX_LOCALS],
        }
    }

    /// Set up a frame for the routine at byte address `routine`: read the
    /// local count and default values, then overwrite the first locals with
    /// `args`. Arguments beyond the declared locals are dropped.
    pub fn call(memory: &Memory, routine: usize, args: &[u16]) -> Result<Self, ZError> {
        let count = memory.get_byte(routine)?;
        if count as usize > MAX_LOCALS {
            return Err(ZError::InvalidRoutine {
                address: routine,
                locals: count,
            });
        }

        let mut locals = [None; MAX_LOCALS];
        let mut pc = routine + 1;
        for (i, local) in locals.iter_mut().take(count as usize).enumerate() {
            let default = memory.get_word(pc)?;
            pc += 2;
            *local = Some(args.get(i).copied().unwrap_or(default));
        }
        if args.len() > count as usize {
            debug!(
                "routine {:05x} takes {} locals, dropping {} extra arguments",
                routine,
                count,
                args.len() - count as usize
            );
        }

        Ok(Frame {
            pc,
            routine,
            stack: Vec::new(),
            locals,
        })
    }

    pub fn push(&mut self, value: u16) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> Result<u16, ZError> {
        self.stack.pop().ok_or(ZError::StackUnderflow)
    }

    pub fn peek(&self) -> Result<u16, ZError> {
        self.stack.last().copied().ok_or(ZError::StackUnderflow)
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Read variable `n` from this frame: 0 pops the stack, 1-15 read a local
    pub fn get_local(&mut self, n: u8) -> Result<u16, ZError> {
        match n {
            0 => self.pop(),
            1..=15 => self.locals[n as usize - 1].ok_or(ZError::UnsetLocal(n)),
            _ => Err(ZError::InvalidVariableIndex(n as u16)),
        }
    }

    /// Write variable `n` in this frame: 0 pushes, 1-15 write a local
    pub fn set_local(&mut self, n: u8, value: u16) -> Result<(), ZError> {
        match n {
            0 => {
                self.push(value);
                Ok(())
            }
            1..=15 => {
                self.locals[n as usize - 1] = Some(value);
                Ok(())
            }
            _ => Err(ZError::InvalidVariableIndex(n as u16)),
        }
    }

    /// Peek at a local without faulting, for diagnostics
    pub fn local(&self, n: u8) -> Option<u16> {
        match n {
            1..=15 => self.locals[n as usize - 1],
            _ => None,
        }
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "routine {:05x} pc {:05x}", self.routine, self.pc)?;
        for (i, local) in self.locals.iter().enumerate() {
            if let Some(value) = local {
                write!(f, " L{:02}={:04x}", i + 1, value)?;
            }
        }
        write!(f, " stack {:?}", self.stack)
    }
}

/// The stack of outstanding routine calls. The last frame is the running one.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Vec<Frame>,
}

impl CallStack {
    pub fn new(initial_pc: usize) -> Self {
        CallStack {
            frames: vec![Frame::main(initial_pc)],
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn current(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn routine(locals: &[u16]) -> Memory {
        let mut bytes = vec![0u8; 0x40];
        bytes[0x10] = locals.len() as u8;
        for (i, value) in locals.iter().enumerate() {
            bytes[0x11 + i * 2..0x13 + i * 2].copy_from_slice(&value.to_be_bytes());
        }
        Memory::new(bytes)
    }

    #[test]
    fn test_variable_zero_is_the_stack() {
        let mut frame = Frame::main(0x100);
        frame.set_local(0, 5).unwrap();
        frame.set_local(0, 6).unwrap();
        assert_eq!(frame.peek().unwrap(), 6);
        assert_eq!(frame.get_local(0).unwrap(), 6);
        assert_eq!(frame.get_local(0).unwrap(), 5);
        assert_eq!(frame.get_local(0), Err(ZError::StackUnderflow));
    }

    #[test]
    fn test_unset_local_faults() {
        let mut frame = Frame::main(0x100);
        assert_eq!(frame.get_local(3), Err(ZError::UnsetLocal(3)));
        frame.set_local(3, 0xffff).unwrap();
        assert_eq!(frame.get_local(3).unwrap(), 0xffff);
        assert_eq!(frame.get_local(16), Err(ZError::InvalidVariableIndex(16)));
    }

    #[test]
    fn test_call_binds_arguments_over_defaults() {
        let memory = routine(&[0x1111, 0x2222, 0x3333]);
        let mut frame = Frame::call(&memory, 0x10, &[7]).unwrap();
        assert_eq!(frame.pc, 0x10 + 1 + 6);
        assert_eq!(frame.get_local(1).unwrap(), 7);
        assert_eq!(frame.get_local(2).unwrap(), 0x2222);
        assert_eq!(frame.get_local(3).unwrap(), 0x3333);
        assert_eq!(frame.get_local(4), Err(ZError::UnsetLocal(4)));
    }

    #[test]
    fn test_call_drops_extra_arguments() {
        let memory = routine(&[0]);
        let mut frame = Frame::call(&memory, 0x10, &[1, 2, 3]).unwrap();
        assert_eq!(frame.get_local(1).unwrap(), 1);
        assert_eq!(frame.get_local(2), Err(ZError::UnsetLocal(2)));
    }

    #[test]
    fn test_call_rejects_too_many_locals() {
        let mut bytes = vec![0u8; 0x40];
        bytes[0x10] = 16;
        let result = Frame::call(&Memory::new(bytes), 0x10, &[]);
        assert_eq!(
            result,
            Err(ZError::InvalidRoutine {
                address: 0x10,
                locals: 16
            })
        );
    }

    #[test]
    fn test_call_stack_order() {
        let memory = routine(&[]);
        let mut calls = CallStack::new(0x200);
        calls.push(Frame::call(&memory, 0x10, &[]).unwrap());
        assert_eq!(calls.depth(), 2);
        assert_eq!(calls.current().unwrap().pc, 0x11);
        calls.pop();
        assert_eq!(calls.current().unwrap().pc, 0x200);
        calls.pop();
        assert!(calls.is_empty());
        assert!(calls.current().is_none());
    }
}
