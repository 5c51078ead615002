/// Memory and variable operations
///
/// This module handles:
/// - Variable operations (load, store), which name a variable by number
/// - Word operations (loadw, storew) on a base address plus a word index
/// - Byte operations (loadb, storeb) on a base address plus a byte index
///
/// Writes into memory go through the global store and the object table
/// afterwards, so a storew into the globals table is seen by the next global
/// read and a storeb into an attribute byte by the next test_attr.
use crate::error::ZError;
use crate::instruction::Instruction;
use crate::interpreter::{ExecutionResult, Interpreter};
use log::debug;

impl Interpreter {
    /// 2OP:0x0D store - write a value to the variable named by the first operand
    pub(crate) fn op_store(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [var, value] = self.operands(inst)?;
        let var = Self::variable_number(var)?;
        self.write_variable(var, value)?;
        Ok(ExecutionResult::Continue)
    }

    /// 1OP:0x0E load - read the variable named by the operand
    pub(crate) fn op_load(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [var] = self.operands(inst)?;
        let var = Self::variable_number(var)?;
        let value = self.read_variable(var)?;
        self.store_result(value)?;
        Ok(ExecutionResult::Continue)
    }

    /// 2OP:0x0F loadw
    pub(crate) fn op_loadw(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [array, index] = self.operands(inst)?;
        let addr = array as usize + 2 * index as usize;
        let value = self.memory.get_word(addr)?;
        self.store_result(value)?;
        Ok(ExecutionResult::Continue)
    }

    /// 2OP:0x10 loadb
    pub(crate) fn op_loadb(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [array, index] = self.operands(inst)?;
        let addr = array as usize + index as usize;
        let value = self.memory.get_byte(addr)? as u16;
        self.store_result(value)?;
        Ok(ExecutionResult::Continue)
    }

    /// VAR:0x01 storew
    pub(crate) fn op_storew(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [array, index, value] = self.operands(inst)?;
        let addr = array as usize + 2 * index as usize;
        debug!("storew {:05x} <- {:04x}", addr, value);
        self.memory.set_word(addr, value)?;
        self.globals.refresh(&self.memory, addr, 2)?;
        self.objects.refresh(&self.memory, addr, 2)?;
        Ok(ExecutionResult::Continue)
    }

    /// VAR:0x02 storeb
    pub(crate) fn op_storeb(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [array, index, value] = self.operands(inst)?;
        let addr = array as usize + index as usize;
        debug!("storeb {:05x} <- {:02x}", addr, value as u8);
        self.memory.set_byte(addr, value as u8)?;
        self.globals.refresh(&self.memory, addr, 1)?;
        self.objects.refresh(&self.memory, addr, 1)?;
        Ok(ExecutionResult::Continue)
    }
}
