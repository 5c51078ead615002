/// Stack and routine call operations
///
/// This module handles:
/// - Stack manipulation (push, pull, pop)
/// - Routine calls and returns (call, ret, rtrue, rfalse, ret_popped)
/// - Execution control (nop, quit)
///
/// Every stack opcode works on the evaluation stack of the running frame.
use crate::error::ZError;
use crate::instruction::Instruction;
use crate::interpreter::{ExecutionResult, Interpreter};
use log::{debug, info};

impl Interpreter {
    // ---- 0OP ----

    /// 0OP:0x00 rtrue
    pub(crate) fn op_rtrue(&mut self, _inst: &Instruction) -> Result<ExecutionResult, ZError> {
        self.do_return(1)
    }

    /// 0OP:0x01 rfalse
    pub(crate) fn op_rfalse(&mut self, _inst: &Instruction) -> Result<ExecutionResult, ZError> {
        self.do_return(0)
    }

    /// 0OP:0x04 nop
    pub(crate) fn op_nop(&mut self, _inst: &Instruction) -> Result<ExecutionResult, ZError> {
        Ok(ExecutionResult::Continue)
    }

    /// 0OP:0x08 ret_popped
    pub(crate) fn op_ret_popped(&mut self, _inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let value = self.frame_mut()?.pop()?;
        debug!("ret_popped {:04x}", value);
        self.do_return(value)
    }

    /// 0OP:0x09 pop - discard the top of the stack
    pub(crate) fn op_pop(&mut self, _inst: &Instruction) -> Result<ExecutionResult, ZError> {
        self.frame_mut()?.pop()?;
        Ok(ExecutionResult::Continue)
    }

    /// 0OP:0x0A quit
    pub(crate) fn op_quit(&mut self, _inst: &Instruction) -> Result<ExecutionResult, ZError> {
        info!("quit");
        Ok(self.halt())
    }

    // ---- 1OP ----

    /// 1OP:0x0B ret
    pub(crate) fn op_ret(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [value] = self.operands(inst)?;
        self.do_return(value)
    }

    // ---- VAR ----

    /// VAR:0x00 call - first operand is the packed routine address, the rest
    /// are arguments
    pub(crate) fn op_call(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let operands = self.operand_list(inst)?;
        let (&routine, args) = operands.split_first().ok_or(ZError::OperandCount {
            expected: 1,
            found: 0,
        })?;
        self.do_call(routine, args)
    }

    /// VAR:0x08 push
    pub(crate) fn op_push(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [value] = self.operands(inst)?;
        self.frame_mut()?.push(value);
        Ok(ExecutionResult::Continue)
    }

    /// VAR:0x09 pull - pop the stack into the variable named by the operand
    pub(crate) fn op_pull(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [var] = self.operands(inst)?;
        let var = Self::variable_number(var)?;
        let value = self.frame_mut()?.pop()?;
        self.write_variable(var, value)?;
        Ok(ExecutionResult::Continue)
    }
}
