/// Arithmetic, comparison and branch opcodes
///
/// This module handles:
/// - Arithmetic (add, sub, mul, div, mod) on 16-bit words
/// - Bitwise operations (and, or, not, test)
/// - Comparisons that branch (je, jl, jg, jz) and the unconditional jump
/// - Variable increments (inc, dec, inc_chk, dec_chk)
/// - The random number generator
///
/// add, sub and mul wrap modulo 0x10000. div and mod floor on signed
/// words, as do jl, jg, the checked increments and print_num.
use crate::error::ZError;
use crate::instruction::Instruction;
use crate::interpreter::{ExecutionResult, Interpreter};
use log::{debug, warn};

/// Signed division rounded toward negative infinity
fn floor_div(a: u16, b: u16) -> Result<u16, ZError> {
    let (a, b) = (a as i16, b as i16);
    if b == 0 {
        return Err(ZError::DivisionByZero);
    }
    let mut quotient = a.wrapping_div(b);
    if a.wrapping_rem(b) != 0 && (a < 0) != (b < 0) {
        quotient = quotient.wrapping_sub(1);
    }
    Ok(quotient as u16)
}

/// Remainder of `floor_div`, taking the sign of the divisor
fn floor_mod(a: u16, b: u16) -> Result<u16, ZError> {
    let (a, b) = (a as i16, b as i16);
    if b == 0 {
        return Err(ZError::DivisionByZero);
    }
    let mut remainder = a.wrapping_rem(b);
    if remainder != 0 && (remainder < 0) != (b < 0) {
        remainder = remainder.wrapping_add(b);
    }
    Ok(remainder as u16)
}

impl Interpreter {
    fn store_binary(
        &mut self,
        inst: &Instruction,
        op: fn(u16, u16) -> Result<u16, ZError>,
    ) -> Result<ExecutionResult, ZError> {
        let [a, b] = self.operands(inst)?;
        let result = op(a, b)?;
        self.store_result(result)?;
        Ok(ExecutionResult::Continue)
    }

    // ---- 2OP ----

    /// 2OP:0x01 je - branch if the first operand equals any of the others
    pub(crate) fn op_je(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let operands = self.operand_list(inst)?;
        if operands.len() < 2 {
            return Err(ZError::OperandCount {
                expected: 2,
                found: operands.len(),
            });
        }
        let condition = operands[1..].contains(&operands[0]);
        self.do_branch(condition)
    }

    /// 2OP:0x02 jl - signed less than
    pub(crate) fn op_jl(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [a, b] = self.operands(inst)?;
        self.do_branch((a as i16) < (b as i16))
    }

    /// 2OP:0x03 jg - signed greater than
    pub(crate) fn op_jg(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [a, b] = self.operands(inst)?;
        self.do_branch((a as i16) > (b as i16))
    }

    /// 2OP:0x04 dec_chk - decrement variable, branch if now less than value
    pub(crate) fn op_dec_chk(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [var, limit] = self.operands(inst)?;
        let value = self.adjust_variable(var, -1)?;
        self.do_branch((value as i16) < (limit as i16))
    }

    /// 2OP:0x05 inc_chk - increment variable, branch if now greater than value
    pub(crate) fn op_inc_chk(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [var, limit] = self.operands(inst)?;
        let value = self.adjust_variable(var, 1)?;
        self.do_branch((value as i16) > (limit as i16))
    }

    /// 2OP:0x07 test - branch if every bit of the flags is set in the bitmap
    pub(crate) fn op_test(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [bitmap, flags] = self.operands(inst)?;
        self.do_branch(bitmap & flags == flags)
    }

    /// 2OP:0x08 or
    pub(crate) fn op_or(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        self.store_binary(inst, |a, b| Ok(a | b))
    }

    /// 2OP:0x09 and
    pub(crate) fn op_and(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        self.store_binary(inst, |a, b| Ok(a & b))
    }

    /// 2OP:0x14 add
    pub(crate) fn op_add(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        self.store_binary(inst, |a, b| Ok(a.wrapping_add(b)))
    }

    /// 2OP:0x15 sub
    pub(crate) fn op_sub(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        self.store_binary(inst, |a, b| Ok(a.wrapping_sub(b)))
    }

    /// 2OP:0x16 mul
    pub(crate) fn op_mul(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        self.store_binary(inst, |a, b| Ok(a.wrapping_mul(b)))
    }

    /// 2OP:0x17 div
    pub(crate) fn op_div(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        self.store_binary(inst, floor_div)
    }

    /// 2OP:0x18 mod
    pub(crate) fn op_mod(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        self.store_binary(inst, floor_mod)
    }

    // ---- 1OP ----

    /// 1OP:0x00 jz
    pub(crate) fn op_jz(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [a] = self.operands(inst)?;
        self.do_branch(a == 0)
    }

    /// 1OP:0x05 inc
    pub(crate) fn op_inc(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [var] = self.operands(inst)?;
        self.adjust_variable(var, 1)?;
        Ok(ExecutionResult::Continue)
    }

    /// 1OP:0x06 dec
    pub(crate) fn op_dec(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [var] = self.operands(inst)?;
        self.adjust_variable(var, -1)?;
        Ok(ExecutionResult::Continue)
    }

    /// 1OP:0x0C jump - signed offset from the end of the instruction
    pub(crate) fn op_jump(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [offset] = self.operands(inst)?;
        self.jump_relative(offset as i16)?;
        Ok(ExecutionResult::Branched)
    }

    /// 1OP:0x0F not
    pub(crate) fn op_not(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [a] = self.operands(inst)?;
        self.store_result(!a)?;
        Ok(ExecutionResult::Continue)
    }

    // ---- VAR ----

    /// VAR:0x07 random - positive range gives 1..=range; zero or negative
    /// reseeds and stores 0
    pub(crate) fn op_random(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [range] = self.operands(inst)?;
        let range = range as i16;
        let result = if range > 0 {
            self.rng.gen_range(range as u16)
        } else if range < 0 {
            debug!("random: predictable mode, seed {}", -(range as i32));
            self.rng.reseed(range.unsigned_abs() as u64);
            0
        } else {
            debug!("random: back to unpredictable mode");
            self.rng.randomize();
            0
        };
        self.store_result(result)?;
        Ok(ExecutionResult::Continue)
    }

    /// Add `delta` to the variable named by `var` and return the new value.
    /// Wraps modulo 0x10000 and logs when it does.
    fn adjust_variable(&mut self, var: u16, delta: i16) -> Result<u16, ZError> {
        let var = Self::variable_number(var)?;
        let old = self.read_variable(var)?;
        let new = old.wrapping_add_signed(delta);
        if (delta > 0 && new < old) || (delta < 0 && new > old) {
            warn!("variable {:02x} wrapped from {:04x} to {:04x}", var, old, new);
        }
        self.write_variable(var, new)?;
        Ok(new)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ZError;
    use crate::interpreter::ExecutionResult;
    use crate::test_utils::{interpreter, StoryBuilder};
    use test_log::test;

    /// Run `code` placed at the start of the code area for `steps` instructions
    fn run(code: &[u8], steps: usize) -> crate::interpreter::Interpreter {
        let (mut interp, _) = interpreter(StoryBuilder::new().code(code));
        for _ in 0..steps {
            interp.step().unwrap();
        }
        interp
    }

    #[test]
    fn test_add_wraps() {
        // add #ffff #02 -> sp
        let mut interp = run(&[0xD4, 0x1F, 0xFF, 0xFF, 0x02, 0x00], 1);
        assert_eq!(interp.read_variable(0).unwrap(), 1);
    }

    #[test]
    fn test_sub_and_mul_wrap() {
        // sub #01 #02 -> sp ; mul #100 #100 -> sp
        let mut interp = run(
            &[0x15, 0x01, 0x02, 0x00, 0xD6, 0x0F, 0x01, 0x00, 0x01, 0x00, 0x00],
            2,
        );
        assert_eq!(interp.read_variable(0).unwrap(), 0);
        assert_eq!(interp.read_variable(0).unwrap(), 0xffff);
    }

    #[test]
    fn test_div_and_mod_positive() {
        // div #07 #02 -> G00 ; mod #07 #02 -> G01
        let mut interp = run(&[0x17, 0x07, 0x02, 0x10, 0x18, 0x07, 0x02, 0x11], 2);
        assert_eq!(interp.read_variable(0x10).unwrap(), 3);
        assert_eq!(interp.read_variable(0x11).unwrap(), 1);
    }

    #[test]
    fn test_div_and_mod_floor_negative_operands() {
        // div #fff9 #02 -> G00 ; mod #fff9 #02 -> G01
        // div #07 #fffe -> G02 ; mod #07 #fffe -> G03
        let mut interp = run(
            &[
                0xD7, 0x1F, 0xFF, 0xF9, 0x02, 0x10, 0xD8, 0x1F, 0xFF, 0xF9, 0x02, 0x11, 0xD7,
                0x4F, 0x07, 0xFF, 0xFE, 0x12, 0xD8, 0x4F, 0x07, 0xFF, 0xFE, 0x13,
            ],
            4,
        );
        assert_eq!(interp.read_variable(0x10).unwrap() as i16, -4);
        assert_eq!(interp.read_variable(0x11).unwrap(), 1);
        assert_eq!(interp.read_variable(0x12).unwrap() as i16, -4);
        assert_eq!(interp.read_variable(0x13).unwrap() as i16, -1);
    }

    #[test]
    fn test_div_of_minimum_by_minus_one_wraps() {
        // div #8000 #ffff -> G00 ; mod #8000 #ffff -> G01
        let mut interp = run(
            &[
                0xD7, 0x0F, 0x80, 0x00, 0xFF, 0xFF, 0x10, 0xD8, 0x0F, 0x80, 0x00, 0xFF, 0xFF,
                0x11,
            ],
            2,
        );
        assert_eq!(interp.read_variable(0x10).unwrap(), 0x8000);
        assert_eq!(interp.read_variable(0x11).unwrap(), 0);
    }

    #[test]
    fn test_division_by_zero_faults() {
        let (mut interp, _) = interpreter(StoryBuilder::new().code(&[0x17, 0x07, 0x00, 0x10]));
        let fault = interp.step().unwrap_err();
        assert_eq!(fault.source, ZError::DivisionByZero);
    }

    #[test]
    fn test_je_with_several_operands() {
        // je #03 #01 #02 #03 [true] +5
        let mut interp = run(&[0xC1, 0x55, 0x03, 0x01, 0x02, 0x03, 0xC5], 1);
        assert_eq!(interp.pc(), StoryBuilder::CODE + 7 + 5 - 2);

        // je #03 #04 [true] +5 does not branch
        let interp = run(&[0x01, 0x03, 0x04, 0xC5], 1);
        assert_eq!(interp.pc(), StoryBuilder::CODE + 4);
    }

    #[test]
    fn test_jl_is_signed() {
        // jl #ffff #01 [true] +5 with the first operand a large constant
        let interp = run(&[0xC2, 0x1F, 0xFF, 0xFF, 0x01, 0xC5], 1);
        assert_eq!(interp.pc(), StoryBuilder::CODE + 6 + 5 - 2);
    }

    #[test]
    fn test_jz_branch_on_false() {
        // jz #01 [false] +6
        let interp = run(&[0x90, 0x01, 0x46], 1);
        assert_eq!(interp.pc(), StoryBuilder::CODE + 3 + 6 - 2);
    }

    #[test]
    fn test_test_bitmap() {
        // test #0f #05 [true] +4
        let interp = run(&[0x07, 0x0F, 0x05, 0xC4], 1);
        assert_eq!(interp.pc(), StoryBuilder::CODE + 4 + 4 - 2);
        let interp = run(&[0x07, 0x0A, 0x05, 0xC4], 1);
        assert_eq!(interp.pc(), StoryBuilder::CODE + 4);
    }

    #[test]
    fn test_inc_and_dec_wrap() {
        // store #10 #ffff ; inc #10
        let mut interp = run(&[0xCD, 0x4F, 0x10, 0xFF, 0xFF, 0x95, 0x10], 2);
        assert_eq!(interp.read_variable(0x10).unwrap(), 0);
        // dec #10 wraps back
        let mut interp = run(&[0x96, 0x10], 1);
        assert_eq!(interp.read_variable(0x10).unwrap(), 0xffff);
    }

    #[test]
    fn test_inc_chk_and_dec_chk() {
        // inc_chk #10 #00 [true] +5 : G00 becomes 1 > 0, branch
        let interp = run(&[0x05, 0x10, 0x00, 0xC5], 1);
        assert_eq!(interp.pc(), StoryBuilder::CODE + 4 + 5 - 2);
        // dec_chk #10 #00 [true] +5 : G00 becomes -1 < 0, branch
        let interp = run(&[0x04, 0x10, 0x00, 0xC5], 1);
        assert_eq!(interp.pc(), StoryBuilder::CODE + 4 + 5 - 2);
    }

    #[test]
    fn test_inc_of_the_stack_pushes() {
        // push #04 ; inc #00 ; result is the popped value plus one, pushed back
        let mut interp = run(&[0xE8, 0x7F, 0x04, 0x95, 0x00], 2);
        assert_eq!(interp.read_variable(0).unwrap(), 5);
        assert!(interp.read_variable(0).is_err());
    }

    #[test]
    fn test_not_and_bitwise() {
        // not #00ff -> sp ; or #f0 #0f -> sp ; and #ff #0f -> sp
        let mut interp = run(
            &[
                0x8F, 0x00, 0xFF, 0x00, 0x08, 0xF0, 0x0F, 0x00, 0x09, 0xFF, 0x0F, 0x00,
            ],
            3,
        );
        assert_eq!(interp.read_variable(0).unwrap(), 0x0f);
        assert_eq!(interp.read_variable(0).unwrap(), 0xff);
        assert_eq!(interp.read_variable(0).unwrap(), 0xff00);
    }

    #[test]
    fn test_jump_backwards() {
        // nop ; jump -2 lands back on the nop
        let interp = run(&[0xB4, 0x8C, 0xFF, 0xFE], 2);
        assert_eq!(interp.pc(), StoryBuilder::CODE);
    }

    #[test]
    fn test_random() {
        // random #06 -> sp
        let mut interp = run(&[0xE7, 0x7F, 0x06, 0x00], 1);
        let value = interp.read_variable(0).unwrap();
        assert!((1..=6).contains(&value));

        // random #ffff (-1) reseeds and stores 0
        let mut interp = run(&[0xE7, 0x3F, 0xFF, 0xFF, 0x00], 1);
        assert_eq!(interp.read_variable(0).unwrap(), 0);
        // random #00 reseeds from entropy and stores 0
        let mut interp = run(&[0xE7, 0x7F, 0x00, 0x00], 1);
        assert_eq!(interp.read_variable(0).unwrap(), 0);
    }

    #[test]
    fn test_step_reports_continue() {
        let (mut interp, _) = interpreter(StoryBuilder::new().code(&[0x14, 0x01, 0x01, 0x00]));
        assert_eq!(interp.step().unwrap(), ExecutionResult::Continue);
    }
}
