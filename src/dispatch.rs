//! Opcode dispatch
//!
//! One fixed table per instruction class, indexed by opcode number. The
//! tables are built once and shared by every interpreter instance; an empty
//! slot means the opcode is not implemented.

use crate::error::ZError;
use crate::instruction::{Instruction, InstructionClass};
use crate::interpreter::{ExecutionResult, Interpreter};

pub type Handler = fn(&mut Interpreter, &Instruction) -> Result<ExecutionResult, ZError>;

#[derive(Clone, Copy)]
pub struct OpcodeEntry {
    pub name: &'static str,
    pub handler: Handler,
}

pub struct DispatchTable {
    zero_op: [Option<OpcodeEntry>; 16],
    one_op: [Option<OpcodeEntry>; 16],
    two_op: [Option<OpcodeEntry>; 32],
    var: [Option<OpcodeEntry>; 32],
}

fn entry(name: &'static str, handler: Handler) -> Option<OpcodeEntry> {
    Some(OpcodeEntry { name, handler })
}

lazy_static! {
    pub static ref DISPATCH: DispatchTable = {
        let mut t = DispatchTable {
            zero_op: [None; 16],
            one_op: [None; 16],
            two_op: [None; 32],
            var: [None; 32],
        };

        t.two_op[0x01] = entry("je", Interpreter::op_je);
        t.two_op[0x02] = entry("jl", Interpreter::op_jl);
        t.two_op[0x03] = entry("jg", Interpreter::op_jg);
        t.two_op[0x04] = entry("dec_chk", Interpreter::op_dec_chk);
        t.two_op[0x05] = entry("inc_chk", Interpreter::op_inc_chk);
        t.two_op[0x06] = entry("jin", Interpreter::op_jin);
        t.two_op[0x07] = entry("test", Interpreter::op_test);
        t.two_op[0x08] = entry("or", Interpreter::op_or);
        t.two_op[0x09] = entry("and", Interpreter::op_and);
        t.two_op[0x0A] = entry("test_attr", Interpreter::op_test_attr);
        t.two_op[0x0B] = entry("set_attr", Interpreter::op_set_attr);
        t.two_op[0x0C] = entry("clear_attr", Interpreter::op_clear_attr);
        t.two_op[0x0D] = entry("store", Interpreter::op_store);
        t.two_op[0x0E] = entry("insert_obj", Interpreter::op_insert_obj);
        t.two_op[0x0F] = entry("loadw", Interpreter::op_loadw);
        t.two_op[0x10] = entry("loadb", Interpreter::op_loadb);
        t.two_op[0x11] = entry("get_prop", Interpreter::op_get_prop);
        t.two_op[0x12] = entry("get_prop_addr", Interpreter::op_get_prop_addr);
        t.two_op[0x13] = entry("get_next_prop", Interpreter::op_get_next_prop);
        t.two_op[0x14] = entry("add", Interpreter::op_add);
        t.two_op[0x15] = entry("sub", Interpreter::op_sub);
        t.two_op[0x16] = entry("mul", Interpreter::op_mul);
        t.two_op[0x17] = entry("div", Interpreter::op_div);
        t.two_op[0x18] = entry("mod", Interpreter::op_mod);

        t.one_op[0x00] = entry("jz", Interpreter::op_jz);
        t.one_op[0x01] = entry("get_sibling", Interpreter::op_get_sibling);
        t.one_op[0x02] = entry("get_child", Interpreter::op_get_child);
        t.one_op[0x03] = entry("get_parent", Interpreter::op_get_parent);
        t.one_op[0x04] = entry("get_prop_len", Interpreter::op_get_prop_len);
        t.one_op[0x05] = entry("inc", Interpreter::op_inc);
        t.one_op[0x06] = entry("dec", Interpreter::op_dec);
        t.one_op[0x07] = entry("print_addr", Interpreter::op_print_addr);
        t.one_op[0x09] = entry("remove_obj", Interpreter::op_remove_obj);
        t.one_op[0x0A] = entry("print_obj", Interpreter::op_print_obj);
        t.one_op[0x0B] = entry("ret", Interpreter::op_ret);
        t.one_op[0x0C] = entry("jump", Interpreter::op_jump);
        t.one_op[0x0D] = entry("print_paddr", Interpreter::op_print_paddr);
        t.one_op[0x0E] = entry("load", Interpreter::op_load);
        t.one_op[0x0F] = entry("not", Interpreter::op_not);

        t.zero_op[0x00] = entry("rtrue", Interpreter::op_rtrue);
        t.zero_op[0x01] = entry("rfalse", Interpreter::op_rfalse);
        t.zero_op[0x02] = entry("print", Interpreter::op_print);
        t.zero_op[0x03] = entry("print_ret", Interpreter::op_print_ret);
        t.zero_op[0x04] = entry("nop", Interpreter::op_nop);
        t.zero_op[0x08] = entry("ret_popped", Interpreter::op_ret_popped);
        t.zero_op[0x09] = entry("pop", Interpreter::op_pop);
        t.zero_op[0x0A] = entry("quit", Interpreter::op_quit);
        t.zero_op[0x0B] = entry("new_line", Interpreter::op_new_line);

        t.var[0x00] = entry("call", Interpreter::op_call);
        t.var[0x01] = entry("storew", Interpreter::op_storew);
        t.var[0x02] = entry("storeb", Interpreter::op_storeb);
        t.var[0x03] = entry("put_prop", Interpreter::op_put_prop);
        t.var[0x04] = entry("sread", Interpreter::op_sread);
        t.var[0x05] = entry("print_char", Interpreter::op_print_char);
        t.var[0x06] = entry("print_num", Interpreter::op_print_num);
        t.var[0x07] = entry("random", Interpreter::op_random);
        t.var[0x08] = entry("push", Interpreter::op_push);
        t.var[0x09] = entry("pull", Interpreter::op_pull);

        t
    };
}

impl DispatchTable {
    /// Find the handler for `inst`. Extended-form instructions cannot be
    /// dispatched at all and report a decode error.
    pub fn lookup(&self, inst: &Instruction) -> Result<&OpcodeEntry, ZError> {
        let slot = match inst.class {
            InstructionClass::ZeroOp => self.zero_op.get(inst.opcode as usize),
            InstructionClass::OneOp => self.one_op.get(inst.opcode as usize),
            InstructionClass::TwoOp => self.two_op.get(inst.opcode as usize),
            InstructionClass::Var => self.var.get(inst.opcode as usize),
            InstructionClass::Extended => {
                return Err(ZError::Decode {
                    pc: inst.address,
                    opcode_byte: inst.opcode_byte,
                })
            }
        };
        slot.and_then(Option::as_ref)
            .ok_or(ZError::UnimplementedOpcode {
                class: inst.class,
                opcode: inst.opcode,
            })
    }

    /// Mnemonic for `inst`, if it has a handler
    pub fn name(&self, inst: &Instruction) -> Option<&'static str> {
        self.lookup(inst).ok().map(|e| e.name)
    }
}
