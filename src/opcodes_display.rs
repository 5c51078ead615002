/// Text output and line input operations
///
/// This module handles:
/// - Inline text (print, print_ret), which follows the opcode byte
/// - Text at an address (print_addr, print_paddr) and object names (print_obj)
/// - Single characters and numbers (print_char, print_num) and new_line
/// - Line input (sread) into the text and parse buffers
///
/// Everything printed goes to the interpreter's output sink.
use crate::error::ZError;
use crate::input::{tokenize, write_parse_buffer, write_text_buffer};
use crate::instruction::Instruction;
use crate::interpreter::{ExecutionResult, Interpreter};
use crate::text::decode_string;
use log::{debug, info};

impl Interpreter {
    /// Decode the string embedded at the PC and move the PC past it
    fn print_inline(&mut self) -> Result<(), ZError> {
        let pc = self.frame()?.pc;
        let (text, end) = decode_string(&self.memory, pc, Some(&self.abbreviations))?;
        self.frame_mut()?.pc = end;
        self.print(&text)
    }

    // ---- 0OP ----

    /// 0OP:0x02 print
    pub(crate) fn op_print(&mut self, _inst: &Instruction) -> Result<ExecutionResult, ZError> {
        self.print_inline()?;
        Ok(ExecutionResult::Continue)
    }

    /// 0OP:0x03 print_ret - print, new line, return true
    pub(crate) fn op_print_ret(&mut self, _inst: &Instruction) -> Result<ExecutionResult, ZError> {
        self.print_inline()?;
        self.new_line()?;
        self.do_return(1)
    }

    /// 0OP:0x0B new_line
    pub(crate) fn op_new_line(&mut self, _inst: &Instruction) -> Result<ExecutionResult, ZError> {
        self.new_line()?;
        Ok(ExecutionResult::Continue)
    }

    // ---- 1OP ----

    /// 1OP:0x07 print_addr - string at a byte address
    pub(crate) fn op_print_addr(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [addr] = self.operands(inst)?;
        let (text, _) = decode_string(&self.memory, addr as usize, Some(&self.abbreviations))?;
        self.print(&text)?;
        Ok(ExecutionResult::Continue)
    }

    /// 1OP:0x0A print_obj - short name of an object
    pub(crate) fn op_print_obj(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [object] = self.operands(inst)?;
        let name = self.objects.name(object)?.to_string();
        self.print(&name)?;
        Ok(ExecutionResult::Continue)
    }

    /// 1OP:0x0D print_paddr - string at a packed address
    pub(crate) fn op_print_paddr(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [packed] = self.operands(inst)?;
        let addr = self.unpack_address(packed);
        let (text, _) = decode_string(&self.memory, addr, Some(&self.abbreviations))?;
        self.print(&text)?;
        Ok(ExecutionResult::Continue)
    }

    // ---- VAR ----

    /// VAR:0x05 print_char - ZSCII 13 is a new line
    pub(crate) fn op_print_char(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [code] = self.operands(inst)?;
        if code == 13 {
            self.new_line()?;
        } else {
            let c = code as u8 as char;
            self.print(c.encode_utf8(&mut [0; 4]))?;
        }
        Ok(ExecutionResult::Continue)
    }

    /// VAR:0x06 print_num - signed decimal
    pub(crate) fn op_print_num(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [value] = self.operands(inst)?;
        self.print(&(value as i16).to_string())?;
        Ok(ExecutionResult::Continue)
    }

    /// VAR:0x04 sread - read a line into the text buffer and, when a parse
    /// buffer is given, tokenize it against the dictionary. End of input
    /// halts the run.
    pub(crate) fn op_sread(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let operands = self.operand_list(inst)?;
        let Some(&text_buffer) = operands.first() else {
            return Err(ZError::OperandCount {
                expected: 1,
                found: 0,
            });
        };
        let parse_buffer = operands.get(1).copied();

        let Some(line) = self.input.read_line()? else {
            info!("end of input");
            return Ok(self.halt());
        };

        let text_buffer = text_buffer as usize;
        let stored = write_text_buffer(&mut self.memory, text_buffer, &line)?;
        self.globals
            .refresh(&self.memory, text_buffer, stored.len() + 2)?;
        self.objects
            .refresh(&self.memory, text_buffer, stored.len() + 2)?;
        debug!("sread: '{}'", stored);

        if let Some(parse_buffer) = parse_buffer {
            let parse_buffer = parse_buffer as usize;
            let tokens = tokenize(&stored, &self.dictionary.separators);
            let count =
                write_parse_buffer(&mut self.memory, parse_buffer, &tokens, &self.dictionary)?;
            self.globals.refresh(&self.memory, parse_buffer, 2 + count * 4)?;
            self.objects.refresh(&self.memory, parse_buffer, 2 + count * 4)?;
        }
        Ok(ExecutionResult::Continue)
    }
}
