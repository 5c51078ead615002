//! The fetch-decode-execute loop
//!
//! The interpreter owns the memory image, the tables derived from it and the
//! call stack. Each step decodes the instruction at the current frame's PC,
//! moves the PC past its operands and hands it to the handler registered in
//! the dispatch table. Handlers read any store or branch bytes themselves,
//! from the PC.

use crate::abbreviations::AbbreviationTable;
use crate::config::Config;
use crate::dictionary::Dictionary;
use crate::dispatch::DISPATCH;
use crate::error::{LoadError, RuntimeFault, ZError};
use crate::frame::{CallStack, Frame};
use crate::globals::GlobalStore;
use crate::header::Header;
use crate::instruction::{Instruction, Operand, OperandType};
use crate::io::{LineSource, NoInput, OutputSink};
use crate::memory::Memory;
use crate::object::ObjectTable;
use crate::zrand::ZRand;
use log::{debug, error, info, log, trace, Level};

/// What a handler did, as far as the run loop is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Continue execution normally
    Continue,
    /// Branch or jump taken, PC already updated
    Branched,
    /// Routine called, new frame pushed
    Called,
    /// Routine returned this value to its caller
    Returned(u16),
    /// Execution is over (quit, return from main, or end of input)
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
}

pub struct Interpreter {
    pub memory: Memory,
    pub header: Header,
    pub abbreviations: AbbreviationTable,
    pub dictionary: Dictionary,
    pub objects: ObjectTable,
    pub globals: GlobalStore,
    pub calls: CallStack,
    pub config: Config,
    pub(crate) output: Box<dyn OutputSink>,
    pub(crate) input: Box<dyn LineSource>,
    pub(crate) rng: ZRand,
    state: State,
    instruction_count: u64,
}

impl Interpreter {
    /// Load a story image and build every table, ready to run from the
    /// header's initial PC
    pub fn new(
        bytes: Vec<u8>,
        config: Config,
        output: Box<dyn OutputSink>,
    ) -> Result<Interpreter, LoadError> {
        let memory = Memory::new(bytes);
        let header = Header::new(&memory)?;
        if !(1..=3).contains(&header.version) {
            return Err(LoadError::UnsupportedVersion(header.version));
        }
        debug!("{}", header);

        let abbreviations = AbbreviationTable::load(&memory, header.abbrev_table as usize)
            .map_err(LoadError::table("abbreviation table"))?;
        let dictionary = Dictionary::load(&memory, header.dictionary as usize)
            .map_err(LoadError::table("dictionary"))?;
        let objects = ObjectTable::load(&memory, header.object_table_addr as usize, &abbreviations)
            .map_err(LoadError::table("object table"))?;
        let globals = GlobalStore::load(&memory, header.global_variables as usize)
            .map_err(LoadError::table("global variables"))?;

        let rng = match config.random_seed {
            Some(seed) => ZRand::new_predictable(seed),
            None => ZRand::new_uniform(),
        };

        Ok(Interpreter {
            calls: CallStack::new(header.initial_pc as usize),
            memory,
            header,
            abbreviations,
            dictionary,
            objects,
            globals,
            config,
            output,
            input: Box::new(NoInput),
            rng,
            state: State::Running,
            instruction_count: 0,
        })
    }

    /// Attach a line source for `sread`
    pub fn with_input(mut self, input: Box<dyn LineSource>) -> Self {
        self.input = input;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    pub fn instruction_count(&self) -> u64 {
        self.instruction_count
    }

    /// PC of the running frame, or 0 once the call stack is empty
    pub fn pc(&self) -> usize {
        self.calls.current().map_or(0, |f| f.pc)
    }

    pub(crate) fn frame(&self) -> Result<&Frame, ZError> {
        self.calls.current().ok_or(ZError::StackUnderflow)
    }

    pub(crate) fn frame_mut(&mut self) -> Result<&mut Frame, ZError> {
        self.calls.current_mut().ok_or(ZError::StackUnderflow)
    }

    pub(crate) fn halt(&mut self) -> ExecutionResult {
        self.state = State::Halted;
        ExecutionResult::Halted
    }

    // ---- variables ----

    /// Read variable `var`: 0 pops the stack, 1-15 are locals, 16-254 globals.
    /// Variable 255 is rejected.
    pub fn read_variable(&mut self, var: u8) -> Result<u16, ZError> {
        match var {
            0..=15 => self.frame_mut()?.get_local(var),
            0xff => Err(ZError::InvalidVariableIndex(0xff)),
            _ => self.globals.get(var - 16),
        }
    }

    /// Write variable `var`: 0 pushes, 1-15 are locals, 16-254 globals
    pub fn write_variable(&mut self, var: u8, value: u16) -> Result<(), ZError> {
        match var {
            0..=15 => self.frame_mut()?.set_local(var, value),
            0xff => Err(ZError::InvalidVariableIndex(0xff)),
            _ => self.globals.set(&mut self.memory, var - 16, value),
        }
    }

    /// Variable number taken from an operand value, for the opcodes that
    /// name a variable instead of reading one
    pub(crate) fn variable_number(value: u16) -> Result<u8, ZError> {
        u8::try_from(value).map_err(|_| ZError::InvalidVariableIndex(value))
    }

    pub(crate) fn operand_value(&mut self, operand: &Operand) -> Result<u16, ZError> {
        match operand.operand_type {
            OperandType::LargeConstant | OperandType::SmallConstant => Ok(operand.value),
            OperandType::Variable => self.read_variable(operand.value as u8),
            OperandType::Omitted => Err(ZError::OperandCount {
                expected: 1,
                found: 0,
            }),
        }
    }

    /// Resolve every operand in order. Stack operands pop as they are read.
    pub(crate) fn operand_list(&mut self, inst: &Instruction) -> Result<Vec<u16>, ZError> {
        inst.operands
            .iter()
            .map(|operand| self.operand_value(operand))
            .collect()
    }

    /// Resolve every operand and return the first `N`, failing if there are fewer
    pub(crate) fn operands<const N: usize>(
        &mut self,
        inst: &Instruction,
    ) -> Result<[u16; N], ZError> {
        let values = self.operand_list(inst)?;
        let mut result = [0u16; N];
        if values.len() < N {
            return Err(ZError::OperandCount {
                expected: N,
                found: values.len(),
            });
        }
        result.copy_from_slice(&values[..N]);
        Ok(result)
    }

    // ---- store and branch suffixes ----

    /// Read the byte at the PC and advance past it
    pub(crate) fn fetch_byte(&mut self) -> Result<u8, ZError> {
        let pc = self.frame()?.pc;
        let byte = self.memory.get_byte(pc)?;
        self.frame_mut()?.pc = pc + 1;
        Ok(byte)
    }

    /// Store `value` through the store byte at the PC
    pub(crate) fn store_result(&mut self, value: u16) -> Result<(), ZError> {
        let var = self.fetch_byte()?;
        trace!("  -> V{:02x} = {:04x}", var, value);
        self.write_variable(var, value)
    }

    /// Read the branch bytes at the PC and branch if `condition` matches
    /// their polarity. Offsets 0 and 1 return false and true from the
    /// current routine.
    pub(crate) fn do_branch(&mut self, condition: bool) -> Result<ExecutionResult, ZError> {
        let first = self.fetch_byte()?;
        let on_true = first & 0x80 != 0;
        let offset = if first & 0x40 != 0 {
            (first & 0x3f) as i16
        } else {
            let second = self.fetch_byte()?;
            let raw = (((first & 0x3f) as u16) << 8) | second as u16;
            if raw & 0x2000 != 0 {
                (raw | 0xc000) as i16
            } else {
                raw as i16
            }
        };

        if condition != on_true {
            return Ok(ExecutionResult::Continue);
        }
        match offset {
            0 => self.do_return(0),
            1 => self.do_return(1),
            _ => {
                self.jump_relative(offset)?;
                Ok(ExecutionResult::Branched)
            }
        }
    }

    /// Move the PC by `offset - 2` from where it is now
    pub(crate) fn jump_relative(&mut self, offset: i16) -> Result<(), ZError> {
        let len = self.memory.len();
        let frame = self.frame_mut()?;
        let target = frame
            .pc
            .checked_add_signed(offset as isize - 2)
            .ok_or(ZError::OutOfBounds {
                address: frame.pc,
                len,
            })?;
        frame.pc = target;
        Ok(())
    }

    // ---- calls and returns ----

    /// Byte address of a packed routine or string address
    pub fn unpack_address(&self, packed: u16) -> usize {
        packed as usize * 2
    }

    /// Call the routine at `packed`. The caller's PC is left on its store
    /// byte, which the matching return consumes. Calling address 0 stores 0
    /// straight away without entering anything.
    pub(crate) fn do_call(&mut self, packed: u16, args: &[u16]) -> Result<ExecutionResult, ZError> {
        if packed == 0 {
            debug!("call to address 0");
            self.store_result(0)?;
            return Ok(ExecutionResult::Continue);
        }
        let routine = self.unpack_address(packed);
        let frame = Frame::call(&self.memory, routine, args)?;
        debug!("call {:05x} {:?} (depth {})", routine, args, self.calls.depth());
        self.calls.push(frame);
        Ok(ExecutionResult::Called)
    }

    /// Pop the running frame and store `value` in the caller. Returning
    /// from the outermost frame halts.
    pub(crate) fn do_return(&mut self, value: u16) -> Result<ExecutionResult, ZError> {
        let finished = self.calls.pop();
        debug!(
            "return {:04x} from {:05x}",
            value,
            finished.map_or(0, |f| f.routine)
        );
        if self.calls.is_empty() {
            info!("returned from the main routine");
            return Ok(self.halt());
        }
        self.store_result(value)?;
        Ok(ExecutionResult::Returned(value))
    }

    // ---- output ----

    pub(crate) fn print(&mut self, text: &str) -> Result<(), ZError> {
        self.output.print(text)
    }

    pub(crate) fn new_line(&mut self) -> Result<(), ZError> {
        self.output.new_line()
    }

    // ---- run loop ----

    /// Execute one instruction
    pub fn step(&mut self) -> Result<ExecutionResult, RuntimeFault> {
        let pc = self.pc();
        let fault = |context: String| move |source: ZError| RuntimeFault { pc, context, source };

        if let Some(limit) = self.config.max_instructions {
            if self.instruction_count >= limit {
                return Err(fault("instruction budget".to_string())(
                    ZError::InstructionLimit(limit),
                ));
            }
        }

        let inst = Instruction::decode(&self.memory, pc).map_err(|e| {
            let byte = self.memory.get_byte(pc).unwrap_or(0);
            fault(format!("opcode byte 0x{:02x}", byte))(e)
        })?;

        let entry = DISPATCH
            .lookup(&inst)
            .map_err(fault(format!("opcode byte 0x{:02x}", inst.opcode_byte)))?;

        let level = if self.config.trace_instructions {
            Level::Debug
        } else {
            Level::Trace
        };
        log!(level, "{:05x}: {} ({})", pc, entry.name, inst);

        self.instruction_count += 1;
        self.frame_mut()
            .map_err(fault(entry.name.to_string()))?
            .pc = inst.next;
        (entry.handler)(self, &inst).map_err(fault(format!("{} ({})", entry.name, inst)))
    }

    /// Run until the story halts or faults
    pub fn run(&mut self) -> Result<(), RuntimeFault> {
        info!("starting at {:05x}", self.pc());
        while self.is_running() {
            if let Err(fault) = self.step() {
                error!("{}", fault);
                self.state = State::Halted;
                return Err(fault);
            }
        }
        info!("halted after {} instructions", self.instruction_count);
        Ok(())
    }
}
