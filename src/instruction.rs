use crate::error::ZError;
use crate::memory::Memory;
use std::fmt::{Display, Error, Formatter};

/// Operand types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    /// Large constant (2 bytes)
    LargeConstant,
    /// Small constant (1 byte)
    SmallConstant,
    /// Variable number
    Variable,
    /// Omitted (not present)
    Omitted,
}

impl OperandType {
    /// Parse operand type from 2-bit value
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b00 => OperandType::LargeConstant,
            0b01 => OperandType::SmallConstant,
            0b10 => OperandType::Variable,
            _ => OperandType::Omitted,
        }
    }

    /// Get the size in bytes for this operand type
    pub fn size(&self) -> usize {
        match self {
            OperandType::LargeConstant => 2,
            OperandType::SmallConstant | OperandType::Variable => 1,
            OperandType::Omitted => 0,
        }
    }
}

/// Operand count category of an instruction, which selects its dispatch table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionClass {
    ZeroOp,
    OneOp,
    TwoOp,
    Var,
    Extended,
}

impl Display for InstructionClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let name = match self {
            InstructionClass::ZeroOp => "0OP",
            InstructionClass::OneOp => "1OP",
            InstructionClass::TwoOp => "2OP",
            InstructionClass::Var => "VAR",
            InstructionClass::Extended => "EXT",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    pub operand_type: OperandType,
    pub value: u16,
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self.operand_type {
            OperandType::LargeConstant => write!(f, "#{:04x}", self.value),
            OperandType::SmallConstant => write!(f, "#{:02x}", self.value),
            OperandType::Variable => match self.value {
                0 => write!(f, "SP"),
                1..=15 => write!(f, "L{:02}", self.value),
                _ => write!(f, "G{:02x}", self.value - 16),
            },
            OperandType::Omitted => Ok(()),
        }
    }
}

/// A decoded instruction.
///
/// Only the opcode byte, operand-types byte and operands are consumed here.
/// Store, branch and inline-text suffixes start at `next` and are read by the
/// handler that needs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Opcode number within its class
    pub opcode: u8,
    pub class: InstructionClass,
    pub operands: Vec<Operand>,
    /// The raw first byte, kept for diagnostics
    pub opcode_byte: u8,
    /// Address of the opcode byte
    pub address: usize,
    /// Address of the first byte after the operands
    pub next: usize,
}

impl Instruction {
    /// Decode an instruction from memory at the given address
    pub fn decode(memory: &Memory, addr: usize) -> Result<Self, ZError> {
        let opcode_byte = memory.get_byte(addr)?;
        let mut cursor = addr + 1;
        let mut operand_types = Vec::with_capacity(4);

        let (class, opcode) = if opcode_byte == 0xBE {
            (InstructionClass::Extended, opcode_byte)
        } else if opcode_byte >= 0xC0 {
            let class = if opcode_byte & 0x20 != 0 {
                InstructionClass::Var
            } else {
                InstructionClass::TwoOp
            };
            let types = memory.get_byte(cursor)?;
            cursor += 1;
            for i in 0..4 {
                let operand_type = OperandType::from_bits(types >> (6 - i * 2));
                if operand_type == OperandType::Omitted {
                    break;
                }
                operand_types.push(operand_type);
            }
            (class, opcode_byte & 0x1F)
        } else if opcode_byte >= 0x80 {
            let operand_type = OperandType::from_bits(opcode_byte >> 4);
            if operand_type == OperandType::Omitted {
                (InstructionClass::ZeroOp, opcode_byte & 0x0F)
            } else {
                operand_types.push(operand_type);
                (InstructionClass::OneOp, opcode_byte & 0x0F)
            }
        } else {
            for mask in [0x40, 0x20] {
                operand_types.push(if opcode_byte & mask != 0 {
                    OperandType::Variable
                } else {
                    OperandType::SmallConstant
                });
            }
            (InstructionClass::TwoOp, opcode_byte & 0x1F)
        };

        let mut operands = Vec::with_capacity(operand_types.len());
        for operand_type in operand_types {
            let value = match operand_type {
                OperandType::LargeConstant => memory.get_word(cursor)?,
                _ => memory.get_byte(cursor)? as u16,
            };
            cursor += operand_type.size();
            operands.push(Operand {
                operand_type,
                value,
            });
        }

        Ok(Instruction {
            opcode,
            class,
            operands,
            opcode_byte,
            address: addr,
            next: cursor,
        })
    }

    /// Total size of the opcode and operand bytes
    pub fn size(&self) -> usize {
        self.next - self.address
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}:0x{:02x}", self.class, self.opcode)?;
        for (i, operand) in self.operands.iter().enumerate() {
            if i == 0 {
                write!(f, " ")?;
            } else {
                write!(f, ", ")?;
            }
            write!(f, "{}", operand)?;
        }
        Ok(())
    }
}
