use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;

use crate::error::{LoadError, ZError};
use crate::memory::Memory;

pub const HEADER_LENGTH: usize = 0x40;

pub const VERSION_NUMBER: usize = 0x00;
pub const FLAGS: usize = 0x01;
pub const RELEASE: usize = 0x02;
pub const HIGH_MEMORY: usize = 0x04;
pub const INITIAL_PC: usize = 0x06;
pub const DICTIONARY: usize = 0x08;
pub const OBJECT_TABLE: usize = 0x0A;
pub const GLOBAL_VARIABLES: usize = 0x0C;
pub const STATIC_MEMORY: usize = 0x0E;
pub const FLAGS2: usize = 0x10;
pub const SERIAL: usize = 0x12;
pub const ABBREVIATION_TABLE: usize = 0x18;
pub const FILE_LENGTH: usize = 0x1A;
pub const FILE_CHECKSUM: usize = 0x1C;
pub const REVISION_NUMBER: usize = 0x32;

/// Named view over the fixed-offset fields at the start of the image.
/// Read once at load time and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Header {
    pub version: u8,
    pub flags: u8,
    pub release: u16,
    pub serial: String,
    pub base_high_mem: u16,
    pub initial_pc: u16,
    pub dictionary: u16,
    pub object_table_addr: u16,
    pub global_variables: u16,
    pub base_static_mem: u16,
    pub abbrev_table: u16,
    pub len_file: usize,
    pub checksum_file: u16,
    pub standard_revision_number: u16,
}

impl Header {
    pub fn new(memory: &Memory) -> Result<Header, LoadError> {
        if memory.len() < HEADER_LENGTH {
            return Err(LoadError::TooSmall(memory.len()));
        }
        Self::read(memory).map_err(LoadError::table("header"))
    }

    fn read(memory: &Memory) -> Result<Header, ZError> {
        let serial = memory
            .read_slice(SERIAL, 6)?
            .iter()
            .map(|&b| b as char)
            .collect();

        Ok(Header {
            version: memory.get_byte(VERSION_NUMBER)?,
            flags: memory.get_byte(FLAGS)?,
            release: memory.get_word(RELEASE)?,
            serial,
            base_high_mem: memory.get_word(HIGH_MEMORY)?,
            initial_pc: memory.get_word(INITIAL_PC)?,
            dictionary: memory.get_word(DICTIONARY)?,
            object_table_addr: memory.get_word(OBJECT_TABLE)?,
            global_variables: memory.get_word(GLOBAL_VARIABLES)?,
            base_static_mem: memory.get_word(STATIC_MEMORY)?,
            abbrev_table: memory.get_word(ABBREVIATION_TABLE)?,
            len_file: memory.get_word(FILE_LENGTH)? as usize * 2,
            checksum_file: memory.get_word(FILE_CHECKSUM)?,
            standard_revision_number: memory.get_word(REVISION_NUMBER)?,
        })
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(
            f,
            "
Z-code version:           {}
Release number:           {}
Size of resident memory:  {:#06x}
Start PC:                 {:#06x}
Dictionary address:       {:#06x}
Object table address:     {:#06x}
Global variables address: {:#06x}
Size of dynamic memory:   {:#06x}
Serial number:            {}
Abbreviations address:    {:#06x}
File size:                {:#06x}
Checksum:                 {:#06x}
",
            self.version,
            self.release,
            self.base_high_mem,
            self.initial_pc,
            self.dictionary,
            self.object_table_addr,
            self.global_variables,
            self.base_static_mem,
            self.serial,
            self.abbrev_table,
            self.len_file,
            self.checksum_file,
        )
    }
}
