use crate::error::ZError;
use crate::memory::Memory;

/// Number of global variables (variables 0x10 - 0xff)
pub const GLOBAL_COUNT: usize = 240;

/// The 240 global variable cells.
///
/// Cells are cached here and written through to the global table in memory,
/// so `loadw` on the table and `load` on a global always agree.
#[derive(Debug, Clone)]
pub struct GlobalStore {
    base: usize,
    cells: [u16; GLOBAL_COUNT],
}

impl GlobalStore {
    pub fn load(memory: &Memory, base: usize) -> Result<Self, ZError> {
        let mut cells = [0u16; GLOBAL_COUNT];
        for (i, cell) in cells.iter_mut().enumerate() {
            *cell = memory.get_word(base + i * 2)?;
        }
        Ok(GlobalStore { base, cells })
    }

    pub fn base(&self) -> usize {
        self.base
    }

    /// Read global `index` (0-based, i.e. variable number - 16)
    pub fn get(&self, index: u8) -> Result<u16, ZError> {
        self.cells
            .get(index as usize)
            .copied()
            .ok_or(ZError::InvalidVariableIndex(index as u16 + 16))
    }

    pub fn set(&mut self, memory: &mut Memory, index: u8, value: u16) -> Result<(), ZError> {
        let cell = self
            .cells
            .get_mut(index as usize)
            .ok_or(ZError::InvalidVariableIndex(index as u16 + 16))?;
        memory.set_word(self.base + index as usize * 2, value)?;
        *cell = value;
        Ok(())
    }

    /// Re-read any cells overlapping `addr..addr + len` after a raw memory write
    pub fn refresh(&mut self, memory: &Memory, addr: usize, len: usize) -> Result<(), ZError> {
        let end = self.base + GLOBAL_COUNT * 2;
        if addr + len <= self.base || addr >= end {
            return Ok(());
        }
        let first = addr.saturating_sub(self.base) / 2;
        let last = ((addr + len - 1).min(end - 1) - self.base) / 2;
        for i in first..=last {
            self.cells[i] = memory.get_word(self.base + i * 2)?;
        }
        Ok(())
    }
}
