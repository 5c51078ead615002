use crate::error::ZError;
use crate::memory::Memory;
use crate::text::Text;
use log::debug;

/// Number of entries in a version 3 abbreviation table
pub const ABBREVIATION_COUNT: usize = 96;

/// The 96 abbreviation strings, decoded once at load time.
///
/// The table in memory holds word addresses (byte address / 2). Entries are
/// decoded without nested abbreviation expansion.
#[derive(Debug, Clone, Default)]
pub struct AbbreviationTable {
    entries: Vec<String>,
}

impl AbbreviationTable {
    pub fn load(memory: &Memory, table_addr: usize) -> Result<Self, ZError> {
        let mut entries = Vec::with_capacity(ABBREVIATION_COUNT);
        for index in 0..ABBREVIATION_COUNT {
            let word_addr = memory.get_word(table_addr + index * 2)? as usize;
            let (text, _) = Text::read(memory, word_addr * 2)?;
            entries.push(text.decode(None));
        }
        debug!(
            "loaded {} abbreviations from {:04x}",
            entries.len(),
            table_addr
        );
        Ok(AbbreviationTable { entries })
    }

    /// Abbreviation `index`, or the empty string when out of range
    pub fn get(&self, index: usize) -> &str {
        self.entries.get(index).map_or("", String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
impl AbbreviationTable {
    pub(crate) fn from_strings(entries: &[&str]) -> Self {
        AbbreviationTable {
            entries: entries.iter().map(|s| s.to_string()).collect(),
        }
    }
}
