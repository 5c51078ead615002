use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;

use crate::error::ZError;
use crate::memory::Memory;
use crate::text::Text;
use log::debug;

/// Dictionary words are compared on their first six characters
pub const DICTIONARY_WORD_LENGTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    /// Decoded text, at most six characters
    pub word: String,
    pub address: usize,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct Dictionary {
    pub separators: Vec<char>,
    pub entry_length: u8,
    pub entries: Vec<DictionaryEntry>,
}

impl Dictionary {
    pub fn load(memory: &Memory, start: usize) -> Result<Dictionary, ZError> {
        let mut cur_pos = start;
        let n = memory.get_byte(cur_pos)? as usize;
        cur_pos += 1;
        let separators = memory
            .read_slice(cur_pos, n)?
            .iter()
            .map(|&b| b as char)
            .collect();
        cur_pos += n;
        let entry_length = memory.get_byte(cur_pos)?;
        cur_pos += 1;
        let number_of_entries = memory.get_word(cur_pos)? as usize;
        cur_pos += 2;

        let mut entries = Vec::with_capacity(number_of_entries);
        for index in 0..number_of_entries {
            let address = cur_pos + index * entry_length as usize;
            let mut text = Text::from_word(memory.get_word(address)?);
            text.add_word(memory.get_word(address + 2)?);
            entries.push(DictionaryEntry {
                word: text.decode(None),
                address,
                index,
            });
        }

        debug!(
            "loaded dictionary at {:04x}: {} entries, {} separators",
            start,
            entries.len(),
            n
        );
        Ok(Dictionary {
            separators,
            entry_length,
            entries,
        })
    }

    /// Address of the entry matching `word`, or 0 when it is not in the dictionary
    pub fn lookup(&self, word: &str) -> usize {
        let key: String = word
            .chars()
            .take(DICTIONARY_WORD_LENGTH)
            .flat_map(char::to_lowercase)
            .collect();
        self.entries
            .iter()
            .find(|e| e.word == key)
            .map_or(0, |e| e.address)
    }

    pub fn is_separator(&self, c: char) -> bool {
        self.separators.contains(&c)
    }
}

impl Display for Dictionary {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        writeln!(
            f,
            "Number of separator / input codes: {}, word size: {}, word count: {}",
            self.separators.len(),
            self.entry_length,
            self.entries.len()
        )?;
        write!(f, "separators:")?;
        for c in &self.separators {
            write!(f, " '{}'", c)?;
        }
        Ok(())
    }
}
