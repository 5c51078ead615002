//! Packed text decoding
//!
//! Strings are stored as a run of 16-bit words, each holding three 5-bit
//! character codes. The top bit of a word is set on the last word of the
//! string. Codes 0-5 are control codes (space, abbreviations, shifts), the
//! rest index one of three 32-entry alphabets.

use crate::abbreviations::AbbreviationTable;
use crate::error::ZError;
use crate::memory::Memory;
use bitvec::prelude::*;
use log::trace;

/// Marks the final word of a packed string
pub const END_MARKER: u16 = 0x8000;

/// Control slots are written as '^' and never emitted directly
const CONTROL: u8 = b'^';

const LOWERCASE: &[u8; 32] = b" ^^^^^abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8; 32] = b" ^^^^^ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const PUNCTUATION: &[u8; 32] = b" ^^^^^^^0123456789.,!?_#'\"/\\-:()";

/// The three alphabets, indexed by `Alphabet as usize`
pub const CHARACTER_MAP: [&[u8; 32]; 3] = [LOWERCASE, UPPERCASE, PUNCTUATION];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alphabet {
    /// Lowercase
    #[default]
    A0,
    /// Uppercase
    A1,
    /// Punctuation, digits and the 10-bit escape
    A2,
}

/// A single 5-bit character code and the alphabet it was read under.
/// Two characters are equal when their codes are equal.
#[derive(Debug, Clone, Copy)]
pub struct Character {
    pub code: u8,
    pub alphabet: Alphabet,
}

impl PartialEq for Character {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Character {}

impl Character {
    pub fn new(code: u8) -> Self {
        Character {
            code: code & 0x1f,
            alphabet: Alphabet::A0,
        }
    }

    /// Look the code up in `alphabet`. Control slots decode to `None`.
    pub fn decode(&self, alphabet: Alphabet) -> Option<char> {
        match CHARACTER_MAP[alphabet as usize][self.code as usize] {
            CONTROL => None,
            b => Some(b as char),
        }
    }
}

/// Split a packed word into its end flag and three character codes
fn unpack_word(word: u16) -> (bool, [u8; 3]) {
    let bits = word.view_bits::<Msb0>();
    (
        bits[0],
        [
            bits[1..6].load_be::<u8>(),
            bits[6..11].load_be::<u8>(),
            bits[11..16].load_be::<u8>(),
        ],
    )
}

/// An ordered run of characters assembled from packed words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text {
    pub characters: Vec<Character>,
}

impl Text {
    pub fn new() -> Self {
        Text::default()
    }

    pub fn from_word(word: u16) -> Self {
        let mut text = Text::new();
        text.add_word(word);
        text
    }

    /// Append the three characters of `word`. Returns true when the word
    /// carries the end marker.
    pub fn add_word(&mut self, word: u16) -> bool {
        let (end, codes) = unpack_word(word);
        self.characters.extend(codes.iter().map(|&c| Character::new(c)));
        end
    }

    /// Read a packed string starting at `addr`. Returns the text and the
    /// address of the first byte after it.
    pub fn read(memory: &Memory, addr: usize) -> Result<(Text, usize), ZError> {
        let mut text = Text::new();
        let mut cursor = addr;
        loop {
            let word = memory.get_word(cursor)?;
            cursor += 2;
            trace!("text word {:04x} at {:05x}", word, cursor - 2);
            if text.add_word(word) {
                return Ok((text, cursor));
            }
        }
    }

    /// Decode to a string. Abbreviation references expand through
    /// `abbreviations` when given and are dropped otherwise, which is how
    /// the abbreviation strings themselves are decoded.
    pub fn decode(&self, abbreviations: Option<&AbbreviationTable>) -> String {
        let codes = &self.characters;
        let mut result = String::new();
        let mut alphabet = Alphabet::A0;
        let mut table_offset = 0usize;
        let mut abbreviation_pending = false;
        let mut start = 0;

        // A string opening with the A2 shift and the escape code carries a
        // 10-bit character literal in the next two codes.
        if codes.len() >= 5 && codes[0].code == 5 && codes[1].code == 6 {
            let literal = ((codes[2].code as u32 & 0x1f) << 5) | (codes[3].code as u32 & 0x1f);
            if let Some(c) = char::from_u32(literal) {
                result.push(c);
            }
            start = 4;
        }

        for character in &codes[start..] {
            if abbreviation_pending {
                if let Some(table) = abbreviations {
                    result.push_str(table.get(table_offset + character.code as usize));
                }
                abbreviation_pending = false;
                table_offset = 0;
                alphabet = Alphabet::A0;
                continue;
            }

            match character.code {
                0 => {
                    result.push(' ');
                    alphabet = Alphabet::A0;
                }
                c @ 1..=3 => {
                    abbreviation_pending = true;
                    alphabet = Alphabet::A2;
                    table_offset = 32 * (c as usize - 1);
                }
                4 => alphabet = Alphabet::A1,
                5 => alphabet = Alphabet::A2,
                7 if alphabet == Alphabet::A2 => {
                    result.push('\n');
                    alphabet = Alphabet::A0;
                }
                _ => {
                    if let Some(c) = character.decode(alphabet) {
                        result.push(c);
                    }
                    alphabet = Alphabet::A0;
                }
            }
        }

        result
    }
}

/// Decode the packed string at `addr`, returning it and the address after it
pub fn decode_string(
    memory: &Memory,
    addr: usize,
    abbreviations: Option<&AbbreviationTable>,
) -> Result<(String, usize), ZError> {
    let (text, end) = Text::read(memory, addr)?;
    Ok((text.decode(abbreviations), end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn pack(a: u8, b: u8, c: u8) -> u16 {
        ((a as u16) << 10) | ((b as u16) << 5) | c as u16
    }

    fn text_of(codes: &[u8]) -> Text {
        Text {
            characters: codes.iter().map(|&c| Character::new(c)).collect(),
        }
    }

    #[test]
    fn test_character_decode() {
        let character = Character::new(8);
        assert_eq!(character.decode(Alphabet::A0), Some('c'));
        assert_eq!(character.decode(Alphabet::A1), Some('C'));
        assert_eq!(character.decode(Alphabet::A2), Some('0'));
        assert_eq!(Character::new(14).decode(Alphabet::A2), Some('6'));
    }

    #[test]
    fn test_character_equality_ignores_alphabet() {
        let a = Character {
            code: 9,
            alphabet: Alphabet::A0,
        };
        let b = Character {
            code: 9,
            alphabet: Alphabet::A2,
        };
        assert_eq!(a, b);
        assert_ne!(a, Character::new(10));
    }

    #[test]
    fn test_create_from_word() {
        let text = Text::from_word(pack(1, 2, 3));
        assert_eq!(text.characters.len(), 3);
        assert_eq!(text.characters[0], Character::new(1));
        assert_eq!(text.characters[1], Character::new(2));
        assert_eq!(text.characters[2], Character::new(3));
    }

    #[test]
    fn test_end_marker() {
        let mut text = Text::new();
        assert!(!text.add_word(pack(6, 7, 8)));
        assert!(text.add_word(END_MARKER | pack(9, 10, 11)));
        assert_eq!(text.characters.len(), 6);
    }

    #[test]
    fn test_decode_lowercase_and_space() {
        // "hi there": h=13 i=14 space=0 t=25 h=13 e=10 r=23 e=10
        let text = text_of(&[13, 14, 0, 25, 13, 10, 23, 10, 5]);
        assert_eq!(text.decode(None), "hi there");
    }

    #[test]
    fn test_shift_applies_to_one_character() {
        // 4 shifts 'h' to 'H', then back to lowercase
        let text = text_of(&[4, 13, 14, 5, 18, 5]);
        assert_eq!(text.decode(None), "Hi.");
    }

    #[test]
    fn test_newline_in_punctuation_alphabet() {
        let text = text_of(&[6, 5, 7, 6]);
        assert_eq!(text.decode(None), "a\na");
    }

    #[test]
    fn test_leading_ten_bit_literal() {
        // '@' is 64 = 0b00010_00000
        let text = text_of(&[5, 6, 2, 0, 6, 5]);
        assert_eq!(text.decode(None), "@a");
    }

    #[test]
    fn test_abbreviation_without_table_is_dropped() {
        let text = text_of(&[6, 1, 4, 6]);
        assert_eq!(text.decode(None), "aa");
    }

    #[test]
    fn test_read_from_memory() {
        let mut memory = Memory::new(vec![0; 8]);
        memory.set_word(2, pack(13, 14, 0)).unwrap();
        memory.set_word(4, END_MARKER | pack(6, 5, 5)).unwrap();
        let (s, end) = decode_string(&memory, 2, None).unwrap();
        assert_eq!(s, "hi a");
        assert_eq!(end, 6);
    }

    #[test]
    fn test_unterminated_string_runs_out_of_bounds() {
        let memory = Memory::new(vec![0; 4]);
        assert!(matches!(
            Text::read(&memory, 0),
            Err(ZError::OutOfBounds { .. })
        ));
    }
}
