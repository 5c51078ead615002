//! Line input tokenization and the version 3 text/parse buffers
//!
//! `sread` copies the typed line into the text buffer and, when a parse
//! buffer is given, splits it into words and records each word's
//! dictionary address, length and position.

use crate::dictionary::Dictionary;
use crate::error::ZError;
use crate::memory::Memory;
use log::debug;

/// A word or separator from an input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Offset of the first character within the line
    pub position: usize,
}

fn flush(current: &mut String, start: usize, tokens: &mut Vec<Token>) {
    if !current.is_empty() {
        tokens.push(Token {
            text: std::mem::take(current),
            position: start,
        });
    }
}

/// Split `line` on spaces. Each separator character becomes a token of its own.
pub fn tokenize(line: &str, separators: &[char]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut start = 0;

    for (position, c) in line.chars().enumerate() {
        if c == ' ' {
            flush(&mut current, start, &mut tokens);
        } else if separators.contains(&c) {
            flush(&mut current, start, &mut tokens);
            tokens.push(Token {
                text: c.to_string(),
                position,
            });
        } else {
            if current.is_empty() {
                start = position;
            }
            current.push(c);
        }
    }
    flush(&mut current, start, &mut tokens);
    tokens
}

/// Store `line` in the text buffer at `addr`: lowercased, truncated to the
/// capacity in byte 0, starting at byte 1 and terminated by a zero byte.
/// Returns the text actually stored.
pub fn write_text_buffer(memory: &mut Memory, addr: usize, line: &str) -> Result<String, ZError> {
    let max_len = memory.get_byte(addr)? as usize;
    let stored: String = line
        .to_lowercase()
        .chars()
        .filter(char::is_ascii)
        .take(max_len)
        .collect();
    for (i, byte) in stored.bytes().enumerate() {
        memory.set_byte(addr + 1 + i, byte)?;
    }
    memory.set_byte(addr + 1 + stored.len(), 0)?;
    Ok(stored)
}

/// Fill the parse buffer at `addr` with one four-byte block per token:
/// dictionary address (word), length, and position within the text buffer.
/// Byte 0 holds the capacity in words, byte 1 receives the count written.
pub fn write_parse_buffer(
    memory: &mut Memory,
    addr: usize,
    tokens: &[Token],
    dictionary: &Dictionary,
) -> Result<usize, ZError> {
    let max_words = memory.get_byte(addr)? as usize;
    let count = tokens.len().min(max_words);
    memory.set_byte(addr + 1, count as u8)?;

    for (i, token) in tokens.iter().take(count).enumerate() {
        let entry = addr + 2 + i * 4;
        let word_addr = dictionary.lookup(&token.text);
        debug!(
            "parse: '{}' at {} -> {:04x}",
            token.text, token.position, word_addr
        );
        memory.set_word(entry, word_addr as u16)?;
        memory.set_byte(entry + 2, token.text.chars().count() as u8)?;
        // Positions count from the start of the text buffer, whose first byte is the capacity
        memory.set_byte(entry + 3, token.position as u8 + 1)?;
    }
    Ok(count)
}
