// Test utilities for assembling small version 3 story images by hand
use crate::config::Config;
use crate::interpreter::Interpreter;
use crate::io::CaptureOutput;
use crate::text::END_MARKER;

/// Load `builder`'s image with a capturing sink, a fixed seed and a
/// 1000-instruction budget
pub fn interpreter(builder: StoryBuilder) -> (Interpreter, CaptureOutput) {
    let capture = CaptureOutput::new();
    let config = Config {
        max_instructions: Some(1000),
        random_seed: Some(1),
        ..Config::default()
    };
    let interp = Interpreter::new(builder.build(), config, Box::new(capture.clone())).unwrap();
    (interp, capture)
}

/// Lays out a minimal story with a header, abbreviations, three objects,
/// a global table, a five-word dictionary and an empty code area.
///
/// Object tree: 1 "room" holds 2 "lamp" and 3 "key". The lamp has
/// property 5 (word 0x1234) and property 3 (byte 0x07). Property 4 has a
/// default of 0x0044.
pub struct StoryBuilder {
    bytes: Vec<u8>,
}

impl StoryBuilder {
    pub const SIZE: usize = 0x800;
    pub const ABBREVIATIONS: usize = 0x40;
    pub const OBJECTS: usize = 0x100;
    pub const GLOBALS: usize = 0x200;
    pub const DICTIONARY: usize = 0x3e0;
    pub const CODE: usize = 0x500;
    pub const WORDS: [&'static str; 5] = ["go", "lamp", "mailbox", "open", "take"];
    const EMPTY_STRING: usize = 0x7f0;
    const ENTRY_LENGTH: usize = 7;

    pub fn new() -> Self {
        let builder = StoryBuilder {
            bytes: vec![0; Self::SIZE],
        };
        builder
            .byte(0x00, 3)
            .word(0x04, Self::CODE as u16)
            .word(0x06, Self::CODE as u16)
            .word(0x08, Self::DICTIONARY as u16)
            .word(0x0a, Self::OBJECTS as u16)
            .word(0x0c, Self::GLOBALS as u16)
            .word(0x0e, 0x400)
            .word(0x18, Self::ABBREVIATIONS as u16)
            .word(0x1a, (Self::SIZE / 2) as u16)
            .abbreviations()
            .objects()
            .dictionary()
    }

    fn abbreviations(mut self) -> Self {
        self = self.text(Self::EMPTY_STRING, "");
        for i in 0..96 {
            self = self.word(Self::ABBREVIATIONS + i * 2, (Self::EMPTY_STRING / 2) as u16);
        }
        self
    }

    fn objects(self) -> Self {
        let records = Self::OBJECTS + 62;
        self.word(Self::OBJECTS + 6, 0x0044)
            // room
            .bytes(records, &[0x80, 0, 0, 0, 0, 0, 2])
            .word(records + 7, 0x0159)
            .byte(0x159, 2)
            .text(0x15a, "room")
            .byte(0x15e, 0)
            // lamp
            .bytes(records + 9, &[0, 0, 0, 0, 1, 3, 0])
            .word(records + 16, 0x0160)
            .byte(0x160, 2)
            .text(0x161, "lamp")
            .bytes(0x165, &[0x25, 0x12, 0x34, 0x03, 0x07, 0x00])
            // key
            .bytes(records + 18, &[0x20, 0, 0, 0, 1, 0, 0])
            .word(records + 25, 0x0170)
            .byte(0x170, 1)
            .text(0x171, "key")
            .byte(0x173, 0)
    }

    fn dictionary(mut self) -> Self {
        self = self
            .bytes(Self::DICTIONARY, &[3, b',', b'.', b'"'])
            .byte(Self::DICTIONARY + 4, Self::ENTRY_LENGTH as u8)
            .word(Self::DICTIONARY + 5, Self::WORDS.len() as u16);
        for (i, word) in Self::WORDS.iter().enumerate() {
            let [first, second] = encode_dictionary_word(word);
            let entry = Self::entry_address(i);
            self = self.word(entry, first).word(entry + 2, second);
        }
        self
    }

    /// Address of dictionary entry `index`
    pub fn entry_address(index: usize) -> usize {
        Self::DICTIONARY + 7 + index * Self::ENTRY_LENGTH
    }

    pub fn byte(mut self, addr: usize, value: u8) -> Self {
        self.bytes[addr] = value;
        self
    }

    pub fn word(mut self, addr: usize, value: u16) -> Self {
        self.bytes[addr..addr + 2].copy_from_slice(&value.to_be_bytes());
        self
    }

    pub fn bytes(mut self, addr: usize, values: &[u8]) -> Self {
        self.bytes[addr..addr + values.len()].copy_from_slice(values);
        self
    }

    /// Write `s` as packed text starting at `addr`
    pub fn text(mut self, addr: usize, s: &str) -> Self {
        for (i, word) in encode_text(s).into_iter().enumerate() {
            self = self.word(addr + i * 2, word);
        }
        self
    }

    /// Place instructions at the start of the code area
    pub fn code(self, code: &[u8]) -> Self {
        self.bytes(Self::CODE, code)
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

fn zchars(s: &str) -> Vec<u8> {
    let mut codes = Vec::new();
    for c in s.chars() {
        match c {
            ' ' => codes.push(0),
            'a'..='z' => codes.push(c as u8 - b'a' + 6),
            'A'..='Z' => codes.extend([4, c as u8 - b'A' + 6]),
            '0'..='9' => codes.extend([5, c as u8 - b'0' + 8]),
            '\n' => codes.extend([5, 7]),
            _ => {
                let index = b".,!?_#'\"/\\-:()"
                    .iter()
                    .position(|&p| p as char == c)
                    .unwrap_or(0);
                codes.extend([5, index as u8 + 18]);
            }
        }
    }
    codes
}

fn pack(codes: &[u8]) -> Vec<u16> {
    let mut words: Vec<u16> = codes
        .chunks(3)
        .map(|c| ((c[0] as u16) << 10) | ((c[1] as u16) << 5) | c[2] as u16)
        .collect();
    if let Some(last) = words.last_mut() {
        *last |= END_MARKER;
    }
    words
}

/// Pack `s` into words, padding with shift codes
pub fn encode_text(s: &str) -> Vec<u16> {
    let mut codes = zchars(s);
    while codes.is_empty() || codes.len() % 3 != 0 {
        codes.push(5);
    }
    pack(&codes)
}

/// Pack the first six characters of `s` as a dictionary entry
pub fn encode_dictionary_word(s: &str) -> [u16; 2] {
    let mut codes = zchars(s);
    codes.resize(6, 5);
    let words = pack(&codes);
    [words[0], words[1]]
}
