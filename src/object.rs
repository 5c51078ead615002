//! Version 3 object table
//!
//! Layout at the object table address:
//! - 31 default property words
//! - up to 255 nine-byte records: 4 attribute bytes, parent, sibling, child,
//!   and a word pointing at the property header
//!
//! A property header holds the short name (a length byte counting words,
//! then packed text) followed by the property chain in descending order.
//! Each property starts with a size byte: bits 0-4 are the property number
//! and bits 5-7 are the length minus one. A zero size byte ends the chain.
//!
//! Objects are parsed once into `GameObject`s. Every mutation updates both
//! the parsed object and the bytes in memory, and raw stores into the table
//! are folded back in through `ObjectTable::refresh`.

use crate::abbreviations::AbbreviationTable;
use crate::error::ZError;
use crate::memory::Memory;
use crate::text::Text;
use bitvec::prelude::*;
use indexmap::IndexMap;
use log::{debug, warn};

pub const MAX_OBJECTS: usize = 255;
pub const MAX_ATTRIBUTE: u16 = 31;
pub const DEFAULT_PROPERTY_COUNT: usize = 31;
pub const OBJECT_ENTRY_SIZE: usize = 9;

const PARENT_OFFSET: usize = 4;
const SIBLING_OFFSET: usize = 5;
const CHILD_OFFSET: usize = 6;
const PROPERTY_OFFSET: usize = 7;

/// 32 attribute flags, attribute 0 being the top bit of the first byte
pub type Attributes = BitArray<[u8; 4], Msb0>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Address of the size byte; the data starts one byte later
    pub address: usize,
    pub data: Vec<u8>,
}

impl Property {
    pub fn data_address(&self) -> usize {
        self.address + 1
    }

    /// One-byte properties read as that byte; anything longer reads its first word
    pub fn value(&self) -> u16 {
        match self.data.as_slice() {
            [] => 0,
            [b] => *b as u16,
            [high, low, ..] => u16::from_be_bytes([*high, *low]),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameObject {
    pub number: u16,
    /// Address of the nine-byte record, `None` for the sentinel
    pub address: Option<usize>,
    pub attributes: Attributes,
    pub parent: u16,
    pub sibling: u16,
    pub child: u16,
    pub property_header: usize,
    pub name: String,
    pub properties: IndexMap<u8, Property>,
}

impl GameObject {
    fn sentinel() -> Self {
        GameObject {
            number: 0,
            address: None,
            attributes: BitArray::new([0; 4]),
            parent: 0,
            sibling: 0,
            child: 0,
            property_header: 0,
            name: String::new(),
            properties: IndexMap::new(),
        }
    }

    fn load(
        memory: &Memory,
        number: u16,
        address: usize,
        abbreviations: &AbbreviationTable,
    ) -> Result<Self, ZError> {
        let attributes = read_attributes(memory, address)?;
        let property_header = memory.get_word(address + PROPERTY_OFFSET)? as usize;

        let name_words = memory.get_byte(property_header)? as usize;
        let mut cursor = property_header + 1;
        let mut text = Text::new();
        for _ in 0..name_words {
            text.add_word(memory.get_word(cursor)?);
            cursor += 2;
        }

        let mut properties = IndexMap::new();
        loop {
            let size_byte = memory.get_byte(cursor)?;
            if size_byte == 0 {
                break;
            }
            let number = size_byte & 0x1f;
            let len = (size_byte >> 5) as usize + 1;
            let data = memory.read_slice(cursor + 1, len)?.to_vec();
            properties.insert(
                number,
                Property {
                    address: cursor,
                    data,
                },
            );
            cursor += len + 1;
        }

        Ok(GameObject {
            number,
            address: Some(address),
            attributes,
            parent: memory.get_byte(address + PARENT_OFFSET)? as u16,
            sibling: memory.get_byte(address + SIBLING_OFFSET)? as u16,
            child: memory.get_byte(address + CHILD_OFFSET)? as u16,
            property_header,
            name: text.decode(Some(abbreviations)),
            properties,
        })
    }
}

fn read_attributes(memory: &Memory, address: usize) -> Result<Attributes, ZError> {
    Ok(BitArray::new([
        memory.get_byte(address)?,
        memory.get_byte(address + 1)?,
        memory.get_byte(address + 2)?,
        memory.get_byte(address + 3)?,
    ]))
}

fn overlaps(start: usize, len: usize, other: usize, other_len: usize) -> bool {
    start < other + other_len && other < start + len
}

#[derive(Debug, Clone, Copy)]
enum Link {
    Parent,
    Sibling,
    Child,
}

#[derive(Debug, Clone)]
pub struct ObjectTable {
    base: usize,
    /// Index 0 is unused so property numbers index directly
    defaults: [u16; DEFAULT_PROPERTY_COUNT + 1],
    /// Index 0 is the inert sentinel
    objects: Vec<GameObject>,
}

impl ObjectTable {
    pub fn load(
        memory: &Memory,
        base: usize,
        abbreviations: &AbbreviationTable,
    ) -> Result<Self, ZError> {
        let mut defaults = [0u16; DEFAULT_PROPERTY_COUNT + 1];
        for (i, default) in defaults.iter_mut().skip(1).enumerate() {
            *default = memory.get_word(base + i * 2)?;
        }

        let records = base + DEFAULT_PROPERTY_COUNT * 2;
        let mut objects = vec![GameObject::sentinel()];
        for i in 0..MAX_OBJECTS {
            let address = records + i * OBJECT_ENTRY_SIZE;
            // The property data of the first object follows the last record
            if objects.len() > 1 && address >= objects[1].property_header {
                break;
            }
            objects.push(GameObject::load(
                memory,
                i as u16 + 1,
                address,
                abbreviations,
            )?);
        }

        debug!("loaded {} objects from {:04x}", objects.len() - 1, base);
        Ok(ObjectTable {
            base,
            defaults,
            objects,
        })
    }

    pub fn base(&self) -> usize {
        self.base
    }

    /// Re-read whatever overlaps `addr..addr + len` after a raw store:
    /// property defaults, attribute and link bytes, and property data.
    /// Names and the property chain layout are not re-parsed.
    pub fn refresh(&mut self, memory: &Memory, addr: usize, len: usize) -> Result<(), ZError> {
        if overlaps(addr, len, self.base, DEFAULT_PROPERTY_COUNT * 2) {
            for (i, default) in self.defaults.iter_mut().skip(1).enumerate() {
                *default = memory.get_word(self.base + i * 2)?;
            }
        }
        for object in self.objects.iter_mut() {
            let Some(record) = object.address else {
                continue;
            };
            if overlaps(addr, len, record, OBJECT_ENTRY_SIZE) {
                object.attributes = read_attributes(memory, record)?;
                object.parent = memory.get_byte(record + PARENT_OFFSET)? as u16;
                object.sibling = memory.get_byte(record + SIBLING_OFFSET)? as u16;
                object.child = memory.get_byte(record + CHILD_OFFSET)? as u16;
                debug!("refreshed record of object {}", object.number);
            }
            for property in object.properties.values_mut() {
                let data_addr = property.data_address();
                let data_len = property.data.len();
                if overlaps(addr, len, data_addr, data_len) {
                    property
                        .data
                        .copy_from_slice(memory.read_slice(data_addr, data_len)?);
                }
            }
        }
        Ok(())
    }

    /// Number of real objects, not counting the sentinel
    pub fn len(&self) -> usize {
        self.objects.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Object `number`. Object 0 is the sentinel.
    pub fn object(&self, number: u16) -> Result<&GameObject, ZError> {
        self.objects
            .get(number as usize)
            .ok_or(ZError::InvalidObject(number))
    }

    fn object_mut(&mut self, number: u16) -> Result<&mut GameObject, ZError> {
        self.objects
            .get_mut(number as usize)
            .ok_or(ZError::InvalidObject(number))
    }

    pub fn default_property(&self, property: u8) -> u16 {
        self.defaults.get(property as usize).copied().unwrap_or(0)
    }

    pub fn parent(&self, number: u16) -> Result<u16, ZError> {
        Ok(self.object(number)?.parent)
    }

    pub fn sibling(&self, number: u16) -> Result<u16, ZError> {
        Ok(self.object(number)?.sibling)
    }

    pub fn child(&self, number: u16) -> Result<u16, ZError> {
        Ok(self.object(number)?.child)
    }

    pub fn name(&self, number: u16) -> Result<&str, ZError> {
        Ok(&self.object(number)?.name)
    }

    fn set_link(
        &mut self,
        memory: &mut Memory,
        number: u16,
        link: Link,
        value: u16,
    ) -> Result<(), ZError> {
        if number == 0 {
            debug!("ignoring {:?} update on object 0", link);
            return Ok(());
        }
        if value as usize > self.len() {
            return Err(ZError::InvalidObject(value));
        }
        let object = self.object_mut(number)?;
        let offset = match link {
            Link::Parent => {
                object.parent = value;
                PARENT_OFFSET
            }
            Link::Sibling => {
                object.sibling = value;
                SIBLING_OFFSET
            }
            Link::Child => {
                object.child = value;
                CHILD_OFFSET
            }
        };
        if let Some(address) = object.address {
            memory.set_byte(address + offset, value as u8)?;
        }
        Ok(())
    }

    pub fn test_attr(&self, number: u16, attribute: u16) -> Result<bool, ZError> {
        let object = self.object(number)?;
        if attribute > MAX_ATTRIBUTE {
            warn!("test_attr: attribute {} out of range", attribute);
            return Ok(false);
        }
        Ok(object.attributes[attribute as usize])
    }

    pub fn set_attr(&mut self, memory: &mut Memory, number: u16, attribute: u16) -> Result<(), ZError> {
        self.write_attr(memory, number, attribute, true)
    }

    pub fn clear_attr(
        &mut self,
        memory: &mut Memory,
        number: u16,
        attribute: u16,
    ) -> Result<(), ZError> {
        self.write_attr(memory, number, attribute, false)
    }

    fn write_attr(
        &mut self,
        memory: &mut Memory,
        number: u16,
        attribute: u16,
        value: bool,
    ) -> Result<(), ZError> {
        let object = self.object_mut(number)?;
        if attribute > MAX_ATTRIBUTE {
            warn!("attribute {} out of range on object {}", attribute, number);
            return Ok(());
        }
        let Some(address) = object.address else {
            return Ok(());
        };
        let bit = attribute as usize;
        object.attributes.set(bit, value);
        let byte = bit / 8;
        let bits = &object.attributes[byte * 8..byte * 8 + 8];
        memory.set_byte(address + byte, bits.load_be::<u8>())
    }

    /// Property value, falling back to the table default when absent
    pub fn get_prop(&self, number: u16, property: u8) -> Result<u16, ZError> {
        Ok(match self.object(number)?.properties.get(&property) {
            Some(p) => p.value(),
            None => self.default_property(property),
        })
    }

    /// Overwrite a property in place. One-byte properties take the low byte
    /// of `value`; longer ones take it as their first word.
    pub fn put_prop(
        &mut self,
        memory: &mut Memory,
        number: u16,
        property: u8,
        value: u16,
    ) -> Result<(), ZError> {
        let prop = self
            .object_mut(number)?
            .properties
            .get_mut(&property)
            .ok_or(ZError::MissingProperty {
                object: number,
                property,
            })?;
        let addr = prop.data_address();
        if prop.data.len() == 1 {
            prop.data[0] = value as u8;
            memory.set_byte(addr, value as u8)
        } else {
            prop.data[..2].copy_from_slice(&value.to_be_bytes());
            memory.set_word(addr, value)
        }
    }

    /// Address of the property data, or 0 when the object lacks it
    pub fn get_prop_addr(&self, number: u16, property: u8) -> Result<u16, ZError> {
        Ok(self
            .object(number)?
            .properties
            .get(&property)
            .map_or(0, |p| p.data_address() as u16))
    }

    /// Length of the property whose data starts at `data_addr`
    pub fn get_prop_len(memory: &Memory, data_addr: u16) -> Result<u16, ZError> {
        if data_addr == 0 {
            return Ok(0);
        }
        let size_byte = memory.get_byte(data_addr as usize - 1)?;
        Ok((size_byte >> 5) as u16 + 1)
    }

    /// The property after `property` in the chain; property 0 asks for the first
    pub fn get_next_prop(&self, number: u16, property: u8) -> Result<u16, ZError> {
        let properties = &self.object(number)?.properties;
        if property == 0 {
            return Ok(properties.keys().next().map_or(0, |&p| p as u16));
        }
        let index = properties
            .get_index_of(&property)
            .ok_or(ZError::MissingProperty {
                object: number,
                property,
            })?;
        Ok(properties
            .get_index(index + 1)
            .map_or(0, |(&p, _)| p as u16))
    }

    /// Make `number` the first child of `destination`.
    ///
    /// Only the insert half: the object is not unlinked from its old
    /// parent's child chain, so callers remove it first.
    pub fn insert_obj(
        &mut self,
        memory: &mut Memory,
        number: u16,
        destination: u16,
    ) -> Result<(), ZError> {
        if number == 0 {
            return Err(ZError::InvalidObject(0));
        }
        let first_child = self.child(destination)?;
        self.set_link(memory, number, Link::Parent, destination)?;
        self.set_link(memory, number, Link::Sibling, first_child)?;
        self.set_link(memory, destination, Link::Child, number)
    }

    /// Detach `number` from its parent, leaving its own children attached
    pub fn remove_obj(&mut self, memory: &mut Memory, number: u16) -> Result<(), ZError> {
        let parent = self.parent(number)?;
        if parent == 0 {
            return Ok(());
        }
        let sibling = self.sibling(number)?;
        let first = self.child(parent)?;
        if first == number {
            self.set_link(memory, parent, Link::Child, sibling)?;
        } else {
            // A chain can be no longer than the table; anything longer loops
            let mut current = first;
            let mut steps = 0;
            while current != 0 {
                if steps == self.len() {
                    warn!("remove_obj: sibling chain of object {} does not end", parent);
                    break;
                }
                let next = self.sibling(current)?;
                if next == number {
                    self.set_link(memory, current, Link::Sibling, sibling)?;
                    break;
                }
                current = next;
                steps += 1;
            }
        }
        self.set_link(memory, number, Link::Parent, 0)?;
        self.set_link(memory, number, Link::Sibling, 0)
    }
}
