/// Object system operations
///
/// This module handles:
/// - Object tree operations (get_sibling, get_child, get_parent, insert_obj, remove_obj, jin)
/// - Object properties (get_prop, put_prop, get_prop_addr, get_next_prop, get_prop_len)
/// - Object attributes (test_attr, set_attr, clear_attr)
///
/// Every handler delegates to the object table, which keeps the story's
/// memory in step with its own view of the tree.
use crate::error::ZError;
use crate::instruction::Instruction;
use crate::interpreter::{ExecutionResult, Interpreter};
use crate::object::ObjectTable;
use log::debug;

impl Interpreter {
    /// Property numbers arrive as words; only the low byte is meaningful
    fn property_number(value: u16) -> u8 {
        value as u8
    }

    // ---- 2OP ----

    /// 2OP:0x06 jin - branch if the first object's parent is the second
    pub(crate) fn op_jin(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [object, parent] = self.operands(inst)?;
        let actual = self.objects.parent(object)?;
        self.do_branch(actual == parent)
    }

    /// 2OP:0x0A test_attr
    pub(crate) fn op_test_attr(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [object, attribute] = self.operands(inst)?;
        let set = self.objects.test_attr(object, attribute)?;
        self.do_branch(set)
    }

    /// 2OP:0x0B set_attr
    pub(crate) fn op_set_attr(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [object, attribute] = self.operands(inst)?;
        self.objects.set_attr(&mut self.memory, object, attribute)?;
        Ok(ExecutionResult::Continue)
    }

    /// 2OP:0x0C clear_attr
    pub(crate) fn op_clear_attr(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [object, attribute] = self.operands(inst)?;
        self.objects.clear_attr(&mut self.memory, object, attribute)?;
        Ok(ExecutionResult::Continue)
    }

    /// 2OP:0x0E insert_obj - make the object the first child of the destination
    pub(crate) fn op_insert_obj(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [object, destination] = self.operands(inst)?;
        debug!("insert_obj {} into {}", object, destination);
        self.objects
            .insert_obj(&mut self.memory, object, destination)?;
        Ok(ExecutionResult::Continue)
    }

    /// 2OP:0x11 get_prop
    pub(crate) fn op_get_prop(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [object, property] = self.operands(inst)?;
        let value = self
            .objects
            .get_prop(object, Self::property_number(property))?;
        self.store_result(value)?;
        Ok(ExecutionResult::Continue)
    }

    /// 2OP:0x12 get_prop_addr
    pub(crate) fn op_get_prop_addr(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [object, property] = self.operands(inst)?;
        let addr = self
            .objects
            .get_prop_addr(object, Self::property_number(property))?;
        self.store_result(addr)?;
        Ok(ExecutionResult::Continue)
    }

    /// 2OP:0x13 get_next_prop
    pub(crate) fn op_get_next_prop(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [object, property] = self.operands(inst)?;
        let next = self
            .objects
            .get_next_prop(object, Self::property_number(property))?;
        self.store_result(next)?;
        Ok(ExecutionResult::Continue)
    }

    // ---- 1OP ----

    /// 1OP:0x01 get_sibling - store the sibling, branch if there is one
    pub(crate) fn op_get_sibling(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [object] = self.operands(inst)?;
        let sibling = self.objects.sibling(object)?;
        self.store_result(sibling)?;
        self.do_branch(sibling != 0)
    }

    /// 1OP:0x02 get_child - store the first child, branch if there is one
    pub(crate) fn op_get_child(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [object] = self.operands(inst)?;
        let child = self.objects.child(object)?;
        self.store_result(child)?;
        self.do_branch(child != 0)
    }

    /// 1OP:0x03 get_parent
    pub(crate) fn op_get_parent(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [object] = self.operands(inst)?;
        let parent = self.objects.parent(object)?;
        self.store_result(parent)?;
        Ok(ExecutionResult::Continue)
    }

    /// 1OP:0x04 get_prop_len - operand is a property data address
    pub(crate) fn op_get_prop_len(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [addr] = self.operands(inst)?;
        let len = ObjectTable::get_prop_len(&self.memory, addr)?;
        self.store_result(len)?;
        Ok(ExecutionResult::Continue)
    }

    /// 1OP:0x09 remove_obj
    pub(crate) fn op_remove_obj(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [object] = self.operands(inst)?;
        debug!("remove_obj {}", object);
        self.objects.remove_obj(&mut self.memory, object)?;
        Ok(ExecutionResult::Continue)
    }

    // ---- VAR ----

    /// VAR:0x03 put_prop
    pub(crate) fn op_put_prop(&mut self, inst: &Instruction) -> Result<ExecutionResult, ZError> {
        let [object, property, value] = self.operands(inst)?;
        self.objects.put_prop(
            &mut self.memory,
            object,
            Self::property_number(property),
            value,
        )?;
        Ok(ExecutionResult::Continue)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ZError;
    use crate::interpreter::Interpreter;
    use crate::test_utils::{interpreter, StoryBuilder};
    use test_log::test;

    fn run(code: &[u8], steps: usize) -> Interpreter {
        let (mut interp, _) = interpreter(StoryBuilder::new().code(code));
        for _ in 0..steps {
            interp.step().unwrap();
        }
        interp
    }

    #[test]
    fn test_jin() {
        // jin #02 #01 [true] +5
        let interp = run(&[0x06, 0x02, 0x01, 0xC5], 1);
        assert_eq!(interp.pc(), StoryBuilder::CODE + 4 + 5 - 2);
        // jin #01 #02 [true] +5
        let interp = run(&[0x06, 0x01, 0x02, 0xC5], 1);
        assert_eq!(interp.pc(), StoryBuilder::CODE + 4);
    }

    #[test]
    fn test_tree_walk_opcodes() {
        // get_child #01 -> G00 [true] +5 : the lamp
        let mut interp = run(&[0x92, 0x01, 0x10, 0xC5], 1);
        assert_eq!(interp.read_variable(0x10).unwrap(), 2);
        assert_eq!(interp.pc(), StoryBuilder::CODE + 4 + 5 - 2);

        // get_sibling #03 -> G00 [true] +5 : the key has none
        let mut interp = run(&[0x91, 0x03, 0x10, 0xC5], 1);
        assert_eq!(interp.read_variable(0x10).unwrap(), 0);
        assert_eq!(interp.pc(), StoryBuilder::CODE + 4);

        // get_parent #03 -> sp
        let mut interp = run(&[0x93, 0x03, 0x00], 1);
        assert_eq!(interp.read_variable(0).unwrap(), 1);
    }

    #[test]
    fn test_insert_obj_moves_into_destination() {
        // remove_obj #03 ; insert_obj #03 #02
        let interp = run(&[0x99, 0x03, 0x0E, 0x03, 0x02], 2);
        assert_eq!(interp.objects.parent(3).unwrap(), 2);
        assert_eq!(interp.objects.child(2).unwrap(), 3);
        assert_eq!(interp.objects.sibling(2).unwrap(), 0);
        // parent byte of object 3 in memory
        let record = StoryBuilder::OBJECTS + 62 + 2 * 9;
        assert_eq!(interp.memory.get_byte(record + 4).unwrap(), 2);
    }

    #[test]
    fn test_insert_obj_zero_faults() {
        let (mut interp, _) = interpreter(StoryBuilder::new().code(&[0x0E, 0x00, 0x01]));
        let fault = interp.step().unwrap_err();
        assert_eq!(fault.source, ZError::InvalidObject(0));
    }

    #[test]
    fn test_attributes() {
        // set_attr #02 #07 ; test_attr #02 #07 [true] +5
        let interp = run(&[0x0B, 0x02, 0x07, 0x0A, 0x02, 0x07, 0xC5], 2);
        assert_eq!(interp.pc(), StoryBuilder::CODE + 7 + 5 - 2);
        assert!(interp.objects.test_attr(2, 7).unwrap());

        // clear_attr #01 #00 ; test_attr #01 #00 [true] +5
        let interp = run(&[0x0C, 0x01, 0x00, 0x0A, 0x01, 0x00, 0xC5], 2);
        assert_eq!(interp.pc(), StoryBuilder::CODE + 7);
    }

    #[test]
    fn test_property_opcodes() {
        // get_prop #02 #05 -> sp ; get_prop #02 #04 -> sp (default)
        let mut interp = run(&[0x11, 0x02, 0x05, 0x00, 0x11, 0x02, 0x04, 0x00], 2);
        assert_eq!(interp.read_variable(0).unwrap(), 0x44);
        assert_eq!(interp.read_variable(0).unwrap(), 0x1234);

        // get_prop_addr #02 #05 -> sp ; get_prop_len sp -> sp
        let mut interp = run(&[0x12, 0x02, 0x05, 0x00, 0xA4, 0x00, 0x00], 2);
        assert_eq!(interp.read_variable(0).unwrap(), 2);

        // get_next_prop #02 #00 -> sp ; get_next_prop #02 #05 -> sp
        let mut interp = run(&[0x13, 0x02, 0x00, 0x00, 0x13, 0x02, 0x05, 0x00], 2);
        assert_eq!(interp.read_variable(0).unwrap(), 3);
        assert_eq!(interp.read_variable(0).unwrap(), 5);
    }

    #[test]
    fn test_put_prop() {
        // put_prop #02 #05 #beef
        let interp = run(&[0xE3, 0x53, 0x02, 0x05, 0xBE, 0xEF], 1);
        assert_eq!(interp.objects.get_prop(2, 5).unwrap(), 0xbeef);
        assert_eq!(interp.memory.get_word(0x166).unwrap(), 0xbeef);

        // put_prop #02 #04 #01 : the lamp has no property 4
        let (mut interp, _) =
            interpreter(StoryBuilder::new().code(&[0xE3, 0x57, 0x02, 0x04, 0x01]));
        let fault = interp.step().unwrap_err();
        assert_eq!(
            fault.source,
            ZError::MissingProperty {
                object: 2,
                property: 4
            }
        );
    }

    #[test]
    fn test_invalid_object_faults() {
        // get_parent #09 -> sp
        let (mut interp, _) = interpreter(StoryBuilder::new().code(&[0x93, 0x09, 0x00]));
        let fault = interp.step().unwrap_err();
        assert_eq!(fault.source, ZError::InvalidObject(9));
    }
}
