//! Structural checks over built IR.
//!
//! A well-formed front end never produces IR that fails these checks, so a
//! validation error is a compiler bug rather than a user error.

use std::collections::HashSet;
use ir::{Block, BlockId, Function, Program};


#[derive(PartialEq, Eq, Debug)]
pub enum Error {
    MissingEntry,
    DuplicateLabel(String),
    UnknownBlock(BlockId),
    RetNotLast(BlockId),
    MultipleRets(BlockId),
    ConditionalWithoutValue(BlockId),
}

/// Validate every function, returning the offending function name on
/// failure.
pub fn validate_ir(program: &Program) -> Result<(), (String, Error)> {
    for function in &program.functions {
        validate_function(function).map_err(|e| (function.name.clone(), e))?;
    }
    Ok(())
}

fn validate_function(function: &Function) -> Result<(), Error> {
    if function.blocks.is_empty() {
        return Err(Error::MissingEntry);
    }
    let mut labels = HashSet::new();
    for block in &function.blocks {
        if !labels.insert(&block.label) {
            return Err(Error::DuplicateLabel(block.label.clone()));
        }
    }
    for (index, block) in function.blocks.iter().enumerate() {
        validate_block(function, BlockId(index as u32), block)?;
    }
    Ok(())
}

fn validate_block(function: &Function, id: BlockId, block: &Block) -> Result<(), Error> {
    let ret_count = block.ops.iter().filter(|op| op.is_ret()).count();
    if ret_count > 1 {
        return Err(Error::MultipleRets(id));
    }
    if ret_count == 1 && !block.returns() {
        return Err(Error::RetNotLast(id));
    }
    for &exit in &[block.exit_true, block.exit_false] {
        if let Some(target) = exit {
            if target.0 as usize >= function.blocks.len() {
                return Err(Error::UnknownBlock(target));
            }
        }
    }
    if block.exit_true.is_some() && block.exit_false.is_some()
        && block.condition_slot().is_none()
    {
        return Err(Error::ConditionalWithoutValue(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir::{Instruction, Operand, Slot};

    fn function_with(blocks: Vec<Block>) -> Program {
        Program {
            functions: vec![Function {
                name: "main".into(),
                blocks,
                symbol_count: 1,
            }],
        }
    }

    #[test]
    fn accepts_minimal_function() {
        let mut block = Block::new("BB_0".into());
        block.ops.push(Instruction::LdConst(Slot(0), 0));
        block.ops.push(Instruction::Ret(Operand::Slot(Slot(0))));
        assert!(validate_ir(&function_with(vec![block])).is_ok());
    }

    #[test]
    fn rejects_ret_in_the_middle() {
        let mut block = Block::new("BB_0".into());
        block.ops.push(Instruction::Ret(Operand::Slot(Slot(0))));
        block.ops.push(Instruction::LdConst(Slot(0), 0));
        let result = validate_ir(&function_with(vec![block]));
        assert_eq!(result, Err(("main".into(), Error::RetNotLast(BlockId(0)))));
    }

    #[test]
    fn rejects_duplicate_labels() {
        let a = Block::new("BB_0".into());
        let b = Block::new("BB_0".into());
        let result = validate_ir(&function_with(vec![a, b]));
        assert_eq!(
            result,
            Err(("main".into(), Error::DuplicateLabel("BB_0".into())))
        );
    }

    #[test]
    fn rejects_edge_out_of_range() {
        let mut block = Block::new("BB_0".into());
        block.exit_true = Some(BlockId(7));
        let result = validate_ir(&function_with(vec![block]));
        assert_eq!(result, Err(("main".into(), Error::UnknownBlock(BlockId(7)))));
    }

    #[test]
    fn rejects_conditional_block_with_no_value() {
        let mut cond = Block::new("BB_0".into());
        cond.exit_true = Some(BlockId(1));
        cond.exit_false = Some(BlockId(2));
        let then = Block::new("BB_1".into());
        let after = Block::new("BB_2".into());
        let result = validate_ir(&function_with(vec![cond, then, after]));
        assert_eq!(
            result,
            Err(("main".into(), Error::ConditionalWithoutValue(BlockId(0))))
        );
    }
}
