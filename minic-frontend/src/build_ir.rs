//! Lowering from the syntax tree to the three-address IR.
//!
//! Expression lowering returns the operand holding the value; statement
//! lowering returns nothing. Every temporary is a fresh slot, never
//! reused. Block labels come from a builder-wide counter so they stay
//! unique across the whole translation unit.

use std::collections::HashMap;
use minic_ir::ir::{self, BitOp, Block, BlockId, Cond, Instruction, IntOp, Operand, Slot};
use minic_syntax::ast::{self, BinaryOp, Expr, Item, Statement, UnaryOp};
use minic_syntax::position::Spanned;
use semantic::{SymbolTable, MAX_PARAMS};


pub fn build_program(program: &ast::Program, table: &SymbolTable) -> ir::Program {
    let mut builder = Builder {
        table,
        next_label: 0,
        functions: Vec::new(),
        blocks: Vec::new(),
        current: BlockId(0),
        slots: HashMap::new(),
        next_slot: 0,
    };
    for item in &program.items {
        match **item {
            Item::Function(ref function) => builder.build_function(function),
            // globals are recognised by the analyser but have no storage
            // of their own; nothing to lower at file scope
            Item::Global(_, _, _) => {}
        }
    }
    ir::Program {
        functions: builder.functions,
    }
}

struct Builder<'a> {
    table: &'a SymbolTable,
    next_label: u32,
    functions: Vec<ir::Function>,
    blocks: Vec<Block>,
    current: BlockId,
    slots: HashMap<String, Slot>,
    next_slot: u32,
}

impl<'a> Builder<'a> {
    fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        let label = format!("BB_{}", self.next_label);
        self.next_label += 1;
        self.blocks.push(Block::new(label));
        id
    }

    fn emit(&mut self, op: Instruction) {
        self.blocks[self.current.0 as usize].ops.push(op);
    }

    fn new_temp(&mut self) -> Slot {
        let slot = Slot(self.next_slot);
        self.next_slot += 1;
        slot
    }

    fn slot_of(&mut self, name: &str) -> Slot {
        if let Some(&slot) = self.slots.get(name) {
            return slot;
        }
        // a name unknown to this function must be a global; globals are
        // not emitted anywhere yet, so each one touched here gets an
        // ordinary frame slot to keep reads and writes well-formed
        debug_assert!(self.table.is_global(name));
        let slot = self.new_temp();
        self.slots.insert(name.to_string(), slot);
        slot
    }

    fn declare(&mut self, name: &str) -> Slot {
        let slot = self.new_temp();
        self.slots.insert(name.to_string(), slot);
        slot
    }

    fn build_function(&mut self, function: &ast::Function) {
        self.blocks.clear();
        self.slots.clear();
        self.next_slot = 0;
        let entry = self.new_block();
        self.current = entry;
        for (index, param) in function.params.iter().enumerate().take(MAX_PARAMS) {
            let slot = self.declare(&param.name.0);
            self.emit(Instruction::Wmem(slot, Operand::Arg(index as u8)));
        }
        for statement in &function.body {
            self.build_statement(statement);
        }
        let blocks = ::std::mem::replace(&mut self.blocks, Vec::new());
        self.functions.push(ir::Function {
            name: function.name.0.clone(),
            blocks,
            symbol_count: self.next_slot,
        });
    }

    fn build_statement(&mut self, statement: &Spanned<Statement>) {
        match **statement {
            Statement::Block(ref statements) => {
                for statement in statements {
                    self.build_statement(statement);
                }
            }
            Statement::If(ref condition, ref then, ref else_branch) => {
                self.build_if(condition, then, else_branch.as_ref().map(|s| &**s));
            }
            Statement::Return(ref value) => {
                let result = match *value {
                    Some(ref value) => self.build_expr(value),
                    None => Operand::Slot(Slot(0)),
                };
                self.emit(Instruction::Ret(result));
                // statements after the return land in a fresh block; they
                // are unreachable but the graph stays well-formed
                let next = self.new_block();
                self.current = next;
            }
            Statement::Decl(_, ref name, ref value) => {
                let slot = self.declare(&name.0);
                match *value {
                    Some(ref value) => match **value {
                        // literal initializers skip the temporary
                        Expr::Number(n) => self.emit(Instruction::LdConst(slot, n)),
                        Expr::Char(c) => self.emit(Instruction::LdConst(slot, i32::from(c))),
                        _ => {
                            let result = self.build_expr(value);
                            self.emit(Instruction::Wmem(slot, result));
                        }
                    },
                    None => {}
                }
            }
            Statement::Expr(ref expr) => {
                self.build_expr(expr);
            }
            Statement::Error => {}
        }
    }

    fn build_if(
        &mut self,
        condition: &Spanned<Expr>,
        then: &Spanned<Statement>,
        else_branch: Option<&Spanned<Statement>>,
    ) {
        self.build_expr(condition);
        let cond_block = self.current;
        let then_block = self.new_block();
        let else_block = else_branch.map(|_| self.new_block());
        let after = self.new_block();
        {
            let block = &mut self.blocks[cond_block.0 as usize];
            block.exit_true = Some(then_block);
            block.exit_false = Some(else_block.unwrap_or(after));
        }
        self.current = then_block;
        self.build_statement(then);
        self.finish_arm(after);
        if let (Some(else_block), Some(else_branch)) = (else_block, else_branch) {
            self.current = else_block;
            self.build_statement(else_branch);
            self.finish_arm(after);
        }
        self.current = after;
    }

    /// Fall through to the join block unless the arm already returned.
    fn finish_arm(&mut self, after: BlockId) {
        let block = &mut self.blocks[self.current.0 as usize];
        if !block.returns() {
            block.exit_true = Some(after);
        }
    }

    fn build_expr(&mut self, expr: &Spanned<Expr>) -> Operand {
        match **expr {
            Expr::Number(value) => {
                let dst = self.new_temp();
                self.emit(Instruction::LdConst(dst, value));
                Operand::Slot(dst)
            }
            Expr::Char(value) => {
                let dst = self.new_temp();
                self.emit(Instruction::LdConst(dst, i32::from(value)));
                Operand::Slot(dst)
            }
            Expr::Var(ref name) => {
                let src = self.slot_of(&name.0);
                let dst = self.new_temp();
                self.emit(Instruction::Rmem(dst, Operand::Slot(src)));
                Operand::Slot(dst)
            }
            Expr::Parens(ref inner) => self.build_expr(inner),
            Expr::Unary(ref op, ref operand) => self.build_unary(**op, operand),
            Expr::Binary(ref lhs, ref op, ref rhs) => self.build_binary(lhs, **op, rhs),
            Expr::Assign(ref target, ref value) => self.build_assign(target, value),
            Expr::Call(ref name, ref args) => {
                let mut arg_slots = Vec::with_capacity(args.len());
                for arg in args {
                    arg_slots.push(self.build_expr(arg));
                }
                let dst = self.new_temp();
                self.emit(Instruction::Call(name.0.clone(), dst, arg_slots));
                Operand::Slot(dst)
            }
            Expr::Error => {
                let dst = self.new_temp();
                self.emit(Instruction::LdConst(dst, 0));
                Operand::Slot(dst)
            }
        }
    }

    fn build_unary(&mut self, op: UnaryOp, operand: &Spanned<Expr>) -> Operand {
        let value = self.build_expr(operand);
        match op {
            UnaryOp::Plus => {
                let dst = self.new_temp();
                self.emit(Instruction::Rmem(dst, value));
                Operand::Slot(dst)
            }
            UnaryOp::Minus => {
                // negation is a multiplication by -1, so the result wraps
                // like any other signed 32-bit product
                let minus_one = self.new_temp();
                self.emit(Instruction::LdConst(minus_one, -1));
                let dst = self.new_temp();
                self.emit(Instruction::IntOp(
                    dst,
                    IntOp::Mul,
                    value,
                    Operand::Slot(minus_one),
                ));
                Operand::Slot(dst)
            }
            UnaryOp::Not => {
                let dst = self.new_temp();
                self.emit(Instruction::Not(dst, value));
                Operand::Slot(dst)
            }
        }
    }

    fn build_binary(
        &mut self,
        lhs: &Spanned<Expr>,
        op: BinaryOp,
        rhs: &Spanned<Expr>,
    ) -> Operand {
        let a = self.build_expr(lhs);
        let b = self.build_expr(rhs);
        let dst = self.new_temp();
        let op = match op {
            BinaryOp::Add => Instruction::IntOp(dst, IntOp::Add, a, b),
            BinaryOp::Subtract => Instruction::IntOp(dst, IntOp::Sub, a, b),
            BinaryOp::Multiply => Instruction::IntOp(dst, IntOp::Mul, a, b),
            BinaryOp::Divide => Instruction::IntOp(dst, IntOp::Div, a, b),
            BinaryOp::Modulo => Instruction::IntOp(dst, IntOp::Mod, a, b),
            BinaryOp::BitAnd => Instruction::BitOp(dst, BitOp::And, a, b),
            BinaryOp::BitXor => Instruction::BitOp(dst, BitOp::Xor, a, b),
            BinaryOp::BitOr => Instruction::BitOp(dst, BitOp::Or, a, b),
            BinaryOp::Equal => Instruction::Cmp(dst, Cond::Eq, a, b),
            BinaryOp::NotEqual => Instruction::Cmp(dst, Cond::Ne, a, b),
            BinaryOp::Less => Instruction::Cmp(dst, Cond::Lt, a, b),
            BinaryOp::LessEqual => Instruction::Cmp(dst, Cond::Le, a, b),
            BinaryOp::Greater => Instruction::Cmp(dst, Cond::Gt, a, b),
            BinaryOp::GreaterEqual => Instruction::Cmp(dst, Cond::Ge, a, b),
            BinaryOp::And => Instruction::LogicalAnd(dst, a, b),
            BinaryOp::Or => Instruction::LogicalOr(dst, a, b),
        };
        self.emit(op);
        Operand::Slot(dst)
    }

    fn build_assign(&mut self, target: &Spanned<Expr>, value: &Spanned<Expr>) -> Operand {
        let result = self.build_expr(value);
        match **target {
            Expr::Var(ref name) => {
                let slot = self.slot_of(&name.0);
                self.emit(Instruction::Wmem(slot, result));
            }
            // chained assignment: lower the inner assignment for its
            // effect, the overall value is the right-hand side
            Expr::Assign(_, _) => {
                self.build_expr(target);
            }
            _ => {}
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minic_errors::Reporter;
    use minic_syntax::{lex, parse};
    use semantic;

    fn build(source: &str) -> ir::Program {
        let reporter = Reporter::new();
        let tokens = lex(source, reporter.clone());
        let program = parse(tokens, reporter.clone());
        let table = semantic::analyze(&program, reporter.clone());
        assert!(!reporter.has_errors(), "test source failed to build");
        build_program(&program, &table)
    }

    fn main_function(program: &ir::Program) -> &ir::Function {
        program
            .functions
            .iter()
            .find(|f| f.name == "main")
            .expect("no main function")
    }

    #[test]
    fn return_constant() {
        let program = build("int main() { return 42; }");
        let main = main_function(&program);
        assert_eq!(
            main.blocks[0].ops,
            vec![
                Instruction::LdConst(Slot(0), 42),
                Instruction::Ret(Operand::Slot(Slot(0))),
            ]
        );
    }

    #[test]
    fn literal_initializer_writes_slot_directly() {
        let program = build("int main() { int a = 3; return a; }");
        let main = main_function(&program);
        assert_eq!(main.blocks[0].ops[0], Instruction::LdConst(Slot(0), 3));
    }

    #[test]
    fn character_literal_lowers_to_its_code() {
        let program = build("int main() { putchar('H'); return 0; }");
        let main = main_function(&program);
        assert_eq!(main.blocks[0].ops[0], Instruction::LdConst(Slot(0), 72));
        match main.blocks[0].ops[1] {
            Instruction::Call(ref name, dst, ref args) => {
                assert_eq!(name, "putchar");
                assert_eq!(dst, Slot(1));
                assert_eq!(args, &[Operand::Slot(Slot(0))]);
            }
            ref other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn parameters_bind_from_argument_registers() {
        let program = build("int add(int a, int b) { return a + b; } int main() { return add(20, 22); }");
        let add = &program.functions[0];
        assert_eq!(add.name, "add");
        assert_eq!(
            &add.blocks[0].ops[..2],
            &[
                Instruction::Wmem(Slot(0), Operand::Arg(0)),
                Instruction::Wmem(Slot(1), Operand::Arg(1)),
            ]
        );
    }

    #[test]
    fn unary_minus_multiplies_by_minus_one() {
        let program = build("int main() { int a = 1; return -a; }");
        let main = main_function(&program);
        let ops = &main.blocks[0].ops;
        // ldconst a, rmem tmp, ldconst -1, mul
        assert_eq!(ops[2], Instruction::LdConst(Slot(2), -1));
        assert_eq!(
            ops[3],
            Instruction::IntOp(
                Slot(3),
                IntOp::Mul,
                Operand::Slot(Slot(1)),
                Operand::Slot(Slot(2)),
            )
        );
    }

    #[test]
    fn if_else_builds_diamond() {
        let program = build("int main() { int x = 0; if (x == 0) return 1; else return 2; }");
        let main = main_function(&program);
        let entry = &main.blocks[0];
        assert_eq!(entry.exit_true, Some(BlockId(1)));
        assert_eq!(entry.exit_false, Some(BlockId(2)));
        match *entry.ops.last().unwrap() {
            Instruction::Cmp(_, Cond::Eq, _, _) => {}
            ref other => panic!("expected comparison, got {:?}", other),
        }
        // both arms return, so neither links to the join block
        assert!(main.blocks[1].returns());
        assert!(main.blocks[2].returns());
        assert_eq!(main.blocks[1].exit_true, None);
        assert_eq!(main.blocks[2].exit_true, None);
    }

    #[test]
    fn if_without_else_falls_through_to_join() {
        let program = build("int main() { int x = 1; if (x) x = 2; return x; }");
        let main = main_function(&program);
        let entry = &main.blocks[0];
        let then = entry.exit_true.unwrap();
        let after = entry.exit_false.unwrap();
        assert_eq!(main.block(then).exit_true, Some(after));
        assert!(main.block(after).returns());
    }

    #[test]
    fn logical_and_is_a_single_instruction() {
        let program = build("int main() { int a = 1; int b = 0; return a && b; }");
        let main = main_function(&program);
        let ops = &main.blocks[0].ops;
        match ops[ops.len() - 2] {
            Instruction::LogicalAnd(_, Operand::Slot(_), Operand::Slot(_)) => {}
            ref other => panic!("expected logical_and, got {:?}", other),
        }
    }

    #[test]
    fn chained_assignment_stores_both_and_returns_value() {
        let program = build("int main() { int a = 0; int b = 0; return a = b = 3; }");
        let main = main_function(&program);
        let ops = &main.blocks[0].ops;
        // a = slot 0, b = slot 1, 3 = slot 2
        assert!(ops.contains(&Instruction::Wmem(Slot(1), Operand::Slot(Slot(2)))));
        assert!(ops.contains(&Instruction::Wmem(Slot(0), Operand::Slot(Slot(2)))));
        assert_eq!(*ops.last().unwrap(), Instruction::Ret(Operand::Slot(Slot(2))));
    }

    #[test]
    fn statements_after_return_go_to_a_fresh_block() {
        let program = build("int main() { return 1; }");
        let main = main_function(&program);
        assert_eq!(main.blocks.len(), 2);
        assert!(main.blocks[0].returns());
        assert!(main.blocks[1].ops.is_empty());
    }

    #[test]
    fn globals_get_a_frame_slot_on_first_touch() {
        let program = build("int g; int main() { g = 1; return g; }");
        let main = main_function(&program);
        assert!(main.symbol_count >= 2);
    }

    #[test]
    fn call_arguments_are_evaluated_left_to_right() {
        let program = build(
            "int f(int a, int b) { return a - b; } int main() { return f(1, 2); }",
        );
        let main = main_function(&program);
        let ops = &main.blocks[0].ops;
        assert_eq!(ops[0], Instruction::LdConst(Slot(0), 1));
        assert_eq!(ops[1], Instruction::LdConst(Slot(1), 2));
        match ops[2] {
            Instruction::Call(ref name, Slot(2), ref args) => {
                assert_eq!(name, "f");
                assert_eq!(args, &[Operand::Slot(Slot(0)), Operand::Slot(Slot(1))]);
            }
            ref other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn built_ir_passes_validation() {
        let program = build(
            "int sign(int x) { if (x < 0) return 0 - 1; if (x > 0) return 1; return 0; } \
             int main() { return sign(5); }",
        );
        assert!(::minic_ir::validate_ir(&program).is_ok());
    }
}
