//! Decoding of arbitrary bytes into structured control flow skeletons.
//!
//! Every byte string decodes to a well-formed body: `break` and `continue` only appear
//! where they have a target, labels are unique, and every loop condition reads a variable
//! so that no loop is endless by construction.

use std::sync::Arc;

use flowscope::{
    ast::{AstBuilder, BinaryOp, Block, CaseBody, MethodSig, Stmt},
    types::Type,
};

const MAX_DEPTH: usize = 5;
const MAX_STATEMENTS: usize = 4;

/// Decodes `data` into a statement block.
pub fn skeleton(data: &[u8]) -> Block {
    let ast = AstBuilder::new();
    let mut decoder = Decoder {
        data,
        pos: 0,
        ast: &ast,
        depth: 0,
        labels: Vec::new(),
        loops: 0,
        breakable: 0,
        next_label: 0,
    };
    let stmts = decoder.stmts();
    ast.block(stmts)
}

struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    ast: &'a AstBuilder,
    depth: usize,
    /// Labels of the enclosing labeled loops.
    labels: Vec<String>,
    loops: usize,
    breakable: usize,
    next_label: usize,
}

impl Decoder<'_> {
    fn byte(&mut self) -> u8 {
        let byte = self.data.get(self.pos).copied().unwrap_or(0);
        self.pos += 1;
        byte
    }

    fn exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn stmts(&mut self) -> Vec<Stmt> {
        let count = usize::from(self.byte()) % MAX_STATEMENTS + 1;
        let mut stmts = Vec::with_capacity(count);
        for _ in 0..count {
            if self.exhausted() {
                break;
            }
            stmts.push(self.stmt());
        }
        stmts
    }

    fn nested(&mut self) -> Stmt {
        self.depth += 1;
        let stmts = self.stmts();
        self.depth -= 1;
        self.ast.block_stmt(stmts)
    }

    fn nested_block(&mut self) -> Block {
        self.depth += 1;
        let stmts = self.stmts();
        self.depth -= 1;
        self.ast.block(stmts)
    }

    fn fresh_label(&mut self) -> String {
        self.next_label += 1;
        format!("L{}", self.next_label)
    }

    fn stmt(&mut self) -> Stmt {
        let ast = self.ast;
        let choice = if self.depth >= MAX_DEPTH {
            0
        } else {
            self.byte() % 12
        };

        match choice {
            1 => {
                let cond = ast.local("flag", Type::boolean());
                let then = self.nested();
                let otherwise = (self.byte() % 2 == 0).then(|| self.nested());
                ast.if_stmt(cond, then, otherwise)
            }
            2 => self.while_loop(),
            3 => {
                self.enter_loop();
                let body = self.nested();
                self.leave_loop();
                ast.do_while(body, ast.local("flag", Type::boolean()))
            }
            4 => {
                let label = self.fresh_label();
                self.labels.push(label.clone());
                let body = self.while_loop();
                self.labels.pop();
                ast.labeled(&label, body)
            }
            5 if self.breakable > 0 || !self.labels.is_empty() => {
                let index = usize::from(self.byte());
                if (self.breakable > 0 && index % 2 == 0) || self.labels.is_empty() {
                    ast.break_stmt(None)
                } else {
                    let label = self.labels[index % self.labels.len()].clone();
                    ast.break_stmt(Some(&label))
                }
            }
            6 if self.loops > 0 => {
                let index = usize::from(self.byte());
                if self.labels.is_empty() || index % 2 == 0 {
                    ast.continue_stmt(None)
                } else {
                    let label = self.labels[index % self.labels.len()].clone();
                    ast.continue_stmt(Some(&label))
                }
            }
            7 => ast.return_stmt(None),
            8 => self.try_stmt(),
            9 => self.switch(),
            10 => {
                let ctor = Arc::new(MethodSig::constructor(
                    Type::class("java.lang.RuntimeException"),
                    vec![],
                ));
                ast.throw(ast.new_object(&ctor, vec![]))
            }
            11 => {
                let risky = Arc::new(
                    MethodSig::new(Type::class("Test"), "risky", vec![], Type::Void).with_static(),
                );
                ast.expr_stmt(ast.call(None, &risky, vec![]))
            }
            _ => ast.expr_stmt(ast.assign(
                ast.local("x", Type::int()),
                ast.binary(
                    BinaryOp::Add,
                    ast.local("x", Type::int()),
                    ast.int(i64::from(self.byte())),
                ),
            )),
        }
    }

    fn enter_loop(&mut self) {
        self.loops += 1;
        self.breakable += 1;
    }

    fn leave_loop(&mut self) {
        self.loops -= 1;
        self.breakable -= 1;
    }

    fn while_loop(&mut self) -> Stmt {
        let ast = self.ast;
        self.enter_loop();
        let body = self.nested();
        self.leave_loop();
        ast.while_stmt(
            ast.binary(
                BinaryOp::Lt,
                ast.local("i", Type::int()),
                ast.local("n", Type::int()),
            ),
            body,
        )
    }

    fn try_stmt(&mut self) -> Stmt {
        let ast = self.ast;
        let block = self.nested_block();
        let shape = self.byte() % 3;

        let catches = if shape != 1 {
            let param = ast.var("e", Type::class("java.lang.RuntimeException"), None);
            vec![ast.catch(param, self.nested_block())]
        } else {
            Vec::new()
        };
        let finally = (shape != 0).then(|| self.nested_block());
        ast.try_stmt(block, catches, finally)
    }

    fn switch(&mut self) -> Stmt {
        let ast = self.ast;
        self.breakable += 1;
        let mut cases = Vec::new();
        let arms = usize::from(self.byte()) % 3 + 1;
        for value in 0..arms {
            let body = CaseBody::Statements(self.stmts_nested());
            cases.push(ast.case(vec![ast.int(value as i64 + 1)], body));
        }
        if self.byte() % 2 == 0 {
            let position = usize::from(self.byte()) % (cases.len() + 1);
            let body = CaseBody::Statements(self.stmts_nested());
            cases.insert(position, ast.default_case(body));
        }
        self.breakable -= 1;
        ast.switch_stmt(ast.local("x", Type::int()), cases)
    }

    fn stmts_nested(&mut self) -> Vec<Stmt> {
        self.depth += 1;
        let stmts = self.stmts();
        self.depth -= 1;
        stmts
    }
}
