//! Code generation: lower the parsed AST into NASM-flavoured x86-64.
//!
//! The emitter is a stack machine on the hardware stack: every expression
//! evaluates to one 8-byte slot pushed on top, every binary operation pops
//! two slots through `rax`/`rbx` and pushes the result. Named variables are
//! nothing more than slots that stay behind: a `let` registers the slot its
//! initializer just pushed, and scope exit drops the slots declared since
//! the matching scope entry by bumping `rsp`.

use crate::ast::{Ast, BinOp, Expr, ExprId, IfPred, IfPredId, ScopeId, Stmt, StmtId, Term};
use crate::error::{
  CompileResult, DuplicateIdentifierSnafu, NotImplementedSnafu, UndeclaredIdentifierSnafu,
};
use crate::parser::Program;

/// Emit assembly for a whole program.
pub fn generate(program: &Program) -> CompileResult<String> {
  Generator::new(program).gen_prog()
}

/// A named stack slot. `stack_loc` is the logical depth at declaration;
/// references resolve to `rsp + 8 * (current_depth - stack_loc)`.
struct Var {
  name: String,
  stack_loc: usize,
}

struct Generator<'a> {
  ast: &'a Ast,
  stmts: &'a [StmtId],
  out: String,
  bss: String,
  /// Logical stack depth in slots; mutated by every push/pop emission.
  stack_size: usize,
  /// Active variables, declaration order, innermost last.
  vars: Vec<Var>,
  /// Active-variable count snapshot at each open scope.
  scopes: Vec<usize>,
  label_count: usize,
}

impl<'a> Generator<'a> {
  fn new(program: &'a Program) -> Self {
    Self {
      ast: &program.ast,
      stmts: &program.stmts,
      out: String::new(),
      bss: String::new(),
      stack_size: 0,
      vars: Vec::new(),
      scopes: Vec::new(),
      label_count: 0,
    }
  }

  fn gen_prog(mut self) -> CompileResult<String> {
    self.out.push_str("global _start\n_start:\n");
    for &stmt in self.stmts {
      self.gen_stmt(stmt)?;
    }

    // Implicit exit(0) after the last statement.
    self.out.push_str("    mov rax, 60\n");
    self.out.push_str("    mov rdi, 0\n");
    self.out.push_str("    syscall\n");

    // Reserved data section; empty until `print` grows a real lowering.
    self.out.push_str(&self.bss);
    Ok(self.out)
  }

  fn gen_stmt(&mut self, id: StmtId) -> CompileResult<()> {
    let ast = self.ast;
    match ast.stmt(id) {
      Stmt::Exit { expr } => {
        self.gen_expr(*expr)?;
        self.out.push_str("    mov rax, 60\n");
        self.pop("rdi");
        self.out.push_str("    syscall\n");
        Ok(())
      }
      Stmt::Let { ident, init } => {
        // The initializer's push *is* the variable's storage; nothing else
        // is emitted here.
        self.gen_expr(*init)?;
        let name = ident.text();
        let scope_start = self.scopes.last().copied().unwrap_or(0);
        if self.vars[scope_start..].iter().any(|var| var.name == name) {
          return DuplicateIdentifierSnafu { name }.fail();
        }
        self.vars.push(Var {
          name: name.to_string(),
          stack_loc: self.stack_size,
        });
        Ok(())
      }
      Stmt::Scope { scope } => self.gen_scope(*scope),
      Stmt::If { cond, scope, pred } => {
        self.gen_expr(*cond)?;
        // The end label exists only when there is an elif/else tail to
        // jump over.
        let end_label = pred.as_ref().map(|_| self.create_label());
        let false_label = self.create_label();
        self.pop("rax");
        self.out.push_str("    test rax, rax\n");
        self.out.push_str(&format!("    jz {false_label}\n"));
        self.gen_scope(*scope)?;
        if let (Some(pred), Some(end_label)) = (pred, end_label) {
          self.out.push_str(&format!("    jmp {end_label}\n"));
          self.out.push_str(&format!("{false_label}:\n"));
          self.gen_if_pred(*pred, &end_label)?;
          self.out.push_str(&format!("{end_label}:\n"));
        } else {
          self.out.push_str(&format!("{false_label}:\n"));
        }
        Ok(())
      }
      Stmt::Assign { ident, expr } => {
        self.gen_expr(*expr)?;
        let name = ident.text();
        let stack_loc = match self.vars.iter().rev().find(|var| var.name == name) {
          Some(var) => var.stack_loc,
          None => return UndeclaredIdentifierSnafu { name }.fail(),
        };
        self.pop("rax");
        let offset = (self.stack_size - stack_loc) * 8;
        self.out.push_str(&format!("    mov [rsp + {offset}], rax\n"));
        Ok(())
      }
      Stmt::Print { .. } => NotImplementedSnafu {
        what: "code generation for `print`",
      }
      .fail(),
      Stmt::Function { .. } => NotImplementedSnafu {
        what: "code generation for function definitions",
      }
      .fail(),
      Stmt::FunctionCall { .. } => NotImplementedSnafu {
        what: "code generation for function calls",
      }
      .fail(),
    }
  }

  fn gen_scope(&mut self, id: ScopeId) -> CompileResult<()> {
    self.begin_scope();
    let ast = self.ast;
    for &stmt in &ast.scope(id).stmts {
      self.gen_stmt(stmt)?;
    }
    self.end_scope();
    Ok(())
  }

  /// One `elif` arm or the final `else`. Every arm of a chain jumps to the
  /// same `end_label`, owned by the chain's `if`.
  fn gen_if_pred(&mut self, id: IfPredId, end_label: &str) -> CompileResult<()> {
    let ast = self.ast;
    match ast.pred(id) {
      IfPred::Elif { cond, scope, next } => {
        self.gen_expr(*cond)?;
        let false_label = self.create_label();
        self.pop("rax");
        self.out.push_str("    test rax, rax\n");
        self.out.push_str(&format!("    jz {false_label}\n"));
        self.gen_scope(*scope)?;
        self.out.push_str(&format!("    jmp {end_label}\n"));
        self.out.push_str(&format!("{false_label}:\n"));
        if let Some(next) = next {
          self.gen_if_pred(*next, end_label)?;
        }
        Ok(())
      }
      IfPred::Else { scope } => self.gen_scope(*scope),
    }
  }

  fn gen_expr(&mut self, id: ExprId) -> CompileResult<()> {
    let ast = self.ast;
    match ast.expr(id) {
      Expr::Term(term) => self.gen_term(term),
      Expr::Binary { op, lhs, rhs } => self.gen_bin_expr(*op, *lhs, *rhs),
    }
  }

  fn gen_term(&mut self, term: &Term) -> CompileResult<()> {
    match term {
      Term::IntLit(token) | Term::CharLit(token) => {
        self.out.push_str(&format!("    mov rax, {}\n", token.text()));
        self.push("rax");
        Ok(())
      }
      Term::FloatLit(_) => NotImplementedSnafu {
        what: "code generation for float literals",
      }
      .fail(),
      Term::Ident(token) => {
        // Innermost declaration wins: scan the active list back to front.
        let name = token.text();
        let offset = match self.vars.iter().rev().find(|var| var.name == name) {
          Some(var) => (self.stack_size - var.stack_loc) * 8,
          None => return UndeclaredIdentifierSnafu { name }.fail(),
        };
        self.push(&format!("QWORD [rsp + {offset}]"));
        Ok(())
      }
      Term::Paren(expr) => self.gen_expr(*expr),
    }
  }

  /// RHS first, LHS second: after both pushes the LHS is on top, so the
  /// pop order below maps source-level `a - b` onto `rax - rbx`. The order
  /// matters only for `-`, `/` and `%`, but is kept uniform.
  fn gen_bin_expr(&mut self, op: BinOp, lhs: ExprId, rhs: ExprId) -> CompileResult<()> {
    self.gen_expr(rhs)?;
    self.gen_expr(lhs)?;
    self.pop("rax");
    self.pop("rbx");
    match op {
      BinOp::Add => self.out.push_str("    add rax, rbx\n"),
      BinOp::Sub => self.out.push_str("    sub rax, rbx\n"),
      BinOp::Mul => self.out.push_str("    mul rbx\n"),
      BinOp::Div => self.out.push_str("    div rbx\n"),
      BinOp::Mod => {
        // Unsigned division leaves the remainder in rdx.
        self.out.push_str("    xor rdx, rdx\n");
        self.out.push_str("    div rbx\n");
        self.out.push_str("    mov rax, rdx\n");
      }
    }
    self.push("rax");
    Ok(())
  }

  // ----- Stack and scope bookkeeping -----

  fn push(&mut self, src: &str) {
    self.out.push_str(&format!("    push {src}\n"));
    self.stack_size += 1;
  }

  fn pop(&mut self, dst: &str) {
    self.out.push_str(&format!("    pop {dst}\n"));
    self.stack_size -= 1;
  }

  fn begin_scope(&mut self) {
    self.scopes.push(self.vars.len());
  }

  /// Drop every slot declared since the matching `begin_scope` and forget
  /// the variables that lived in them.
  fn end_scope(&mut self) {
    let boundary = self.scopes.pop().unwrap_or(0);
    let pop_count = self.vars.len() - boundary;
    if pop_count > 0 {
      self.out.push_str(&format!("    add rsp, {}\n", pop_count * 8));
    }
    self.stack_size -= pop_count;
    self.vars.truncate(boundary);
  }

  fn create_label(&mut self) -> String {
    let label = format!("label{}", self.label_count);
    self.label_count += 1;
    label
  }
}
