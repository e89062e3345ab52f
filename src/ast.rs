//! AST node types and the arena container that owns them.
//!
//! The tree is a strict hierarchy of tagged enums addressed by typed ids:
//! children are `ExprId`/`StmtId`/... handles into the arenas held by
//! [`Ast`]. One `Ast` value per compilation; everything it allocated is
//! released together when it drops.

use crate::arena::{Arena, Budget, DEFAULT_CAPACITY, Id};
use crate::error::CompileResult;
use crate::tokenizer::{Token, TokenKind};

pub type ExprId = Id<Expr>;
pub type StmtId = Id<Stmt>;
pub type ScopeId = Id<Scope>;
pub type IfPredId = Id<IfPred>;

/// Binary operators recognised by the language, with their precedence
/// levels. Adding an operator means extending `of_token`, `precedence`,
/// `symbol`, and the generator's instruction table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
  Add,
  Sub,
  Mul,
  Div,
  Mod,
}

impl BinOp {
  /// The operator a token denotes, if any. This is the parser's half of the
  /// operator table; `Generator::gen_bin_expr` holds the emission half.
  pub fn of_token(kind: TokenKind) -> Option<Self> {
    match kind {
      TokenKind::Plus => Some(BinOp::Add),
      TokenKind::Minus => Some(BinOp::Sub),
      TokenKind::Star => Some(BinOp::Mul),
      TokenKind::FSlash => Some(BinOp::Div),
      TokenKind::Percent => Some(BinOp::Mod),
      _ => None,
    }
  }

  /// Binding strength for precedence climbing. Higher binds tighter.
  pub fn precedence(self) -> u8 {
    match self {
      BinOp::Add | BinOp::Sub => 0,
      BinOp::Mul | BinOp::Div | BinOp::Mod => 1,
    }
  }

  pub fn symbol(self) -> &'static str {
    match self {
      BinOp::Add => "+",
      BinOp::Sub => "-",
      BinOp::Mul => "*",
      BinOp::Div => "/",
      BinOp::Mod => "%",
    }
  }
}

/// Atomic expression: a literal, an identifier, or a parenthesized
/// sub-expression.
#[derive(Debug)]
pub enum Term {
  IntLit(Token),
  CharLit(Token),
  FloatLit(Token),
  Ident(Token),
  Paren(ExprId),
}

#[derive(Debug)]
pub enum Expr {
  Term(Term),
  Binary { op: BinOp, lhs: ExprId, rhs: ExprId },
}

/// Convenience constructors to keep the parser's allocation sites readable.
impl Expr {
  pub fn int_lit(token: Token) -> Self {
    Self::Term(Term::IntLit(token))
  }

  pub fn char_lit(token: Token) -> Self {
    Self::Term(Term::CharLit(token))
  }

  pub fn float_lit(token: Token) -> Self {
    Self::Term(Term::FloatLit(token))
  }

  pub fn ident(token: Token) -> Self {
    Self::Term(Term::Ident(token))
  }

  pub fn paren(expr: ExprId) -> Self {
    Self::Term(Term::Paren(expr))
  }

  pub fn binary(op: BinOp, lhs: ExprId, rhs: ExprId) -> Self {
    Self::Binary { op, lhs, rhs }
  }
}

/// A `{ ... }` region. Variables declared inside die at the closing brace.
#[derive(Debug)]
pub struct Scope {
  pub stmts: Vec<StmtId>,
}

/// The tail of an `if` chain: either another guarded arm or the final
/// `else`.
#[derive(Debug)]
pub enum IfPred {
  Elif {
    cond: ExprId,
    scope: ScopeId,
    next: Option<IfPredId>,
  },
  Else { scope: ScopeId },
}

#[derive(Debug)]
pub enum Stmt {
  Exit {
    expr: ExprId,
  },
  Let {
    ident: Token,
    init: ExprId,
  },
  Scope {
    scope: ScopeId,
  },
  If {
    cond: ExprId,
    scope: ScopeId,
    pred: Option<IfPredId>,
  },
  Assign {
    ident: Token,
    expr: ExprId,
  },
  Print {
    expr: ExprId,
  },
  Function {
    name: Token,
    params: Vec<Token>,
    scope: ScopeId,
  },
  FunctionCall {
    name: Token,
    args: Vec<ExprId>,
  },
}

/// Owns every node of one compilation. Created by the parser, read by the
/// generator, dropped as a whole.
#[derive(Debug)]
pub struct Ast {
  exprs: Arena<Expr>,
  stmts: Arena<Stmt>,
  scopes: Arena<Scope>,
  preds: Arena<IfPred>,
  budget: Budget,
}

impl Ast {
  pub fn new() -> Self {
    Self::with_capacity(DEFAULT_CAPACITY)
  }

  /// Build an `Ast` with a custom arena reservation, in bytes.
  pub fn with_capacity(bytes: usize) -> Self {
    Self {
      exprs: Arena::new(),
      stmts: Arena::new(),
      scopes: Arena::new(),
      preds: Arena::new(),
      budget: Budget::new(bytes),
    }
  }

  pub fn alloc_expr(&mut self, expr: Expr) -> CompileResult<ExprId> {
    self.exprs.alloc(&mut self.budget, expr)
  }

  pub fn alloc_stmt(&mut self, stmt: Stmt) -> CompileResult<StmtId> {
    self.stmts.alloc(&mut self.budget, stmt)
  }

  pub fn alloc_scope(&mut self, scope: Scope) -> CompileResult<ScopeId> {
    self.scopes.alloc(&mut self.budget, scope)
  }

  pub fn alloc_pred(&mut self, pred: IfPred) -> CompileResult<IfPredId> {
    self.preds.alloc(&mut self.budget, pred)
  }

  pub fn expr(&self, id: ExprId) -> &Expr {
    &self.exprs[id]
  }

  pub fn stmt(&self, id: StmtId) -> &Stmt {
    &self.stmts[id]
  }

  pub fn scope(&self, id: ScopeId) -> &Scope {
    &self.scopes[id]
  }

  pub fn pred(&self, id: IfPredId) -> &IfPred {
    &self.preds[id]
  }

  /// Render an expression with explicit parentheses around every binary
  /// node. Re-parsing the output reproduces the same structure modulo the
  /// inserted parenthesis terms; mostly a debugging aid.
  pub fn parenthesize(&self, id: ExprId) -> String {
    match self.expr(id) {
      Expr::Term(term) => match term {
        Term::IntLit(token)
        | Term::CharLit(token)
        | Term::FloatLit(token)
        | Term::Ident(token) => token.text().to_string(),
        Term::Paren(inner) => format!("({})", self.parenthesize(*inner)),
      },
      Expr::Binary { op, lhs, rhs } => format!(
        "({} {} {})",
        self.parenthesize(*lhs),
        op.symbol(),
        self.parenthesize(*rhs)
      ),
    }
  }
}

impl Default for Ast {
  fn default() -> Self {
    Self::new()
  }
}
