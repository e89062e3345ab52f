//! Recursive-descent parser producing the program AST.
//!
//! Statements are parsed by straight recursive descent; expressions by
//! precedence climbing with the operator table in [`BinOp`]. Every node is
//! allocated into the [`Ast`] arenas, so the parser owns the arena for the
//! duration of the parse and hands it off inside the returned [`Program`].
//!
//! The parser terminates on the first error and never recovers. Errors are
//! phrased as "Expected <what>" against the line of the token *preceding*
//! the failure, which is where the missing element was due.

use crate::ast::{Ast, BinOp, Expr, ExprId, IfPred, IfPredId, Scope, ScopeId, Stmt, StmtId};
use crate::error::{CompileError, CompileResult, UnexpectedTokenSnafu};
use crate::tokenizer::{Token, TokenKind};

/// A parsed program: the top-level statement sequence plus the arena all of
/// its nodes live in.
#[derive(Debug)]
pub struct Program {
  pub ast: Ast,
  pub stmts: Vec<StmtId>,
}

/// Parse the token stream into a [`Program`]. An empty token stream is a
/// valid (empty) program.
pub fn parse(tokens: Vec<Token>) -> CompileResult<Program> {
  let mut parser = Parser::new(tokens);

  let mut stmts = Vec::new();
  while parser.peek().is_some() {
    match parser.parse_stmt()? {
      Some(stmt) => stmts.push(stmt),
      None => return Err(parser.error_expected("statement")),
    }
  }

  Ok(Program {
    ast: parser.ast,
    stmts,
  })
}

struct Parser {
  tokens: Vec<Token>,
  pos: usize,
  ast: Ast,
}

impl Parser {
  fn new(tokens: Vec<Token>) -> Self {
    Self {
      tokens,
      pos: 0,
      ast: Ast::new(),
    }
  }

  // ----- Statement parsing -----

  /// Parse one statement, or return `None` when the next token cannot start
  /// one (callers decide whether that is the end of a scope or an error).
  fn parse_stmt(&mut self) -> CompileResult<Option<StmtId>> {
    if self.try_consume(TokenKind::Exit).is_some() {
      self.expect(TokenKind::OpenParen)?;
      let Some(expr) = self.parse_expr(0)? else {
        return Err(self.error_expected("expression"));
      };
      self.expect(TokenKind::CloseParen)?;
      self.expect(TokenKind::Semi)?;
      return Ok(Some(self.ast.alloc_stmt(Stmt::Exit { expr })?));
    }

    if self.try_consume(TokenKind::Let).is_some() {
      let ident = self.expect(TokenKind::Ident)?;
      self.expect(TokenKind::Eq)?;
      let Some(init) = self.parse_expr(0)? else {
        return Err(self.error_expected("expression"));
      };
      self.expect(TokenKind::Semi)?;
      return Ok(Some(self.ast.alloc_stmt(Stmt::Let { ident, init })?));
    }

    if let Some(scope) = self.parse_scope()? {
      return Ok(Some(self.ast.alloc_stmt(Stmt::Scope { scope })?));
    }

    if self.try_consume(TokenKind::If).is_some() {
      self.expect(TokenKind::OpenParen)?;
      let Some(cond) = self.parse_expr(0)? else {
        return Err(self.error_expected("expression"));
      };
      self.expect(TokenKind::CloseParen)?;
      let Some(scope) = self.parse_scope()? else {
        return Err(self.error_expected("scope"));
      };
      let pred = self.parse_if_pred()?;
      return Ok(Some(self.ast.alloc_stmt(Stmt::If { cond, scope, pred })?));
    }

    if let Some(ident) = self.try_consume(TokenKind::Ident) {
      // Bare `ident ;` is a no-op statement: lowered to an empty scope so
      // it emits nothing.
      if self.try_consume(TokenKind::Semi).is_some() {
        let scope = self.ast.alloc_scope(Scope { stmts: Vec::new() })?;
        return Ok(Some(self.ast.alloc_stmt(Stmt::Scope { scope })?));
      }

      if self.try_consume(TokenKind::Eq).is_some() {
        let Some(expr) = self.parse_expr(0)? else {
          return Err(self.error_expected("expression"));
        };
        self.expect(TokenKind::Semi)?;
        return Ok(Some(self.ast.alloc_stmt(Stmt::Assign { ident, expr })?));
      }

      if self.try_consume(TokenKind::OpenParen).is_some() {
        let args = self.parse_call_args()?;
        self.expect(TokenKind::CloseParen)?;
        self.expect(TokenKind::Semi)?;
        return Ok(Some(
          self.ast.alloc_stmt(Stmt::FunctionCall { name: ident, args })?,
        ));
      }

      return Err(self.error_expected("expression"));
    }

    if self.try_consume(TokenKind::Print).is_some() {
      self.expect(TokenKind::OpenParen)?;
      let Some(expr) = self.parse_expr(0)? else {
        return Err(self.error_expected("expression"));
      };
      self.expect(TokenKind::CloseParen)?;
      self.expect(TokenKind::Semi)?;
      return Ok(Some(self.ast.alloc_stmt(Stmt::Print { expr })?));
    }

    if self.try_consume(TokenKind::Function).is_some() {
      let name = self.expect(TokenKind::Ident)?;
      self.expect(TokenKind::OpenParen)?;
      let mut params = Vec::new();
      if !self.peek_is(TokenKind::CloseParen) {
        loop {
          params.push(self.expect(TokenKind::Ident)?);
          if self.try_consume(TokenKind::Comma).is_none() {
            break;
          }
        }
      }
      self.expect(TokenKind::CloseParen)?;
      let Some(scope) = self.parse_scope()? else {
        return Err(self.error_expected("scope"));
      };
      return Ok(Some(self.ast.alloc_stmt(Stmt::Function {
        name,
        params,
        scope,
      })?));
    }

    Ok(None)
  }

  /// Comma-separated argument expressions. Empty list permitted; a trailing
  /// comma is not (after a comma another expression is mandatory).
  fn parse_call_args(&mut self) -> CompileResult<Vec<ExprId>> {
    let mut args = Vec::new();
    if self.peek_is(TokenKind::CloseParen) {
      return Ok(args);
    }
    loop {
      let Some(arg) = self.parse_expr(0)? else {
        return Err(self.error_expected("expression"));
      };
      args.push(arg);
      if self.try_consume(TokenKind::Comma).is_none() {
        break;
      }
    }
    Ok(args)
  }

  /// `{ Stmt* }`, or `None` when the next token is not `{`.
  fn parse_scope(&mut self) -> CompileResult<Option<ScopeId>> {
    if self.try_consume(TokenKind::OpenCurly).is_none() {
      return Ok(None);
    }
    let mut stmts = Vec::new();
    while let Some(stmt) = self.parse_stmt()? {
      stmts.push(stmt);
    }
    self.expect(TokenKind::CloseCurly)?;
    Ok(Some(self.ast.alloc_scope(Scope { stmts })?))
  }

  /// The `elif`/`else` tail of an `if` chain, if present.
  fn parse_if_pred(&mut self) -> CompileResult<Option<IfPredId>> {
    if self.try_consume(TokenKind::Elif).is_some() {
      self.expect(TokenKind::OpenParen)?;
      let Some(cond) = self.parse_expr(0)? else {
        return Err(self.error_expected("expression"));
      };
      self.expect(TokenKind::CloseParen)?;
      let Some(scope) = self.parse_scope()? else {
        return Err(self.error_expected("scope"));
      };
      let next = self.parse_if_pred()?;
      return Ok(Some(self.ast.alloc_pred(IfPred::Elif { cond, scope, next })?));
    }

    if self.try_consume(TokenKind::Else).is_some() {
      let Some(scope) = self.parse_scope()? else {
        return Err(self.error_expected("scope"));
      };
      return Ok(Some(self.ast.alloc_pred(IfPred::Else { scope })?));
    }

    Ok(None)
  }

  // ----- Expression parsing -----

  /// Precedence climbing. Parses a term as the left-hand side, then keeps
  /// absorbing operators of precedence >= `min_prec`; the recursive call
  /// uses `prec + 1`, which makes every level left-associative.
  fn parse_expr(&mut self, min_prec: u8) -> CompileResult<Option<ExprId>> {
    let Some(mut lhs) = self.parse_term()? else {
      return Ok(None);
    };

    loop {
      let Some(op) = self.peek().and_then(|token| BinOp::of_token(token.kind)) else {
        break;
      };
      if op.precedence() < min_prec {
        break;
      }
      self.pos += 1;
      let Some(rhs) = self.parse_expr(op.precedence() + 1)? else {
        return Err(self.error_expected("expression"));
      };
      lhs = self.ast.alloc_expr(Expr::binary(op, lhs, rhs))?;
    }

    Ok(Some(lhs))
  }

  /// A literal, an identifier, or a parenthesized expression; `None` when
  /// the next token starts none of them.
  fn parse_term(&mut self) -> CompileResult<Option<ExprId>> {
    if let Some(token) = self.try_consume(TokenKind::IntLit) {
      return Ok(Some(self.ast.alloc_expr(Expr::int_lit(token))?));
    }
    if let Some(token) = self.try_consume(TokenKind::CharLit) {
      return Ok(Some(self.ast.alloc_expr(Expr::char_lit(token))?));
    }
    if let Some(token) = self.try_consume(TokenKind::FloatLit) {
      return Ok(Some(self.ast.alloc_expr(Expr::float_lit(token))?));
    }
    if let Some(token) = self.try_consume(TokenKind::Ident) {
      return Ok(Some(self.ast.alloc_expr(Expr::ident(token))?));
    }
    if self.try_consume(TokenKind::OpenParen).is_some() {
      let Some(expr) = self.parse_expr(0)? else {
        return Err(self.error_expected("expression"));
      };
      self.expect(TokenKind::CloseParen)?;
      return Ok(Some(self.ast.alloc_expr(Expr::paren(expr))?));
    }
    Ok(None)
  }

  // ----- Cursor helpers -----

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  fn peek_is(&self, kind: TokenKind) -> bool {
    self.peek().is_some_and(|token| token.kind == kind)
  }

  /// Consume and return the current token if it has the given kind.
  fn try_consume(&mut self, kind: TokenKind) -> Option<Token> {
    if self.peek_is(kind) {
      let token = self.tokens[self.pos].clone();
      self.pos += 1;
      Some(token)
    } else {
      None
    }
  }

  /// Consume a token of the given kind or fail with its description.
  fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
    self
      .try_consume(kind)
      .ok_or_else(|| self.error_expected(kind.describe()))
  }

  /// Line of the most recently consumed token; the element named in the
  /// error was expected right after it.
  fn prev_line(&self) -> u32 {
    self
      .tokens
      .get(self.pos.wrapping_sub(1))
      .map(|token| token.line)
      .unwrap_or(1)
  }

  fn error_expected(&self, what: &str) -> CompileError {
    UnexpectedTokenSnafu {
      what,
      line: self.prev_line(),
    }
    .build()
  }
}
