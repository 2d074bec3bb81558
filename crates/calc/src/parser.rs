//! Recursive-descent parser for one statement.

use crate::error::{Error, Result};
use crate::lexer::{Keyword, Token};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
	Int(i64),
	Str(String),
	/// Possibly qualified name, e.g. `S.x`.
	Var(Vec<String>),
	Neg(Box<Expr>),
	Binary(BinOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
	Add,
	Sub,
	Mul,
	Div,
	Concat,
}

impl BinOp {
	pub fn symbol(self) -> char {
		match self {
			Self::Add => '+',
			Self::Sub => '-',
			Self::Mul => '*',
			Self::Div => '/',
			Self::Concat => '^',
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
	/// `val x = e` or `let x = e`.
	Val { name: String, expr: Expr },
	Print(Expr),
	Raise(Expr),
	Structure { name: String, body: Vec<Decl> },
	/// A bare expression, bound to `it`.
	Expr(Expr),
}

/// Deepest expression or structure nesting a statement may use.
pub const MAX_DEPTH: usize = 256;

struct Parser {
	tokens: Vec<Token>,
	pos: usize,
	/// Open parentheses, negations and structures around the cursor.
	depth: usize,
}

/// An expression and the height of its tree.
struct Node {
	expr: Expr,
	height: usize,
}

fn too_deep() -> Error {
	Error::Parse("expression nested too deeply".into())
}

/// Parses a statement ending in `;`.
///
/// A statement is either a single bare expression or a sequence of
/// declarations.
pub fn parse(tokens: Vec<Token>) -> Result<Vec<Decl>> {
	let mut parser = Parser {
		tokens,
		pos: 0,
		depth: 0,
	};
	let decls = if parser.at_decl() || parser.peek() == Some(&Token::Semi) {
		parser.decls(&Token::Semi)?
	} else {
		vec![Decl::Expr(parser.expr()?)]
	};
	parser.expect(&Token::Semi)?;
	if let Some(extra) = parser.peek() {
		return Err(Error::Parse(format!("unexpected `{extra}` after `;`")));
	}
	Ok(decls)
}

impl Parser {
	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.pos)
	}

	fn bump(&mut self) -> Option<Token> {
		let token = self.tokens.get(self.pos).cloned();
		self.pos += 1;
		token
	}

	fn eat(&mut self, token: &Token) -> bool {
		if self.peek() == Some(token) {
			self.pos += 1;
			true
		} else {
			false
		}
	}

	fn expect(&mut self, token: &Token) -> Result<()> {
		if self.eat(token) {
			return Ok(());
		}
		Err(Error::Parse(format!("expected `{token}`, found {}", self.describe())))
	}

	fn describe(&self) -> String {
		self.peek().map_or_else(|| "end of input".into(), |t| format!("`{t}`"))
	}

	fn at_decl(&self) -> bool {
		matches!(
			self.peek(),
			Some(Token::Keyword(
				Keyword::Val | Keyword::Let | Keyword::Print | Keyword::Raise | Keyword::Structure
			))
		)
	}

	fn enter(&mut self) -> Result<()> {
		if self.depth >= MAX_DEPTH {
			return Err(too_deep());
		}
		self.depth += 1;
		Ok(())
	}

	fn leave(&mut self) {
		self.depth -= 1;
	}

	fn ident(&mut self) -> Result<String> {
		if let Some(Token::Ident(name)) = self.peek() {
			let name = name.clone();
			self.pos += 1;
			return Ok(name);
		}
		Err(Error::Parse(format!("expected a name, found {}", self.describe())))
	}

	/// Declarations up to (not including) `end`.
	fn decls(&mut self, end: &Token) -> Result<Vec<Decl>> {
		let mut decls = Vec::new();
		while self.peek() != Some(end) {
			if !self.at_decl() {
				return Err(Error::Parse(format!("expected a declaration, found {}", self.describe())));
			}
			decls.push(self.decl()?);
		}
		Ok(decls)
	}

	fn decl(&mut self) -> Result<Decl> {
		match self.bump() {
			Some(Token::Keyword(Keyword::Val | Keyword::Let)) => {
				let name = self.ident()?;
				self.expect(&Token::Symbol('='))?;
				Ok(Decl::Val {
					name,
					expr: self.expr()?,
				})
			}
			Some(Token::Keyword(Keyword::Print)) => Ok(Decl::Print(self.expr()?)),
			Some(Token::Keyword(Keyword::Raise)) => Ok(Decl::Raise(self.expr()?)),
			Some(Token::Keyword(Keyword::Structure)) => {
				let name = self.ident()?;
				self.expect(&Token::Symbol('='))?;
				self.expect(&Token::Keyword(Keyword::Struct))?;
				let end = Token::Keyword(Keyword::End);
				self.enter()?;
				let body = self.decls(&end);
				self.leave();
				let body = body?;
				self.expect(&end)?;
				Ok(Decl::Structure { name, body })
			}
			_ => Err(Error::Parse("expected a declaration".into())),
		}
	}

	fn expr(&mut self) -> Result<Expr> {
		self.sum().map(|node| node.expr)
	}

	fn sum(&mut self) -> Result<Node> {
		let mut lhs = self.term()?;
		loop {
			let op = match self.peek() {
				Some(Token::Symbol('+')) => BinOp::Add,
				Some(Token::Symbol('-')) => BinOp::Sub,
				Some(Token::Symbol('^')) => BinOp::Concat,
				_ => return Ok(lhs),
			};
			self.pos += 1;
			let rhs = self.term()?;
			lhs = binary(op, lhs, rhs)?;
		}
	}

	fn term(&mut self) -> Result<Node> {
		let mut lhs = self.factor()?;
		loop {
			let op = match self.peek() {
				Some(Token::Symbol('*')) => BinOp::Mul,
				Some(Token::Symbol('/')) => BinOp::Div,
				_ => return Ok(lhs),
			};
			self.pos += 1;
			let rhs = self.factor()?;
			lhs = binary(op, lhs, rhs)?;
		}
	}

	fn factor(&mut self) -> Result<Node> {
		let leaf = |expr| -> Result<Node> { Ok(Node { expr, height: 1 }) };
		match self.bump() {
			Some(Token::Int(n)) => leaf(Expr::Int(n)),
			Some(Token::Str(s)) => leaf(Expr::Str(s)),
			Some(Token::Symbol('~' | '-')) => {
				self.enter()?;
				let inner = self.factor();
				self.leave();
				let inner = inner?;
				Ok(Node {
					expr: Expr::Neg(Box::new(inner.expr)),
					height: inner.height + 1,
				})
			}
			Some(Token::Symbol('(')) => {
				self.enter()?;
				let inner = self.sum();
				self.leave();
				let inner = inner?;
				self.expect(&Token::Symbol(')'))?;
				Ok(inner)
			}
			Some(Token::Ident(first)) => {
				let mut path = vec![first];
				while self.eat(&Token::Symbol('.')) {
					path.push(self.ident()?);
				}
				leaf(Expr::Var(path))
			}
			Some(other) => Err(Error::Parse(format!("expected an expression, found `{other}`"))),
			None => Err(Error::Parse("expected an expression, found end of input".into())),
		}
	}
}

/// Joins two operands, refusing trees taller than [`MAX_DEPTH`].
fn binary(op: BinOp, lhs: Node, rhs: Node) -> Result<Node> {
	let height = lhs.height.max(rhs.height) + 1;
	if height > MAX_DEPTH {
		return Err(too_deep());
	}
	Ok(Node {
		expr: Expr::Binary(op, Box::new(lhs.expr), Box::new(rhs.expr)),
		height,
	})
}
