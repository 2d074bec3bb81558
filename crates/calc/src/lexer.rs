//! Tokenizer.
//!
//! Besides splitting text into tokens, the lexer decides whether a statement
//! is complete: unterminated strings and comments, open parentheses and open
//! `struct` blocks all report [`Error::Incomplete`] so the caller keeps
//! accumulating text past the terminator.

use std::fmt;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
	Int(i64),
	Str(String),
	Ident(String),
	Keyword(Keyword),
	/// One of `( ) + - * / ^ ~ = .`
	Symbol(char),
	Semi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
	Val,
	Let,
	Print,
	Raise,
	Structure,
	Struct,
	End,
}

impl Keyword {
	fn from_ident(word: &str) -> Option<Self> {
		Some(match word {
			"val" => Self::Val,
			"let" => Self::Let,
			"print" => Self::Print,
			"raise" => Self::Raise,
			"structure" => Self::Structure,
			"struct" => Self::Struct,
			"end" => Self::End,
			_ => return None,
		})
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Val => "val",
			Self::Let => "let",
			Self::Print => "print",
			Self::Raise => "raise",
			Self::Structure => "structure",
			Self::Struct => "struct",
			Self::End => "end",
		}
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Int(n) => write!(f, "{n}"),
			Self::Str(s) => write!(f, "{s:?}"),
			Self::Ident(name) => f.write_str(name),
			Self::Keyword(kw) => f.write_str(kw.as_str()),
			Self::Symbol(c) => write!(f, "{c}"),
			Self::Semi => f.write_str(";"),
		}
	}
}

/// Dialect switches that affect tokenizing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexOptions {
	/// Allow `_` digit separators in integer literals.
	pub successor_ml: bool,
	/// Allow non-ASCII characters inside string literals.
	pub unicode_strings: bool,
}

struct Lexer {
	source: Vec<char>,
	pos: usize,
	options: LexOptions,
}

/// Splits `source` into tokens.
pub fn tokenize(source: &str, options: LexOptions) -> Result<Vec<Token>> {
	let mut lexer = Lexer {
		source: source.chars().collect(),
		pos: 0,
		options,
	};
	let mut tokens = Vec::new();
	while let Some(token) = lexer.next_token()? {
		tokens.push(token);
	}
	check_balanced(&tokens)?;
	Ok(tokens)
}

impl Lexer {
	fn current(&self) -> Option<char> {
		self.source.get(self.pos).copied()
	}

	fn peek(&self) -> Option<char> {
		self.source.get(self.pos + 1).copied()
	}

	fn next_token(&mut self) -> Result<Option<Token>> {
		loop {
			match self.current() {
				None => return Ok(None),
				Some(c) if c.is_whitespace() => self.pos += 1,
				Some('(') if self.peek() == Some('*') => self.skip_comment()?,
				Some(_) => break,
			}
		}

		let Some(c) = self.current() else {
			return Ok(None);
		};
		let token = match c {
			'0'..='9' => self.number()?,
			'"' => self.string()?,
			c if c.is_alphabetic() || c == '_' => self.word(),
			';' => {
				self.pos += 1;
				Token::Semi
			}
			'(' | ')' | '+' | '-' | '*' | '/' | '^' | '~' | '=' | '.' => {
				self.pos += 1;
				Token::Symbol(c)
			}
			other => return Err(Error::Lex(format!("unexpected character `{other}`"))),
		};
		Ok(Some(token))
	}

	/// Comments nest.
	fn skip_comment(&mut self) -> Result<()> {
		let mut depth = 0usize;
		loop {
			match (self.current(), self.peek()) {
				(None, _) => return Err(Error::Incomplete),
				(Some('('), Some('*')) => {
					depth += 1;
					self.pos += 2;
				}
				(Some('*'), Some(')')) => {
					depth -= 1;
					self.pos += 2;
					if depth == 0 {
						return Ok(());
					}
				}
				_ => self.pos += 1,
			}
		}
	}

	fn number(&mut self) -> Result<Token> {
		let mut digits = String::new();
		while let Some(c) = self.current() {
			match c {
				'0'..='9' => digits.push(c),
				'_' if self.options.successor_ml => {}
				'_' => {
					return Err(Error::Lex(
						"digit separators in numeric literals need allowSuccessorML".into(),
					));
				}
				_ => break,
			}
			self.pos += 1;
		}
		digits
			.parse()
			.map(Token::Int)
			.map_err(|_| Error::Lex(format!("integer literal `{digits}` is too large")))
	}

	fn string(&mut self) -> Result<Token> {
		self.pos += 1;
		let mut text = String::new();
		loop {
			let c = self.current().ok_or(Error::Incomplete)?;
			self.pos += 1;
			match c {
				'"' => return Ok(Token::Str(text)),
				'\\' => {
					let escaped = self.current().ok_or(Error::Incomplete)?;
					self.pos += 1;
					text.push(match escaped {
						'n' => '\n',
						't' => '\t',
						'\\' => '\\',
						'"' => '"',
						other => return Err(Error::Lex(format!("invalid escape sequence `\\{other}`"))),
					});
				}
				c if !c.is_ascii() && !self.options.unicode_strings => {
					return Err(Error::Lex(format!(
						"non-ASCII character `{c}` in string literal needs allowUnicodeInStrings"
					)));
				}
				c => text.push(c),
			}
		}
	}

	fn word(&mut self) -> Token {
		let start = self.pos;
		while self
			.current()
			.is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '\'')
		{
			self.pos += 1;
		}
		let word: String = self.source[start..self.pos].iter().collect();
		match Keyword::from_ident(&word) {
			Some(kw) => Token::Keyword(kw),
			None => Token::Ident(word),
		}
	}
}

/// Open parentheses or `struct` blocks mean the terminator was not the end
/// of the statement.
fn check_balanced(tokens: &[Token]) -> Result<()> {
	let mut parens = 0i32;
	let mut blocks = 0i32;
	for token in tokens {
		match token {
			Token::Symbol('(') => parens += 1,
			Token::Symbol(')') => parens -= 1,
			Token::Keyword(Keyword::Struct) => blocks += 1,
			Token::Keyword(Keyword::End) => blocks -= 1,
			_ => {}
		}
	}
	if parens > 0 || blocks > 0 || tokens.last() != Some(&Token::Semi) {
		return Err(Error::Incomplete);
	}
	Ok(())
}
