//! Elaboration and evaluation of parsed declarations.

use crate::error::{Error, Result};
use crate::parser::{BinOp, Decl, Expr};
use crate::state::{Item, State, Type, Value};

/// Which phases run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Phases {
	pub elaborate: bool,
	pub evaluate: bool,
}

impl Default for Phases {
	fn default() -> Self {
		Self {
			elaborate: true,
			evaluate: true,
		}
	}
}

/// How a statement ended.
#[derive(Debug)]
pub(crate) enum Run {
	Done {
		state: State,
		printed: Vec<String>,
	},
	/// The program raised. `state` holds the declarations that completed
	/// before the fault, if any did.
	Raised {
		state: Option<State>,
		message: String,
		printed: Vec<String>,
	},
}

enum Stop {
	Fault(String),
	Error(Error),
}

impl From<Error> for Stop {
	fn from(err: Error) -> Self {
		Self::Error(err)
	}
}

pub(crate) struct Machine<'a> {
	phases: Phases,
	ids: &'a mut u64,
}

impl<'a> Machine<'a> {
	pub fn new(phases: Phases, ids: &'a mut u64) -> Self {
		Self { phases, ids }
	}

	pub fn run(&mut self, decls: &[Decl], base: &State) -> Result<Run> {
		let mut declared = base.clone();
		if self.phases.elaborate || !self.phases.evaluate {
			self.declare(decls, &mut declared)?;
		}
		if !self.phases.evaluate {
			return Ok(Run::Done {
				state: declared,
				printed: Vec::new(),
			});
		}

		let mut state = base.clone();
		let mut printed = Vec::new();
		match self.exec(decls, &mut state, &mut printed) {
			Ok(()) => Ok(Run::Done { state, printed }),
			Err(Stop::Fault(message)) => Ok(Run::Raised {
				state: (state.id() != base.id()).then_some(state),
				message,
				printed,
			}),
			Err(Stop::Error(err)) => Err(err),
		}
	}

	fn next_id(&mut self) -> u64 {
		*self.ids += 1;
		*self.ids
	}

	/// Binds every declared name without running anything, checking types
	/// when elaboration is on.
	fn declare(&mut self, decls: &[Decl], env: &mut State) -> Result<()> {
		for decl in decls {
			match decl {
				Decl::Val { name, expr } => self.declare_value(name, expr, env)?,
				Decl::Expr(expr) => self.declare_value("it", expr, env)?,
				Decl::Print(expr) => {
					if self.phases.elaborate {
						type_of(expr, env)?;
					}
				}
				Decl::Raise(expr) => {
					if self.phases.elaborate {
						let ty = type_of(expr, env)?;
						if ty != Type::Str {
							return Err(Error::Elaboration(format!("`raise` expects string, got {ty}")));
						}
					}
				}
				Decl::Structure { name, body } => {
					let mut inner = env.clone();
					self.declare(body, &mut inner)?;
					let scope = self.scope_of(&inner, env);
					let id = self.next_id();
					*env = env.bind(id, name, Item::Structure(scope));
				}
			}
		}
		Ok(())
	}

	fn declare_value(&mut self, name: &str, expr: &Expr, env: &mut State) -> Result<()> {
		let ty = if self.phases.elaborate {
			Some(type_of(expr, env)?)
		} else {
			None
		};
		let id = self.next_id();
		*env = env.bind(id, name, Item::Value { ty, value: None });
		Ok(())
	}

	fn exec(&mut self, decls: &[Decl], env: &mut State, printed: &mut Vec<String>) -> std::result::Result<(), Stop> {
		for decl in decls {
			match decl {
				Decl::Val { name, expr } => self.exec_value(name, expr, env)?,
				Decl::Expr(expr) => self.exec_value("it", expr, env)?,
				Decl::Print(expr) => printed.push(eval(expr, env)?.printed()),
				Decl::Raise(expr) => {
					return match eval(expr, env)? {
						Value::Str(message) => Err(Stop::Fault(message)),
						other => Err(Error::Evaluation(format!("`raise` expects string, got {}", other.ty())).into()),
					};
				}
				Decl::Structure { name, body } => {
					let mut inner = env.clone();
					self.exec(body, &mut inner, printed)?;
					let scope = self.scope_of(&inner, env);
					let id = self.next_id();
					*env = env.bind(id, name, Item::Structure(scope));
				}
			}
		}
		Ok(())
	}

	fn exec_value(&mut self, name: &str, expr: &Expr, env: &mut State) -> std::result::Result<(), Stop> {
		let value = eval(expr, env)?;
		let ty = self.phases.elaborate.then(|| value.ty());
		let id = self.next_id();
		*env = env.bind(
			id,
			name,
			Item::Value {
				ty,
				value: Some(value),
			},
		);
		Ok(())
	}

	/// Re-roots the bindings `inner` added on top of `outer` as a standalone scope.
	fn scope_of(&mut self, inner: &State, outer: &State) -> State {
		inner
			.since(outer)
			.into_iter()
			.fold(State::default(), |scope, (name, item)| scope.bind(self.next_id(), name, item.clone()))
	}
}

fn resolve<'s>(env: &'s State, path: &[String]) -> std::result::Result<&'s Item, String> {
	let Some((first, rest)) = path.split_first() else {
		return Err("empty name".into());
	};
	let mut item = env
		.lookup(first)
		.ok_or_else(|| format!("unbound identifier `{first}`"))?;
	let mut qualified = first.clone();
	for name in rest {
		let Item::Structure(scope) = item else {
			return Err(format!("`{qualified}` is not a structure"));
		};
		item = scope
			.lookup(name)
			.ok_or_else(|| format!("unbound identifier `{qualified}.{name}`"))?;
		qualified = format!("{qualified}.{name}");
	}
	Ok(item)
}

fn type_of(expr: &Expr, env: &State) -> Result<Type> {
	match expr {
		Expr::Int(_) => Ok(Type::Int),
		Expr::Str(_) => Ok(Type::Str),
		Expr::Var(path) => match resolve(env, path).map_err(Error::Elaboration)? {
			Item::Value { ty: Some(ty), .. } => Ok(*ty),
			Item::Value { ty: None, .. } => Err(Error::Elaboration(format!("type of `{}` is unknown", path.join(".")))),
			Item::Structure(_) => Err(Error::Elaboration(format!("`{}` is a structure, not a value", path.join(".")))),
		},
		Expr::Neg(inner) => match type_of(inner, env)? {
			Type::Int => Ok(Type::Int),
			other => Err(Error::Elaboration(format!("`~` expects int, got {other}"))),
		},
		Expr::Binary(op, lhs, rhs) => {
			let (lt, rt) = (type_of(lhs, env)?, type_of(rhs, env)?);
			let expected = if *op == BinOp::Concat { Type::Str } else { Type::Int };
			if lt == expected && rt == expected {
				Ok(expected)
			} else {
				Err(Error::Elaboration(format!(
					"operator `{}` expects {expected} * {expected}, got {lt} * {rt}",
					op.symbol()
				)))
			}
		}
	}
}

fn eval(expr: &Expr, env: &State) -> std::result::Result<Value, Stop> {
	match expr {
		Expr::Int(n) => Ok(Value::Int(*n)),
		Expr::Str(s) => Ok(Value::Str(s.clone())),
		Expr::Var(path) => match resolve(env, path).map_err(Error::Evaluation)? {
			Item::Value { value: Some(value), .. } => Ok(value.clone()),
			_ => Err(Error::Evaluation(format!("`{}` has no value", path.join("."))).into()),
		},
		Expr::Neg(inner) => match eval(inner, env)? {
			Value::Int(n) => n.checked_neg().map(Value::Int).ok_or_else(overflow),
			other => Err(Error::Evaluation(format!("`~` cannot be applied to {}", other.ty())).into()),
		},
		Expr::Binary(op, lhs, rhs) => {
			let (lv, rv) = (eval(lhs, env)?, eval(rhs, env)?);
			match (op, lv, rv) {
				(BinOp::Add, Value::Int(a), Value::Int(b)) => a.checked_add(b).map(Value::Int).ok_or_else(overflow),
				(BinOp::Sub, Value::Int(a), Value::Int(b)) => a.checked_sub(b).map(Value::Int).ok_or_else(overflow),
				(BinOp::Mul, Value::Int(a), Value::Int(b)) => a.checked_mul(b).map(Value::Int).ok_or_else(overflow),
				(BinOp::Div, Value::Int(_), Value::Int(0)) => Err(Stop::Fault("Div".into())),
				(BinOp::Div, Value::Int(a), Value::Int(b)) => a.checked_div(b).map(Value::Int).ok_or_else(overflow),
				(BinOp::Concat, Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
				(op, lv, rv) => Err(Error::Evaluation(format!(
					"operator `{}` cannot be applied to {} and {}",
					op.symbol(),
					lv.ty(),
					rv.ty()
				))
				.into()),
			}
		}
	}
}

fn overflow() -> Stop {
	Stop::Fault("Overflow".into())
}
