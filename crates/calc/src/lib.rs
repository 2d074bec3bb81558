//! A small statement language implementing [`reval_engine::Evaluator`].
//!
//! ```text
//! val x = 1 + 2;                    (* binds x *)
//! "a" ^ "b";                        (* binds it *)
//! structure S = struct val y = x * 2 end;
//! print S.y;
//! raise "stop";                     (* uncaught exception *)
//! ```
//!
//! Values are integers, strings and unit. Elaboration checks names and types
//! before anything runs, so a bad statement fails as a whole.

mod error;
mod eval;
mod lexer;
mod parser;
mod state;

pub use error::Error;
pub use state::{Item, State, Type, Value};
use reval_engine::{Binding, EvalError, Evaluator, Outcome, Settings, Warning};
use tracing::{debug, trace};

use crate::eval::{Machine, Phases, Run};
use crate::lexer::{LexOptions, tokenize};
use crate::parser::parse;

/// The reference evaluator.
#[derive(Debug, Default)]
pub struct Calc {
	lex: LexOptions,
	phases: Phases,
	/// Last frame id handed out. Never reset, so ids stay unique across
	/// reconfiguration.
	next_id: u64,
}

impl Calc {
	pub fn new() -> Self {
		Self::default()
	}
}

impl Evaluator for Calc {
	type State = State;

	fn configure(&mut self, settings: &Settings) {
		self.lex = LexOptions {
			successor_ml: settings.allow_successor_ml,
			unicode_strings: settings.allow_unicode_in_strings,
		};
		self.phases = Phases {
			elaborate: !settings.disable_elaboration,
			evaluate: !settings.disable_evaluation,
		};
		debug!(lex = ?self.lex, phases = ?self.phases, "calc.configured");
	}

	fn evaluate(&mut self, base: Option<&State>, source: &str) -> Result<Outcome<State>, EvalError> {
		let decls = parse(tokenize(source, self.lex)?)?;
		let base = base.cloned().unwrap_or_default();
		let run = Machine::new(self.phases, &mut self.next_id).run(&decls, &base)?;
		trace!(base = base.id(), last_id = self.next_id, "calc.evaluated");

		Ok(match run {
			Run::Done { state, printed } => Outcome::Success {
				state,
				warnings: printed.into_iter().map(Warning::printed).collect(),
			},
			Run::Raised { state, message, printed } => Outcome::Fault {
				state,
				message,
				warnings: printed.into_iter().map(Warning::printed).collect(),
			},
		})
	}

	fn bindings_since(&self, base: Option<&State>, state: &State) -> Vec<Binding> {
		let root = State::default();
		state
			.since(base.unwrap_or(&root))
			.into_iter()
			.map(|(name, item)| binding(name, item))
			.collect()
	}
}

fn binding(name: &str, item: &Item) -> Binding {
	match item {
		Item::Value { ty, value } => Binding::Value {
			keyword: "val".into(),
			name: name.into(),
			value: value.as_ref().map(Value::to_string),
			ty: ty.map(|ty| ty.to_string()),
		},
		Item::Structure(scope) => Binding::Group {
			keyword: "structure".into(),
			name: name.into(),
			members: scope
				.since(&State::default())
				.into_iter()
				.map(|(name, item)| binding(name, item))
				.collect(),
		},
	}
}
