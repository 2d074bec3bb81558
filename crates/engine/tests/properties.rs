//! Incremental passes must agree with evaluating the edited document from scratch.

use std::collections::HashSet;

use proptest::prelude::*;
use reval_engine::anchor::resolve;
use reval_engine::{Binding, Checkpoint, CheckpointKind, EvalError, Evaluator, Outcome, Session, Settings};
use reval_primitives::Position;
use reval_rpc::CoreMessage;

/// Odd quote counts are incomplete, `bad` fails, `boom` faults, anything else binds.
struct Toy;

impl Evaluator for Toy {
	type State = Vec<String>;

	fn configure(&mut self, _settings: &Settings) {}

	fn evaluate(&mut self, base: Option<&Vec<String>>, source: &str) -> Result<Outcome<Vec<String>>, EvalError> {
		if source.matches('"').count() % 2 == 1 {
			return Err(EvalError::Incomplete);
		}
		let body = source.trim_end_matches(';').trim().to_string();
		let mut state = base.cloned().unwrap_or_default();
		if body.contains("bad") {
			return Err(EvalError::failure("ParseError", body));
		}
		let faulted = body.contains("boom");
		state.push(body);
		if faulted {
			return Ok(Outcome::Fault {
				state: Some(state),
				message: "Boom".into(),
				warnings: Vec::new(),
			});
		}
		Ok(Outcome::Success {
			state,
			warnings: Vec::new(),
		})
	}

	fn bindings_since(&self, base: Option<&Vec<String>>, state: &Vec<String>) -> Vec<Binding> {
		state[base.map_or(0, Vec::len)..]
			.iter()
			.map(|v| Binding::val("it", Some(v.clone()), None))
			.collect()
	}
}

fn position_at(doc: &[char], index: usize) -> Position {
	doc[..index].iter().fold(Position::ZERO, |pos, &ch| {
		if ch == '\n' {
			Position::new(pos.line + 1, 0)
		} else {
			pos.advance_columns(1)
		}
	})
}

fn text_from(doc: &[char], pos: Position) -> String {
	let index = (0..=doc.len()).find(|&i| position_at(doc, i) == pos).unwrap_or(doc.len());
	doc[index..].iter().collect()
}

fn pass(session: &mut Session<Toy>, pos: Position, doc: &[char]) -> Vec<CoreMessage> {
	let mut out = Vec::new();
	let plan = session.begin_pass(pos, &mut out);
	session
		.complete_pass(plan, &text_from(doc, plan.fetch_from()), &mut out)
		.unwrap();
	out
}

type Snapshot = Vec<(Position, CheckpointKind, Option<Vec<String>>, String)>;

fn snapshot(entries: &[Checkpoint<Vec<String>>]) -> Snapshot {
	entries
		.iter()
		.map(|cp| (cp.boundary, cp.kind, cp.state.clone(), cp.output.clone()))
		.collect()
}

fn document() -> impl Strategy<Value = Vec<char>> {
	let token = prop::sample::select(vec!["1", "x", "bad", "boom", "\"", "\"s;", " "]);
	let sep = prop::sample::select(vec![";", "; ", ";\n", "\n", ""]);
	prop::collection::vec((token, sep), 0..12)
		.prop_map(|parts| parts.into_iter().flat_map(|(t, s)| format!("{t}{s}").chars().collect::<Vec<_>>()).collect())
}

#[derive(Debug, Clone)]
struct Edit {
	at: usize,
	remove: usize,
	insert: String,
}

fn edit() -> impl Strategy<Value = Edit> {
	(any::<usize>(), 0usize..4, prop::sample::select(vec!["", ";", "2", "bad", "boom", "\"", "\n"])).prop_map(
		|(at, remove, insert)| Edit {
			at,
			remove,
			insert: insert.to_string(),
		},
	)
}

fn apply(doc: &[char], edit: &Edit) -> (Vec<char>, usize) {
	let at = if doc.is_empty() { 0 } else { edit.at % (doc.len() + 1) };
	let end = (at + edit.remove).min(doc.len());
	let mut next = doc[..at].to_vec();
	next.extend(edit.insert.chars());
	next.extend_from_slice(&doc[end..]);
	(next, at)
}

fn kind_strategy() -> impl Strategy<Value = CheckpointKind> {
	prop_oneof![
		(0u64..4).prop_map(|ordinal| CheckpointKind::Success { ordinal }),
		Just(CheckpointKind::Incomplete),
		Just(CheckpointKind::Fault),
		Just(CheckpointKind::Failure),
		Just(CheckpointKind::Poisoned),
	]
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(128))]

	#[test]
	fn incremental_matches_fresh(initial in document(), edits in prop::collection::vec(edit(), 1..6)) {
		let mut incremental = Session::new(Toy, Settings::default());
		pass(&mut incremental, Position::ZERO, &initial);

		let mut doc = initial;
		for e in &edits {
			let (next, at) = apply(&doc, e);
			doc = next;
			pass(&mut incremental, position_at(&doc, at), &doc);

			let mut fresh = Session::new(Toy, Settings::default());
			pass(&mut fresh, Position::ZERO, &doc);

			prop_assert_eq!(snapshot(incremental.cache().entries()), snapshot(fresh.cache().entries()));

			let marked: Vec<_> = incremental.cache().entries().iter().filter_map(|cp| cp.marker).collect();
			let unique: HashSet<_> = marked.iter().copied().collect();
			prop_assert_eq!(unique.len(), marked.len());
			prop_assert_eq!(incremental.markers().outstanding(), marked.len());
			prop_assert!(marked.iter().all(|id| incremental.markers().is_outstanding(*id)));
		}
	}

	#[test]
	fn anchor_and_base_are_never_errors(kinds in prop::collection::vec(kind_strategy(), 0..16), probe in 0u32..40) {
		let entries: Vec<Checkpoint<u8>> = kinds
			.iter()
			.enumerate()
			.map(|(i, kind)| {
				let at = Position::new(0, i as u32 * 2 + 1);
				match kind {
					CheckpointKind::Success { ordinal } => Checkpoint::success(at, 0, None, String::new(), *ordinal),
					CheckpointKind::Incomplete => Checkpoint::incomplete(at),
					kind => Checkpoint::error(*kind, at, None, String::new()),
				}
			})
			.collect();

		let resolved = resolve(&entries, Position::new(0, probe));
		if let Some(a) = resolved.anchor {
			prop_assert!(!entries[a].is_error());
			prop_assert!(entries[a].boundary < Position::new(0, probe));
		}
		if let Some(b) = resolved.base {
			prop_assert!(entries[b].state.is_some());
			prop_assert!(resolved.anchor.is_some_and(|a| b <= a));
		}
		let first_open = resolved.base.map_or(0, |b| b + 1);
		let last_kept = resolved.anchor.map_or(0, |a| a + 1);
		prop_assert!(entries[first_open.min(last_kept)..last_kept].iter().all(|cp| !cp.is_error()));
	}
}
