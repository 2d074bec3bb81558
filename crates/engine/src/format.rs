//! Host markup for statement output.
//!
//! The host renders a small markup where `\` introduces a control sequence:
//!
//! | Sequence | Meaning |
//! |---|---|
//! | `\1`, `\2` | success block, even / odd ordinal |
//! | `\3` | error block |
//! | `\*…\*` | emphasis |
//! | `\_…\_` | type annotation |
//! | `\\` | a literal backslash |
//!
//! Everything here is a pure function of its inputs. Elapsed time is passed
//! in by the caller.

use std::fmt::Write;
use std::time::Duration;

use crate::{Binding, Warning, WarningKind};

/// Shown for a success that introduced nothing and printed nothing.
pub const NO_OUTPUT: &str = "(no output)";

/// Escapes the markup escape character.
pub fn escape(text: &str) -> String {
	text.replace('\\', "\\\\")
}

/// Formats a successful statement.
///
/// `timing` is appended only when the caller decided it is worth showing.
pub fn format_success(bindings: &[Binding], warnings: &[Warning], ordinal: u64, timing: Option<Duration>) -> String {
	let mut out = String::from(if ordinal % 2 == 0 { "\\1" } else { "\\2" });
	let start = out.len();
	for binding in bindings {
		write_binding(&mut out, binding, 0);
	}
	write_warnings(&mut out, warnings);
	if out.len() == start {
		out.push_str(NO_OUTPUT);
		out.push('\n');
	}
	if let Some(elapsed) = timing {
		let _ = writeln!(out, "(evaluated in {} ms)", elapsed.as_millis());
	}
	out
}

/// Formats an evaluator-side failure such as a parse error.
pub fn format_failure(kind: &str, message: &str) -> String {
	format!("\\3\\*{}\\*: {}\n", escape(kind), escape(message))
}

/// Formats an uncaught exception raised by the evaluated program.
pub fn format_fault(message: &str, warnings: &[Warning]) -> String {
	let mut out = String::new();
	write_warnings(&mut out, warnings);
	format!("\\3\\*Uncaught exception\\*: {}\n{out}", escape(message))
}

fn write_binding(out: &mut String, binding: &Binding, depth: usize) {
	let indent = "  ".repeat(depth);
	match binding {
		Binding::Value {
			keyword,
			name,
			value,
			ty,
		} => {
			let _ = write!(out, "> {indent}{keyword} \\*{}", escape(name));
			if let Some(value) = value {
				let _ = write!(out, " = {}", escape(value));
			}
			out.push_str("\\*");
			if let Some(ty) = ty {
				let _ = write!(out, ": \\_{}\\_", escape(ty));
			}
			out.push_str(";\n");
		}
		Binding::Group { keyword, name, members } => {
			let _ = writeln!(out, "> {indent}{keyword} \\*{}\\* = {{", escape(name));
			for member in members {
				write_binding(out, member, depth + 1);
			}
			let _ = writeln!(out, "> {indent}}};");
		}
	}
}

fn write_warnings(out: &mut String, warnings: &[Warning]) {
	for warning in warnings {
		let prefix = match warning.kind {
			WarningKind::Warn => "WARN",
			WarningKind::Printed => "Printed",
		};
		let _ = writeln!(out, "{prefix}: {}", escape(&warning.message));
	}
}
