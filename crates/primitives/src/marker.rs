use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle for a host-visible range annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(pub u32);

impl fmt::Display for MarkerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Visual class requested for a marked range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerStyle {
	/// Successful statement with an even success ordinal.
	#[serde(rename = "eval-success")]
	Success,
	/// Successful statement with an odd success ordinal.
	#[serde(rename = "eval-success-odd")]
	SuccessOdd,
	/// Failed or poisoned statement.
	#[serde(rename = "eval-fail")]
	Fail,
}

impl MarkerStyle {
	/// Style for the success with the given ordinal.
	pub const fn for_success(ordinal: u64) -> Self {
		if ordinal % 2 == 1 { Self::SuccessOdd } else { Self::Success }
	}
}
