//! All functionality for directly creating dice and rolling them, along with the modifiers that wrap them.
//!
//! This is the home of the dice "primitives". For combining them into larger expressions, see [`Rollable`].
//!
//! [`Rollable`]: crate::expr::Rollable

pub mod modifier;
pub mod roller;

use alloc::{
	string::{String, ToString},
	vec::Vec,
};
use core::fmt;

pub use self::{modifier::Modifier, roller::Roller};

/// A single die that can be rolled for one value.
///
/// Dice are the leaves of every expression tree. Prefer the checked constructors ([`Die::sided()`],
/// [`Die::custom()`]) over the variants, since they enforce the minimum number of sides and faces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Die {
	/// Standard die numbered from 1 to its number of sides. Notation: `D6`
	Sided(i64),

	/// Die numbered from 1 to 100. Notation: `D%`
	Percentile,

	/// Fudge/Fate die with the faces -1, 0, and 1. Notation: `DF`
	Fudge,

	/// Die with an arbitrary ordered list of faces. Notation: `D[1,1,2,4]`
	Custom(Vec<i64>),
}

impl Die {
	/// Creates a standard die with the given number of sides.
	///
	/// # Errors
	/// If the die would have fewer than 2 sides, an error variant is returned.
	///
	/// # Examples
	/// ```
	/// use dicecup::dice::{Die, Error};
	///
	/// assert_eq!(Die::sided(20)?, Die::Sided(20));
	/// assert!(matches!(Die::sided(1), Err(Error::TooFewSides(1))));
	/// # Ok::<(), Error>(())
	/// ```
	pub const fn sided(sides: i64) -> Result<Self, Error> {
		if sides < 2 {
			return Err(Error::TooFewSides(sides));
		}

		Ok(Self::Sided(sides))
	}

	/// Creates a custom die from its faces.
	///
	/// # Errors
	/// If no faces are given, an error variant is returned.
	pub fn custom(faces: impl IntoIterator<Item = i64>) -> Result<Self, Error> {
		let faces = faces.into_iter().collect::<Vec<_>>();
		if faces.is_empty() {
			return Err(Error::IllegalValue {
				what: "custom die face count",
				value: 0,
			});
		}

		Ok(Self::Custom(faces))
	}

	/// Lowest value the die can roll.
	#[must_use]
	pub fn minimum(&self) -> i64 {
		match self {
			Self::Sided(..) | Self::Percentile => 1,
			Self::Fudge => -1,
			Self::Custom(faces) => faces.iter().copied().min().unwrap_or(0),
		}
	}

	/// Highest value the die can roll.
	#[must_use]
	pub fn maximum(&self) -> i64 {
		match self {
			Self::Sided(sides) => (*sides).max(1),
			Self::Percentile => 100,
			Self::Fudge => 1,
			Self::Custom(faces) => faces.iter().copied().max().unwrap_or(0),
		}
	}

	/// Rolls the die once using the given random source.
	///
	/// Custom dice draw a face index rather than a value, so every face is equally likely.
	///
	/// # Examples
	/// ```
	/// use dicecup::dice::{roller::Iter as IterRoller, Die};
	///
	/// let mut rng = IterRoller::new([4, 2]);
	/// assert_eq!(Die::Sided(6).roll(&mut rng), 4);
	/// assert_eq!(Die::custom([1, 1, 2, 4])?.roll(&mut rng), 2);
	/// # Ok::<(), dicecup::Error>(())
	/// ```
	pub fn roll<R: Roller + ?Sized>(&self, rng: &mut R) -> i64 {
		match self {
			Self::Sided(..) | Self::Percentile | Self::Fudge => rng.between(self.minimum(), self.maximum()),
			Self::Custom(faces) => {
				let last = i64::try_from(faces.len().saturating_sub(1)).unwrap_or(i64::MAX);
				usize::try_from(rng.between(0, last))
					.ok()
					.and_then(|index| faces.get(index))
					.copied()
					.unwrap_or(0)
			}
		}
	}

	/// Name of the die variant, used to identify it in trace records.
	#[must_use]
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Sided(..) => "SidedDie",
			Self::Percentile => "PercentileDie",
			Self::Fudge => "FudgeDie",
			Self::Custom(..) => "CustomDie",
		}
	}
}

impl Default for Die {
	/// Creates the default die (D6).
	#[inline]
	fn default() -> Self {
		Self::Sided(6)
	}
}

impl fmt::Display for Die {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// The output is the canonical notation token for the die.
	///
	/// # Examples
	/// ```
	/// use dicecup::Die;
	///
	/// assert_eq!(Die::Sided(6).to_string(), "D6");
	/// assert_eq!(Die::Percentile.to_string(), "D%");
	/// assert_eq!(Die::Fudge.to_string(), "DF");
	/// assert_eq!(Die::Custom(vec![1, 1, 2, 4]).to_string(), "D[1,1,2,4]");
	/// ```
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Sided(sides) => write!(f, "D{sides}"),
			Self::Percentile => f.write_str("D%"),
			Self::Fudge => f.write_str("DF"),
			Self::Custom(faces) => write!(
				f,
				"D[{}]",
				faces.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
			),
		}
	}
}

/// An error resulting from parsing notation or building a rollable expression tree
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
	/// The notation doesn't match the grammar. Contains the text that couldn't be matched.
	///
	/// # Examples
	/// ```
	/// use dicecup::Error;
	///
	/// assert_eq!(dicecup::build("D3#"), Err(Error::UnknownExpression("#".to_owned())));
	/// ```
	#[error("unknown expression: `{0}`")]
	UnknownExpression(String),

	/// A die was declared with fewer than 2 sides.
	#[error("a die needs at least 2 sides, but {0} were given")]
	TooFewSides(i64),

	/// A value is outside of what is allowed for its purpose (non-positive quantities, division by zero, etc.).
	#[error("illegal {what}: {value}")]
	IllegalValue {
		/// What the value was meant to be used as
		what: &'static str,

		/// The offending value
		value: i64,
	},

	/// More objects were requested than allowed or available (dice quantity, drop/keep count, nesting depth).
	#[error("{count} exceeds the limit of {limit}")]
	TooManyObjects {
		/// Number of objects that were requested
		count: u64,

		/// Maximum number of objects that could be provided
		limit: u64,
	},

	/// The provided symbol doesn't match to a known operator or comparator.
	///
	/// # Examples
	/// ```
	/// use dicecup::dice::{modifier::Condition, Error};
	///
	/// let cond = Condition::from_symbol_and_val("!", 4);
	/// assert!(matches!(cond, Err(Error::UnknownAlgorithm(..))));
	/// ```
	#[error("unknown algorithm: `{0}`")]
	UnknownAlgorithm(String),
}
