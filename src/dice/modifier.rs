//! Dice modifiers and their related types.

use alloc::{
	borrow::ToOwned,
	format,
	string::{String, ToString},
	vec,
	vec::Vec,
};
use core::fmt;

use super::{roller::Roller, Die, Error};
use crate::{
	expr::{wrap_sum, Roll, Rollable},
	trace::Tracer,
};

/// Routines that wrap exactly one inner [`Rollable`] and transform the results of evaluating it.
///
/// Modifiers are attached to an inner rollable with [`Rollable::modified()`], which validates them against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Modifier {
	/// Applies an arithmetic operation with a constant operand to the inner result.
	///
	/// # Examples
	/// ```
	/// use dicecup::dice::roller::Iter as IterRoller;
	///
	/// let rollable = dicecup::build("2D6*2")?;
	/// let roll = rollable.evaluate(&mut IterRoller::new([3, 4]));
	/// assert_eq!(roll.value, 14);
	/// assert_eq!(roll.trace, "(3 + 4) * 2");
	/// # Ok::<(), dicecup::Error>(())
	/// ```
	Arithmetic(Operator, i64),

	/// Rolls each component of the inner rollable individually and sums only the selected ones.
	///
	/// # Examples
	///
	/// ## Keep highest die (`KH1`)
	/// ```
	/// use dicecup::dice::roller::Iter as IterRoller;
	///
	/// let rollable = dicecup::build("4D6KH1")?;
	/// let roll = rollable.evaluate(&mut IterRoller::new([2, 5, 1, 6]));
	/// assert_eq!(roll.value, 6);
	/// assert_eq!(roll.trace, "2 (d) + 5 (d) + 1 (d) + 6");
	/// # Ok::<(), dicecup::Error>(())
	/// ```
	///
	/// ## Drop lowest die (`DL1`)
	/// ```
	/// use dicecup::dice::roller::Iter as IterRoller;
	///
	/// let rollable = dicecup::build("4D6DL1")?;
	/// let roll = rollable.evaluate(&mut IterRoller::new([2, 5, 1, 6]));
	/// assert_eq!(roll.value, 13);
	/// assert_eq!(roll.trace, "2 + 5 + 1 (d) + 6");
	/// # Ok::<(), dicecup::Error>(())
	/// ```
	DropKeep(Selection),

	/// Rolls the inner rollable again and adds the new result whenever a result meets a condition, up to `limit`
	/// additional rolls. When the inner rollable is a pool, each of its children explodes individually.
	///
	/// # Examples
	/// ```
	/// use dicecup::dice::roller::Iter as IterRoller;
	///
	/// let rollable = dicecup::build("D6!6")?;
	/// let roll = rollable.evaluate(&mut IterRoller::new([6, 6, 2]));
	/// assert_eq!(roll.value, 14);
	/// assert_eq!(roll.trace, "6 + 6 + 2");
	/// # Ok::<(), dicecup::Error>(())
	/// ```
	Explode {
		/// Condition that results must pass in order to explode
		cond: Condition,

		/// Maximum number of additional rolls for a single exploding chain
		limit: u32,
	},
}

impl Modifier {
	/// Checks that the modifier can be applied to the given inner rollable.
	///
	/// # Errors
	/// Division by zero results in [`Error::IllegalValue`], and selecting more components than the inner rollable has
	/// results in [`Error::TooManyObjects`].
	pub fn validate(self, inner: &Rollable) -> Result<(), Error> {
		match self {
			Self::Arithmetic(Operator::Div, 0) => Err(Error::IllegalValue {
				what: "divisor",
				value: 0,
			}),
			Self::DropKeep(selection) => {
				let available = inner.component_count();
				if selection.count() > available {
					return Err(Error::TooManyObjects {
						count: u64::try_from(selection.count()).unwrap_or(u64::MAX),
						limit: u64::try_from(available).unwrap_or(u64::MAX),
					});
				}
				Ok(())
			}
			Self::Arithmetic(..) | Self::Explode { .. } => Ok(()),
		}
	}

	/// Name of the modifier kind, used to identify it in trace records.
	#[must_use]
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Arithmetic(..) => "Arithmetic",
			Self::DropKeep(..) => "DropKeep",
			Self::Explode { .. } => "Explode",
		}
	}

	/// Calculates the lowest or highest value that applying the modifier to the inner rollable can produce.
	pub(crate) fn bound(self, inner: &Rollable, edge: Edge) -> i64 {
		match self {
			Self::Arithmetic(op, operand) => {
				let low = op.apply(inner.minimum(), operand);
				let high = op.apply(inner.maximum(), operand);
				edge.pick(low.min(high), low.max(high))
			}
			Self::DropKeep(selection) => selection
				.kept(inner.component_bounds(edge))
				.into_iter()
				.fold(0, i64::saturating_add),
			Self::Explode { cond, limit } => match inner {
				Rollable::Pool(pool) => pool
					.iter()
					.map(|child| explosion_bound(child, cond, limit, edge))
					.fold(0, i64::saturating_add),
				_ => explosion_bound(inner, cond, limit, edge),
			},
		}
	}
}

impl fmt::Display for Modifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Arithmetic(op, operand) => write!(f, "{}{operand}", op.symbol()),
			Self::DropKeep(selection) => write!(f, "{}{}", selection.symbol(), selection.count()),
			Self::Explode {
				cond: Condition::Eq(expected),
				..
			} => write!(f, "!{expected}"),
			Self::Explode { cond, .. } => write!(f, "!{cond}"),
		}
	}
}

/// Which end of a rollable's range is being calculated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Edge {
	/// Lowest possible value
	Lower,

	/// Highest possible value
	Upper,
}

impl Edge {
	/// Picks the value corresponding to this edge.
	pub(crate) const fn pick(self, low: i64, high: i64) -> i64 {
		match self {
			Self::Lower => low,
			Self::Upper => high,
		}
	}
}

/// Arithmetic operation applied by [`Modifier::Arithmetic`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[expect(clippy::exhaustive_enums, reason = "Unlikely to change, no logical fallback")]
pub enum Operator {
	/// Addition. Symbol: `+`
	Add,

	/// Subtraction. Symbol: `-`
	Sub,

	/// Multiplication. Symbol: `*`
	Mul,

	/// Integer division, truncated towards zero. Symbol: `/`
	Div,
}

impl Operator {
	/// Creates an operator from its corresponding symbol.
	///
	/// # Errors
	/// If the symbol doesn't match to a known operator, an error variant will be returned.
	///
	/// # Examples
	/// ```
	/// use dicecup::dice::{modifier::Operator, Error};
	///
	/// assert_eq!(Operator::from_symbol("*")?, Operator::Mul);
	/// assert!(matches!(Operator::from_symbol("^"), Err(Error::UnknownAlgorithm(..))));
	/// # Ok::<(), Error>(())
	/// ```
	pub fn from_symbol(symbol: &str) -> Result<Self, Error> {
		Ok(match symbol {
			"+" => Self::Add,
			"-" => Self::Sub,
			"*" => Self::Mul,
			"/" => Self::Div,
			_ => return Err(Error::UnknownAlgorithm(symbol.to_owned())),
		})
	}

	/// Applies the operation, saturating at the numeric bounds. Division by zero leaves the value unchanged.
	#[must_use]
	pub const fn apply(self, val: i64, operand: i64) -> i64 {
		match self {
			Self::Add => val.saturating_add(operand),
			Self::Sub => val.saturating_sub(operand),
			Self::Mul => val.saturating_mul(operand),
			Self::Div if operand == 0 => val,
			Self::Div => val.saturating_div(operand),
		}
	}

	/// Gets the symbol that represents the operator.
	#[must_use]
	pub const fn symbol(&self) -> &'static str {
		match self {
			Self::Add => "+",
			Self::Sub => "-",
			Self::Mul => "*",
			Self::Div => "/",
		}
	}
}

/// Which components [`Modifier::DropKeep`] sums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[expect(clippy::exhaustive_enums, reason = "Unlikely to change, no logical fallback")]
pub enum Selection {
	/// Keeps only the highest x components. Symbol: `KH`
	KeepHigh(usize),

	/// Keeps only the lowest x components. Symbol: `KL`
	KeepLow(usize),

	/// Drops the highest x components, keeping the rest. Symbol: `DH`
	DropHigh(usize),

	/// Drops the lowest x components, keeping the rest. Symbol: `DL`
	DropLow(usize),
}

impl Selection {
	/// Creates a selection from its corresponding symbol and a given count.
	///
	/// # Errors
	/// If the symbol doesn't match to a known selection, an error variant will be returned.
	pub fn from_symbol_and_count(symbol: &str, count: usize) -> Result<Self, Error> {
		Ok(match symbol {
			"KH" => Self::KeepHigh(count),
			"KL" => Self::KeepLow(count),
			"DH" => Self::DropHigh(count),
			"DL" => Self::DropLow(count),
			_ => return Err(Error::UnknownAlgorithm(symbol.to_owned())),
		})
	}

	/// Gets the number of components the selection keeps or drops.
	#[must_use]
	pub const fn count(&self) -> usize {
		match self {
			Self::KeepHigh(count) | Self::KeepLow(count) | Self::DropHigh(count) | Self::DropLow(count) => *count,
		}
	}

	/// Gets the symbol that represents the selection.
	#[must_use]
	pub const fn symbol(&self) -> &'static str {
		match self {
			Self::KeepHigh(..) => "KH",
			Self::KeepLow(..) => "KL",
			Self::DropHigh(..) => "DH",
			Self::DropLow(..) => "DL",
		}
	}

	/// Number of components that remain after selecting from `available` of them.
	#[must_use]
	pub const fn remaining(&self, available: usize) -> usize {
		match self {
			Self::KeepHigh(count) | Self::KeepLow(count) => {
				if *count < available {
					*count
				} else {
					available
				}
			}
			Self::DropHigh(count) | Self::DropLow(count) => available.saturating_sub(*count),
		}
	}

	/// Determines which of the given values are kept, in their original order.
	/// Ties are broken by original order: the earlier value ranks first.
	///
	/// # Examples
	/// ```
	/// use dicecup::dice::modifier::Selection;
	///
	/// assert_eq!(Selection::KeepHigh(1).mask(&[2, 5, 1, 6]), vec![false, false, false, true]);
	/// assert_eq!(Selection::DropLow(1).mask(&[2, 5, 1, 6]), vec![true, true, false, true]);
	/// assert_eq!(Selection::KeepHigh(1).mask(&[4, 4]), vec![true, false]);
	/// ```
	#[must_use]
	pub fn mask(&self, vals: &[i64]) -> Vec<bool> {
		let (highest_first, keeping) = match self {
			Self::KeepHigh(..) => (true, true),
			Self::KeepLow(..) => (false, true),
			Self::DropHigh(..) => (true, false),
			Self::DropLow(..) => (false, false),
		};

		// Stable sorts keep equal values in roll order
		let mut ranked = vals.iter().copied().enumerate().collect::<Vec<_>>();
		if highest_first {
			ranked.sort_by(|(_, a), (_, b)| b.cmp(a));
		} else {
			ranked.sort_by_key(|&(_, val)| val);
		}

		let mut mask = vec![!keeping; vals.len()];
		for (index, _) in ranked.into_iter().take(self.count()) {
			if let Some(slot) = mask.get_mut(index) {
				*slot = keeping;
			}
		}
		mask
	}

	/// Filters the given values down to the kept ones, preserving their order.
	pub(crate) fn kept(&self, vals: Vec<i64>) -> Vec<i64> {
		let mask = self.mask(&vals);
		vals.into_iter()
			.zip(mask)
			.filter_map(|(val, keep)| keep.then_some(val))
			.collect()
	}
}

/// Test that values can be checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[expect(clippy::exhaustive_enums, reason = "Unlikely to change, no logical fallback")]
pub enum Condition {
	/// Checks whether values are equal to its own value. Symbol: `=`
	Eq(i64),

	/// Checks whether values are greater than its own value. Symbol: `>`
	Gt(i64),

	/// Checks whether values are greater than or equal to its own value. Symbol: `>=`
	Gte(i64),

	/// Checks whether values are less than its own value. Symbol: `<`
	Lt(i64),

	/// Checks whether values are less than or equal to its own value. Symbol: `<=`
	Lte(i64),
}

impl Condition {
	/// Creates a condition from its corresponding symbol and a given value.
	///
	/// # Errors
	/// If the symbol doesn't match to a known condition variant, an error variant will be returned.
	pub fn from_symbol_and_val(symbol: &str, val: i64) -> Result<Self, Error> {
		Ok(match symbol {
			"=" => Self::Eq(val),
			">" => Self::Gt(val),
			">=" => Self::Gte(val),
			"<" => Self::Lt(val),
			"<=" => Self::Lte(val),
			_ => return Err(Error::UnknownAlgorithm(symbol.to_owned())),
		})
	}

	/// Checks a value against the condition.
	#[must_use]
	pub const fn check(&self, val: i64) -> bool {
		match self {
			Self::Eq(expected) => val == *expected,
			Self::Gt(expected) => val > *expected,
			Self::Gte(expected) => val >= *expected,
			Self::Lt(expected) => val < *expected,
			Self::Lte(expected) => val <= *expected,
		}
	}

	/// Gets the symbol that represents the condition.
	#[must_use]
	pub const fn symbol(&self) -> &'static str {
		match self {
			Self::Eq(..) => "=",
			Self::Gt(..) => ">",
			Self::Gte(..) => ">=",
			Self::Lt(..) => "<",
			Self::Lte(..) => "<=",
		}
	}

	/// Narrows `low..=high` down to the values that pass the condition, if there are any.
	#[must_use]
	pub fn passing_within(&self, low: i64, high: i64) -> Option<(i64, i64)> {
		let (from, to) = match *self {
			Self::Eq(expected) => (expected, expected),
			Self::Gt(expected) => (expected.checked_add(1)?, i64::MAX),
			Self::Gte(expected) => (expected, i64::MAX),
			Self::Lt(expected) => (i64::MIN, expected.checked_sub(1)?),
			Self::Lte(expected) => (i64::MIN, expected),
		};
		let (from, to) = (from.max(low), to.min(high));
		(from <= to).then_some((from, to))
	}
}

impl fmt::Display for Condition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}{}",
			self.symbol(),
			match self {
				Self::Eq(expected)
				| Self::Gt(expected)
				| Self::Gte(expected)
				| Self::Lt(expected)
				| Self::Lte(expected) => expected,
			}
		)
	}
}

/// Result of applying [`Modifier::DropKeep`]
#[derive(Debug)]
pub(crate) struct Selected {
	/// Components that were kept, in roll order
	pub(crate) kept: Vec<Roll>,

	/// Sum of the kept components, with a trace listing every component
	pub(crate) roll: Roll,

	/// Number of components that were dropped
	pub(crate) dropped: usize,
}

/// Result of applying [`Modifier::Explode`]
#[derive(Debug)]
pub(crate) struct Exploded {
	/// Each exploding chain (one per pool child, or a single one)
	pub(crate) chains: Vec<Roll>,

	/// Sum of all chains
	pub(crate) roll: Roll,

	/// Total number of rolls made across all chains
	pub(crate) rolls: u64,
}

/// Applies [`Modifier::Arithmetic`] to a freshly evaluated inner rollable.
pub(crate) fn apply_arithmetic<R, T>(op: Operator, operand: i64, inner: &Rollable, rng: &mut R, tracer: &mut T) -> Roll
where
	R: Roller + ?Sized,
	T: Tracer + ?Sized,
{
	let roll = inner.evaluate_traced(rng, tracer);
	Roll::new(
		op.apply(roll.value, operand),
		format!("{} {} {operand}", wrap_sum(roll.trace), op.symbol()),
	)
}

/// Applies [`Modifier::DropKeep`] to freshly evaluated components of an inner rollable.
pub(crate) fn apply_drop_keep<R, T>(selection: Selection, inner: &Rollable, rng: &mut R, tracer: &mut T) -> Selected
where
	R: Roller + ?Sized,
	T: Tracer + ?Sized,
{
	let components = inner.evaluate_components(rng, tracer);
	let mask = selection.mask(&components.iter().map(|roll| roll.value).collect::<Vec<_>>());

	let trace = if components.is_empty() {
		"0".to_owned()
	} else {
		components
			.iter()
			.zip(&mask)
			.map(|(roll, keep)| {
				let trace = wrap_sum(roll.trace.clone());
				if *keep {
					trace
				} else {
					format!("{trace} (d)")
				}
			})
			.collect::<Vec<_>>()
			.join(" + ")
	};

	let kept = components
		.into_iter()
		.zip(&mask)
		.filter_map(|(roll, keep)| keep.then_some(roll))
		.collect::<Vec<_>>();
	let value = kept.iter().fold(0, |sum: i64, roll| sum.saturating_add(roll.value));

	Selected {
		dropped: mask.len().saturating_sub(kept.len()),
		kept,
		roll: Roll::new(value, trace),
	}
}

/// Applies [`Modifier::Explode`] to an inner rollable, exploding each child individually if it's a pool.
pub(crate) fn apply_explode<R, T>(cond: Condition, limit: u32, inner: &Rollable, rng: &mut R, tracer: &mut T) -> Exploded
where
	R: Roller + ?Sized,
	T: Tracer + ?Sized,
{
	let mut rolls: u64 = 0;
	let chains = match inner {
		Rollable::Pool(pool) => pool
			.iter()
			.map(|child| {
				let (chain, count) = cascade(child, cond, limit, rng, tracer);
				rolls = rolls.saturating_add(count);
				chain
			})
			.collect::<Vec<_>>(),
		_ => {
			let (chain, count) = cascade(inner, cond, limit, rng, tracer);
			rolls = count;
			vec![chain]
		}
	};

	Exploded {
		roll: Roll::sum(chains.clone()),
		chains,
		rolls,
	}
}

/// Evaluates a single exploding chain, returning its sum and the number of rolls it took.
fn cascade<R, T>(target: &Rollable, cond: Condition, limit: u32, rng: &mut R, tracer: &mut T) -> (Roll, u64)
where
	R: Roller + ?Sized,
	T: Tracer + ?Sized,
{
	let mut roll = target.evaluate_traced(rng, tracer);
	let mut total = roll.value;
	let mut explosions: u32 = 0;
	let mut traces = Vec::new();

	while cond.check(roll.value) && explosions < limit {
		traces.push(wrap_sum(roll.trace));
		roll = target.evaluate_traced(rng, tracer);
		total = total.saturating_add(roll.value);
		explosions = explosions.saturating_add(1);
	}
	traces.push(wrap_sum(roll.trace));

	(Roll::new(total, traces.join(" + ")), u64::from(explosions).saturating_add(1))
}

/// Calculates the lowest or highest sum a single exploding chain over `target` can produce.
///
/// A chain either stops on a value that fails the condition, after rolling only passing values, or runs to the limit
/// and ends on any value. A stopped chain is most extreme after a single roll unless passing values pull the sum
/// toward the edge, and then the exhausted chain is more extreme still.
pub(crate) fn explosion_bound(target: &Rollable, cond: Condition, limit: u32, edge: Edge) -> i64 {
	let (passing, failing) = partition_extremes(target, cond);
	let any = edge.pick(target.minimum(), target.maximum());
	let stopped = failing.map(|(low, high)| edge.pick(low, high));
	let exhausted = passing.map(|(low, high)| {
		edge.pick(low, high)
			.saturating_mul(i64::from(limit))
			.saturating_add(any)
	});

	match (stopped, exhausted) {
		(Some(stopped), Some(exhausted)) => match edge {
			Edge::Lower => stopped.min(exhausted),
			Edge::Upper => stopped.max(exhausted),
		},
		(Some(only), None) | (None, Some(only)) => only,
		(None, None) => any,
	}
}

/// Finds the lowest and highest values `target` can roll that pass the condition and that fail it.
///
/// Custom dice are checked face by face. Anything else is treated as able to roll every value in its range.
fn partition_extremes(target: &Rollable, cond: Condition) -> (Option<(i64, i64)>, Option<(i64, i64)>) {
	if let Rollable::Die(Die::Custom(faces)) = target {
		let widen = |range: Option<(i64, i64)>, face: i64| {
			Some(range.map_or((face, face), |(low, high)| (low.min(face), high.max(face))))
		};
		return faces.iter().fold((None, None), |(passing, failing), &face| {
			if cond.check(face) {
				(widen(passing, face), failing)
			} else {
				(passing, widen(failing, face))
			}
		});
	}

	let (low, high) = (target.minimum(), target.maximum());
	let Some((passing_low, passing_high)) = cond.passing_within(low, high) else {
		return (None, Some((low, high)));
	};
	let failing_low = if passing_low > low {
		Some(low)
	} else {
		passing_high.checked_add(1).filter(|&val| val <= high)
	};
	let failing_high = if passing_high < high {
		Some(high)
	} else {
		passing_low.checked_sub(1).filter(|&val| val >= low)
	};

	(Some((passing_low, passing_high)), failing_low.zip(failing_high))
}

/// Renders a modifier with its inner notation, wrapping the inner notation in parentheses if it's a sum.
pub(crate) fn notation(inner: &Rollable, modifier: Modifier) -> String {
	let inner = inner.to_string();
	if has_top_level_sum(&inner) {
		format!("({inner}){modifier}")
	} else {
		format!("{inner}{modifier}")
	}
}

/// Checks whether a notation string contains a `+` outside of any parentheses.
fn has_top_level_sum(notation: &str) -> bool {
	let mut depth: usize = 0;
	for ch in notation.chars() {
		match ch {
			'(' => depth = depth.saturating_add(1),
			')' => depth = depth.saturating_sub(1),
			'+' if depth == 0 => return true,
			_ => {}
		}
	}
	false
}

