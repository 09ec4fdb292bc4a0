//! Tree structures for evaluating full dice expressions and working with their results.

use alloc::{
	borrow::ToOwned,
	boxed::Box,
	format,
	string::{String, ToString},
	vec,
	vec::Vec,
};
use core::{fmt, slice};
#[cfg(feature = "parse")]
use core::str::FromStr;

use crate::{
	dice::{
		modifier::{self, Edge},
		Die, Error, Modifier, Roller,
	},
	trace::{Record, Tracer},
};

/// Most identical dice rendered as a single `<count><die>` group, matching the default factory quantity limit
const MAX_GROUP: usize = 1000;

/// Node of a dice expression tree: anything that can be evaluated to a value and a trace with known bounds.
///
/// Trees are immutable once built. Every evaluation returns a fresh [`Roll`], so the same tree can be evaluated any
/// number of times (even from several threads at once, each with its own [`Roller`]) without the evaluations
/// observing each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Rollable {
	/// Single die
	Die(Die),

	/// Ordered group of rollables that are summed together
	Pool(Pool),

	/// Rollable wrapped with a modifier that transforms its results
	Modified(Modified),
}

impl Rollable {
	/// Wraps an inner rollable with a modifier, checking that the modifier can be applied to it.
	///
	/// # Errors
	/// If the modifier is invalid for the inner rollable (see [`Modifier::validate()`]), an error variant is returned.
	///
	/// # Examples
	/// ```
	/// use dicecup::{
	/// 	dice::{modifier::Selection, Die, Error, Modifier},
	/// 	Pool, Rollable,
	/// };
	///
	/// let pool = Rollable::Pool(Pool::repeat(Rollable::Die(Die::Sided(6)), 4));
	/// let rollable = Rollable::modified(pool.clone(), Modifier::DropKeep(Selection::KeepHigh(3)))?;
	/// assert_eq!(rollable.notation(), "4D6KH3");
	///
	/// let result = Rollable::modified(pool, Modifier::DropKeep(Selection::KeepHigh(5)));
	/// assert!(matches!(result, Err(Error::TooManyObjects { count: 5, limit: 4 })));
	/// # Ok::<(), Error>(())
	/// ```
	pub fn modified(inner: Self, modifier: Modifier) -> Result<Self, Error> {
		modifier.validate(&inner)?;
		Ok(Self::Modified(Modified {
			inner: Box::new(inner),
			modifier,
		}))
	}

	/// Evaluates the rollable, drawing any random values from the given roller.
	#[must_use]
	pub fn evaluate<R: Roller + ?Sized>(&self, rng: &mut R) -> Roll {
		self.evaluate_traced(rng, &mut ())
	}

	/// Evaluates the rollable, drawing any random values from the given roller and reporting every evaluation step
	/// made anywhere in the tree to the given tracer. The tracer never has any influence on the result.
	///
	/// # Examples
	/// ```
	/// use dicecup::{dice::roller::Iter as IterRoller, trace::Memory as MemoryTracer};
	///
	/// let rollable = dicecup::build("2D6")?;
	/// let mut tracer = MemoryTracer::default();
	/// let roll = rollable.evaluate_traced(&mut IterRoller::new([3, 4]), &mut tracer);
	///
	/// // One record for each die, then one for the pool itself
	/// assert_eq!(tracer.records().len(), 3);
	/// let last = tracer.last().unwrap();
	/// assert_eq!(last.source, "Pool");
	/// assert_eq!(last.subject, "2D6");
	/// assert_eq!(last.operation, roll.trace);
	/// assert_eq!(last.result, 7);
	/// # Ok::<(), dicecup::Error>(())
	/// ```
	pub fn evaluate_traced<R, T>(&self, rng: &mut R, tracer: &mut T) -> Roll
	where
		R: Roller + ?Sized,
		T: Tracer + ?Sized,
	{
		match self {
			Self::Die(die) => {
				let roll = Roll::from_val(die.roll(rng));
				self.report(tracer, &roll, [].into_iter());
				roll
			}
			Self::Pool(pool) => {
				let roll = Roll::sum(pool.iter().map(|child| child.evaluate_traced(rng, tracer)).collect());
				self.report(tracer, &roll, [].into_iter());
				roll
			}
			Self::Modified(modified) => modified.evaluate(self, rng, tracer),
		}
	}

	/// Lowest value an evaluation of the rollable can produce.
	#[must_use]
	pub fn minimum(&self) -> i64 {
		self.bound(Edge::Lower)
	}

	/// Highest value an evaluation of the rollable can produce.
	#[must_use]
	pub fn maximum(&self) -> i64 {
		self.bound(Edge::Upper)
	}

	/// Builds the notation for the rollable. Re-parsing the notation produces an equivalent expression tree, though
	/// not necessarily one with the exact same notation (identical dice are grouped, defaults are filled in, etc.).
	///
	/// The output of this is equivalent to using [`fmt::Display`].
	#[must_use]
	#[inline]
	pub fn notation(&self) -> String {
		self.to_string()
	}

	/// Name of the kind of node, used to identify it in trace records.
	#[must_use]
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Die(die) => die.kind(),
			Self::Pool(..) => "Pool",
			Self::Modified(modified) => modified.modifier.kind(),
		}
	}

	/// Calculates one end of the range of values the rollable can produce.
	fn bound(&self, edge: Edge) -> i64 {
		match self {
			Self::Die(die) => edge.pick(die.minimum(), die.maximum()),
			Self::Pool(pool) => pool
				.iter()
				.map(|child| child.bound(edge))
				.fold(0, i64::saturating_add),
			Self::Modified(modified) => modified.modifier.bound(&modified.inner, edge),
		}
	}

	/// Number of independently rolled components the rollable is made of, as seen by a drop/keep modifier.
	///
	/// Pools are made of their children, drop/keep modifiers of the components they keep, and exploding pools of
	/// each child's exploding chain. Anything else is a single component.
	pub(crate) fn component_count(&self) -> usize {
		match self {
			Self::Pool(pool) => pool.len(),
			Self::Modified(Modified {
				inner,
				modifier: Modifier::DropKeep(selection),
			}) => selection.remaining(inner.component_count()),
			Self::Modified(Modified {
				inner,
				modifier: Modifier::Explode { .. },
			}) => match &**inner {
				Self::Pool(pool) => pool.len(),
				_ => 1,
			},
			Self::Die(..) | Self::Modified(..) => 1,
		}
	}

	/// One end of the range of each component (see [`Self::component_count()`]).
	///
	/// Components kept by a drop/keep modifier can't be tied back to a specific component, so the bounds of the kept
	/// values are given in their place. Any selection over them stays within the true range.
	pub(crate) fn component_bounds(&self, edge: Edge) -> Vec<i64> {
		match self {
			Self::Pool(pool) => pool.iter().map(|child| child.bound(edge)).collect(),
			Self::Modified(Modified {
				inner,
				modifier: Modifier::DropKeep(selection),
			}) => selection.kept(inner.component_bounds(edge)),
			Self::Modified(Modified {
				inner,
				modifier: Modifier::Explode { cond, limit },
			}) => match &**inner {
				Self::Pool(pool) => pool
					.iter()
					.map(|child| modifier::explosion_bound(child, *cond, *limit, edge))
					.collect(),
				_ => vec![self.bound(edge)],
			},
			Self::Die(..) | Self::Modified(..) => vec![self.bound(edge)],
		}
	}

	/// Evaluates each component individually (see [`Self::component_count()`]).
	pub(crate) fn evaluate_components<R, T>(&self, rng: &mut R, tracer: &mut T) -> Vec<Roll>
	where
		R: Roller + ?Sized,
		T: Tracer + ?Sized,
	{
		match self {
			Self::Pool(pool) => pool.iter().map(|child| child.evaluate_traced(rng, tracer)).collect(),
			Self::Modified(modified) => modified.evaluate_components(self, rng, tracer),
			Self::Die(..) => vec![self.evaluate_traced(rng, tracer)],
		}
	}

	/// Replaces a pool that only has one child with that child.
	#[must_use]
	pub(crate) fn flatten(self) -> Self {
		match self {
			Self::Pool(mut pool) if pool.len() == 1 => match pool.children.pop() {
				Some(only) => only,
				None => Self::Pool(pool),
			},
			_ => self,
		}
	}

	/// Sends a record of an evaluation of this rollable to the tracer, if it's listening.
	fn report<T>(&self, tracer: &mut T, roll: &Roll, extensions: impl Iterator<Item = (&'static str, i64)>)
	where
		T: Tracer + ?Sized,
	{
		if tracer.enabled() {
			tracer.trace(Record {
				source: self.kind(),
				subject: self.notation(),
				operation: roll.trace.clone(),
				result: roll.value,
				extensions: extensions.collect(),
			});
		}
	}
}

impl From<Die> for Rollable {
	#[inline]
	fn from(die: Die) -> Self {
		Self::Die(die)
	}
}

impl From<Pool> for Rollable {
	#[inline]
	fn from(pool: Pool) -> Self {
		Self::Pool(pool)
	}
}

impl fmt::Display for Rollable {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// The output is the notation of the rollable.
	///
	/// # Examples
	/// ```
	/// use dicecup::Rollable;
	///
	/// let rollable: Rollable = "4d6 + (2d8 + d4) * 2".parse()?;
	/// assert_eq!(rollable.to_string(), "4D6+(2D8+D4)*2");
	/// # Ok::<(), dicecup::Error>(())
	/// ```
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Die(die) => write!(f, "{die}"),
			Self::Pool(pool) => write!(f, "{pool}"),
			Self::Modified(modified) => write!(f, "{modified}"),
		}
	}
}

#[cfg(feature = "parse")]
impl FromStr for Rollable {
	type Err = Error;

	/// Builds a rollable from notation using the default [`Factory`](crate::Factory) configuration.
	#[inline]
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		crate::build(s)
	}
}

/// Ordered group of rollables (a cup of dice) that are evaluated in order and summed.
///
/// Pools never contain empty pools; they're filtered out when the pool is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Pool {
	/// Rollables in the pool
	children: Vec<Rollable>,
}

impl Pool {
	/// Creates a new pool from the given rollables, leaving out any empty pools among them.
	#[must_use]
	pub fn new(children: impl IntoIterator<Item = Rollable>) -> Self {
		Self {
			children: children
				.into_iter()
				.filter(|child| !matches!(child, Rollable::Pool(pool) if pool.is_empty()))
				.collect(),
		}
	}

	/// Creates a new pool with `quantity` copies of a rollable.
	#[must_use]
	pub fn repeat(rollable: Rollable, quantity: usize) -> Self {
		Self::new(vec![rollable; quantity])
	}

	/// Creates a new pool containing everything in this one followed by the given rollable.
	/// If the rollable is an empty pool, the pool is returned unchanged.
	#[must_use]
	pub fn with(mut self, rollable: Rollable) -> Self {
		if !matches!(&rollable, Rollable::Pool(pool) if pool.is_empty()) {
			self.children.push(rollable);
		}
		self
	}

	/// Number of rollables in the pool.
	#[must_use]
	#[inline]
	pub fn len(&self) -> usize {
		self.children.len()
	}

	/// Checks whether the pool has no rollables in it.
	#[must_use]
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.children.is_empty()
	}

	/// Iterates over the rollables in the pool, in order.
	#[inline]
	pub fn iter(&self) -> slice::Iter<'_, Rollable> {
		self.children.iter()
	}
}

impl<'a> IntoIterator for &'a Pool {
	type Item = &'a Rollable;
	type IntoIter = slice::Iter<'a, Rollable>;

	#[inline]
	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

impl FromIterator<Rollable> for Pool {
	#[inline]
	fn from_iter<I: IntoIterator<Item = Rollable>>(iter: I) -> Self {
		Self::new(iter)
	}
}

impl fmt::Display for Pool {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// Children with identical notation are grouped together at the position of the first one. Groups of dice are
	/// prefixed with their count (four D6 become `4D6`), at most 1000 to a group so the notation builds again with the
	/// default [`Factory`] limits. Other groups repeat their notation. An empty pool is `0`.
	///
	/// [`Factory`]: crate::Factory
	///
	/// # Examples
	/// ```
	/// use dicecup::{Die, Pool, Rollable};
	///
	/// let pool = Pool::new([
	/// 	Rollable::Die(Die::Sided(6)),
	/// 	Rollable::Die(Die::Fudge),
	/// 	Rollable::Die(Die::Sided(6)),
	/// ]);
	/// assert_eq!(pool.to_string(), "2D6+DF");
	/// assert_eq!(Pool::default().to_string(), "0");
	///
	/// let many = Pool::repeat(Rollable::Die(Die::Sided(6)), 1001);
	/// assert_eq!(many.to_string(), "1000D6+D6");
	/// ```
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_empty() {
			return f.write_str("0");
		}

		let mut groups: Vec<(String, usize, bool)> = Vec::new();
		for child in &self.children {
			let notation = child.to_string();
			match groups.iter_mut().find(|(existing, ..)| *existing == notation) {
				Some((_, count, _)) => *count = count.saturating_add(1),
				None => groups.push((notation, 1, matches!(child, Rollable::Die(..)))),
			}
		}

		let mut rendered = Vec::new();
		for (notation, mut count, is_die) in groups {
			if !is_die {
				rendered.push(vec![notation; count].join("+"));
				continue;
			}

			while count > 0 {
				let chunk = count.min(MAX_GROUP);
				rendered.push(match chunk {
					1 => notation.clone(),
					_ => format!("{chunk}{notation}"),
				});
				count = count.saturating_sub(chunk);
			}
		}
		f.write_str(&rendered.join("+"))
	}
}

/// Rollable wrapped with a [`Modifier`]. Created with [`Rollable::modified()`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Modified {
	/// Rollable the modifier applies to
	inner: Box<Rollable>,

	/// Modifier to apply
	modifier: Modifier,
}

impl Modified {
	/// Rollable the modifier applies to.
	#[must_use]
	#[inline]
	pub fn inner(&self) -> &Rollable {
		&self.inner
	}

	/// Modifier that is applied.
	#[must_use]
	#[inline]
	pub const fn modifier(&self) -> Modifier {
		self.modifier
	}

	/// Evaluates the inner rollable and applies the modifier, reporting as `node`.
	fn evaluate<R, T>(&self, node: &Rollable, rng: &mut R, tracer: &mut T) -> Roll
	where
		R: Roller + ?Sized,
		T: Tracer + ?Sized,
	{
		match self.modifier {
			Modifier::Arithmetic(op, operand) => {
				let roll = modifier::apply_arithmetic(op, operand, &self.inner, rng, tracer);
				node.report(tracer, &roll, [].into_iter());
				roll
			}
			Modifier::DropKeep(selection) => {
				let selected = modifier::apply_drop_keep(selection, &self.inner, rng, tracer);
				node.report(tracer, &selected.roll, selected_extensions(&selected));
				selected.roll
			}
			Modifier::Explode { cond, limit } => {
				let exploded = modifier::apply_explode(cond, limit, &self.inner, rng, tracer);
				node.report(tracer, &exploded.roll, exploded_extensions(&exploded));
				exploded.roll
			}
		}
	}

	/// Evaluates each component individually (see [`Rollable::component_count()`]), reporting as `node`.
	fn evaluate_components<R, T>(&self, node: &Rollable, rng: &mut R, tracer: &mut T) -> Vec<Roll>
	where
		R: Roller + ?Sized,
		T: Tracer + ?Sized,
	{
		match self.modifier {
			Modifier::DropKeep(selection) => {
				let selected = modifier::apply_drop_keep(selection, &self.inner, rng, tracer);
				node.report(tracer, &selected.roll, selected_extensions(&selected));
				selected.kept
			}
			Modifier::Explode { cond, limit } if matches!(&*self.inner, Rollable::Pool(..)) => {
				let exploded = modifier::apply_explode(cond, limit, &self.inner, rng, tracer);
				node.report(tracer, &exploded.roll, exploded_extensions(&exploded));
				exploded.chains
			}
			Modifier::Arithmetic(..) | Modifier::Explode { .. } => vec![self.evaluate(node, rng, tracer)],
		}
	}
}

impl fmt::Display for Modified {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&modifier::notation(&self.inner, self.modifier))
	}
}

/// Trace record extensions for a drop/keep evaluation
fn selected_extensions(selected: &modifier::Selected) -> impl Iterator<Item = (&'static str, i64)> {
	[
		("kept", i64::try_from(selected.kept.len()).unwrap_or(i64::MAX)),
		("dropped", i64::try_from(selected.dropped).unwrap_or(i64::MAX)),
	]
	.into_iter()
}

/// Trace record extensions for an explode evaluation
fn exploded_extensions(exploded: &modifier::Exploded) -> impl Iterator<Item = (&'static str, i64)> {
	[("total_rolls", i64::try_from(exploded.rolls).unwrap_or(i64::MAX))].into_iter()
}

/// Result of evaluating a [`Rollable`]: the total value and a human-readable trace of how it was reached
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[expect(clippy::exhaustive_structs, reason = "Plain result data")]
pub struct Roll {
	/// Total value
	pub value: i64,

	/// Derivation of the total, e.g. `(3 + 4) * 2`
	pub trace: String,
}

impl Roll {
	/// Creates a new roll result.
	#[must_use]
	pub fn new(value: i64, trace: impl Into<String>) -> Self {
		Self {
			value,
			trace: trace.into(),
		}
	}

	/// Creates a result for a single plain value, traced as its decimal representation.
	#[must_use]
	pub fn from_val(value: i64) -> Self {
		Self {
			value,
			trace: value.to_string(),
		}
	}

	/// Sums results together, joining their traces with ` + ` and wrapping any traces that are sums themselves in
	/// parentheses. The sum of nothing is `0`, and the sum of a single result is that result.
	#[must_use]
	pub fn sum(mut parts: Vec<Self>) -> Self {
		if parts.len() <= 1 {
			return parts.pop().unwrap_or_else(|| Self::new(0, "0".to_owned()));
		}

		let value = parts.iter().fold(0, |sum: i64, part| sum.saturating_add(part.value));
		let trace = parts
			.into_iter()
			.map(|part| wrap_sum(part.trace))
			.collect::<Vec<_>>()
			.join(" + ");
		Self { value, trace }
	}
}

impl fmt::Display for Roll {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// The output is the trace followed by the total, e.g. `(3 + 4) * 2 = 14`.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} = {}", self.trace, self.value)
	}
}

/// Wraps a trace in parentheses if it contains a sum, so that it reads correctly as part of a larger expression.
#[must_use]
pub(crate) fn wrap_sum(trace: String) -> String {
	if trace.contains('+') {
		paren_wrap(trace)
	} else {
		trace
	}
}

/// Wraps a string in parentheses.
#[must_use]
fn paren_wrap(mut text: String) -> String {
	text.insert(0, '(');
	text.push(')');
	text
}
