//! Assembly of rollable expression trees from parse records. Requires the `parse` feature (enabled by default).

use alloc::vec::Vec;

use crate::{
	dice::{
		modifier::{Condition, Operator, Selection},
		Die, Error, Modifier,
	},
	expr::{Pool, Rollable},
	parse::{self, DieRecord, Expression, ModifierKind, ModifierRecord, Segment, Source},
};

/// Limits that a [`Factory`] applies to the trees it builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct Config {
	/// Maximum number of dice in a single simple pool (e.g. the `3` in `3D6`)
	pub max_quantity: u64,

	/// Maximum number of additional rolls a single exploding chain can make before it stops
	pub explosion_limit: u32,

	/// Maximum number of parenthesized groups nested inside of each other
	pub max_depth: usize,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			max_quantity: 1000,
			explosion_limit: 100,
			max_depth: 32,
		}
	}
}

/// Fluent builder for a [`Factory`] with a custom [`Config`]
///
/// # Examples
/// ```
/// use dicecup::{Error, Factory};
///
/// let factory = Factory::builder().max_quantity(10).explosion_limit(3).build();
/// assert!(factory.build("10D6").is_ok());
/// assert_eq!(factory.build("11D6"), Err(Error::TooManyObjects { count: 11, limit: 10 }));
///
/// // Three additional rolls at most
/// assert_eq!(factory.build("D6!>=1")?.maximum(), 24);
/// # Ok::<(), Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
	/// Configuration being built
	config: Config,
}

impl Builder {
	/// Sets the maximum number of dice in a single simple pool.
	#[must_use]
	pub const fn max_quantity(mut self, max_quantity: u64) -> Self {
		self.config.max_quantity = max_quantity;
		self
	}

	/// Sets the maximum number of additional rolls a single exploding chain can make.
	#[must_use]
	pub const fn explosion_limit(mut self, explosion_limit: u32) -> Self {
		self.config.explosion_limit = explosion_limit;
		self
	}

	/// Sets the maximum nesting depth of parenthesized groups.
	#[must_use]
	pub const fn max_depth(mut self, max_depth: usize) -> Self {
		self.config.max_depth = max_depth;
		self
	}

	/// Creates the factory.
	#[must_use]
	pub const fn build(self) -> Factory {
		Factory::new(self.config)
	}
}

/// Builds rollable expression trees from notation.
///
/// Building is fail-fast: the first problem encountered aborts the build, and no partial tree is ever returned.
#[derive(Debug, Clone, Default)]
pub struct Factory {
	/// Limits to apply
	config: Config,
}

impl Factory {
	/// Creates a factory that applies the given limits.
	#[must_use]
	#[inline]
	pub const fn new(config: Config) -> Self {
		Self { config }
	}

	/// Starts building a factory with custom limits.
	#[must_use]
	#[inline]
	pub fn builder() -> Builder {
		Builder::default()
	}

	/// Limits the factory applies.
	#[must_use]
	#[inline]
	pub const fn config(&self) -> &Config {
		&self.config
	}

	/// Parses notation and builds a rollable expression tree from it.
	///
	/// # Errors
	/// - [`Error::UnknownExpression`] if the notation doesn't match the grammar
	/// - [`Error::TooFewSides`] if a die has fewer than 2 sides
	/// - [`Error::IllegalValue`] for a quantity below 1, division by zero, or a negative drop/keep count
	/// - [`Error::TooManyObjects`] for a quantity over the limit, selecting more dice than are available, or nesting
	///   groups too deeply
	/// - [`Error::UnknownAlgorithm`] for an unknown operator or comparator
	///
	/// # Examples
	/// ```
	/// use dicecup::{dice::roller::Iter as IterRoller, Factory};
	///
	/// let rollable = Factory::default().build("(2d6 + 3) * 2")?;
	/// assert_eq!(rollable.notation(), "(2D6+3)*2");
	/// assert_eq!((rollable.minimum(), rollable.maximum()), (10, 30));
	///
	/// let roll = rollable.evaluate(&mut IterRoller::new([3, 4]));
	/// assert_eq!(roll.value, 20);
	/// assert_eq!(roll.trace, "((3 + 4) + 3) * 2");
	/// # Ok::<(), dicecup::Error>(())
	/// ```
	pub fn build(&self, notation: &str) -> Result<Rollable, Error> {
		// Checked before parsing so the parser never recurses deeper than allowed
		self.check_depth(parse::nesting_depth(notation))?;
		let record = parse::parse(notation)?;
		self.build_record(&record)
	}

	/// Builds a rollable expression tree from an already parsed record.
	///
	/// # Errors
	/// See [`Self::build()`].
	pub fn build_record(&self, record: &Expression) -> Result<Rollable, Error> {
		self.check_depth(record.depth())?;
		self.assemble(record)
	}

	/// Builds every segment of an expression and combines them into one pool, flattened if it only has one.
	fn assemble(&self, record: &Expression) -> Result<Rollable, Error> {
		let segments = record
			.segments
			.iter()
			.map(|segment| self.segment(segment))
			.collect::<Result<Vec<_>, _>>()?;
		Ok(Rollable::Pool(Pool::new(segments)).flatten())
	}

	/// Builds a single segment: its pool or group, decorated with its modifiers.
	fn segment(&self, segment: &Segment) -> Result<Rollable, Error> {
		let source = match &segment.source {
			Source::Pool { quantity, die } => {
				let die = Self::die(die)?;
				let quantity = self.quantity(*quantity)?;
				Rollable::Pool(Pool::repeat(Rollable::Die(die), quantity))
			}
			Source::Group(inner) => self.assemble(inner)?,
		};

		Ok(self.decorate(source, &segment.modifiers)?.flatten())
	}

	/// Resolves a die type token to a die.
	fn die(record: &DieRecord) -> Result<Die, Error> {
		match record {
			DieRecord::Sides(sides) => Die::sided(*sides),
			DieRecord::Fudge => Ok(Die::Fudge),
			DieRecord::Percentile => Ok(Die::Percentile),
			DieRecord::Custom(faces) => Die::custom(faces.iter().copied()),
		}
	}

	/// Checks a pool quantity, defaulting to 1 when it wasn't written.
	fn quantity(&self, quantity: Option<i64>) -> Result<usize, Error> {
		let quantity = quantity.unwrap_or(1);
		if quantity < 1 {
			return Err(Error::IllegalValue {
				what: "quantity",
				value: quantity,
			});
		}

		let too_many = || Error::TooManyObjects {
			count: u64::try_from(quantity).unwrap_or(u64::MAX),
			limit: self.config.max_quantity,
		};
		if u64::try_from(quantity).map_err(|_err| too_many())? > self.config.max_quantity {
			return Err(too_many());
		}
		usize::try_from(quantity).map_err(|_err| too_many())
	}

	/// Wraps a rollable with each of the modifiers in turn.
	fn decorate(&self, rollable: Rollable, modifiers: &[ModifierRecord]) -> Result<Rollable, Error> {
		modifiers
			.iter()
			.try_fold(rollable, |inner, record| Rollable::modified(inner, self.modifier(record)?))
	}

	/// Resolves a modifier token to a modifier.
	fn modifier(&self, record: &ModifierRecord) -> Result<Modifier, Error> {
		Ok(match record.kind {
			ModifierKind::Arithmetic => Modifier::Arithmetic(Operator::from_symbol(&record.operator)?, record.value),
			ModifierKind::DropKeep => {
				let count = usize::try_from(record.value).map_err(|_err| Error::IllegalValue {
					what: "drop/keep count",
					value: record.value,
				})?;
				Modifier::DropKeep(Selection::from_symbol_and_count(&record.operator, count)?)
			}
			ModifierKind::Explode => Modifier::Explode {
				cond: Condition::from_symbol_and_val(&record.operator, record.value)?,
				limit: self.config.explosion_limit,
			},
		})
	}

	/// Checks that groups aren't nested deeper than allowed.
	fn check_depth(&self, depth: usize) -> Result<(), Error> {
		if depth > self.config.max_depth {
			return Err(Error::TooManyObjects {
				count: u64::try_from(depth).unwrap_or(u64::MAX),
				limit: u64::try_from(self.config.max_depth).unwrap_or(u64::MAX),
			});
		}
		Ok(())
	}
}
