//! Parser generator functions and the parse records they produce. Requires the `parse` feature (enabled by default).
//!
//! Notation is normalized before it's parsed: all whitespace is removed and letters are made uppercase, so `4d6 kh3`
//! and `4D6KH3` are the same. The records produced here describe the notation as written; turning them into a
//! [`Rollable`] is the job of the [`Factory`].
//!
//! [`Rollable`]: crate::Rollable
//! [`Factory`]: crate::Factory

use alloc::{
	borrow::ToOwned,
	string::{String, ToString},
	vec,
	vec::Vec,
};

use chumsky::prelude::*;

use crate::dice::Error;

/// Parsed notation: one or more segments joined with `+`
///
/// An empty expression is produced for empty notation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct Expression {
	/// Segments in the order they were written
	pub segments: Vec<Segment>,
}

impl Expression {
	/// Number of parenthesized groups nested inside of each other at the deepest point of the expression.
	#[must_use]
	pub fn depth(&self) -> usize {
		self.segments
			.iter()
			.map(|segment| match &segment.source {
				Source::Group(inner) => inner.depth().saturating_add(1),
				Source::Pool { .. } => 0,
			})
			.max()
			.unwrap_or(0)
	}
}

/// A pool or group followed by the modifiers attached to it
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Segment {
	/// What the modifiers apply to
	pub source: Source,

	/// Modifiers in the order they were written. Each one wraps the result of the previous one.
	pub modifiers: Vec<ModifierRecord>,
}

/// Thing that a segment's modifiers are attached to
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Source {
	/// Simple pool of identical dice, e.g. `3D6`
	Pool {
		/// Number of dice, if written
		quantity: Option<i64>,

		/// Type of dice
		die: DieRecord,
	},

	/// Parenthesized expression, e.g. `(2D6+D4)`
	Group(Expression),
}

/// Die type token
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DieRecord {
	/// Number of sides, e.g. the `6` in `D6`
	Sides(i64),

	/// `F`
	Fudge,

	/// `%`
	Percentile,

	/// Face list, e.g. the `[1,1,2,4]` in `D[1,1,2,4]`
	Custom(Vec<i64>),
}

/// Modifier token
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ModifierRecord {
	/// Which modifier the token describes
	pub kind: ModifierKind,

	/// Operator, selection or comparator symbol (`*`, `KH`, `>=`, etc.)
	pub operator: String,

	/// Operand, count or threshold
	pub value: i64,
}

/// Kind of modifier described by a [`ModifierRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[expect(clippy::exhaustive_enums, reason = "Matches the modifier grammar")]
pub enum ModifierKind {
	/// `+3`, `*2`, etc.
	Arithmetic,

	/// `KH1`, `DL2`, etc.
	DropKeep,

	/// `!6`, `!>=5`, etc.
	Explode,
}

/// Single step after the first operand of an expression
#[derive(Debug, Clone)]
enum Step {
	/// `+` followed by another pool or group
	Join(Source),

	/// Modifier for the most recent pool or group
	Modify(ModifierRecord),
}

/// Generates a parser that handles unsigned integers, saturating at [`i64::MAX`] if they're too large.
pub fn integer<'src>() -> impl Parser<'src, &'src str, i64, extra::Err<Rich<'src, char>>> + Clone {
	text::int(10)
		.map(|digits: &str| digits.parse().unwrap_or(i64::MAX))
		.labelled("integer")
}

/// Generates a parser that handles integers with an optional leading `-`.
pub fn signed_integer<'src>() -> impl Parser<'src, &'src str, i64, extra::Err<Rich<'src, char>>> + Clone {
	just('-')
		.or_not()
		.then(integer())
		.map(|(sign, magnitude)| match sign {
			Some(_) => magnitude.saturating_neg(),
			None => magnitude,
		})
		.labelled("signed integer")
}

/// Generates a parser that handles die type tokens like "6", "F", "%", and "[1,1,2,4]".
pub fn die_type<'src>() -> impl Parser<'src, &'src str, DieRecord, extra::Err<Rich<'src, char>>> + Clone {
	choice((
		integer().map(DieRecord::Sides),
		just('F').to(DieRecord::Fudge),
		just('%').to(DieRecord::Percentile),
		signed_integer()
			.separated_by(just(','))
			.at_least(1)
			.collect::<Vec<_>>()
			.delimited_by(just('['), just(']'))
			.map(DieRecord::Custom),
	))
	.labelled("die type")
}

/// Generates a parser that handles simple pools like "D20", "3D6", and "4DF".
pub fn simple_pool<'src>() -> impl Parser<'src, &'src str, Source, extra::Err<Rich<'src, char>>> + Clone {
	integer()
		.or_not()
		.then_ignore(just('D'))
		.then(die_type())
		.map(|(quantity, die)| Source::Pool { quantity, die })
}

/// Generates a parser that handles modifiers like "+3", "KH2", and "!>=5".
pub fn modifier<'src>() -> impl Parser<'src, &'src str, ModifierRecord, extra::Err<Rich<'src, char>>> + Clone {
	// Comparator for explosions, longest symbols first
	let comparator = choice((just(">="), just("<="), just(">"), just("<"), just("=")));

	choice((
		// Arithmetic (e.g. +3, *2)
		one_of("+-*/")
			.then(integer())
			.map(|(op, value): (char, i64)| ModifierRecord {
				kind: ModifierKind::Arithmetic,
				operator: op.to_string(),
				value,
			}),
		// Drop/keep (e.g. KH1, DL2)
		one_of("KD")
			.then(one_of("HL"))
			.then(integer())
			.map(|((action, end), value): ((char, char), i64)| {
				let mut operator = String::with_capacity(2);
				operator.push(action);
				operator.push(end);
				ModifierRecord {
					kind: ModifierKind::DropKeep,
					operator,
					value,
				}
			}),
		// Explode (e.g. !6, !>4)
		just('!')
			.ignore_then(comparator.or_not())
			.then(signed_integer())
			.map(|(cmp, value)| ModifierRecord {
				kind: ModifierKind::Explode,
				operator: cmp.unwrap_or("=").to_owned(),
				value,
			}),
	))
	.labelled("modifier")
}

/// Generates a parser that handles full expressions: pools and parenthesized groups joined with `+`, each followed by
/// any number of modifiers.
pub fn expression<'src>() -> impl Parser<'src, &'src str, Expression, extra::Err<Rich<'src, char>>> + Clone {
	recursive(|expression| {
		let operand = choice((
			simple_pool(),
			expression.delimited_by(just('('), just(')')).map(Source::Group),
		));

		// A joined operand takes priority, so "+3" only becomes a modifier when it isn't "+3D6"
		let step = choice((
			just('+').ignore_then(operand.clone()).map(Step::Join),
			modifier().map(Step::Modify),
		));

		operand
			.then(step.repeated().collect::<Vec<_>>())
			.map(|(first, steps)| {
				let mut segments = vec![Segment {
					source: first,
					modifiers: Vec::new(),
				}];

				for step in steps {
					match step {
						Step::Join(source) => segments.push(Segment {
							source,
							modifiers: Vec::new(),
						}),
						Step::Modify(modifier) => {
							if let Some(segment) = segments.last_mut() {
								segment.modifiers.push(modifier);
							}
						}
					}
				}

				Expression { segments }
			})
	})
}

/// Generates a parser that handles full expressions and expects end of input. Input must already be normalized
/// (see [`normalize()`]).
pub fn parser<'src>() -> impl Parser<'src, &'src str, Expression, extra::Err<Rich<'src, char>>> + Clone {
	expression().then_ignore(end())
}

/// Normalizes notation for parsing by removing all whitespace and making it uppercase.
///
/// # Examples
/// ```
/// assert_eq!(dicecup::parse::normalize(" 4d6 kh3 + d[-1, 2] "), "4D6KH3+D[-1,2]");
/// ```
#[must_use]
pub fn normalize(notation: &str) -> String {
	notation
		.chars()
		.filter(|ch| !ch.is_whitespace())
		.flat_map(char::to_uppercase)
		.collect()
}

/// Parses notation into an [`Expression`] record. Empty notation produces an empty expression.
///
/// # Errors
/// If the notation doesn't match the grammar, [`Error::UnknownExpression`] is returned with the normalized text from
/// the point where matching failed onward (or the whole normalized notation, if it failed at the very end).
///
/// # Examples
/// ```
/// use dicecup::{parse, Error};
///
/// let expression = parse::parse("3d6 + 2d4!>4 kh2")?;
/// assert_eq!(expression.segments.len(), 2);
/// assert_eq!(expression.segments[1].modifiers.len(), 2);
///
/// assert_eq!(parse::parse("D3#"), Err(Error::UnknownExpression("#".to_owned())));
/// # Ok::<(), Error>(())
/// ```
pub fn parse(notation: &str) -> Result<Expression, Error> {
	let normalized = normalize(notation);
	if normalized.is_empty() {
		return Ok(Expression::default());
	}

	let result = parser().parse(normalized.as_str()).into_result().map_err(|errs| {
		let start = errs.first().map_or(0, |err| err.span().start);
		let unmatched = normalized
			.get(start..)
			.filter(|rest| !rest.is_empty())
			.unwrap_or(normalized.as_str());
		Error::UnknownExpression(unmatched.to_owned())
	});
	result
}

/// Counts how deeply parentheses are nested in raw notation, without parsing it.
///
/// # Examples
/// ```
/// assert_eq!(dicecup::parse::nesting_depth("((2D6+3)*2)KH1"), 2);
/// assert_eq!(dicecup::parse::nesting_depth("4D6"), 0);
/// ```
#[must_use]
pub fn nesting_depth(notation: &str) -> usize {
	let mut depth: usize = 0;
	let mut deepest: usize = 0;
	for ch in notation.chars() {
		match ch {
			'(' => {
				depth = depth.saturating_add(1);
				deepest = deepest.max(depth);
			}
			')' => depth = depth.saturating_sub(1),
			_ => {}
		}
	}
	deepest
}
