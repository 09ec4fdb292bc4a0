//! Random sources that dice draw their values from.

use core::iter::Peekable;

#[cfg(feature = "fastrand")]
use fastrand::Rng;

/// Supplies integers for dice - what else is there to say?
pub trait Roller {
	/// Draws a single integer from the inclusive range `low..=high`.
	/// If `high` is not greater than `low`, implementations should return `low`.
	#[must_use]
	fn between(&mut self, low: i64, high: i64) -> i64;
}

impl<R: Roller + ?Sized> Roller for &mut R {
	#[inline]
	fn between(&mut self, low: i64, high: i64) -> i64 {
		(**self).between(low, high)
	}
}

/// Generates uniformly distributed values using [fastrand]. Requires the `fastrand` feature (enabled by default).
///
/// # Examples
///
/// ## Default fastrand roller
/// ```
/// use dicecup::dice::roller::FastRand as FastRandRoller;
///
/// let mut roller = FastRandRoller::default();
/// let rollable = dicecup::build("4D6")?;
/// let _ = rollable.evaluate(&mut roller);
/// let _ = rollable.evaluate(&mut roller);
/// # Ok::<(), dicecup::Error>(())
/// ```
///
/// ## Manually seeded fastrand roller
/// ```
/// use dicecup::dice::roller::FastRand as FastRandRoller;
///
/// let rollable = dicecup::build("4D6")?;
/// let first = rollable.evaluate(&mut FastRandRoller::with_seed(0x750c38d574400));
/// let second = rollable.evaluate(&mut FastRandRoller::with_seed(0x750c38d574400));
/// assert_eq!(first, second);
/// # Ok::<(), dicecup::Error>(())
/// ```
#[cfg(feature = "fastrand")]
#[derive(Debug, Clone)]
#[cfg_attr(feature = "std", derive(Default))]
pub struct FastRand(Rng);

#[cfg(feature = "fastrand")]
impl FastRand {
	/// Creates a new fastrand roller that uses the given RNG instance to generate values.
	#[must_use]
	#[inline]
	pub const fn new(rng: Rng) -> Self {
		Self(rng)
	}

	/// Creates a new fastrand roller that uses a pre-seeded RNG instance to generate values.
	#[must_use]
	#[inline]
	pub fn with_seed(seed: u64) -> Self {
		Self(Rng::with_seed(seed))
	}
}

#[cfg(feature = "fastrand")]
impl Roller for FastRand {
	/// Draws a value using the [`fastrand::Rng`] the roller was created with.
	#[inline]
	fn between(&mut self, low: i64, high: i64) -> i64 {
		if high > low {
			self.0.i64(low..=high)
		} else {
			low
		}
	}
}

/// Generates values that are always the top of the requested range.
///
/// # Examples
/// ```
/// use dicecup::dice::roller::Max as MaxRoller;
///
/// let rollable = dicecup::build("4D6")?;
/// assert_eq!(rollable.evaluate(&mut MaxRoller).value, 24);
/// # Ok::<(), dicecup::Error>(())
/// ```
#[derive(Debug, Default, Clone)]
#[expect(clippy::exhaustive_structs, reason = "Highly unlikely to change")]
pub struct Max;

impl Roller for Max {
	#[inline]
	fn between(&mut self, low: i64, high: i64) -> i64 {
		high.max(low)
	}
}

/// Generates values that are always the bottom of the requested range.
///
/// # Examples
/// ```
/// use dicecup::dice::roller::Min as MinRoller;
///
/// let rollable = dicecup::build("4D6")?;
/// assert_eq!(rollable.evaluate(&mut MinRoller).value, 4);
/// # Ok::<(), dicecup::Error>(())
/// ```
#[derive(Debug, Default, Clone)]
#[expect(clippy::exhaustive_structs, reason = "Highly unlikely to change")]
pub struct Min;

impl Roller for Min {
	#[inline]
	fn between(&mut self, low: i64, _high: i64) -> i64 {
		low
	}
}

/// Generates values from an iterator, ignoring the requested range. Mainly useful for testing purposes.
///
/// Custom dice consume the value as a face index rather than a face.
///
/// # Examples
/// ```
/// use dicecup::dice::roller::Iter as IterRoller;
///
/// let mut roller = IterRoller::new(vec![2, 5, 1, 6]);
/// let roll = dicecup::build("4D6")?.evaluate(&mut roller);
/// assert_eq!(roll.value, 14);
/// assert_eq!(roll.trace, "2 + 5 + 1 + 6");
/// assert!(!roller.can_roll());
/// # Ok::<(), dicecup::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Iter<I: Iterator<Item = i64>>(Peekable<I>);

impl<I: Iterator<Item = i64>> Iter<I> {
	/// Checks whether the iterator still has values available.
	#[inline]
	pub fn can_roll(&mut self) -> bool {
		self.0.peek().is_some()
	}

	/// Creates a new roller that uses the given iterator to provide values.
	#[must_use]
	#[inline]
	pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
		Self(iter.into_iter().peekable())
	}
}

impl<I: Iterator<Item = i64>> Roller for Iter<I> {
	/// Draws the value from the next iteration.
	///
	/// # Panics
	/// If the iterator has finished, this will panic.
	#[inline]
	#[expect(
		clippy::expect_used,
		reason = "Mostly for testing, otherwise manual checking of can_roll() is expected"
	)]
	fn between(&mut self, _low: i64, _high: i64) -> i64 {
		self.0.next().expect("iterator is finished")
	}
}
