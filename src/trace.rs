//! Observers that are notified of every evaluation step made in an expression tree.
//!
//! Tracers are purely observational. Evaluating with any tracer produces exactly the same [`Roll`] as evaluating with
//! the no-op `()` tracer, given the same random source.
//!
//! [`Roll`]: crate::Roll

use alloc::{collections::BTreeMap, string::String, vec::Vec};
use core::mem;

#[cfg(feature = "tracing")]
use tracing::Level;

/// Receives a [`Record`] for each evaluation performed anywhere in an expression tree.
pub trait Tracer {
	/// Checks whether the tracer wants records at all. Records are only built for tracers that are enabled.
	fn enabled(&self) -> bool {
		true
	}

	/// Receives a single record.
	fn trace(&mut self, record: Record);
}

/// No-op tracer that never receives anything
impl Tracer for () {
	#[inline]
	fn enabled(&self) -> bool {
		false
	}

	#[inline]
	fn trace(&mut self, _record: Record) {}
}

impl<T: Tracer + ?Sized> Tracer for &mut T {
	#[inline]
	fn enabled(&self) -> bool {
		(**self).enabled()
	}

	#[inline]
	fn trace(&mut self, record: Record) {
		(**self).trace(record);
	}
}

/// Description of a single evaluation of one node in an expression tree
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[expect(clippy::exhaustive_structs, reason = "Plain record data")]
pub struct Record {
	/// Kind of node that was evaluated (`SidedDie`, `Pool`, `Explode`, etc.)
	pub source: &'static str,

	/// Notation of the node that was evaluated
	pub subject: String,

	/// Trace produced by the evaluation
	pub operation: String,

	/// Value produced by the evaluation
	pub result: i64,

	/// Extra details specific to the kind of node (`total_rolls` for explosions, `kept`/`dropped` for drop/keep)
	pub extensions: BTreeMap<&'static str, i64>,
}

/// Tracer that collects every record it receives, in order.
///
/// # Examples
/// ```
/// use dicecup::{dice::roller::Iter as IterRoller, trace::Memory as MemoryTracer};
///
/// let mut tracer = MemoryTracer::default();
/// let roll = dicecup::build("3D6!6")?.evaluate_traced(&mut IterRoller::new([6, 2, 3, 4]), &mut tracer);
/// assert_eq!(roll.value, 15);
///
/// let explode = tracer.last().unwrap();
/// assert_eq!(explode.source, "Explode");
/// assert_eq!(explode.extensions.get("total_rolls"), Some(&4));
/// # Ok::<(), dicecup::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Memory {
	/// Records received so far
	records: Vec<Record>,
}

impl Memory {
	/// Records received so far, in the order they were received.
	#[must_use]
	#[inline]
	pub fn records(&self) -> &[Record] {
		&self.records
	}

	/// Most recently received record. After an evaluation, this is the record for the root of the tree.
	#[must_use]
	#[inline]
	pub fn last(&self) -> Option<&Record> {
		self.records.last()
	}

	/// Removes and returns all records received so far.
	#[inline]
	pub fn take(&mut self) -> Vec<Record> {
		mem::take(&mut self.records)
	}
}

impl Tracer for Memory {
	#[inline]
	fn trace(&mut self, record: Record) {
		self.records.push(record);
	}
}

/// Tracer that emits a [`tracing`] event at the `DEBUG` level for each record. Requires the `tracing` feature.
///
/// It's only enabled when a subscriber is interested in `DEBUG` events from this crate.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, Default)]
#[expect(clippy::exhaustive_structs, reason = "Highly unlikely to change")]
pub struct Log;

#[cfg(feature = "tracing")]
impl Tracer for Log {
	#[inline]
	fn enabled(&self) -> bool {
		tracing::enabled!(Level::DEBUG)
	}

	fn trace(&mut self, record: Record) {
		tracing::debug!(
			source = record.source,
			subject = %record.subject,
			operation = %record.operation,
			result = record.result,
			extensions = ?record.extensions,
			"evaluated",
		);
	}
}
