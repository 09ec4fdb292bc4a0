use crate::{
	dice::{
		modifier::{Condition, Operator, Selection},
		roller::{FastRand as FastRandRoller, Iter as IterRoller, Max as MaxRoller, Min as MinRoller},
		Die, Error, Modifier,
	},
	expr::{Pool, Roll, Rollable},
};

#[test]
fn empty_pool() {
	let pool = Rollable::Pool(Pool::default());
	assert_eq!(pool.evaluate(&mut IterRoller::new([])), Roll::new(0, "0"));
	assert_eq!((pool.minimum(), pool.maximum()), (0, 0));
	assert_eq!(pool.notation(), "0");
}

#[test]
fn pools_filter_empty_pools() {
	let empty = Rollable::Pool(Pool::default());
	let pool = Pool::new([empty.clone(), d(6), empty.clone()]);
	assert_eq!(pool.len(), 1);

	let pool = pool.with(empty).with(d(4));
	assert_eq!(pool.len(), 2);
	assert_eq!(pool.iter().collect::<Vec<_>>(), [&d(6), &d(4)]);
}

#[test]
fn pool_bounds() {
	let pool = Rollable::Pool(Pool::new([d(6), d(6), Rollable::Die(Die::Fudge), d(10)]));
	assert_eq!((pool.minimum(), pool.maximum()), (2, 23));
}

#[test]
fn pool_evaluates_children_in_order() {
	let pool = Rollable::Pool(Pool::new([d(6), d(8), d(4)]));
	let roll = pool.evaluate(&mut IterRoller::new([3, 7, 1]));
	assert_eq!(roll.value, 11);
	assert_eq!(roll.trace, "3 + 7 + 1");
}

#[test]
fn pool_notation_groups_identical_dice() {
	let pool = Pool::new([d(6), d(8), d(6), d(6)]);
	assert_eq!(pool.to_string(), "3D6+D8");
	assert_eq!(Pool::repeat(d(6), 4).to_string(), "4D6");
}

#[test]
fn pool_notation_repeats_identical_groups() {
	let doubled = modified(d(6), Modifier::Arithmetic(Operator::Mul, 2));
	let pool = Pool::new([doubled.clone(), d(4), doubled]);
	assert_eq!(pool.to_string(), "D6*2+D6*2+D4");

	let nested = Rollable::Pool(Pool::repeat(d(6), 2));
	assert_eq!(Pool::new([nested.clone(), nested]).to_string(), "2D6+2D6");
}

#[test]
fn pool_traces_wrap_sums() {
	let inner = modified(pool_of(2, 6), Modifier::Arithmetic(Operator::Add, 1));
	let pool = Rollable::Pool(Pool::new([inner, d(4)]));
	let roll = pool.evaluate(&mut IterRoller::new([3, 4, 2]));
	assert_eq!(roll.value, 10);
	assert_eq!(roll.trace, "((3 + 4) + 1) + 2");
}

#[test]
fn single_child_pool_acts_like_its_child() {
	let pool = Rollable::Pool(Pool::new([d(6)]));
	assert_eq!((pool.minimum(), pool.maximum()), (1, 6));
	assert_eq!(pool.notation(), "D6");
	assert_eq!(pool.evaluate(&mut IterRoller::new([5])), Roll::new(5, "5"));
	assert_eq!(pool.flatten(), d(6));

	let pair = pool_of(2, 6);
	assert_eq!(pair.clone().flatten(), pair);
}

#[test]
fn arithmetic() {
	let rollable = modified(pool_of(2, 6), Modifier::Arithmetic(Operator::Mul, 2));
	assert_eq!((rollable.minimum(), rollable.maximum()), (4, 24));
	assert_eq!(rollable.notation(), "2D6*2");

	let roll = rollable.evaluate(&mut IterRoller::new([3, 4]));
	assert_eq!(roll, Roll::new(14, "(3 + 4) * 2"));
	assert_eq!(roll.to_string(), "(3 + 4) * 2 = 14");
}

#[test]
fn arithmetic_bounds_follow_the_operation() {
	let negated = modified(d(6), Modifier::Arithmetic(Operator::Mul, -2));
	assert_eq!((negated.minimum(), negated.maximum()), (-12, -2));

	let subtracted = modified(pool_of(2, 6), Modifier::Arithmetic(Operator::Sub, 3));
	assert_eq!((subtracted.minimum(), subtracted.maximum()), (-1, 9));

	let divided = modified(d(20), Modifier::Arithmetic(Operator::Div, 3));
	assert_eq!((divided.minimum(), divided.maximum()), (0, 6));
	assert_eq!(divided.evaluate(&mut IterRoller::new([20])).value, 6);
}

#[test]
fn division_by_zero_is_illegal() {
	let result = Rollable::modified(d(6), Modifier::Arithmetic(Operator::Div, 0));
	assert_eq!(
		result,
		Err(Error::IllegalValue {
			what: "divisor",
			value: 0
		})
	);
}

#[test]
fn keep_highest() {
	let rollable = modified(pool_of(4, 6), Modifier::DropKeep(Selection::KeepHigh(1)));
	assert_eq!((rollable.minimum(), rollable.maximum()), (1, 6));

	let roll = rollable.evaluate(&mut IterRoller::new([2, 5, 1, 6]));
	assert_eq!(roll, Roll::new(6, "2 (d) + 5 (d) + 1 (d) + 6"));
}

#[test]
fn drop_lowest() {
	let rollable = modified(pool_of(4, 6), Modifier::DropKeep(Selection::DropLow(1)));
	assert_eq!((rollable.minimum(), rollable.maximum()), (3, 18));

	let roll = rollable.evaluate(&mut IterRoller::new([2, 5, 1, 6]));
	assert_eq!(roll, Roll::new(13, "2 + 5 + 1 (d) + 6"));
}

#[test]
fn keep_lowest_and_drop_highest() {
	let vals = [4, 4, 3, 6];

	let rollable = modified(pool_of(4, 6), Modifier::DropKeep(Selection::KeepLow(2)));
	let roll = rollable.evaluate(&mut IterRoller::new(vals));
	assert_eq!(roll, Roll::new(7, "4 + 4 (d) + 3 + 6 (d)"));

	let rollable = modified(pool_of(4, 6), Modifier::DropKeep(Selection::DropHigh(2)));
	let roll = rollable.evaluate(&mut IterRoller::new(vals));
	assert_eq!(roll, Roll::new(7, "4 (d) + 4 + 3 + 6 (d)"));
}

#[test]
fn drop_keep_bounds_over_mixed_dice() {
	let pool = Rollable::Pool(Pool::new([d(4), d(20)]));
	let rollable = modified(pool, Modifier::DropKeep(Selection::KeepHigh(1)));
	assert_eq!((rollable.minimum(), rollable.maximum()), (1, 20));

	let pool = Rollable::Pool(Pool::new([d(4), d(20), Rollable::Die(Die::Fudge)]));
	let rollable = modified(pool, Modifier::DropKeep(Selection::DropHigh(1)));
	assert_eq!((rollable.minimum(), rollable.maximum()), (0, 5));
}

#[test]
fn drop_keep_count_is_limited_by_components() {
	let result = Rollable::modified(pool_of(4, 6), Modifier::DropKeep(Selection::KeepHigh(5)));
	assert_eq!(result, Err(Error::TooManyObjects { count: 5, limit: 4 }));

	let result = Rollable::modified(d(6), Modifier::DropKeep(Selection::DropLow(2)));
	assert_eq!(result, Err(Error::TooManyObjects { count: 2, limit: 1 }));

	assert!(Rollable::modified(pool_of(4, 6), Modifier::DropKeep(Selection::DropLow(4))).is_ok());
}

#[test]
fn drop_keep_over_drop_keep() {
	let inner = modified(pool_of(4, 6), Modifier::DropKeep(Selection::KeepHigh(2)));
	let result = Rollable::modified(inner.clone(), Modifier::DropKeep(Selection::KeepHigh(3)));
	assert_eq!(result, Err(Error::TooManyObjects { count: 3, limit: 2 }));

	let rollable = modified(inner, Modifier::DropKeep(Selection::KeepHigh(1)));
	assert_eq!(rollable.notation(), "4D6KH2KH1");
	assert_eq!((rollable.minimum(), rollable.maximum()), (1, 6));

	let roll = rollable.evaluate(&mut IterRoller::new([2, 5, 1, 6]));
	assert_eq!(roll, Roll::new(6, "5 (d) + 6"));
}

#[test]
fn drop_keep_over_exploding_pool() {
	let exploding = modified(pool_of(3, 6), explode(Condition::Eq(6), 100));
	let rollable = modified(exploding, Modifier::DropKeep(Selection::KeepHigh(1)));
	assert_eq!(rollable.notation(), "3D6!6KH1");
	assert_eq!((rollable.minimum(), rollable.maximum()), (1, 606));

	let roll = rollable.evaluate(&mut IterRoller::new([6, 3, 2, 5]));
	assert_eq!(roll, Roll::new(9, "(6 + 3) + 2 (d) + 5 (d)"));
}

#[test]
fn explode_chains() {
	let rollable = modified(d(6), explode(Condition::Eq(6), 100));
	assert_eq!(rollable.notation(), "D6!6");
	assert_eq!((rollable.minimum(), rollable.maximum()), (1, 606));

	let roll = rollable.evaluate(&mut IterRoller::new([6, 6, 2]));
	assert_eq!(roll, Roll::new(14, "6 + 6 + 2"));

	let roll = rollable.evaluate(&mut IterRoller::new([3]));
	assert_eq!(roll, Roll::new(3, "3"));
}

#[test]
fn explode_pool_explodes_each_child() {
	let rollable = modified(pool_of(2, 6), explode(Condition::Gt(4), 100));
	assert_eq!(rollable.notation(), "2D6!>4");

	let roll = rollable.evaluate(&mut IterRoller::new([5, 1, 3]));
	assert_eq!(roll, Roll::new(9, "(5 + 1) + 3"));
}

#[test]
fn explode_stops_at_the_limit() {
	let rollable = modified(d(4), explode(Condition::Gte(4), 100));
	assert_eq!(rollable.maximum(), 404);
	assert_eq!(rollable.evaluate(&mut MaxRoller).value, 404);

	let rollable = modified(d(6), explode(Condition::Gte(1), 5));
	assert_eq!((rollable.minimum(), rollable.maximum()), (6, 36));
	let roll = rollable.evaluate(&mut FastRandRoller::with_seed(8));
	assert!((6..=36).contains(&roll.value));
	assert_eq!(roll.trace.matches('+').count(), 5);

	let never = modified(d(6), explode(Condition::Eq(6), 0));
	assert_eq!(never.evaluate(&mut MaxRoller), Roll::new(6, "6"));
}

#[test]
fn explode_bounds() {
	let impossible = modified(d(6), explode(Condition::Gt(6), 100));
	assert_eq!((impossible.minimum(), impossible.maximum()), (1, 6));

	let low = modified(d(6), explode(Condition::Lte(2), 10));
	assert_eq!((low.minimum(), low.maximum()), (3, 26));
	assert_eq!(low.evaluate(&mut IterRoller::new([3])), Roll::new(3, "3"));
	assert_eq!(low.evaluate(&mut IterRoller::new([2; 11])).value, 22);

	let negative = Rollable::Die(Die::custom([-3, -2, 1]).unwrap());
	let negative = modified(negative, explode(Condition::Lt(0), 2));
	assert_eq!((negative.minimum(), negative.maximum()), (-9, 1));
	assert_eq!(negative.evaluate(&mut IterRoller::new([0, 0, 0])), Roll::new(-9, "-3 + -3 + -3"));
}

#[test]
fn explode_bounds_when_the_lowest_face_explodes() {
	let below_three = modified(d(6), explode(Condition::Lt(3), 100));
	assert_eq!((below_three.minimum(), below_three.maximum()), (3, 206));

	let gapped = Rollable::Die(Die::custom([1, 5]).unwrap());
	let gapped = modified(gapped, explode(Condition::Eq(1), 100));
	assert_eq!((gapped.minimum(), gapped.maximum()), (5, 105));
	assert_eq!(gapped.evaluate(&mut IterRoller::new([0, 0, 1])), Roll::new(7, "1 + 1 + 5"));

	let zero = Rollable::Die(Die::custom([0, 5]).unwrap());
	let zero = modified(zero, explode(Condition::Eq(0), 3));
	assert_eq!((zero.minimum(), zero.maximum()), (0, 5));
	assert_eq!(zero.evaluate(&mut IterRoller::new([0; 4])).value, 0);

	for rollable in [below_three, gapped] {
		for seed in 0..1000 {
			let value = rollable.evaluate(&mut FastRandRoller::with_seed(seed)).value;
			assert!(rollable.minimum() <= value && value <= rollable.maximum());
		}
	}
}

#[test]
fn modifier_notation_wraps_sums() {
	let pool = Rollable::Pool(Pool::new([pool_of(2, 6), d(4)]));
	let rollable = modified(pool, Modifier::Arithmetic(Operator::Mul, 2));
	assert_eq!(rollable.notation(), "(2D6+D4)*2");

	let added = modified(pool_of(2, 6), Modifier::Arithmetic(Operator::Add, 3));
	let rollable = modified(added, Modifier::Arithmetic(Operator::Mul, 2));
	assert_eq!(rollable.notation(), "(2D6+3)*2");
}

#[test]
fn modified_accessors() {
	let rollable = modified(pool_of(4, 6), Modifier::DropKeep(Selection::DropLow(1)));
	let Rollable::Modified(modified) = &rollable else {
		panic!("expected a modified rollable");
	};
	assert_eq!(modified.inner(), &pool_of(4, 6));
	assert_eq!(modified.modifier(), Modifier::DropKeep(Selection::DropLow(1)));
}

#[test]
fn kinds() {
	assert_eq!(d(6).kind(), "SidedDie");
	assert_eq!(pool_of(2, 6).kind(), "Pool");
	assert_eq!(modified(d(6), Modifier::Arithmetic(Operator::Add, 1)).kind(), "Arithmetic");
	assert_eq!(modified(pool_of(2, 6), Modifier::DropKeep(Selection::KeepHigh(1))).kind(), "DropKeep");
	assert_eq!(modified(d(6), explode(Condition::Eq(6), 1)).kind(), "Explode");
}

#[test]
fn extreme_rollers_reach_the_bounds() {
	let rollables = [
		pool_of(3, 6),
		modified(pool_of(4, 6), Modifier::DropKeep(Selection::KeepHigh(3))),
		modified(pool_of(2, 8), Modifier::Arithmetic(Operator::Sub, 5)),
		Rollable::Pool(Pool::new([Rollable::Die(Die::Percentile), Rollable::Die(Die::Fudge)])),
	];

	for rollable in rollables {
		assert_eq!(rollable.evaluate(&mut MinRoller).value, rollable.minimum());
		assert_eq!(rollable.evaluate(&mut MaxRoller).value, rollable.maximum());
	}
}

#[test]
fn evaluations_are_independent() {
	let rollable = modified(pool_of(2, 6), Modifier::Arithmetic(Operator::Mul, 2));
	let snapshot = rollable.clone();

	let first = rollable.evaluate(&mut IterRoller::new([1, 2]));
	let second = rollable.evaluate(&mut IterRoller::new([5, 6]));
	assert_eq!(first, Roll::new(6, "(1 + 2) * 2"));
	assert_eq!(second, Roll::new(22, "(5 + 6) * 2"));
	assert_eq!(rollable, snapshot);
}

#[test]
fn random_evaluations_stay_in_bounds() {
	let rollable = Rollable::Pool(Pool::new([
		modified(pool_of(4, 6), Modifier::DropKeep(Selection::DropLow(1))),
		modified(pool_of(2, 4), explode(Condition::Gte(4), 100)),
		modified(Rollable::Die(Die::Fudge), Modifier::Arithmetic(Operator::Mul, 3)),
	]));

	for seed in 0..1000 {
		let roll = rollable.evaluate(&mut FastRandRoller::with_seed(seed));
		assert!(rollable.minimum() <= roll.value && roll.value <= rollable.maximum());
	}
}

fn d(sides: i64) -> Rollable {
	Rollable::Die(Die::sided(sides).unwrap())
}

fn pool_of(quantity: usize, sides: i64) -> Rollable {
	Rollable::Pool(Pool::repeat(d(sides), quantity))
}

fn modified(inner: Rollable, modifier: Modifier) -> Rollable {
	Rollable::modified(inner, modifier).unwrap()
}

fn explode(cond: Condition, limit: u32) -> Modifier {
	Modifier::Explode { cond, limit }
}
