use chumsky::Parser;

use crate::{
	dice::Error,
	parse::{self, DieRecord, Expression, ModifierKind, Source},
};

#[test]
fn simple_pool() {
	let expression = parse::parse("3D6").unwrap();
	assert_eq!(expression.segments.len(), 1);

	let segment = &expression.segments[0];
	assert_eq!(
		segment.source,
		Source::Pool {
			quantity: Some(3),
			die: DieRecord::Sides(6)
		}
	);
	assert!(segment.modifiers.is_empty());
}

#[test]
fn quantity_is_optional() {
	let expression = parse::parse("D20").unwrap();
	assert_eq!(
		expression.segments[0].source,
		Source::Pool {
			quantity: None,
			die: DieRecord::Sides(20)
		}
	);
}

#[test]
fn die_types() {
	let die_of = |notation: &str| match parse::parse(notation).unwrap().segments.remove(0).source {
		Source::Pool { die, .. } => die,
		Source::Group(..) => panic!("expected a simple pool"),
	};

	assert_eq!(die_of("D8"), DieRecord::Sides(8));
	assert_eq!(die_of("4DF"), DieRecord::Fudge);
	assert_eq!(die_of("D%"), DieRecord::Percentile);
	assert_eq!(die_of("D[1,1,2,4]"), DieRecord::Custom(vec![1, 1, 2, 4]));
	assert_eq!(die_of("D[-1,0,10]"), DieRecord::Custom(vec![-1, 0, 10]));
}

#[test]
fn notation_is_normalized() {
	assert_eq!(parse::normalize(" 2d6 !>4\tkh1 "), "2D6!>4KH1");
	assert_eq!(parse::parse("2d6 + 3").unwrap(), parse::parse("2D6+3").unwrap());
	assert_eq!(parse::parse("4 d f").unwrap(), parse::parse("4DF").unwrap());
}

#[test]
fn empty_notation() {
	assert_eq!(parse::parse("").unwrap(), Expression::default());
	assert_eq!(parse::parse("  \n ").unwrap(), Expression::default());
}

#[test]
fn modifiers_in_order() {
	let expression = parse::parse("4D6!>=5KH3*2").unwrap();
	let modifiers = &expression.segments[0].modifiers;
	assert_eq!(modifiers.len(), 3);

	assert_eq!(modifiers[0].kind, ModifierKind::Explode);
	assert_eq!(modifiers[0].operator, ">=");
	assert_eq!(modifiers[0].value, 5);

	assert_eq!(modifiers[1].kind, ModifierKind::DropKeep);
	assert_eq!(modifiers[1].operator, "KH");
	assert_eq!(modifiers[1].value, 3);

	assert_eq!(modifiers[2].kind, ModifierKind::Arithmetic);
	assert_eq!(modifiers[2].operator, "*");
	assert_eq!(modifiers[2].value, 2);
}

#[test]
fn explode_comparators() {
	for (notation, operator, value) in [
		("D6!6", "=", 6),
		("D6!=6", "=", 6),
		("D6!>4", ">", 4),
		("D6!>=4", ">=", 4),
		("D6!<2", "<", 2),
		("D6!<=2", "<=", 2),
		("DF!-1", "=", -1),
	] {
		let expression = parse::parse(notation).unwrap();
		let modifier = &expression.segments[0].modifiers[0];
		assert_eq!(modifier.kind, ModifierKind::Explode, "{notation}");
		assert_eq!(modifier.operator, operator, "{notation}");
		assert_eq!(modifier.value, value, "{notation}");
	}
}

#[test]
fn drop_keep_selections() {
	for selection in ["KH", "KL", "DH", "DL"] {
		let expression = parse::parse(&format!("4D6{selection}2")).unwrap();
		let modifier = &expression.segments[0].modifiers[0];
		assert_eq!(modifier.kind, ModifierKind::DropKeep);
		assert_eq!(modifier.operator, selection);
		assert_eq!(modifier.value, 2);
	}
}

#[test]
fn plus_joins_pools_or_adds() {
	let expression = parse::parse("3D6+2D4!>4KH2+1").unwrap();
	assert_eq!(expression.segments.len(), 2);
	assert!(expression.segments[0].modifiers.is_empty());

	let modifiers = &expression.segments[1].modifiers;
	assert_eq!(modifiers.len(), 3);
	assert_eq!(modifiers[2].kind, ModifierKind::Arithmetic);
	assert_eq!(modifiers[2].operator, "+");
	assert_eq!(modifiers[2].value, 1);
}

#[test]
fn groups() {
	let expression = parse::parse("(2D6+D4)*2+D8").unwrap();
	assert_eq!(expression.segments.len(), 2);
	assert_eq!(expression.depth(), 1);

	let Source::Group(inner) = &expression.segments[0].source else {
		panic!("expected a group");
	};
	assert_eq!(inner.segments.len(), 2);
	assert_eq!(expression.segments[0].modifiers.len(), 1);
}

#[test]
fn nested_groups() {
	let expression = parse::parse("((D6)KH1+(D4))!4").unwrap();
	assert_eq!(expression.depth(), 2);
	assert_eq!(parse::nesting_depth("((D6)KH1+(D4))!4"), 2);
	assert_eq!(parse::nesting_depth("(((D6)))"), 3);
}

#[test]
fn huge_integers_saturate() {
	let expression = parse::parse("99999999999999999999999D6").unwrap();
	assert_eq!(
		expression.segments[0].source,
		Source::Pool {
			quantity: Some(i64::MAX),
			die: DieRecord::Sides(6)
		}
	);
}

#[test]
fn unknown_expressions() {
	assert_eq!(parse::parse("D3#"), Err(Error::UnknownExpression("#".to_owned())));
	assert_eq!(parse::parse("2D6 foo"), Err(Error::UnknownExpression("FOO".to_owned())));
	assert_eq!(parse::parse("D6^2"), Err(Error::UnknownExpression("^2".to_owned())));
	assert!(matches!(parse::parse("3+D6"), Err(Error::UnknownExpression(..))));
	assert!(matches!(parse::parse("(2D6"), Err(Error::UnknownExpression(..))));
	assert!(matches!(parse::parse("D[]"), Err(Error::UnknownExpression(..))));
	assert!(matches!(parse::parse("D6KH"), Err(Error::UnknownExpression(..))));
	assert!(matches!(parse::parse("D6!"), Err(Error::UnknownExpression(..))));
}

#[test]
fn parser_requires_normalized_input() {
	assert!(parse::parser().parse("2D6+3").into_result().is_ok());
	assert!(parse::parser().parse("2d6+3").into_result().is_err());
	assert!(parse::parser().parse("2D6 + 3").into_result().is_err());
}

#[test]
fn partial_parsers() {
	assert_eq!(parse::integer().parse("42").into_output(), Some(42));
	assert_eq!(parse::signed_integer().parse("-7").into_output(), Some(-7));
	assert_eq!(parse::die_type().parse("%").into_output(), Some(DieRecord::Percentile));
	assert!(parse::modifier().parse("DL1").into_result().is_ok());
	assert!(parse::simple_pool().parse("DL1").into_result().is_err());
}
