use std::{
	env,
	io::{self, Write},
	ops::Range,
	process::ExitCode,
};

use ariadne::{Color, Label, Report, ReportKind, Source};
use dicecup::{dice::roller::FastRand as FastRandRoller, parse, trace::Log as LogTracer, Error, Factory};
use tracing::Level;

fn main() -> ExitCode {
	let mut args = env::args().skip(1).collect::<Vec<String>>();

	// Verbose mode logs a trace record for every step of the evaluation
	let verbose = args.iter().any(|arg| arg == "-v" || arg == "--verbose");
	args.retain(|arg| arg != "-v" && arg != "--verbose");
	tracing_subscriber::fmt()
		.with_max_level(if verbose { Level::DEBUG } else { Level::WARN })
		.with_writer(io::stderr)
		.init();

	let input = if args.is_empty() {
		match read_stdin() {
			Ok(line) => line,
			Err(err) => {
				eprintln!("Unable to read input: {err}");
				return ExitCode::FAILURE;
			}
		}
	} else {
		// Obtain the notation by combining all args passed to the executable, so that it can be left unquoted
		// even with spaces
		args.join(" ")
	};

	match Factory::default().build(&input) {
		Ok(rollable) => {
			let roll = rollable.evaluate_traced(&mut FastRandRoller::default(), &mut LogTracer);
			println!("Notation: {rollable}");
			println!("Range: {} to {}", rollable.minimum(), rollable.maximum());
			println!("Trace: {}", roll.trace);
			println!("Total: {}", roll.value);
			ExitCode::SUCCESS
		}
		Err(err) => {
			report(&input, &err);
			ExitCode::FAILURE
		}
	}
}

/// Reads the first line from stdin, prompting for it if nothing has been piped in.
fn read_stdin() -> io::Result<String> {
	let mut lines = io::stdin().lines();

	// If there isn't already input available in stdin, display a prompt for it
	if lines.size_hint().1.is_none() {
		print!("Enter dice notation: ");
		io::stdout().flush()?;
	}

	lines.next().unwrap_or_else(|| Ok(String::new()))
}

/// Prints an error report for notation that couldn't be built.
fn report(input: &str, err: &Error) {
	let normalized = parse::normalize(input);

	let span = error_span(&normalized, err);

	let result = Report::build(ReportKind::Error, span.clone())
		.with_message(err.to_string())
		.with_label(
			Label::new(span)
				.with_message("in this part of the notation")
				.with_color(Color::Red),
		)
		.finish()
		.eprint(Source::from(&normalized));

	if result.is_err() {
		eprintln!("Error: {err}");
	}
}

/// Finds the characters of the normalized notation that an error applies to.
///
/// Unknown expressions carry the unmatched tail of the normalized notation, so only that tail is highlighted. Ariadne
/// spans count characters, not bytes.
fn error_span(normalized: &str, err: &Error) -> Range<usize> {
	let length = normalized.chars().count();
	match err {
		Error::UnknownExpression(unmatched) => length.saturating_sub(unmatched.chars().count())..length,
		_ => 0..length,
	}
}
