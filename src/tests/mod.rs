mod expr;
#[cfg(feature = "parse")]
mod parse;
