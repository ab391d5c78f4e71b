//! Turtle and N-Triples output

use super::{format_all, SerializeResult};
use crate::rdf::Triple;
use rio_turtle::{NTriplesFormatter, TurtleFormatter};
use std::io::Write;

/// Write `triples` as Turtle
pub(super) fn format_turtle<W: Write>(triples: &[Triple], write: W) -> SerializeResult<W> {
    let mut formatter = TurtleFormatter::new(write);
    format_all(&mut formatter, triples)?;
    Ok(formatter.finish()?)
}

/// Write `triples` as N-Triples, one statement per line
pub(super) fn format_ntriples<W: Write>(triples: &[Triple], write: W) -> SerializeResult<W> {
    let mut formatter = NTriplesFormatter::new(write);
    format_all(&mut formatter, triples)?;
    Ok(formatter.finish()?)
}
