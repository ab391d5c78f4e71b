//! RDF/XML output

use super::{format_all, SerializeResult};
use crate::rdf::Triple;
use rio_xml::RdfXmlFormatter;
use std::io::Write;

/// Write `triples` as an indented RDF/XML document
pub(super) fn format_rdfxml<W: Write>(triples: &[Triple], write: W) -> SerializeResult<W> {
    let mut formatter = RdfXmlFormatter::with_indentation(write, 2)?;
    format_all(&mut formatter, triples)?;
    Ok(formatter.finish()?)
}
