//! RDF document parsing and serialization
//!
//! Supports:
//! - Turtle (`.ttl`), read and write
//! - N-Triples (`.nt`), read and write
//! - RDF/XML (`.rdf`, `.owl`, `.xml`), read and write

mod rdfxml;
mod turtle;

use super::{Literal, RdfError, RdfObject, RdfPredicate, RdfSubject, Triple};
use super::{BlankNode, NamedNode};
use super::types::vocab;
use rio_api::formatter::TriplesFormatter;
use rio_api::model;
use rio_api::parser::TriplesParser;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

/// RDF serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    Turtle,
    NTriples,
    RdfXml,
}

impl RdfFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ttl" | "turtle" => Some(RdfFormat::Turtle),
            "nt" | "ntriples" => Some(RdfFormat::NTriples),
            "rdf" | "owl" | "xml" => Some(RdfFormat::RdfXml),
            _ => None,
        }
    }

    /// Conventional file extension
    pub fn extension(&self) -> &'static str {
        match self {
            RdfFormat::Turtle => "ttl",
            RdfFormat::NTriples => "nt",
            RdfFormat::RdfXml => "rdf",
        }
    }
}

impl fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RdfFormat::Turtle => write!(f, "turtle"),
            RdfFormat::NTriples => write!(f, "ntriples"),
            RdfFormat::RdfXml => write!(f, "rdfxml"),
        }
    }
}

impl FromStr for RdfFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "turtle" | "ttl" => Ok(RdfFormat::Turtle),
            "ntriples" | "n-triples" | "nt" => Ok(RdfFormat::NTriples),
            "rdfxml" | "rdf/xml" | "rdf" | "xml" => Ok(RdfFormat::RdfXml),
            other => Err(ParseError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Parse errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Syntax error reported by the underlying parser
    #[error("Parse error: {0}")]
    Parse(String),

    /// A term the parser accepted but is not a valid RDF term
    #[error("Invalid term: {0}")]
    InvalidTerm(#[from] RdfError),

    /// Invalid base IRI
    #[error("Invalid base IRI: {0}")]
    InvalidBase(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl From<rio_turtle::TurtleError> for ParseError {
    fn from(e: rio_turtle::TurtleError) -> Self {
        ParseError::Parse(e.to_string())
    }
}

impl From<rio_xml::RdfXmlError> for ParseError {
    fn from(e: rio_xml::RdfXmlError) -> Self {
        ParseError::Parse(e.to_string())
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Serialization errors
#[derive(Error, Debug)]
pub enum SerializeError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),
}

pub type SerializeResult<T> = Result<T, SerializeError>;

/// RDF parser
pub struct RdfParser;

impl RdfParser {
    /// Parse RDF data from a string
    pub fn parse(input: &str, format: RdfFormat) -> ParseResult<Vec<Triple>> {
        Self::parse_with_base(input, format, None)
    }

    /// Parse RDF data from a string, resolving relative IRIs against `base`
    pub fn parse_with_base(input: &str, format: RdfFormat, base: Option<&str>) -> ParseResult<Vec<Triple>> {
        Self::parse_reader(Cursor::new(input), format, base)
    }

    /// Parse RDF data from a file; the format is taken from the extension
    /// when not given
    pub fn parse_file(path: &Path, format: Option<RdfFormat>) -> ParseResult<Vec<Triple>> {
        let format = match format.or_else(|| RdfFormat::from_path(path)) {
            Some(format) => format,
            None => return Err(ParseError::UnsupportedFormat(path.display().to_string())),
        };
        let reader = BufReader::new(File::open(path)?);
        let triples = Self::parse_reader(reader, format, None)?;
        debug!("Parsed {} triples from {}", triples.len(), path.display());
        Ok(triples)
    }

    /// Parse RDF data from any buffered reader
    pub fn parse_reader<R: BufRead>(reader: R, format: RdfFormat, base: Option<&str>) -> ParseResult<Vec<Triple>> {
        let base = match base {
            Some(iri) => Some(
                oxiri::Iri::parse(iri.to_string()).map_err(|e| ParseError::InvalidBase(e.to_string()))?,
            ),
            None => None,
        };
        match format {
            RdfFormat::Turtle => collect(&mut rio_turtle::TurtleParser::new(reader, base)),
            RdfFormat::NTriples => collect(&mut rio_turtle::NTriplesParser::new(reader)),
            RdfFormat::RdfXml => collect(&mut rio_xml::RdfXmlParser::new(reader, base)),
        }
    }
}

/// RDF serializer
pub struct RdfSerializer;

impl RdfSerializer {
    /// Serialize triples to a string
    pub fn serialize(triples: &[Triple], format: RdfFormat) -> SerializeResult<String> {
        let bytes = match format {
            RdfFormat::Turtle => turtle::format_turtle(triples, Vec::new())?,
            RdfFormat::NTriples => turtle::format_ntriples(triples, Vec::new())?,
            RdfFormat::RdfXml => rdfxml::format_rdfxml(triples, Vec::new())?,
        };
        String::from_utf8(bytes).map_err(|e| SerializeError::Serialize(e.to_string()))
    }

    /// Serialize triples to a file
    pub fn serialize_file(triples: &[Triple], path: &Path, format: RdfFormat) -> SerializeResult<()> {
        let output = Self::serialize(triples, format)?;
        std::fs::write(path, output)?;
        debug!("Wrote {} triples to {}", triples.len(), path.display());
        Ok(())
    }
}

/// Drain a rio parser into owned triples.
///
/// Statements with a quoted-triple subject have no place in a property graph
/// and are dropped with a warning.
fn collect<P>(parser: &mut P) -> ParseResult<Vec<Triple>>
where
    P: TriplesParser,
    ParseError: From<P::Error>,
{
    let mut triples = Vec::new();
    let mut dropped = 0usize;
    parser.parse_all(&mut |t: model::Triple<'_>| -> ParseResult<()> {
        match convert_subject(t.subject)? {
            Some(subject) => {
                let predicate = RdfPredicate::new(t.predicate.iri)?;
                let object = convert_object(t.object)?;
                triples.push(Triple::new(subject, predicate, object));
            }
            None => dropped += 1,
        }
        Ok(())
    })?;
    if dropped > 0 {
        warn!("Dropped {} statement(s) with a quoted-triple subject", dropped);
    }
    Ok(triples)
}

fn convert_subject(s: model::Subject<'_>) -> ParseResult<Option<RdfSubject>> {
    match s {
        model::Subject::NamedNode(n) => Ok(Some(NamedNode::new(n.iri)?.into())),
        model::Subject::BlankNode(b) => Ok(Some(BlankNode::from_id(b.id)?.into())),
        #[allow(unreachable_patterns)]
        _ => Ok(None),
    }
}

fn convert_object(o: model::Term<'_>) -> ParseResult<RdfObject> {
    match o {
        model::Term::NamedNode(n) => Ok(NamedNode::new(n.iri)?.into()),
        model::Term::BlankNode(b) => Ok(BlankNode::from_id(b.id)?.into()),
        model::Term::Literal(model::Literal::Simple { value }) => {
            Ok(Literal::new_simple_literal(value).into())
        }
        model::Term::Literal(model::Literal::LanguageTaggedString { value, language }) => {
            Ok(Literal::new_language_tagged_literal(value, language)?.into())
        }
        model::Term::Literal(model::Literal::Typed { value, datatype }) => {
            Ok(Literal::new_typed_literal(value, NamedNode::new(datatype.iri)?).into())
        }
        #[allow(unreachable_patterns)]
        other => Ok(RdfObject::QuotedTriple(other.to_string())),
    }
}

/// Borrowed rio view of a triple
fn to_rio(triple: &Triple) -> SerializeResult<model::Triple<'_>> {
    let subject = match &triple.subject {
        RdfSubject::NamedNode(n) => model::Subject::NamedNode(model::NamedNode { iri: n.as_str() }),
        RdfSubject::BlankNode(b) => model::Subject::BlankNode(model::BlankNode { id: b.as_str() }),
    };
    let object = match &triple.object {
        RdfObject::NamedNode(n) => model::Term::NamedNode(model::NamedNode { iri: n.as_str() }),
        RdfObject::BlankNode(b) => model::Term::BlankNode(model::BlankNode { id: b.as_str() }),
        RdfObject::Literal(l) => model::Term::Literal(match l.language() {
            Some(language) => model::Literal::LanguageTaggedString {
                value: l.value(),
                language,
            },
            None if l.datatype_iri() == vocab::XSD_STRING => model::Literal::Simple { value: l.value() },
            None => model::Literal::Typed {
                value: l.value(),
                datatype: model::NamedNode { iri: l.datatype_iri() },
            },
        }),
        RdfObject::QuotedTriple(t) => {
            return Err(SerializeError::Serialize(format!(
                "quoted triple object cannot be written: {}",
                t
            )))
        }
    };
    Ok(model::Triple {
        subject,
        predicate: model::NamedNode {
            iri: triple.predicate.as_str(),
        },
        object,
    })
}

fn format_all<F>(formatter: &mut F, triples: &[Triple]) -> SerializeResult<()>
where
    F: TriplesFormatter,
    SerializeError: From<F::Error>,
{
    for triple in triples {
        formatter.format(&to_rio(triple)?)?;
    }
    Ok(())
}
