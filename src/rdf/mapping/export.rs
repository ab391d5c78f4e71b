//! Property graph → RDF triples

use super::{MappingConfig, MappingResult};
use crate::graph::{Edge, Node, PropertyValue};
use crate::rdf::types::vocab;
use crate::rdf::{BlankNode, Literal, NamedNode, RdfObject, RdfPredicate, RdfSubject, Triple};
use crate::store::GraphReader;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use rustc_hash::FxHashSet;
use tracing::debug;

/// Characters escaped in a generated IRI path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Property graph → RDF mapper
#[derive(Debug, Clone)]
pub struct GraphToRdfMapper {
    config: MappingConfig,
}

impl GraphToRdfMapper {
    /// Create a new mapper with base IRI
    pub fn new(base_iri: impl Into<String>) -> Self {
        Self {
            config: MappingConfig::new(base_iri),
        }
    }

    /// Create a mapper with custom configuration
    pub fn with_config(mut config: MappingConfig) -> Self {
        config.sanitize_names();
        Self { config }
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// Resource for a node.
    ///
    /// A node that came from RDF keeps its original IRI; other nodes get
    /// `<base><label>/<id>` with the label lowercased.
    pub fn node_subject(&self, node: &Node) -> MappingResult<RdfSubject> {
        if let Some(uri) = node.get_str(&self.config.uri_property) {
            if let Some(id) = uri.strip_prefix("_:") {
                if let Ok(blank) = BlankNode::from_id(id) {
                    return Ok(blank.into());
                }
            } else if let Ok(named) = NamedNode::new(uri) {
                return Ok(named.into());
            }
        }

        let local = node
            .get_property(&self.config.id_property)
            .or_else(|| node.get_property("name"))
            .map(PropertyValue::to_plain_string)
            .unwrap_or_else(|| node.id.as_u64().to_string());
        let path = node.label.as_str().to_lowercase();

        Ok(self.iri(&format!("{}/{}", path, local), &local)?.into())
    }

    /// Map a node to its type and property triples
    pub fn map_node(&self, node: &Node) -> MappingResult<Vec<Triple>> {
        let subject = self.node_subject(node)?;
        let mut triples = Vec::new();

        if node.label.as_str() != self.config.fallback_label {
            let class = self.iri(node.label.as_str(), node.label.as_str())?;
            triples.push(Triple::new(
                subject.clone(),
                RdfPredicate::new(vocab::RDF_TYPE)?,
                class.into(),
            ));
        }

        for (key, value) in &node.properties {
            if *key == self.config.id_property || *key == self.config.uri_property {
                continue;
            }
            let Some(literal) = literal_for(value)? else {
                debug!("Not exporting {} property {} of {}", value.type_name(), key, node.id);
                continue;
            };
            let predicate = self.iri(key, key)?;
            triples.push(Triple::new(subject.clone(), predicate.into(), literal.into()));
        }

        Ok(triples)
    }

    /// Map an edge to one triple between its endpoints
    pub fn map_edge(&self, edge: &Edge, source: &Node, target: &Node) -> MappingResult<Triple> {
        let stored = self
            .config
            .edge_uri_property
            .as_deref()
            .and_then(|key| edge.get_property(key))
            .and_then(PropertyValue::as_string)
            .and_then(|iri| NamedNode::new(iri).ok());
        let predicate = match stored {
            Some(named) => named,
            None => self.iri(edge.edge_type.as_str(), edge.edge_type.as_str())?,
        };

        Ok(Triple::new(
            self.node_subject(source)?,
            predicate.into(),
            RdfObject::from(self.node_subject(target)?),
        ))
    }

    /// Map a whole graph, label by label, without duplicate triples
    pub fn map_graph(&self, reader: &dyn GraphReader) -> MappingResult<Vec<Triple>> {
        let mut seen = FxHashSet::default();
        let mut triples = Vec::new();
        let mut keep = |triple: Triple| {
            if seen.insert(triple.clone()) {
                triples.push(triple);
            }
        };

        for label in reader.labels()? {
            for node in reader.nodes_by_label(&label)? {
                for triple in self.map_node(&node)? {
                    keep(triple);
                }
                for edge in reader.outgoing(node.id)? {
                    let Some(target) = reader.node(edge.target)? else {
                        continue;
                    };
                    keep(self.map_edge(&edge, &node, &target)?);
                }
            }
        }

        debug!("Exported {} triples", triples.len());
        Ok(triples)
    }

    /// `<base><path>`, escaping `local` when the plain form is not a valid IRI
    fn iri(&self, path: &str, local: &str) -> MappingResult<NamedNode> {
        let base = &self.config.base_iri;
        match NamedNode::new(&format!("{}{}", base, path)) {
            Ok(named) => Ok(named),
            Err(_) => {
                let prefix = path.strip_suffix(local).unwrap_or("");
                let escaped = utf8_percent_encode(local, SEGMENT).to_string();
                Ok(NamedNode::new(&format!("{}{}{}", base, prefix, escaped))?)
            }
        }
    }
}

/// Typed literal for a scalar property; arrays and nulls have none
fn literal_for(value: &PropertyValue) -> MappingResult<Option<Literal>> {
    let literal = match value {
        PropertyValue::String(s) => Literal::new_simple_literal(s.as_str()),
        PropertyValue::Integer(i) => Literal::new_typed_literal(i.to_string(), NamedNode::new(vocab::XSD_INT)?),
        PropertyValue::Float(f) => Literal::new_typed_literal(xsd_double(*f), NamedNode::new(vocab::XSD_DOUBLE)?),
        PropertyValue::Boolean(b) => Literal::new_typed_literal(b.to_string(), NamedNode::new(vocab::XSD_BOOLEAN)?),
        PropertyValue::Array(_) | PropertyValue::Null => return Ok(None),
    };
    Ok(Some(literal))
}

/// Lexical form of an `xsd:double`, which spells non-finite values INF, -INF and NaN
fn xsd_double(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "INF" } else { "-INF" }.to_string()
    } else {
        f.to_string()
    }
}
