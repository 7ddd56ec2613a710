#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod edge;
pub mod graph;
mod term;
pub mod vocab;

pub use crate::edge::{Edge, Provenance};
pub use crate::graph::Graph;
pub use crate::term::{GraphName, Term};
pub use oxrdf::{
    BlankNode, BlankNodeIdParseError, IriParseError, LanguageTagParseError, Literal, NamedNode,
    NamedNodeRef, Variable, VariableNameParseError,
};
