#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod algebra;
mod query;
mod rule;
pub mod term;

pub use query::Query;
pub use rule::{Rule, RuleKind, RuleSet};
