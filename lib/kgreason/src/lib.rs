#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod closure;
mod config;
mod engine;
mod error;
mod hooks;
pub mod owl;
pub mod rdfs;
mod record;

pub use crate::config::EntailmentConfig;
pub use crate::engine::{EntailmentReport, EntailmentStatus, RuleEngine, Violation};
pub use crate::error::EntailmentError;
pub use crate::hooks::{EntailmentHooks, HookResult};
pub use crate::record::RuleRecord;
pub use kgeval::is_transitive;
