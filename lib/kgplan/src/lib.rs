#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod cost;
mod pjg;
mod plan;
mod planner;

pub use crate::cost::{JOIN_PATTERNS, JoinType, MAX_COST, Position};
pub use crate::pjg::{JoinEdge, PatternJoinGraph, PjgNode};
pub use crate::plan::{Plan, PlanNode};
pub use crate::planner::Planner;
