// SPDX-License-Identifier: MIT

//! Rule trees: building, combining and evaluating
//!
//! Rules are plain strings of whitespace-separated tokens such as:
//! - `age > 30`
//! - `department = 'Sales'`
//! - `age > 30 AND department = 'Sales'`
//!
//! `build` turns one rule into a tree, `combine` joins several rules under
//! `AND`, and `evaluate` checks a tree against a record of attribute values.

mod ast;
mod builder;
mod evaluator;

pub use ast::{from_json_slice, Connective, Node, NodeKind, NodeRecord};
pub use builder::{build, combine};
pub use evaluator::{evaluate, Literal, Record};
