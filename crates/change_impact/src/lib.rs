#![deny(non_shorthand_field_patterns)]
#![deny(unreachable_patterns)]

//! Change-impact analysis of JavaScript commits.
//!
//! Both versions of a changed file are run through an abstract interpreter
//! whose values carry, next to an approximate type, whether they differ
//! between the versions and which program points they originate from. The
//! facts gathered along the way are turned into labeled source ranges that
//! show what a commit actually affects.

pub mod analysis;
pub mod annotate;
pub mod batch;
pub mod checker;
pub mod config;
pub mod control_flow;
pub mod data_flow_analysis;
pub mod environment;
pub mod error;
pub mod facts;
mod interpreter;
pub mod lattice;
pub mod node_table;
pub mod object;
pub mod state;
pub mod store;
pub mod trace;

pub use self::{
    analysis::analyze_script,
    annotate::{annotate, Annotation},
    batch::{analyze_commits, analyze_file, BatchReport, Commit, FileChange, FileReport},
    config::AnalysisOptions,
    error::AnalysisError,
    facts::FactBase,
};
