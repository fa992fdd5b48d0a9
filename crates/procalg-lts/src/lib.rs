#![doc = include_str!("../README.md")]

//! Labelled transition systems and their reduction modulo bisimulation.
//!
//! [`Lts`] holds numbered states and named actions; [`aut`] reads and
//! writes the Aldebaran format. [`scc`] contracts tau cycles, [`bisim`]
//! computes the stable partition, and [`naive`] is the slow signature
//! refinement used to check it.

pub mod aut;
pub mod bisim;
pub mod error;
pub mod lts;
pub mod naive;
#[cfg(any(test, feature = "proptest"))]
pub mod proptest_generators;
pub mod scc;

pub use aut::{load_aut, read_aut, save_aut, to_aut_string, write_aut};
pub use bisim::{
    bisimulation_compare, bisimulation_partition, bisimulation_reduce, BisimPartitioner, Equivalence,
    RefinementOptions,
};
pub use error::LtsError;
pub use lts::{LabelId, Lts, LtsSummary, StateId, Transition, TAU, TAU_NAME};
pub use scc::{contract_tau_sccs, tau_scc_partition};
