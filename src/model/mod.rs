//! Core data structures for crystal-net identification.
//!
//! - [`types`] – Periodic table elements with the radii and metal flags
//!   bond guessing consumes.
//! - [`atom`] – Crystallographic sites in fractional coordinates.
//! - [`cell`] – Unit cell, symmetry operations, minimum-image metric.
//! - [`graph`] – The periodic graph: finite quotient plus per-edge
//!   lattice offsets.
//!
//! The model deliberately separates raw crystal geometry ([`cell::Cell`]
//! plus [`atom::Atom`] lists) from the abstract net
//! ([`graph::PeriodicGraph`]): the [`crate::ingest`] pipeline turns one
//! into the other, and [`crate::topology`] only ever sees the net.

pub mod atom;
pub mod cell;
pub mod graph;
pub mod types;
