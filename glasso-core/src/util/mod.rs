//! Utility functions.
//!
//! Numerical helpers for dense symmetric matrices.

pub mod numerics;

pub use numerics::SYMMETRY_TOL;
