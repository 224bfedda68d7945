//! Proximal operators used by the ADMM solvers.
//!
//! All operators are pure: they take borrowed matrices and return new ones.

pub mod elementwise;
pub mod group;
pub mod spectral;
pub mod tv;

pub use elementwise::{prox_od_l1, prox_penalty};
pub use group::{block_shrink, prox_group};
pub use spectral::{prox_logdet, prox_logdet_stack, prox_nuclear_psd};
pub use tv::tv_denoise;
