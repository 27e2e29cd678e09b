//! mavl-stress: type-directed random program generator for MAVL.
//!
//! Every generated module is well-typed by construction: expressions are
//! produced for a required type, identifiers are only referenced while in
//! scope, and every size that must be a compile-time constant is written as
//! an arithmetic expression that evaluates to it.
//!
//! ```no_run
//! use rand::SeedableRng;
//!
//! let profile = mavl_stress::profile::get_profile("small").unwrap();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let program = mavl_stress::generate_module(&mut rng, &profile);
//! println!("{}", mavl_stress::pretty::pretty_print(&program));
//! ```

pub mod constant;
pub mod emit;
pub mod error;
pub mod expr;
pub mod manifest;
pub mod names;
pub mod pretty;
pub mod profile;
pub mod records;
pub mod scope;
pub mod stmt;
pub mod types;

use rand::RngCore;

pub use emit::Emit;
pub use error::{Result, StressError};
pub use profile::Profile;

/// Generate one complete module as flat, space-separated source text.
pub fn generate_module(rng: &mut dyn RngCore, profile: &Profile) -> String {
    Emit::new(rng, profile).module()
}
