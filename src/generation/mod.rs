//! Procedural content: ornament layouts and the starfield.
//!
//! Generators are pure functions of their parameters and an RNG. The caller
//! owns the RNG, so a fixed seed reproduces the same tree.

pub mod cache;
pub mod palette;
pub mod starfield;
pub mod tree_gen;
pub mod weights;

pub use cache::Memo;
pub use palette::{Palette, PaletteColor};
pub use starfield::{Star, Starfield, StarfieldParams};
pub use tree_gen::{OrnamentShape, PlacedInstance, ShapeBucket, TreeGenerator, TreeLayout, TreeParams};
pub use weights::WeightedTable;

use rand::distributions::Standard;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// RNG for scene content: seeded when a seed is given, entropy otherwise.
pub fn scene_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

/// Uniform sample in `[0, 1)`.
pub(crate) fn unit<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.sample(Standard)
}
