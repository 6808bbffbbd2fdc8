//! Effect domains shipped with the engine.

mod named;
mod purity;

pub use named::{NamedEffectDomain, NamedEffects, ANY, THROW};
pub use purity::{Purity, PurityDomain};
