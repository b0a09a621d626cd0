//! Sparse registration of sampled frames against a reference.
//!
//! - `sampler`: which frames get registered
//! - `engine`: the `Registrar` seam and a scripted implementation
//! - `moments`: built-in moment-based rigid registrar
//! - `invoker`: runs a registrar over the sampled frames

mod engine;
mod invoker;
mod moments;
mod sampler;

pub use engine::{Registrar, Registration, RegistrationError, ScriptedRegistrar};
pub use invoker::{register_sampled, RegisteredSamples};
pub use moments::{ImageMoments, MomentRegistrar};
pub use sampler::{sample_indices, FrameSampler, DEFAULT_STRIDE};
