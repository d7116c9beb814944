//! # Configuration template rendering.
//!
//! A template is plain text with `$name$` placeholders. [`render`] substitutes
//! every placeholder from a [`WorkerParameters`] set; the placeholders are
//! disjoint tokens, so substitution order does not matter and rendering never
//! fails. Only loading a template ([`TemplateSource::load`]) and writing the
//! result ([`RenderedConfig::write_to`]) touch the filesystem.
//!
//! ## Placeholders
//! ```text
//! $algo$ $legacyalgo$        algorithm
//! $url$                      full pool string (possibly resolved)
//! $urlhost$ $urlport$        pool split at build time (port may be empty)
//! $username$ $pass$          credentials
//! $legacythreads$            cores × threads-per-core
//! $legacyintensity$          intensity
//! $cpuconfig$                CPU affinity descriptor
//! ```

mod render;
mod source;

pub use render::{PLACEHOLDERS, RenderedConfig, render};
pub use source::TemplateSource;
