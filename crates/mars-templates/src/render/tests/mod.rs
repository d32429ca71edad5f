//! Renderer tests
//!
//! These run the parse and render passes directly, without the engine or
//! the cache, organized into focused submodules.

// Shared fixtures
mod helpers;

mod render_conditions;
mod render_escaping;

// Modifier behavior at render time
mod modifier_calls;

// Error and edge case tests
mod errors;
