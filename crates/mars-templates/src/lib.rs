//! Template compilation and rendering for Mars themes.
//!
//! Templates are plain text with `@` directives and output blocks:
//!
//! ```text
//! @if($user.name)
//!   <p>Hello {{ $user.name }}!</p>
//! @else
//!   <p>Hello stranger!</p>
//! @endif
//! @foreach($posts as $post)
//!   <h2>{{ $post.title | upper }}</h2>
//!   {! $post.body !}
//! @endforeach
//! @include('footer')
//! ```
//!
//! Rendering runs in two passes. A compile pass tokenizes the source,
//! parses it into a program tree, and resolves every `@include` and
//! `@template` target to an absolute path; the resulting program is
//! persisted as a JSON artifact keyed by source path and kind. A render
//! pass walks the tree against a [`Scope`] of TOML values, escaping
//! `{{ ... }}` output as HTML unless a `raw` pipe lifts it.
//!
//! [`Engine`] is the front door: it owns the options, the artifact store,
//! and the modifier table, and decides per render whether a cached program
//! is still usable or the source must be recompiled.

// Compile pipeline
pub mod compile;
pub mod syntax;

// Artifact store
pub mod cache;

// Execution
pub mod render;
pub mod scope;

// Engine surface
pub mod engine;
pub mod error;
pub mod options;
pub mod path;

// Re-export commonly used types
pub use cache::CompiledStore;
pub use compile::{CompileParams, CompiledTemplate, SCHEMA_VERSION};
pub use engine::{Engine, RenderOptions};
pub use error::{Result, TemplateError};
pub use options::{EngineOptions, TemplateKind};
pub use render::modifiers::ModifierSet;
pub use render::{IncludeLoader, RenderContext, MAX_INCLUDE_DEPTH};
pub use scope::Scope;
