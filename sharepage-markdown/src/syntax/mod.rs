//! Provides a trait-based architecture for syntax highlighting that allows
//! backends to be plugged in.
//!
//! The bundled backend is **Syntect**, using Sublime Text syntax
//! definitions with two-face added for extended syntaxes and themes. It
//! emits class-based spans; pair the output with [`SyntaxManager::stylesheet`].

pub mod error;
pub mod types;

pub use error::{SyntaxError, SyntaxResult};
pub use types::{Highlighted, SyntaxConfig, SyntaxHighlighter, SyntaxManager};

#[cfg(feature = "syntect")] mod syntect;
#[cfg(feature = "syntect")] pub use syntect::*;

/// Create the default syntax manager based on available features.
///
/// # Errors
///
/// Returns [`SyntaxError::NoBackendAvailable`] when built without the
/// `syntect` feature.
pub fn create_default_manager() -> SyntaxResult<SyntaxManager> {
  #[cfg(feature = "syntect")]
  {
    create_syntect_manager()
  }

  #[cfg(not(feature = "syntect"))]
  {
    Err(SyntaxError::NoBackendAvailable)
  }
}
