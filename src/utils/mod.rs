/// File utilities
pub mod files;

/// Renderer Utilities
pub mod renderer;
