//! Development-only tooling served alongside the operation router.
//!
//! - [`explorer`]: the operations explorer page and its renderer
//! - [`layer`]: Tower layer that intercepts the explorer path
//! - [`html`]: escaping HTML builder used by the renderer

pub mod explorer;
pub mod html;
pub mod layer;

pub use explorer::{
    render_document, render_operations_panel, ExplorerConfig, ExplorerError, ExplorerPage,
    DEFAULT_EXPLORER_PATH,
};
pub use layer::{ExplorerLayer, ExplorerService};
