//! Image processing, pure Rust via the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Thumbnail** | decode → fit within box (`Lanczos3`) → RGB → encode by extension |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::calculate_fit_dimensions;
pub use params::{Quality, ThumbnailParams};
pub use rust_backend::{RustBackend, is_supported_image, supported_input_extensions};
