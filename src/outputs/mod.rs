//! Report output.
//!
//! # Submodules
//!
//! - [`html`]: Renders category groups to a standalone HTML page and writes it
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── summary_20250506_070000.html
//! └── summary_20250506_130000.html
//! ```
//!
//! Each run writes a new timestamped file; nothing is appended or replaced.

pub mod html;
