// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for video capture
//!
//! # Architecture
//!
//! The backend layer abstracts hardware access, providing a consistent API
//! regardless of the underlying capture method:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              Pipelines / App                │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                  │
//! │  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │ V4L2 (Linux)     │  │   GStreamer     │  │
//! │  │ mmap streaming   │  │ ks/mf/avf/v4l2  │  │
//! │  └──────────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Device lifecycle, capture backends and frame types

pub mod camera;
