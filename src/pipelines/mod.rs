// SPDX-License-Identifier: MPL-2.0

//! Frame pipelines
//!
//! ```text
//! ┌──────────────┐     ┌────────────────────┐     ┌─────────────────┐
//! │ DeviceManager│ ──▶ │ Streaming Pipeline │ ──▶ │ multipart JPEG  │
//! │   (shared)   │     │  - transforms      │     │  (per consumer) │
//! └──────────────┘     │  - overlay/mirror  │     └─────────────────┘
//!                      └──────┬───────┬─────┘
//!                             │       │
//!                             ▼       ▼
//!                  ┌──────────────┐ ┌──────────────────┐
//!                  │  PNG still   │ │ Recording Session│ ──▶ AVI file
//!                  └──────────────┘ └──────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`stream`]: Per-consumer loop producing the live view
//! - [`photo`]: Still capture
//! - [`video`]: Background recording

pub mod photo;
pub mod stream;
pub mod video;
