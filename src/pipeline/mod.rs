//! Pipeline stages for one diagram-generation run.
//!
//! Each submodule implements exactly one step, so every stage can fail with
//! its own error and be tested in isolation.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ submit ──▶ poll ──▶ artifacts
//! (path)    (base64)   (handle)   (status)  (text / svg)
//! ```
//!
//! 1. [`input`]     — read and validate the local source file
//! 2. [`encode`]    — base64-wrap the bytes for the JSON request body
//! 3. [`submit`]    — hand the content to the workflow, get a handle back
//! 4. [`crate::poller`] — query status until a terminal state
//! 5. [`artifacts`] — download generated documents, write them to disk
//!
//! [`uml`] is independent of the network: it derives PlantUML from
//! pseudocode locally.

pub mod artifacts;
pub mod encode;
pub mod input;
pub mod submit;
pub mod uml;
