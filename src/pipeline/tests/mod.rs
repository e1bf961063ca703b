//! Unit tests for the pipeline module.
//!
//! Tests are organised by component: the stage registry and task model,
//! wire decoding, board geometry and gestures, the mutation coordinator,
//! the editing surfaces, and the retrying gateway.

mod retry_tests;
mod support;
