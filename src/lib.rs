//! End-to-end suite for the phpcbf-runner workspace; see `tests/`
pub use phpcbf_runner_core::*;
