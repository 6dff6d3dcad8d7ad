//! Substack preparation and flatten job submission for FlyEM slab slices.
//!
//! `prepare_substack_dir` renders a substack directory from a template and
//! fills `input_slices/` with renumbered slices. `launch_flatten` reads the
//! `substack-params.json` it wrote and submits one flatten job to LSF.

pub mod cli;
pub mod config;
pub mod consts;
pub mod core;
pub mod executor;
