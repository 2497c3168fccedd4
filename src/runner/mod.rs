//! External job runner: one worker process per request.
//!
//! The runner launches the pipeline worker script with a JSON-encoded goal,
//! captures stdout and stderr separately, and recovers the worker's trailing
//! JSON result from otherwise free-form console output.
//!
//! # Components
//!
//! - [`JobRunner`]: orchestrates one run end to end
//! - [`resolve`]: interpreter resolution (virtualenv paths, then `PATH`)
//! - [`extract`]: trailing-JSON result extraction and excerpt bounds
//! - [`invocation`]: process wiring and the single-delivery guarantee
//!
//! # Run Flow
//!
//! 1. Validate the goal; empty goals never spawn
//! 2. Resolve the interpreter and check the script exists
//! 3. Spawn `interpreter -u <script> <json-goal>` in the worker directory
//! 4. Drain both streams to completion, optionally bounded by a timeout
//! 5. Exit 0: extract the trailing JSON result from stdout.
//!    Nonzero: report the exit code with a truncated stderr excerpt

pub mod executor;
pub mod extract;
pub mod invocation;
pub mod resolve;

pub use executor::JobRunner;
