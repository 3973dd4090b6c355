//! Pipeline stages for one conversion request.
//!
//! Each submodule implements exactly one step and can be tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! body ──▶ validate ──▶ invoke ──▶ respond
//! (bytes)  (request)    (engine)   (HTTP)
//! ```
//!
//! 1. [`body`]     : collect the request body under the byte cap
//! 2. [`validate`] : parse JSON and check `text`, `to` and the html flags
//! 3. [`invoke`]   : run the engine as a child process with a timeout; the
//!    only stage that touches the OS
//! 4. [`respond`]  : raw bytes or a JSON envelope, per `Accept`

pub mod body;
pub mod invoke;
pub mod respond;
pub mod validate;
