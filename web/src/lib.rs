//! Axum REST surface for the GrowHub commerce core.
//!
//! Handlers are thin: extract the [`Principal`](growhub_core::Principal)
//! and the request body, call one service of [`Commerce`](growhub_core::Commerce),
//! and map the outcome to HTTP.
//!
//! # Request Flow
//!
//! 1. **Correlation** middleware tags the request and opens its span
//! 2. **Extract** the principal from the gateway headers and the JSON body
//! 3. **Call** the coordinator, which runs its own transaction
//! 4. **Map** the result (or [`AppError`]) to a response
//!
//! # Example
//!
//! ```ignore
//! use growhub_web::{AppState, build_router};
//!
//! let app = build_router(AppState::new(commerce));
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::AppError;
pub use extractors::{Authenticated, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use router::build_router;
pub use state::AppState;
