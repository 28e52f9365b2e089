//! HTTP middleware subsystem.
//!
//! # Data Flow
//! ```text
//! Request
//!     → layer.rs (AccessLogService::call)
//!     → request.rs (RequestContext: start time, URL, remote address)
//!     → inner service
//!     → completion.rs (record head, wrap body in LoggedBody)
//!     → Send to client
//!
//! Body ends, errors or is dropped:
//!     → completion.rs (FINALIZED, build ResponseView)
//!     → layer.rs (skip? render, write, report 5xx)
//! ```

pub mod completion;
pub mod layer;
pub mod request;
pub mod response;
pub mod server;

pub use completion::LoggedBody;
pub use layer::{AccessLogBuilder, AccessLogLayer, AccessLogService, AccessLogger, BuildError, SkipFn};
pub use request::{ClientAddr, RequestContext};
pub use response::ResponseView;
pub use server::DemoServer;
