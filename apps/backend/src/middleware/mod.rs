pub mod cors;
pub mod db_gate;
pub mod request_trace;
pub mod structured_logger;
pub mod trace_span;

pub use cors::cors_middleware;
pub use db_gate::RequireDb;
pub use request_trace::{RequestTrace, TraceId};
pub use structured_logger::StructuredLogger;
pub use trace_span::TraceSpan;
