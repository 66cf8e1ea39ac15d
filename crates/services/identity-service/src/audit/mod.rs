//! Asynchronous, best-effort audit trail emission.

mod emitter;
mod sink;

pub use emitter::AuditEmitter;
pub use sink::{AuditSink, GrpcAuditSink};
