mod init;
mod spans;
mod trace_id;

pub use init::init_logger;
pub use spans::{pass_span, symbol_span};
pub use trace_id::TraceId;
