pub mod extension;
pub mod session;

pub use extension::{ExtensionRequest, RequestStatus};
pub use session::{CallSession, CallStatus, CallSummary};
