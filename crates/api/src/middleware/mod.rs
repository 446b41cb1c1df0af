//! HTTP middleware components.

pub mod actor;
pub mod logging;
pub mod metrics;
pub mod trace_id;

pub use actor::{require_actor, require_admin, ClientIp};
pub use metrics::{init_metrics, metrics_handler, metrics_middleware};
pub use trace_id::{trace_id, RequestId, REQUEST_ID_HEADER};
