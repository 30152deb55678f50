pub mod api;
mod info_stub;
mod middleware;
pub mod server;

pub use api::{ApiState, build_router};
pub use info_stub::build_info_router;
pub use middleware::RequestContext;
pub use server::{Drain, ServerLimits, serve};
