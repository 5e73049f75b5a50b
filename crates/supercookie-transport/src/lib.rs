pub use supercookie_core::{ServerBuilder, ServerConfig, TrackingRegistry};
pub mod dispatch;
pub mod error;
pub mod router;
pub mod server;

pub use dispatch::{FaviconReply, ProbeResult, SetResult, Validators};
pub use error::RouteError;
pub use router::{build_router, AppState};
pub use server::SupercookieServer;
