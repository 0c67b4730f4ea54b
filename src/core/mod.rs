pub mod context;
pub mod error;
pub mod gateway;
pub mod registry;
pub mod rewrite;
pub mod route_table;

pub use context::{Outcome, RequestContext};
pub use error::{ConfigError, GatewayError};
pub use gateway::{GatewayService, HEALTH_PATH};
pub use registry::ServiceRegistry;
pub use rewrite::RequestRewriter;
pub use route_table::{RouteDefinition, RouteMatch, RouteTable};
