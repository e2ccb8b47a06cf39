//! Appointment data-access router library.

pub mod backend;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use config::schema::RouterConfig;
pub use error::{Result, RouterError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::AppointmentRouter;
