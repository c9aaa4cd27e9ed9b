pub mod types;
pub mod interface;
pub mod rate_limiter;
pub mod circuit_breaker;
pub mod retry;
pub mod health;
pub mod transport;


pub use types::*;
pub use interface::ApiClient;
pub use rate_limiter::RateLimiter;
pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use health::HealthMonitor;
pub use transport::{HttpTransport, Transport};
