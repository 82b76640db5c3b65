pub mod exchange_rate_api;
pub mod fallback;
pub mod frankfurter;
pub mod util;

pub use fallback::{FallbackRateProvider, default_rates};
