mod fallback;
mod health;
mod lookup;

pub use fallback::{handle_panic, route_not_found};
pub use health::health_check;
pub use lookup::{geocode, suggest};
