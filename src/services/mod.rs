pub mod auth;
pub mod inventory;
pub mod reservation;
pub mod scheduler;

pub use auth::{AuthError, Claims, TokenService};
pub use reservation::ReservationAuthority;
pub use scheduler::{CreateSessionRequest, SessionScheduler};
