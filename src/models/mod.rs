pub mod area;
pub mod film;
pub mod session;
pub mod spot;
pub mod transaction;
pub mod user;

pub use area::{Area, NewArea};
pub use film::{Film, FilmStatus, NewFilm};
pub use session::{max_amount, NewSession, Session, AMOUNT_SCALE};
pub use spot::{SeatLabel, SeatLabelError, Spot, SpotSeed};
pub use transaction::{NewTransaction, Transaction, TransactionDetail};
pub use user::{NewUser, Role, User};
