//! All SQL lives here, grouped by resource. Functions take a plain
//! `&Connection` so they run the same inside or outside a transaction.

mod admin;
mod bookings;
mod catalog;
mod reviews;
mod salons;
mod scores;
mod users;

pub use admin::*;
pub use bookings::*;
pub use catalog::*;
pub use reviews::*;
pub use salons::*;
pub use scores::*;
pub use users::*;
