pub mod availability;
pub mod booking;
pub mod client_score;
pub mod review;
pub mod salon;
pub mod service;
pub mod stylist;
pub mod user;

pub use availability::Availability;
pub use booking::{Booking, BookingStatus, PaymentMethod};
pub use client_score::{ClientScore, ScoreEvent, ScoreEventRecord, ScoreLevel};
pub use review::{Favorite, Review};
pub use salon::{Salon, SalonDetail, SalonImage};
pub use service::Service;
pub use stylist::Stylist;
pub use user::{Role, User};
