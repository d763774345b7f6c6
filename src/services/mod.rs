pub mod auth;
pub mod calendar;
pub mod reservations;
pub mod scheduling;
pub mod scoring;
