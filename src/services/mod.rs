pub mod bookings;
pub mod calendar;
pub mod feedback;
pub mod gateway;
pub mod local_store;
pub mod messaging;
pub mod photos;
pub mod progress;
pub mod scheduling;
pub mod sync;
pub mod transition;
