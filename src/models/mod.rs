pub mod booking;
pub mod datetime;
pub mod feedback;
pub mod invoice;
pub mod photo;
pub mod progress;
pub mod status;

pub use booking::{Booking, Bucket, NewBooking};
pub use feedback::{Feedback, NewFeedback};
pub use invoice::Invoice;
pub use photo::{PhotoKind, PhotoRecord};
pub use progress::{ServiceProgress, ServiceTask};
pub use status::{validate_status, BookingStatus, UnknownStatus};
