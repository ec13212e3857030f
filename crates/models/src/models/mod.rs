pub mod admin;
pub mod booking;
pub mod notification;
pub mod page;
pub mod payment;
pub mod review;
pub mod service;
pub mod user;
pub mod worker;

pub use admin::{ActivationRequest, ActivationStatus, AdminData, PaymentSummary, Report, ReportStatus};
pub use booking::{Booking, BookingStatus};
pub use notification::{NewNotification, Notification, NotificationType};
pub use page::{Data, ListPage, Paginated};
pub use payment::{Payment, PaymentStatus};
pub use review::Review;
pub use service::Service;
pub use user::{Profile, UserType};
pub use worker::WorkerProfile;

use uuid::Uuid;

/// A server-owned row addressable by id. Every cached list keys on this.
pub trait Entity {
    fn id(&self) -> Uuid;
}
