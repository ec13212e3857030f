pub mod bookings;
pub mod dashboard;
pub mod gateway;
pub mod moderation;
pub mod notifications;
pub mod optimistic;
pub mod payments;
pub mod session;
pub mod storage;
pub mod table;
pub mod toast;

pub use bookings::BookingApi;
pub use dashboard::{AdminDashboard, CustomerDashboard, DashboardHook, WorkerDashboard};
pub use gateway::{ApiClient, ApiResult, Envelope, GatewayError};
pub use moderation::AdminApi;
pub use notifications::{NotificationFeed, PollHandle};
pub use payments::{CheckoutReturn, PaymentsApi};
pub use session::{Session, SessionError, SessionState, SessionStore, SignUpForm};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use table::{EndpointSource, PageQuery, PagedTable, RollbackPolicy};
pub use toast::{Toast, ToastLevel, Toasts};
