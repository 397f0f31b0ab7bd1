pub mod booking;
pub mod conflict;
pub mod lifecycle;
pub mod locks;
pub mod store;

pub use booking::BookingService;
pub use conflict::ConflictDetectionService;
pub use lifecycle::AppointmentLifecycleService;
pub use locks::BookingLocks;
pub use store::{AppointmentStore, MemoryAppointmentStore, SupabaseAppointmentStore};
