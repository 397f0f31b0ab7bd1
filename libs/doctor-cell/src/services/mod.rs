pub mod availability;
pub mod doctor;
pub mod store;

pub use availability::{intervals_overlap, AvailabilityService};
pub use doctor::DoctorService;
pub use store::{DoctorStore, MemoryDoctorStore, SupabaseDoctorStore};
