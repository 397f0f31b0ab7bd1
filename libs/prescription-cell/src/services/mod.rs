pub mod prescription;
pub mod store;

pub use prescription::PrescriptionService;
pub use store::PrescriptionStore;
