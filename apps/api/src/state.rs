use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::info;

use appointment_cell::{AppointmentStore, BookingService, MemoryAppointmentStore, SupabaseAppointmentStore};
use doctor_cell::{DoctorService, DoctorStore, MemoryDoctorStore, SupabaseDoctorStore};
use patient_cell::{MemoryPatientStore, PatientService, PatientStore, SupabasePatientStore};
use prescription_cell::PrescriptionService;
use shared_config::{AppConfig, StorageBackend};
use shared_database::{DocumentStore, MemoryDocumentStore, RedisDocumentStore, SupabaseClient};

/// Every cell's service, wired to one storage backend.
#[derive(Clone)]
pub struct AppServices {
    pub doctors: Arc<DoctorService>,
    pub patients: Arc<PatientService>,
    pub booking: Arc<BookingService>,
    pub prescriptions: Arc<PrescriptionService>,
}

struct Stores {
    doctors: Arc<dyn DoctorStore>,
    patients: Arc<dyn PatientStore>,
    appointments: Arc<dyn AppointmentStore>,
    documents: Arc<dyn DocumentStore>,
}

impl AppServices {
    pub async fn build(config: &AppConfig) -> Result<Self> {
        let stores = match config.storage_backend {
            StorageBackend::Supabase => {
                if !config.is_configured() {
                    bail!("STORAGE_BACKEND=supabase needs SUPABASE_URL, SUPABASE_SERVICE_ROLE_KEY and REDIS_URL");
                }
                let supabase = Arc::new(SupabaseClient::new(config));
                info!("Using Supabase at {} with Redis documents", supabase.get_base_url());
                Stores {
                    doctors: Arc::new(SupabaseDoctorStore::new(supabase.clone())),
                    patients: Arc::new(SupabasePatientStore::new(supabase.clone())),
                    appointments: Arc::new(SupabaseAppointmentStore::new(supabase)),
                    documents: Arc::new(RedisDocumentStore::connect(config).await?),
                }
            }
            StorageBackend::Memory => {
                info!("Using in-memory storage");
                Stores {
                    doctors: Arc::new(MemoryDoctorStore::new()),
                    patients: Arc::new(MemoryPatientStore::new()),
                    appointments: Arc::new(MemoryAppointmentStore::new()),
                    documents: Arc::new(MemoryDocumentStore::new()),
                }
            }
        };

        Ok(Self::from_stores(stores))
    }

    fn from_stores(stores: Stores) -> Self {
        let doctors = Arc::new(DoctorService::new(stores.doctors));
        let patients = Arc::new(PatientService::new(stores.patients));
        let booking = Arc::new(BookingService::new(
            stores.appointments.clone(),
            doctors.clone(),
            patients.clone(),
        ));
        let prescriptions = Arc::new(PrescriptionService::new(
            stores.documents,
            stores.appointments,
        ));

        Self {
            doctors,
            patients,
            booking,
            prescriptions,
        }
    }
}
