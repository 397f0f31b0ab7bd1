use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use shared_database::DocumentStore;

use crate::models::Prescription;

const COLLECTION: &str = "prescription";

fn appointment_index(appointment_id: i64) -> String {
    format!("appointment:{}:prescriptions", appointment_id)
}

/// Prescription documents plus the per-appointment index that lists them.
pub struct PrescriptionStore {
    documents: Arc<dyn DocumentStore>,
}

impl PrescriptionStore {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    pub async fn save(&self, prescription: &Prescription) -> Result<()> {
        let document = serde_json::to_value(prescription)?;
        self.documents
            .put(COLLECTION, &prescription.id, &document)
            .await?;
        self.documents
            .index_add(&appointment_index(prescription.appointment_id), &prescription.id)
            .await?;
        debug!("Saved prescription {}", prescription.id);
        Ok(())
    }

    pub async fn load(&self, id: &str) -> Result<Option<Prescription>> {
        match self.documents.get(COLLECTION, id).await? {
            Some(document) => Ok(Some(serde_json::from_value(document)?)),
            None => Ok(None),
        }
    }

    pub async fn remove(&self, prescription: &Prescription) -> Result<bool> {
        let removed = self.documents.delete(COLLECTION, &prescription.id).await?;
        self.documents
            .index_remove(&appointment_index(prescription.appointment_id), &prescription.id)
            .await?;
        Ok(removed)
    }

    pub async fn list_for_appointment(&self, appointment_id: i64) -> Result<Vec<Prescription>> {
        let ids = self
            .documents
            .index_members(&appointment_index(appointment_id))
            .await?;

        let mut prescriptions = Vec::with_capacity(ids.len());
        for id in ids {
            match self.load(&id).await? {
                Some(prescription) => prescriptions.push(prescription),
                None => warn!("Index for appointment {} lists missing prescription {}", appointment_id, id),
            }
        }
        Ok(prescriptions)
    }
}
