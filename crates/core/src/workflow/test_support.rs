//! In-memory workflow store for orchestrator tests.
//!
//! `begin` takes the one store-wide lock and a working copy of every table;
//! `commit` writes the copy back. Dropping a unit releases the lock and
//! discards its writes.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::workflow::attestation::{Attestation, AttestationRecord};
use crate::workflow::entity::{BusinessTrip, BusinessTripRecord, WorkPaper, WorkPaperRecord};
use crate::workflow::error::WorkflowError;
use crate::workflow::store::{ParentRepository, UnitOfWork, WorkflowStore};
use crate::workflow::types::AttestationKind;

#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    pub work_papers: HashMap<Uuid, WorkPaperRecord>,
    pub business_trips: HashMap<Uuid, BusinessTripRecord>,
    pub attestations: Vec<AttestationRecord>,
}

#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    commits: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed units so far.
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Edit committed rows directly, bypassing the workflow.
    pub async fn tamper<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut tables = self.tables.lock().await;
        f(&mut tables)
    }

    pub async fn attestation(&self, id: Uuid) -> Option<AttestationRecord> {
        let tables = self.tables.lock().await;
        tables.attestations.iter().find(|a| a.id == id).cloned()
    }

    pub async fn business_trip(&self, id: Uuid) -> Option<BusinessTripRecord> {
        self.tables.lock().await.business_trips.get(&id).cloned()
    }

    pub async fn work_paper(&self, id: Uuid) -> Option<WorkPaperRecord> {
        self.tables.lock().await.work_papers.get(&id).cloned()
    }
}

pub(crate) struct MemoryUnit {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    commits: Arc<AtomicUsize>,
}

impl WorkflowStore for MemoryStore {
    type Unit = MemoryUnit;

    async fn begin(&self) -> Result<MemoryUnit, WorkflowError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryUnit {
            guard,
            working,
            commits: Arc::clone(&self.commits),
        })
    }
}

impl ParentRepository<WorkPaper> for MemoryUnit {
    async fn find_parent(&mut self, id: Uuid) -> Result<Option<WorkPaper>, WorkflowError> {
        Ok(self.working.work_papers.get(&id).cloned().map(WorkPaper::restore))
    }

    async fn lock_parent(&mut self, id: Uuid) -> Result<Option<WorkPaper>, WorkflowError> {
        Ok(self.working.work_papers.get(&id).cloned().map(WorkPaper::restore))
    }

    async fn insert_parent(&mut self, parent: &WorkPaper) -> Result<(), WorkflowError> {
        self.working
            .work_papers
            .insert(parent.id, parent.clone().into_record());
        Ok(())
    }

    async fn save_parent(&mut self, parent: &WorkPaper) -> Result<(), WorkflowError> {
        match self.working.work_papers.get_mut(&parent.id) {
            Some(row) => {
                *row = parent.clone().into_record();
                Ok(())
            }
            None => Err(WorkflowError::WorkPaperNotFound(parent.id)),
        }
    }
}

impl ParentRepository<BusinessTrip> for MemoryUnit {
    async fn find_parent(&mut self, id: Uuid) -> Result<Option<BusinessTrip>, WorkflowError> {
        Ok(self
            .working
            .business_trips
            .get(&id)
            .cloned()
            .map(BusinessTrip::restore))
    }

    async fn lock_parent(&mut self, id: Uuid) -> Result<Option<BusinessTrip>, WorkflowError> {
        Ok(self
            .working
            .business_trips
            .get(&id)
            .cloned()
            .map(BusinessTrip::restore))
    }

    async fn insert_parent(&mut self, parent: &BusinessTrip) -> Result<(), WorkflowError> {
        self.working
            .business_trips
            .insert(parent.id, parent.clone().into_record());
        Ok(())
    }

    async fn save_parent(&mut self, parent: &BusinessTrip) -> Result<(), WorkflowError> {
        match self.working.business_trips.get_mut(&parent.id) {
            Some(row) => {
                *row = parent.clone().into_record();
                Ok(())
            }
            None => Err(WorkflowError::BusinessTripNotFound(parent.id)),
        }
    }
}

impl UnitOfWork for MemoryUnit {
    async fn find_attestation(
        &mut self,
        kind: AttestationKind,
        id: Uuid,
    ) -> Result<Option<Attestation>, WorkflowError> {
        Ok(self
            .working
            .attestations
            .iter()
            .find(|a| a.kind == kind && a.id == id)
            .cloned()
            .map(Attestation::restore))
    }

    async fn find_attestation_by_party(
        &mut self,
        kind: AttestationKind,
        parent_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Attestation>, WorkflowError> {
        Ok(self
            .working
            .attestations
            .iter()
            .find(|a| a.kind == kind && a.parent_id == parent_id && a.user_id == user_id)
            .cloned()
            .map(Attestation::restore))
    }

    async fn list_attestations(
        &mut self,
        kind: AttestationKind,
        parent_id: Uuid,
    ) -> Result<Vec<Attestation>, WorkflowError> {
        Ok(self
            .working
            .attestations
            .iter()
            .filter(|a| a.kind == kind && a.parent_id == parent_id)
            .cloned()
            .map(Attestation::restore)
            .collect())
    }

    async fn insert_attestation(&mut self, attestation: &Attestation) -> Result<(), WorkflowError> {
        let duplicate = self.working.attestations.iter().any(|a| {
            a.kind == attestation.kind
                && a.parent_id == attestation.parent_id
                && a.user_id == attestation.user_id
        });
        if duplicate {
            return Err(WorkflowError::DuplicateAttestation {
                parent_id: attestation.parent_id,
                user_id: attestation.user_id,
            });
        }
        self.working
            .attestations
            .push(attestation.clone().into_record());
        Ok(())
    }

    async fn save_attestation(&mut self, attestation: &Attestation) -> Result<(), WorkflowError> {
        match self
            .working
            .attestations
            .iter_mut()
            .find(|a| a.id == attestation.id)
        {
            Some(row) => {
                *row = attestation.clone().into_record();
                Ok(())
            }
            None => Err(WorkflowError::AttestationNotFound(attestation.id)),
        }
    }

    async fn delete_attestation(
        &mut self,
        kind: AttestationKind,
        id: Uuid,
    ) -> Result<bool, WorkflowError> {
        let before = self.working.attestations.len();
        self.working
            .attestations
            .retain(|a| !(a.kind == kind && a.id == id));
        Ok(self.working.attestations.len() != before)
    }

    async fn commit(mut self) -> Result<(), WorkflowError> {
        *self.guard = std::mem::take(&mut self.working);
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
