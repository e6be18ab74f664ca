//! `SeaORM` implementation of the workflow store.
//!
//! Every unit of work wraps one database transaction. `lock_parent` takes a
//! `SELECT ... FOR UPDATE` row lock on the parent, which serializes all
//! attestation writes and aggregation on that parent until commit.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait, Unchanged,
};
use uuid::Uuid;

use auditflow_core::workflow::{
    Attestation, AttestationKind, AttestationRecord, AttestationStatus, BusinessTrip,
    BusinessTripRecord, DigitalSignature, ParentRepository, UnitOfWork, WorkPaper, WorkPaperRecord,
    WorkflowError, WorkflowStore,
};
use auditflow_core::workflow::types;

use crate::entities::{
    business_trips,
    sea_orm_active_enums::{
        BusinessTripStatus, SignatureStatus, VerificatorStatus, WorkPaperStatus,
    },
    verificators, work_paper_signatures, work_papers,
};

/// Opens database-backed units of work.
#[derive(Debug, Clone)]
pub struct SeaOrmWorkflowStore {
    db: DatabaseConnection,
}

impl SeaOrmWorkflowStore {
    /// Creates a new workflow store.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl WorkflowStore for SeaOrmWorkflowStore {
    type Unit = SeaOrmUnitOfWork;

    async fn begin(&self) -> Result<SeaOrmUnitOfWork, WorkflowError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;
        Ok(SeaOrmUnitOfWork { txn })
    }
}

/// A unit of work over one database transaction.
///
/// Dropping it without calling `commit` rolls the transaction back.
pub struct SeaOrmUnitOfWork {
    txn: DatabaseTransaction,
}

impl ParentRepository<WorkPaper> for SeaOrmUnitOfWork {
    async fn find_parent(&mut self, id: Uuid) -> Result<Option<WorkPaper>, WorkflowError> {
        let model = work_papers::Entity::find_by_id(id)
            .one(&self.txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;
        Ok(model.map(|m| WorkPaper::restore(work_paper_from_model(m))))
    }

    async fn lock_parent(&mut self, id: Uuid) -> Result<Option<WorkPaper>, WorkflowError> {
        let model = work_papers::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;
        Ok(model.map(|m| WorkPaper::restore(work_paper_from_model(m))))
    }

    async fn insert_parent(&mut self, parent: &WorkPaper) -> Result<(), WorkflowError> {
        let active = work_papers::ActiveModel {
            id: Set(parent.id),
            title: Set(parent.title.clone()),
            document_link: Set(parent.document_link.clone()),
            status: Set(core_work_paper_status_to_db(parent.status)),
            created_at: Set(parent.created_at.into()),
            updated_at: Set(parent.updated_at.into()),
        };
        active
            .insert(&self.txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;
        Ok(())
    }

    async fn save_parent(&mut self, parent: &WorkPaper) -> Result<(), WorkflowError> {
        let active = work_papers::ActiveModel {
            id: Unchanged(parent.id),
            title: Set(parent.title.clone()),
            document_link: Set(parent.document_link.clone()),
            status: Set(core_work_paper_status_to_db(parent.status)),
            updated_at: Set(parent.updated_at.into()),
            ..Default::default()
        };
        active.update(&self.txn).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => WorkflowError::WorkPaperNotFound(parent.id),
            other => WorkflowError::Database(other.to_string()),
        })?;
        Ok(())
    }
}

impl ParentRepository<BusinessTrip> for SeaOrmUnitOfWork {
    async fn find_parent(&mut self, id: Uuid) -> Result<Option<BusinessTrip>, WorkflowError> {
        let model = business_trips::Entity::find_by_id(id)
            .one(&self.txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;
        Ok(model.map(|m| BusinessTrip::restore(business_trip_from_model(m))))
    }

    async fn lock_parent(&mut self, id: Uuid) -> Result<Option<BusinessTrip>, WorkflowError> {
        let model = business_trips::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;
        Ok(model.map(|m| BusinessTrip::restore(business_trip_from_model(m))))
    }

    async fn insert_parent(&mut self, parent: &BusinessTrip) -> Result<(), WorkflowError> {
        let active = business_trips::ActiveModel {
            id: Set(parent.id),
            purpose: Set(parent.purpose.clone()),
            destination: Set(parent.destination.clone()),
            status: Set(core_business_trip_status_to_db(parent.status)),
            created_at: Set(parent.created_at.into()),
            updated_at: Set(parent.updated_at.into()),
        };
        active
            .insert(&self.txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;
        Ok(())
    }

    async fn save_parent(&mut self, parent: &BusinessTrip) -> Result<(), WorkflowError> {
        let active = business_trips::ActiveModel {
            id: Unchanged(parent.id),
            purpose: Set(parent.purpose.clone()),
            destination: Set(parent.destination.clone()),
            status: Set(core_business_trip_status_to_db(parent.status)),
            updated_at: Set(parent.updated_at.into()),
            ..Default::default()
        };
        active.update(&self.txn).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => WorkflowError::BusinessTripNotFound(parent.id),
            other => WorkflowError::Database(other.to_string()),
        })?;
        Ok(())
    }
}

impl UnitOfWork for SeaOrmUnitOfWork {
    async fn find_attestation(
        &mut self,
        kind: AttestationKind,
        id: Uuid,
    ) -> Result<Option<Attestation>, WorkflowError> {
        let record = match kind {
            AttestationKind::Signer => work_paper_signatures::Entity::find_by_id(id)
                .one(&self.txn)
                .await
                .map_err(|e| WorkflowError::Database(e.to_string()))?
                .map(signer_from_model),
            AttestationKind::Verificator => verificators::Entity::find_by_id(id)
                .one(&self.txn)
                .await
                .map_err(|e| WorkflowError::Database(e.to_string()))?
                .map(verificator_from_model),
        };
        Ok(record.map(Attestation::restore))
    }

    async fn find_attestation_by_party(
        &mut self,
        kind: AttestationKind,
        parent_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Attestation>, WorkflowError> {
        let record = match kind {
            AttestationKind::Signer => work_paper_signatures::Entity::find()
                .filter(work_paper_signatures::Column::WorkPaperId.eq(parent_id))
                .filter(work_paper_signatures::Column::UserId.eq(user_id))
                .one(&self.txn)
                .await
                .map_err(|e| WorkflowError::Database(e.to_string()))?
                .map(signer_from_model),
            AttestationKind::Verificator => verificators::Entity::find()
                .filter(verificators::Column::BusinessTripId.eq(parent_id))
                .filter(verificators::Column::UserId.eq(user_id))
                .one(&self.txn)
                .await
                .map_err(|e| WorkflowError::Database(e.to_string()))?
                .map(verificator_from_model),
        };
        Ok(record.map(Attestation::restore))
    }

    async fn list_attestations(
        &mut self,
        kind: AttestationKind,
        parent_id: Uuid,
    ) -> Result<Vec<Attestation>, WorkflowError> {
        let records: Vec<AttestationRecord> = match kind {
            AttestationKind::Signer => work_paper_signatures::Entity::find()
                .filter(work_paper_signatures::Column::WorkPaperId.eq(parent_id))
                .order_by_asc(work_paper_signatures::Column::CreatedAt)
                .order_by_asc(work_paper_signatures::Column::Id)
                .all(&self.txn)
                .await
                .map_err(|e| WorkflowError::Database(e.to_string()))?
                .into_iter()
                .map(signer_from_model)
                .collect(),
            AttestationKind::Verificator => verificators::Entity::find()
                .filter(verificators::Column::BusinessTripId.eq(parent_id))
                .order_by_asc(verificators::Column::CreatedAt)
                .order_by_asc(verificators::Column::Id)
                .all(&self.txn)
                .await
                .map_err(|e| WorkflowError::Database(e.to_string()))?
                .into_iter()
                .map(verificator_from_model)
                .collect(),
        };
        Ok(records.into_iter().map(Attestation::restore).collect())
    }

    async fn insert_attestation(&mut self, attestation: &Attestation) -> Result<(), WorkflowError> {
        let duplicate = |e: DbErr| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => WorkflowError::DuplicateAttestation {
                parent_id: attestation.parent_id,
                user_id: attestation.user_id,
            },
            _ => WorkflowError::Database(e.to_string()),
        };

        match attestation.kind {
            AttestationKind::Signer => {
                let mut active = work_paper_signatures::ActiveModel {
                    id: Set(attestation.id),
                    work_paper_id: Set(attestation.parent_id),
                    user_id: Set(attestation.user_id),
                    user_name: Set(attestation.user_name.clone()),
                    position: Set(attestation.position.clone()),
                    created_at: Set(attestation.created_at.into()),
                    ..Default::default()
                };
                fill_signer(&mut active, attestation)?;
                active.insert(&self.txn).await.map_err(duplicate)?;
            }
            AttestationKind::Verificator => {
                let mut active = verificators::ActiveModel {
                    id: Set(attestation.id),
                    business_trip_id: Set(attestation.parent_id),
                    user_id: Set(attestation.user_id),
                    user_name: Set(attestation.user_name.clone()),
                    position: Set(attestation.position.clone()),
                    created_at: Set(attestation.created_at.into()),
                    ..Default::default()
                };
                fill_verificator(&mut active, attestation)?;
                active.insert(&self.txn).await.map_err(duplicate)?;
            }
        }
        Ok(())
    }

    async fn save_attestation(&mut self, attestation: &Attestation) -> Result<(), WorkflowError> {
        let not_found = |e: DbErr| match e {
            DbErr::RecordNotUpdated => WorkflowError::AttestationNotFound(attestation.id),
            other => WorkflowError::Database(other.to_string()),
        };

        match attestation.kind {
            AttestationKind::Signer => {
                let mut active = work_paper_signatures::ActiveModel {
                    id: Unchanged(attestation.id),
                    ..Default::default()
                };
                fill_signer(&mut active, attestation)?;
                active.update(&self.txn).await.map_err(not_found)?;
            }
            AttestationKind::Verificator => {
                let mut active = verificators::ActiveModel {
                    id: Unchanged(attestation.id),
                    ..Default::default()
                };
                fill_verificator(&mut active, attestation)?;
                active.update(&self.txn).await.map_err(not_found)?;
            }
        }
        Ok(())
    }

    async fn delete_attestation(
        &mut self,
        kind: AttestationKind,
        id: Uuid,
    ) -> Result<bool, WorkflowError> {
        let result = match kind {
            AttestationKind::Signer => {
                work_paper_signatures::Entity::delete_by_id(id)
                    .exec(&self.txn)
                    .await
            }
            AttestationKind::Verificator => {
                verificators::Entity::delete_by_id(id)
                    .exec(&self.txn)
                    .await
            }
        }
        .map_err(|e| WorkflowError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    async fn commit(self) -> Result<(), WorkflowError> {
        self.txn
            .commit()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }
}

/// Sets the decision and digital signature columns of a signer row.
fn fill_signer(
    active: &mut work_paper_signatures::ActiveModel,
    attestation: &Attestation,
) -> Result<(), WorkflowError> {
    active.status = Set(core_attestation_status_to_signature(attestation.status)?);
    active.notes = Set(attestation.notes.clone());
    active.decided_at = Set(attestation.decided_at.map(Into::into));
    active.updated_at = Set(attestation.updated_at.into());

    match &attestation.digital_signature {
        Some(sig) => {
            active.digital_signature = Set(Some(sig.signature.clone()));
            active.signature_payload = Set(Some(sig.payload.clone()));
            active.signature_algorithm = Set(Some(sig.algorithm.clone()));
            active.signed_at = Set(Some(sig.signed_at.into()));
            active.signature_verified = Set(sig.verified);
            active.verified_at = Set(sig.verified_at.map(Into::into));
            active.verification_error = Set(sig.verification_error.clone());
        }
        None => {
            active.digital_signature = Set(None);
            active.signature_payload = Set(None);
            active.signature_algorithm = Set(None);
            active.signed_at = Set(None);
            active.signature_verified = Set(false);
            active.verified_at = Set(None);
            active.verification_error = Set(None);
        }
    }
    Ok(())
}

/// Sets the decision columns of a verificator row.
fn fill_verificator(
    active: &mut verificators::ActiveModel,
    attestation: &Attestation,
) -> Result<(), WorkflowError> {
    active.status = Set(core_attestation_status_to_verificator(attestation.status)?);
    active.notes = Set(attestation.notes.clone());
    active.decided_at = Set(attestation.decided_at.map(Into::into));
    active.updated_at = Set(attestation.updated_at.into());
    Ok(())
}

fn work_paper_from_model(m: work_papers::Model) -> WorkPaperRecord {
    WorkPaperRecord {
        id: m.id,
        title: m.title,
        document_link: m.document_link,
        status: db_work_paper_status_to_core(m.status),
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

fn business_trip_from_model(m: business_trips::Model) -> BusinessTripRecord {
    BusinessTripRecord {
        id: m.id,
        purpose: m.purpose,
        destination: m.destination,
        status: db_business_trip_status_to_core(m.status),
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

fn signer_from_model(m: work_paper_signatures::Model) -> AttestationRecord {
    let digital_signature = match (
        m.digital_signature,
        m.signature_payload,
        m.signature_algorithm,
        m.signed_at,
    ) {
        (Some(signature), Some(payload), Some(algorithm), Some(signed_at)) => {
            Some(DigitalSignature {
                signature,
                payload,
                algorithm,
                signed_at: signed_at.with_timezone(&Utc),
                verified: m.signature_verified,
                verified_at: m.verified_at.map(|at| at.with_timezone(&Utc)),
                verification_error: m.verification_error,
            })
        }
        _ => None,
    };

    AttestationRecord {
        id: m.id,
        parent_id: m.work_paper_id,
        kind: AttestationKind::Signer,
        user_id: m.user_id,
        user_name: m.user_name,
        position: m.position,
        status: match m.status {
            SignatureStatus::Pending => AttestationStatus::Pending,
            SignatureStatus::Signed => AttestationStatus::Signed,
            SignatureStatus::Rejected => AttestationStatus::Rejected,
        },
        notes: m.notes,
        decided_at: m.decided_at.map(|at| at.with_timezone(&Utc)),
        digital_signature,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

fn verificator_from_model(m: verificators::Model) -> AttestationRecord {
    AttestationRecord {
        id: m.id,
        parent_id: m.business_trip_id,
        kind: AttestationKind::Verificator,
        user_id: m.user_id,
        user_name: m.user_name,
        position: m.position,
        status: match m.status {
            VerificatorStatus::Pending => AttestationStatus::Pending,
            VerificatorStatus::Approved => AttestationStatus::Approved,
            VerificatorStatus::Rejected => AttestationStatus::Rejected,
        },
        notes: m.notes,
        decided_at: m.decided_at.map(|at| at.with_timezone(&Utc)),
        digital_signature: None,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

/// Converts database work paper status to core status.
fn db_work_paper_status_to_core(status: WorkPaperStatus) -> types::WorkPaperStatus {
    match status {
        WorkPaperStatus::Draft => types::WorkPaperStatus::Draft,
        WorkPaperStatus::Ongoing => types::WorkPaperStatus::Ongoing,
        WorkPaperStatus::ReadyToSign => types::WorkPaperStatus::ReadyToSign,
        WorkPaperStatus::Completed => types::WorkPaperStatus::Completed,
    }
}

/// Converts core work paper status to database status.
fn core_work_paper_status_to_db(status: types::WorkPaperStatus) -> WorkPaperStatus {
    match status {
        types::WorkPaperStatus::Draft => WorkPaperStatus::Draft,
        types::WorkPaperStatus::Ongoing => WorkPaperStatus::Ongoing,
        types::WorkPaperStatus::ReadyToSign => WorkPaperStatus::ReadyToSign,
        types::WorkPaperStatus::Completed => WorkPaperStatus::Completed,
    }
}

/// Converts database business trip status to core status.
fn db_business_trip_status_to_core(status: BusinessTripStatus) -> types::BusinessTripStatus {
    match status {
        BusinessTripStatus::Draft => types::BusinessTripStatus::Draft,
        BusinessTripStatus::ReadyToVerify => types::BusinessTripStatus::ReadyToVerify,
        BusinessTripStatus::Ongoing => types::BusinessTripStatus::Ongoing,
        BusinessTripStatus::Canceled => types::BusinessTripStatus::Canceled,
        BusinessTripStatus::Completed => types::BusinessTripStatus::Completed,
    }
}

/// Converts core business trip status to database status.
fn core_business_trip_status_to_db(status: types::BusinessTripStatus) -> BusinessTripStatus {
    match status {
        types::BusinessTripStatus::Draft => BusinessTripStatus::Draft,
        types::BusinessTripStatus::ReadyToVerify => BusinessTripStatus::ReadyToVerify,
        types::BusinessTripStatus::Ongoing => BusinessTripStatus::Ongoing,
        types::BusinessTripStatus::Canceled => BusinessTripStatus::Canceled,
        types::BusinessTripStatus::Completed => BusinessTripStatus::Completed,
    }
}

fn core_attestation_status_to_signature(
    status: AttestationStatus,
) -> Result<SignatureStatus, WorkflowError> {
    match status {
        AttestationStatus::Pending => Ok(SignatureStatus::Pending),
        AttestationStatus::Signed => Ok(SignatureStatus::Signed),
        AttestationStatus::Rejected => Ok(SignatureStatus::Rejected),
        AttestationStatus::Approved => Err(WorkflowError::Database(
            "signer attestation cannot be stored as approved".to_string(),
        )),
    }
}

fn core_attestation_status_to_verificator(
    status: AttestationStatus,
) -> Result<VerificatorStatus, WorkflowError> {
    match status {
        AttestationStatus::Pending => Ok(VerificatorStatus::Pending),
        AttestationStatus::Approved => Ok(VerificatorStatus::Approved),
        AttestationStatus::Rejected => Ok(VerificatorStatus::Rejected),
        AttestationStatus::Signed => Err(WorkflowError::Database(
            "verificator attestation cannot be stored as signed".to_string(),
        )),
    }
}
