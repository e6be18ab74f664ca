//! Initial database migration.
//!
//! Creates the workflow enums, the two parent tables and their attestation
//! tables, plus the `updated_at` trigger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: WORK PAPERS
        // ============================================================
        db.execute_unprepared(WORK_PAPERS_SQL).await?;
        db.execute_unprepared(WORK_PAPER_SIGNATURES_SQL).await?;

        // ============================================================
        // PART 3: BUSINESS TRIPS
        // ============================================================
        db.execute_unprepared(BUSINESS_TRIPS_SQL).await?;
        db.execute_unprepared(VERIFICATORS_SQL).await?;

        // ============================================================
        // PART 4: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE work_paper_status AS ENUM ('draft', 'ongoing', 'ready_to_sign', 'completed');
CREATE TYPE business_trip_status AS ENUM ('draft', 'ready_to_verify', 'ongoing', 'canceled', 'completed');
CREATE TYPE signature_status AS ENUM ('pending', 'signed', 'rejected');
CREATE TYPE verificator_status AS ENUM ('pending', 'approved', 'rejected');
";

const WORK_PAPERS_SQL: &str = r"
CREATE TABLE work_papers (
    id UUID PRIMARY KEY,
    title VARCHAR(255) NOT NULL,
    document_link TEXT,
    status work_paper_status NOT NULL DEFAULT 'draft',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_completed_has_document CHECK (
        status <> 'completed' OR (document_link IS NOT NULL AND btrim(document_link) <> '')
    )
);

CREATE INDEX idx_work_papers_status ON work_papers(status);
";

const WORK_PAPER_SIGNATURES_SQL: &str = r"
CREATE TABLE work_paper_signatures (
    id UUID PRIMARY KEY,
    work_paper_id UUID NOT NULL REFERENCES work_papers(id) ON DELETE CASCADE,
    user_id UUID NOT NULL,
    user_name VARCHAR(255) NOT NULL,
    position VARCHAR(255) NOT NULL,
    status signature_status NOT NULL DEFAULT 'pending',
    notes TEXT,
    decided_at TIMESTAMPTZ,

    digital_signature TEXT,
    signature_payload TEXT,
    signature_algorithm VARCHAR(32),
    signed_at TIMESTAMPTZ,
    signature_verified BOOLEAN NOT NULL DEFAULT FALSE,
    verified_at TIMESTAMPTZ,
    verification_error TEXT,

    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_work_paper_signer UNIQUE (work_paper_id, user_id),
    CONSTRAINT chk_signature_decided_at CHECK (
        (status = 'pending') = (decided_at IS NULL)
    ),
    CONSTRAINT chk_digital_signature_complete CHECK (
        (digital_signature IS NULL AND signature_payload IS NULL
            AND signature_algorithm IS NULL AND signed_at IS NULL)
        OR (digital_signature IS NOT NULL AND signature_payload IS NOT NULL
            AND signature_algorithm IS NOT NULL AND signed_at IS NOT NULL
            AND status = 'signed')
    )
);

CREATE INDEX idx_work_paper_signatures_paper ON work_paper_signatures(work_paper_id, created_at);
CREATE INDEX idx_work_paper_signatures_user ON work_paper_signatures(user_id);
";

const BUSINESS_TRIPS_SQL: &str = r"
CREATE TABLE business_trips (
    id UUID PRIMARY KEY,
    purpose TEXT NOT NULL,
    destination VARCHAR(255) NOT NULL,
    status business_trip_status NOT NULL DEFAULT 'draft',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_business_trips_status ON business_trips(status);
";

const VERIFICATORS_SQL: &str = r"
CREATE TABLE verificators (
    id UUID PRIMARY KEY,
    business_trip_id UUID NOT NULL REFERENCES business_trips(id) ON DELETE CASCADE,
    user_id UUID NOT NULL,
    user_name VARCHAR(255) NOT NULL,
    position VARCHAR(255) NOT NULL,
    status verificator_status NOT NULL DEFAULT 'pending',
    notes TEXT,
    decided_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_business_trip_verificator UNIQUE (business_trip_id, user_id),
    CONSTRAINT chk_verificator_decided_at CHECK (
        (status = 'pending') = (decided_at IS NULL)
    )
);

CREATE INDEX idx_verificators_trip ON verificators(business_trip_id, created_at);
CREATE INDEX idx_verificators_user ON verificators(user_id);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: touch_updated_at
-- Keeps updated_at current when a row is changed outside the app
-- ============================================================
CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    IF NEW.updated_at IS NOT DISTINCT FROM OLD.updated_at THEN
        NEW.updated_at := NOW();
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_work_papers_updated_at
    BEFORE UPDATE ON work_papers
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_work_paper_signatures_updated_at
    BEFORE UPDATE ON work_paper_signatures
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_business_trips_updated_at
    BEFORE UPDATE ON business_trips
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_verificators_updated_at
    BEFORE UPDATE ON verificators
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TRIGGER IF EXISTS trg_verificators_updated_at ON verificators;
DROP TRIGGER IF EXISTS trg_business_trips_updated_at ON business_trips;
DROP TRIGGER IF EXISTS trg_work_paper_signatures_updated_at ON work_paper_signatures;
DROP TRIGGER IF EXISTS trg_work_papers_updated_at ON work_papers;
DROP FUNCTION IF EXISTS touch_updated_at();

DROP TABLE IF EXISTS verificators CASCADE;
DROP TABLE IF EXISTS business_trips CASCADE;
DROP TABLE IF EXISTS work_paper_signatures CASCADE;
DROP TABLE IF EXISTS work_papers CASCADE;

DROP TYPE IF EXISTS verificator_status CASCADE;
DROP TYPE IF EXISTS signature_status CASCADE;
DROP TYPE IF EXISTS business_trip_status CASCADE;
DROP TYPE IF EXISTS work_paper_status CASCADE;
";
