//! Initial database migration.
//!
//! Creates the academic calendar, student, fee, and ledger tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ACADEMIC CALENDAR
        // ============================================================
        db.execute_unprepared(CALENDAR_SQL).await?;

        // ============================================================
        // PART 2: STUDENTS & ENROLLMENT
        // ============================================================
        db.execute_unprepared(STUDENTS_SQL).await?;

        // ============================================================
        // PART 3: FEES & ACCOUNTS
        // ============================================================
        db.execute_unprepared(FEES_SQL).await?;

        // ============================================================
        // PART 4: LEDGER
        // ============================================================
        db.execute_unprepared(LEDGER_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const CALENDAR_SQL: &str = r"
CREATE TABLE academic_sessions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(50) NOT NULL UNIQUE,
    ordinal INTEGER NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE terms (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    session_id UUID NOT NULL REFERENCES academic_sessions(id) ON DELETE CASCADE,
    name VARCHAR(50) NOT NULL,
    ordinal INTEGER NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    next_term_date DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_terms_session_name UNIQUE (session_id, name),
    CONSTRAINT uq_terms_session_ordinal UNIQUE (session_id, ordinal),
    CONSTRAINT chk_terms_dates CHECK (end_date >= start_date)
);

CREATE TABLE classes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(100) NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const STUDENTS_SQL: &str = r"
CREATE TABLE students (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    registration_number VARCHAR(32) NOT NULL UNIQUE,
    registration_year INTEGER NOT NULL,
    first_name VARCHAR(100) NOT NULL,
    last_name VARCHAR(100) NOT NULL,
    other_names VARCHAR(100),
    gender VARCHAR(16) NOT NULL,
    date_of_birth DATE NOT NULL,
    address TEXT,
    next_of_kin_name VARCHAR(200),
    next_of_kin_phone_number VARCHAR(32),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_students_registration_year ON students(registration_year);
CREATE INDEX idx_students_identity ON students(lower(first_name), lower(last_name), date_of_birth);

CREATE TABLE enrollments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    student_id UUID NOT NULL REFERENCES students(id) ON DELETE CASCADE,
    class_id UUID NOT NULL REFERENCES classes(id),
    session_id UUID NOT NULL REFERENCES academic_sessions(id),
    term_id UUID NOT NULL REFERENCES terms(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_enrollments UNIQUE (student_id, class_id, session_id, term_id)
);
";

const FEES_SQL: &str = r"
CREATE TABLE payment_types (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(100) NOT NULL UNIQUE,
    amount NUMERIC(14, 2) NOT NULL,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_payment_types_amount CHECK (amount > 0)
);

CREATE TABLE accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(100) NOT NULL UNIQUE,
    owner VARCHAR(100),
    permissions TEXT,
    notes TEXT,
    status VARCHAR(16) NOT NULL DEFAULT 'active',
    balance NUMERIC(14, 2) NOT NULL DEFAULT 0,
    minimum_balance NUMERIC(14, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_accounts_status CHECK (status IN ('active', 'closed', 'frozen')),
    CONSTRAINT chk_accounts_balance CHECK (balance >= 0)
);

CREATE TABLE payment_type_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    payment_type_id UUID NOT NULL UNIQUE REFERENCES payment_types(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES accounts(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE discounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    student_id UUID NOT NULL REFERENCES students(id),
    payment_type_id UUID NOT NULL REFERENCES payment_types(id),
    session_id UUID NOT NULL REFERENCES academic_sessions(id),
    term_id UUID NOT NULL REFERENCES terms(id),
    amount NUMERIC(14, 2) NOT NULL,
    reason TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_discounts UNIQUE (student_id, payment_type_id, session_id, term_id),
    CONSTRAINT chk_discounts_amount CHECK (amount > 0)
);
";

const LEDGER_SQL: &str = r"
CREATE TABLE payments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    student_id UUID NOT NULL REFERENCES students(id),
    payment_type_id UUID NOT NULL REFERENCES payment_types(id),
    session_id UUID NOT NULL REFERENCES academic_sessions(id),
    term_id UUID NOT NULL REFERENCES terms(id),
    amount NUMERIC(14, 2) NOT NULL,
    amount_type VARCHAR(50) NOT NULL,
    payment_date TIMESTAMPTZ NOT NULL DEFAULT now(),
    regular_payment BOOLEAN NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_payments_amount CHECK (amount > 0)
);

-- Latest payment per student and fee category
CREATE INDEX idx_payments_student_type ON payments(student_id, payment_type_id, payment_date DESC);

-- At most one regular payment per billing period
CREATE UNIQUE INDEX uq_payments_regular_period
    ON payments(student_id, payment_type_id, session_id, term_id)
    WHERE regular_payment;

CREATE TABLE outstanding_balances (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    student_id UUID NOT NULL REFERENCES students(id),
    payment_type_id UUID NOT NULL REFERENCES payment_types(id),
    session_id UUID NOT NULL REFERENCES academic_sessions(id),
    term_id UUID NOT NULL REFERENCES terms(id),
    amount NUMERIC(14, 2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_outstanding_balances UNIQUE (student_id, payment_type_id, session_id, term_id),
    CONSTRAINT chk_outstanding_amount CHECK (amount > 0)
);

CREATE TABLE receipts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    receipt_number VARCHAR(11) NOT NULL UNIQUE,
    student_id UUID NOT NULL REFERENCES students(id),
    payment_id UUID NOT NULL UNIQUE REFERENCES payments(id),
    discount_id UUID REFERENCES discounts(id) ON DELETE SET NULL,
    outstanding_id UUID REFERENCES outstanding_balances(id) ON DELETE SET NULL,
    enrollment_id UUID REFERENCES enrollments(id) ON DELETE SET NULL,
    amount_paid NUMERIC(14, 2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    receipt_id UUID NOT NULL UNIQUE REFERENCES receipts(id),
    payment_type_id UUID NOT NULL REFERENCES payment_types(id),
    student_id UUID NOT NULL REFERENCES students(id),
    account_id UUID NOT NULL REFERENCES accounts(id),
    discount_id UUID REFERENCES discounts(id) ON DELETE SET NULL,
    amount NUMERIC(14, 2) NOT NULL,
    transaction_type VARCHAR(16) NOT NULL,
    status VARCHAR(16) NOT NULL,
    payment_method VARCHAR(50) NOT NULL,
    description TEXT NOT NULL,
    transaction_date TIMESTAMPTZ NOT NULL DEFAULT now(),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_transactions_type CHECK (transaction_type IN ('income', 'expense')),
    CONSTRAINT chk_transactions_status CHECK (status IN ('pending', 'completed', 'canceled')),
    CONSTRAINT chk_transactions_amount CHECK (amount > 0)
);

CREATE INDEX idx_transactions_account ON transactions(account_id, transaction_date DESC);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS receipts CASCADE;
DROP TABLE IF EXISTS outstanding_balances CASCADE;
DROP TABLE IF EXISTS payments CASCADE;
DROP TABLE IF EXISTS discounts CASCADE;
DROP TABLE IF EXISTS payment_type_accounts CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS payment_types CASCADE;
DROP TABLE IF EXISTS enrollments CASCADE;
DROP TABLE IF EXISTS students CASCADE;
DROP TABLE IF EXISTS classes CASCADE;
DROP TABLE IF EXISTS terms CASCADE;
DROP TABLE IF EXISTS academic_sessions CASCADE;
";
