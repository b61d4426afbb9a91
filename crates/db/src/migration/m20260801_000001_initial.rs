//! Initial schema for the settlement core.
//!
//! Creates the tiers, payments, tickets, balance_accounts, ledger_entries
//! and withdrawals tables. The invariants the repositories rely on are
//! also enforced here: non-negative balance buckets, capacity bounds, the
//! ledger deduplication keys, and the single-in-flight-withdrawal rule.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(INITIAL_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS ledger_entries CASCADE;
             DROP TABLE IF EXISTS withdrawals CASCADE;
             DROP TABLE IF EXISTS tickets CASCADE;
             DROP TABLE IF EXISTS payments CASCADE;
             DROP TABLE IF EXISTS balance_accounts CASCADE;
             DROP TABLE IF EXISTS tiers CASCADE;
             DROP TYPE IF EXISTS ledger_entry_type;
             DROP TYPE IF EXISTS payment_status;
             DROP TYPE IF EXISTS ticket_status;
             DROP TYPE IF EXISTS withdrawal_status;",
        )
        .await?;
        Ok(())
    }
}

const INITIAL_SQL: &str = r"
-- Enum types
CREATE TYPE ledger_entry_type AS ENUM ('sale', 'refund', 'withdrawal', 'chargeback');
CREATE TYPE payment_status AS ENUM ('pending', 'success', 'failed');
CREATE TYPE ticket_status AS ENUM ('active', 'checked_in', 'refunded', 'cancelled');
CREATE TYPE withdrawal_status AS ENUM ('pending', 'processing', 'completed', 'failed');

-- Ticket tiers (owned by the marketplace layer; settlement reads prices
-- and performs the guarded seat decrement)
CREATE TABLE tiers (
    id UUID PRIMARY KEY,
    organizer_id UUID NOT NULL,
    event_id UUID NOT NULL,
    name VARCHAR(120) NOT NULL,
    price NUMERIC(19, 4) NOT NULL,
    currency VARCHAR(3) NOT NULL DEFAULT 'NGN',
    buyer_pays_fee BOOLEAN NOT NULL DEFAULT false,
    capacity INTEGER NOT NULL,
    sold INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_tiers_price_non_negative CHECK (price >= 0),
    CONSTRAINT chk_tiers_capacity_non_negative CHECK (capacity >= 0),
    CONSTRAINT chk_tiers_sold_within_capacity CHECK (sold >= 0 AND sold <= capacity)
);

CREATE INDEX idx_tiers_organizer ON tiers(organizer_id);
CREATE INDEX idx_tiers_event ON tiers(event_id);

-- Payments created by the checkout flow, consumed by the settlement engine
CREATE TABLE payments (
    id UUID PRIMARY KEY,
    reference VARCHAR(64) NOT NULL,
    external_ref VARCHAR(128),
    tier_id UUID NOT NULL REFERENCES tiers(id),
    organizer_id UUID NOT NULL,
    buyer_email VARCHAR(254) NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    status payment_status NOT NULL DEFAULT 'pending',
    failure_reason TEXT,
    paid_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_payments_amount_non_negative CHECK (amount >= 0)
);

CREATE UNIQUE INDEX uq_payments_reference ON payments(reference);
CREATE UNIQUE INDEX uq_payments_external_ref ON payments(external_ref) WHERE external_ref IS NOT NULL;
CREATE INDEX idx_payments_status ON payments(status) WHERE status = 'pending';
CREATE INDEX idx_payments_organizer ON payments(organizer_id, created_at DESC);

-- Tickets issued by settlement
CREATE TABLE tickets (
    id UUID PRIMARY KEY,
    reference VARCHAR(32) NOT NULL,
    tier_id UUID NOT NULL REFERENCES tiers(id),
    organizer_id UUID NOT NULL,
    payment_reference VARCHAR(64) NOT NULL,
    status ticket_status NOT NULL DEFAULT 'active',
    checked_in_at TIMESTAMPTZ,
    checked_in_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_tickets_check_in_complete CHECK (
        (status = 'checked_in') = (checked_in_at IS NOT NULL AND checked_in_by IS NOT NULL)
    )
);

CREATE UNIQUE INDEX uq_tickets_reference ON tickets(reference);
CREATE INDEX idx_tickets_organizer ON tickets(organizer_id, created_at DESC);
CREATE INDEX idx_tickets_payment ON tickets(payment_reference);

-- Per-organizer balance buckets, created lazily on first sale
CREATE TABLE balance_accounts (
    organizer_id UUID PRIMARY KEY,
    pending NUMERIC(19, 4) NOT NULL DEFAULT 0,
    available NUMERIC(19, 4) NOT NULL DEFAULT 0,
    withdrawn NUMERIC(19, 4) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_balance_non_negative CHECK (
        pending >= 0 AND available >= 0 AND withdrawn >= 0
    )
);

CREATE INDEX idx_balance_pending ON balance_accounts(organizer_id) WHERE pending > 0;

-- Withdrawals; the partial unique index enforces one in-flight
-- withdrawal per organizer even under concurrent requests
CREATE TABLE withdrawals (
    id UUID PRIMARY KEY,
    organizer_id UUID NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    status withdrawal_status NOT NULL DEFAULT 'pending',
    otp_hash VARCHAR(64) NOT NULL,
    otp_expires_at TIMESTAMPTZ NOT NULL,
    otp_attempts INTEGER NOT NULL DEFAULT 0,
    account_number VARCHAR(32) NOT NULL,
    bank_code VARCHAR(16) NOT NULL,
    account_name VARCHAR(120) NOT NULL,
    external_transfer_ref VARCHAR(128),
    failure_reason TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_withdrawals_amount_positive CHECK (amount > 0)
);

CREATE UNIQUE INDEX uq_withdrawals_active ON withdrawals(organizer_id)
    WHERE status IN ('pending', 'processing');
CREATE UNIQUE INDEX uq_withdrawals_transfer_ref ON withdrawals(external_transfer_ref)
    WHERE external_transfer_ref IS NOT NULL;
CREATE INDEX idx_withdrawals_organizer ON withdrawals(organizer_id, created_at DESC);

-- Append-only ledger; the partial unique indexes back the deduplication
-- keys so a lost race surfaces as a constraint violation, never a
-- double credit
CREATE TABLE ledger_entries (
    id UUID PRIMARY KEY,
    organizer_id UUID NOT NULL,
    entry_type ledger_entry_type NOT NULL,
    credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    debit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    net_amount NUMERIC(19, 4) NOT NULL,
    ticket_id UUID REFERENCES tickets(id),
    withdrawal_id UUID REFERENCES withdrawals(id),
    external_ref VARCHAR(160),
    value_date TIMESTAMPTZ NOT NULL,
    pending_balance_after NUMERIC(19, 4) NOT NULL,
    available_balance_after NUMERIC(19, 4) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_ledger_one_sided CHECK (
        (credit > 0 AND debit = 0) OR (debit > 0 AND credit = 0)
    ),
    CONSTRAINT chk_ledger_net CHECK (net_amount = credit - debit)
);

CREATE UNIQUE INDEX uq_ledger_external_ref ON ledger_entries(organizer_id, external_ref)
    WHERE external_ref IS NOT NULL;
CREATE UNIQUE INDEX uq_ledger_ticket_action ON ledger_entries(organizer_id, ticket_id, entry_type)
    WHERE external_ref IS NULL AND ticket_id IS NOT NULL;
CREATE INDEX idx_ledger_organizer_value ON ledger_entries(organizer_id, value_date);
CREATE INDEX idx_ledger_organizer_type ON ledger_entries(organizer_id, entry_type);
";
