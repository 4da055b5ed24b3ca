//! SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema includes:
/// - auth tables owned by the session library (`user`, `session`, `account`, `verification`)
/// - `agent` and `meetings` (per-user, cascading on user delete)
/// - `orders` and `payments` (amounts in integer cents)
///
/// Timestamps are RFC 3339 UTC text, so lexical order equals time order.
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Auth (session library)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS "user" (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    email_verified INTEGER NOT NULL DEFAULT 0,
    image TEXT NULL,
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL  -- RFC3339
);

CREATE TABLE IF NOT EXISTS session (
    id TEXT PRIMARY KEY NOT NULL,
    expires_at TEXT NOT NULL,
    token TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    ip_address TEXT NULL,
    user_agent TEXT NULL,
    user_id TEXT NOT NULL REFERENCES "user"(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_session_user ON session(user_id);

CREATE TABLE IF NOT EXISTS account (
    id TEXT PRIMARY KEY NOT NULL,
    account_id TEXT NOT NULL,
    provider_id TEXT NOT NULL,
    user_id TEXT NOT NULL REFERENCES "user"(id) ON DELETE CASCADE,
    access_token TEXT NULL,
    refresh_token TEXT NULL,
    id_token TEXT NULL,
    access_token_expires_at TEXT NULL,
    refresh_token_expires_at TEXT NULL,
    scope TEXT NULL,
    password TEXT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS verification (
    id TEXT PRIMARY KEY NOT NULL,
    identifier TEXT NOT NULL,
    value TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    created_at TEXT NULL,
    updated_at TEXT NULL
);

-- ---------------------------------------------------------------------------
-- Agents and meetings
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS agent (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    user_id TEXT NOT NULL REFERENCES "user"(id) ON DELETE CASCADE,
    instructions TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_agent_user ON agent(user_id);

CREATE TABLE IF NOT EXISTS meetings (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    user_id TEXT NOT NULL REFERENCES "user"(id) ON DELETE CASCADE,
    agent_id TEXT NOT NULL REFERENCES agent(id) ON DELETE CASCADE,
    status TEXT NOT NULL DEFAULT 'upcoming'
        CHECK (status IN ('upcoming', 'active', 'completed', 'cancelled', 'processing')),
    started_at TEXT NULL,
    ended_at TEXT NULL,
    transcript_url TEXT NULL,
    recording_url TEXT NULL,
    summary TEXT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_meetings_user ON meetings(user_id);

-- ---------------------------------------------------------------------------
-- Orders (amount in cents)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS orders (
    id TEXT PRIMARY KEY NOT NULL,
    customer_name TEXT NOT NULL,
    customer_email TEXT NOT NULL,
    product_name TEXT NOT NULL,
    amount INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'completed', 'cancelled')),
    payment_method TEXT NULL,
    notes TEXT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_orders_created ON orders(created_at);

-- ---------------------------------------------------------------------------
-- Payments (amount in cents)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS payments (
    id TEXT PRIMARY KEY NOT NULL,
    polar_payment_id TEXT NULL UNIQUE,
    polar_order_id TEXT NULL,
    polar_customer_id TEXT NULL,
    customer_name TEXT NOT NULL,
    customer_email TEXT NOT NULL,
    amount INTEGER NOT NULL,
    currency TEXT NOT NULL DEFAULT 'USD',
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'processing', 'succeeded', 'failed', 'cancelled', 'refunded')),
    payment_method TEXT NULL,
    payment_intent_id TEXT NULL,
    subscription_id TEXT NULL,
    product_name TEXT NULL,
    metadata TEXT NULL,           -- JSON
    polar_webhook_data TEXT NULL, -- raw upstream JSON
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    processed_at TEXT NULL,
    synced_from_polar INTEGER NOT NULL DEFAULT 0,
    last_sync_at TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_payments_created ON payments(created_at);
CREATE INDEX IF NOT EXISTS idx_payments_polar_order ON payments(polar_order_id);
CREATE INDEX IF NOT EXISTS idx_payments_subscription ON payments(subscription_id);
"#;
