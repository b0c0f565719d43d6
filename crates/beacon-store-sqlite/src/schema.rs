//! SQL schema for the Beacon SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS components (
    component_id  TEXT PRIMARY KEY,
    display_name  TEXT NOT NULL
);

-- One row per label; the primary key keeps keys unique per component.
CREATE TABLE IF NOT EXISTS component_labels (
    component_id  TEXT NOT NULL REFERENCES components(component_id) ON DELETE CASCADE,
    key           TEXT NOT NULL,
    value         TEXT NOT NULL,
    PRIMARY KEY (component_id, key)
);

CREATE TABLE IF NOT EXISTS impact_types (
    impact_type_id TEXT PRIMARY KEY,
    display_name   TEXT NOT NULL,
    description    TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS severities (
    display_name  TEXT PRIMARY KEY,
    value         INTEGER NOT NULL UNIQUE CHECK (value BETWEEN 0 AND 100)
);

-- Phases are written a whole generation at a time and never touched again.
CREATE TABLE IF NOT EXISTS phases (
    generation  INTEGER NOT NULL CHECK (generation >= 1),
    ordinal     INTEGER NOT NULL CHECK (ordinal >= 0),
    name        TEXT NOT NULL,
    PRIMARY KEY (generation, ordinal)
);

CREATE TRIGGER IF NOT EXISTS phases_immutable_update
BEFORE UPDATE ON phases
BEGIN
    SELECT RAISE(ABORT, 'phase generations are immutable');
END;

CREATE TRIGGER IF NOT EXISTS phases_immutable_delete
BEFORE DELETE ON phases
BEGIN
    SELECT RAISE(ABORT, 'phase generations are immutable');
END;

-- Timestamps are fixed-width RFC 3339 UTC, so text order is time order.
CREATE TABLE IF NOT EXISTS incidents (
    incident_id       TEXT PRIMARY KEY,
    display_name      TEXT NOT NULL,
    description       TEXT NOT NULL DEFAULT '',
    began_at          TEXT NOT NULL,
    ended_at          TEXT,
    phase_generation  INTEGER NOT NULL,
    phase_order       INTEGER NOT NULL,
    FOREIGN KEY (phase_generation, phase_order) REFERENCES phases(generation, ordinal),
    CHECK (ended_at IS NULL OR ended_at >= began_at)
);

CREATE TABLE IF NOT EXISTS impacts (
    incident_id     TEXT NOT NULL REFERENCES incidents(incident_id) ON DELETE CASCADE,
    component_id    TEXT NOT NULL REFERENCES components(component_id),
    impact_type_id  TEXT NOT NULL REFERENCES impact_types(impact_type_id),
    severity        INTEGER NOT NULL CHECK (severity BETWEEN 0 AND 100),
    PRIMARY KEY (incident_id, component_id, impact_type_id)
);

-- Updates are appended with ordinal = max + 1; deleted ordinals stay gaps.
CREATE TABLE IF NOT EXISTS incident_updates (
    incident_id   TEXT NOT NULL REFERENCES incidents(incident_id) ON DELETE CASCADE,
    ordinal       INTEGER NOT NULL CHECK (ordinal >= 0),
    display_name  TEXT NOT NULL,
    description   TEXT NOT NULL DEFAULT '',
    created_at    TEXT NOT NULL,
    PRIMARY KEY (incident_id, ordinal)
);

CREATE INDEX IF NOT EXISTS labels_kv_idx        ON component_labels(key, value);
CREATE INDEX IF NOT EXISTS impacts_component_idx ON impacts(component_id);
CREATE INDEX IF NOT EXISTS incidents_window_idx ON incidents(began_at, ended_at);
CREATE INDEX IF NOT EXISTS incidents_phase_idx  ON incidents(phase_generation, phase_order);

PRAGMA user_version = 1;
";
