//! Log message constants for infrastructure components
//!
//! This module centralizes the log messages used by the service so the
//! wording stays consistent between the server, the CLI and middleware.

/// Application startup and lifecycle messages
pub mod application {
    pub const STARTING: &str = "Starting unitrack";
    pub const STARTED_SUCCESSFULLY: &str = "Application started successfully";
    pub const STARTING_SERVER: &str = "Starting unitrack server";
    pub const SHUTTING_DOWN: &str = "Shutdown signal received, draining connections";
    pub const SIGNAL_UNAVAILABLE: &str = "Could not listen for the shutdown signal";
}

/// Database-related log messages
pub mod database {
    pub const CONNECTING: &str = "Connecting to database";
    pub const HEALTH_CHECK_FAILED: &str = "Database health check failed";
    pub const CONNECTION_ESTABLISHED: &str = "Database connection established";
    pub const MIGRATION_STARTED: &str = "Running database migrations";
    pub const MIGRATION_COMPLETED: &str = "Database migrations completed successfully";
    pub const MIGRATIONS_SKIPPED: &str = "Skipping migrations (database.run_migrations = false)";
}

/// Seed data written on start
pub mod bootstrap {
    pub const ADMIN_CREATED: &str = "Created administrator account";
    pub const ADMIN_PRESENT: &str = "Administrator account already present";
    pub const SETTINGS_SEEDED: &str = "Default system settings ensured";
    pub const COURSES_SEEDED: &str = "Courses ensured";
    pub const RECTOR_CREATED: &str = "Created rector account";
    pub const RECTOR_EXISTS: &str = "Username already exists, rector not created";
    pub const ABSENCES_RECALCULATED: &str = "Recalculated accumulated absence hours";
}

/// Sign-in and session messages
pub mod auth {
    pub const LOGIN_SUCCEEDED: &str = "Login succeeded";
    pub const LOGIN_FAILED: &str = "Login failed";
    pub const LOGGED_OUT: &str = "Session revoked on logout";
    pub const PASSWORD_CHANGED: &str = "Password changed";
    pub const TOKEN_REJECTED: &str = "Session token rejected";
    pub const ACCESS_DENIED: &str = "Role not allowed for this area";
    pub const HASH_UNVERIFIABLE: &str = "Stored password hash could not be verified";
}

/// Request/response processing messages
pub mod request_processing {
    pub const REQUEST_RECEIVED: &str = "Request received";
    pub const RESPONSE_RETURNED: &str = "Response returned";
    pub const SERVER_ERROR: &str = "Request failed with server error";
    pub const CLIENT_ERROR: &str = "Request failed with client error";
}

/// Journal writes
pub mod journal {
    pub const MARKS_APPLIED: &str = "Attendance marks applied";
    pub const MARKS_SKIPPED: &str = "Mark with hours outside 0..=8 skipped";
    pub const ABSENCE_JUSTIFIED: &str = "Absence justification updated";
    pub const MARK_SKIPPED: &str = "Mark for a student outside the group skipped";
    pub const DAY_SKIPPED: &str = "Day outside the editable week skipped";
    pub const WEEK_SAVED: &str = "Journal week saved";
}

/// Audit trail
pub mod audit {
    pub const WRITE_FAILED: &str = "Failed to write audit entry";
}

/// Configuration messages
pub mod configuration {
    pub const CONFIG_LOADED: &str = "Configuration loaded successfully";
    pub const DEFAULT_SECRET_IN_USE: &str =
        "auth.jwt_secret is the built-in development secret; set SECRET_KEY in production";
}
