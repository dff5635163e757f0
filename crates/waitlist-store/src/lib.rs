//! `PostgreSQL` persistence for the waitlist draw service.

pub mod pg_gateway;
pub mod schema;

pub use pg_gateway::PgPersistenceGateway;
