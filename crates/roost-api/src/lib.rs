pub mod auth;
pub mod checklists;
pub mod error;
pub mod middleware;
pub mod species;
pub mod stats;
