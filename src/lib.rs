/// Process studio: authoring backend for AI processes
///
/// Models, agents, tools and tasks are stored through a table gateway; processes
/// tie them together as a graph of workflow steps built with a wizard or a
/// free-form canvas.

// Environment configuration
pub mod config;

// Table gateway over SQLite
pub mod gateway;

// Record shapes, one per table
pub mod records;

// List/create/edit/delete state for record pages
pub mod manager;

// Controlled-input record forms
pub mod forms;

// Read-only list pages
pub mod pages;

// Process wizard, canvas builder and graph persistence
pub mod workflow;

// HTTP API layer
pub mod api;

// Server setup and initialization
pub mod server;

pub use config::Config;
pub use gateway::{Gateway, GatewayError, SqliteGateway};
pub use server::start_server;
pub use workflow::{ProcessData, ProcessWizard};
