//! Core types and service wiring for the binday collection calendar exporter.

/// Render bin collections as an iCalendar document.
pub mod calendar;
/// Pull (bin label, date) pairs out of scraped page text.
pub mod extract;
/// Domain models and identifiers shared by all providers.
pub mod model;
/// Registry for plugging council-specific providers into the service.
pub mod plugin;
/// Traits describing the provider interfaces.
pub mod ports;
/// High-level service facade used by clients.
pub mod service;

pub use calendar::*;
pub use extract::*;
pub use model::*;
pub use plugin::*;
pub use ports::*;
pub use service::*;
