//! Booking access layer: owner-only retrieval of bookings joined with their
//! property, normalized into one stable shape.

pub mod aliases;
pub mod assembler;
pub mod guard;
pub mod normalizer;
pub mod planner;
pub mod service;

pub use aliases::{AliasParseError, FieldAliases};
pub use assembler::{assemble, BookingsPayload, Diagnostics};
pub use guard::{authorize, Access};
pub use normalizer::{BookingView, PropertyView, ResultNormalizer};
pub use planner::{QueryPlanner, SemanticFilter};
pub use service::BookingService;
