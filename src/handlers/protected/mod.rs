// handlers/protected/mod.rs - Protected handlers (verified session required)
//
// Security Level: session token (cookie or Bearer)
// Middleware: require_identity injects the CallerIdentity extension; a request
// without a verified identity never reaches these handlers.

pub mod bookings;

pub use bookings::client_bookings_get;
