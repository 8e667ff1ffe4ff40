// handlers/mod.rs - two security tiers
//
// Public (no session) -> Protected (verified session required)
pub mod public;    // /, /health, /api/properties/*
pub mod protected; // /api/bookings/*

pub use protected::*;
pub use public::*;
