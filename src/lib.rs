//! Skyscore — astrophotography observability engine.
//!
//! Models atmospheric transparency (Beer-Lambert), moon-aware sky
//! brightness (Krisciunas-Schaefer style), refraction and jet-stream
//! seeing risk, scores each forecast hour on a fixed 100-point budget
//! with hard vetoes, and searches a 72-hour horizon for the best 2-hour
//! observation window.

pub mod celestial;
pub mod ephemeris;
pub mod forecast;
pub mod location;
pub mod optics;
pub mod providers;
pub mod score;
