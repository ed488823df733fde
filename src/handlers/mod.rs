// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth): post reads plus service info and health.
// Protected (JWT auth): every create, update and delete, and comment/like reads.
pub mod protected;
pub mod public;
pub mod utils;
