//! # Adswatch
//!
//! Reconciles a registry of web portals against the `ads.txt`
//! authorized-sellers file each portal is expected to publish: fetch, parse,
//! atomically replace the stored records, and notify portal admins when no
//! file is found.

pub mod adstxt;
pub mod config;
pub mod crawler;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod repositories;
pub mod response;
pub mod server;
pub mod telemetry;
pub use migration;
