//! anime-harvest - resumable anime metadata and watch-list harvester.
//!
//! Drives a browser session through an anime ranking and through the watch
//! lists of recently active forum users, appending what it reads to CSV files
//! that survive interruption. The files can then be loaded into SQLite and
//! reshaped into a user x title score matrix.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod extract;
pub mod harvest;
pub mod models;
pub mod repository;
pub mod scrapers;
pub mod storage;
