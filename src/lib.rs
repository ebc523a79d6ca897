//! Task, epic and subtask tracking with derived epic status, a recently viewed
//! history and a conflict-checked schedule.
//!
//! The core lives in [`manager`]. [`db`] shares it between threads and saves it
//! to a file, and [`api`] serves it over HTTP.

pub mod api;
pub mod config;
pub mod db;
pub mod manager;
pub mod models;
