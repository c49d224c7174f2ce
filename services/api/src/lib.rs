//! College management service: accounts, sessions, multi-strategy
//! authentication, attendance with QR codes, and the campus catalog
//! (departments, subjects, timetable, events, notes).

pub mod attendance;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod password;
pub mod routes;
pub mod state;
pub mod storage;
pub mod validation;
