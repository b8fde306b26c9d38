//! Business services sitting between the HTTP handlers and storage.

pub mod auth_service;
