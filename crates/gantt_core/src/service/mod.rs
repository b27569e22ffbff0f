//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into chart-building and scheduling APIs.
//! - Keep consumers decoupled from storage details.

pub mod chart_service;
pub mod item_mapper;
pub mod schedule_service;
