//! E-commerce data model with a unit-of-work repository, backed by sea-orm or
//! by an in-memory arena.

pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod migration;
pub mod models;
pub mod money;
pub mod password;
pub mod report;
pub mod repository;
pub mod seed;
pub mod telemetry;
