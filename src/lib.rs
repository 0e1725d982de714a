//! Minilog - a small multi-user item catalog
//!
//! This library provides the core functionality for the minilog catalog
//! application: users sign up or log in (locally or through Facebook OAuth),
//! create categories, and post items inside them. Categories and items can
//! only be edited or deleted by their author.

pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod web;
