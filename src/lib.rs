pub mod api;
pub mod api_docs;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod models;
pub mod notifier;
pub mod seed;
pub mod services;
pub mod state;
pub mod tmdb;
