pub mod api;
pub mod client;
pub mod components;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod pages;
pub mod player;
pub mod poll;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;
