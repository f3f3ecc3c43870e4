pub mod config;
pub mod controllers;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pages;
pub mod services;
pub mod startup;

use pages::PageRegistry;
use std::sync::Arc;

/// Shared application state: every open browser page.
#[derive(Clone)]
pub struct AppState {
    pub pages: Arc<PageRegistry>,
}

impl AppState {
    pub fn new(pages: Arc<PageRegistry>) -> Self {
        Self { pages }
    }
}
