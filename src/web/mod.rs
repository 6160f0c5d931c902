pub mod admin;
pub mod admin_utils;
pub mod auth;
pub mod calendar;
pub mod data;
pub mod gate;
pub mod landing;
pub mod library;
pub mod models;
pub mod proxy;
pub mod responses;
pub mod router;
pub mod state;
pub mod templates;
#[cfg(test)]
mod test_support;

pub use state::AppState;
pub use templates::{escape_html, render_login_page};
