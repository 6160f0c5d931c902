mod categories;
mod dashboard;
mod training;
mod types;

pub use categories::{categories_page, create_category, delete_category};
pub use dashboard::dashboard;
pub use training::training_page;
