use axum::{
    extract::State,
    response::{Html, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::web::{
    AppState,
    data::{fetch_books, fetch_categories},
    escape_html,
    gate::{AccessRequirement, Viewer, require_access, with_profile},
    models::{Book, Category},
    templates::{PageLayout, empty_state, render_page},
};

pub async fn library_page(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Html<String>, Response> {
    let viewer = require_access(&state, &jar, AccessRequirement::Authenticated).await?;
    let viewer = with_profile(&state, viewer).await;
    let books = fetch_books(state.records()).await;
    let categories = fetch_categories(state.records()).await;

    Ok(Html(render_library(&viewer, &books, &categories)))
}

fn category_name(categories: &[Category], category_id: Option<i64>) -> &str {
    category_id
        .and_then(|id| categories.iter().find(|category| category.id == id))
        .map_or("", |category| category.name.as_str())
}

fn render_library(viewer: &Viewer, books: &[Book], categories: &[Category]) -> String {
    let body = if books.is_empty() {
        empty_state("No books in the library yet.")
    } else {
        let rows = books
            .iter()
            .map(|book| {
                format!(
                    "<tr><td>{title}</td><td>{author}</td><td>{category}</td><td>{description}</td></tr>",
                    title = escape_html(&book.title),
                    category = escape_html(category_name(categories, book.category_id)),
                    author = escape_html(book.author.as_deref().unwrap_or("—")),
                    description = escape_html(book.description.as_deref().unwrap_or("")),
                )
            })
            .collect::<String>();
        format!(
            "<table><thead><tr><th>Title</th><th>Author</th><th>Category</th><th>About</th></tr></thead><tbody>{rows}</tbody></table>"
        )
    };

    render_page(PageLayout {
        title: "Library",
        viewer_name: Some(&viewer.identity.username),
        show_admin_link: viewer.is_admin(),
        flash_html: String::new(),
        body_html: format!(r#"<section class="panel">{body}</section>"#),
    })
}
