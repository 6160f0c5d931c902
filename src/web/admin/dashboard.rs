use axum::{
    extract::State,
    response::{Html, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{NaiveDate, Utc};

use crate::web::{
    AppState,
    data::{fetch_books, fetch_calendar_events, fetch_categories, fetch_training_modules},
    escape_html,
    gate::{AccessRequirement, Viewer, require_access},
    models::CalendarEvent,
    templates::{PageLayout, render_page},
};

struct DashboardCounts {
    categories: usize,
    books: usize,
    modules: usize,
    events: usize,
}

pub async fn dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Html<String>, Response> {
    let viewer = require_access(&state, &jar, AccessRequirement::Admin).await?;

    let records = state.records();
    let categories = fetch_categories(records).await;
    let books = fetch_books(records).await;
    let modules = fetch_training_modules(records).await;
    let events = fetch_calendar_events(records).await;

    let counts = DashboardCounts {
        categories: categories.len(),
        books: books.len(),
        modules: modules.len(),
        events: events.len(),
    };
    let today = Utc::now().date_naive();

    Ok(Html(render_dashboard(
        &viewer,
        &counts,
        next_event(&events, today),
    )))
}

/// First event on or after `today`. `events` must be date-ordered.
fn next_event(events: &[CalendarEvent], today: NaiveDate) -> Option<&CalendarEvent> {
    events.iter().find(|event| event.date >= today)
}

fn render_dashboard(
    viewer: &Viewer,
    counts: &DashboardCounts,
    upcoming: Option<&CalendarEvent>,
) -> String {
    let cards = [
        ("Categories", counts.categories, "/categories"),
        ("Books", counts.books, "/library"),
        ("Training modules", counts.modules, "/training"),
        ("Events", counts.events, "/calendar"),
    ]
    .iter()
    .map(|(label, count, href)| {
        format!(r#"<tr><td><a href="{href}">{label}</a></td><td>{count}</td></tr>"#)
    })
    .collect::<String>();

    let upcoming = match upcoming {
        Some(event) => format!(
            "<p>Next event: <strong>{title}</strong> on {date}</p>",
            title = escape_html(&event.title),
            date = event.date,
        ),
        None => r#"<p class="empty">No upcoming events.</p>"#.to_string(),
    };

    render_page(PageLayout {
        title: "Admin dashboard",
        viewer_name: Some(&viewer.identity.username),
        show_admin_link: viewer.is_admin(),
        flash_html: String::new(),
        body_html: format!(
            r#"<section class="panel"><table><tbody>{cards}</tbody></table></section><section class="panel">{upcoming}</section>"#
        ),
    })
}
