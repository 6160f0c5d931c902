use axum::{
    extract::State,
    response::{Html, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Datelike;

use crate::web::{
    AppState,
    data::fetch_calendar_events,
    escape_html,
    gate::{AccessRequirement, Viewer, require_access, with_profile},
    models::CalendarEvent,
    templates::{PageLayout, empty_state, render_page},
};

pub async fn calendar_page(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Html<String>, Response> {
    let viewer = require_access(&state, &jar, AccessRequirement::Authenticated).await?;
    let viewer = with_profile(&state, viewer).await;
    let events = fetch_calendar_events(state.records()).await;

    Ok(Html(render_calendar(&viewer, &events)))
}

/// Splits date-ordered events into runs sharing a calendar month.
fn group_by_month(events: &[CalendarEvent]) -> Vec<((i32, u32), &[CalendarEvent])> {
    let mut groups = Vec::new();
    let mut start = 0;
    for idx in 1..=events.len() {
        let boundary = idx == events.len()
            || (events[idx].date.year(), events[idx].date.month())
                != (events[start].date.year(), events[start].date.month());
        if boundary {
            let month = (events[start].date.year(), events[start].date.month());
            groups.push((month, &events[start..idx]));
            start = idx;
        }
    }
    groups
}

fn render_calendar(viewer: &Viewer, events: &[CalendarEvent]) -> String {
    let body = if events.is_empty() {
        empty_state("No events scheduled.")
    } else {
        group_by_month(events)
            .into_iter()
            .map(|((year, month), run)| {
                let rows = run
                    .iter()
                    .map(|event| {
                        format!(
                            r#"<tr><td>{date}</td><td title="{description}">{title}</td><td>{kind}</td><td>{location}</td></tr>"#,
                            date = event.date.format("%a %d"),
                            title = escape_html(&event.title),
                            description = escape_html(event.description.as_deref().unwrap_or("")),
                            kind = escape_html(event.kind.as_deref().unwrap_or("")),
                            location = escape_html(event.location.as_deref().unwrap_or("")),
                        )
                    })
                    .collect::<String>();
                format!(
                    r#"<section class="panel"><h2>{year}-{month:02}</h2><table><tbody>{rows}</tbody></table></section>"#
                )
            })
            .collect::<String>()
    };

    render_page(PageLayout {
        title: "Calendar",
        viewer_name: Some(&viewer.identity.username),
        show_admin_link: viewer.is_admin(),
        flash_html: String::new(),
        body_html: body,
    })
}
