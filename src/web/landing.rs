use axum::{
    extract::State,
    http::HeaderMap,
    response::{Html, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    backend::BackendUser,
    web::{
        AppState,
        auth::forwarded_cookies,
        escape_html,
        gate::{AccessRequirement, require_access, with_profile},
        models::Profile,
        templates::{PageLayout, render_page},
    },
};

pub async fn landing_page(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Html<String>, Response> {
    let viewer = require_access(&state, &jar, AccessRequirement::Authenticated).await?;
    let viewer = with_profile(&state, viewer).await;

    let cookies = forwarded_cookies(&headers);
    let backend_user = state.backend().current_user(cookies.as_deref()).await;

    Ok(Html(render_landing(
        &viewer.identity.username,
        backend_user.as_ref(),
        viewer.profile.as_ref(),
    )))
}

fn render_landing(
    username: &str,
    backend_user: Option<&BackendUser>,
    profile: Option<&Profile>,
) -> String {
    let is_admin = profile.is_some_and(Profile::is_admin);
    let greeting_name = backend_user
        .map(BackendUser::display_name)
        .or_else(|| profile.and_then(|profile| profile.display_name.clone()))
        .unwrap_or_else(|| username.to_string());

    let mut links = vec![
        ("Library", "Browse every book in the collection.", "/library"),
        ("Calendar", "Upcoming readings, classes and events.", "/calendar"),
    ];
    if is_admin {
        links.push(("Categories", "Arrange the library's categories.", "/categories"));
        links.push(("Training modules", "Review staff training progress.", "/training"));
    }

    let cards = links
        .iter()
        .map(|(title, description, href)| {
            format!(
                r#"<a class="panel" href="{href}"><h2>{title}</h2><p>{description}</p></a>"#
            )
        })
        .collect::<String>();

    render_page(PageLayout {
        title: "Welcome",
        viewer_name: Some(username),
        show_admin_link: is_admin,
        flash_html: String::new(),
        body_html: format!(
            "<p>Hello, <strong>{name}</strong>.</p>{cards}",
            name = escape_html(&greeting_name),
        ),
    })
}
