use chrono::{Datelike, Utc};

const PORTAL_NAME: &str = "Library Portal";

const BASE_STYLES: &str = r#"
        :root { color-scheme: light; }
        body { font-family: "Helvetica Neue", Arial, sans-serif; margin: 0; background: #f8fafc; color: #0f172a; min-height: 100vh; display: flex; flex-direction: column; }
        header { background: #ffffff; padding: 1.5rem; border-bottom: 1px solid #e2e8f0; display: flex; justify-content: space-between; align-items: center; flex-wrap: wrap; gap: 1rem; }
        header h1 { margin: 0; font-size: 1.6rem; }
        nav { display: flex; gap: 0.75rem; flex-wrap: wrap; align-items: center; }
        nav a { color: #1d4ed8; text-decoration: none; font-weight: 600; }
        nav .admin-link { background: #fee2e2; border: 1px solid #fecaca; padding: 0.35rem 0.8rem; border-radius: 999px; color: #0f172a; }
        nav form button { padding: 0.45rem 1rem; border: none; border-radius: 999px; background: #2563eb; color: #ffffff; font-weight: 600; cursor: pointer; }
        main { flex: 1; padding: 2rem 1.5rem; max-width: 960px; margin: 0 auto; width: 100%; box-sizing: border-box; }
        .panel { background: #ffffff; border-radius: 12px; border: 1px solid #e2e8f0; padding: 1.5rem; margin-bottom: 1.5rem; }
        .flash { padding: 1rem 1.25rem; border-radius: 10px; margin-bottom: 1.5rem; font-weight: 600; }
        .flash.success { background: #ecfdf3; color: #166534; }
        .flash.error { background: #fef2f2; color: #b91c1c; }
        .empty { color: #64748b; font-style: italic; }
        table { width: 100%; border-collapse: collapse; }
        th, td { padding: 0.6rem 0.8rem; border-bottom: 1px solid #e2e8f0; text-align: left; }
        .selected { background: #e0f2fe; }
        .app-footer { margin-top: 3rem; text-align: center; font-size: 0.85rem; color: #94a3b8; }
"#;

pub struct PageLayout<'a> {
    pub title: &'a str,
    pub viewer_name: Option<&'a str>,
    pub show_admin_link: bool,
    pub flash_html: String,
    pub body_html: String,
}

pub fn render_page(layout: PageLayout<'_>) -> String {
    let PageLayout {
        title,
        viewer_name,
        show_admin_link,
        flash_html,
        body_html,
    } = layout;

    let nav = match viewer_name {
        Some(name) => {
            let admin_link = if show_admin_link {
                r#"<a class="admin-link" href="/dashboard">Admin</a>"#
            } else {
                ""
            };
            format!(
                r#"<nav><a href="/">Home</a><a href="/library">Library</a><a href="/calendar">Calendar</a>{admin_link}<span>Signed in as <strong>{name}</strong></span><form method="post" action="/logout"><button type="submit">Sign out</button></form></nav>"#,
                name = escape_html(name),
            )
        }
        None => r#"<nav><a href="/login">Sign in</a></nav>"#.to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title} · {portal}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="robots" content="noindex,nofollow">
    <style>
{styles}
    </style>
</head>
<body>
    <header>
        <h1>{title}</h1>
        {nav}
    </header>
    <main>
        {flash_html}
        {body_html}
        {footer}
    </main>
</body>
</html>"#,
        title = escape_html(title),
        portal = PORTAL_NAME,
        styles = BASE_STYLES,
        footer = render_footer(),
    )
}

pub fn render_login_page() -> String {
    let body = r#"<section class="panel">
            <p>Sign in with the account issued by the library staff.</p>
            <form method="post" action="/login">
                <p><label for="username">Username</label><br><input id="username" name="username" required></p>
                <p><label for="password">Password</label><br><input id="password" type="password" name="password" required></p>
                <button type="submit">Sign in</button>
            </form>
        </section>"#;

    render_page(PageLayout {
        title: "Sign in",
        viewer_name: None,
        show_admin_link: false,
        flash_html: String::new(),
        body_html: body.to_string(),
    })
}

pub fn render_footer() -> String {
    format!(
        r#"<footer class="app-footer">© {year} {portal}</footer>"#,
        year = Utc::now().year(),
        portal = PORTAL_NAME,
    )
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Placeholder row body used when a list has nothing to show.
pub fn empty_state(message: &str) -> String {
    format!(r#"<p class="empty">{}</p>"#, escape_html(message))
}
