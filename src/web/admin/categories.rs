use axum::{
    extract::{Form, Query, State},
    response::{Html, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::{
    store::{Filter, StoreError},
    web::{
        AppState,
        admin_utils::compose_flash_message,
        data::{DomainRecord, fetch_categories},
        escape_html,
        gate::{AccessRequirement, Viewer, require_access},
        models::Category,
        templates::{PageLayout, empty_state, render_page},
    },
};

use super::types::FlashQuery;

#[derive(Deserialize)]
pub(crate) struct CreateCategoryForm {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    order: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct DeleteCategoryForm {
    id: String,
}

pub async fn categories_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<FlashQuery>,
) -> Result<Html<String>, Response> {
    let viewer = require_access(&state, &jar, AccessRequirement::Admin).await?;
    let categories = fetch_categories(state.records()).await;

    Ok(Html(render_categories(&viewer, &categories, &params)))
}

pub async fn create_category(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CreateCategoryForm>,
) -> Result<Redirect, Response> {
    let _admin = require_access(&state, &jar, AccessRequirement::Admin).await?;

    let name = form.name.trim();
    if name.is_empty() {
        return Ok(Redirect::to("/categories?error=missing_name"));
    }

    let description = form
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let order = match form.order.as_deref().map(str::trim).filter(|o| !o.is_empty()) {
        Some(raw) => match raw.parse::<i32>() {
            Ok(order) => order,
            Err(_) => return Ok(Redirect::to("/categories?error=invalid_order")),
        },
        None => next_order(&fetch_categories(state.records()).await),
    };

    let result = state
        .records()
        .insert(
            Category::TABLE,
            json!({
                "name": name,
                "description": description,
                "order": order,
            }),
        )
        .await;

    match result {
        Ok(()) => Ok(Redirect::to("/categories?status=category_created")),
        Err(StoreError::Conflict(_)) => Ok(Redirect::to("/categories?error=duplicate")),
        Err(err) => {
            error!(?err, "failed to create category");
            Ok(Redirect::to("/categories?error=unknown"))
        }
    }
}

pub async fn delete_category(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<DeleteCategoryForm>,
) -> Result<Redirect, Response> {
    let _admin = require_access(&state, &jar, AccessRequirement::Admin).await?;

    let Ok(id) = form.id.trim().parse::<i64>() else {
        return Ok(Redirect::to("/categories?error=invalid_id"));
    };

    match state
        .records()
        .delete(Category::TABLE, &Filter::eq("id", id))
        .await
    {
        Ok(0) => Ok(Redirect::to("/categories?error=category_missing")),
        Ok(_) => Ok(Redirect::to("/categories?status=category_deleted")),
        Err(err) => {
            error!(?err, category_id = id, "failed to delete category");
            Ok(Redirect::to("/categories?error=unknown"))
        }
    }
}

/// Position after the current last category.
fn next_order(categories: &[Category]) -> i32 {
    categories
        .iter()
        .map(|category| category.order)
        .max()
        .map_or(1, |max| max + 1)
}

fn render_categories(viewer: &Viewer, categories: &[Category], params: &FlashQuery) -> String {
    let list = if categories.is_empty() {
        empty_state("No categories yet.")
    } else {
        let rows = categories
            .iter()
            .map(|category| {
                format!(
                    r#"<tr><td>{order}</td><td>{name}</td><td>{description}</td><td><form method="post" action="/categories/delete"><input type="hidden" name="id" value="{id}"><button type="submit">Delete</button></form></td></tr>"#,
                    order = category.order,
                    name = escape_html(&category.name),
                    description = escape_html(category.description.as_deref().unwrap_or("")),
                    id = category.id,
                )
            })
            .collect::<String>();
        format!(
            "<table><thead><tr><th>#</th><th>Name</th><th>Description</th><th></th></tr></thead><tbody>{rows}</tbody></table>"
        )
    };

    let body = format!(
        r#"<section class="panel">{list}</section>
        <section class="panel">
            <h2>New category</h2>
            <form method="post" action="/categories">
                <p><label for="name">Name</label><br><input id="name" name="name" required></p>
                <p><label for="description">Description</label><br><input id="description" name="description"></p>
                <p><label for="order">Position</label><br><input id="order" name="order" inputmode="numeric"></p>
                <button type="submit">Create</button>
            </form>
        </section>"#
    );

    render_page(PageLayout {
        title: "Categories",
        viewer_name: Some(&viewer.identity.username),
        show_admin_link: viewer.is_admin(),
        flash_html: compose_flash_message(params.status.as_deref(), params.error.as_deref()),
        body_html: body,
    })
}
