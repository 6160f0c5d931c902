use axum::{
    extract::{Query, State},
    response::{Html, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::web::{
    AppState,
    data::fetch_training_modules,
    escape_html,
    gate::{AccessRequirement, Viewer, require_access},
    models::TrainingModule,
    templates::{PageLayout, empty_state, render_page},
};

/// Which training module the page is focused on. Carried in the query
/// string so every request states its own selection.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ModuleSelection {
    #[serde(default, rename = "module")]
    pub requested: Option<i64>,
}

impl ModuleSelection {
    /// The requested module if it exists, otherwise the first one.
    pub fn resolve<'a>(&self, modules: &'a [TrainingModule]) -> Option<&'a TrainingModule> {
        self.requested
            .and_then(|id| modules.iter().find(|module| module.id == id))
            .or_else(|| modules.first())
    }
}

pub async fn training_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(selection): Query<ModuleSelection>,
) -> Result<Html<String>, Response> {
    let viewer = require_access(&state, &jar, AccessRequirement::Admin).await?;
    let modules = fetch_training_modules(state.records()).await;

    Ok(Html(render_training(&viewer, &modules, selection)))
}

fn render_training(
    viewer: &Viewer,
    modules: &[TrainingModule],
    selection: ModuleSelection,
) -> String {
    let body = match selection.resolve(modules) {
        None => empty_state("No training modules yet."),
        Some(selected) => {
            let rows = modules
                .iter()
                .map(|module| {
                    let class = if module.id == selected.id {
                        r#" class="selected""#
                    } else {
                        ""
                    };
                    format!(
                        r#"<tr{class}><td><a href="/training?module={id}">{title}</a></td><td>{progress}%</td></tr>"#,
                        id = module.id,
                        title = escape_html(&module.title),
                        progress = module.progress.clamp(0, 100),
                    )
                })
                .collect::<String>();

            format!(
                r#"<section class="panel"><table><thead><tr><th>Module</th><th>Progress</th></tr></thead><tbody>{rows}</tbody></table></section>
        <section class="panel" id="module-detail"><h2>{title}</h2><p>{description}</p><progress max="100" value="{progress}"></progress></section>"#,
                title = escape_html(&selected.title),
                description = escape_html(selected.description.as_deref().unwrap_or("")),
                progress = selected.progress.clamp(0, 100),
            )
        }
    };

    render_page(PageLayout {
        title: "Training modules",
        viewer_name: Some(&viewer.identity.username),
        show_admin_link: viewer.is_admin(),
        flash_html: String::new(),
        body_html: body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::web::state::test_support::state_with;
    use crate::web::test_support::{body_text, location, signed_in};
    use axum::{http::StatusCode, response::IntoResponse};
    use serde_json::json;
    use std::sync::Arc;

    fn module(id: i64, order: i32) -> TrainingModule {
        TrainingModule {
            id,
            title: format!("module {id}"),
            description: None,
            progress: 0,
            order,
        }
    }

    #[test]
    fn selection_prefers_requested_module() {
        let modules = vec![module(1, 1), module(2, 2)];
        let selection = ModuleSelection { requested: Some(2) };
        assert_eq!(selection.resolve(&modules).map(|m| m.id), Some(2));
    }

    #[test]
    fn unknown_or_absent_selection_falls_back_to_first() {
        let modules = vec![module(5, 1), module(6, 2)];
        assert_eq!(
            ModuleSelection { requested: Some(99) }
                .resolve(&modules)
                .map(|m| m.id),
            Some(5)
        );
        assert_eq!(
            ModuleSelection::default().resolve(&modules).map(|m| m.id),
            Some(5)
        );
        assert!(ModuleSelection::default().resolve(&[]).is_none());
    }

    #[tokio::test]
    async fn non_admin_is_sent_home_without_fetching() {
        let store = Arc::new(MemoryStore::new());
        let jar = signed_in(&store, Some("user"));
        let state = state_with(store.clone());

        let response = training_page(State(state), jar, Query(ModuleSelection::default()))
            .await
            .into_response();

        assert_eq!(location(&response), "/");
        assert_eq!(store.selects_for("training_modules"), 0);
    }

    #[tokio::test]
    async fn admin_sees_selected_module_detail() {
        let store = Arc::new(MemoryStore::new());
        store.seed_rows(
            "training_modules",
            vec![
                json!({"id": 1, "title": "Cataloguing", "order": 1, "progress": 40}),
                json!({"id": 2, "title": "Lending desk", "order": 2, "progress": 150}),
            ],
        );
        let jar = signed_in(&store, Some("admin"));
        let state = state_with(store);

        let response = training_page(
            State(state),
            jar,
            Query(ModuleSelection { requested: Some(2) }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains(r#"<h2>Lending desk</h2>"#));
        assert!(body.contains(r#"value="100""#));
    }
}
