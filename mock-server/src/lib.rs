use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Widget {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct CreateWidget {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct UpdateWidget {
    pub name: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub tag: Option<String>,
}

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub to: String,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Widget>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/widgets", get(list_widgets).post(create_widget))
        .route(
            "/widgets/{id}",
            get(get_widget).put(update_widget).delete(delete_widget),
        )
        .route("/redirect/{status}", any(redirect))
        .route("/loop", any(redirect_loop))
        .route("/echo", any(echo))
        .route("/failure", any(failure))
        .route("/garbage", get(garbage))
        .route("/empty", any(empty))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn validation_failed(fields: &[&str]) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "code": "validation_failed",
            "message": "widget is invalid",
            "fields": fields,
        })),
    )
        .into_response()
}

async fn list_widgets(State(db): State<Db>, Query(query): Query<ListQuery>) -> Json<Vec<Widget>> {
    let widgets = db.read().await;
    let mut found: Vec<Widget> = widgets
        .values()
        .filter(|w| query.tag.as_ref().map_or(true, |tag| w.tags.contains(tag)))
        .cloned()
        .collect();
    found.sort_by(|a, b| a.name.cmp(&b.name));
    Json(found)
}

async fn create_widget(State(db): State<Db>, Json(input): Json<CreateWidget>) -> Response {
    if input.name.trim().is_empty() {
        return validation_failed(&["name"]);
    }
    let widget = Widget {
        id: Uuid::new_v4(),
        name: input.name,
        tags: input.tags,
    };
    db.write().await.insert(widget.id, widget.clone());
    (StatusCode::CREATED, Json(widget)).into_response()
}

async fn get_widget(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Widget>, StatusCode> {
    let widgets = db.read().await;
    widgets.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_widget(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateWidget>,
) -> Response {
    if input.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return validation_failed(&["name"]);
    }
    let mut widgets = db.write().await;
    let Some(widget) = widgets.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let Some(name) = input.name {
        widget.name = name;
    }
    if let Some(tags) = input.tags {
        widget.tags = tags;
    }
    Json(widget.clone()).into_response()
}

async fn delete_widget(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let mut widgets = db.write().await;
    widgets.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

/// Answer with `status` and `Location: <to>`.
async fn redirect(Path(status): Path<u16>, Query(query): Query<RedirectQuery>) -> Response {
    match StatusCode::from_u16(status) {
        Ok(status) if status.is_redirection() => {
            (status, [(header::LOCATION, query.to)]).into_response()
        }
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn redirect_loop() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/loop")]).into_response()
}

/// Reflect the request back as JSON.
async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Value> {
    let header = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "contentType": header(header::CONTENT_TYPE),
        "accept": header(header::ACCEPT),
        "body": serde_json::from_str::<Value>(&body).ok(),
        "rawBody": body,
    }))
}

async fn failure() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "internal failure")
}

async fn garbage() -> &'static str {
    "not json"
}

async fn empty() -> StatusCode {
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widget_serializes_to_json() {
        let widget = Widget {
            id: Uuid::nil(),
            name: "Gear".to_string(),
            tags: vec!["metal".to_string()],
        };
        let json = serde_json::to_value(&widget).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["name"], "Gear");
        assert_eq!(json["tags"], json!(["metal"]));
    }

    #[test]
    fn create_widget_defaults_tags_to_empty() {
        let input: CreateWidget = serde_json::from_str(r#"{"name":"Gear"}"#).unwrap();
        assert_eq!(input.name, "Gear");
        assert!(input.tags.is_empty());
    }

    #[test]
    fn create_widget_rejects_missing_name() {
        let result: Result<CreateWidget, _> = serde_json::from_str(r#"{"tags":[]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_widget_all_fields_optional() {
        let input: UpdateWidget = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.name.is_none());
        assert!(input.tags.is_none());
    }
}
