//! Minimal landing page listing the matching pools.

use axum::extract::State;
use axum::response::Html;
use tera::{Context, Tera};

use crate::error::ApiError;
use crate::state::AppState;

const HOME_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>matchbot</title>
</head>
<body>
  <h1>matchbot</h1>
  <p>Pairing people for 1:1 meetups, one round at a time.</p>
  {% if pools | length > 0 %}
  <h2>Pools</h2>
  <ul>
    {% for pool in pools %}
    <li>{{ pool.name }} &mdash; {{ pool.channel_name }}</li>
    {% endfor %}
  </ul>
  {% else %}
  <p>No pools yet.</p>
  {% endif %}
</body>
</html>
"#;

pub async fn home(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let pools = state
        .repos
        .pools
        .list_all()
        .await
        .map_err(|error| ApiError::Internal(error.to_string()))?;

    let mut context = Context::new();
    context.insert("pools", &pools);
    let html = Tera::one_off(HOME_TEMPLATE, &context, true)
        .map_err(|error| ApiError::Internal(format!("template rendering failed: {error}")))?;
    Ok(Html(html))
}
