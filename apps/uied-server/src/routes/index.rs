//! Landing page with upload forms

use axum::{response::Html, routing::get, Router};

use crate::state::AppState;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>UIED Server</title></head>
<body>
    <form action="/infer" method="post" enctype="multipart/form-data">
        <input type="file" name="image" accept="image/*">
        <input type="submit" value="Upload Image">
    </form>
    <br>
    <form action="/render" method="post" enctype="multipart/form-data">
        <input type="file" name="image" accept="image/*">
        <input type="submit" value="Render Image">
    </form>
</body>
</html>
"#;

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}
