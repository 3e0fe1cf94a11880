#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::Router;
use tokio::net::TcpListener;

pub const NCS_MANIFEST: &str = r#"{
  "folders": [
    {
      "name": "ncs",
      "title": "NCS",
      "description": "Copyright free",
      "cover": "songs/ncs/cover.jpg",
      "songs": ["01 - Alpha_Song", "02_Beta (PenduJatt.Com.Se)", {"file": "Gamma.mp3"}]
    },
    { "name": "Chill Mix", "title": "Chill", "description": "", "songs": [] }
  ]
}"#;

/// Files keyed by raw (percent-encoded) request path.
type Files = Arc<HashMap<String, String>>;

async fn lookup(State(files): State<Files>, uri: Uri) -> (StatusCode, String) {
    match files.get(uri.path()) {
        Some(body) => (StatusCode::OK, body.clone()),
        None => (StatusCode::NOT_FOUND, "not found".to_string()),
    }
}

/// Serve `files` on an ephemeral localhost port; returns the origin.
pub async fn spawn_site(files: &[(&str, &str)]) -> String {
    let files: Files = Arc::new(
        files
            .iter()
            .map(|(path, body)| (path.to_string(), body.to_string()))
            .collect(),
    );
    let app = Router::new().fallback(lookup).with_state(files);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

/// An origin nothing is listening on.
pub async fn dead_origin() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
