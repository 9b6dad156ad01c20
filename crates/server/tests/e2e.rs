mod common;

use std::net::SocketAddr;

use reqwest::StatusCode as HttpStatusCode;
use serde_json::json;
use tokio::net::TcpListener;

use common::{TestDir, ADMIN_PASSWORD, ADMIN_USER};

struct TestApp {
    base_url: String,
    _dir: TestDir,
}

async fn start_server() -> anyhow::Result<TestApp> {
    let dir = TestDir::new();
    let app = server::build_app(&dir.config())?;
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });

    Ok(TestApp { base_url, _dir: dir })
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("reqwest client")
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = client().get(format!("{}/health", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_cookie_session_drives_crud() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = client();

    let res = c.get(format!("{}/api/databases", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);

    let res = c
        .post(format!("{}/auth/login", app.base_url))
        .json(&json!({"username": ADMIN_USER, "password": ADMIN_PASSWORD}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert!(res.headers().get("set-cookie").is_some());

    // Cookie store carries the session from here on.
    let res = c
        .post(format!("{}/api/database/users/record", app.base_url))
        .json(&json!({"name": "Alice"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let key = res.json::<serde_json::Value>().await?["key"].as_str().unwrap().to_string();

    let res = c.get(format!("{}/api/search/users?q=ali", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][key.as_str()]["name"], "Alice");

    let res = c.get(format!("{}/api/databases", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["databases"]["users"]["record_count"], 1);

    let res = c.post(format!("{}/auth/logout", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NO_CONTENT);
    Ok(())
}
