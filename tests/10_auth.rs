mod common;

use anyhow::Result;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use common::{TestServer, TestUser, SECRET};

async fn create_with_header(server: &TestServer, header: Option<&str>) -> Result<(StatusCode, Value)> {
    let mut req = server
        .client
        .post(server.url("/posts"))
        .json(&json!({ "name": "n", "description": "d" }));
    if let Some(value) = header {
        req = req.header("Authorization", value);
    }
    let res = req.send().await?;
    Ok((res.status(), res.json().await?))
}

#[tokio::test]
async fn missing_token_is_unauthorized() -> Result<()> {
    let server = TestServer::start().await?;

    let (status, body) = create_with_header(&server, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["message"], "Missing Authorization header");

    let (status, _) = create_with_header(&server, Some("Token abc")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = create_with_header(&server, Some("Bearer not.a.jwt")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn foreign_or_expired_tokens_are_rejected() -> Result<()> {
    let server = TestServer::start().await?;
    let now = chrono::Utc::now().timestamp();

    let sign = |secret: &str, claims: Value| {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    };

    let wrong_secret = sign("other-secret", json!({ "sub": Uuid::new_v4(), "iat": now, "exp": now + 3600 }));
    let expired = sign(SECRET, json!({ "sub": Uuid::new_v4(), "iat": now - 7200, "exp": now - 3600 }));
    let not_a_user = sign(SECRET, json!({ "sub": "alice", "iat": now, "exp": now + 3600 }));

    for token in [wrong_secret, expired, not_a_user] {
        let (status, body) = create_with_header(&server, Some(&format!("Bearer {}", token))).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", body);
    }
    Ok(())
}

#[tokio::test]
async fn only_post_reads_are_public() -> Result<()> {
    let server = TestServer::start().await?;
    let user = TestUser::new();
    let id = server.create_post(&user.token, "public").await?;

    for path in ["/posts".to_string(), format!("/posts/{}", id)] {
        let (status, _) = server.get(&path).await?;
        assert_eq!(status, StatusCode::OK, "GET {}", path);
    }

    let (status, body) = server.post("/likes", &user.token, json!({ "post_id": id })).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let like = common::inserted_id(&body)?;

    let gated = ["/comments".to_string(), "/likes".to_string(), format!("/likes/{}", like)];
    for path in &gated {
        let (status, body) = server.get(path).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "GET {}", path);
        assert_eq!(body["code"], "UNAUTHORIZED");

        let (status, _) = server.get_as(path, &user.token).await?;
        assert_eq!(status, StatusCode::OK, "GET {} with token", path);
    }
    Ok(())
}

#[tokio::test]
async fn unrouted_method_is_not_an_auth_failure() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server.client.put(server.url(&format!("/likes/{}", Uuid::new_v4()))).send().await?;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

    let res = server.client.patch(server.url("/posts")).send().await?;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    Ok(())
}
