mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{inserted_id, TestServer, TestUser};

#[tokio::test]
async fn post_comment_ownership_scenario() -> Result<()> {
    let server = TestServer::start().await?;
    let (alice, bob) = (TestUser::new(), TestUser::new());

    let post = server.create_post(&alice.token, "hello").await?;
    let (status, detail) = server.get(&format!("/posts/{}", post)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["total_comments"], 0);
    assert_eq!(detail["total_likes"], 0);
    assert_eq!(detail["user_id"], alice.id.to_string());

    let (status, _) = server
        .post("/comments", &bob.token, json!({ "post_id": post, "description": "nice" }))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (_, detail) = server.get(&format!("/posts/{}", post)).await?;
    assert_eq!(detail["total_comments"], 1);
    assert_eq!(detail["comments"][0]["description"], "nice");
    assert_eq!(detail["comments"][0]["user_id"], bob.id.to_string());

    // Bob cannot delete Alice's post, and gets the same answer as for a missing id
    let (status, body) = server.delete(&format!("/posts/{}", post), &bob.token).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Post not found");

    let (status, _) = server.get(&format!("/posts/{}", post)).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn client_supplied_system_fields_are_ignored() -> Result<()> {
    let server = TestServer::start().await?;
    let user = TestUser::new();
    let forged = Uuid::new_v4();

    let (status, body) = server
        .post(
            "/posts",
            &user.token,
            json!({
                "id": forged,
                "user_id": forged,
                "created_at": "1999-01-01T00:00:00Z",
                "name": "mine",
                "description": "d"
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let id = inserted_id(&body)?;
    assert_ne!(id, forged.to_string());

    let (_, post) = server.get(&format!("/posts/{}", id)).await?;
    assert_eq!(post["user_id"], user.id.to_string());
    assert_ne!(post["created_at"], "1999-01-01T00:00:00Z");
    Ok(())
}

#[tokio::test]
async fn owner_updates_and_deletes() -> Result<()> {
    let server = TestServer::start().await?;
    let (owner, other) = (TestUser::new(), TestUser::new());
    let id = server.create_post(&owner.token, "draft").await?;
    let path = format!("/posts/{}", id);

    let (status, _) = server.put(&path, &other.token, json!({ "name": "hijack" })).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = server.put(&path, &owner.token, json!({ "name": "final" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Post updated successfully");

    let (_, post) = server.get(&path).await?;
    assert_eq!(post["name"], "final");
    assert_eq!(post["description"], "draft body");

    let (status, body) = server.delete(&path, &owner.token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Post deleted successfully");

    let (status, body) = server.get(&path).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn bad_input_is_rejected() -> Result<()> {
    let server = TestServer::start().await?;
    let user = TestUser::new();

    let (status, body) = server.post("/posts", &user.token, json!({ "name": "" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["name"].is_string());
    assert!(body["field_errors"]["description"].is_string());

    let res = server
        .client
        .post(server.url("/posts"))
        .bearer_auth(&user.token)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<serde_json::Value>().await?["code"], "INVALID_JSON");

    let (status, body) = server.get("/posts/not-a-uuid").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let id = server.create_post(&user.token, "p").await?;
    let (status, _) = server.put(&format!("/posts/{}", id), &user.token, json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}
