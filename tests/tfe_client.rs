use tfc_migrate::StateVersionPayload;
use tfc_migrate::workspaces::tfe::{TfeClient, TfeError, TfeWorkspaces, VcsTokenSource};
use tfc_migrate::workspaces::{
    ApiVariant, VcsRepo, WorkspaceApi, WorkspaceError, WorkspaceRequest,
};
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> TfeClient {
    TfeClient::with_base_url(
        "atlasv1.test_token".to_string(),
        server.uri(),
        "acme".to_string(),
    )
    .unwrap()
}

fn workspace_response(id: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "id": id,
            "type": "workspaces",
            "attributes": { "name": name, "locked": false }
        }
    })
}

fn oauth_clients_response(clients: &[(&str, &str, &str)]) -> serde_json::Value {
    let data: Vec<serde_json::Value> = clients
        .iter()
        .map(|(id, name, token)| {
            serde_json::json!({
                "id": id,
                "type": "oauth-clients",
                "attributes": { "name": name, "service-provider": "github" },
                "relationships": {
                    "oauth-tokens": {
                        "data": [{ "id": token, "type": "oauth-tokens" }]
                    }
                }
            })
        })
        .collect();
    serde_json::json!({ "data": data })
}

#[tokio::test]
async fn test_get_organization_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/acme"))
        .and(header("authorization", "Bearer atlasv1.test_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "id": "acme", "type": "organizations", "attributes": { "name": "acme" } }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    client(&mock_server).get_organization().await.unwrap();
}

#[tokio::test]
async fn test_get_organization_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/acme"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "errors": [{ "status": "404", "title": "not found" }]
        })))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).get_organization().await;

    match result {
        Err(TfeError::NotFound { message }) => assert_eq!(message, "organization 'acme'"),
        other => panic!("Expected TfeError::NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_without_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/acme"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "errors": [{ "status": "401", "title": "unauthorized" }]
        })))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).get_organization().await;
    let error_string = format!("{:?}", result);

    assert!(matches!(result, Err(TfeError::Auth { .. })));
    assert!(
        !error_string.contains("atlasv1.test_token"),
        "Error output must not contain the token"
    );
}

#[tokio::test]
async fn test_create_workspace_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/organizations/acme/workspaces"))
        .and(header("content-type", "application/vnd.api+json"))
        .and(body_json(serde_json::json!({
            "data": {
                "type": "workspaces",
                "attributes": {
                    "name": "prod-ws",
                    "terraform-version": "1.5.0",
                    "working-directory": "infra/prod",
                    "vcs-repo": {
                        "identifier": "org/infra",
                        "oauth-token-id": "ot-abc",
                        "branch": "main",
                        "default-branch": true
                    }
                }
            }
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(workspace_response("ws-prod", "prod-ws")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = WorkspaceRequest {
        name: "prod-ws".to_string(),
        terraform_version: "1.5.0".to_string(),
        working_directory: "infra/prod".to_string(),
        vcs_repo: VcsRepo {
            identifier: "org/infra".to_string(),
            oauth_token_id: "ot-abc".to_string(),
            branch: "main".to_string(),
        },
    };

    let workspace = client(&mock_server)
        .create_workspace(&request)
        .await
        .unwrap();

    assert_eq!(workspace.id, "ws-prod");
    assert_eq!(workspace.name, "prod-ws");
}

#[tokio::test]
async fn test_create_workspace_duplicate_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/organizations/acme/workspaces"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "errors": [{
                "status": "422",
                "title": "invalid attribute",
                "detail": "Name has already been taken",
                "source": { "pointer": "/data/attributes/name" }
            }]
        })))
        .mount(&mock_server)
        .await;

    let request = WorkspaceRequest {
        name: "prod-ws".to_string(),
        terraform_version: "1.5.0".to_string(),
        working_directory: String::new(),
        vcs_repo: VcsRepo {
            identifier: "org/infra".to_string(),
            oauth_token_id: "ot-abc".to_string(),
            branch: "main".to_string(),
        },
    };

    let result = client(&mock_server).create_workspace(&request).await;

    match result {
        Err(TfeError::Api { status, message }) => {
            assert_eq!(status, 422);
            assert_eq!(message, "invalid attribute: Name has already been taken");
        }
        other => panic!("Expected TfeError::Api, got {:?}", other),
    }
}

#[tokio::test]
async fn test_show_workspace_found_and_missing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/acme/workspaces/prod-ws"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(workspace_response("ws-prod", "prod-ws")),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/acme/workspaces/new-ws"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "errors": [{ "status": "404", "title": "not found" }]
        })))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);

    let found = client.show_workspace("prod-ws").await.unwrap();
    assert_eq!(found.map(|w| w.id), Some("ws-prod".to_string()));

    let missing = client.show_workspace("new-ws").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_current_state_version() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/workspaces/ws-with-state/current-state-version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "id": "sv-existing",
                "type": "state-versions",
                "attributes": { "serial": 14 }
            }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/workspaces/ws-empty/current-state-version"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);

    let version = client
        .current_state_version("ws-with-state")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(version.id, "sv-existing");
    assert_eq!(version.serial, 14);

    assert!(client.current_state_version("ws-empty").await.unwrap().is_none());
}

#[tokio::test]
async fn test_lock_sends_reason() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/workspaces/ws-prod/actions/lock"))
        .and(body_json(serde_json::json!({ "reason": "migration script" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(workspace_response("ws-prod", "prod-ws")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    client(&mock_server)
        .lock("ws-prod", "migration script")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_lock_conflict() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/workspaces/ws-prod/actions/lock"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "errors": [{ "status": "409", "title": "conflict", "detail": "Unable to lock workspace. The workspace is already locked." }]
        })))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).lock("ws-prod", "migration script").await;

    match result {
        Err(TfeError::Conflict { message }) => assert!(message.contains("already locked")),
        other => panic!("Expected TfeError::Conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unlock() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/workspaces/ws-prod/actions/unlock"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(workspace_response("ws-prod", "prod-ws")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    client(&mock_server).unlock("ws-prod").await.unwrap();
}

#[tokio::test]
async fn test_create_state_version_payload() {
    let mock_server = MockServer::start().await;
    let payload = StateVersionPayload::from_bytes(b"hello");

    Mock::given(method("POST"))
        .and(path("/api/v2/workspaces/ws-prod/state-versions"))
        .and(body_json(serde_json::json!({
            "data": {
                "type": "state-versions",
                "attributes": {
                    "serial": 1,
                    "md5": "5d41402abc4b2a76b9719d911017c592",
                    "state": "aGVsbG8="
                }
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "data": {
                "id": "sv-new",
                "type": "state-versions",
                "attributes": { "serial": 1, "created-at": "2026-10-18T10:00:00Z" }
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let version = client(&mock_server)
        .create_state_version("ws-prod", &payload)
        .await
        .unwrap();

    assert_eq!(version.id, "sv-new");
    assert_eq!(version.serial, 1);
}

#[tokio::test]
async fn test_unparseable_success_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/workspaces/ws-prod/state-versions"))
        .respond_with(ResponseTemplate::new(201).set_body_string("<html>proxy</html>"))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server)
        .create_state_version("ws-prod", &StateVersionPayload::from_bytes(b"{}"))
        .await;

    match result {
        Err(TfeError::Api { status, message }) => {
            assert_eq!(status, 201);
            assert!(message.starts_with("Failed to parse response"));
        }
        other => panic!("Expected TfeError::Api, got {:?}", other),
    }
}

#[tokio::test]
async fn test_enterprise_resolves_single_oauth_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/acme/oauth-clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(oauth_clients_response(&[(
            "oc-1",
            "github.com",
            "ot-1",
        )])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = TfeWorkspaces::enterprise(client(&mock_server), None);
    assert_eq!(api.resolve_vcs_token_id().await.unwrap(), "ot-1");
}

#[tokio::test]
async fn test_enterprise_refuses_ambiguous_oauth_clients() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/acme/oauth-clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(oauth_clients_response(&[
            ("oc-1", "github.com", "ot-1"),
            ("oc-2", "gitlab.com", "ot-2"),
        ])))
        .mount(&mock_server)
        .await;

    let api = TfeWorkspaces::enterprise(client(&mock_server), None);
    let result = api.resolve_vcs_token_id().await;

    match result {
        Err(WorkspaceError::VcsToken(message)) => {
            assert!(message.contains("oc-1 (github.com)"));
            assert!(message.contains("oc-2 (gitlab.com)"));
        }
        other => panic!("Expected WorkspaceError::VcsToken, got {:?}", other),
    }
}

#[tokio::test]
async fn test_enterprise_selects_oauth_client_by_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/acme/oauth-clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(oauth_clients_response(&[
            ("oc-1", "github.com", "ot-1"),
            ("oc-2", "gitlab.com", "ot-2"),
        ])))
        .mount(&mock_server)
        .await;

    let api = TfeWorkspaces::enterprise(client(&mock_server), Some("gitlab.com".to_string()));
    assert_eq!(api.resolve_vcs_token_id().await.unwrap(), "ot-2");
}

#[tokio::test]
async fn test_enterprise_configured_token_skips_oauth_lookup() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/acme/oauth-clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(oauth_clients_response(&[(
            "oc-1",
            "github.com",
            "ot-1",
        )])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let api = TfeWorkspaces::new(
        client(&mock_server),
        ApiVariant::Enterprise,
        VcsTokenSource::Configured("ot-2".to_string()),
    );
    assert_eq!(api.resolve_vcs_token_id().await.unwrap(), "ot-2");
}

#[tokio::test]
async fn test_lock_request_matches_partial_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/workspaces/ws-prod/actions/lock"))
        .and(body_partial_json(serde_json::json!({ "reason": "migration script" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(workspace_response("ws-prod", "prod-ws")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = TfeWorkspaces::enterprise(client(&mock_server), None);
    api.lock_workspace("ws-prod", "migration script")
        .await
        .unwrap();
}
