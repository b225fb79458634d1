use genesis_export::adapters::rpc::RpcClient;
use genesis_export::app::pipelines::BalanceOptions;
use genesis_export::core::ChainSource;
use genesis_export::domain::keys::items;
use genesis_export::domain::model::{AccountData, AccountId, AccountInfo, Balance};
use genesis_export::utils::error::ErrorCategory;
use genesis_export::{export_from, ExportConfig, ExportError, ExportJob};
use httpmock::prelude::*;
use parity_scale_codec::Encode;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn client(server: &MockServer) -> RpcClient {
    RpcClient::new(&server.url("/"), Duration::from_secs(5)).unwrap()
}

fn scale_hex<T: Encode>(value: &T) -> String {
    format!("0x{}", hex::encode(value.encode()))
}

#[tokio::test]
async fn test_get_storage_decodes_hex_value() {
    let server = MockServer::start();
    let key = items::TOTAL_ISSUANCE.value_key();

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .body_contains("\"method\":\"state_getStorage\"")
            .body_contains(key.to_hex());
        then.status(200)
            .json_body(json!({ "jsonrpc": "2.0", "id": 1, "result": "0x2a00" }));
    });

    let value = client(&server).storage(&key, None).await.unwrap();
    mock.assert();
    assert_eq!(value, Some(vec![0x2a, 0x00]));
}

#[tokio::test]
async fn test_null_result_is_absent_value() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/");
        then.status(200)
            .json_body(json!({ "jsonrpc": "2.0", "id": 1, "result": null }));
    });

    let client = client(&server);
    let value = client
        .storage(&items::NEXT_MEMBER_ID.value_key(), None)
        .await
        .unwrap();
    assert_eq!(value, None);

    let hash = client.block_hash(99_999_999).await.unwrap();
    assert!(hash.is_none());
}

#[tokio::test]
async fn test_error_object_maps_to_rpc_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/");
        then.status(200).json_body(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "Invalid params" }
        }));
    });

    let err = client(&server)
        .storage(&items::TOTAL_ISSUANCE.value_key(), None)
        .await
        .unwrap_err();

    match &err {
        ExportError::RpcError { code, message } => {
            assert_eq!(*code, -32602);
            assert_eq!(message, "Invalid params");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.category(), ErrorCategory::Network);
}

#[tokio::test]
async fn test_http_failure_is_transport_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/");
        then.status(503);
    });

    let err = client(&server).block_hash(1).await.unwrap_err();
    assert!(matches!(err, ExportError::TransportError(_)));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_block_hash_is_passed_to_storage_reads() {
    let server = MockServer::start();
    let hash = format!("0x{}", "ab".repeat(32));

    let hash_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .body_contains("\"method\":\"chain_getBlockHash\"")
            .body_contains("[42]");
        then.status(200)
            .json_body(json!({ "jsonrpc": "2.0", "id": 1, "result": hash }));
    });
    let storage_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .body_contains("\"method\":\"state_getStorage\"")
            .body_contains(hash.as_str());
        then.status(200)
            .json_body(json!({ "jsonrpc": "2.0", "id": 2, "result": null }));
    });

    let client = client(&server);
    let at = client.block_hash(42).await.unwrap().unwrap();
    assert_eq!(at.0, [0xab; 32]);
    client
        .storage(&items::TOTAL_ISSUANCE.value_key(), Some(&at))
        .await
        .unwrap();

    hash_mock.assert();
    storage_mock.assert();
}

#[tokio::test]
async fn test_balances_export_over_websocket_url() -> anyhow::Result<()> {
    let server = MockServer::start();
    let alice = AccountId([1; 32]);
    let account_key = items::SYSTEM_ACCOUNT.map_key(&alice);
    let info = AccountInfo {
        nonce: 3,
        refcount: 1,
        data: AccountData {
            free: 900,
            reserved: 100,
            ..Default::default()
        },
    };

    let keys_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .body_contains("\"method\":\"state_getKeysPaged\"");
        then.status(200).json_body(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": [account_key.to_hex()]
        }));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .body_contains("\"method\":\"state_queryStorageAt\"");
        then.status(200).json_body(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "result": [{
                "block": format!("0x{}", "00".repeat(32)),
                "changes": [[account_key.to_hex(), scale_hex(&info)]]
            }]
        }));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .body_contains("\"method\":\"state_getStorage\"");
        then.status(200).json_body(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "result": scale_hex(&(1_000 as Balance))
        }));
    });

    let output_dir = TempDir::new()?;
    let config = ExportConfig {
        endpoint: format!("ws://{}", server.address()),
        output_dir: Some(output_dir.path().to_str().unwrap().to_string()),
        ..ExportConfig::default()
    };
    let source = RpcClient::new(&config.endpoint, Duration::from_secs(5))?;

    export_from(
        Arc::new(source),
        &config,
        ExportJob::Balances(BalanceOptions::default()),
        false,
    )
    .await?;

    keys_mock.assert();
    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(output_dir.path().join("balances.json"))?)?;
    assert_eq!(document["balances"][0][0], alice.to_ss58());
    assert_eq!(document["balances"][0][1], 1_000);
    Ok(())
}
