//! The wizard's email and code steps against a wiremock backend: what gets
//! written and how the latest request is asked for.

use std::sync::Arc;

use chrono::Duration;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use carwatch_core::{CarId, ManualClock, Timestamp, VerificationId};
use carwatch_state::WizardStep;
use carwatch_store::{RestDataStore, StoreConfig};
use carwatch_verification::{OwnershipVerificationWizard, WizardConfig};

const OWNER: &str = "owner@example.com";

#[tokio::test]
async fn created_at_keeps_milliseconds_and_code_lookup_orders_by_it() {
    let mock_server = MockServer::start().await;
    let car_id: CarId = "6ba7b810-9dad-11d1-80b4-00c04fd430c8".parse().unwrap();
    let clock = Arc::new(ManualClock::new(
        Timestamp::parse("2026-05-10T08:00:00.417Z").unwrap(),
    ));

    Mock::given(method("POST"))
        .and(path("/rest/v1/ownership_verification"))
        .and(body_partial_json(json!({
            "car_id": car_id.to_string(),
            "owner_email": OWNER,
            "created_at": "2026-05-10T08:00:00.417Z",
            "code_expires_at": "2026-05-11T08:00:00.417Z",
            "status": "pending",
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = StoreConfig::new(&mock_server.uri(), "test-key").unwrap();
    let store = Arc::new(RestDataStore::new(config).unwrap());
    let wizard_config = WizardConfig {
        code_seed: Some(3),
        ..WizardConfig::default()
    };
    let mut wizard =
        OwnershipVerificationWizard::with_config(store, clock.clone(), car_id, wizard_config);
    let code = wizard.submit_email(OWNER).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/ownership_verification"))
        .and(query_param("car_id", format!("eq.{car_id}")))
        .and(query_param("owner_email", format!("eq.{OWNER}")))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": VerificationId::new().to_string(),
            "car_id": car_id.to_string(),
            "owner_email": OWNER,
            "verification_code": code.as_str(),
            "created_at": "2026-05-10T08:00:00.417+00:00",
            "code_expires_at": "2026-05-11T08:00:00.417+00:00",
            "status": "pending",
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    clock.advance(Duration::minutes(5));
    wizard.submit_code(&code.as_str().to_ascii_lowercase()).await.unwrap();
    assert_eq!(wizard.step(), WizardStep::Documents);
}
