use infermedica_api::connectors::{
    ApiVersion, BasicConnector, ConnectorOptions, ModelConnector, RequestOptions,
    StandardConnector,
};
use infermedica_api::error::ApiError;
use infermedica_api::models::{
    Age, ChoiceId, ConceptType, Diagnosis, DiagnosticData, Evidence, SearchConceptType, Sex,
    SuggestMethod,
};
use infermedica_api::telemetry;
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path, query_param, query_param_is_missing},
};

fn options(server: &MockServer, version: ApiVersion) -> ConnectorOptions {
    ConnectorOptions::new()
        .app_id("test-app-id")
        .app_key("test-app-key")
        .endpoint(server.uri())
        .api_version(version)
}

fn patient() -> DiagnosticData {
    DiagnosticData::new(Sex::Female, Age::years(32)).with_evidence([
        Evidence::present("s_21").with_source(infermedica_api::models::EvidenceSource::Initial),
        Evidence::absent("s_98"),
    ])
}

#[tokio::test]
async fn test_info_sends_authentication_and_default_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/info"))
        .and(header("App-Id", "test-app-id"))
        .and(header("App-Key", "test-app-key"))
        .and(header("Accept", "application/json"))
        .and(header("Model", "infermedica-pl"))
        .and(header("Dev-Mode", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "api_version": "3.5.0",
            "conditions_count": 801
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let connector = BasicConnector::new(
        options(&mock_server, ApiVersion::V3)
            .model("infermedica-pl")
            .dev_mode(true),
    )
    .unwrap();

    let info = connector.info(RequestOptions::new()).await.unwrap();
    assert_eq!(info["conditions_count"], 801);

    let requests = mock_server.received_requests().await.unwrap();
    let user_agent = requests[0]
        .headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(user_agent.starts_with("Infermedica-API-Rust"));
    assert!(user_agent.contains("basic-v3"));
}

#[tokio::test]
async fn test_v3_search_sends_age_and_joined_types() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/search"))
        .and(query_param("phrase", "headache"))
        .and(query_param("age.value", "38"))
        .and(query_param("age.unit", "year"))
        .and(query_param("sex", "male"))
        .and(query_param("max_results", "8"))
        .and(query_param("types", "symptom,risk_factor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "s_21", "label": "Headache"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let connector = StandardConnector::new(options(&mock_server, ApiVersion::V3)).unwrap();
    let results = connector
        .search(
            "headache",
            Age::new(38, Some(infermedica_api::models::AgeUnit::Year)),
            Some(Sex::Male),
            None,
            &[SearchConceptType::Symptom, SearchConceptType::RiskFactor],
            RequestOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(results[0]["id"], "s_21");
}

#[tokio::test]
async fn test_v2_search_repeats_type_and_omits_age() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/search"))
        .and(query_param("phrase", "fever"))
        .and(query_param("type", "symptom"))
        .and(query_param("type", "lab_test"))
        .and(query_param("max_results", "3"))
        .and(query_param_is_missing("age.value"))
        .and(query_param_is_missing("types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let connector = StandardConnector::new(options(&mock_server, ApiVersion::V2)).unwrap();
    let results = connector
        .search(
            "fever",
            Age::years(30),
            None,
            Some(3),
            &[SearchConceptType::Symptom, SearchConceptType::LabTest],
            RequestOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(results, json!([]));
}

#[tokio::test]
async fn test_error_statuses_map_to_error_kinds() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/conditions/c_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("{\"message\":\"not found\"}"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/symptoms"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v3/diagnosis"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v3/triage"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid evidence"))
        .mount(&mock_server)
        .await;

    let connector = StandardConnector::new(options(&mock_server, ApiVersion::V3)).unwrap();

    let err = connector
        .condition_details("c_missing", None, RequestOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(err.status(), Some(404));

    let err = connector
        .symptom_list(None, RequestOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));

    let err = connector
        .diagnosis(&patient(), None, RequestOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ServerError(_)));
    assert_eq!(err.response().map(|response| response.body.as_str()), Some("maintenance"));

    let err = connector
        .triage(&patient(), None, RequestOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn test_v3_suggest_defaults_method_and_max_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/suggest"))
        .and(query_param("max_results", "8"))
        .and(header("Interview-Id", "interview-1"))
        .and(body_partial_json(json!({
            "sex": "female",
            "age": {"value": 32, "unit": "year"},
            "suggest_method": "symptoms",
            "evidence": [
                {"id": "s_21", "choice_id": "present", "source": "initial"},
                {"id": "s_98", "choice_id": "absent"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "s_102", "name": "Fatigue", "common_name": "Tiredness"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v3/suggest"))
        .and(query_param("max_results", "2"))
        .and(body_partial_json(json!({"suggest_method": "red_flags"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let connector = StandardConnector::new(options(&mock_server, ApiVersion::V3)).unwrap();
    let suggestions = connector
        .suggest(
            &patient(),
            None,
            None,
            Some("interview-1"),
            RequestOptions::new(),
        )
        .await
        .unwrap();
    assert_eq!(suggestions[0]["id"], "s_102");

    connector
        .suggest(
            &patient(),
            Some(SuggestMethod::RedFlags),
            Some(2),
            None,
            RequestOptions::new(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_explicit_interview_id_overrides_passed_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/rationale"))
        .and(header("Interview-Id", "explicit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"type": "r1"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let connector = StandardConnector::new(options(&mock_server, ApiVersion::V3)).unwrap();
    connector
        .rationale(
            &patient(),
            Some("explicit"),
            RequestOptions::new().header("interview-id", "passed"),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_scoped_interview_id_is_sent_when_none_given() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/info"))
        .and(header("Interview-Id", "scoped-interview"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let connector = BasicConnector::new(options(&mock_server, ApiVersion::V3)).unwrap();
    telemetry::with_interview("scoped-interview", async {
        connector.info(RequestOptions::new()).await.unwrap();
    })
    .await;
}

#[tokio::test]
async fn test_v2_only_method_fails_before_request_on_v3() {
    let mock_server = MockServer::start().await;

    let connector = StandardConnector::new(options(&mock_server, ApiVersion::V3)).unwrap();
    let err = connector
        .red_flags(&patient(), None, None, RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::MethodNotAvailable { .. }));
    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_v2_red_flags_and_bare_age() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/red_flags"))
        .and(query_param("max_results", "8"))
        .and(body_partial_json(json!({"sex": "female", "age": 32})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "s_1193", "name": "Chest pain", "common_name": "Chest pain"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let connector = ModelConnector::new(options(&mock_server, ApiVersion::V2)).unwrap();
    let mut diagnosis = Diagnosis::new(Sex::Female, Age::years(32));
    diagnosis.add_symptom("s_21", ChoiceId::Present, None);

    let red_flags = connector.red_flags(&diagnosis, None).await.unwrap();
    assert_eq!(red_flags.len(), 1);
    assert_eq!(red_flags.get("s_1193").unwrap().name, "Chest pain");
}

#[tokio::test]
async fn test_model_diagnosis_updates_interview_in_place() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/diagnosis"))
        .and(header("Interview-Id", "interview-42"))
        .and(body_partial_json(json!({
            "evidence": [
                {"id": "s_21", "choice_id": "present"},
                {"id": "p_7", "choice_id": "absent"}
            ],
            "extras": {"disable_groups": true}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "question": {
                "type": "single",
                "text": "Do you have a fever?",
                "items": [{"id": "s_98", "name": "Fever", "choices": []}]
            },
            "conditions": [
                {"id": "c_87", "name": "Sinusitis", "common_name": "Sinusitis", "probability": 0.4}
            ],
            "should_stop": false,
            "extras": {}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let connector = ModelConnector::new(options(&mock_server, ApiVersion::V3)).unwrap();
    let mut diagnosis = Diagnosis::new(Sex::Male, Age::years(44)).with_interview_id("interview-42");
    diagnosis.add_evidence("s_21", ChoiceId::Present, None);
    diagnosis.add_evidence("p_7", ChoiceId::Absent, None);
    diagnosis.set_extras("disable_groups", json!(true), true);

    connector.diagnosis(&mut diagnosis).await.unwrap();

    assert_eq!(
        diagnosis.question.as_ref().map(|question| question.text.as_str()),
        Some("Do you have a fever?")
    );
    assert_eq!(diagnosis.conditions.get("c_87").unwrap().probability, 0.4);
    assert_eq!(diagnosis.should_stop, Some(false));
    assert_eq!(diagnosis.extras_permanent["disable_groups"], json!(true));
}

#[tokio::test]
async fn test_explain_and_concepts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/explain"))
        .and(body_partial_json(json!({"target": "c_49"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "supporting_evidence": [{"id": "s_21", "name": "Headache", "common_name": "Headache"}],
            "conflicting_evidence": [],
            "unconfirmed_evidence": []
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v3/concepts"))
        .and(query_param("ids", "c_1,s_13"))
        .and(query_param("types", "condition,symptom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "c_1", "name": "Sinusitis", "common_name": "Sinusitis", "type": "condition"},
            {"id": "s_13", "name": "Abdominal pain", "common_name": "Stomach ache", "type": "symptom"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let connector = ModelConnector::new(options(&mock_server, ApiVersion::V3)).unwrap();
    let mut diagnosis = Diagnosis::new(Sex::Female, Age::years(28));
    diagnosis.add_symptom("s_21", ChoiceId::Present, None);

    let explanation = connector.explain(&diagnosis, "c_49").await.unwrap();
    assert_eq!(explanation.supporting_evidence.len(), 1);

    let concepts = connector
        .concept_list(&["c_1", "s_13"], &[ConceptType::Condition, ConceptType::Symptom])
        .await
        .unwrap();
    assert_eq!(
        concepts.get("s_13").map(|concept| concept.concept_type),
        Some(ConceptType::Symptom)
    );
}

#[tokio::test]
async fn test_empty_body_decodes_to_empty_object() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/parse"))
        .and(body_partial_json(json!({"text": "i have a headache", "include_tokens": false})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let connector = StandardConnector::new(options(&mock_server, ApiVersion::V3)).unwrap();
    let response: Value = connector
        .parse(
            "i have a headache",
            Age::years(30),
            false,
            None,
            RequestOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(response, json!({}));
}

#[tokio::test]
async fn test_slow_response_maps_to_transport_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/info"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(1_000)),
        )
        .mount(&mock_server)
        .await;

    let connector = BasicConnector::new(
        options(&mock_server, ApiVersion::V3).timeout(Duration::from_millis(100)),
    )
    .unwrap();

    let err = connector.info(RequestOptions::new()).await.unwrap_err();
    assert!(
        matches!(err, ApiError::Transport { timed_out: true, .. }),
        "unexpected error: {err:?}"
    );
    assert!(err.status().is_none());
}

#[tokio::test]
async fn test_refused_connection_maps_to_transport_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let connector = BasicConnector::new(
        ConnectorOptions::new()
            .app_id("test-app-id")
            .app_key("test-app-key")
            .endpoint(format!("http://127.0.0.1:{port}")),
    )
    .unwrap();

    let err = connector.info(RequestOptions::new()).await.unwrap_err();
    assert!(
        matches!(err, ApiError::Transport { timed_out: false, .. }),
        "unexpected error: {err:?}"
    );
}
