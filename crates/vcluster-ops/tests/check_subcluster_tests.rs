//! CheckSubclusterOp against scripted and wiremock nodes.

use serde_json::json;
use vcluster_core::testing::ScriptedAdapterFactory;
use vcluster_core::{
    ClientConfig, ClusterOp, ExecContext, HostResult, HttpMethod, OpEngine, OpError, OpState,
    RequestDispatcher,
};
use vcluster_ops::{CheckSubclusterOp, SUBCLUSTER_INFO_KEY, SubclusterInfo};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn hosts(names: &[&str]) -> Vec<String> {
    names.iter().map(|h| h.to_string()).collect()
}

fn sc1_primary() -> SubclusterInfo {
    SubclusterInfo {
        subcluster_name: "sc1".to_string(),
        control_set_size: 3,
        is_secondary: false,
        is_default: false,
        sandbox: String::new(),
    }
}

fn info_body(info: &SubclusterInfo) -> String {
    serde_json::to_string(info).unwrap()
}

async fn run_check(
    op: CheckSubclusterOp,
    factory: &ScriptedAdapterFactory,
    up_hosts: &[&str],
) -> (Result<(), OpError>, ExecContext) {
    let mut ctx = ExecContext::new(hosts(up_hosts), factory.dispatcher());
    let mut engine = OpEngine::new(vec![Box::new(op)]);
    let outcome = engine.run(&mut ctx).await.map(|_| ());
    (outcome, ctx)
}

#[tokio::test]
async fn test_prepare_builds_one_request_per_host() {
    let factory = ScriptedAdapterFactory::new(|host, _| HostResult::success(host, 200, "{}"));
    let mut ctx = ExecContext::new(hosts(&["h1", "h2", "h3"]), factory.dispatcher());
    let mut op = CheckSubclusterOp::new("sc1", true, 3)
        .with_password_auth("dbadmin", Some("pw".to_string()))
        .unwrap();

    op.prepare(&mut ctx).await.unwrap();

    let request = &op.base().cluster_request;
    assert_eq!(request.len(), 3);
    for host in ["h1", "h2", "h3"] {
        let host_request = request.requests.get(host).unwrap();
        assert_eq!(host_request.method, HttpMethod::Get);
        assert_eq!(host_request.endpoint, "v1/subclusters/sc1");
        assert_eq!(host_request.username.as_deref(), Some("dbadmin"));
        assert!(host_request.query_params.is_empty());
    }
    assert_eq!(factory.created(), 3);
    assert!(factory.sent_requests().is_empty());
}

#[tokio::test]
async fn test_no_up_hosts_is_a_precondition_error() {
    let factory = ScriptedAdapterFactory::new(|host, _| HostResult::success(host, 200, "{}"));
    let (outcome, _) = run_check(CheckSubclusterOp::new("sc1", true, 3), &factory, &[]).await;

    let err = outcome.unwrap_err();
    assert!(matches!(err, OpError::Precondition { .. }));
    assert_eq!(factory.created(), 0);
}

#[tokio::test]
async fn test_matching_host_confirms_despite_earlier_failures() {
    let body = info_body(&sc1_primary());
    let factory = ScriptedAdapterFactory::with_results([
        HostResult::failure("h1", 503, "Service Unavailable"),
        HostResult::success("h2", 200, body),
    ]);
    // h3 has no scripted answer and fails at the transport level
    let (outcome, ctx) =
        run_check(CheckSubclusterOp::new("sc1", true, 3), &factory, &["h1", "h2", "h3"]).await;

    assert!(outcome.is_ok(), "unexpected error: {:?}", outcome);
    let stored: SubclusterInfo = ctx.metadata_as(SUBCLUSTER_INFO_KEY).unwrap();
    assert_eq!(stored, sc1_primary());
}

#[tokio::test]
async fn test_unauthorized_short_circuits() {
    let factory = ScriptedAdapterFactory::with_results([
        HostResult::failure("h1", 401, "Wrong password"),
        HostResult::success("h2", 200, info_body(&sc1_primary())),
    ]);
    let (outcome, ctx) =
        run_check(CheckSubclusterOp::new("sc1", true, 3), &factory, &["h1", "h2"]).await;

    match outcome.unwrap_err() {
        OpError::Authorization { host, message, .. } => {
            assert_eq!(host, "h1");
            assert_eq!(message, "Wrong password");
        }
        other => panic!("expected Authorization, got {:?}", other),
    }
    assert!(ctx.metadata.get(SUBCLUSTER_INFO_KEY).is_none());
}

#[tokio::test]
async fn test_role_mismatch_names_both_roles() {
    let mut returned = sc1_primary();
    returned.is_secondary = true;
    let factory =
        ScriptedAdapterFactory::with_results([HostResult::success("h1", 200, info_body(&returned))]);

    let (outcome, _) = run_check(CheckSubclusterOp::new("sc1", true, 3), &factory, &["h1"]).await;

    match outcome.unwrap_err() {
        OpError::SemanticMismatch {
            message,
            expected,
            actual,
            host,
            ..
        } => {
            assert_eq!(host, "h1");
            assert_eq!(expected, "primary");
            assert_eq!(actual, "secondary");
            assert!(message.contains("should be a primary subcluster but got a secondary subcluster"));
        }
        other => panic!("expected SemanticMismatch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_control_set_size_mismatch() {
    let mut returned = sc1_primary();
    returned.control_set_size = 1;
    let factory =
        ScriptedAdapterFactory::with_results([HostResult::success("h1", 200, info_body(&returned))]);

    let (outcome, _) = run_check(CheckSubclusterOp::new("sc1", true, 3), &factory, &["h1"]).await;

    let err = outcome.unwrap_err();
    assert!(err.to_string().contains("control set size as 3 but got 1"));
}

#[tokio::test]
async fn test_malformed_body_is_a_shape_error() {
    let factory = ScriptedAdapterFactory::with_results([HostResult::success(
        "h1",
        200,
        r#"{"subcluster_name": "sc1"}"#,
    )]);

    let (outcome, _) = run_check(CheckSubclusterOp::new("sc1", true, 3), &factory, &["h1"]).await;

    let err = outcome.unwrap_err();
    assert!(matches!(err, OpError::ResponseShape { ref host, .. } if host == "h1"));
}

#[tokio::test]
async fn test_all_hosts_failing_reports_last_failure() {
    let factory = ScriptedAdapterFactory::with_results([
        HostResult::failure("h1", 500, "internal error"),
        HostResult::failure("h2", 503, "unavailable"),
    ]);
    let mut ctx = ExecContext::new(hosts(&["h1", "h2"]), factory.dispatcher());
    let mut engine = OpEngine::new(vec![Box::new(CheckSubclusterOp::new("sc1", true, 3))]);

    let err = engine.run(&mut ctx).await.unwrap_err();
    assert!(matches!(err, OpError::Transport { ref host, .. } if host == "h2"));
    assert_eq!(engine.records()[0].state, OpState::Failed);
}

#[tokio::test]
async fn test_check_against_http_node() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/subclusters/sc_secondary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subcluster_name": "sc_secondary",
            "control_set_size": 0,
            "is_secondary": true,
            "is_default": false,
            "sandbox": ""
        })))
        .mount(&server)
        .await;

    let config = ClientConfig {
        scheme: "http".to_string(),
        ..ClientConfig::default()
    };
    let dispatcher = RequestDispatcher::from_config(&config).unwrap();
    let mut ctx = ExecContext::new(vec![server.address().to_string()], dispatcher);
    let mut engine = OpEngine::new(vec![Box::new(CheckSubclusterOp::new("sc_secondary", false, 0))]);

    let report = engine.run(&mut ctx).await.unwrap();
    assert_eq!(report.records[0].state, OpState::Finalized);
    let stored: SubclusterInfo = ctx.metadata_as(SUBCLUSTER_INFO_KEY).unwrap();
    assert!(stored.is_secondary);
}
