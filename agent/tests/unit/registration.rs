//! Unit tests for the registration handshake use-case.

#![allow(clippy::expect_used)]

use async_trait::async_trait;
use mockall::mock;
use mockall::predicate::eq;
use ranch_agent::application::ports::Registrar;
use ranch_agent::application::services::registration;
use ranch_agent::domain::{ClientId, RegistrationError};

mock! {
    pub Orchestrator {}

    #[async_trait]
    impl Registrar for Orchestrator {
        async fn register(&self, id: ClientId) -> Result<(), RegistrationError>;
    }
}

fn id(raw: i64) -> ClientId {
    ClientId::new(raw).expect("valid id")
}

#[tokio::test]
async fn register_sends_configured_id_once() {
    let mut orchestrator = MockOrchestrator::new();
    orchestrator
        .expect_register()
        .with(eq(id(5)))
        .times(1)
        .returning(|_| Ok(()));

    registration::register(&orchestrator, id(5))
        .await
        .expect("registered");
}

#[tokio::test]
async fn http_error_is_not_retried() {
    let mut orchestrator = MockOrchestrator::new();
    orchestrator
        .expect_register()
        .times(1)
        .returning(|_| Err(RegistrationError::Http { status: 500 }));

    let err = registration::register(&orchestrator, id(5))
        .await
        .expect_err("http 500");

    assert!(matches!(err, RegistrationError::Http { status: 500 }));
    assert!(err.is_application_level());
    assert_eq!(
        err.to_string(),
        "Failed to register client due to HTTP error (status 500)"
    );
}

#[tokio::test]
async fn rejection_is_application_level() {
    let mut orchestrator = MockOrchestrator::new();
    orchestrator.expect_register().times(1).returning(|_| {
        Err(RegistrationError::Rejected {
            code: -32000,
            message: "client 5 already registered".to_string(),
        })
    });

    let err = registration::register(&orchestrator, id(5))
        .await
        .expect_err("rejected");

    assert!(err.is_application_level());
    assert!(err.to_string().contains("client 5 already registered"));
}

#[tokio::test]
async fn transport_failure_keeps_its_cause() {
    let mut orchestrator = MockOrchestrator::new();
    orchestrator.expect_register().times(1).returning(|_| {
        Err(RegistrationError::Transport(anyhow::anyhow!(
            "connection refused"
        )))
    });

    let err = registration::register(&orchestrator, id(9))
        .await
        .expect_err("transport");

    assert!(!err.is_application_level());
    let chain = ranch_agent::domain::error::render_chain(&err);
    assert!(chain.contains("connection refused"), "chain: {chain}");
}
