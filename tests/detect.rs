mod common;

use std::sync::Arc;

use common::*;
use ups_telemetry::detect::DetectError;
use ups_telemetry::profiles::{DialectKind, TagGroup, enterprise};
use ups_telemetry::snmp::SnmpVersion;

#[tokio::test]
async fn detection_is_idempotent() {
    let net = Arc::new(MockNetwork::default());
    net.add("10.0.0.1", MockAgent::new("ups", enterprise_values()).v2c_only());
    let detector = detector(net, &test_settings());

    let first = detector.detect("10.0.0.1", 161).await.unwrap();
    let second = detector.detect("10.0.0.1", 161).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.kind, DialectKind::Enterprise);
    assert_eq!(first.version, SnmpVersion::V2c);
    assert_eq!(first.community, "ups");
    assert_eq!(first.vendor.as_deref(), Some("INVT"));
    assert_eq!(first.working_tags.len(), enterprise::TAGS.len());
    assert!(first.responds(TagGroup::Alarms));
}

#[tokio::test]
async fn oldest_version_wins_when_both_answer() {
    let net = Arc::new(MockNetwork::default());
    net.add("10.0.0.1", MockAgent::new("public", standard_values()));
    let detector = detector(net, &test_settings());

    let caps = detector.detect("10.0.0.1", 161).await.unwrap();

    assert_eq!(caps.version, SnmpVersion::V1);
    assert_eq!(caps.kind, DialectKind::Standard);
    assert!(!caps.layered);
    assert!(!caps.responds(TagGroup::EnterpriseExtra));
}

#[tokio::test]
async fn standard_device_with_vendor_tags_is_layered() {
    let mut values = standard_values();
    values.extend(enterprise_values());
    let net = Arc::new(MockNetwork::default());
    net.add("10.0.0.1", MockAgent::new("public", values));
    let detector = detector(net, &test_settings());

    let caps = detector.detect("10.0.0.1", 161).await.unwrap();

    assert_eq!(caps.kind, DialectKind::Standard);
    assert!(caps.layered);
    assert!(caps.responds(TagGroup::EnterpriseExtra));
}

#[tokio::test]
async fn constrained_firmware_falls_back_to_minimal() {
    let net = Arc::new(MockNetwork::default());
    net.add("10.0.0.1", MockAgent::new("public", minimal_values()));
    let detector = detector(net, &test_settings());

    let caps = detector.detect("10.0.0.1", 161).await.unwrap();

    assert_eq!(caps.kind, DialectKind::Minimal);
    assert_eq!(caps.working_tags.len(), 8);
}

#[tokio::test]
async fn agent_without_ups_tags_is_rejected() {
    let net = Arc::new(MockNetwork::default());
    let agent = MockAgent::new("public", Default::default());
    agent.set(ups_telemetry::snmp::SYS_DESCR, "Linux router");
    net.add("10.0.0.1", agent);
    let detector = detector(net, &test_settings());

    let err = detector.detect("10.0.0.1", 161).await.unwrap_err();
    assert!(matches!(err, DetectError::NoDialect { .. }));
}

#[tokio::test]
async fn silent_device_exhausts_all_combinations() {
    let net = Arc::new(MockNetwork::default());
    net.add("10.0.0.1", MockAgent::new("secret", enterprise_values()));
    let detector = detector(net, &test_settings());

    let err = detector.detect("10.0.0.1", 161).await.unwrap_err();

    // 2 версии x 2 community
    assert!(matches!(err, DetectError::NoResponse { attempts: 4, .. }));
}

#[tokio::test]
async fn registry_community_is_tried_first() {
    let net = Arc::new(MockNetwork::default());
    net.add("10.0.0.1", MockAgent::new("secret", enterprise_values()));
    let detector = detector(net, &test_settings());

    let caps = detector
        .detect_preferring("10.0.0.1", 161, Some("secret"))
        .await
        .unwrap();

    assert_eq!(caps.community, "secret");
}
