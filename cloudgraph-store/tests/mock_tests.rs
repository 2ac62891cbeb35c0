use cloudgraph_model::{CombinedSchema, MutationDescriptor};
use cloudgraph_store::mock::{RecordedCall, RecordingStore};
use cloudgraph_store::{GraphStore, StoreError};
use serde_json::json;

#[tokio::test]
async fn records_calls_in_order() {
    let store = RecordingStore::new();
    let shared = store.clone();
    store.publish_schema(&CombinedSchema::new()).await.unwrap();
    let mutation = MutationDescriptor::add_upsert("AwsEc2");
    let ack = store.upsert(&mutation, &[json!({"id": "i-1"})]).await.unwrap();

    assert_eq!(ack.accepted, 1);
    let calls = shared.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[0], RecordedCall::Schema(_)));
    assert!(matches!(calls[1], RecordedCall::Upsert { .. }));
    assert_eq!(shared.upsert_count(), 1);
}

#[tokio::test]
async fn schema_failure_is_permanent() {
    let store = RecordingStore::new().failing_schema();
    let err = store.publish_schema(&CombinedSchema::new()).await.unwrap_err();
    assert!(!err.is_transient());
    assert_eq!(store.schemas().len(), 1);
}

#[tokio::test]
async fn failing_mutation_matches_fragment() {
    let store = RecordingStore::new().failing_mutation("addAwsAlb");
    assert!(store
        .upsert(&MutationDescriptor::add_upsert("AwsAlb"), &[])
        .await
        .is_err());
    assert!(store
        .upsert(&MutationDescriptor::add_upsert("AwsEc2"), &[])
        .await
        .is_ok());
}

#[tokio::test]
async fn transient_failures_run_out() {
    let store = RecordingStore::new().with_transient_failures(2);
    let mutation = MutationDescriptor::add_upsert("AwsEc2");
    for _ in 0..2 {
        let err = store.upsert(&mutation, &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 503, .. }));
    }
    tokio_test::assert_ok!(store.upsert(&mutation, &[]).await);
    assert_eq!(store.upsert_count(), 3);
}
