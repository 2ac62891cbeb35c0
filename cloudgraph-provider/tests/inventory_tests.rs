use cloudgraph_model::{ABSENT, Cardinality, ProviderDataset, RegionContext, join};
use cloudgraph_provider::inventory::{InventoryDocument, InventoryProvider};
use cloudgraph_provider::{
    Credentials, DataRequest, Provider, ProviderError, ProviderOptions, Selector,
};
use cloudgraph_types::{AccountId, EntityIdentity, Region, ServiceType};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::path::Path;

fn document() -> Value {
    json!({
        "credentials": {"profile": "default"},
        "accountId": "123456789012",
        "regions": ["us-east-1"],
        "schema": ["type AwsEc2 { id: String! @id }", "type AwsAlb { id: String! @id }"],
        "services": [
            {
                "name": "ec2",
                "identity": "/InstanceId",
                "fields": {"instanceType": "/InstanceType", "keyName": "/KeyName"},
                "data": [
                    {"region": "us-east-1", "records": [
                        {"InstanceId": "i-1", "InstanceType": "t3.micro", "PrivateIpAddress": "10.0.0.1"},
                        {"InstanceId": "i-2", "InstanceType": "t3.large", "PrivateIpAddress": "10.0.0.2"}
                    ]},
                    {"region": "eu-west-1", "records": [
                        {"InstanceId": "i-3", "PrivateIpAddress": "10.1.0.1"}
                    ]}
                ]
            },
            {
                "name": "alb",
                "identity": "/LoadBalancerArn",
                "relations": [
                    {"relation": "instances", "source": "/TargetIps", "targetService": "ec2",
                     "targetKey": "/PrivateIpAddress", "many": true},
                    {"relation": "securityGroup", "source": "/SecurityGroup"}
                ],
                "data": [
                    {"region": "us-east-1", "records": [
                        {"LoadBalancerArn": "alb-1", "TargetIps": ["10.0.0.1"], "SecurityGroup": "sg-1"}
                    ]}
                ]
            }
        ]
    })
}

fn provider_from(value: Value, base_dir: &Path) -> InventoryProvider {
    let document: InventoryDocument = serde_json::from_value(value).unwrap();
    InventoryProvider::from_document("aws", document, base_dir).unwrap()
}

async fn fetch(provider: &InventoryProvider, selector: &Selector) -> ProviderDataset {
    let options = ProviderOptions::default();
    let credentials = provider.credentials(&options).await.unwrap();
    provider
        .raw_data(DataRequest {
            selector,
            credentials: &credentials,
            options: &options,
        })
        .await
        .unwrap()
}

fn ctx(region: &str) -> RegionContext {
    RegionContext::new(Region::new(region), AccountId::new("123456789012"))
}

// ── Identity and credentials ────────────────────────────────────

#[tokio::test]
async fn credentials_and_identity_come_from_document() {
    let provider = provider_from(document(), Path::new("."));
    let options = ProviderOptions::default();
    let credentials = provider.credentials(&options).await.unwrap();
    assert_eq!(credentials.as_value(), &json!({"profile": "default"}));
    assert_eq!(format!("{credentials:?}"), "Credentials(<redacted>)");

    let account = provider.identity(&credentials, &options).await.unwrap();
    assert_eq!(account.as_str(), "123456789012");
}

#[tokio::test]
async fn missing_credentials_is_auth_error() {
    let mut value = document();
    value["credentials"] = Value::Null;
    let provider = provider_from(value, Path::new("."));
    let err = provider.credentials(&ProviderOptions::default()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Auth(_)));
}

#[tokio::test]
async fn missing_account_is_identity_error() {
    let mut value = document();
    value.as_object_mut().unwrap().remove("accountId");
    let provider = provider_from(value, Path::new("."));
    let credentials = Credentials::new(json!({}));
    let err = provider
        .identity(&credentials, &ProviderOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Identity(_)));
}

// ── Definition validation ───────────────────────────────────────

#[test]
fn duplicate_service_is_rejected() {
    let mut value = document();
    let first = value["services"][0].clone();
    value["services"].as_array_mut().unwrap().push(first);
    let document: InventoryDocument = serde_json::from_value(value).unwrap();
    let err = InventoryProvider::from_document("aws", document, ".").err().unwrap();
    assert!(matches!(err, ProviderError::Definition(_)));
}

#[test]
fn reserved_field_names_are_rejected() {
    for key in ["id", "serviceType"] {
        let mut value = document();
        value["services"][0]["fields"][key] = json!("/InstanceId");
        let document: InventoryDocument = serde_json::from_value(value).unwrap();
        let err = InventoryProvider::from_document("aws", document, ".").err().unwrap();
        assert!(matches!(err, ProviderError::Definition(ref m) if m.contains(key)));
    }
}

#[test]
fn identity_must_be_a_pointer() {
    let mut value = document();
    value["services"][0]["identity"] = json!("InstanceId");
    let document: InventoryDocument = serde_json::from_value(value).unwrap();
    assert!(InventoryProvider::from_document("aws", document, ".").is_err());
}

// ── Selection ───────────────────────────────────────────────────

#[test]
fn default_selector_lists_every_service() {
    let provider = provider_from(document(), Path::new("."));
    let selector = provider.default_selector();
    assert_eq!(selector.regions, vec![Region::new("us-east-1")]);
    assert_eq!(
        selector.resource_types,
        vec![ServiceType::new("ec2"), ServiceType::new("alb")]
    );
}

#[tokio::test]
async fn raw_data_honours_selector() {
    let provider = provider_from(document(), Path::new("."));
    let dataset = fetch(&provider, &Selector::parse("eu-west-1", "ec2")).await;
    assert_eq!(dataset.services().len(), 1);
    assert_eq!(dataset.record_count(), 1);

    let dataset = fetch(&provider, &Selector::default()).await;
    assert_eq!(dataset.record_count(), 4);
    let order: Vec<&str> = dataset
        .services()
        .iter()
        .map(|s| s.service_type.as_str())
        .collect();
    assert_eq!(order, vec!["ec2", "alb"]);
}

// ── Handlers ────────────────────────────────────────────────────

#[test]
fn handlers_cover_declared_services_only() {
    let provider = provider_from(document(), Path::new("."));
    for service in ["ec2", "alb"] {
        assert!(provider.service_handler(&ServiceType::new(service)).is_some());
    }
    assert!(provider.service_handler(&ServiceType::new("s3")).is_none());
}

#[tokio::test]
async fn format_maps_fields_and_marks_absent() {
    let provider = provider_from(document(), Path::new("."));
    let dataset = fetch(&provider, &Selector::default()).await;
    let handler = provider.service_handler(&ServiceType::new("ec2")).unwrap();
    let (_, record) = dataset.records_of(&ServiceType::new("ec2")).next().unwrap();

    let entity = handler.format(record, &ctx("us-east-1")).unwrap();
    assert_eq!(entity.id, EntityIdentity::new("i-1"));
    assert_eq!(entity.get_str("/instanceType"), Some("t3.micro"));
    assert_eq!(entity.get_str("/region"), Some("us-east-1"));
    assert_eq!(entity.get_str("/accountId"), Some("123456789012"));
    assert_eq!(entity.attr("keyName"), Some(&ABSENT));
}

#[tokio::test]
async fn relations_resolve_by_key_and_by_identity() {
    let provider = provider_from(document(), Path::new("."));
    let dataset = fetch(&provider, &Selector::default()).await;
    let handler = provider.service_handler(&ServiceType::new("alb")).unwrap();
    let (_, record) = dataset.records_of(&ServiceType::new("alb")).next().unwrap();

    let edges = handler
        .resolve_connections(record, &ctx("us-east-1"), &dataset)
        .unwrap();
    let outgoing = edges.get(&EntityIdentity::new("alb-1"));
    assert_eq!(outgoing.len(), 2);
    assert_eq!(outgoing[0].relation, "instances");
    assert_eq!(outgoing[0].target, EntityIdentity::new("i-1"));
    assert_eq!(outgoing[1].target, EntityIdentity::new("sg-1"));

    assert_eq!(handler.relation_cardinality("instances"), Some(Cardinality::Many));
    assert_eq!(handler.relation_cardinality("securityGroup"), None);
}

#[tokio::test]
async fn joined_relations_drop_unknown_targets() {
    let provider = provider_from(document(), Path::new("."));
    let dataset = fetch(&provider, &Selector::parse("us-east-1", "")).await;
    let alb = provider.service_handler(&ServiceType::new("alb")).unwrap();
    let ec2 = provider.service_handler(&ServiceType::new("ec2")).unwrap();

    let mut entities = Vec::new();
    let mut index = cloudgraph_model::ConnectionIndex::new();
    for (handler, service) in [(&ec2, "ec2"), (&alb, "alb")] {
        for (region, record) in dataset.records_of(&ServiceType::new(service)) {
            let context = ctx(region.as_str());
            entities.push(handler.format(record, &context).unwrap());
            index.merge(handler.resolve_connections(record, &context, &dataset).unwrap());
        }
    }

    let connected = join(&entities, &index);
    let alb_entity = connected.iter().find(|c| c.entity.id.as_str() == "alb-1").unwrap();
    assert!(alb_entity.relation("instances").is_some());
    assert!(alb_entity.relation("securityGroup").is_none());
}

#[test]
fn default_mutation_upserts_pascal_type() {
    let provider = provider_from(document(), Path::new("."));
    let handler = provider.service_handler(&ServiceType::new("alb")).unwrap();
    let mutation = handler.mutation();
    assert!(mutation.mutation.contains("addAwsAlb(input: $input, upsert: true)"));
    assert_eq!(mutation.input_variable, "input");
}

#[test]
fn explicit_type_name_overrides_default() {
    let mut value = document();
    value["services"][0]["mutation"] = json!({"typeName": "Instance"});
    let provider = provider_from(value, Path::new("."));
    let handler = provider.service_handler(&ServiceType::new("ec2")).unwrap();
    assert!(handler.mutation().mutation.contains("[AddInstanceInput!]!"));
}

// ── Files ───────────────────────────────────────────────────────

#[tokio::test]
async fn load_reads_data_file_relative_to_inventory() {
    let dir = tempfile::tempdir().unwrap();
    let mut value = document();
    value["services"][1]
        .as_object_mut()
        .unwrap()
        .remove("data");
    value["services"][1]["dataFile"] = json!("alb.json");
    std::fs::write(
        dir.path().join("alb.json"),
        json!([{"region": "us-east-1", "records": [{"LoadBalancerArn": "alb-9"}]}]).to_string(),
    )
    .unwrap();
    let inventory = dir.path().join("aws.json");
    std::fs::write(&inventory, value.to_string()).unwrap();

    let provider = InventoryProvider::load("aws", &inventory).await.unwrap();
    let dataset = fetch(&provider, &Selector::parse("", "alb")).await;
    let (_, record) = dataset.records_of(&ServiceType::new("alb")).next().unwrap();
    assert_eq!(record.get_str("/LoadBalancerArn"), Some("alb-9"));
}

#[tokio::test]
async fn unreadable_data_file_is_fetch_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut value = document();
    value["services"][1]["dataFile"] = json!("missing.json");
    let provider = provider_from(value, dir.path());

    let options = ProviderOptions::default();
    let credentials = provider.credentials(&options).await.unwrap();
    let selector = Selector::default();
    let err = provider
        .raw_data(DataRequest {
            selector: &selector,
            credentials: &credentials,
            options: &options,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Fetch(_)));
}

#[tokio::test]
async fn load_rejects_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let inventory = dir.path().join("aws.json");
    std::fs::write(&inventory, "{ not json").unwrap();
    let err = InventoryProvider::load("aws", &inventory).await.err().unwrap();
    assert!(matches!(err, ProviderError::Serialization(_)));
}
