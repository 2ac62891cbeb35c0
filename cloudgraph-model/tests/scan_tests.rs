use cloudgraph_model::{
    CombinedSchema, Entity, ProviderDataset, RawRecord, RawServiceData, ScanResult,
    SchemaFragment,
};
use cloudgraph_types::{Region, ServiceType};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn push_service_preserves_order() {
    let mut scan = ScanResult::new();
    scan.push_service("ec2".into(), vec![Entity::new("ec2", "i-1")]);
    scan.push_service("alb".into(), vec![Entity::new("alb", "alb#1")]);

    let names: Vec<_> = scan.entities.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["ec2", "alb"]);
    assert_eq!(scan.entity_count(), 2);
}

#[test]
fn push_service_twice_extends_one_group() {
    let mut scan = ScanResult::new();
    scan.push_service("ec2".into(), vec![Entity::new("ec2", "i-1")]);
    scan.push_service("alb".into(), vec![]);
    scan.push_service("ec2".into(), vec![Entity::new("ec2", "i-2")]);

    assert_eq!(scan.entities.len(), 2);
    let ids: Vec<_> = scan
        .service(&ServiceType::new("ec2"))
        .unwrap()
        .data
        .iter()
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(ids, vec!["i-1", "i-2"]);
}

#[test]
fn joiner_spans_all_services() {
    let mut scan = ScanResult::new();
    scan.push_service("ec2".into(), vec![Entity::new("ec2", "i-1")]);
    scan.push_service("alb".into(), vec![Entity::new("alb", "alb#1")]);
    scan.connections.connect("alb#1", "instances", "i-1");

    let joiner = scan.joiner();
    let alb = &scan.entities[1].data[0];
    let connected = joiner.connect(alb);
    assert!(connected.relation("instances").is_some());
}

#[test]
fn snapshot_shape() {
    let mut scan = ScanResult::new();
    scan.push_service("ec2".into(), vec![Entity::new("ec2", "i-1")]);
    scan.connections.connect("i-1", "vpc", "vpc-1");

    let json = serde_json::to_value(&scan).unwrap();
    assert_eq!(
        json,
        json!({
            "entities": [{"name": "ec2", "data": [{"id": "i-1", "serviceType": "ec2"}]}],
            "connections": {"i-1": [{"relation": "vpc", "target": "vpc-1"}]}
        })
    );
}

#[test]
fn dataset_records_in_region_then_fetch_order() {
    let service = RawServiceData::new("ec2".into())
        .with_region(
            "us-west-2".into(),
            vec![RawRecord::new(json!({"n": 1})), RawRecord::new(json!({"n": 2}))],
        )
        .with_region("us-east-1".into(), vec![RawRecord::new(json!({"n": 3}))]);
    let dataset = ProviderDataset::new(vec![service]);

    let seen: Vec<_> = dataset
        .records_of(&ServiceType::new("ec2"))
        .map(|(region, record)| (region.as_str(), record.pointer("/n").cloned()))
        .collect();
    assert_eq!(
        seen,
        vec![
            ("us-west-2", Some(json!(1))),
            ("us-west-2", Some(json!(2))),
            ("us-east-1", Some(json!(3))),
        ]
    );
    assert_eq!(dataset.record_count(), 3);
    assert_eq!(dataset.records_of(&ServiceType::new("rds")).count(), 0);
    assert_eq!(
        dataset.services()[0].regions[1].region,
        Region::new("us-east-1")
    );
}

#[test]
fn combined_schema_concatenates_in_provider_order() {
    let schema: CombinedSchema = vec![
        SchemaFragment::new("aws", vec!["type AwsEc2 { id: String! @id }".into()]),
        SchemaFragment::new("azure", vec![
            "type AzureVm { id: String! @id }".into(),
            "type AzureNic { id: String! @id }".into(),
        ]),
    ]
    .into_iter()
    .collect();

    assert_eq!(schema.type_def_count(), 3);
    assert_eq!(
        schema.document(),
        "type AwsEc2 { id: String! @id }\ntype AzureVm { id: String! @id }\ntype AzureNic { id: String! @id }"
    );
    assert_eq!(schema.fragments()[1].document().lines().count(), 2);
}

#[test]
fn combined_schema_keeps_duplicates() {
    let mut schema = CombinedSchema::new();
    assert!(schema.is_empty());
    schema.push(SchemaFragment::new("a", vec!["type T { id: ID! }".into()]));
    schema.push(SchemaFragment::new("b", vec!["type T { id: ID! }".into()]));
    assert_eq!(schema.type_def_count(), 2);
}
