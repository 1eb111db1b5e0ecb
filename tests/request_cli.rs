mod support;

use support::{TestData, PRIMARY};

#[test]
fn request_add_uses_stock_defaults() {
    let data = TestData::new();
    let added = data.json(&["request", "add", "Notebook para estagiário", "--buyer", "Carlos"]);
    let request = &added["data"]["request"];
    assert_eq!(request["subelement"], "RC");
    assert_eq!(request["situation"], "Pendente");
    assert_eq!(request["nf_tracking"], "Aguardando recebimento");
    assert_eq!(request["buyer"], "Carlos");

    let listed = data.json_as(PRIMARY, &["request", "list"]);
    assert_eq!(listed["data"]["requests"].as_array().map(Vec::len), Some(1));
    assert!(data.path().join("flow_requests.json").is_file());
}

#[test]
fn blank_request_is_rejected() {
    let data = TestData::new();
    data.flow().args(["request", "add", " "]).assert().code(2);
}
