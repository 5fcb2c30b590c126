//! A purchasing session driven through the registry, as the agent does it

use gate_tools::office::{
    office_registry, OfficeLedger, CHECK_INVENTORY, GET_BUDGET, PURCHASE_BASIC_ITEM,
    PURCHASE_EXPENSIVE_ITEM, SPENDING_TOOLS,
};
use gate_tools::ToolError;
use serde_json::json;

#[tokio::test]
async fn test_budget_drains_across_tools() {
    let ledger = OfficeLedger::demo();
    let registry = office_registry(&ledger).unwrap();

    registry
        .execute(PURCHASE_EXPENSIVE_ITEM, json!({"item": "executive desk", "justification": "Corner office"}))
        .await
        .unwrap();
    registry
        .execute(PURCHASE_EXPENSIVE_ITEM, json!({"item": "gaming chair", "justification": "Developer experience"}))
        .await
        .unwrap();

    let budget = registry.execute(GET_BUDGET, json!({})).await.unwrap();
    assert_eq!(
        budget.to_content(),
        "💰 Budget Status: $1200.02 remaining of $5000.00 monthly limit (24.0%)"
    );

    let refused = registry
        .execute(PURCHASE_EXPENSIVE_ITEM, json!({"item": "gaming chair", "justification": "Second one"}))
        .await
        .unwrap();
    assert!(!refused.success);

    let desk = registry
        .execute(CHECK_INVENTORY, json!({"item": "Executive Desk"}))
        .await
        .unwrap();
    assert_eq!(
        desk.to_content(),
        "✅ Executive Desk: 0 units in stock at $2499.99 each"
    );

    let sold_out = registry
        .execute(PURCHASE_BASIC_ITEM, json!({"item": "executive desk", "quantity": 1}))
        .await
        .unwrap();
    assert!(sold_out.to_content().starts_with("❌ Only 0 units of executive desk in stock"));
}

#[tokio::test]
async fn test_descriptors_cover_every_tool() {
    let registry = office_registry(&OfficeLedger::demo()).unwrap();
    let functions = registry.to_openai_functions();
    assert_eq!(functions.len(), 8);

    let names: Vec<&str> = functions
        .iter()
        .filter_map(|f| f["function"]["name"].as_str())
        .collect();
    for tool in SPENDING_TOOLS {
        assert!(names.contains(&tool));
    }

    let luxury = functions
        .iter()
        .find(|f| f["function"]["name"] == "purchase_luxury_item")
        .unwrap();
    let required = luxury["function"]["parameters"]["required"].as_array().unwrap();
    assert_eq!(required.len(), 4);
}

#[tokio::test]
async fn test_malformed_arguments_are_errors() {
    let registry = office_registry(&OfficeLedger::demo()).unwrap();
    let result = registry
        .execute(PURCHASE_BASIC_ITEM, json!({"item": "pens", "quantity": "lots"}))
        .await;
    assert!(matches!(result, Err(ToolError::InvalidParameters(_))));
}
