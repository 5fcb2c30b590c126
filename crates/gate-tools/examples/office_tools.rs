//! Office tools demo
//!
//! Runs the office-supply tools directly, without a model or approvals.
//!
//! Run with:
//! ```bash
//! cargo run -p gate-tools --example office_tools
//! ```

use gate_tools::office::{office_registry, OfficeLedger};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🛠️  Office Tools Demo\n");

    let ledger = OfficeLedger::demo();
    let registry = office_registry(&ledger)?;

    println!("=== Registered Tools ===");
    for name in registry.list_tools() {
        if let Some(tool) = registry.get_tool(&name) {
            println!("  • {}: {}", tool.name(), tool.description());
        }
    }
    println!();

    let calls = [
        ("get_budget", json!({})),
        ("check_inventory", json!({"item": "coffee machine"})),
        ("purchase_basic_item", json!({"item": "paper clips", "quantity": 50})),
        ("purchase_expensive_item", json!({"item": "standing desks", "justification": "Ergonomics"})),
        ("purchase_luxury_item", json!({"item": "tesla model s", "price": 89000.0, "vendor": "Tesla", "justification": "Client meetings"})),
        ("check_recent_purchases", json!({})),
    ];

    for (name, params) in calls {
        println!("=== {} {} ===", name, params);
        let result = registry.execute(name, params).await?;
        println!("{}\n", result.to_content());
    }

    Ok(())
}
