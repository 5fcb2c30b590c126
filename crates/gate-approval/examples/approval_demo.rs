//! Approval Gate Demo
//!
//! Walks a purchase through the gate with scripted channels.
//!
//! Run with:
//! ```bash
//! cargo run -p gate-approval --example approval_demo
//! ```

use gate_approval::*;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
struct Purchase {
    item: String,
    cost: f64,
}

#[derive(Debug, thiserror::Error)]
#[error("purchase failed")]
struct PurchaseError;

fn purchase_op() -> FnOperation<Purchase, String, PurchaseError> {
    FnOperation::new("make_company_purchase", |p: Purchase| async move {
        Ok(format!("Purchased {} for ${:.2}", p.item, p.cost))
    })
    .with_summary(|args| format!("Purchase {} for ${}", args["item"], args["cost"]))
}

fn context(channel: MockChannel) -> Result<GateContext> {
    GateContext::builder()
        .channel(channel)
        .default_timeout(Duration::from_secs(2))
        .operation(
            "make_company_purchase",
            OperationPolicy::threshold("cost", 500.0),
        )
        .build()
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("🤚 Approval Gate Demo\n");

    // Example 1: below the threshold
    println!("=== Example 1: Auto-approved ===");
    let gate = Gate::new(purchase_op(), context(MockChannel::always_reject("unused"))?);
    let receipt = gate
        .invoke(Purchase {
            item: "Office chairs".to_string(),
            cost: 150.0,
        })
        .await?;
    println!("{}", receipt);
    println!("✓ No approval request was created\n");

    // Example 2: approved by a reviewer
    println!("=== Example 2: Approved ===");
    let gate = Gate::new(purchase_op(), context(MockChannel::always_approve())?);
    let receipt = gate
        .invoke(Purchase {
            item: "Coffee machine".to_string(),
            cost: 800.0,
        })
        .await?;
    println!("{}", receipt);
    println!("Audit records: {}\n", gate.context().audit().count());

    // Example 3: rejected
    println!("=== Example 3: Rejected ===");
    let gate = Gate::new(
        purchase_op(),
        context(MockChannel::always_reject("A Tesla is not office equipment"))?,
    );
    match gate
        .invoke(Purchase {
            item: "Tesla Model S".to_string(),
            cost: 89_000.0,
        })
        .await
    {
        Ok(receipt) => println!("Unexpected: {}", receipt),
        Err(e) => println!("✗ {}", e),
    }
    println!();

    // Example 4: nobody answers
    println!("=== Example 4: Timeout ===");
    let gate = Gate::new(purchase_op(), context(MockChannel::silent())?);
    match gate
        .invoke(Purchase {
            item: "Private jet".to_string(),
            cost: 2_000_000.0,
        })
        .await
    {
        Ok(receipt) => println!("Unexpected: {}", receipt),
        Err(e) => println!("✗ {} (denial: {:?})", e, e.denial_reason()),
    }
    println!();

    // Example 5: external decision through the broker
    println!("=== Example 5: External decision ===");
    let broker = DecisionBroker::new();
    let gate = Gate::new(
        purchase_op(),
        GateContext::builder()
            .channel(MockChannel::silent())
            .broker(broker.clone())
            .operation("make_company_purchase", OperationPolicy::always_require())
            .build()?,
    );

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        for id in broker.pending_ids() {
            println!("Reviewer approves {}", id);
            let _ = broker.resolve(id, ApprovalDecision::approved().with_comment("Looks fine"));
        }
    });

    let receipt = gate
        .invoke(Purchase {
            item: "Standing desk".to_string(),
            cost: 299.99,
        })
        .await?;
    println!("{}", receipt);

    println!("\n✅ Demo complete");
    Ok(())
}
