//! Read-only office tools

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{title_case, usd, OfficeLedger, CHECK_INVENTORY, CHECK_RECENT_PURCHASES, GET_BUDGET};
use crate::{tool::parse_params, Result, Tool, ToolResult, ToolSchema};

/// Entries shown by `check_recent_purchases`
const RECENT_LIMIT: usize = 5;

/// Parameters for `check_inventory`
#[derive(Debug, Deserialize, JsonSchema)]
struct CheckInventoryParams {
    /// Item name; partial names match
    item: String,
}

/// Stock level and unit price of one item
pub struct CheckInventoryTool {
    ledger: OfficeLedger,
}

impl CheckInventoryTool {
    pub fn new(ledger: OfficeLedger) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl Tool for CheckInventoryTool {
    fn name(&self) -> &str {
        CHECK_INVENTORY
    }

    fn description(&self) -> &str {
        "Check if an item is in stock and get pricing information"
    }

    fn parameters_schema(&self) -> ToolSchema {
        ToolSchema::from_type::<CheckInventoryParams>()
    }

    async fn execute(&self, params: Value) -> Result<ToolResult> {
        let params: CheckInventoryParams = parse_params(params)?;
        let label = title_case(&params.item);

        Ok(match self.ledger.lookup(&params.item) {
            Some((_, item)) => ToolResult::text(format!(
                "✅ {}: {} units in stock at {} each",
                label,
                item.stock,
                usd(item.price)
            )),
            None => ToolResult::error(format!("❌ {}: Not found in inventory", label)),
        })
    }
}

/// Remaining budget against the monthly limit
pub struct GetBudgetTool {
    ledger: OfficeLedger,
}

impl GetBudgetTool {
    pub fn new(ledger: OfficeLedger) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl Tool for GetBudgetTool {
    fn name(&self) -> &str {
        GET_BUDGET
    }

    fn description(&self) -> &str {
        "Check the current office supply budget"
    }

    fn parameters_schema(&self) -> ToolSchema {
        ToolSchema::new()
    }

    async fn execute(&self, _params: Value) -> Result<ToolResult> {
        let budget = self.ledger.budget();
        Ok(ToolResult::text(format!(
            "💰 Budget Status: {} remaining of {} monthly limit ({:.1}%)",
            usd(budget.remaining),
            usd(budget.monthly_limit),
            budget.percent_remaining()
        )))
    }
}

/// Latest purchases, newest first
pub struct CheckRecentPurchasesTool {
    ledger: OfficeLedger,
}

impl CheckRecentPurchasesTool {
    pub fn new(ledger: OfficeLedger) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl Tool for CheckRecentPurchasesTool {
    fn name(&self) -> &str {
        CHECK_RECENT_PURCHASES
    }

    fn description(&self) -> &str {
        "Check recent purchase history"
    }

    fn parameters_schema(&self) -> ToolSchema {
        ToolSchema::new()
    }

    async fn execute(&self, _params: Value) -> Result<ToolResult> {
        let recent = self.ledger.recent_purchases(RECENT_LIMIT);
        if recent.is_empty() {
            return Ok(ToolResult::text("📋 No purchases yet"));
        }

        let lines: Vec<String> = recent
            .iter()
            .map(|p| format!("• {} ({} units) - {}", title_case(&p.item), p.quantity, usd(p.cost)))
            .collect();
        Ok(ToolResult::text(format!("📋 Recent Purchases:\n{}", lines.join("\n"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::office::InventoryItem;
    use serde_json::json;

    #[tokio::test]
    async fn test_check_inventory() {
        let tool = CheckInventoryTool::new(OfficeLedger::demo());

        let found = tool.execute(json!({"item": "coffee machine"})).await.unwrap();
        assert_eq!(
            found.to_content(),
            "✅ Coffee Machine: 3 units in stock at $799.99 each"
        );

        let missing = tool.execute(json!({"item": "yacht"})).await.unwrap();
        assert!(!missing.success);
        assert_eq!(missing.to_content(), "❌ Yacht: Not found in inventory");
    }

    #[tokio::test]
    async fn test_check_inventory_requires_item() {
        let tool = CheckInventoryTool::new(OfficeLedger::demo());
        assert!(tool.execute(json!({})).await.is_err());
        assert_eq!(tool.parameters_schema().required, vec!["item".to_string()]);
    }

    #[tokio::test]
    async fn test_get_budget() {
        let tool = GetBudgetTool::new(OfficeLedger::demo());
        let result = tool.execute(json!({})).await.unwrap();
        assert_eq!(
            result.to_content(),
            "💰 Budget Status: $5000.00 remaining of $5000.00 monthly limit (100.0%)"
        );
    }

    #[tokio::test]
    async fn test_recent_purchases() {
        let ledger = OfficeLedger::demo();
        ledger.buy_stock("pens", 4).unwrap();

        let tool = CheckRecentPurchasesTool::new(ledger);
        let content = tool.execute(json!({})).await.unwrap().to_content();

        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("📋 Recent Purchases:"));
        assert_eq!(lines.next(), Some("• Pens (4 units) - $34.00"));
        assert_eq!(lines.count(), 3);
    }

    #[tokio::test]
    async fn test_recent_purchases_empty() {
        let ledger = OfficeLedger::new([("pens", InventoryItem::new(1, 1.0))], 10.0);
        let tool = CheckRecentPurchasesTool::new(ledger);
        assert_eq!(tool.execute(json!({})).await.unwrap().to_content(), "📋 No purchases yet");
    }
}
