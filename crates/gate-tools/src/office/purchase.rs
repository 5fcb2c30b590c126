//! Purchasing tools
//!
//! These move money, so deployments normally gate them. The tools
//! themselves only enforce ledger rules: stock, budget and positive amounts.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{
    title_case, usd, usd_grouped, LedgerError, OfficeLedger, EMERGENCY_BUDGET_INCREASE,
    MAKE_COMPANY_PURCHASE, PURCHASE_BASIC_ITEM, PURCHASE_EXPENSIVE_ITEM, PURCHASE_LUXURY_ITEM,
};
use crate::{tool::parse_params, Result, Tool, ToolResult, ToolSchema};

/// Unit price above which an item counts as expensive
const EXPENSIVE_ABOVE: f64 = 200.0;

fn refusal(err: LedgerError, label: &str) -> ToolResult {
    match err {
        LedgerError::NotFound(_) => ToolResult::error(format!("❌ {} not found in inventory", label)),
        other => ToolResult::error(format!("❌ {}", other)),
    }
}

/// Parameters for `purchase_basic_item`
#[derive(Debug, Deserialize, JsonSchema)]
struct BasicPurchaseParams {
    /// Stocked item to buy
    item: String,
    /// Number of units
    quantity: u32,
}

/// Buy several units of a stocked item
pub struct PurchaseBasicItemTool {
    ledger: OfficeLedger,
}

impl PurchaseBasicItemTool {
    pub fn new(ledger: OfficeLedger) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl Tool for PurchaseBasicItemTool {
    fn name(&self) -> &str {
        PURCHASE_BASIC_ITEM
    }

    fn description(&self) -> &str {
        "Purchase basic office supplies - requires approval for financial safety"
    }

    fn parameters_schema(&self) -> ToolSchema {
        ToolSchema::from_type::<BasicPurchaseParams>()
    }

    async fn execute(&self, params: Value) -> Result<ToolResult> {
        let params: BasicPurchaseParams = parse_params(params)?;
        let label = title_case(&params.item);
        if params.quantity == 0 {
            return Ok(ToolResult::error("❌ Quantity must be at least 1"));
        }

        Ok(match self.ledger.buy_stock(&params.item, params.quantity) {
            Ok(record) => ToolResult::text(format!(
                "✅ Successfully purchased {}x {} for {}\n💰 Remaining budget: {}",
                record.quantity,
                label,
                usd(record.cost),
                usd(self.ledger.budget().remaining)
            )),
            Err(err) => refusal(err, &label),
        })
    }
}

/// Parameters for `purchase_expensive_item`
#[derive(Debug, Deserialize, JsonSchema)]
struct ExpensivePurchaseParams {
    /// Stocked item to buy (one unit)
    item: String,
    /// Why the office needs it
    justification: String,
}

/// Buy one unit of a stocked item priced above $200
pub struct PurchaseExpensiveItemTool {
    ledger: OfficeLedger,
}

impl PurchaseExpensiveItemTool {
    pub fn new(ledger: OfficeLedger) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl Tool for PurchaseExpensiveItemTool {
    fn name(&self) -> &str {
        PURCHASE_EXPENSIVE_ITEM
    }

    fn description(&self) -> &str {
        "Purchase expensive office equipment (>$200) - DEFINITELY needs approval"
    }

    fn parameters_schema(&self) -> ToolSchema {
        ToolSchema::from_type::<ExpensivePurchaseParams>()
    }

    async fn execute(&self, params: Value) -> Result<ToolResult> {
        let params: ExpensivePurchaseParams = parse_params(params)?;
        let label = title_case(&params.item);

        let Some((name, item)) = self.ledger.lookup(&params.item) else {
            return Ok(ToolResult::error(format!("❌ {} not found in inventory", label)));
        };
        if item.price <= EXPENSIVE_ABOVE {
            return Ok(ToolResult::error(format!(
                "⚠️ {} costs {} - use {} instead",
                label,
                usd(item.price),
                PURCHASE_BASIC_ITEM
            )));
        }

        Ok(match self.ledger.buy_stock(&name, 1) {
            Ok(record) => ToolResult::text(format!(
                "💸 Purchased {} for {}\n📝 Justification: {}\n💰 Remaining budget: {}",
                label,
                usd(record.cost),
                params.justification,
                usd(self.ledger.budget().remaining)
            )),
            Err(err) => refusal(err, &label),
        })
    }
}

/// Parameters for `purchase_luxury_item`
#[derive(Debug, Deserialize, JsonSchema)]
struct LuxuryPurchaseParams {
    /// What to buy
    item: String,
    /// Price in dollars
    price: f64,
    /// External vendor
    vendor: String,
    /// Why the office needs it
    justification: String,
}

/// Buy from an external vendor at any price the budget covers
pub struct PurchaseLuxuryItemTool {
    ledger: OfficeLedger,
}

impl PurchaseLuxuryItemTool {
    pub fn new(ledger: OfficeLedger) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl Tool for PurchaseLuxuryItemTool {
    fn name(&self) -> &str {
        PURCHASE_LUXURY_ITEM
    }

    fn description(&self) -> &str {
        "Purchase premium luxury office equipment from external vendors - EXTREME approval needed"
    }

    fn parameters_schema(&self) -> ToolSchema {
        ToolSchema::from_type::<LuxuryPurchaseParams>()
    }

    async fn execute(&self, params: Value) -> Result<ToolResult> {
        let params: LuxuryPurchaseParams = parse_params(params)?;
        let label = title_case(&params.item);

        Ok(
            match self.ledger.buy_external(&params.item, params.price, &params.vendor) {
                Ok(record) => ToolResult::text(format!(
                    "🏆 Purchased premium {} from {} for {}\n📝 Justification: {}\n💰 Remaining budget: {}\n⚠️ This was an external purchase - no warranty included!",
                    label,
                    params.vendor,
                    usd(record.cost),
                    params.justification,
                    usd(self.ledger.budget().remaining)
                )),
                Err(err) => refusal(err, &label),
            },
        )
    }
}

/// Parameters for `emergency_budget_increase`
#[derive(Debug, Deserialize, JsonSchema)]
struct BudgetIncreaseParams {
    /// Dollars to add to the budget
    amount: f64,
    /// Why the increase is needed
    reason: String,
}

/// Raise the monthly limit and the remaining budget
pub struct EmergencyBudgetIncreaseTool {
    ledger: OfficeLedger,
}

impl EmergencyBudgetIncreaseTool {
    pub fn new(ledger: OfficeLedger) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl Tool for EmergencyBudgetIncreaseTool {
    fn name(&self) -> &str {
        EMERGENCY_BUDGET_INCREASE
    }

    fn description(&self) -> &str {
        "Request emergency budget increase - requires C-level approval"
    }

    fn parameters_schema(&self) -> ToolSchema {
        ToolSchema::from_type::<BudgetIncreaseParams>()
    }

    async fn execute(&self, params: Value) -> Result<ToolResult> {
        let params: BudgetIncreaseParams = parse_params(params)?;

        Ok(match self.ledger.increase_budget(params.amount) {
            Ok(budget) => ToolResult::text(format!(
                "🚨 EMERGENCY BUDGET APPROVED! Added {}\n📝 Reason: {}\n💰 New budget limit: {}\n💰 New remaining: {}",
                usd(params.amount),
                params.reason,
                usd(budget.monthly_limit),
                usd(budget.remaining)
            )),
            Err(err) => refusal(err, "Budget increase"),
        })
    }
}

/// Parameters for `make_company_purchase`
#[derive(Debug, Deserialize, JsonSchema)]
struct CompanyPurchaseParams {
    /// What to buy
    item: String,
    /// Cost in dollars
    cost: f64,
    /// Why the company needs it
    justification: String,
}

/// Company-level purchase, logged but paid outside the office budget
pub struct MakeCompanyPurchaseTool {
    ledger: OfficeLedger,
}

impl MakeCompanyPurchaseTool {
    pub fn new(ledger: OfficeLedger) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl Tool for MakeCompanyPurchaseTool {
    fn name(&self) -> &str {
        MAKE_COMPANY_PURCHASE
    }

    fn description(&self) -> &str {
        "Make a company purchase - requires approval for financial safety"
    }

    fn parameters_schema(&self) -> ToolSchema {
        ToolSchema::from_type::<CompanyPurchaseParams>()
    }

    async fn execute(&self, params: Value) -> Result<ToolResult> {
        let params: CompanyPurchaseParams = parse_params(params)?;

        Ok(match self.ledger.record(&params.item, params.cost) {
            Ok(record) => ToolResult::text(format!(
                "💳 Purchased {} for {} - {}",
                record.item,
                usd_grouped(record.cost),
                params.justification
            )),
            Err(err) => refusal(err, &params.item),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::office::InventoryItem;
    use serde_json::json;

    #[tokio::test]
    async fn test_basic_purchase() {
        let ledger = OfficeLedger::demo();
        let tool = PurchaseBasicItemTool::new(ledger.clone());

        let result = tool
            .execute(json!({"item": "paper clips", "quantity": 50}))
            .await
            .unwrap();
        assert_eq!(
            result.to_content(),
            "✅ Successfully purchased 50x Paper Clips for $649.50\n💰 Remaining budget: $4350.50"
        );
        assert_eq!(ledger.lookup("paper clips").unwrap().1.stock, 450);
    }

    #[tokio::test]
    async fn test_basic_purchase_refusals() {
        let ledger = OfficeLedger::new(
            [
                ("desk chairs", InventoryItem::new(15, 149.99)),
                ("pens", InventoryItem::new(200, 8.50)),
            ],
            1000.0,
        );
        let tool = PurchaseBasicItemTool::new(ledger);

        let over_budget = tool
            .execute(json!({"item": "desk chairs", "quantity": 15}))
            .await
            .unwrap();
        assert!(!over_budget.success);
        assert!(over_budget.to_content().starts_with("❌ Insufficient budget! Need $2249.85, have $1000.00"));

        let zero = tool.execute(json!({"item": "pens", "quantity": 0})).await.unwrap();
        assert!(!zero.success);

        let missing = tool.execute(json!({"item": "yacht", "quantity": 1})).await.unwrap();
        assert_eq!(missing.to_content(), "❌ Yacht not found in inventory");

        assert!(tool.execute(json!({"item": "pens", "quantity": -3})).await.is_err());
    }

    #[tokio::test]
    async fn test_expensive_purchase() {
        let ledger = OfficeLedger::demo();
        let tool = PurchaseExpensiveItemTool::new(ledger.clone());

        let cheap = tool
            .execute(json!({"item": "desk chairs", "justification": "comfort"}))
            .await
            .unwrap();
        assert_eq!(
            cheap.to_content(),
            "⚠️ Desk Chairs costs $149.99 - use purchase_basic_item instead"
        );

        let bought = tool
            .execute(json!({"item": "coffee machine", "justification": "Team productivity boost"}))
            .await
            .unwrap();
        assert!(bought.success);
        assert!(bought.to_content().starts_with("💸 Purchased Coffee Machine for $799.99"));
        assert!(bought.to_content().contains("📝 Justification: Team productivity boost"));
        assert_eq!(ledger.lookup("coffee machine").unwrap().1.stock, 2);
    }

    #[tokio::test]
    async fn test_luxury_purchase() {
        let ledger = OfficeLedger::demo();
        let tool = PurchaseLuxuryItemTool::new(ledger.clone());

        let result = tool
            .execute(json!({
                "item": "espresso bar",
                "price": 4500.0,
                "vendor": "Barista Pro",
                "justification": "Client impressions"
            }))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result
            .to_content()
            .starts_with("🏆 Purchased premium Espresso Bar from Barista Pro for $4500.00"));
        assert!((ledger.budget().remaining - 500.0).abs() < 1e-9);

        let broke = tool
            .execute(json!({
                "item": "tesla model s",
                "price": 89000.0,
                "vendor": "Tesla",
                "justification": "Client meetings"
            }))
            .await
            .unwrap();
        assert!(!broke.success);
        assert_eq!(
            broke.to_content(),
            "❌ Insufficient budget! Need $89000.00, have $500.00"
        );
    }

    #[tokio::test]
    async fn test_emergency_budget_increase() {
        let ledger = OfficeLedger::demo();
        let tool = EmergencyBudgetIncreaseTool::new(ledger.clone());

        let result = tool
            .execute(json!({"amount": 2500.0, "reason": "Morale"}))
            .await
            .unwrap();
        assert!(result.to_content().contains("💰 New budget limit: $7500.00"));
        assert_eq!(ledger.budget().remaining, 7500.0);

        let negative = tool
            .execute(json!({"amount": -100.0, "reason": "Oops"}))
            .await
            .unwrap();
        assert!(!negative.success);
    }

    #[tokio::test]
    async fn test_company_purchase() {
        let ledger = OfficeLedger::demo();
        let tool = MakeCompanyPurchaseTool::new(ledger.clone());

        let result = tool
            .execute(json!({
                "item": "Private jet",
                "cost": 2000000,
                "justification": "Faster travel to meetings"
            }))
            .await
            .unwrap();
        assert_eq!(
            result.to_content(),
            "💳 Purchased Private jet for $2,000,000.00 - Faster travel to meetings"
        );
        assert_eq!(ledger.budget().remaining, 5000.0);
        assert_eq!(ledger.recent_purchases(1)[0].item, "Private jet");
    }
}
