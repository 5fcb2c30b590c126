//! Office-supply tools
//!
//! Read-only tools (`check_inventory`, `get_budget`,
//! `check_recent_purchases`) and the purchasing tools a deployment puts
//! behind the approval gate. All of them share one [`OfficeLedger`].

mod inventory;
mod ledger;
mod purchase;

pub use inventory::{CheckInventoryTool, CheckRecentPurchasesTool, GetBudgetTool};
pub use ledger::{
    Budget, InventoryItem, LedgerError, OfficeLedger, PurchaseRecord, DEMO_MONTHLY_BUDGET,
};
pub use purchase::{
    EmergencyBudgetIncreaseTool, MakeCompanyPurchaseTool, PurchaseBasicItemTool,
    PurchaseExpensiveItemTool, PurchaseLuxuryItemTool,
};

use crate::{Result, ToolRegistry};

pub const CHECK_INVENTORY: &str = "check_inventory";
pub const GET_BUDGET: &str = "get_budget";
pub const CHECK_RECENT_PURCHASES: &str = "check_recent_purchases";
pub const PURCHASE_BASIC_ITEM: &str = "purchase_basic_item";
pub const PURCHASE_EXPENSIVE_ITEM: &str = "purchase_expensive_item";
pub const PURCHASE_LUXURY_ITEM: &str = "purchase_luxury_item";
pub const EMERGENCY_BUDGET_INCREASE: &str = "emergency_budget_increase";
pub const MAKE_COMPANY_PURCHASE: &str = "make_company_purchase";

/// Tools that move money
pub const SPENDING_TOOLS: [&str; 5] = [
    PURCHASE_BASIC_ITEM,
    PURCHASE_EXPENSIVE_ITEM,
    PURCHASE_LUXURY_ITEM,
    EMERGENCY_BUDGET_INCREASE,
    MAKE_COMPANY_PURCHASE,
];

/// Register every office tool against `ledger`
pub fn register_office_tools(registry: &ToolRegistry, ledger: &OfficeLedger) -> Result<()> {
    registry.register(CheckInventoryTool::new(ledger.clone()))?;
    registry.register(GetBudgetTool::new(ledger.clone()))?;
    registry.register(CheckRecentPurchasesTool::new(ledger.clone()))?;
    registry.register(PurchaseBasicItemTool::new(ledger.clone()))?;
    registry.register(PurchaseExpensiveItemTool::new(ledger.clone()))?;
    registry.register(PurchaseLuxuryItemTool::new(ledger.clone()))?;
    registry.register(EmergencyBudgetIncreaseTool::new(ledger.clone()))?;
    registry.register(MakeCompanyPurchaseTool::new(ledger.clone()))?;
    Ok(())
}

/// Fresh registry holding the office tools
pub fn office_registry(ledger: &OfficeLedger) -> Result<ToolRegistry> {
    let registry = ToolRegistry::new();
    register_office_tools(&registry, ledger)?;
    Ok(registry)
}

/// `$1234.50`
pub fn usd(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// `$1,234.50`
pub fn usd_grouped(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}

/// Capitalize each word: `"coffee machine"` becomes `"Coffee Machine"`
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
