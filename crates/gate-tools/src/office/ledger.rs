//! Shared inventory and budget state behind the office tools

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// Monthly office-supply budget used by [`OfficeLedger::demo`]
pub const DEMO_MONTHLY_BUDGET: f64 = 5000.0;

/// One stocked item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Units on hand
    pub stock: u32,
    /// Unit price in dollars
    pub price: f64,
}

impl InventoryItem {
    pub fn new(stock: u32, price: f64) -> Self {
        Self { stock, price }
    }
}

/// Budget snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub remaining: f64,
    pub monthly_limit: f64,
}

impl Budget {
    /// Remaining budget as a percentage of the monthly limit
    pub fn percent_remaining(&self) -> f64 {
        if self.monthly_limit <= 0.0 {
            return 0.0;
        }
        self.remaining / self.monthly_limit * 100.0
    }
}

/// A completed purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub item: String,
    pub quantity: u32,
    /// Total cost in dollars
    pub cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    pub purchased_at: DateTime<Utc>,
}

impl PurchaseRecord {
    fn new(item: impl Into<String>, quantity: u32, cost: f64) -> Self {
        Self {
            item: item.into(),
            quantity,
            cost,
            vendor: None,
            purchased_at: Utc::now(),
        }
    }
}

/// Why the ledger refused a change
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("{0} not found in inventory")]
    NotFound(String),

    #[error("Insufficient budget! Need ${needed:.2}, have ${available:.2}")]
    InsufficientBudget { needed: f64, available: f64 },

    #[error("Only {available} units of {item} in stock, {requested} requested")]
    InsufficientStock {
        item: String,
        requested: u32,
        available: u32,
    },

    #[error("Amount must be a positive number, got {0}")]
    InvalidAmount(f64),
}

#[derive(Debug)]
struct LedgerState {
    inventory: Vec<(String, InventoryItem)>,
    budget: Budget,
    history: Vec<PurchaseRecord>,
}

impl LedgerState {
    fn position(&self, query: &str) -> Option<usize> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        self.inventory
            .iter()
            .position(|(key, _)| *key == query)
            .or_else(|| {
                self.inventory
                    .iter()
                    .position(|(key, _)| key.contains(&query) || query.contains(key.as_str()))
            })
    }

    fn charge(&mut self, cost: f64) -> Result<(), LedgerError> {
        if self.budget.remaining < cost {
            return Err(LedgerError::InsufficientBudget {
                needed: cost,
                available: self.budget.remaining,
            });
        }
        self.budget.remaining -= cost;
        Ok(())
    }
}

/// Inventory, budget and purchase history shared by the office tools
///
/// Clones share state. Every mutation happens under one lock, so a check
/// and the charge that follows it cannot interleave with another purchase.
#[derive(Debug, Clone)]
pub struct OfficeLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl OfficeLedger {
    /// Ledger with the given stock and a full monthly budget
    ///
    /// Item names are matched case-insensitively.
    pub fn new<I, S>(inventory: I, monthly_limit: f64) -> Self
    where
        I: IntoIterator<Item = (S, InventoryItem)>,
        S: Into<String>,
    {
        let inventory = inventory
            .into_iter()
            .map(|(name, item)| (name.into().trim().to_lowercase(), item))
            .collect();

        Self {
            state: Arc::new(Mutex::new(LedgerState {
                inventory,
                budget: Budget {
                    remaining: monthly_limit,
                    monthly_limit,
                },
                history: Vec::new(),
            })),
        }
    }

    /// The demo office: nine stocked items, $5000 budget and a short history
    pub fn demo() -> Self {
        let ledger = Self::new(
            [
                ("paper clips", InventoryItem::new(500, 12.99)),
                ("pens", InventoryItem::new(200, 8.50)),
                ("staplers", InventoryItem::new(50, 24.99)),
                ("coffee", InventoryItem::new(30, 15.99)),
                ("desk chairs", InventoryItem::new(15, 149.99)),
                ("standing desks", InventoryItem::new(8, 299.99)),
                ("coffee machine", InventoryItem::new(3, 799.99)),
                ("gaming chair", InventoryItem::new(2, 1299.99)),
                ("executive desk", InventoryItem::new(1, 2499.99)),
            ],
            DEMO_MONTHLY_BUDGET,
        );

        {
            let mut state = ledger.lock();
            state.history.extend([
                PurchaseRecord::new("Paper clips", 500, 12.99),
                PurchaseRecord::new("Coffee pods", 50, 24.99),
                PurchaseRecord::new("Sticky notes", 10, 8.50),
            ]);
        }
        ledger
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Find a stocked item
    ///
    /// An exact name wins; otherwise the first item whose name contains the
    /// query, or is contained in it.
    pub fn lookup(&self, query: &str) -> Option<(String, InventoryItem)> {
        let state = self.lock();
        state
            .position(query)
            .map(|index| state.inventory[index].clone())
    }

    /// All stocked items in catalogue order
    pub fn inventory(&self) -> Vec<(String, InventoryItem)> {
        self.lock().inventory.clone()
    }

    pub fn budget(&self) -> Budget {
        self.lock().budget
    }

    /// Up to `limit` purchases, most recent first
    pub fn recent_purchases(&self, limit: usize) -> Vec<PurchaseRecord> {
        self.lock().history.iter().rev().take(limit).cloned().collect()
    }

    /// Buy `quantity` units of a stocked item
    pub fn buy_stock(&self, query: &str, quantity: u32) -> Result<PurchaseRecord, LedgerError> {
        let mut state = self.lock();
        let index = state
            .position(query)
            .ok_or_else(|| LedgerError::NotFound(query.trim().to_string()))?;

        let (name, item) = state.inventory[index].clone();
        if quantity > item.stock {
            return Err(LedgerError::InsufficientStock {
                item: name,
                requested: quantity,
                available: item.stock,
            });
        }

        let cost = f64::from(quantity) * item.price;
        state.charge(cost)?;
        state.inventory[index].1.stock -= quantity;

        let record = PurchaseRecord::new(name, quantity, cost);
        state.history.push(record.clone());
        tracing::info!(item = %record.item, quantity, cost, "Stock purchased");
        Ok(record)
    }

    /// Buy from an outside vendor; only the budget is checked
    pub fn buy_external(
        &self,
        item: &str,
        price: f64,
        vendor: &str,
    ) -> Result<PurchaseRecord, LedgerError> {
        ensure_positive(price)?;
        let mut state = self.lock();
        state.charge(price)?;

        let record = PurchaseRecord {
            vendor: Some(vendor.to_string()),
            ..PurchaseRecord::new(item, 1, price)
        };
        state.history.push(record.clone());
        tracing::info!(item, vendor, price, "External purchase");
        Ok(record)
    }

    /// Log a purchase paid outside the office budget
    pub fn record(&self, item: &str, cost: f64) -> Result<PurchaseRecord, LedgerError> {
        ensure_positive(cost)?;
        let record = PurchaseRecord::new(item, 1, cost);
        self.lock().history.push(record.clone());
        Ok(record)
    }

    /// Raise both the remaining budget and the monthly limit
    pub fn increase_budget(&self, amount: f64) -> Result<Budget, LedgerError> {
        ensure_positive(amount)?;
        let mut state = self.lock();
        state.budget.remaining += amount;
        state.budget.monthly_limit += amount;
        tracing::warn!(amount, new_limit = state.budget.monthly_limit, "Budget increased");
        Ok(state.budget)
    }
}

impl Default for OfficeLedger {
    fn default() -> Self {
        Self::demo()
    }
}

fn ensure_positive(amount: f64) -> Result<(), LedgerError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount(amount))
    }
}
