//! Period profit: fuel margin over weighted average purchase cost, less expenses.

use serde::Serialize;
use uuid::Uuid;

use super::{round2, round3};

/// Aggregates loaded per product for the report window.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductActivity {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity_sold: f64,
    pub sales_amount: f64,
    /// Purchases up to the end of the window, used for the average cost.
    pub purchased_quantity: f64,
    pub purchased_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductProfit {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity_sold: f64,
    pub sales_amount: f64,
    pub average_cost: f64,
    pub cost_of_sales: f64,
    pub gross_profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitSummary {
    pub products: Vec<ProductProfit>,
    pub total_sales: f64,
    pub total_cost: f64,
    pub gross_profit: f64,
    pub total_expenses: f64,
    pub net_profit: f64,
}

pub fn average_cost(purchased_amount: f64, purchased_quantity: f64) -> f64 {
    if purchased_quantity > 0.0 {
        round2(purchased_amount / purchased_quantity)
    } else {
        0.0
    }
}

pub fn summarize(activity: &[ProductActivity], total_expenses: f64) -> ProfitSummary {
    let products: Vec<ProductProfit> = activity
        .iter()
        .map(|a| {
            let average_cost = average_cost(a.purchased_amount, a.purchased_quantity);
            let cost_of_sales = round2(a.quantity_sold * average_cost);
            ProductProfit {
                product_id: a.product_id,
                product_name: a.product_name.clone(),
                quantity_sold: round3(a.quantity_sold),
                sales_amount: round2(a.sales_amount),
                average_cost,
                cost_of_sales,
                gross_profit: round2(a.sales_amount - cost_of_sales),
            }
        })
        .collect();

    let total_sales = round2(products.iter().map(|p| p.sales_amount).sum());
    let total_cost = round2(products.iter().map(|p| p.cost_of_sales).sum());
    let gross_profit = round2(total_sales - total_cost);
    let total_expenses = round2(total_expenses);

    ProfitSummary {
        products,
        total_sales,
        total_cost,
        gross_profit,
        total_expenses,
        net_profit: round2(gross_profit - total_expenses),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(name: &str, sold: f64, sales: f64, bought: f64, paid: f64) -> ProductActivity {
        ProductActivity {
            product_id: Uuid::new_v4(),
            product_name: name.to_string(),
            quantity_sold: sold,
            sales_amount: sales,
            purchased_quantity: bought,
            purchased_amount: paid,
        }
    }

    #[test]
    fn margin_uses_weighted_average_cost() {
        let summary = summarize(
            &[
                activity("Petrol", 1_000.0, 102_000.0, 8_000.0, 784_000.0),
                activity("Diesel", 500.0, 45_000.0, 4_000.0, 344_000.0),
            ],
            2_500.0,
        );

        assert_eq!(summary.products[0].average_cost, 98.0);
        assert_eq!(summary.products[0].gross_profit, 4_000.0);
        assert_eq!(summary.products[1].average_cost, 86.0);
        assert_eq!(summary.products[1].gross_profit, 2_000.0);
        assert_eq!(summary.total_sales, 147_000.0);
        assert_eq!(summary.gross_profit, 6_000.0);
        assert_eq!(summary.net_profit, 3_500.0);
    }

    #[test]
    fn no_purchases_means_zero_cost() {
        let summary = summarize(&[activity("Oil", 10.0, 2_000.0, 0.0, 0.0)], 0.0);
        assert_eq!(summary.products[0].average_cost, 0.0);
        assert_eq!(summary.gross_profit, 2_000.0);
    }

    #[test]
    fn expenses_can_push_into_loss() {
        let summary = summarize(&[], 750.0);
        assert_eq!(summary.net_profit, -750.0);
    }
}
