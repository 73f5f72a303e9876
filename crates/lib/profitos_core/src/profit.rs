//! Profit calculator: revenue, fees, cost of goods, profit and margin.
//!
//! Pure arithmetic over plain inputs. All amounts share one currency unit and
//! no rounding is applied here.

use serde::{Deserialize, Serialize};

/// How a fee rule charges a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeType {
    /// `value` percent of revenue.
    Percent,
    /// `value` per sale.
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleInput {
    pub quantity: f64,
    pub unit_price: f64,
    /// Fee already known for this sale, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_amount: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[serde(default)]
    pub unit_cost: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRuleInput {
    pub fee_type: FeeType,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtraCostInput {
    pub amount: f64,
}

/// Breakdown of a single sale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleAnalysis {
    pub revenue: f64,
    pub fee_amount: f64,
    pub cost_of_goods: f64,
    pub extra_costs: f64,
    pub profit: f64,
    /// Signed, unbounded.
    pub margin_percent: f64,
}

pub fn revenue(sale: &SaleInput) -> f64 {
    sale.quantity * sale.unit_price
}

pub fn fee_from_rule(revenue: f64, rule: &FeeRuleInput) -> f64 {
    match rule.fee_type {
        FeeType::Percent => rule.value / 100.0 * revenue,
        FeeType::Fixed => rule.value,
    }
}

/// Quantity times unit cost; a product without a unit cost costs nothing.
pub fn cost_of_goods(sale: &SaleInput, product: &ProductInput) -> f64 {
    sale.quantity * product.unit_cost.unwrap_or(0.0)
}

pub fn total_extra_costs(costs: &[ExtraCostInput]) -> f64 {
    costs.iter().fold(0.0, |sum, c| sum + c.amount)
}

pub fn profit(revenue: f64, fee_amount: f64, cost_of_goods: f64, extra_costs: f64) -> f64 {
    revenue - fee_amount - cost_of_goods - extra_costs
}

/// `profit / revenue * 100`, or 0 when there is no revenue.
pub fn margin_percent(profit: f64, revenue: f64) -> f64 {
    if revenue == 0.0 {
        return 0.0;
    }
    profit / revenue * 100.0
}

/// Fee to charge a sale: an explicit amount wins, then the rule, then 0.
pub fn resolve_fee_amount(
    explicit: Option<f64>,
    sale: &SaleInput,
    rule: Option<&FeeRuleInput>,
) -> f64 {
    explicit
        .or(sale.fee_amount)
        .or_else(|| rule.map(|r| fee_from_rule(revenue(sale), r)))
        .unwrap_or(0.0)
}

pub fn analyze_sale(
    sale: &SaleInput,
    product: &ProductInput,
    fee_amount: f64,
    extra_costs: &[ExtraCostInput],
) -> SaleAnalysis {
    let revenue = revenue(sale);
    let cost_of_goods = cost_of_goods(sale, product);
    let extra_costs = total_extra_costs(extra_costs);
    let profit = profit(revenue, fee_amount, cost_of_goods, extra_costs);
    SaleAnalysis {
        revenue,
        fee_amount,
        cost_of_goods,
        extra_costs,
        profit,
        margin_percent: margin_percent(profit, revenue),
    }
}
