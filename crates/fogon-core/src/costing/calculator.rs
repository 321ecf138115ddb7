//! Recipe cost roll-up.
//!
//! ## Algorithm
//! ```text
//! cost(Burger)                          yield 10
//!   Bun    1    × 500                 =  500
//!   Patty  1    × 2000                = 2000
//!   Sauce  0.05 × cost(Sauce)         =    5    ← nested
//!                   cost(Sauce)         yield 100
//!                     Tomato  60 × 100 = 6000
//!                     Vinegar 10 × 250 = 2500
//!                     Sugar   15 × 100 = 1500
//!                     ───────────────────────
//!                     10000 / 100     =  100
//!   ───────────────────────────────────────
//!   2505 / 10                         = 250.5
//! ```
//!
//! Problems below the root never abort the roll-up. They are collected in
//! [`RecipeCost::errors`] and the computed cost is withheld.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{ProductLookup, ProductNode};
use crate::error::{CostError, CostResult};
use crate::types::ProductType;

/// One ingredient line of a cost breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CostBreakdownItem {
    pub ingredient_id: String,
    pub ingredient_name: String,
    /// Quantity per batch, as written in the recipe.
    pub quantity: f64,
    /// `None` when the ingredient has no usable cost.
    pub unit_cost: Option<f64>,
    /// `unit_cost × quantity`, or 0 when the unit cost is missing.
    pub total_cost: f64,
    /// Whether the unit cost came from the ingredient's own recipe.
    pub is_nested: bool,
}

/// Outcome of a recipe cost calculation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecipeCost {
    /// Cost of one output unit. `None` when anything went wrong.
    pub calculated_cost: Option<f64>,
    pub breakdown: Vec<CostBreakdownItem>,
    pub has_missing_costs: bool,
    /// Human-readable problems, including those of nested recipes.
    pub errors: Vec<String>,
}

impl RecipeCost {
    fn failed(error: CostError) -> Self {
        RecipeCost {
            errors: vec![error.to_string()],
            ..Default::default()
        }
    }

    /// Sum of the breakdown line totals (one batch).
    pub fn batch_total(&self) -> f64 {
        self.breakdown.iter().map(|item| item.total_cost).sum()
    }
}

/// Calculates the unit cost of `product_id` from its recipe.
///
/// ## Behavior
/// - Not PREPARED, or no recipe: the stored cost is passed through with an
///   empty breakdown
/// - PREPARED ingredients with recipe consumption enabled are costed
///   recursively; every other ingredient uses its stored cost
/// - `calculated_cost = Σ(unit_cost × quantity) / yield`, only when no cost is
///   missing and no error was recorded
///
/// ## Errors
/// Only a missing root product is returned as `Err`. Everything else
/// (missing costs, invalid yields, cycles, dangling ingredients) is reported
/// in [`RecipeCost::errors`].
pub fn calculate_recipe_cost<L>(lookup: &L, product_id: &str) -> CostResult<RecipeCost>
where
    L: ProductLookup + ?Sized,
{
    let root = lookup
        .find(product_id)
        .ok_or_else(|| CostError::ProductNotFound(product_id.to_string()))?;

    Ok(cost_node(lookup, root, &HashSet::new()))
}

fn cost_node<'a, L>(lookup: &'a L, node: &'a ProductNode, visited: &HashSet<&'a str>) -> RecipeCost
where
    L: ProductLookup + ?Sized,
{
    let product = &node.product;

    if visited.contains(product.id.as_str()) {
        return RecipeCost::failed(CostError::CircularDependency(product.name.clone()));
    }

    let recipe = match (&node.recipe, product.product_type) {
        (Some(recipe), ProductType::Prepared) => recipe,
        _ => {
            return RecipeCost {
                calculated_cost: product.cost,
                ..Default::default()
            }
        }
    };

    let yield_qty = recipe.yield_qty();
    if yield_qty.is_nan() || yield_qty <= 0.0 {
        return RecipeCost::failed(CostError::InvalidYield {
            product: product.name.clone(),
            yield_qty,
        });
    }

    // Each level gets its own copy, so siblings never see each other.
    let mut visited = visited.clone();
    visited.insert(product.id.as_str());

    let mut result = RecipeCost::default();
    let mut total = 0.0_f64;

    for item in &recipe.items {
        let Some(ingredient) = lookup.find(&item.ingredient_id) else {
            result
                .errors
                .push(CostError::ProductNotFound(item.ingredient_id.clone()).to_string());
            continue;
        };

        let (unit_cost, is_nested) = if ingredient.product.is_costed_by_recipe() {
            let nested = cost_node(lookup, ingredient, &visited);
            result.errors.extend(nested.errors);
            (nested.calculated_cost, true)
        } else {
            (ingredient.product.cost, false)
        };

        let total_cost = match unit_cost {
            Some(unit_cost) => {
                let line = unit_cost * item.quantity;
                total += line;
                line
            }
            None => {
                result.has_missing_costs = true;
                result
                    .errors
                    .push(CostError::MissingCost(ingredient.product.name.clone()).to_string());
                0.0
            }
        };

        result.breakdown.push(CostBreakdownItem {
            ingredient_id: item.ingredient_id.clone(),
            ingredient_name: ingredient.product.name.clone(),
            quantity: item.quantity,
            unit_cost,
            total_cost,
            is_nested,
        });
    }

    if !total.is_finite() {
        result.errors.push(
            CostError::Computation(format!("total for {} is not a finite number", product.name))
                .to_string(),
        );
    }

    if !result.has_missing_costs && result.errors.is_empty() {
        result.calculated_cost = Some(total / yield_qty);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costing::fixtures::*;
    use crate::costing::RecipeBook;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_burger_cost() {
        let book = burger_book();

        let sauce = calculate_recipe_cost(&book, "sauce").unwrap();
        assert!(approx(sauce.calculated_cost.unwrap(), 100.0));

        let burger = calculate_recipe_cost(&book, "burger").unwrap();
        assert!(burger.errors.is_empty(), "{:?}", burger.errors);
        assert!(!burger.has_missing_costs);
        assert!(approx(burger.batch_total(), 2505.0));
        assert!(approx(burger.calculated_cost.unwrap(), 250.5));

        let sauce_line = burger
            .breakdown
            .iter()
            .find(|item| item.ingredient_id == "sauce")
            .unwrap();
        assert!(sauce_line.is_nested);
        assert!(approx(sauce_line.total_cost, 5.0));

        let bun_line = &burger.breakdown[0];
        assert_eq!(bun_line.ingredient_id, "bun");
        assert!(!bun_line.is_nested);
    }

    #[test]
    fn test_cost_times_yield_equals_batch_total() {
        let book = burger_book();
        for id in ["sauce", "burger"] {
            let cost = calculate_recipe_cost(&book, id).unwrap();
            let yield_qty = book.find(id).unwrap().recipe.as_ref().unwrap().yield_qty();
            assert!(approx(cost.calculated_cost.unwrap() * yield_qty, cost.batch_total()));
        }
    }

    #[test]
    fn test_pass_through() {
        let book = burger_book();
        let bun = calculate_recipe_cost(&book, "bun").unwrap();
        assert_eq!(bun.calculated_cost, Some(500.0));
        assert!(bun.breakdown.is_empty());
        assert!(bun.errors.is_empty());

        // PREPARED without a recipe uses its stored cost too.
        let mut book = RecipeBook::new();
        let mut product = product("soup", ProductType::Prepared, Some(42.0));
        product.enable_recipe_consumption = true;
        book.insert(ProductNode::new(product, None));
        let soup = calculate_recipe_cost(&book, "soup").unwrap();
        assert_eq!(soup.calculated_cost, Some(42.0));
        assert!(soup.breakdown.is_empty());
    }

    #[test]
    fn test_invalid_yield() {
        let mut book = burger_book();
        book.insert(prepared("sauce", 0.0, &[("tomato", 60.0)]));

        let sauce = calculate_recipe_cost(&book, "sauce").unwrap();
        assert_eq!(sauce.calculated_cost, None);
        assert_eq!(sauce.errors, vec!["Recipe yield must be greater than 0"]);

        // The parent inherits the nested error and withholds its cost.
        let burger = calculate_recipe_cost(&book, "burger").unwrap();
        assert_eq!(burger.calculated_cost, None);
        assert!(burger
            .errors
            .contains(&"Recipe yield must be greater than 0".to_string()));
    }

    #[test]
    fn test_missing_cost() {
        let mut book = burger_book();
        let mut bun = raw("bun", 0.0);
        bun.product.cost = None;
        book.insert(bun);

        let burger = calculate_recipe_cost(&book, "burger").unwrap();
        assert!(burger.has_missing_costs);
        assert_eq!(burger.calculated_cost, None);
        assert!(burger
            .errors
            .contains(&"Missing cost for ingredient: bun".to_string()));

        let bun_line = burger
            .breakdown
            .iter()
            .find(|item| item.ingredient_id == "bun")
            .unwrap();
        assert_eq!(bun_line.unit_cost, None);
        assert_eq!(bun_line.total_cost, 0.0);
        // Processing continued past the missing line.
        assert_eq!(burger.breakdown.len(), 3);
    }

    #[test]
    fn test_cycle_terminates() {
        let book: RecipeBook = [
            raw("flour", 1.0),
            prepared("a", 1.0, &[("b", 1.0), ("flour", 1.0)]),
            prepared("b", 1.0, &[("a", 1.0)]),
        ]
        .into_iter()
        .collect();

        let cost = calculate_recipe_cost(&book, "a").unwrap();
        assert_eq!(cost.calculated_cost, None);
        assert!(cost
            .errors
            .iter()
            .any(|e| e.starts_with("Circular dependency detected")));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let book: RecipeBook = [
            raw("salt", 10.0),
            prepared("d", 1.0, &[("salt", 1.0)]),
            prepared("b", 1.0, &[("d", 2.0)]),
            prepared("c", 1.0, &[("d", 3.0)]),
            prepared("a", 1.0, &[("b", 1.0), ("c", 1.0)]),
        ]
        .into_iter()
        .collect();

        let cost = calculate_recipe_cost(&book, "a").unwrap();
        assert!(cost.errors.is_empty(), "{:?}", cost.errors);
        assert!(approx(cost.calculated_cost.unwrap(), 50.0));
    }

    #[test]
    fn test_missing_root_and_dangling_ingredient() {
        let book = burger_book();
        assert_eq!(
            calculate_recipe_cost(&book, "ghost"),
            Err(CostError::ProductNotFound("ghost".to_string()))
        );

        let mut dangling = burger_book();
        dangling.insert(prepared("burger", 10.0, &[("bun", 1.0), ("cheese", 1.0)]));
        let cost = calculate_recipe_cost(&dangling, "burger").unwrap();
        assert_eq!(cost.calculated_cost, None);
        assert_eq!(cost.errors, vec!["Product not found: cheese"]);
    }

    #[test]
    fn test_non_finite_total_is_reported() {
        let book: RecipeBook = [
            raw("gold", f64::MAX),
            prepared("bar", 1.0, &[("gold", 10.0)]),
        ]
        .into_iter()
        .collect();

        let cost = calculate_recipe_cost(&book, "bar").unwrap();
        assert_eq!(cost.calculated_cost, None);
        assert!(cost.errors[0].starts_with("Error calculating cost"));
    }
}
