//! Ingredient explosion: turns "N units of a product" into the raw
//! quantities that have to leave the shelf.
//!
//! ```text
//! resolve_all_ingredients(Burger, 10)
//!
//!   Burger ×10 (yield 10, scale 1)
//!   ├── Bun    ×1           → leaf
//!   ├── Patty  ×1           → leaf
//!   └── Sauce  ×0.05        → PREPARED, pushed
//!         (yield 100, scale 0.0005)
//!         ├── Tomato  ×0.03
//!         ├── Vinegar ×0.005
//!         └── Sugar   ×0.0075
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::ProductLookup;
use crate::error::{CostError, CostResult};

/// Total quantity of one leaf ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IngredientRequirement {
    pub ingredient_id: String,
    pub quantity: f64,
}

/// Result of an ingredient explosion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IngredientResolution {
    /// One entry per leaf ingredient, ordered by ingredient id.
    pub requirements: Vec<IngredientRequirement>,
    /// Products dropped because they appeared in their own ancestry.
    pub skipped_cycles: Vec<String>,
}

impl IngredientResolution {
    /// Quantity required for `ingredient_id`, if it is part of the result.
    pub fn quantity_of(&self, ingredient_id: &str) -> Option<f64> {
        self.requirements
            .iter()
            .find(|r| r.ingredient_id == ingredient_id)
            .map(|r| r.quantity)
    }
}

/// A pending product expansion on the work stack.
struct Frame {
    product_id: String,
    quantity: f64,
    /// Products expanded above this one on the current branch.
    ancestry: Vec<String>,
}

/// Expands `base_quantity` units of `product_id` into leaf ingredients.
///
/// A product is a leaf when it has no recipe or its recipe consumption is
/// disabled. Otherwise each recipe line is scaled by `quantity / yield`;
/// PREPARED ingredients are expanded further and everything else is
/// accumulated. Quantities for the same leaf are summed.
///
/// A product reached again below itself is skipped and reported in
/// [`IngredientResolution::skipped_cycles`]. The same sub-recipe reached
/// through two sibling branches is not a cycle and is expanded on both.
///
/// ## Errors
/// - [`CostError::InvalidQuantity`] for a negative or non-finite base quantity
/// - [`CostError::ProductNotFound`] for an id missing from `lookup`
/// - [`CostError::InvalidYield`] for a recipe with yield ≤ 0
pub fn resolve_all_ingredients<L>(
    lookup: &L,
    product_id: &str,
    base_quantity: f64,
) -> CostResult<IngredientResolution>
where
    L: ProductLookup + ?Sized,
{
    if !base_quantity.is_finite() || base_quantity < 0.0 {
        return Err(CostError::InvalidQuantity {
            product: product_id.to_string(),
            quantity: base_quantity,
        });
    }

    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    let mut skipped_cycles = Vec::new();
    let mut stack = vec![Frame {
        product_id: product_id.to_string(),
        quantity: base_quantity,
        ancestry: Vec::new(),
    }];

    while let Some(frame) = stack.pop() {
        if frame.ancestry.contains(&frame.product_id) {
            skipped_cycles.push(frame.product_id);
            continue;
        }

        let node = lookup
            .find(&frame.product_id)
            .ok_or_else(|| CostError::ProductNotFound(frame.product_id.clone()))?;

        let Some(recipe) = node.expandable_recipe() else {
            *totals.entry(frame.product_id).or_insert(0.0) += frame.quantity;
            continue;
        };

        let yield_qty = recipe.yield_qty();
        if yield_qty.is_nan() || yield_qty <= 0.0 {
            return Err(CostError::InvalidYield {
                product: frame.product_id,
                yield_qty,
            });
        }
        let scale = frame.quantity / yield_qty;

        let mut ancestry = frame.ancestry;
        ancestry.push(frame.product_id);

        // Reversed so ingredients pop in recipe order.
        for item in recipe.items.iter().rev() {
            let quantity = item.quantity * scale;
            let ingredient = lookup
                .find(&item.ingredient_id)
                .ok_or_else(|| CostError::ProductNotFound(item.ingredient_id.clone()))?;

            if ingredient.is_prepared() {
                stack.push(Frame {
                    product_id: item.ingredient_id.clone(),
                    quantity,
                    ancestry: ancestry.clone(),
                });
            } else {
                *totals.entry(item.ingredient_id.clone()).or_insert(0.0) += quantity;
            }
        }
    }

    skipped_cycles.sort();
    skipped_cycles.dedup();

    Ok(IngredientResolution {
        requirements: totals
            .into_iter()
            .map(|(ingredient_id, quantity)| IngredientRequirement {
                ingredient_id,
                quantity,
            })
            .collect(),
        skipped_cycles,
    })
}
