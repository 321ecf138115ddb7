//! # Costing Module
//!
//! Recipe cost roll-up and ingredient explosion over an in-memory recipe
//! graph.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Costing Pipeline                                 │
//! │                                                                         │
//! │  fogon-db                          fogon-core (this module)             │
//! │  ────────                          ──────────────────────────           │
//! │  RecipeRepository::load_book ──►   RecipeBook (HashMap<id, ProductNode>)│
//! │    breadth-first, each                    │                             │
//! │    product fetched once                   │ impl ProductLookup          │
//! │                                           ▼                             │
//! │                          ┌────────────────┴────────────────┐            │
//! │                          │                                 │            │
//! │                resolve_all_ingredients         calculate_recipe_cost    │
//! │                (leaf quantities for a          (unit cost of one        │
//! │                 sale or production run)         output unit)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both algorithms are synchronous and read-only. They never touch the
//! database; whoever calls them decides what goes into the book.

mod calculator;
mod ingredients;

pub use calculator::{calculate_recipe_cost, CostBreakdownItem, RecipeCost};
pub use ingredients::{resolve_all_ingredients, IngredientRequirement, IngredientResolution};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Product, ProductType, RecipeWithItems};

// =============================================================================
// Product Lookup
// =============================================================================

/// Read access to the products of a recipe graph.
///
/// Implemented by [`RecipeBook`]; tests can implement it over any map.
pub trait ProductLookup {
    /// Returns the product and its recipe, if the product is known.
    fn find(&self, product_id: &str) -> Option<&ProductNode>;
}

/// A product plus the recipe it owns, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductNode {
    pub product: Product,
    pub recipe: Option<RecipeWithItems>,
}

impl ProductNode {
    pub fn new(product: Product, recipe: Option<RecipeWithItems>) -> Self {
        ProductNode { product, recipe }
    }

    /// The recipe, if this node expands into ingredients during explosion.
    ///
    /// A recipe on a product with consumption disabled is ignored, and the
    /// product is treated as a leaf.
    pub fn expandable_recipe(&self) -> Option<&RecipeWithItems> {
        if self.product.enable_recipe_consumption {
            self.recipe.as_ref()
        } else {
            None
        }
    }

    #[inline]
    pub fn is_prepared(&self) -> bool {
        self.product.product_type == ProductType::Prepared
    }
}

// =============================================================================
// Recipe Book
// =============================================================================

/// A prefetched recipe graph keyed by product id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeBook {
    nodes: HashMap<String, ProductNode>,
}

impl RecipeBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a node.
    pub fn insert(&mut self, node: ProductNode) {
        self.nodes.insert(node.product.id.clone(), node);
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.nodes.contains_key(product_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ProductNode> {
        self.nodes.values()
    }
}

impl ProductLookup for RecipeBook {
    fn find(&self, product_id: &str) -> Option<&ProductNode> {
        self.nodes.get(product_id)
    }
}

impl FromIterator<ProductNode> for RecipeBook {
    fn from_iter<I: IntoIterator<Item = ProductNode>>(iter: I) -> Self {
        let mut book = RecipeBook::new();
        for node in iter {
            book.insert(node);
        }
        book
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    //! Hand-built recipe graphs shared by the costing tests.

    use super::*;
    use crate::types::{Recipe, RecipeItem};
    use chrono::Utc;

    pub fn product(id: &str, product_type: ProductType, cost: Option<f64>) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            tenant_id: crate::DEFAULT_TENANT_ID.to_string(),
            sku: id.to_uppercase(),
            barcode: None,
            name: id.to_string(),
            description: None,
            product_type,
            price_cents: 0,
            cost,
            enable_recipe_consumption: product_type == ProductType::Prepared,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn raw(id: &str, cost: f64) -> ProductNode {
        ProductNode::new(product(id, ProductType::Raw, Some(cost)), None)
    }

    pub fn prepared(id: &str, yield_qty: f64, items: &[(&str, f64)]) -> ProductNode {
        let now = Utc::now();
        let recipe_id = format!("recipe-{id}");
        let recipe = RecipeWithItems {
            recipe: Recipe {
                id: recipe_id.clone(),
                tenant_id: crate::DEFAULT_TENANT_ID.to_string(),
                product_id: id.to_string(),
                yield_qty,
                created_at: now,
                updated_at: now,
            },
            items: items
                .iter()
                .map(|(ingredient, quantity)| RecipeItem {
                    id: format!("{recipe_id}-{ingredient}"),
                    recipe_id: recipe_id.clone(),
                    ingredient_id: ingredient.to_string(),
                    quantity: *quantity,
                })
                .collect(),
        };
        ProductNode::new(product(id, ProductType::Prepared, None), Some(recipe))
    }

    /// Bun 500, Patty 2000, Sauce (yield 100) from tomato, vinegar and sugar,
    /// Burger (yield 10) from one bun, one patty and 0.05 sauce.
    pub fn burger_book() -> RecipeBook {
        [
            raw("bun", 500.0),
            raw("patty", 2000.0),
            raw("tomato", 100.0),
            raw("vinegar", 250.0),
            raw("sugar", 100.0),
            prepared("sauce", 100.0, &[("tomato", 60.0), ("vinegar", 10.0), ("sugar", 15.0)]),
            prepared("burger", 10.0, &[("bun", 1.0), ("patty", 1.0), ("sauce", 0.05)]),
        ]
        .into_iter()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_book_lookup() {
        let book = burger_book();
        assert_eq!(book.len(), 7);
        assert!(book.contains("sauce"));
        assert!(book.find("burger").and_then(|n| n.recipe.as_ref()).is_some());
        assert!(book.find("nope").is_none());
    }

    #[test]
    fn test_disabled_consumption_is_not_expandable() {
        let mut node = prepared("sauce", 100.0, &[("tomato", 1.0)]);
        assert!(node.expandable_recipe().is_some());

        node.product.enable_recipe_consumption = false;
        assert!(node.expandable_recipe().is_none());
    }
}
