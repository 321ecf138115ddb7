//! # Recipe Repository
//!
//! Recipe administration and the database side of costing.
//!
//! ## Costing Round Trip
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  calculate_cost(burger)                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  load_book(burger)            breadth-first over recipe_items           │
//! │  ┌────────────────────────┐                                             │
//! │  │ queue: [burger]        │   fetch product, fetch recipe if PREPARED,  │
//! │  │ queue: [bun, patty,    │   enqueue ingredients not seen yet          │
//! │  │         sauce]         │                                             │
//! │  │ queue: [tomato, ...]   │                                             │
//! │  └───────────┬────────────┘                                             │
//! │              │ RecipeBook                                               │
//! │              ▼                                                          │
//! │  fogon_core::costing::calculate_recipe_cost (pure, synchronous)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashSet, VecDeque};

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::product::PRODUCT_COLUMNS;
use fogon_core::costing::{
    calculate_recipe_cost, resolve_all_ingredients, IngredientResolution, ProductNode, RecipeBook,
    RecipeCost,
};
use fogon_core::validation::{validate_recipe_items, validate_recipe_owner, validate_recipe_yield};
use fogon_core::{
    Product, ProductType, Recipe, RecipeItem, RecipeItemInput, RecipeWithItems, DEFAULT_TENANT_ID,
};

/// Repository for recipes and recipe costing.
#[derive(Debug, Clone)]
pub struct RecipeRepository {
    pool: SqlitePool,
}

impl RecipeRepository {
    /// Creates a new RecipeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RecipeRepository { pool }
    }

    // =========================================================================
    // Administration
    // =========================================================================

    /// Gets the recipe of a product, if it has one.
    pub async fn get_recipe(&self, product_id: &str) -> DbResult<Option<RecipeWithItems>> {
        let mut conn = self.pool.acquire().await?;
        fetch_recipe(&mut conn, product_id).await
    }

    /// Creates or replaces the recipe of `product_id`.
    ///
    /// ## Rules
    /// - The product must be PREPARED with recipe consumption enabled
    /// - Yield and every quantity must be positive
    /// - No duplicate ingredient, no self-reference, every ingredient exists
    ///
    /// The recipe row is kept (same id) and its item set is replaced, all in
    /// one transaction.
    pub async fn save_recipe(
        &self,
        product_id: &str,
        yield_qty: f64,
        items: &[RecipeItemInput],
    ) -> DbResult<RecipeWithItems> {
        let mut tx = self.pool.begin().await?;

        let owner = fetch_product(&mut tx, product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))?;

        validate_recipe_owner(&owner)?;
        validate_recipe_yield(yield_qty)?;
        validate_recipe_items(&owner, items)?;

        for item in items {
            if fetch_product(&mut tx, &item.ingredient_id).await?.is_none() {
                return Err(DbError::not_found("Product", &item.ingredient_id));
            }
        }

        let now = Utc::now();
        let existing = fetch_recipe_row(&mut tx, product_id).await?;

        let recipe = match existing {
            Some(mut recipe) => {
                sqlx::query("UPDATE recipes SET yield_qty = ?2, updated_at = ?3 WHERE id = ?1")
                    .bind(&recipe.id)
                    .bind(yield_qty)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query("DELETE FROM recipe_items WHERE recipe_id = ?1")
                    .bind(&recipe.id)
                    .execute(&mut *tx)
                    .await?;
                recipe.yield_qty = yield_qty;
                recipe.updated_at = now;
                recipe
            }
            None => {
                let recipe = Recipe {
                    id: Uuid::new_v4().to_string(),
                    tenant_id: DEFAULT_TENANT_ID.to_string(),
                    product_id: product_id.to_string(),
                    yield_qty,
                    created_at: now,
                    updated_at: now,
                };
                sqlx::query(
                    r#"
                    INSERT INTO recipes (id, tenant_id, product_id, yield_qty, created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                )
                .bind(&recipe.id)
                .bind(&recipe.tenant_id)
                .bind(&recipe.product_id)
                .bind(recipe.yield_qty)
                .bind(recipe.created_at)
                .bind(recipe.updated_at)
                .execute(&mut *tx)
                .await?;
                recipe
            }
        };

        let mut saved_items = Vec::with_capacity(items.len());
        for input in items {
            let item = RecipeItem {
                id: Uuid::new_v4().to_string(),
                recipe_id: recipe.id.clone(),
                ingredient_id: input.ingredient_id.clone(),
                quantity: input.quantity,
            };
            sqlx::query(
                "INSERT INTO recipe_items (id, recipe_id, ingredient_id, quantity) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&item.id)
            .bind(&item.recipe_id)
            .bind(&item.ingredient_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
            saved_items.push(item);
        }

        tx.commit().await?;

        info!(
            product = %owner.sku,
            yield_qty,
            items = saved_items.len(),
            "Recipe saved"
        );

        Ok(RecipeWithItems {
            recipe,
            items: saved_items,
        })
    }

    /// Deletes the recipe of a product. Returns whether one existed.
    pub async fn delete_recipe(&self, product_id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE product_id = ?1")
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        debug!(product_id = %product_id, deleted = result.rows_affected(), "Recipe deleted");
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Costing
    // =========================================================================

    /// Loads every product reachable from `root_id` into a [`RecipeBook`].
    pub async fn load_book(&self, root_id: &str) -> DbResult<RecipeBook> {
        let mut conn = self.pool.acquire().await?;
        load_book(&mut conn, root_id).await
    }

    /// Unit cost of `product_id` rolled up from its recipe.
    pub async fn calculate_cost(&self, product_id: &str) -> DbResult<RecipeCost> {
        let book = self.load_book(product_id).await?;
        let cost = calculate_recipe_cost(&book, product_id)?;

        if !cost.errors.is_empty() {
            debug!(product_id = %product_id, errors = ?cost.errors, "Recipe cost incomplete");
        }

        Ok(cost)
    }

    /// Leaf ingredient quantities for `quantity` units of `product_id`.
    pub async fn resolve_ingredients(
        &self,
        product_id: &str,
        quantity: f64,
    ) -> DbResult<IngredientResolution> {
        let book = self.load_book(product_id).await?;
        let resolution = resolve_all_ingredients(&book, product_id, quantity)?;
        log_skipped_cycles(product_id, &resolution);
        Ok(resolution)
    }

    /// Recomputes the recipe cost and stores it as the product's cost.
    ///
    /// The stored cost is left alone when the calculation is incomplete.
    pub async fn refresh_cost(&self, product_id: &str) -> DbResult<RecipeCost> {
        let cost = self.calculate_cost(product_id).await?;

        if let Some(value) = cost.calculated_cost {
            sqlx::query("UPDATE products SET cost = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(product_id)
                .bind(value)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;
            info!(product_id = %product_id, cost = value, "Product cost refreshed from recipe");
        } else {
            warn!(product_id = %product_id, errors = ?cost.errors, "Recipe cost not refreshed");
        }

        Ok(cost)
    }
}

// =============================================================================
// Shared Helpers
// =============================================================================

pub(crate) fn log_skipped_cycles(product_id: &str, resolution: &IngredientResolution) {
    for skipped in &resolution.skipped_cycles {
        warn!(
            product_id = %product_id,
            skipped = %skipped,
            "Circular recipe dependency skipped during ingredient resolution"
        );
    }
}

pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(product)
}

async fn fetch_recipe_row(conn: &mut SqliteConnection, product_id: &str) -> DbResult<Option<Recipe>> {
    let recipe = sqlx::query_as::<_, Recipe>(
        r#"
        SELECT id, tenant_id, product_id, yield_qty, created_at, updated_at
        FROM recipes
        WHERE product_id = ?1
        "#,
    )
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    Ok(recipe)
}

async fn fetch_recipe(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> DbResult<Option<RecipeWithItems>> {
    let Some(recipe) = fetch_recipe_row(&mut *conn, product_id).await? else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, RecipeItem>(
        r#"
        SELECT id, recipe_id, ingredient_id, quantity
        FROM recipe_items
        WHERE recipe_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(&recipe.id)
    .fetch_all(conn)
    .await?;

    Ok(Some(RecipeWithItems { recipe, items }))
}

/// Breadth-first prefetch of the recipe graph under `root_id`.
///
/// Each product is fetched once. Recipes are only loaded for PREPARED
/// products, which are the only ones the algorithms expand.
pub(crate) async fn load_book(conn: &mut SqliteConnection, root_id: &str) -> DbResult<RecipeBook> {
    let mut book = RecipeBook::new();
    let mut seen: HashSet<String> = HashSet::from([root_id.to_string()]);
    let mut queue: VecDeque<String> = VecDeque::from([root_id.to_string()]);

    while let Some(id) = queue.pop_front() {
        let Some(product) = fetch_product(&mut *conn, &id).await? else {
            if id == root_id {
                return Err(DbError::not_found("Product", id));
            }
            // Left out; the algorithms report it as not found.
            continue;
        };

        let recipe = if product.product_type == ProductType::Prepared {
            fetch_recipe(&mut *conn, &id).await?
        } else {
            None
        };

        if let Some(recipe) = &recipe {
            for item in &recipe.items {
                if seen.insert(item.ingredient_id.clone()) {
                    queue.push_back(item.ingredient_id.clone());
                }
            }
        }

        book.insert(ProductNode::new(product, recipe));
    }

    debug!(root = %root_id, products = book.len(), "Recipe book loaded");
    Ok(book)
}

// =============================================================================
// Unit Tests
// =============================================================================
