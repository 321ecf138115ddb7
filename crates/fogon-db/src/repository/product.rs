//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Create with validation
//! - Lookup by id / SKU, LIKE search
//! - Manual cost edits (recipe refresh and receipts update cost elsewhere)

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use fogon_core::validation::{
    validate_price_cents, validate_product_name, validate_search_query, validate_sku,
    validate_unit_cost,
};
use fogon_core::{CoreError, Product, ProductType, DEFAULT_TENANT_ID};

pub(crate) const PRODUCT_COLUMNS: &str = "id, tenant_id, sku, barcode, name, description, \
     product_type, price_cents, cost, enable_recipe_consumption, is_active, created_at, updated_at";

/// Fields needed to create a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub product_type: ProductType,
    pub price_cents: i64,
    pub cost: Option<f64>,
    pub enable_recipe_consumption: bool,
}

impl NewProduct {
    /// A product with no price, no cost and consumption enabled only for
    /// PREPARED items.
    pub fn new(sku: impl Into<String>, name: impl Into<String>, product_type: ProductType) -> Self {
        NewProduct {
            sku: sku.into(),
            barcode: None,
            name: name.into(),
            description: None,
            product_type,
            price_cents: 0,
            cost: None,
            enable_recipe_consumption: product_type == ProductType::Prepared,
        }
    }

    pub fn cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn price_cents(mut self, price_cents: i64) -> Self {
        self.price_cents = price_cents;
        self
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let sauce = repo.create(&NewProduct::new("SALSA", "Salsa", ProductType::Prepared)).await?;
/// let found = repo.get_by_sku("SALSA").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Validates and inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with generated id and timestamps
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn create(&self, input: &NewProduct) -> DbResult<Product> {
        validate_sku(&input.sku)?;
        validate_product_name(&input.name)?;
        validate_price_cents(input.price_cents)?;
        if let Some(cost) = input.cost {
            validate_unit_cost(cost)?;
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            sku: input.sku.trim().to_string(),
            barcode: input.barcode.clone(),
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            product_type: input.product_type,
            price_cents: input.price_cents,
            cost: input.cost,
            enable_recipe_consumption: input.enable_recipe_consumption,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(sku = %product.sku, product_type = product.product_type.as_str(), "Inserting product");

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                id, tenant_id, sku, barcode, name, description,
                product_type, price_cents, cost, enable_recipe_consumption,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.product_type)
        .bind(product.price_cents)
        .bind(product.cost)
        .bind(product.enable_recipe_consumption)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(product),
            Err(err) => match DbError::from(err) {
                DbError::UniqueViolation { .. } => Err(DbError::duplicate("sku", &product.sku)),
                other => Err(other),
            },
        }
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by ID or fails with `NotFound`.
    pub async fn require(&self, id: &str) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1 AND tenant_id = ?2");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(sku)
            .bind(DEFAULT_TENANT_ID)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Searches active products by SKU, name or barcode substring.
    ///
    /// An empty query lists active products by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, limit = %limit, "Searching products");

        let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active = 1
              AND (?1 = '%%'
                   OR sku LIKE ?1 ESCAPE '\'
                   OR name LIKE ?1 ESCAPE '\'
                   OR barcode LIKE ?1 ESCAPE '\')
            ORDER BY name
            LIMIT ?2
            "#
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(&pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Sets the stored unit cost by hand. `None` clears it.
    pub async fn update_cost(&self, id: &str, cost: Option<f64>) -> DbResult<()> {
        if let Some(cost) = cost {
            validate_unit_cost(cost)?;
        }

        debug!(id = %id, ?cost, "Updating product cost");

        let result = sqlx::query("UPDATE products SET cost = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(cost)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Turns recipe consumption on or off for a product.
    ///
    /// Disabling is refused while the product owns a recipe, since only
    /// products with consumption enabled may own one.
    pub async fn set_recipe_consumption(&self, id: &str, enabled: bool) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        if !enabled {
            let recipes: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE product_id = ?1")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
            if recipes > 0 {
                return Err(CoreError::RecipeStillAttached { sku: product.sku }.into());
            }
        }

        sqlx::query(
            "UPDATE products SET enable_recipe_consumption = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(enabled)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(sku = %product.sku, enabled, "Recipe consumption toggled");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
