//! # Inventory Repository
//!
//! Warehouses, stock levels and the movement audit trail.
//!
//! ## Stock Changes
//! Every change to a `stock_levels` row is paired with one append-only
//! `stock_movements` row written in the same transaction:
//!
//! | Operation          | Movement   | Level change                      | Voucher        |
//! |--------------------|------------|-----------------------------------|----------------|
//! | `receive_goods`    | IN         | + quantity                        | Dr 1435 / Cr 2205 |
//! | `consume_for_sale` | OUT        | − quantity per leaf ingredient    | Dr 6135 / Cr 1435 |
//! | `transfer`         | TRANSFER   | − source, + destination           | none           |
//!
//! Levels may go negative. A sale is never blocked by a missing count.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::ledger::insert_entry;
use crate::repository::recipe::{fetch_product, load_book, log_skipped_cycles};
use fogon_core::costing::{resolve_all_ingredients, ProductLookup};
use fogon_core::inventory::{moving_average_cost, ConsumptionOutcome, GoodsReceipt, ReceiptOutcome};
use fogon_core::ledger::{cost_of_sales_entry, goods_receipt_entry};
use fogon_core::validation::{
    validate_product_name, validate_quantity, validate_sku, validate_stock_limits,
};
use fogon_core::{
    CoreError, Money, MovementType, Product, StockLevel, StockMovement, Warehouse,
    DEFAULT_TENANT_ID, QUANTITY_EPSILON,
};

const WAREHOUSE_COLUMNS: &str = "id, tenant_id, code, name, is_active, created_at";

const LEVEL_COLUMNS: &str = "id, tenant_id, warehouse_id, product_id, variant_id, quantity, \
     min_stock, max_stock, updated_at";

const MOVEMENT_COLUMNS: &str = "id, tenant_id, movement_type, warehouse_id, to_warehouse_id, \
     product_id, variant_id, quantity, unit_cost, reason, reference, created_at";

/// Repository for stock operations.
///
/// ## Usage
/// ```rust,ignore
/// let inventory = db.inventory();
/// let bodega = inventory.create_warehouse("BOD-1", "Bodega principal").await?;
/// let outcome = inventory.receive_goods(&receipt).await?;
/// inventory.consume_for_sale(&bodega.id, &burger.id, 2.0, Some("VENTA-17")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    // =========================================================================
    // Warehouses
    // =========================================================================

    /// Creates an active warehouse. Codes are unique per tenant.
    pub async fn create_warehouse(&self, code: &str, name: &str) -> DbResult<Warehouse> {
        validate_sku(code)?;
        validate_product_name(name)?;

        let warehouse = Warehouse {
            id: Uuid::new_v4().to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            code: code.trim().to_string(),
            name: name.trim().to_string(),
            is_active: true,
            created_at: Utc::now(),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO warehouses (id, tenant_id, code, name, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&warehouse.id)
        .bind(&warehouse.tenant_id)
        .bind(&warehouse.code)
        .bind(&warehouse.name)
        .bind(warehouse.is_active)
        .bind(warehouse.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(code = %warehouse.code, id = %warehouse.id, "Warehouse created");
                Ok(warehouse)
            }
            Err(err) => match DbError::from(err) {
                DbError::UniqueViolation { .. } => Err(DbError::duplicate("code", &warehouse.code)),
                other => Err(other),
            },
        }
    }

    /// Gets a warehouse by ID, active or not.
    pub async fn get_warehouse(&self, id: &str) -> DbResult<Option<Warehouse>> {
        let sql = format!("SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE id = ?1");
        let warehouse = sqlx::query_as::<_, Warehouse>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(warehouse)
    }

    /// Lists active warehouses by code.
    pub async fn list_warehouses(&self) -> DbResult<Vec<Warehouse>> {
        let sql = format!(
            "SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE is_active = 1 AND tenant_id = ?1 ORDER BY code"
        );
        let warehouses = sqlx::query_as::<_, Warehouse>(&sql)
            .bind(DEFAULT_TENANT_ID)
            .fetch_all(&self.pool)
            .await?;
        Ok(warehouses)
    }

    /// Marks a warehouse inactive. Its levels and movements are kept.
    pub async fn deactivate_warehouse(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE warehouses SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Warehouse", id));
        }
        Ok(())
    }

    // =========================================================================
    // Goods Receipt
    // =========================================================================

    /// Receives goods into a warehouse.
    ///
    /// One transaction per receipt: IN movements, level increments,
    /// moving-average cost updates and the supplier voucher. Any failure
    /// rolls back all of it.
    ///
    /// ## Errors
    /// - `CoreError::WarehouseNotFound` for a missing or inactive warehouse
    /// - `DbError::NotFound` for an unknown product
    /// - `DbError::Domain` for an invalid line
    pub async fn receive_goods(&self, receipt: &GoodsReceipt) -> DbResult<ReceiptOutcome> {
        receipt.validate()?;

        let mut tx = self.pool.begin().await?;
        require_active_warehouse(&mut tx, &receipt.warehouse_id).await?;

        let reference = receipt.reference.as_deref();
        let mut movements = Vec::with_capacity(receipt.lines.len());
        let mut updated_costs = Vec::with_capacity(receipt.lines.len());

        for line in &receipt.lines {
            // Re-read per line: an earlier line may have moved the same product's cost.
            let product = require_product(&mut tx, &line.product_id).await?;
            let variant_id = variant_key(line.variant_id.as_deref());

            let movement = StockMovement {
                id: Uuid::new_v4().to_string(),
                tenant_id: DEFAULT_TENANT_ID.to_string(),
                movement_type: MovementType::In,
                warehouse_id: receipt.warehouse_id.clone(),
                to_warehouse_id: None,
                product_id: product.id.clone(),
                variant_id: variant_id.map(str::to_string),
                quantity: line.quantity,
                unit_cost: Some(line.unit_cost),
                reason: "Goods receipt".to_string(),
                reference: reference.map(str::to_string),
                created_at: Utc::now(),
            };
            insert_movement(&mut tx, &movement).await?;

            let on_hand = total_on_hand(&mut tx, &product.id).await?;
            adjust_level(
                &mut tx,
                &receipt.warehouse_id,
                &product.id,
                variant_id,
                line.quantity,
            )
            .await?;

            let new_cost = moving_average_cost(on_hand, product.cost, line.quantity, line.unit_cost);
            store_cost(&mut tx, &product.id, new_cost).await?;

            debug!(
                product_id = %product.id,
                on_hand,
                received = line.quantity,
                unit_cost = line.unit_cost,
                new_cost,
                "Receipt line applied"
            );

            movements.push(movement);
            updated_costs.push((product.id, new_cost));
        }

        let value = receipt.total_value();
        let journal_entry_id = if value.is_positive() {
            let entry = insert_entry(&mut tx, &goods_receipt_entry(value, reference)).await?;
            Some(entry.id)
        } else {
            None
        };

        tx.commit().await?;

        info!(
            warehouse_id = %receipt.warehouse_id,
            lines = receipt.lines.len(),
            value = %value,
            "Goods received"
        );

        Ok(ReceiptOutcome {
            movements,
            updated_costs,
            journal_entry_id,
        })
    }

    // =========================================================================
    // Sale Consumption
    // =========================================================================

    /// Deducts the leaf ingredients of `quantity` units of a sold product.
    ///
    /// Products without recipe consumption deduct themselves. Levels that do
    /// not exist yet are created with a negative quantity. The cost-of-sales
    /// voucher covers ingredients with a known cost; the rest are listed in
    /// `unvalued`.
    pub async fn consume_for_sale(
        &self,
        warehouse_id: &str,
        product_id: &str,
        quantity: f64,
        reference: Option<&str>,
    ) -> DbResult<ConsumptionOutcome> {
        validate_quantity(quantity)?;

        let mut tx = self.pool.begin().await?;
        require_active_warehouse(&mut tx, warehouse_id).await?;

        let book = load_book(&mut tx, product_id).await?;
        let resolution = resolve_all_ingredients(&book, product_id, quantity)?;
        log_skipped_cycles(product_id, &resolution);

        let mut movements = Vec::with_capacity(resolution.requirements.len());
        let mut unvalued = Vec::new();
        let mut valued_total = 0.0;

        for requirement in &resolution.requirements {
            if requirement.quantity <= QUANTITY_EPSILON {
                continue;
            }

            let unit_cost = book
                .find(&requirement.ingredient_id)
                .and_then(|node| node.product.cost);

            let movement = StockMovement {
                id: Uuid::new_v4().to_string(),
                tenant_id: DEFAULT_TENANT_ID.to_string(),
                movement_type: MovementType::Out,
                warehouse_id: warehouse_id.to_string(),
                to_warehouse_id: None,
                product_id: requirement.ingredient_id.clone(),
                variant_id: None,
                quantity: requirement.quantity,
                unit_cost,
                reason: "Sale consumption".to_string(),
                reference: reference.map(str::to_string),
                created_at: Utc::now(),
            };
            insert_movement(&mut tx, &movement).await?;
            adjust_level(
                &mut tx,
                warehouse_id,
                &requirement.ingredient_id,
                None,
                -requirement.quantity,
            )
            .await?;

            match unit_cost {
                Some(cost) => valued_total += cost * requirement.quantity,
                None => unvalued.push(requirement.ingredient_id.clone()),
            }
            movements.push(movement);
        }

        let cost_of_sales = Money::from_major_f64(valued_total);
        let journal_entry_id = if cost_of_sales.is_positive() {
            let entry = insert_entry(&mut tx, &cost_of_sales_entry(cost_of_sales, reference)).await?;
            Some(entry.id)
        } else {
            None
        };

        tx.commit().await?;

        info!(
            product_id = %product_id,
            quantity,
            ingredients = movements.len(),
            cost_of_sales = %cost_of_sales,
            unvalued = unvalued.len(),
            "Sale consumption recorded"
        );

        Ok(ConsumptionOutcome {
            movements,
            cost_of_sales,
            unvalued,
            skipped_cycles: resolution.skipped_cycles,
            journal_entry_id,
        })
    }

    // =========================================================================
    // Stock Administration
    // =========================================================================

    /// Moves stock between two warehouses with a single TRANSFER movement.
    pub async fn transfer(
        &self,
        from_warehouse_id: &str,
        to_warehouse_id: &str,
        product_id: &str,
        variant_id: Option<&str>,
        quantity: f64,
        reference: Option<&str>,
    ) -> DbResult<StockMovement> {
        validate_quantity(quantity)?;
        if from_warehouse_id == to_warehouse_id {
            return Err(CoreError::SameWarehouseTransfer(from_warehouse_id.to_string()).into());
        }

        let mut tx = self.pool.begin().await?;
        require_active_warehouse(&mut tx, from_warehouse_id).await?;
        require_active_warehouse(&mut tx, to_warehouse_id).await?;
        let product = require_product(&mut tx, product_id).await?;
        let variant_id = variant_key(variant_id);

        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            movement_type: MovementType::Transfer,
            warehouse_id: from_warehouse_id.to_string(),
            to_warehouse_id: Some(to_warehouse_id.to_string()),
            product_id: product.id.clone(),
            variant_id: variant_id.map(str::to_string),
            quantity,
            unit_cost: product.cost,
            reason: "Transfer".to_string(),
            reference: reference.map(str::to_string),
            created_at: Utc::now(),
        };
        insert_movement(&mut tx, &movement).await?;
        adjust_level(&mut tx, from_warehouse_id, &product.id, variant_id, -quantity).await?;
        adjust_level(&mut tx, to_warehouse_id, &product.id, variant_id, quantity).await?;

        tx.commit().await?;

        info!(
            from = %from_warehouse_id,
            to = %to_warehouse_id,
            product_id = %product.id,
            quantity,
            "Stock transferred"
        );
        Ok(movement)
    }

    /// Sets the reorder limits of a level, creating the level at zero if
    /// needed.
    pub async fn set_stock_limits(
        &self,
        warehouse_id: &str,
        product_id: &str,
        variant_id: Option<&str>,
        min_stock: Option<f64>,
        max_stock: Option<f64>,
    ) -> DbResult<StockLevel> {
        validate_stock_limits(min_stock, max_stock)?;
        let variant_id = variant_key(variant_id);

        let mut tx = self.pool.begin().await?;
        require_active_warehouse(&mut tx, warehouse_id).await?;
        require_product(&mut tx, product_id).await?;

        // Creates the row when missing; a zero delta leaves the quantity alone.
        adjust_level(&mut tx, warehouse_id, product_id, variant_id, 0.0).await?;

        sqlx::query(
            r#"
            UPDATE stock_levels
            SET min_stock = ?4, max_stock = ?5, updated_at = ?6
            WHERE warehouse_id = ?1 AND product_id = ?2 AND variant_id IS ?3
            "#,
        )
        .bind(warehouse_id)
        .bind(product_id)
        .bind(variant_id)
        .bind(min_stock)
        .bind(max_stock)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let level = fetch_level(&mut tx, warehouse_id, product_id, variant_id)
            .await?
            .ok_or_else(|| DbError::not_found("StockLevel", product_id))?;

        tx.commit().await?;
        Ok(level)
    }

    /// Levels in a warehouse with a minimum set and quantity below it.
    pub async fn low_stock(&self, warehouse_id: &str) -> DbResult<Vec<StockLevel>> {
        let sql = format!(
            r#"
            SELECT {LEVEL_COLUMNS}
            FROM stock_levels
            WHERE warehouse_id = ?1
              AND min_stock IS NOT NULL
              AND quantity < min_stock
            ORDER BY quantity - min_stock, product_id
            "#
        );
        let levels = sqlx::query_as::<_, StockLevel>(&sql)
            .bind(warehouse_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(warehouse_id = %warehouse_id, count = levels.len(), "Low stock levels");
        Ok(levels)
    }

    /// The level for one (warehouse, product, variant), if it exists.
    pub async fn stock_level(
        &self,
        warehouse_id: &str,
        product_id: &str,
        variant_id: Option<&str>,
    ) -> DbResult<Option<StockLevel>> {
        let mut conn = self.pool.acquire().await?;
        fetch_level(&mut conn, warehouse_id, product_id, variant_key(variant_id)).await
    }

    /// On-hand quantity of a product summed over every warehouse.
    pub async fn on_hand(&self, product_id: &str) -> DbResult<f64> {
        let mut conn = self.pool.acquire().await?;
        total_on_hand(&mut conn, product_id).await
    }

    /// Audit trail for a product, newest first.
    pub async fn movements_for_product(
        &self,
        product_id: &str,
        limit: u32,
    ) -> DbResult<Vec<StockMovement>> {
        let sql = format!(
            r#"
            SELECT {MOVEMENT_COLUMNS}
            FROM stock_movements
            WHERE product_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#
        );
        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(product_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(movements)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Blank variant ids address the same level as no variant.
fn variant_key(variant_id: Option<&str>) -> Option<&str> {
    variant_id.map(str::trim).filter(|v| !v.is_empty())
}

async fn require_active_warehouse(conn: &mut SqliteConnection, id: &str) -> DbResult<Warehouse> {
    let sql = format!("SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE id = ?1 AND is_active = 1");
    sqlx::query_as::<_, Warehouse>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| CoreError::WarehouseNotFound(id.to_string()).into())
}

async fn require_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Product> {
    fetch_product(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))
}

async fn insert_movement(conn: &mut SqliteConnection, movement: &StockMovement) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, tenant_id, movement_type, warehouse_id, to_warehouse_id,
            product_id, variant_id, quantity, unit_cost, reason, reference, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.tenant_id)
    .bind(movement.movement_type)
    .bind(&movement.warehouse_id)
    .bind(&movement.to_warehouse_id)
    .bind(&movement.product_id)
    .bind(&movement.variant_id)
    .bind(movement.quantity)
    .bind(movement.unit_cost)
    .bind(&movement.reason)
    .bind(&movement.reference)
    .bind(movement.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Adds `delta` to a level, inserting the level when it does not exist.
async fn adjust_level(
    conn: &mut SqliteConnection,
    warehouse_id: &str,
    product_id: &str,
    variant_id: Option<&str>,
    delta: f64,
) -> DbResult<()> {
    let now = Utc::now();
    let updated = sqlx::query(
        r#"
        UPDATE stock_levels
        SET quantity = quantity + ?4, updated_at = ?5
        WHERE warehouse_id = ?1 AND product_id = ?2 AND variant_id IS ?3
        "#,
    )
    .bind(warehouse_id)
    .bind(product_id)
    .bind(variant_id)
    .bind(delta)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if updated.rows_affected() == 0 {
        sqlx::query(
            r#"
            INSERT INTO stock_levels (
                id, tenant_id, warehouse_id, product_id, variant_id, quantity, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(DEFAULT_TENANT_ID)
        .bind(warehouse_id)
        .bind(product_id)
        .bind(variant_id)
        .bind(delta)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn fetch_level(
    conn: &mut SqliteConnection,
    warehouse_id: &str,
    product_id: &str,
    variant_id: Option<&str>,
) -> DbResult<Option<StockLevel>> {
    let sql = format!(
        r#"
        SELECT {LEVEL_COLUMNS}
        FROM stock_levels
        WHERE warehouse_id = ?1 AND product_id = ?2 AND variant_id IS ?3
        "#
    );
    let level = sqlx::query_as::<_, StockLevel>(&sql)
        .bind(warehouse_id)
        .bind(product_id)
        .bind(variant_id)
        .fetch_optional(conn)
        .await?;
    Ok(level)
}

async fn total_on_hand(conn: &mut SqliteConnection, product_id: &str) -> DbResult<f64> {
    let total: f64 = sqlx::query_scalar(
        "SELECT CAST(COALESCE(SUM(quantity), 0) AS REAL) FROM stock_levels WHERE product_id = ?1",
    )
    .bind(product_id)
    .fetch_one(conn)
    .await?;
    Ok(total)
}

async fn store_cost(conn: &mut SqliteConnection, product_id: &str, cost: f64) -> DbResult<()> {
    sqlx::query("UPDATE products SET cost = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(product_id)
        .bind(cost)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::NewProduct;
    use fogon_core::inventory::ReceiptLine;
    use fogon_core::{ProductType, RecipeItemInput};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    async fn setup() -> (Database, Warehouse) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let bodega = db
            .inventory()
            .create_warehouse("BOD-1", "Bodega principal")
            .await
            .unwrap();
        (db, bodega)
    }

    async fn raw(db: &Database, sku: &str, cost: Option<f64>) -> Product {
        let mut input = NewProduct::new(sku, sku, ProductType::Raw);
        input.cost = cost;
        db.products().create(&input).await.unwrap()
    }

    fn receipt(warehouse: &Warehouse, lines: Vec<ReceiptLine>) -> GoodsReceipt {
        GoodsReceipt {
            warehouse_id: warehouse.id.clone(),
            reference: Some("FAC-001".to_string()),
            lines,
        }
    }

    #[tokio::test]
    async fn test_warehouse_admin() {
        let (db, bodega) = setup().await;
        let inventory = db.inventory();

        let err = inventory
            .create_warehouse("BOD-1", "Otra")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "BOD-1"));

        let cocina = inventory.create_warehouse("COCINA", "Cocina").await.unwrap();
        assert_eq!(inventory.list_warehouses().await.unwrap().len(), 2);

        inventory.deactivate_warehouse(&cocina.id).await.unwrap();
        let active = inventory.list_warehouses().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, bodega.id);
        assert!(!inventory.get_warehouse(&cocina.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_receive_goods_moving_average() {
        let (db, bodega) = setup().await;
        let tomato = raw(&db, "TOMATO", Some(100.0)).await;
        let inventory = db.inventory();

        // Nothing on hand: the receipt price replaces the stored cost.
        let first = inventory
            .receive_goods(&receipt(&bodega, vec![ReceiptLine::new(&tomato.id, 60.0, 120.0)]))
            .await
            .unwrap();
        assert_eq!(first.movements.len(), 1);
        assert_eq!(first.movements[0].movement_type, MovementType::In);
        assert!(approx(first.updated_costs[0].1, 120.0));

        // 60 @ 120 + 40 @ 170 → 140
        inventory
            .receive_goods(&receipt(&bodega, vec![ReceiptLine::new(&tomato.id, 40.0, 170.0)]))
            .await
            .unwrap();

        let product = db.products().require(&tomato.id).await.unwrap();
        assert!(approx(product.cost.unwrap(), 140.0));
        assert!(approx(inventory.on_hand(&tomato.id).await.unwrap(), 100.0));

        let level = inventory
            .stock_level(&bodega.id, &tomato.id, None)
            .await
            .unwrap()
            .unwrap();
        assert!(approx(level.quantity, 100.0));

        let entry = db
            .ledger()
            .get_entry(first.journal_entry_id.as_deref().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.lines[0].account_code, "1435");
        assert_eq!(entry.lines[0].debit.cents(), 720_000);
        assert_eq!(entry.lines[1].account_code, "2205");
        assert_eq!(entry.lines[1].credit.cents(), 720_000);
    }

    #[tokio::test]
    async fn test_receipt_of_same_product_twice_in_one_document() {
        let (db, bodega) = setup().await;
        let sugar = raw(&db, "SUGAR", None).await;

        let outcome = db
            .inventory()
            .receive_goods(&receipt(
                &bodega,
                vec![
                    ReceiptLine::new(&sugar.id, 10.0, 100.0),
                    ReceiptLine::new(&sugar.id, 10.0, 200.0),
                ],
            ))
            .await
            .unwrap();

        assert!(approx(outcome.updated_costs[0].1, 100.0));
        assert!(approx(outcome.updated_costs[1].1, 150.0));
    }

    #[tokio::test]
    async fn test_failed_receipt_rolls_back() {
        let (db, bodega) = setup().await;
        let tomato = raw(&db, "TOMATO", Some(100.0)).await;
        let inventory = db.inventory();

        let err = inventory
            .receive_goods(&receipt(
                &bodega,
                vec![
                    ReceiptLine::new(&tomato.id, 10.0, 300.0),
                    ReceiptLine::new("missing", 1.0, 1.0),
                ],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        assert!(inventory.movements_for_product(&tomato.id, 10).await.unwrap().is_empty());
        assert!(approx(inventory.on_hand(&tomato.id).await.unwrap(), 0.0));
        let product = db.products().require(&tomato.id).await.unwrap();
        assert_eq!(product.cost, Some(100.0));
        assert!(db.ledger().trial_balance().await.unwrap().rows.is_empty());
    }

    #[tokio::test]
    async fn test_receipt_into_unknown_warehouse() {
        let (db, _) = setup().await;
        let tomato = raw(&db, "TOMATO", None).await;

        let err = db
            .inventory()
            .receive_goods(&GoodsReceipt {
                warehouse_id: "nowhere".to_string(),
                reference: None,
                lines: vec![ReceiptLine::new(&tomato.id, 1.0, 1.0)],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::WarehouseNotFound(_))));
    }

    #[tokio::test]
    async fn test_zero_value_receipt_posts_no_voucher() {
        let (db, bodega) = setup().await;
        let sample = raw(&db, "SAMPLE", None).await;

        let outcome = db
            .inventory()
            .receive_goods(&receipt(&bodega, vec![ReceiptLine::new(&sample.id, 5.0, 0.0)]))
            .await
            .unwrap();
        assert!(outcome.journal_entry_id.is_none());
        assert!(approx(outcome.updated_costs[0].1, 0.0));
    }

    #[tokio::test]
    async fn test_consume_for_sale() {
        let (db, bodega) = setup().await;
        let bun = raw(&db, "BUN", Some(500.0)).await;
        let patty = raw(&db, "PATTY", None).await;
        let tomato = raw(&db, "TOMATO", Some(100.0)).await;
        let burger = db
            .products()
            .create(&NewProduct::new("BURGER", "Burger", ProductType::Prepared))
            .await
            .unwrap();
        db.recipes()
            .save_recipe(
                &burger.id,
                10.0,
                &[
                    RecipeItemInput::new(&bun.id, 1.0),
                    RecipeItemInput::new(&patty.id, 1.0),
                    RecipeItemInput::new(&tomato.id, 2.0),
                ],
            )
            .await
            .unwrap();

        let outcome = db
            .inventory()
            .consume_for_sale(&bodega.id, &burger.id, 20.0, Some("VENTA-1"))
            .await
            .unwrap();

        // Scale 20 / 10 = 2: bun 2, patty 2, tomato 4.
        assert_eq!(outcome.movements.len(), 3);
        assert!(outcome.movements.iter().all(|m| m.movement_type == MovementType::Out));
        assert_eq!(outcome.unvalued, vec![patty.id.clone()]);
        assert!(outcome.skipped_cycles.is_empty());
        // 2 × 500 + 4 × 100
        assert_eq!(outcome.cost_of_sales.cents(), 140_000);

        // No prior count: the level goes negative.
        let level = db
            .inventory()
            .stock_level(&bodega.id, &tomato.id, None)
            .await
            .unwrap()
            .unwrap();
        assert!(approx(level.quantity, -4.0));

        let entry = db
            .ledger()
            .get_entry(outcome.journal_entry_id.as_deref().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.lines[0].account_code, "6135");
        assert_eq!(entry.lines[1].account_code, "1435");
        assert!(db.ledger().trial_balance().await.unwrap().is_balanced);
    }

    #[tokio::test]
    async fn test_consume_retail_product_deducts_itself() {
        let (db, bodega) = setup().await;
        let soda = db
            .products()
            .create(&NewProduct::new("GASEOSA", "Gaseosa", ProductType::Retail).cost(1800.0))
            .await
            .unwrap();

        let outcome = db
            .inventory()
            .consume_for_sale(&bodega.id, &soda.id, 3.0, None)
            .await
            .unwrap();
        assert_eq!(outcome.movements.len(), 1);
        assert_eq!(outcome.movements[0].product_id, soda.id);
        assert_eq!(outcome.cost_of_sales.cents(), 540_000);

        let err = db
            .inventory()
            .consume_for_sale(&bodega.id, "missing", 1.0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_transfer() {
        let (db, bodega) = setup().await;
        let inventory = db.inventory();
        let cocina = inventory.create_warehouse("COCINA", "Cocina").await.unwrap();
        let tomato = raw(&db, "TOMATO", None).await;

        inventory
            .receive_goods(&receipt(&bodega, vec![ReceiptLine::new(&tomato.id, 10.0, 100.0)]))
            .await
            .unwrap();

        let movement = inventory
            .transfer(&bodega.id, &cocina.id, &tomato.id, None, 4.0, Some("TR-1"))
            .await
            .unwrap();
        assert_eq!(movement.movement_type, MovementType::Transfer);
        assert_eq!(movement.to_warehouse_id.as_deref(), Some(cocina.id.as_str()));

        let source = inventory.stock_level(&bodega.id, &tomato.id, None).await.unwrap().unwrap();
        let target = inventory.stock_level(&cocina.id, &tomato.id, None).await.unwrap().unwrap();
        assert!(approx(source.quantity, 6.0));
        assert!(approx(target.quantity, 4.0));
        assert!(approx(inventory.on_hand(&tomato.id).await.unwrap(), 10.0));

        let trail = inventory.movements_for_product(&tomato.id, 10).await.unwrap();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].movement_type, MovementType::Transfer);

        let err = inventory
            .transfer(&bodega.id, &bodega.id, &tomato.id, None, 1.0, None)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Cannot transfer stock from warehouse {} to itself", bodega.id)
        );
    }

    #[tokio::test]
    async fn test_variants_have_separate_levels() {
        let (db, bodega) = setup().await;
        let inventory = db.inventory();
        let flour = raw(&db, "HARINA", None).await;

        let mut line = ReceiptLine::new(&flour.id, 5.0, 10.0);
        line.variant_id = Some("1KG".to_string());
        inventory
            .receive_goods(&receipt(&bodega, vec![line, ReceiptLine::new(&flour.id, 2.0, 10.0)]))
            .await
            .unwrap();

        let one_kg = inventory
            .stock_level(&bodega.id, &flour.id, Some("1KG"))
            .await
            .unwrap()
            .unwrap();
        let plain = inventory.stock_level(&bodega.id, &flour.id, None).await.unwrap().unwrap();
        assert!(approx(one_kg.quantity, 5.0));
        assert!(approx(plain.quantity, 2.0));
    }

    #[tokio::test]
    async fn test_blank_variant_is_the_plain_level() {
        let (db, bodega) = setup().await;
        let inventory = db.inventory();
        let tomato = raw(&db, "TOMATO", None).await;

        inventory
            .receive_goods(&receipt(&bodega, vec![ReceiptLine::new(&tomato.id, 3.0, 10.0)]))
            .await
            .unwrap();

        let level = inventory
            .set_stock_limits(&bodega.id, &tomato.id, Some(""), Some(5.0), None)
            .await
            .unwrap();
        assert!(level.variant_id.is_none());
        assert!(approx(level.quantity, 3.0));

        let mut line = ReceiptLine::new(&tomato.id, 2.0, 10.0);
        line.variant_id = Some("  ".to_string());
        let outcome = inventory
            .receive_goods(&receipt(&bodega, vec![line]))
            .await
            .unwrap();
        assert!(outcome.movements[0].variant_id.is_none());

        let plain = inventory
            .stock_level(&bodega.id, &tomato.id, Some(""))
            .await
            .unwrap()
            .unwrap();
        assert!(approx(plain.quantity, 5.0));
        assert_eq!(plain.min_stock, Some(5.0));
    }

    #[tokio::test]
    async fn test_stock_limits_and_low_stock() {
        let (db, bodega) = setup().await;
        let inventory = db.inventory();
        let tomato = raw(&db, "TOMATO", None).await;
        let sugar = raw(&db, "SUGAR", None).await;

        let level = inventory
            .set_stock_limits(&bodega.id, &tomato.id, None, Some(20.0), Some(100.0))
            .await
            .unwrap();
        assert!(approx(level.quantity, 0.0));
        assert_eq!(level.min_stock, Some(20.0));

        inventory
            .set_stock_limits(&bodega.id, &sugar.id, None, Some(5.0), None)
            .await
            .unwrap();
        inventory
            .receive_goods(&receipt(&bodega, vec![ReceiptLine::new(&sugar.id, 10.0, 1.0)]))
            .await
            .unwrap();

        let low = inventory.low_stock(&bodega.id).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].product_id, tomato.id);

        let err = inventory
            .set_stock_limits(&bodega.id, &tomato.id, None, Some(50.0), Some(10.0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_movements_are_append_only() {
        let (db, bodega) = setup().await;
        let tomato = raw(&db, "TOMATO", None).await;
        db.inventory()
            .receive_goods(&receipt(&bodega, vec![ReceiptLine::new(&tomato.id, 1.0, 1.0)]))
            .await
            .unwrap();

        let err = sqlx::query("UPDATE stock_movements SET quantity = 99")
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation(_)));

        let err = sqlx::query("DELETE FROM stock_movements")
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation(_)));

        let trail = db.inventory().movements_for_product(&tomato.id, 10).await.unwrap();
        assert!(approx(trail[0].quantity, 1.0));
    }
}
