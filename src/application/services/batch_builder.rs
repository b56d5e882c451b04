//! Batch builder service module
//!
//! Splits order lines into batches under the product's lot rules. Painting
//! routings batch coarsely (full lots) because fewer, larger batches mean
//! fewer color changes at the paint bottleneck; everything else batches at
//! the minimum lot. Undersized tails are absorbed into the previous batch
//! of the same order and product when the merge policy is on.

use chrono::{NaiveDateTime, Utc};
use tracing::warn;

use crate::domain::entities::{Batch, Catalog, CatalogIndex, Product};

/// Operation name that triggers coarse batching
const BOTTLENECK_OP_NAME: &str = "Painting";

/// Factor applied to a product lot size to derive the maximum lot
const LOT_SIZE_MAX_FACTOR: u32 = 5;

/// Builds the immutable batch table from the catalog's orders
pub struct BatchBuilder<'a> {
    catalog: &'a Catalog,
    index: &'a CatalogIndex<'a>,
}

impl<'a> BatchBuilder<'a> {
    /// Creates a builder over a catalog and its index
    pub fn new(catalog: &'a Catalog, index: &'a CatalogIndex<'a>) -> Self {
        Self { catalog, index }
    }

    /// Generates batches for every order line
    ///
    /// Lines naming unknown products or zero quantities are skipped with a
    /// diagnostic. Batch ids are deterministic: `B` followed by the order
    /// id digits, the line index and a running sequence number.
    pub fn build(&self) -> Vec<Batch> {
        let now = Utc::now().naive_utc();
        let mut batches = Vec::new();

        for order in self.catalog.all_orders() {
            let release = order.release_date.unwrap_or(now);
            let order_digits: String = order.id.chars().filter(|c| c.is_ascii_digit()).collect();
            let order_tag = if order_digits.is_empty() {
                order.id.clone()
            } else {
                order_digits
            };

            for (line_idx, line) in order.effective_lines().iter().enumerate() {
                let Some(product) = self.index.products.get(line.product_id.as_str()) else {
                    warn!(order = %order.id, product = %line.product_id, "unknown product; skipping line");
                    continue;
                };
                if line.quantity == 0 {
                    warn!(order = %order.id, product = %line.product_id, "zero quantity; skipping line");
                    continue;
                }

                let (min_qty, max_qty) = self.lot_bounds(product, line.quantity);
                let target_qty = if self.routes_through_bottleneck(product) {
                    max_qty
                } else {
                    min_qty
                };
                let priority = line.priority.unwrap_or(order.priority);

                self.split_line(
                    &mut batches,
                    &order_tag,
                    &order.id,
                    product,
                    line_idx,
                    line.quantity,
                    min_qty,
                    target_qty.max(1),
                    priority,
                    order.due_date,
                    release,
                );
            }
        }
        batches
    }

    /// Derives the (min, max) lot bounds for a line
    ///
    /// A positive product lot size wins; otherwise the first batchable
    /// operation of the first candidate routing supplies its rule; failing
    /// both, the line is a single batch.
    fn lot_bounds(&self, product: &Product, quantity: u32) -> (u32, u32) {
        if let Some(lot_size) = product.lot_size.filter(|&lot| lot > 0) {
            return (lot_size, lot_size.saturating_mul(LOT_SIZE_MAX_FACTOR));
        }

        let rule = product
            .routing_ids
            .first()
            .and_then(|id| self.index.routings.get(id.as_str()))
            .and_then(|routing| routing.first_batchable_operation())
            .and_then(|op| op.batch);
        if let Some(rule) = rule {
            let min = rule.min_qty.unwrap_or(1).max(1);
            let max = rule.max_qty.unwrap_or(quantity).max(min);
            return (min, max);
        }

        (quantity, quantity)
    }

    fn routes_through_bottleneck(&self, product: &Product) -> bool {
        product
            .routing_ids
            .iter()
            .filter_map(|id| self.index.routings.get(id.as_str()))
            .any(|routing| routing.has_operation_named(BOTTLENECK_OP_NAME))
    }

    #[allow(clippy::too_many_arguments)]
    fn split_line(
        &self,
        batches: &mut Vec<Batch>,
        order_tag: &str,
        order_id: &str,
        product: &Product,
        line_idx: usize,
        quantity: u32,
        min_qty: u32,
        target_qty: u32,
        priority: i32,
        due_date: NaiveDateTime,
        release_date: NaiveDateTime,
    ) {
        let mut remaining = quantity;
        let mut seq = 1;
        while remaining > 0 {
            let take = remaining.min(target_qty);

            if self.catalog.settings.merge_undersized_tail && take < min_qty {
                if let Some(previous) = batches
                    .last_mut()
                    .filter(|b| b.order_id == order_id && b.product_id == product.id)
                {
                    previous.qty += take;
                    break;
                }
            }

            batches.push(Batch {
                batch_id: format!("B{}{}{}", order_tag, line_idx, seq),
                order_id: order_id.to_string(),
                product_id: product.id.clone(),
                qty: take,
                priority,
                due_date,
                release_date,
            });
            remaining -= take;
            seq += 1;
        }
    }
}
