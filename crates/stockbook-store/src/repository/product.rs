//! # Product Repository
//!
//! Stocked items. Quantities change here only through manual adjustment;
//! sales move stock through the invoice repository.

use stockbook_core::posting::{apply_movements, StockMovement};
use stockbook_core::{reports, Collection, Money, Product};
use tracing::debug;

use super::CollectionRepository;
use crate::cache::LedgerCache;

#[derive(Debug, Clone)]
pub struct ProductRepository {
    cache: LedgerCache,
}

impl ProductRepository {
    pub fn new(cache: LedgerCache) -> Self {
        ProductRepository { cache }
    }

    /// Products at or below their minimum-stock threshold.
    pub fn low_stock(&self) -> Vec<Product> {
        self.cache
            .read(|state| reports::low_stock(&state.products).cloned().collect())
    }

    /// Applies a manual stock correction (restock, shrinkage, count fix).
    ///
    /// No floor is applied. Unknown ids are a no-op.
    ///
    /// ## Returns
    /// The product after adjustment, or `None` if no product has `id`.
    pub fn adjust_stock(&self, id: &str, delta: i64) -> Option<Product> {
        self.cache.write(|state, changes| {
            let movement = StockMovement {
                product_id: id.to_string(),
                delta,
            };
            if apply_movements(&mut state.products, &[movement]) == 0 {
                return None;
            }
            changes.touch(Collection::Products);

            let product = state.products.iter().find(|p| p.id == id).cloned();
            debug!(id, delta, "Stock adjusted");
            product
        })
    }

    /// Value of all on-hand stock at unit price.
    pub fn stock_value(&self) -> Money {
        self.cache
            .read(|state| state.products.iter().map(Product::stock_value).sum())
    }
}

impl CollectionRepository for ProductRepository {
    type Record = Product;

    fn cache(&self) -> &LedgerCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use stockbook_core::TaxRate;

    fn cable() -> Product {
        Product {
            id: "caller-chosen".to_string(),
            name: "HDMI Cable".to_string(),
            sku: "CBL-HDMI".to_string(),
            quantity: 20,
            price: Money::from_major(120),
            category: "Accessories".to_string(),
            min_stock: 5,
            tax_rate: TaxRate::from_bps(2000),
            image: None,
        }
    }

    #[tokio::test]
    async fn test_add_assigns_id_and_appends() {
        let (cache, _) = test_support::cache(true).await;
        let repo = cache.products();

        let products = repo.add(cable());

        assert_eq!(products.len(), 7);
        let added = products.last().unwrap();
        assert_ne!(added.id, "caller-chosen");
        assert_eq!(added.name, "HDMI Cable");
        assert_eq!(repo.get_by_id(&added.id).unwrap().sku, "CBL-HDMI");
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_are_noops() {
        let (cache, store) = test_support::cache(true).await;
        let repo = cache.products();
        cache.sink().flush().await.unwrap();
        let writes = store.replace_count();

        let mut ghost = cable();
        ghost.id = "missing".to_string();
        assert_eq!(repo.update(ghost).len(), 6);
        assert_eq!(repo.delete("missing").len(), 6);

        cache.sink().flush().await.unwrap();
        assert_eq!(store.replace_count(), writes);
    }

    #[tokio::test]
    async fn test_update_replaces_whole_record() {
        let (cache, _) = test_support::cache(true).await;
        let repo = cache.products();

        let mut laptop = repo.get_by_id("1").unwrap();
        laptop.price = Money::from_major(24000);
        laptop.image = Some("laptop.png".to_string());
        let products = repo.update(laptop);

        assert_eq!(products[0].price, Money::from_major(24000));
        assert_eq!(products[0].image.as_deref(), Some("laptop.png"));
    }

    #[tokio::test]
    async fn test_low_stock_and_adjustment() {
        let (cache, _) = test_support::cache(true).await;
        let repo = cache.products();

        // Seed: keyboard 8/10 and hub 3/5 are low
        let low: Vec<String> = repo.low_stock().into_iter().map(|p| p.id).collect();
        assert_eq!(low, vec!["3", "5"]);

        let hub = repo.adjust_stock("5", 10).unwrap();
        assert_eq!(hub.quantity, 13);
        assert_eq!(repo.low_stock().len(), 1);

        assert!(repo.adjust_stock("missing", 1).is_none());

        let hub = repo.adjust_stock("5", -20).unwrap();
        assert_eq!(hub.quantity, -7);
    }
}
