#[cfg(test)]
mod tests {
    use crate::errors::{Error, Result};
    use crate::portfolio::{
        InMemoryPortfolioStore, LedgerService, LedgerServiceTrait, PortfolioRecord,
        PortfolioRepositoryTrait, PurchaseEvent,
    };
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use cryptofolio_market_data::{
        Asset, AssetDetail, AssetResolver, MarketDataCache, MarketDataError, MarketListing,
        PriceProvider,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Mutex};

    // --- Mock PriceProvider ---

    fn listing(id: &str, symbol: &str, name: &str, price: Decimal) -> MarketListing {
        MarketListing {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            current_price: price,
            market_cap: None,
            market_cap_rank: None,
            high_24h: None,
            low_24h: None,
            percent_change_24h: Some(dec!(1.5)),
            percent_change_7d: None,
            percent_change_30d: None,
        }
    }

    /// Provider whose listing set can be swapped mid-test.
    struct ScriptedProvider {
        listings: Mutex<Vec<MarketListing>>,
    }

    impl ScriptedProvider {
        fn new(listings: Vec<MarketListing>) -> Self {
            Self {
                listings: Mutex::new(listings),
            }
        }

        fn set_listings(&self, listings: Vec<MarketListing>) {
            *self.listings.lock().unwrap() = listings;
        }
    }

    #[async_trait]
    impl PriceProvider for ScriptedProvider {
        fn id(&self) -> &'static str {
            "SCRIPTED"
        }

        async fn top_assets(
            &self,
            _count: usize,
            _vs_currency: &str,
        ) -> std::result::Result<Vec<MarketListing>, MarketDataError> {
            Ok(self.listings.lock().unwrap().clone())
        }

        async fn asset_detail(
            &self,
            asset_id: &str,
            _vs_currency: &str,
        ) -> std::result::Result<AssetDetail, MarketDataError> {
            let listings = self.listings.lock().unwrap();
            let listing = listings
                .iter()
                .find(|l| l.id == asset_id)
                .ok_or_else(|| MarketDataError::AssetNotFound(asset_id.to_string()))?;
            Ok(AssetDetail {
                asset: Asset {
                    id: listing.id.clone(),
                    symbol: listing.symbol.clone(),
                    name: listing.name.clone(),
                },
                description: None,
                quote: listing.to_quote(Utc::now()),
            })
        }
    }

    /// Provider that parks one scripted `top_assets` call on a gate, letting
    /// tests interleave other ledger calls at a precise point.
    struct GatedProvider {
        listings: Vec<MarketListing>,
        park_on_call: usize,
        calls: std::sync::atomic::AtomicUsize,
        gate: Arc<tokio::sync::Notify>,
    }

    #[async_trait]
    impl PriceProvider for GatedProvider {
        fn id(&self) -> &'static str {
            "GATED"
        }

        async fn top_assets(
            &self,
            _count: usize,
            _vs_currency: &str,
        ) -> std::result::Result<Vec<MarketListing>, MarketDataError> {
            let call = self
                .calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
                + 1;
            if call == self.park_on_call {
                self.gate.notified().await;
            }
            Ok(self.listings.clone())
        }

        async fn asset_detail(
            &self,
            asset_id: &str,
            _vs_currency: &str,
        ) -> std::result::Result<AssetDetail, MarketDataError> {
            Err(MarketDataError::AssetNotFound(asset_id.to_string()))
        }
    }

    // --- Mock failing repository ---

    struct FailingStore;

    #[async_trait]
    impl PortfolioRepositoryTrait for FailingStore {
        async fn load(&self, _owner: &str) -> Result<Option<PortfolioRecord>> {
            Ok(None)
        }

        async fn save(&self, _owner: &str, _record: &PortfolioRecord) -> Result<()> {
            Err(Error::PersistenceFailure("disk on fire".to_string()))
        }
    }

    // --- Fixture ---

    fn default_listings() -> Vec<MarketListing> {
        vec![
            listing("bitcoin", "btc", "Bitcoin", dec!(50000)),
            listing("ethereum", "eth", "Ethereum", dec!(3000)),
        ]
    }

    struct Fixture {
        provider: Arc<ScriptedProvider>,
        store: Arc<InMemoryPortfolioStore>,
        ledger: LedgerService,
    }

    /// Ledger over a zero-TTL cache so listing swaps take effect immediately.
    fn fixture() -> Fixture {
        let provider = Arc::new(ScriptedProvider::new(default_listings()));
        let cache = Arc::new(MarketDataCache::with_ttl(
            provider.clone(),
            Duration::zero(),
        ));
        let resolver = Arc::new(AssetResolver::new(cache));
        let store = Arc::new(InMemoryPortfolioStore::new());
        let ledger = LedgerService::new(resolver, store.clone());
        Fixture {
            provider,
            store,
            ledger,
        }
    }

    fn purchase(asset_id: &str, quantity: Decimal, unit_price: Decimal) -> PurchaseEvent {
        PurchaseEvent {
            asset_id: asset_id.to_string(),
            quantity,
            unit_price,
            occurred_at: Utc::now(),
        }
    }

    // --- Merge ---

    #[tokio::test]
    async fn first_merge_creates_the_portfolio_implicitly() {
        let f = fixture();

        let position = f
            .ledger
            .merge("alice", purchase("btc", dec!(2), dec!(100)))
            .await
            .unwrap();

        assert_eq!(position.asset_id, "bitcoin");
        assert_eq!(position.symbol, "btc");
        assert_eq!(position.quantity, dec!(2));
        assert_eq!(position.average_cost, dec!(100));

        let record = f.store.load("alice").await.unwrap().unwrap();
        assert_eq!(record.positions.len(), 1);
    }

    #[tokio::test]
    async fn successive_merges_weight_the_cost_basis_by_quantity() {
        let f = fixture();

        f.ledger
            .merge("alice", purchase("btc", dec!(1), dec!(100)))
            .await
            .unwrap();
        let position = f
            .ledger
            .merge("alice", purchase("bitcoin", dec!(3), dec!(140)))
            .await
            .unwrap();

        assert_eq!(position.quantity, dec!(4));
        assert_eq!(position.average_cost, dec!(130));
    }

    #[tokio::test]
    async fn merges_into_different_assets_keep_separate_positions() {
        let f = fixture();

        f.ledger
            .merge("alice", purchase("btc", dec!(1), dec!(100)))
            .await
            .unwrap();
        f.ledger
            .merge("alice", purchase("eth", dec!(10), dec!(20)))
            .await
            .unwrap();

        let record = f.store.load("alice").await.unwrap().unwrap();
        assert_eq!(record.positions.len(), 2);
    }

    #[tokio::test]
    async fn invalid_purchase_is_rejected_without_mutation() {
        let f = fixture();

        f.ledger
            .merge("alice", purchase("btc", dec!(1), dec!(100)))
            .await
            .unwrap();

        let err = f
            .ledger
            .merge("alice", purchase("btc", dec!(0), dec!(50)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPurchase(_)));

        let record = f.store.load("alice").await.unwrap().unwrap();
        assert_eq!(record.positions.len(), 1);
        assert_eq!(record.position("bitcoin").unwrap().quantity, dec!(1));
    }

    #[tokio::test]
    async fn unknown_asset_aborts_the_merge_before_any_write() {
        let f = fixture();

        let err = f
            .ledger
            .merge("alice", purchase("not-a-real-coin-xyz", dec!(1), dec!(10)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownAsset(_)));
        assert!(f.store.load("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_persistence_failure() {
        let provider = Arc::new(ScriptedProvider::new(default_listings()));
        let cache = Arc::new(MarketDataCache::new(provider));
        let resolver = Arc::new(AssetResolver::new(cache));
        let ledger = LedgerService::new(resolver, Arc::new(FailingStore));

        let err = ledger
            .merge("alice", purchase("btc", dec!(1), dec!(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PersistenceFailure(_)));
    }

    #[tokio::test]
    async fn concurrent_merges_for_one_owner_lose_no_purchase() {
        let f = fixture();
        let ledger = Arc::new(f.ledger);

        let a = {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                ledger
                    .merge("alice", purchase("btc", dec!(1), dec!(100)))
                    .await
            })
        };
        let b = {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                ledger
                    .merge("alice", purchase("btc", dec!(2), dec!(130)))
                    .await
            })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let record = f.store.load("alice").await.unwrap().unwrap();
        assert_eq!(record.positions[0].quantity, dec!(3));
        // (1 * 100 + 2 * 130) / 3, whichever order the merges land in.
        assert_eq!(record.positions[0].average_cost, dec!(120));
    }

    #[tokio::test]
    async fn valuation_write_back_does_not_drop_a_concurrent_merge() {
        // Calls to top_assets: merge #1 resolve (1), valuation quote (2,
        // parked), merge #2 resolve (3).
        let gate = Arc::new(tokio::sync::Notify::new());
        let provider = Arc::new(GatedProvider {
            listings: default_listings(),
            park_on_call: 2,
            calls: std::sync::atomic::AtomicUsize::new(0),
            gate: gate.clone(),
        });
        let cache = Arc::new(MarketDataCache::with_ttl(
            provider.clone(),
            Duration::zero(),
        ));
        let resolver = Arc::new(AssetResolver::new(cache));
        let store = Arc::new(InMemoryPortfolioStore::new());
        let ledger = Arc::new(LedgerService::new(resolver, store.clone()));

        ledger
            .merge("alice", purchase("btc", dec!(1), dec!(100)))
            .await
            .unwrap();

        // The valuation loads the record, then parks on its quote fetch.
        let valuation = {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.valuate("alice").await })
        };
        while provider.calls.load(std::sync::atomic::Ordering::SeqCst) < 2 {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }

        // A merge lands while the valuation is mid-flight.
        ledger
            .merge("alice", purchase("btc", dec!(2), dec!(130)))
            .await
            .unwrap();

        gate.notify_one();
        valuation.await.unwrap().unwrap();

        // The valuation's read-back must not have clobbered the merge.
        let record = store.load("alice").await.unwrap().unwrap();
        let position = record.position("bitcoin").unwrap();
        assert_eq!(position.quantity, dec!(3));
        assert_eq!(position.average_cost, dec!(120));
    }

    // --- Valuation ---

    #[tokio::test]
    async fn valuate_with_no_recorded_purchases_is_empty_not_an_error() {
        let f = fixture();
        assert!(f.ledger.valuate("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn valuation_arithmetic_matches_cost_basis_and_live_price() {
        let f = fixture();

        f.ledger
            .merge("alice", purchase("btc", dec!(2), dec!(100)))
            .await
            .unwrap();
        f.provider
            .set_listings(vec![listing("bitcoin", "btc", "Bitcoin", dec!(150))]);

        let valuation = f.ledger.valuate("alice").await.unwrap().unwrap();
        assert_eq!(valuation.positions.len(), 1);

        let position = &valuation.positions[0];
        assert_eq!(position.invested_value, dec!(200));
        assert_eq!(position.current_price, Some(dec!(150)));
        assert_eq!(position.current_value, Some(dec!(300)));
        assert_eq!(position.profit_loss, Some(dec!(100)));
        assert_eq!(position.profit_loss_percent, Some(dec!(50)));

        assert_eq!(valuation.total_invested, dec!(200));
        assert_eq!(valuation.total_current_value, dec!(300));
        assert_eq!(valuation.total_profit_loss, dec!(100));
        assert_eq!(valuation.total_profit_loss_percent, Some(dec!(50)));
    }

    #[tokio::test]
    async fn one_failed_quote_degrades_that_position_only() {
        let f = fixture();

        f.ledger
            .merge("alice", purchase("btc", dec!(1), dec!(100)))
            .await
            .unwrap();
        f.ledger
            .merge("alice", purchase("eth", dec!(10), dec!(20)))
            .await
            .unwrap();

        // Ethereum drops out of the ranked window and its detail fetch fails.
        f.provider
            .set_listings(vec![listing("bitcoin", "btc", "Bitcoin", dec!(120))]);

        let valuation = f.ledger.valuate("alice").await.unwrap().unwrap();
        assert_eq!(valuation.positions.len(), 2);

        let btc = valuation
            .positions
            .iter()
            .find(|p| p.position.asset_id == "bitcoin")
            .unwrap();
        let eth = valuation
            .positions
            .iter()
            .find(|p| p.position.asset_id == "ethereum")
            .unwrap();

        assert_eq!(btc.current_value, Some(dec!(120)));
        assert!(eth.current_price.is_none());
        assert!(eth.current_value.is_none());
        assert!(eth.profit_loss.is_none());
        assert_eq!(eth.invested_value, dec!(200));

        // Aggregate money totals over priced positions only; invested covers
        // everything.
        assert_eq!(valuation.total_invested, dec!(300));
        assert_eq!(valuation.total_current_value, dec!(120));
        assert_eq!(valuation.total_profit_loss, dec!(20));
    }

    #[tokio::test]
    async fn valuation_refreshes_the_stored_read_back_timestamp() {
        let f = fixture();

        f.ledger
            .merge("alice", purchase("btc", dec!(1), dec!(100)))
            .await
            .unwrap();
        let before = f.store.load("alice").await.unwrap().unwrap().last_updated;

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let valuation = f.ledger.valuate("alice").await.unwrap().unwrap();

        let stored = f.store.load("alice").await.unwrap().unwrap();
        assert_eq!(stored.last_updated, valuation.last_updated);
        assert!(stored.last_updated > before);
    }
}
