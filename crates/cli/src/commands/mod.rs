//! Cart commands.
//!
//! Each invocation opens a [`CartSession`]: the cart manager wired to the
//! HTTP API and the file store from configuration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rocketshoes_cart::{
    ApiError, CartConfig, CartManager, FileStore, Notice, Notifier, StoreApiClient,
    TracingNotifier, UpdateAmount,
};
use rocketshoes_core::{CartSummary, CurrencyCode, ProductId};
use tracing::info;

/// Whether the cart accepted the requested change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Rejected,
}

/// Logs notices and remembers that one was raised.
#[derive(Default)]
struct ExitStatusNotifier {
    log: TracingNotifier,
    rejected: AtomicBool,
}

impl ExitStatusNotifier {
    fn take_outcome(&self) -> Outcome {
        if self.rejected.swap(false, Ordering::SeqCst) {
            Outcome::Rejected
        } else {
            Outcome::Applied
        }
    }
}

impl Notifier for ExitStatusNotifier {
    fn notify(&self, notice: Notice) {
        self.rejected.store(true, Ordering::SeqCst);
        self.log.notify(notice);
    }
}

/// A cart manager opened from configuration.
pub struct CartSession {
    manager: CartManager,
    notifier: Arc<ExitStatusNotifier>,
    currency: CurrencyCode,
}

impl CartSession {
    /// Build the API client and file store, then hydrate the cart.
    ///
    /// # Errors
    ///
    /// Returns error if the API client cannot be built.
    pub fn open(config: &CartConfig) -> Result<Self, ApiError> {
        let api = Arc::new(StoreApiClient::new(&config.api)?);
        let store = Arc::new(FileStore::new(&config.storage_path));
        let notifier = Arc::new(ExitStatusNotifier::default());

        info!(
            api = %config.api.base_url,
            storage = %config.storage_path.display(),
            "Opening cart"
        );

        let manager = CartManager::load(
            api.clone(),
            api,
            store,
            notifier.clone(),
            config.storage_key.clone(),
        );

        Ok(Self {
            manager,
            notifier,
            currency: config.currency,
        })
    }

    pub async fn add(&self, product_id: ProductId) -> Outcome {
        self.manager.add(product_id).await;
        self.notifier.take_outcome()
    }

    pub fn remove(&self, product_id: ProductId) -> Outcome {
        self.manager.remove(product_id);
        self.notifier.take_outcome()
    }

    pub async fn update(&self, product_id: ProductId, amount: i64) -> Outcome {
        self.manager
            .update_amount(UpdateAmount { product_id, amount })
            .await;
        self.notifier.take_outcome()
    }

    /// Print the current cart to stdout.
    #[allow(clippy::print_stdout)]
    pub fn show(&self) {
        print!("{}", render(&self.manager.cart().summary(self.currency)));
    }
}

/// Render a cart summary as a plain-text table.
fn render(summary: &CartSummary) -> String {
    if summary.lines.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    for line in &summary.lines {
        out.push_str(&format!(
            "#{:<6} {:<40} {:>3} x {:>12} = {:>12}\n",
            line.product_id.as_i64(),
            line.title,
            line.amount,
            line.price,
            line.subtotal
        ));
    }
    out.push_str(&format!(
        "{} item(s), total {}\n",
        summary.item_count, summary.total
    ));
    out
}
