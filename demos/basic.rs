//! Basic example of using the `TransferEngine`.
//!
//! Run with: `cargo run --example basic`
use chrono::Local;
use coin_ledger::{
    compose_serial, export_transactions, AccountType, Clock, ExchangePoints, ExchangeRate,
    GiftTransfer, Initialize, MemoryLedger, RangeQuery, RegisterCustomer, RegisterMerchant,
    SystemClock, TransactionKind, TransferEngine,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let engine = TransferEngine::new(MemoryLedger::new());

    // 10000 points buy 15 coin, worth 10 fiat
    let rate = ExchangeRate::new(10_000, 15, 10).expect("Failed to build exchange rate");
    engine
        .initialize(&Initialize::new(0, 1_000, rate).expect("Failed to build pool"))
        .expect("Failed to initialize bank pool");

    engine
        .register_customer(&RegisterCustomer::new("alice").expect("Invalid customer id"))
        .expect("Failed to register customer");
    engine
        .register_merchant(&RegisterMerchant::new("coffee-shop", 0).expect("Invalid merchant"))
        .expect("Failed to register merchant");

    let now = Local::now().naive_local();
    let exchange_serial =
        compose_serial(now, 1, TransactionKind::Exchange).expect("Failed to compose serial");
    let gift_serial =
        compose_serial(now, 2, TransactionKind::GiftToMerchant).expect("Failed to compose serial");

    let exchanged = engine
        .exchange_points(
            &ExchangePoints::new(&exchange_serial, "alice", 5_000).expect("Invalid exchange"),
        )
        .expect("Failed to exchange points");
    println!("Exchanged 5000 points for {} coin", exchanged.amount);

    engine
        .gift_transfer(
            &GiftTransfer::new(
                &gift_serial,
                "alice",
                AccountType::Customer,
                "coffee-shop",
                AccountType::Merchant,
                5,
            )
            .expect("Invalid gift"),
        )
        .expect("Failed to gift coin");

    println!("\n=== Final Account State ===");
    let alice = engine.get_customer("alice").expect("Failed to load customer");
    println!("alice: amount={} avail={}", alice.amount(), alice.avail());
    let shop = engine
        .get_merchant("coffee-shop")
        .expect("Failed to load merchant");
    println!("coffee-shop: coin={}", shop.coin_balance());
    let pool = engine.get_bank_pool().expect("Failed to load bank pool");
    println!(
        "bank pool: points={} coins={}",
        pool.total_points(),
        pool.total_coins()
    );

    println!("\n=== alice's History ===");
    let today = SystemClock.today();
    let history = engine
        .query_transactions_by_range(
            &RangeQuery::new("alice", today, today).expect("Invalid range query"),
        )
        .expect("Failed to query history");
    export_transactions(&history, std::io::stdout()).expect("Failed to write CSV");
}
