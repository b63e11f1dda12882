//! Integration tests for the `TransferEngine`.
//!
//! These tests exercise the full E2E flow: raw operation arguments → typed
//! request → engine → ledger, and history back out as CSV.
use std::cell::Cell;

use chrono::NaiveDate;
use coin_ledger::engine::ledger::Entries;
use coin_ledger::{
    compose_serial, export_transactions, zero_pad, Entity, Error, FileLedger, FixedClock,
    Ledger, MemoryLedger, Operation, RawRequest, Request, Response, StoreError,
    TransactionKind, TransactionRecord, TransferEngine, BANK_POOL_ACCOUNT,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Helper to run one operation given as command-line style arguments
fn run<L: Ledger>(
    engine: &TransferEngine<L, FixedClock>,
    operation: Operation,
    args: &[&str],
) -> Result<Response, Error> {
    let request = Request::try_from(RawRequest::new(operation, args.iter().copied()))?;
    engine.execute(request)
}

/// Engine over a fresh in-memory ledger, seeded with a 1000 coin pool and
/// the 10000 points = 15 coin = 10 fiat rate.
fn seeded() -> TransferEngine<MemoryLedger, FixedClock> {
    let engine = TransferEngine::with_clock(MemoryLedger::new(), FixedClock::new(date(2024, 3, 1)));
    run(&engine, Operation::Initialize, &["0", "1000", "10000", "15", "10"]).unwrap();
    engine
}

fn customer<L: Ledger>(engine: &TransferEngine<L, FixedClock>, id: &str) -> (i64, i64) {
    match run(engine, Operation::GetCustomer, &[id]).unwrap() {
        Response::Customer(c) => (c.amount(), c.avail()),
        other => panic!("expected customer, got {other:?}"),
    }
}

fn merchant_coin<L: Ledger>(engine: &TransferEngine<L, FixedClock>, id: &str) -> i64 {
    match run(engine, Operation::GetMerchant, &[id]).unwrap() {
        Response::Merchant(m) => m.coin_balance(),
        other => panic!("expected merchant, got {other:?}"),
    }
}

fn transactions<L: Ledger>(
    engine: &TransferEngine<L, FixedClock>,
    operation: Operation,
    args: &[&str],
) -> Vec<TransactionRecord> {
    match run(engine, operation, args).unwrap() {
        Response::Transactions(records) => records,
        other => panic!("expected transactions, got {other:?}"),
    }
}

#[test]
fn test_exchange_and_gift_scenario() {
    let engine = seeded();
    run(&engine, Operation::RegisterCustomer, &["C1"]).unwrap();
    run(&engine, Operation::RegisterMerchant, &["M1", "0"]).unwrap();

    run(&engine, Operation::ExchangePoints, &["S1", "C1", "5000"]).unwrap();
    assert_eq!(customer(&engine, "C1"), (7, 7));

    run(
        &engine,
        Operation::GiftTransfer,
        &["S2", "C1", "Customer", "M1", "Merchant", "5"],
    )
    .unwrap();
    assert_eq!(customer(&engine, "C1"), (2, 2));
    assert_eq!(merchant_coin(&engine, "M1"), 5);

    let legs = transactions(
        &engine,
        Operation::QueryTransactionsBySerials,
        &["C1/S2", "M1/S2"],
    );
    assert_eq!(legs.len(), 2);
    assert_eq!(legs[0].amount, -5);
    assert_eq!(legs[1].amount, 5);
    assert_eq!(legs[0].cash_out_account, legs[1].cash_in_account);
    assert_eq!(legs[0].cash_in_account, legs[1].cash_out_account);
    assert_eq!(legs[1].kind, TransactionKind::GiftToMerchant);
}

#[test]
fn test_every_transfer_writes_a_mirrored_pair() {
    let engine = seeded();
    run(&engine, Operation::RegisterCustomer, &["C1"]).unwrap();
    run(&engine, Operation::RegisterCustomer, &["C2"]).unwrap();
    run(&engine, Operation::RegisterMerchant, &["M1", "10"]).unwrap();

    run(&engine, Operation::ExchangePoints, &["T1", "C1", "20000"]).unwrap();
    run(&engine, Operation::GiftTransfer, &["T2", "C1", "C", "C2", "C", "4"]).unwrap();
    run(&engine, Operation::GiftTransfer, &["T3", "M1", "M", "C2", "C", "3"]).unwrap();
    run(&engine, Operation::PurchaseTrade, &["T4", "C2", "6", "M1", "SKU-1"]).unwrap();

    let pairs = [
        (BANK_POOL_ACCOUNT, "C1", "T1"),
        ("C1", "C2", "T2"),
        ("M1", "C2", "T3"),
        ("C2", "M1", "T4"),
    ];
    for (payer, payee, serial) in pairs {
        let paid = format!("{payer}/{serial}");
        let received = format!("{payee}/{serial}");
        let legs = transactions(
            &engine,
            Operation::QueryTransactionsBySerials,
            &[paid.as_str(), received.as_str()],
        );
        assert_eq!(legs[0].serial, legs[1].serial);
        assert_eq!(legs[0].amount, -legs[1].amount, "serial {serial}");
        assert!(legs[1].amount > 0, "serial {serial}");
        assert_eq!(legs[0], legs[1].mirrored());
    }
}

#[test]
fn test_gift_conserves_total_coin() {
    let engine = seeded();
    run(&engine, Operation::RegisterCustomer, &["C1"]).unwrap();
    run(&engine, Operation::RegisterMerchant, &["M1", "100"]).unwrap();
    run(&engine, Operation::ExchangePoints, &["S1", "C1", "20000"]).unwrap();

    let total = || customer(&engine, "C1").0 + merchant_coin(&engine, "M1");
    let before = total();
    for (serial, amount) in [("G1", "1"), ("G2", "29"), ("G3", "30")] {
        run(
            &engine,
            Operation::GiftTransfer,
            &[serial, "M1", "Merchant", "C1", "Customer", amount],
        )
        .unwrap();
    }
    run(&engine, Operation::GiftTransfer, &["G4", "C1", "C", "M1", "M", "90"]).unwrap();
    assert_eq!(total(), before);
    assert_eq!(customer(&engine, "C1"), (0, 0));
}

#[test]
fn test_insufficient_gift_changes_nothing() {
    let engine = seeded();
    run(&engine, Operation::RegisterCustomer, &["C1"]).unwrap();
    run(&engine, Operation::RegisterMerchant, &["M1", "0"]).unwrap();
    run(&engine, Operation::ExchangePoints, &["S1", "C1", "5000"]).unwrap();
    let before = engine.ledger().snapshot();

    let result = run(
        &engine,
        Operation::GiftTransfer,
        &["S2", "C1", "Customer", "M1", "Merchant", "8"],
    );
    assert!(matches!(result, Err(Error::InsufficientBalance { .. })));
    assert_eq!(engine.ledger().snapshot(), before);
}

#[test]
fn test_validation_happens_before_the_ledger_is_touched() {
    let engine = seeded();
    let before = engine.ledger().snapshot();

    let cases: [(Operation, &[&str]); 6] = [
        (Operation::GiftTransfer, &["S", "C1", "Bank", "M1", "Merchant", "5"][..]),
        (Operation::ExchangePoints, &["S", "C1", "-1"][..]),
        (Operation::PurchaseTrade, &["S", "C1", "ten", "M1", "P"][..]),
        (Operation::IssueCoins, &["S", "10", "2024-03-01"][..]),
        (Operation::SetExchangeRate, &["0", "15", "10"][..]),
        (Operation::RegisterMerchant, &["M1"][..]),
    ];
    for (operation, args) in cases {
        assert!(
            matches!(run(&engine, operation, args), Err(Error::Validation(_))),
            "{operation} {args:?}"
        );
    }
    assert_eq!(engine.ledger().snapshot(), before);
}

#[test]
fn test_missing_accounts_and_rate() {
    let engine = TransferEngine::with_clock(MemoryLedger::new(), FixedClock::new(date(2024, 3, 1)));
    assert!(matches!(
        run(&engine, Operation::GetExchangeRate, &[]),
        Err(Error::NotFound {
            entity: Entity::ExchangeRate,
            ..
        })
    ));
    assert!(matches!(
        run(&engine, Operation::GetCustomer, &["C1"]),
        Err(Error::NotFound {
            entity: Entity::Customer,
            ..
        })
    ));
    assert!(matches!(
        run(&engine, Operation::QueryTransactionsBySerials, &["C1/S1"]),
        Err(Error::NotFound {
            entity: Entity::Transaction,
            ..
        })
    ));
    // Zero points need no rate
    assert!(matches!(
        run(&engine, Operation::QuoteExchange, &["0"]),
        Ok(Response::Quote(q)) if q.coin == 0 && q.fiat == 0
    ));
}

#[test]
fn test_issue_and_quote() {
    let engine = seeded();
    run(&engine, Operation::IssueCoins, &["I1", "250", "20240215"]).unwrap();

    match run(&engine, Operation::GetBankPool, &[]).unwrap() {
        Response::BankPool(pool) => assert_eq!(pool.total_coins(), 1250),
        other => panic!("expected bank pool, got {other:?}"),
    }
    let issued = transactions(&engine, Operation::QueryTransactionsBySerials, &["BANK_POOL/I1"]);
    assert_eq!(issued[0].kind, TransactionKind::Issue);
    assert_eq!(issued[0].date, "20240215");

    match run(&engine, Operation::QuoteExchange, &["5000"]).unwrap() {
        Response::Quote(quote) => assert_eq!((quote.coin, quote.fiat), (7, 5)),
        other => panic!("expected quote, got {other:?}"),
    }
}

#[test]
fn test_range_query_is_chronological_and_bounded() {
    let ledger = MemoryLedger::new();
    let days = [(1, 3), (5, 1), (5, 2), (20, 1)];
    for (i, (day, sequence)) in days.into_iter().enumerate() {
        let today = date(2024, 3, day);
        let engine = TransferEngine::with_clock(&ledger, FixedClock::new(today));
        if i == 0 {
            run(&engine, Operation::Initialize, &["0", "1000", "1", "1", "1"]).unwrap();
            run(&engine, Operation::RegisterCustomer, &["C7"]).unwrap();
            run(&engine, Operation::RegisterCustomer, &["C17"]).unwrap();
        }
        let timestamp = today.and_hms_opt(12, 0, 0).unwrap();
        let serial = compose_serial(timestamp, sequence, TransactionKind::Exchange).unwrap();
        let other = compose_serial(timestamp, sequence + 100, TransactionKind::Exchange).unwrap();
        run(&engine, Operation::ExchangePoints, &[serial.as_str(), "C7", "1"]).unwrap();
        run(&engine, Operation::ExchangePoints, &[other.as_str(), "C17", "1"]).unwrap();
    }

    let engine = TransferEngine::with_clock(&ledger, FixedClock::new(date(2024, 4, 1)));
    let march = transactions(
        &engine,
        Operation::QueryTransactionsByRange,
        &["C7", "20240301", "20240331"],
    );
    assert_eq!(march.len(), 4);
    assert!(march.iter().all(|r| r.cash_in_account == "C7"));
    let serials: Vec<&str> = march.iter().map(|r| r.serial.as_str()).collect();
    let mut sorted = serials.clone();
    sorted.sort_unstable();
    assert_eq!(serials, sorted);

    let fifth = transactions(
        &engine,
        Operation::QueryTransactionsByRange,
        &["C7", "20240305", "20240305"],
    );
    assert_eq!(fifth.len(), 2);
    assert!(fifth[0].serial < fifth[1].serial);

    let disjoint = transactions(
        &engine,
        Operation::QueryTransactionsByRange,
        &["C7", "20240401", "20240430"],
    );
    assert!(disjoint.is_empty());
}

#[test]
fn test_reused_serial_leaves_both_sides_untouched() {
    let engine = seeded();
    run(&engine, Operation::RegisterCustomer, &["C1"]).unwrap();
    run(&engine, Operation::RegisterMerchant, &["M1", "0"]).unwrap();
    run(&engine, Operation::ExchangePoints, &["S1", "C1", "5000"]).unwrap();
    let before = engine.ledger().snapshot();

    // The merchant leg is new, the customer leg collides with the exchange
    let result = run(
        &engine,
        Operation::GiftTransfer,
        &["S1", "C1", "Customer", "M1", "Merchant", "5"],
    );
    assert!(matches!(
        result,
        Err(Error::AlreadyExists {
            entity: Entity::Transaction,
            ..
        })
    ));
    assert_eq!(customer(&engine, "C1"), (7, 7));
    assert_eq!(merchant_coin(&engine, "M1"), 0);
    assert_eq!(engine.ledger().snapshot(), before);
}

#[test]
fn test_zero_pad_keeps_keys_fixed_width() {
    assert_eq!(zero_pad("123", 30), format!("{}123", "!".repeat(27)));
    let long = "abcdefghijklmnopqrstuvwxyz0123456789";
    assert_eq!(zero_pad(&long[..35], 30), &long[5..35]);
}

#[test]
fn test_history_exports_as_csv() {
    let engine = seeded();
    run(&engine, Operation::RegisterCustomer, &["C1"]).unwrap();
    let timestamp = date(2024, 3, 1).and_hms_opt(10, 0, 0).unwrap();
    let serial = compose_serial(timestamp, 1, TransactionKind::Exchange).unwrap();
    run(&engine, Operation::ExchangePoints, &[&serial, "C1", "5000"]).unwrap();
    let records = transactions(&engine, Operation::QueryTransactionsByRange, &["C1", "20240301", "20240301"]);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].serial, serial);

    let mut output = Vec::new();
    export_transactions(&records, &mut output).unwrap();
    let mut rdr = csv::Reader::from_reader(output.as_slice());
    let parsed: Vec<TransactionRecord> = rdr.deserialize().map(|r| r.unwrap()).collect();
    assert_eq!(parsed, records);
    assert!(String::from_utf8(output).unwrap().contains(",EX,7,"));
}

#[test]
fn test_file_ledger_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    {
        let ledger = FileLedger::open(&path).unwrap();
        let engine = TransferEngine::with_clock(&ledger, FixedClock::new(date(2024, 3, 1)));
        run(&engine, Operation::Initialize, &["0", "1000", "10000", "15", "10"]).unwrap();
        run(&engine, Operation::RegisterCustomer, &["C1"]).unwrap();
        run(&engine, Operation::ExchangePoints, &["S1", "C1", "5000"]).unwrap();
        ledger.save().unwrap();
    }

    let reopened = FileLedger::open(&path).unwrap();
    let engine = TransferEngine::with_clock(&reopened, FixedClock::new(date(2024, 3, 2)));
    assert_eq!(customer(&engine, "C1"), (7, 7));
    let legs = transactions(&engine, Operation::QueryTransactionsBySerials, &["C1/S1", "BANK_POOL/S1"]);
    assert_eq!(legs[0].amount, 7);
    assert_eq!(legs[1].amount, -7);
}

/// A store whose commits always fail, after an optional number of successes.
struct FailingLedger {
    inner: MemoryLedger,
    commits_left: Cell<usize>,
}

impl Ledger for FailingLedger {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.inner.put(key, value)
    }

    fn range_query(&self, start: &str, end: &str) -> Result<Entries<'_>, StoreError> {
        self.inner.range_query(start, end)
    }

    fn put_all(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), StoreError> {
        match self.commits_left.get() {
            0 => Err(StoreError::Unavailable("disk full".to_string())),
            n => {
                self.commits_left.set(n - 1);
                self.inner.put_all(entries)
            }
        }
    }
}

#[test]
fn test_failed_commit_leaves_store_untouched() {
    let ledger = FailingLedger {
        inner: MemoryLedger::new(),
        commits_left: Cell::new(2),
    };
    let engine = TransferEngine::with_clock(&ledger, FixedClock::new(date(2024, 3, 1)));
    run(&engine, Operation::Initialize, &["0", "1000", "10000", "15", "10"]).unwrap();
    run(&engine, Operation::RegisterCustomer, &["C1"]).unwrap();
    let before = ledger.inner.snapshot();

    let result = run(&engine, Operation::ExchangePoints, &["S1", "C1", "5000"]);
    assert!(matches!(
        result,
        Err(Error::Store(StoreError::Unavailable(_)))
    ));
    assert_eq!(ledger.inner.snapshot(), before);
    assert_eq!(customer(&engine, "C1"), (0, 0));
}
