use crate::engine::account::{AccountLedger, BankPool, CustomerAccount, MerchantAccount};
use crate::engine::clock::{format_date, Clock, SystemClock};
use crate::engine::error::Error;
use crate::engine::exchange_rate::{Conversion, ExchangeRate, ExchangeRateStore};
use crate::engine::key_codec::BANK_POOL_ACCOUNT;
use crate::engine::ledger::{Ledger, WriteBatch};
use crate::engine::logger::Logger;
use crate::engine::request::{
    ExchangePoints, GiftTransfer, Initialize, IssueCoins, Operation, PurchaseTrade,
    QuoteExchange, RangeQuery, RegisterCustomer, RegisterMerchant, Request, Response,
    SetExchangeRate,
};
use crate::engine::transaction_log::{
    TransactionKind, TransactionLog, TransactionRecord, TransactionRef,
};

/// The core transfer engine.
///
/// Serves every [`Operation`] against a [`Ledger`]. Mutating operations run
/// inside a [`WriteBatch`]: either every write of the operation reaches the
/// store, or none does.
#[derive(Debug)]
pub struct TransferEngine<L: Ledger, C: Clock = SystemClock> {
    ledger: L,
    clock: C,
    log: Logger,
}

/// The components of one unit of work, all sharing the same store handle.
struct Books<'a, L: Ledger + ?Sized> {
    accounts: AccountLedger<'a, L>,
    transactions: TransactionLog<'a, L>,
    rates: ExchangeRateStore<'a, L>,
}

impl<'a, L: Ledger + ?Sized> Books<'a, L> {
    fn new(ledger: &'a L, log: &Logger) -> Self {
        Self {
            accounts: AccountLedger::new(ledger, log.scoped("accounts")),
            transactions: TransactionLog::new(ledger, log.scoped("transactions")),
            rates: ExchangeRateStore::new(ledger, log.scoped("rates")),
        }
    }
}

impl<L: Ledger> TransferEngine<L> {
    /// Create an engine dating its records by the local calendar
    pub fn new(ledger: L) -> Self {
        Self::with_clock(ledger, SystemClock)
    }
}

impl<L: Ledger, C: Clock> TransferEngine<L, C> {
    pub fn with_clock(ledger: L, clock: C) -> Self {
        let log = Logger::default();
        log::trace!(target: log.target(), "TransferEngine initialized");
        Self { ledger, clock, log }
    }

    /// Replace the log target the engine and its components write under
    #[must_use]
    pub fn with_logger(mut self, log: Logger) -> Self {
        self.log = log;
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn into_ledger(self) -> L {
        self.ledger
    }

    /// Primary API: run one validated request.
    pub fn execute(&self, request: Request) -> Result<Response, Error> {
        let operation = request.operation();
        log::info!(target: self.log.target(), "[{operation}] start");
        let response = match request {
            Request::Initialize(init) => self.initialize(&init).map(|_| Response::Done)?,
            Request::SetExchangeRate(set) => self.set_exchange_rate(&set).map(|_| Response::Done)?,
            Request::GetExchangeRate => Response::Rate(self.get_exchange_rate()?),
            Request::QuoteExchange(quote) => Response::Quote(self.quote_exchange(&quote)?),
            Request::RegisterCustomer(register) => {
                self.register_customer(&register).map(|_| Response::Done)?
            }
            Request::RegisterMerchant(register) => {
                self.register_merchant(&register).map(|_| Response::Done)?
            }
            Request::ExchangePoints(exchange) => {
                self.exchange_points(&exchange).map(|_| Response::Done)?
            }
            Request::GiftTransfer(gift) => self.gift_transfer(&gift).map(|_| Response::Done)?,
            Request::PurchaseTrade(purchase) => {
                self.purchase_trade(&purchase).map(|_| Response::Done)?
            }
            Request::IssueCoins(issue) => self.issue_coins(&issue).map(|_| Response::Done)?,
            Request::GetCustomer { id } => Response::Customer(self.get_customer(&id)?),
            Request::GetMerchant { id } => Response::Merchant(self.get_merchant(&id)?),
            Request::GetBankPool => Response::BankPool(self.get_bank_pool()?),
            Request::QueryTransactionsBySerials(refs) => {
                Response::Transactions(self.query_transactions_by_serials(&refs)?)
            }
            Request::QueryTransactionsByRange(query) => {
                Response::Transactions(self.query_transactions_by_range(&query)?)
            }
        };
        log::info!(target: self.log.target(), "[{operation}] done");
        Ok(response)
    }

    fn today(&self) -> String {
        format_date(self.clock.today())
    }

    fn books(&self) -> Books<'_, L> {
        Books::new(&self.ledger, &self.log)
    }

    /// Run `work` against a fresh write batch and commit it only if `work` succeeded.
    fn atomically<T, F>(&self, operation: Operation, work: F) -> Result<T, Error>
    where
        F: FnOnce(&Books<'_, WriteBatch<'_, L>>) -> Result<T, Error>,
    {
        let batch = WriteBatch::new(&self.ledger);
        let result = work(&Books::new(&batch, &self.log));
        match result {
            Ok(value) => {
                let written = batch.commit()?;
                log::debug!(
                    target: self.log.target(),
                    "[{operation}] committed {written} key(s)"
                );
                Ok(value)
            }
            Err(e) => {
                log::warn!(
                    target: self.log.target(),
                    "[{operation}] - Rejected, {} staged write(s) discarded: {e}",
                    batch.len()
                );
                Err(e)
            }
        }
    }
}

// =============================================================================
// Rates and setup
// =============================================================================

impl<L: Ledger, C: Clock> TransferEngine<L, C> {
    /// Seed the bank pool and the exchange rate together.
    pub fn initialize(&self, init: &Initialize) -> Result<BankPool, Error> {
        self.atomically(Operation::Initialize, |books| {
            let pool = books
                .accounts
                .init_bank_pool(init.total_points(), init.total_coins())?;
            books.rates.set_rate(init.rate())?;
            Ok(pool)
        })
    }

    pub fn set_exchange_rate(&self, set: &SetExchangeRate) -> Result<ExchangeRate, Error> {
        self.atomically(Operation::SetExchangeRate, |books| {
            books.rates.set_rate(set.rate())
        })
    }

    pub fn get_exchange_rate(&self) -> Result<ExchangeRate, Error> {
        self.books().rates.get_rate()
    }

    /// Price points at the current rate without touching any balance.
    pub fn quote_exchange(&self, quote: &QuoteExchange) -> Result<Conversion, Error> {
        self.books().rates.convert(quote.points())
    }
}

// =============================================================================
// Accounts
// =============================================================================

impl<L: Ledger, C: Clock> TransferEngine<L, C> {
    pub fn register_customer(&self, register: &RegisterCustomer) -> Result<CustomerAccount, Error> {
        self.atomically(Operation::RegisterCustomer, |books| {
            books.accounts.register_customer(register.id())
        })
    }

    pub fn register_merchant(&self, register: &RegisterMerchant) -> Result<MerchantAccount, Error> {
        self.atomically(Operation::RegisterMerchant, |books| {
            books
                .accounts
                .register_merchant(register.id(), register.coin_balance())
        })
    }

    pub fn get_customer(&self, id: &str) -> Result<CustomerAccount, Error> {
        self.books().accounts.get_customer(id)
    }

    pub fn get_merchant(&self, id: &str) -> Result<MerchantAccount, Error> {
        self.books().accounts.get_merchant(id)
    }

    pub fn get_bank_pool(&self) -> Result<BankPool, Error> {
        self.books().accounts.get_bank_pool()
    }
}

// =============================================================================
// Transfers
// =============================================================================

impl<L: Ledger, C: Clock> TransferEngine<L, C> {
    /// Convert a customer's points into coin paid out of the bank pool.
    /// Returns the customer's leg of the mirrored pair.
    pub fn exchange_points(&self, exchange: &ExchangePoints) -> Result<TransactionRecord, Error> {
        let date = self.today();
        self.atomically(Operation::ExchangePoints, |books| {
            let customer_id = exchange.customer_id();
            books.accounts.get_customer(customer_id)?;
            books.accounts.get_bank_pool()?;

            let conversion = books.rates.convert(exchange.points())?;
            let customer = books.accounts.credit_customer(customer_id, conversion.coin)?;
            let pool = books
                .accounts
                .adjust_bank_pool(exchange.points(), -conversion.coin)?;

            let record = TransactionRecord {
                serial: exchange.serial().to_string(),
                cash_out_account: BANK_POOL_ACCOUNT.to_string(),
                cash_in_account: customer_id.to_string(),
                kind: TransactionKind::Exchange,
                amount: conversion.coin,
                cash_out_balance_after: pool.total_coins(),
                cash_in_balance_after: customer.amount(),
                date,
                product_id: String::new(),
                memo: String::new(),
            };
            books.transactions.append_mirrored(&record)?;
            log::info!(
                target: self.log.target(),
                "[exchange] {customer_id} {} points -> {} coin",
                exchange.points(),
                conversion.coin
            );
            Ok(record)
        })
    }

    /// Move coin between two accounts of either type.
    /// The source is checked for funds before anything is written.
    pub fn gift_transfer(&self, gift: &GiftTransfer) -> Result<TransactionRecord, Error> {
        let date = self.today();
        self.atomically(Operation::GiftTransfer, |books| {
            let mut from = books.accounts.get_account(gift.from_type(), gift.from_id())?;
            let mut to = books.accounts.get_account(gift.to_type(), gift.to_id())?;

            from.debit(gift.amount())?;
            to.credit(gift.amount())?;
            books.accounts.put_account(&from)?;
            books.accounts.put_account(&to)?;

            let record = TransactionRecord {
                serial: gift.serial().to_string(),
                cash_out_account: from.id().to_string(),
                cash_in_account: to.id().to_string(),
                kind: gift.kind(),
                amount: gift.amount(),
                cash_out_balance_after: from.total(),
                cash_in_balance_after: to.total(),
                date,
                product_id: String::new(),
                memo: String::new(),
            };
            books.transactions.append_mirrored(&record)?;
            log::info!(
                target: self.log.target(),
                "[gift] {} {} -> {} {} amount={}",
                gift.from_type(),
                gift.from_id(),
                gift.to_type(),
                gift.to_id(),
                gift.amount()
            );
            Ok(record)
        })
    }

    /// A customer pays a merchant for a product.
    pub fn purchase_trade(&self, purchase: &PurchaseTrade) -> Result<TransactionRecord, Error> {
        let date = self.today();
        self.atomically(Operation::PurchaseTrade, |books| {
            let mut customer = books.accounts.get_customer(purchase.customer_id())?;
            let mut merchant = books.accounts.get_merchant(purchase.merchant_id())?;

            customer.debit(purchase.amount())?;
            merchant.credit(purchase.amount())?;
            books.accounts.put_customer(&customer)?;
            books.accounts.put_merchant(&merchant)?;

            let record = TransactionRecord {
                serial: purchase.serial().to_string(),
                cash_out_account: customer.id().to_string(),
                cash_in_account: merchant.id().to_string(),
                kind: TransactionKind::Purchase,
                amount: purchase.amount(),
                cash_out_balance_after: customer.amount(),
                cash_in_balance_after: merchant.coin_balance(),
                date,
                product_id: purchase.product_id().to_string(),
                memo: String::new(),
            };
            books.transactions.append_mirrored(&record)?;
            log::info!(
                target: self.log.target(),
                "[purchase] {} -> {} product={} amount={}",
                purchase.customer_id(),
                purchase.merchant_id(),
                purchase.product_id(),
                purchase.amount()
            );
            Ok(record)
        })
    }

    /// Add new coin supply to the bank pool. Writes a single, unmirrored record.
    pub fn issue_coins(&self, issue: &IssueCoins) -> Result<TransactionRecord, Error> {
        self.atomically(Operation::IssueCoins, |books| {
            let pool = books.accounts.adjust_bank_pool(0, issue.amount())?;
            let record = TransactionRecord {
                serial: issue.serial().to_string(),
                cash_out_account: String::new(),
                cash_in_account: BANK_POOL_ACCOUNT.to_string(),
                kind: TransactionKind::Issue,
                amount: issue.amount(),
                cash_out_balance_after: 0,
                cash_in_balance_after: pool.total_coins(),
                date: format_date(issue.date()),
                product_id: String::new(),
                memo: String::new(),
            };
            books.transactions.append(&record)?;
            log::info!(
                target: self.log.target(),
                "[issue] {} coin, pool now {}",
                issue.amount(),
                pool.total_coins()
            );
            Ok(record)
        })
    }
}

// =============================================================================
// History
// =============================================================================

impl<L: Ledger, C: Clock> TransferEngine<L, C> {
    pub fn query_transactions_by_serials(
        &self,
        refs: &[TransactionRef],
    ) -> Result<Vec<TransactionRecord>, Error> {
        self.books().transactions.get_many(refs)
    }

    pub fn query_transactions_by_range(
        &self,
        query: &RangeQuery,
    ) -> Result<Vec<TransactionRecord>, Error> {
        let records = self
            .books()
            .transactions
            .range_query(
                query.account_id(),
                &format_date(query.start_date()),
                &format_date(query.end_date()),
            )
            .to_vec()?;
        log::debug!(
            target: self.log.target(),
            "[range] {} {}..={} -> {} record(s)",
            query.account_id(),
            query.start_date(),
            query.end_date(),
            records.len()
        );
        Ok(records)
    }
}
