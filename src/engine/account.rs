use serde::{Deserialize, Serialize};

use crate::engine::error::{Entity, Error, ValidationError};
use crate::engine::key_codec::{customer_key, merchant_key, BANK_POOL_KEY};
use crate::engine::ledger::{read_record, write_record, Ledger};
use crate::engine::logger::Logger;
use crate::engine::{Coin, Points};

/// Which side of the economy an account belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Customer,
    Merchant,
}

impl std::str::FromStr for AccountType {
    type Err = ValidationError;

    /// Accepts `Customer`/`C` and `Merchant`/`M`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Customer" | "C" => Ok(AccountType::Customer),
            "Merchant" | "M" => Ok(AccountType::Merchant),
            other => Err(ValidationError::AccountType(other.to_string())),
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountType::Customer => write!(f, "Customer"),
            AccountType::Merchant => write!(f, "Merchant"),
        }
    }
}

/// A customer's coin balance: `amount = avail + frozen`, all non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAccount {
    id: String,
    amount: Coin,
    avail: Coin,
    frozen: Coin,
}

impl CustomerAccount {
    pub(super) fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            amount: 0,
            avail: 0,
            frozen: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the total coin balance
    pub fn amount(&self) -> Coin {
        self.amount
    }

    /// Returns the spendable coin balance
    pub fn avail(&self) -> Coin {
        self.avail
    }

    /// Returns the coin held but not spendable
    pub fn frozen(&self) -> Coin {
        self.frozen
    }

    /// Credit coin. Both `amount` and `avail` move; coin is never credited into `frozen`.
    pub(super) fn credit(&mut self, coin: Coin) -> Result<(), Error> {
        let overflow = || Error::Overflow(format!("customer {}", self.id));
        let amount = self.amount.checked_add(coin).ok_or_else(overflow)?;
        let avail = self.avail.checked_add(coin).ok_or_else(overflow)?;
        self.amount = amount;
        self.avail = avail;
        #[cfg(debug_assertions)]
        self.assert_invariant();
        Ok(())
    }

    /// Debit coin from `amount` and `avail` symmetrically.
    pub(super) fn debit(&mut self, coin: Coin) -> Result<(), Error> {
        if !self.can_cover(coin) {
            return Err(Error::InsufficientBalance {
                account: self.id.clone(),
                amount: self.amount,
                avail: self.avail,
                requested: coin,
            });
        }
        self.amount -= coin;
        self.avail -= coin;
        #[cfg(debug_assertions)]
        self.assert_invariant();
        Ok(())
    }

    fn can_cover(&self, coin: Coin) -> bool {
        self.avail >= coin && self.amount >= coin
    }

    /// Assert the balance invariant:
    /// amount = avail + frozen, none negative
    #[cfg(debug_assertions)]
    fn assert_invariant(&self) {
        debug_assert_eq!(
            self.amount,
            self.avail + self.frozen,
            "Invariant violated: amount ({}) != avail ({}) + frozen ({})",
            self.amount,
            self.avail,
            self.frozen
        );
        debug_assert!(
            self.avail >= 0 && self.frozen >= 0,
            "Invariant violated: negative balance on customer {}",
            self.id
        );
    }
}

/// A merchant's balances. Merchants have a single coin field, no avail/frozen split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantAccount {
    id: String,
    point_balance: Points,
    coin_balance: Coin,
}

impl MerchantAccount {
    pub(super) fn new(id: &str, coin_balance: Coin) -> Self {
        Self {
            id: id.to_string(),
            point_balance: 0,
            coin_balance,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn point_balance(&self) -> Points {
        self.point_balance
    }

    pub fn coin_balance(&self) -> Coin {
        self.coin_balance
    }

    pub(super) fn credit(&mut self, coin: Coin) -> Result<(), Error> {
        self.coin_balance = self
            .coin_balance
            .checked_add(coin)
            .ok_or_else(|| Error::Overflow(format!("merchant {}", self.id)))?;
        Ok(())
    }

    pub(super) fn debit(&mut self, coin: Coin) -> Result<(), Error> {
        if self.coin_balance < coin {
            return Err(Error::InsufficientBalance {
                account: self.id.clone(),
                amount: self.coin_balance,
                avail: self.coin_balance,
                requested: coin,
            });
        }
        self.coin_balance -= coin;
        debug_assert!(self.coin_balance >= 0, "negative coin on merchant {}", self.id);
        Ok(())
    }
}

/// System-wide outstanding points and coin.
///
/// Coin leaves the pool on every exchange. The pool is expected to hold
/// enough issued coin to cover exchanges, but this is not enforced: a pool
/// that runs dry goes negative and a warning is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankPool {
    total_points: Points,
    total_coins: Coin,
}

impl BankPool {
    pub(super) fn new(total_points: Points, total_coins: Coin) -> Self {
        Self {
            total_points,
            total_coins,
        }
    }

    pub fn total_points(&self) -> Points {
        self.total_points
    }

    pub fn total_coins(&self) -> Coin {
        self.total_coins
    }

    pub(super) fn adjust(&mut self, delta_points: Points, delta_coins: Coin) -> Result<(), Error> {
        let overflow = || Error::Overflow("bank pool".to_string());
        let total_points = self
            .total_points
            .checked_add(delta_points)
            .ok_or_else(overflow)?;
        let total_coins = self
            .total_coins
            .checked_add(delta_coins)
            .ok_or_else(overflow)?;
        self.total_points = total_points;
        self.total_coins = total_coins;
        Ok(())
    }
}

/// Either kind of account, for operations that accept both (gifts).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Account {
    Customer(CustomerAccount),
    Merchant(MerchantAccount),
}

impl Account {
    pub fn id(&self) -> &str {
        match self {
            Account::Customer(c) => c.id(),
            Account::Merchant(m) => m.id(),
        }
    }

    /// Total coin balance
    pub fn total(&self) -> Coin {
        match self {
            Account::Customer(c) => c.amount(),
            Account::Merchant(m) => m.coin_balance(),
        }
    }

    /// Spendable coin balance
    pub fn available(&self) -> Coin {
        match self {
            Account::Customer(c) => c.avail(),
            Account::Merchant(m) => m.coin_balance(),
        }
    }

    pub(super) fn credit(&mut self, coin: Coin) -> Result<(), Error> {
        match self {
            Account::Customer(c) => c.credit(coin),
            Account::Merchant(m) => m.credit(coin),
        }
    }

    pub(super) fn debit(&mut self, coin: Coin) -> Result<(), Error> {
        match self {
            Account::Customer(c) => c.debit(coin),
            Account::Merchant(m) => m.debit(coin),
        }
    }
}

/// Reads and writes customer, merchant and bank pool records.
pub struct AccountLedger<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
    log: Logger,
}

impl<'a, L: Ledger + ?Sized> AccountLedger<'a, L> {
    pub fn new(ledger: &'a L, log: Logger) -> Self {
        Self { ledger, log }
    }

    pub fn register_customer(&self, id: &str) -> Result<CustomerAccount, Error> {
        let key = customer_key(id);
        if self.ledger.get(&key)?.is_some() {
            return Err(Error::AlreadyExists {
                entity: Entity::Customer,
                id: id.to_string(),
            });
        }
        let account = CustomerAccount::new(id);
        self.put_customer(&account)?;
        log::info!(target: self.log.target(), "[register] customer {id}");
        Ok(account)
    }

    pub fn register_merchant(&self, id: &str, coin_balance: Coin) -> Result<MerchantAccount, Error> {
        let key = merchant_key(id);
        if self.ledger.get(&key)?.is_some() {
            return Err(Error::AlreadyExists {
                entity: Entity::Merchant,
                id: id.to_string(),
            });
        }
        let account = MerchantAccount::new(id, coin_balance);
        self.put_merchant(&account)?;
        log::info!(
            target: self.log.target(),
            "[register] merchant {id} coin_balance={coin_balance}"
        );
        Ok(account)
    }

    pub fn get_customer(&self, id: &str) -> Result<CustomerAccount, Error> {
        read_record(self.ledger, &self.log, &customer_key(id), Entity::Customer)?.ok_or_else(|| {
            Error::NotFound {
                entity: Entity::Customer,
                id: id.to_string(),
            }
        })
    }

    pub fn get_merchant(&self, id: &str) -> Result<MerchantAccount, Error> {
        read_record(self.ledger, &self.log, &merchant_key(id), Entity::Merchant)?.ok_or_else(|| {
            Error::NotFound {
                entity: Entity::Merchant,
                id: id.to_string(),
            }
        })
    }

    pub fn get_bank_pool(&self) -> Result<BankPool, Error> {
        read_record(self.ledger, &self.log, BANK_POOL_KEY, Entity::BankPool)?.ok_or_else(|| {
            Error::NotFound {
                entity: Entity::BankPool,
                id: BANK_POOL_KEY.to_string(),
            }
        })
    }

    pub fn get_account(&self, account_type: AccountType, id: &str) -> Result<Account, Error> {
        match account_type {
            AccountType::Customer => self.get_customer(id).map(Account::Customer),
            AccountType::Merchant => self.get_merchant(id).map(Account::Merchant),
        }
    }

    pub fn put_customer(&self, account: &CustomerAccount) -> Result<(), Error> {
        write_record(
            self.ledger,
            &self.log,
            &customer_key(account.id()),
            Entity::Customer,
            account,
        )
    }

    pub fn put_merchant(&self, account: &MerchantAccount) -> Result<(), Error> {
        write_record(
            self.ledger,
            &self.log,
            &merchant_key(account.id()),
            Entity::Merchant,
            account,
        )
    }

    pub fn put_bank_pool(&self, pool: &BankPool) -> Result<(), Error> {
        write_record(self.ledger, &self.log, BANK_POOL_KEY, Entity::BankPool, pool)
    }

    pub fn put_account(&self, account: &Account) -> Result<(), Error> {
        match account {
            Account::Customer(c) => self.put_customer(c),
            Account::Merchant(m) => self.put_merchant(m),
        }
    }

    pub fn credit_customer(&self, id: &str, coin: Coin) -> Result<CustomerAccount, Error> {
        let mut account = self.get_customer(id)?;
        account.credit(coin)?;
        self.put_customer(&account)?;
        Ok(account)
    }

    pub fn debit_customer(&self, id: &str, coin: Coin) -> Result<CustomerAccount, Error> {
        let mut account = self.get_customer(id)?;
        account.debit(coin)?;
        self.put_customer(&account)?;
        Ok(account)
    }

    pub fn credit_merchant(&self, id: &str, coin: Coin) -> Result<MerchantAccount, Error> {
        let mut account = self.get_merchant(id)?;
        account.credit(coin)?;
        self.put_merchant(&account)?;
        Ok(account)
    }

    pub fn debit_merchant(&self, id: &str, coin: Coin) -> Result<MerchantAccount, Error> {
        let mut account = self.get_merchant(id)?;
        account.debit(coin)?;
        self.put_merchant(&account)?;
        Ok(account)
    }

    /// Replace the bank pool record with the given totals.
    pub fn init_bank_pool(&self, total_points: Points, total_coins: Coin) -> Result<BankPool, Error> {
        let pool = BankPool::new(total_points, total_coins);
        self.put_bank_pool(&pool)?;
        Ok(pool)
    }

    pub fn adjust_bank_pool(&self, delta_points: Points, delta_coins: Coin) -> Result<BankPool, Error> {
        let mut pool = self.get_bank_pool()?;
        pool.adjust(delta_points, delta_coins)?;
        if pool.total_coins() < 0 {
            log::warn!(
                target: self.log.target(),
                "[bank pool] coin total went negative: {}",
                pool.total_coins()
            );
        }
        self.put_bank_pool(&pool)?;
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ledger::MemoryLedger;

    fn accounts(ledger: &MemoryLedger) -> AccountLedger<'_, MemoryLedger> {
        AccountLedger::new(ledger, Logger::default())
    }

    #[test]
    fn test_new_customer_has_zero_balances() {
        let account = CustomerAccount::new("C1");
        assert_eq!(account.amount(), 0);
        assert_eq!(account.avail(), 0);
        assert_eq!(account.frozen(), 0);
    }

    #[test]
    fn test_credit_moves_amount_and_avail() {
        let mut account = CustomerAccount::new("C1");
        account.credit(7).unwrap();
        assert_eq!(account.amount(), 7);
        assert_eq!(account.avail(), 7);
        assert_eq!(account.frozen(), 0);
    }

    #[test]
    fn test_debit_moves_amount_and_avail() {
        let mut account = CustomerAccount::new("C1");
        account.credit(10).unwrap();
        account.debit(4).unwrap();
        assert_eq!(account.amount(), 6);
        assert_eq!(account.avail(), 6);
    }

    #[test]
    fn test_debit_insufficient_leaves_account_unchanged() {
        let mut account = CustomerAccount::new("C1");
        account.credit(3).unwrap();
        let err = account.debit(4).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientBalance {
                amount: 3,
                avail: 3,
                requested: 4,
                ..
            }
        ));
        assert_eq!(account.amount(), 3);
    }

    #[test]
    fn test_debit_checks_avail_not_only_amount() {
        let mut account = CustomerAccount {
            id: "C1".to_string(),
            amount: 10,
            avail: 2,
            frozen: 8,
        };
        assert!(account.debit(5).is_err());
        account.debit(2).unwrap();
        assert_eq!((account.amount(), account.avail(), account.frozen()), (8, 0, 8));
    }

    #[test]
    fn test_credit_overflow_is_rejected() {
        let mut account = CustomerAccount::new("C1");
        account.credit(i64::MAX).unwrap();
        assert!(matches!(account.credit(1), Err(Error::Overflow(_))));
        assert_eq!(account.amount(), i64::MAX);
    }

    #[test]
    fn test_merchant_single_balance() {
        let mut merchant = MerchantAccount::new("M1", 10);
        merchant.credit(5).unwrap();
        assert_eq!(merchant.coin_balance(), 15);
        merchant.debit(15).unwrap();
        assert_eq!(merchant.coin_balance(), 0);
        assert!(merchant.debit(1).is_err());
        assert_eq!(merchant.point_balance(), 0);
    }

    #[test]
    fn test_bank_pool_adjust() {
        let mut pool = BankPool::new(0, 100);
        pool.adjust(5000, -7).unwrap();
        assert_eq!(pool.total_points(), 5000);
        assert_eq!(pool.total_coins(), 93);
    }

    #[test]
    fn test_account_type_parsing() {
        assert_eq!("Customer".parse::<AccountType>(), Ok(AccountType::Customer));
        assert_eq!("C".parse::<AccountType>(), Ok(AccountType::Customer));
        assert_eq!("Merchant".parse::<AccountType>(), Ok(AccountType::Merchant));
        assert_eq!("M".parse::<AccountType>(), Ok(AccountType::Merchant));
        assert_eq!(
            "Bank".parse::<AccountType>(),
            Err(ValidationError::AccountType("Bank".to_string()))
        );
    }

    #[test]
    fn test_register_and_get_customer() {
        let ledger = MemoryLedger::new();
        let accounts = accounts(&ledger);
        accounts.register_customer("C1").unwrap();
        assert_eq!(accounts.get_customer("C1").unwrap(), CustomerAccount::new("C1"));
    }

    #[test]
    fn test_register_twice_is_rejected() {
        let ledger = MemoryLedger::new();
        let accounts = accounts(&ledger);
        accounts.register_customer("C1").unwrap();
        accounts.credit_customer("C1", 5).unwrap();
        assert!(matches!(
            accounts.register_customer("C1"),
            Err(Error::AlreadyExists { .. })
        ));
        assert_eq!(accounts.get_customer("C1").unwrap().amount(), 5);
    }

    #[test]
    fn test_customer_and_merchant_namespaces_are_separate() {
        let ledger = MemoryLedger::new();
        let accounts = accounts(&ledger);
        accounts.register_customer("X").unwrap();
        accounts.register_merchant("X", 3).unwrap();
        assert!(accounts.get_customer("X").is_ok());
        assert_eq!(accounts.get_merchant("X").unwrap().coin_balance(), 3);
    }

    #[test]
    fn test_missing_accounts_are_not_found() {
        let ledger = MemoryLedger::new();
        let accounts = accounts(&ledger);
        assert!(matches!(
            accounts.get_customer("nobody"),
            Err(Error::NotFound {
                entity: Entity::Customer,
                ..
            })
        ));
        assert!(matches!(
            accounts.get_merchant("nobody"),
            Err(Error::NotFound {
                entity: Entity::Merchant,
                ..
            })
        ));
        assert!(matches!(
            accounts.get_bank_pool(),
            Err(Error::NotFound {
                entity: Entity::BankPool,
                ..
            })
        ));
    }

    #[test]
    fn test_undecodable_record_is_format_error() {
        let ledger = MemoryLedger::new();
        ledger.put(&customer_key("C1"), b"{broken".to_vec()).unwrap();
        assert!(matches!(
            accounts(&ledger).get_customer("C1"),
            Err(Error::Format {
                entity: Entity::Customer,
                ..
            })
        ));
    }

    #[test]
    fn test_debit_customer_persists() {
        let ledger = MemoryLedger::new();
        let accounts = accounts(&ledger);
        accounts.register_customer("C1").unwrap();
        accounts.credit_customer("C1", 10).unwrap();
        accounts.debit_customer("C1", 4).unwrap();
        assert_eq!(accounts.get_customer("C1").unwrap().avail(), 6);
        assert!(accounts.debit_customer("C1", 7).is_err());
        assert_eq!(accounts.get_customer("C1").unwrap().avail(), 6);
    }

    #[test]
    fn test_merchant_credit_and_debit_persist() {
        let ledger = MemoryLedger::new();
        let accounts = accounts(&ledger);
        accounts.register_merchant("M1", 0).unwrap();
        accounts.credit_merchant("M1", 9).unwrap();
        accounts.debit_merchant("M1", 4).unwrap();
        assert_eq!(accounts.get_merchant("M1").unwrap().coin_balance(), 5);
    }

    #[test]
    fn test_adjust_bank_pool_persists() {
        let ledger = MemoryLedger::new();
        let accounts = accounts(&ledger);
        accounts.init_bank_pool(0, 1000).unwrap();
        accounts.adjust_bank_pool(5000, -7).unwrap();
        let pool = accounts.get_bank_pool().unwrap();
        assert_eq!((pool.total_points(), pool.total_coins()), (5000, 993));
    }

    #[test]
    fn test_records_use_camel_case_fields() {
        let merchant = MerchantAccount::new("M1", 4);
        assert_eq!(
            serde_json::to_value(&merchant).unwrap(),
            serde_json::json!({"id": "M1", "pointBalance": 0, "coinBalance": 4})
        );
        let pool = BankPool::new(1, 2);
        assert_eq!(
            serde_json::to_value(pool).unwrap(),
            serde_json::json!({"totalPoints": 1, "totalCoins": 2})
        );
    }
}
