use crate::engine::{
    error::ValidationError,
    key_codec::{validate_account_id, BANK_POOL_ACCOUNT},
    request::{expect_args, non_negative, parse_int, Operation},
    Coin,
};

/// Open a customer account with zero balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterCustomer {
    id: String,
}

/// Account ids usable by registration: valid, and not the bank pool's.
fn registrable(id: &str) -> Result<(), ValidationError> {
    validate_account_id(id)?;
    if id == BANK_POOL_ACCOUNT {
        return Err(ValidationError::ReservedAccountId(id.to_string()));
    }
    Ok(())
}

impl RegisterCustomer {
    pub fn new(id: &str) -> Result<Self, ValidationError> {
        registrable(id)?;
        Ok(Self { id: id.to_string() })
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// `CUSTOMER_ID`
impl TryFrom<&[String]> for RegisterCustomer {
    type Error = ValidationError;

    fn try_from(args: &[String]) -> Result<Self, Self::Error> {
        expect_args(Operation::RegisterCustomer, args, 1)?;
        RegisterCustomer::new(&args[0])
    }
}

/// Open a merchant account with an opening coin balance and zero points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterMerchant {
    id: String,
    coin_balance: Coin,
}

impl RegisterMerchant {
    pub fn new(id: &str, coin_balance: Coin) -> Result<Self, ValidationError> {
        registrable(id)?;
        Ok(Self {
            id: id.to_string(),
            coin_balance: non_negative("coinBalance", coin_balance)?,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn coin_balance(&self) -> Coin {
        self.coin_balance
    }
}

/// `MERCHANT_ID COIN_BALANCE`
impl TryFrom<&[String]> for RegisterMerchant {
    type Error = ValidationError;

    fn try_from(args: &[String]) -> Result<Self, Self::Error> {
        expect_args(Operation::RegisterMerchant, args, 2)?;
        RegisterMerchant::new(&args[0], parse_int("coinBalance", &args[1])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_valid_customer() {
        let register = RegisterCustomer::try_from(args(&["C1"]).as_slice()).unwrap();
        assert_eq!(register.id(), "C1");
    }

    #[test]
    fn test_customer_rejects_bad_id() {
        assert!(RegisterCustomer::new("C 1").is_err());
        assert!(RegisterCustomer::try_from(args(&[]).as_slice()).is_err());
    }

    #[test]
    fn test_bank_pool_id_is_reserved() {
        assert_eq!(
            RegisterCustomer::new(BANK_POOL_ACCOUNT),
            Err(ValidationError::ReservedAccountId(BANK_POOL_ACCOUNT.to_string()))
        );
        assert!(RegisterMerchant::new(BANK_POOL_ACCOUNT, 0).is_err());
    }

    #[test]
    fn test_valid_merchant() {
        let register = RegisterMerchant::try_from(args(&["M1", "250"]).as_slice()).unwrap();
        assert_eq!(register.id(), "M1");
        assert_eq!(register.coin_balance(), 250);
    }

    #[test]
    fn test_merchant_rejects_negative_opening_balance() {
        assert_eq!(
            RegisterMerchant::new("M1", -1),
            Err(ValidationError::Negative {
                field: "coinBalance",
                value: -1
            })
        );
    }

    #[test]
    fn test_merchant_rejects_non_numeric_balance() {
        assert!(RegisterMerchant::try_from(args(&["M1", "ten"]).as_slice()).is_err());
    }
}
