use crate::engine::{
    account::AccountType,
    error::ValidationError,
    key_codec::{validate_account_id, validate_serial},
    request::{expect_args, parse_int, positive, Operation},
    transaction_log::TransactionKind,
    Coin,
};

/// A validated coin gift between two accounts of either type.
///
/// The source must be able to cover `amount` from both its available and
/// total balance; that is checked by the engine against stored balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftTransfer {
    serial: String,
    from_id: String,
    from_type: AccountType,
    to_id: String,
    to_type: AccountType,
    amount: Coin,
}

impl GiftTransfer {
    pub fn new(
        serial: &str,
        from_id: &str,
        from_type: AccountType,
        to_id: &str,
        to_type: AccountType,
        amount: Coin,
    ) -> Result<Self, ValidationError> {
        validate_serial(serial)?;
        validate_account_id(from_id)?;
        validate_account_id(to_id)?;
        // Both legs are filed by id alone, so a shared id would overwrite one leg
        if from_id == to_id {
            return Err(ValidationError::SelfTransfer(from_id.to_string()));
        }
        Ok(Self {
            serial: serial.to_string(),
            from_id: from_id.to_string(),
            from_type,
            to_id: to_id.to_string(),
            to_type,
            amount: positive("amount", amount)?,
        })
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn from_id(&self) -> &str {
        &self.from_id
    }

    pub fn from_type(&self) -> AccountType {
        self.from_type
    }

    pub fn to_id(&self) -> &str {
        &self.to_id
    }

    pub fn to_type(&self) -> AccountType {
        self.to_type
    }

    pub fn amount(&self) -> Coin {
        self.amount
    }

    /// Gift kind follows the receiving account's type
    pub fn kind(&self) -> TransactionKind {
        match self.to_type {
            AccountType::Customer => TransactionKind::GiftToCustomer,
            AccountType::Merchant => TransactionKind::GiftToMerchant,
        }
    }
}

/// `SERIAL FROM_ID FROM_TYPE TO_ID TO_TYPE AMOUNT`
impl TryFrom<&[String]> for GiftTransfer {
    type Error = ValidationError;

    fn try_from(args: &[String]) -> Result<Self, Self::Error> {
        expect_args(Operation::GiftTransfer, args, 6)?;
        GiftTransfer::new(
            &args[0],
            &args[1],
            args[2].parse()?,
            &args[3],
            args[4].parse()?,
            parse_int("amount", &args[5])?,
        )
    }
}
