use crate::engine::{
    error::ValidationError,
    key_codec::{validate_account_id, validate_serial},
    request::{expect_args, parse_int, positive, Operation},
    Coin,
};

/// A validated purchase: a customer pays a merchant `amount` coin for a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseTrade {
    serial: String,
    customer_id: String,
    amount: Coin,
    merchant_id: String,
    product_id: String,
}

impl PurchaseTrade {
    pub fn new(
        serial: &str,
        customer_id: &str,
        amount: Coin,
        merchant_id: &str,
        product_id: &str,
    ) -> Result<Self, ValidationError> {
        validate_serial(serial)?;
        validate_account_id(customer_id)?;
        validate_account_id(merchant_id)?;
        if customer_id == merchant_id {
            return Err(ValidationError::SelfTransfer(customer_id.to_string()));
        }
        Ok(Self {
            serial: serial.to_string(),
            customer_id: customer_id.to_string(),
            amount: positive("amount", amount)?,
            merchant_id: merchant_id.to_string(),
            product_id: product_id.to_string(),
        })
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn amount(&self) -> Coin {
        self.amount
    }

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }
}

/// `SERIAL CUSTOMER_ID AMOUNT MERCHANT_ID PRODUCT_ID`
impl TryFrom<&[String]> for PurchaseTrade {
    type Error = ValidationError;

    fn try_from(args: &[String]) -> Result<Self, Self::Error> {
        expect_args(Operation::PurchaseTrade, args, 5)?;
        PurchaseTrade::new(
            &args[0],
            &args[1],
            parse_int("amount", &args[2])?,
            &args[3],
            &args[4],
        )
    }
}
