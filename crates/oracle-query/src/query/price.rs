//! Price feed queries with JSON query data.

use crate::codec::{ResponseType, UnsignedFloatType};
use crate::error::{FieldError, QueryError};
use crate::query::{OracleQuery, QueryEncoding};
use crate::serial::{Field, Item, Serializable};
use crate::validate::{self, field_error, param_error};

/// Price of a coin in a currency, by price type.
///
/// Responses are `ufixed64x6`, packed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoinPrice {
    coin: String,
    currency: String,
    price_type: String,
}

impl CoinPrice {
    pub fn new(coin: &str, currency: &str, price_type: &str) -> Result<CoinPrice, QueryError> {
        Ok(CoinPrice {
            coin: validate::symbol(coin).map_err(param_error(Self::TYPE, "coin"))?,
            currency: validate::symbol(currency).map_err(param_error(Self::TYPE, "currency"))?,
            price_type: validate::price_type(price_type).map_err(param_error(Self::TYPE, "price_type"))?,
        })
    }

    pub fn coin(&self) -> &str {
        &self.coin
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn price_type(&self) -> &str {
        &self.price_type
    }
}

impl Serializable for CoinPrice {
    const TYPE: &'static str = "CoinPrice";
    const FIELDS: &'static [Field] =
        &[Field::required("coin"), Field::required("currency"), Field::required("price_type")];

    fn get(&self, field: &str) -> Option<Item> {
        match field {
            "coin" => Some(Item::from(self.coin.as_str())),
            "currency" => Some(Item::from(self.currency.as_str())),
            "price_type" => Some(Item::from(self.price_type.as_str())),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Item) -> Result<(), FieldError> {
        let raw = value.into_string()?;
        match field {
            "coin" => self.coin = validate::symbol(&raw).map_err(field_error)?,
            "currency" => self.currency = validate::symbol(&raw).map_err(field_error)?,
            "price_type" => self.price_type = validate::price_type(&raw).map_err(field_error)?,
            _ => return Err(FieldError::Unknown { field: field.to_string() }),
        }
        Ok(())
    }
}

impl OracleQuery for CoinPrice {
    fn validate(&self) -> Result<(), QueryError> {
        validate::symbol(&self.coin).map_err(param_error(Self::TYPE, "coin"))?;
        validate::symbol(&self.currency).map_err(param_error(Self::TYPE, "currency"))?;
        validate::price_type(&self.price_type).map_err(param_error(Self::TYPE, "price_type"))?;
        Ok(())
    }

    fn value_type(&self) -> ResponseType {
        ResponseType::UnsignedFloat(UnsignedFloatType::builtin(64, 6, true))
    }

    fn encoding(&self) -> QueryEncoding {
        QueryEncoding::Json
    }
}

/// Spot price of an asset in a currency.
///
/// Responses are `ufixed256x18`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpotPrice {
    asset: String,
    currency: String,
}

impl SpotPrice {
    pub fn new(asset: &str, currency: &str) -> Result<SpotPrice, QueryError> {
        Ok(SpotPrice {
            asset: validate::symbol(asset).map_err(param_error(Self::TYPE, "asset"))?,
            currency: validate::symbol(currency).map_err(param_error(Self::TYPE, "currency"))?,
        })
    }

    /// Builds a query from symbols that are already lower-case.
    pub(crate) fn known(asset: &str, currency: &str) -> SpotPrice {
        SpotPrice { asset: asset.to_string(), currency: currency.to_string() }
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

impl Serializable for SpotPrice {
    const TYPE: &'static str = "SpotPrice";
    const FIELDS: &'static [Field] = &[Field::required("asset"), Field::required("currency")];

    fn get(&self, field: &str) -> Option<Item> {
        match field {
            "asset" => Some(Item::from(self.asset.as_str())),
            "currency" => Some(Item::from(self.currency.as_str())),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Item) -> Result<(), FieldError> {
        let raw = value.into_string()?;
        match field {
            "asset" => self.asset = validate::symbol(&raw).map_err(field_error)?,
            "currency" => self.currency = validate::symbol(&raw).map_err(field_error)?,
            _ => return Err(FieldError::Unknown { field: field.to_string() }),
        }
        Ok(())
    }
}

impl OracleQuery for SpotPrice {
    fn validate(&self) -> Result<(), QueryError> {
        validate::symbol(&self.asset).map_err(param_error(Self::TYPE, "asset"))?;
        validate::symbol(&self.currency).map_err(param_error(Self::TYPE, "currency"))?;
        Ok(())
    }

    fn value_type(&self) -> ResponseType {
        ResponseType::UnsignedFloat(UnsignedFloatType::builtin(256, 18, false))
    }

    fn encoding(&self) -> QueryEncoding {
        QueryEncoding::Json
    }
}

/// Price of a token contract on a chain, in the chain's native currency or USD.
///
/// Responses are `ufixed256x18`, packed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSpotPrice {
    address: String,
    chain_id: u64,
    currency: String,
}

impl TokenSpotPrice {
    pub fn new(address: &str, chain_id: u64, currency: &str) -> Result<TokenSpotPrice, QueryError> {
        Ok(TokenSpotPrice {
            address: validate::address(address).map_err(param_error(Self::TYPE, "address"))?,
            chain_id,
            currency: validate::token_currency(currency).map_err(param_error(Self::TYPE, "currency"))?,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

impl Serializable for TokenSpotPrice {
    const TYPE: &'static str = "TokenSpotPrice";
    const FIELDS: &'static [Field] =
        &[Field::required("address"), Field::required("chain_id"), Field::required("currency")];

    fn get(&self, field: &str) -> Option<Item> {
        match field {
            "address" => Some(Item::from(self.address.as_str())),
            "chain_id" => Some(Item::from(self.chain_id)),
            "currency" => Some(Item::from(self.currency.as_str())),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Item) -> Result<(), FieldError> {
        match field {
            "address" => self.address = validate::address(&value.into_string()?).map_err(field_error)?,
            "chain_id" => self.chain_id = value.into_u64()?,
            "currency" => {
                self.currency = validate::token_currency(&value.into_string()?).map_err(field_error)?
            }
            _ => return Err(FieldError::Unknown { field: field.to_string() }),
        }
        Ok(())
    }
}

impl OracleQuery for TokenSpotPrice {
    fn validate(&self) -> Result<(), QueryError> {
        validate::address(&self.address).map_err(param_error(Self::TYPE, "address"))?;
        validate::token_currency(&self.currency).map_err(param_error(Self::TYPE, "currency"))?;
        Ok(())
    }

    fn value_type(&self) -> ResponseType {
        ResponseType::UnsignedFloat(UnsignedFloatType::builtin(256, 18, true))
    }

    fn encoding(&self) -> QueryEncoding {
        QueryEncoding::Json
    }
}
