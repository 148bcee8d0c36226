//! Queries whose query data is the ABI encoding of their parameters.

use crate::codec::{ResponseType, UnsignedFloatType, ValueType};
use crate::error::{FieldError, QueryError};
use crate::model::AbiType;
use crate::query::{AbiParam, OracleQuery, QueryEncoding};
use crate::serial::{Field, Item, Serializable};
use crate::validate::{self, field_error, param_error};

/// Outcome of a Snapshot governance proposal, as vote counts per choice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    proposal_id: String,
}

impl Snapshot {
    const PARAMS: &'static [AbiParam] = &[AbiParam { name: "proposalId", abi_type: "string" }];

    pub fn new(proposal_id: &str) -> Result<Snapshot, QueryError> {
        Ok(Snapshot { proposal_id: validate::text(proposal_id).map_err(param_error(Self::TYPE, "proposalId"))? })
    }

    pub fn proposal_id(&self) -> &str {
        &self.proposal_id
    }
}

impl Serializable for Snapshot {
    const TYPE: &'static str = "Snapshot";
    const FIELDS: &'static [Field] = &[Field::required("proposalId")];

    fn get(&self, field: &str) -> Option<Item> {
        match field {
            "proposalId" => Some(Item::from(self.proposal_id.as_str())),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Item) -> Result<(), FieldError> {
        match field {
            "proposalId" => self.proposal_id = validate::text(&value.into_string()?).map_err(field_error)?,
            _ => return Err(FieldError::Unknown { field: field.to_string() }),
        }
        Ok(())
    }
}

impl OracleQuery for Snapshot {
    fn validate(&self) -> Result<(), QueryError> {
        validate::text(&self.proposal_id).map_err(param_error(Self::TYPE, "proposalId"))?;
        Ok(())
    }

    fn value_type(&self) -> ResponseType {
        ResponseType::Value(ValueType::from_parsed(AbiType::Array(Box::new(AbiType::Uint(256))), false))
    }

    fn encoding(&self) -> QueryEncoding {
        QueryEncoding::Abi(Self::PARAMS)
    }
}

/// Settlement value of a DIVA protocol pool on Polygon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DivaProtocolPolygon {
    pool_id: u128,
}

impl DivaProtocolPolygon {
    const PARAMS: &'static [AbiParam] = &[AbiParam { name: "poolId", abi_type: "uint256" }];

    pub fn new(pool_id: u128) -> DivaProtocolPolygon {
        DivaProtocolPolygon { pool_id }
    }

    pub fn pool_id(&self) -> u128 {
        self.pool_id
    }
}

impl Serializable for DivaProtocolPolygon {
    const TYPE: &'static str = "DIVAProtocolPolygon";
    const FIELDS: &'static [Field] = &[Field::required("poolId")];

    fn get(&self, field: &str) -> Option<Item> {
        match field {
            "poolId" => Some(Item::from(self.pool_id)),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Item) -> Result<(), FieldError> {
        match field {
            "poolId" => self.pool_id = value.into_u128()?,
            _ => return Err(FieldError::Unknown { field: field.to_string() }),
        }
        Ok(())
    }
}

impl OracleQuery for DivaProtocolPolygon {
    fn value_type(&self) -> ResponseType {
        ResponseType::UnsignedFloat(UnsignedFloatType::builtin(256, 18, false))
    }

    fn encoding(&self) -> QueryEncoding {
        QueryEncoding::Abi(Self::PARAMS)
    }
}

/// Versioned Morphware model output, answered with a string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Morphware {
    version: u64,
}

impl Morphware {
    const PARAMS: &'static [AbiParam] = &[AbiParam { name: "version", abi_type: "uint256" }];

    pub fn new(version: u64) -> Morphware {
        Morphware { version }
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

impl Serializable for Morphware {
    const TYPE: &'static str = "Morphware";
    const FIELDS: &'static [Field] = &[Field::required("version")];

    fn get(&self, field: &str) -> Option<Item> {
        match field {
            "version" => Some(Item::from(self.version)),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Item) -> Result<(), FieldError> {
        match field {
            "version" => self.version = value.into_u64()?,
            _ => return Err(FieldError::Unknown { field: field.to_string() }),
        }
        Ok(())
    }
}

impl OracleQuery for Morphware {
    fn value_type(&self) -> ResponseType {
        ResponseType::Value(ValueType::from_parsed(AbiType::String, false))
    }

    fn encoding(&self) -> QueryEncoding {
        QueryEncoding::Abi(Self::PARAMS)
    }
}

/// Spot price of a cloud instance type in an availability zone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsSpotPrice {
    zone: String,
    instance: String,
}

impl AwsSpotPrice {
    const PARAMS: &'static [AbiParam] = &[
        AbiParam { name: "zone", abi_type: "string" },
        AbiParam { name: "instance", abi_type: "string" },
    ];

    pub fn new(zone: &str, instance: &str) -> Result<AwsSpotPrice, QueryError> {
        Ok(AwsSpotPrice {
            zone: validate::text(zone).map_err(param_error(Self::TYPE, "zone"))?,
            instance: validate::text(instance).map_err(param_error(Self::TYPE, "instance"))?,
        })
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }
}

impl Serializable for AwsSpotPrice {
    const TYPE: &'static str = "AwsSpotPrice";
    const FIELDS: &'static [Field] = &[Field::required("zone"), Field::required("instance")];

    fn get(&self, field: &str) -> Option<Item> {
        match field {
            "zone" => Some(Item::from(self.zone.as_str())),
            "instance" => Some(Item::from(self.instance.as_str())),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Item) -> Result<(), FieldError> {
        let raw = value.into_string()?;
        match field {
            "zone" => self.zone = validate::text(&raw).map_err(field_error)?,
            "instance" => self.instance = validate::text(&raw).map_err(field_error)?,
            _ => return Err(FieldError::Unknown { field: field.to_string() }),
        }
        Ok(())
    }
}

impl OracleQuery for AwsSpotPrice {
    fn validate(&self) -> Result<(), QueryError> {
        validate::text(&self.zone).map_err(param_error(Self::TYPE, "zone"))?;
        validate::text(&self.instance).map_err(param_error(Self::TYPE, "instance"))?;
        Ok(())
    }

    fn value_type(&self) -> ResponseType {
        ResponseType::UnsignedFloat(UnsignedFloatType::builtin(256, 18, false))
    }

    fn encoding(&self) -> QueryEncoding {
        QueryEncoding::Abi(Self::PARAMS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_params, ResponseValue};
    use crate::model::{format_hex, AbiValue};
    use crate::serial::{Entity, Registry};

    const PROPOSAL: &str = "QmbZ6cYVvfoKvkDX14jRcN86z6bfV135npUfhxmENjHnQ1";

    #[test]
    fn test_snapshot_identity() {
        let q = Snapshot::new(PROPOSAL).unwrap();
        let args = encode_params(&[AbiType::String], &[AbiValue::from(PROPOSAL)]).unwrap();
        let expected = encode_params(
            &[AbiType::String, AbiType::Bytes],
            &[AbiValue::from("Snapshot"), AbiValue::Bytes(args)],
        )
        .unwrap();
        assert_eq!(q.query_data().unwrap(), expected);
        assert_eq!(
            q.query_id().unwrap().to_hex(),
            "6ec98c95cf3aec7866c0fd1617c62e779a494ed49e689f578e14a5a0a0d99349"
        );
        assert_eq!(q.descriptor().unwrap(), format!(r#"{{"type":"Snapshot","proposalId":"{}"}}"#, PROPOSAL));
    }

    #[test]
    fn test_snapshot_response() {
        let vt = Snapshot::new(PROPOSAL).unwrap().value_type();
        assert_eq!(vt.abi_type(), "uint256[]");
        let votes = ResponseValue::Abi(AbiValue::Array(vec![AbiValue::Uint(12), AbiValue::Uint(3)]));
        let bytes = vt.encode(&votes).unwrap();
        assert_eq!(bytes.len(), 96);
        assert_eq!(vt.decode(&bytes).unwrap(), votes);
    }

    #[test]
    fn test_diva_identity() {
        let q = DivaProtocolPolygon::new(156);
        let data = q.query_data().unwrap();
        assert_eq!(data.len(), 192);
        assert_eq!(
            q.query_id().unwrap().to_hex(),
            "551179c46e6a88b7e034b039dbe264685f1895607515ddda71daffe9e7814c20"
        );
        assert_eq!(q.type_tag(), "DIVAProtocolPolygon");
    }

    #[test]
    fn test_wide_pool_id_state() {
        let mut q = DivaProtocolPolygon::default();
        let wide = u128::from(u64::MAX) * 4;
        q.set("poolId", Item::from(wide.to_string())).unwrap();
        assert_eq!(q.pool_id(), wide);
        assert_eq!(q.get("poolId"), Some(Item::Str(wide.to_string())));
        assert!(q.query_data().is_ok());
    }

    #[test]
    fn test_pool_id_above_i64_from_json_number() {
        let mut reg = Registry::new();
        reg.register::<DivaProtocolPolygon>().unwrap();
        let state = serde_json::json!({"type": "DIVAProtocolPolygon", "poolId": 10_000_000_000_000_000_000u64});
        let q: DivaProtocolPolygon = reg.deserialize_as(&state).unwrap();
        assert_eq!(q.pool_id(), 10_000_000_000_000_000_000);
        assert_eq!(q.get("poolId"), Some(Item::Uint(10_000_000_000_000_000_000)));
        assert_eq!(reg.serialize(&Item::entity(q)).unwrap(), state);
    }

    #[test]
    fn test_morphware_identity() {
        let q = Morphware::new(1);
        assert_eq!(
            format_hex(&q.query_data().unwrap()[..32]),
            "0000000000000000000000000000000000000000000000000000000000000040"
        );
        assert_eq!(
            q.query_id().unwrap().to_hex(),
            "bf7f9942188d84961cf2a01ec68c42ef000d5b0fb5ca7dc0fcf1ceee5164811c"
        );
        assert_eq!(q.value_type().abi_type(), "string");
    }

    #[test]
    fn test_aws_spot_price_identity() {
        let q = AwsSpotPrice::new("us-east-1f", "i3.16xlarge").unwrap();
        assert_eq!(
            q.query_id().unwrap().to_hex(),
            "1129a7b6be140744637bf7f2910e8e97b4af103935ee3a885bf7611b94caa3cd"
        );
        assert!(AwsSpotPrice::new("", "i3.16xlarge").is_err());
    }
}
