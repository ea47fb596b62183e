// Typed node records and their boundary conversion.
//
// Query backends hand over loosely structured payloads (`RawNodeRecord`): numbers may
// arrive as JSON integers or as decimal / hex strings, and empty slots are encoded with
// zero ids or the zero address. Conversion happens once, on fetch; nothing past the
// query layer sees a raw payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::types::{Address, NodeId};

/// Display-only attributes fetched separately per node. Never used for traversal control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub max_level: u8,
    pub rank: u8,
}

/// Immutable snapshot of one ledger-tracked identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: NodeId,
    pub address: Address,
    /// Referring identity, `None` for a root registration.
    pub sponsor_id: Option<NodeId>,
    pub left_child_id: Option<NodeId>,
    pub right_child_id: Option<NodeId>,
    pub registered_at: DateTime<Utc>,
    pub is_active: bool,
    pub is_tech_account: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standing: Option<Standing>,
}

impl NodeRecord {
    /// Child slots that may be expanded. An inactive node has no meaningful children.
    pub fn expandable_children(&self) -> [Option<NodeId>; 2] {
        if self.is_active {
            [self.left_child_id, self.right_child_id]
        } else {
            [None, None]
        }
    }
}

/// Numeric field as delivered by a query backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Int(u64),
    Text(String),
}

impl Default for RawNumber {
    fn default() -> Self {
        RawNumber::Int(0)
    }
}

impl From<u64> for RawNumber {
    fn from(v: u64) -> Self {
        RawNumber::Int(v)
    }
}

impl RawNumber {
    fn to_u64(&self, field: &'static str) -> Result<u64, RecordError> {
        match self {
            RawNumber::Int(v) => Ok(*v),
            RawNumber::Text(text) => {
                let trimmed = text.trim();
                let parsed = match trimmed.strip_prefix("0x") {
                    Some(hex_digits) => u64::from_str_radix(hex_digits, 16),
                    None => trimmed.parse::<u64>(),
                };
                parsed.map_err(|_| RecordError::InvalidNumber {
                    field,
                    value: text.clone(),
                })
            }
        }
    }

    fn to_node_id(&self, field: &'static str) -> Result<Option<NodeId>, RecordError> {
        self.to_u64(field).map(NodeId::new)
    }
}

/// Node payload as returned by a remote query, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNodeRecord {
    #[serde(default)]
    pub id: RawNumber,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub sponsor_id: RawNumber,
    #[serde(default)]
    pub left_child_id: RawNumber,
    #[serde(default)]
    pub right_child_id: RawNumber,
    #[serde(default)]
    pub registered_at: RawNumber,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_tech_account: bool,
}

impl RawNodeRecord {
    /// Converts the payload into a typed record.
    ///
    /// Returns `Ok(None)` when the payload describes an empty slot (zero id or zero
    /// address); that is a valid answer, not an error.
    pub fn into_record(self) -> Result<Option<NodeRecord>, RecordError> {
        let id = match self.id.to_node_id("id")? {
            Some(id) => id,
            None => return Ok(None),
        };
        if self.address.trim().is_empty() {
            return Ok(None);
        }
        let address = Address::parse(&self.address)?;
        if address.is_zero() {
            return Ok(None);
        }

        let secs = self.registered_at.to_u64("registeredAt")?;
        let registered_at = i64::try_from(secs)
            .ok()
            .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
            .ok_or(RecordError::InvalidTimestamp(secs))?;

        Ok(Some(NodeRecord {
            id,
            address,
            sponsor_id: self.sponsor_id.to_node_id("sponsorId")?,
            left_child_id: self.left_child_id.to_node_id("leftChildId")?,
            right_child_id: self.right_child_id.to_node_id("rightChildId")?,
            registered_at,
            is_active: self.is_active,
            is_tech_account: self.is_tech_account,
            standing: None,
        }))
    }
}

impl From<&NodeRecord> for RawNodeRecord {
    fn from(record: &NodeRecord) -> Self {
        let raw_id = |id: Option<NodeId>| RawNumber::Int(id.map(|v| v.get()).unwrap_or(0));
        RawNodeRecord {
            id: RawNumber::Int(record.id.get()),
            address: record.address.to_string(),
            sponsor_id: raw_id(record.sponsor_id),
            left_child_id: raw_id(record.left_child_id),
            right_child_id: raw_id(record.right_child_id),
            registered_at: RawNumber::Int(record.registered_at.timestamp().max(0) as u64),
            is_active: record.is_active,
            is_tech_account: record.is_tech_account,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x1111111111111111111111111111111111111111";

    fn raw() -> RawNodeRecord {
        RawNodeRecord {
            id: 5.into(),
            address: ADDR.to_string(),
            sponsor_id: 1.into(),
            left_child_id: 10.into(),
            right_child_id: 0.into(),
            registered_at: 1_700_000_000.into(),
            is_active: true,
            is_tech_account: false,
        }
    }

    #[test]
    fn test_conversion_maps_zero_children_to_none() {
        let record = raw().into_record().unwrap().unwrap();
        assert_eq!(record.id.get(), 5);
        assert_eq!(record.sponsor_id, NodeId::new(1));
        assert_eq!(record.left_child_id, NodeId::new(10));
        assert_eq!(record.right_child_id, None);
        assert_eq!(record.registered_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_empty_slot_payloads_are_absent() {
        let mut zero_id = raw();
        zero_id.id = 0.into();
        assert_eq!(zero_id.into_record().unwrap(), None);

        let mut zero_address = raw();
        zero_address.address = Address::zero().to_string();
        assert_eq!(zero_address.into_record().unwrap(), None);
    }

    #[test]
    fn test_string_encoded_numbers() {
        let payload = r#"{
            "id": "5",
            "address": "0x1111111111111111111111111111111111111111",
            "sponsorId": "0x1",
            "leftChildId": 0,
            "rightChildId": "12",
            "registeredAt": "1700000000",
            "isActive": true
        }"#;
        let raw: RawNodeRecord = serde_json::from_str(payload).unwrap();
        let record = raw.into_record().unwrap().unwrap();
        assert_eq!(record.sponsor_id, NodeId::new(1));
        assert_eq!(record.right_child_id, NodeId::new(12));
        assert!(!record.is_tech_account);
    }

    #[test]
    fn test_garbled_number_is_rejected() {
        let mut bad = raw();
        bad.sponsor_id = RawNumber::Text("seven".into());
        assert_eq!(
            bad.into_record(),
            Err(RecordError::InvalidNumber {
                field: "sponsorId",
                value: "seven".into()
            })
        );
    }

    #[test]
    fn test_inactive_node_has_no_expandable_children() {
        let mut inactive = raw();
        inactive.is_active = false;
        let record = inactive.into_record().unwrap().unwrap();
        assert_eq!(record.expandable_children(), [None, None]);
    }
}
