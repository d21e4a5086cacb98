//! Known-account preconditions
//!
//! A conditional transaction declares, per account, either the storage root it
//! expects or a set of storage slots and the values it expects them to hold.
//! The JSON form carries no tag: a hash string is a root assertion, an object
//! of hash keys to hash values is a slots assertion.

use alloy::primitives::{Address, B256};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Message returned when a value is neither a hash nor a slot mapping
pub const KNOWN_ACCOUNT_DECODE_ERROR: &str = "cannot interpret account precondition";

/// Expected state of a single account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum KnownAccount {
    /// Storage root must equal this hash
    Root(B256),
    /// Every listed slot must hold the listed value
    Slots(HashMap<B256, B256>),
}

impl KnownAccount {
    /// Expected storage root, if this is a root assertion
    pub fn root(&self) -> Option<B256> {
        match self {
            Self::Root(root) => Some(*root),
            Self::Slots(_) => None,
        }
    }

    /// Expected slot values, if this carries a slots assertion.
    ///
    /// A root assertion never carries slots. A slots assertion with no
    /// entries is still reported, since no root was declared for it.
    pub fn slots(&self) -> Option<&HashMap<B256, B256>> {
        match self {
            Self::Root(_) => None,
            Self::Slots(slots) => Some(slots),
        }
    }

    /// True iff a root hash was declared, zero hash included
    pub fn has_root_assertion(&self) -> bool {
        self.root().is_some()
    }

    /// True iff slots were declared or no root was declared
    pub fn has_slots_assertion(&self) -> bool {
        self.slots().is_some()
    }

    /// Number of state reads needed to check this assertion
    pub fn slot_count(&self) -> usize {
        match self {
            Self::Root(_) => 1,
            Self::Slots(slots) => slots.len(),
        }
    }
}

impl Default for KnownAccount {
    fn default() -> Self {
        Self::Slots(HashMap::new())
    }
}

/// A 32-byte hash written as `0x` followed by 64 hex digits
#[derive(PartialEq, Eq, Hash)]
struct HexHash(B256);

impl HexHash {
    fn parse(s: &str) -> Option<Self> {
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
        if digits.len() != 64 {
            return None;
        }
        digits.parse().ok().map(Self)
    }
}

impl<'de> Deserialize<'de> for HexHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| de::Error::custom(KNOWN_ACCOUNT_DECODE_ERROR))
    }
}

impl<'de> Deserialize<'de> for KnownAccount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Variant order matters: the scalar form is tried first.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Root(HexHash),
            Slots(HashMap<HexHash, HexHash>),
        }

        match Shape::deserialize(deserializer) {
            Ok(Shape::Root(root)) => Ok(Self::Root(root.0)),
            Ok(Shape::Slots(slots)) => Ok(Self::Slots(
                slots.into_iter().map(|(key, value)| (key.0, value.0)).collect(),
            )),
            Err(_) => Err(de::Error::custom(KNOWN_ACCOUNT_DECODE_ERROR)),
        }
    }
}

/// Known-account preconditions of a transaction, keyed by address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownAccounts {
    #[serde(rename = "knownAccounts", default)]
    pub accounts: HashMap<Address, KnownAccount>,
}

impl KnownAccounts {
    /// Create an empty precondition set
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the expected storage root of an account
    pub fn with_root(mut self, address: Address, root: B256) -> Self {
        self.accounts.insert(address, KnownAccount::Root(root));
        self
    }

    /// Declare the expected value of a storage slot.
    ///
    /// Replaces a root assertion previously declared for the same account.
    pub fn with_slot(mut self, address: Address, key: B256, value: B256) -> Self {
        match self.accounts.get_mut(&address) {
            Some(KnownAccount::Slots(slots)) => {
                slots.insert(key, value);
            }
            _ => {
                self.accounts
                    .insert(address, KnownAccount::Slots(HashMap::from([(key, value)])));
            }
        }
        self
    }

    /// Precondition declared for an account
    pub fn get(&self, address: &Address) -> Option<&KnownAccount> {
        self.accounts.get(address)
    }

    /// Iterate over declared accounts in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &KnownAccount)> {
        self.accounts.iter()
    }

    /// Number of declared accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Total state reads needed to check every declared account
    pub fn slot_count(&self) -> usize {
        self.accounts.values().map(KnownAccount::slot_count).sum()
    }
}

impl From<HashMap<Address, KnownAccount>> for KnownAccounts {
    fn from(accounts: HashMap<Address, KnownAccount>) -> Self {
        Self { accounts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256};

    const ACCOUNT: Address = address!("6b3A8798E5Fb9fC5603F3aB5eA2e8136694e55d0");

    #[test]
    fn test_known_accounts_json_decoding() {
        let tests: Vec<(&str, bool, KnownAccounts)> = vec![
            (
                r#"{"knownAccounts":{"0x6b3A8798E5Fb9fC5603F3aB5eA2e8136694e55d0":"0x290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563"}}"#,
                false,
                KnownAccounts::new().with_root(
                    ACCOUNT,
                    b256!("290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563"),
                ),
            ),
            (
                r#"{"knownAccounts":{"0x6b3A8798E5Fb9fC5603F3aB5eA2e8136694e55d0":{"0xc65a7bb8d6351c1cf70c95a316cc6a92839c986682d98bc35f958f4883f9d2a8":"0x0000000000000000000000000000000000000000000000000000000000000000"}}}"#,
                false,
                KnownAccounts::new().with_slot(
                    ACCOUNT,
                    b256!("c65a7bb8d6351c1cf70c95a316cc6a92839c986682d98bc35f958f4883f9d2a8"),
                    B256::ZERO,
                ),
            ),
            (r#"{"knownAccounts":{}}"#, false, KnownAccounts::new()),
            (r#"{"knownAccounts":{"":""}}"#, true, KnownAccounts::new()),
        ];

        for (i, (input, must_fail, expected)) in tests.into_iter().enumerate() {
            let result = serde_json::from_str::<KnownAccounts>(input);
            if must_fail {
                assert!(result.is_err(), "case {} should fail", i);
                continue;
            }
            let decoded = result.unwrap_or_else(|e| panic!("case {} failed: {}", i, e));
            assert_eq!(decoded, expected, "case {}", i);
        }
    }

    #[test]
    fn test_root_form_predicates() {
        let account: KnownAccount = serde_json::from_str(
            r#""0x290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563""#,
        )
        .unwrap();

        assert!(account.has_root_assertion());
        assert!(!account.has_slots_assertion());
        assert_eq!(
            account.root(),
            Some(b256!("290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563"))
        );
    }

    #[test]
    fn test_zero_root_is_still_a_root_assertion() {
        let account: KnownAccount = serde_json::from_str(
            r#""0x0000000000000000000000000000000000000000000000000000000000000000""#,
        )
        .unwrap();

        assert!(account.has_root_assertion());
        assert_eq!(account.root(), Some(B256::ZERO));
    }

    #[test]
    fn test_slots_form_predicates() {
        let account: KnownAccount = serde_json::from_str(
            r#"{"0x0000000000000000000000000000000000000000000000000000000000000001":"0x00000000000000000000000000000000000000000000000000000000000000ff"}"#,
        )
        .unwrap();

        assert!(account.has_slots_assertion());
        assert!(!account.has_root_assertion());
        assert_eq!(account.slot_count(), 1);
    }

    #[test]
    fn test_empty_slots_without_root() {
        let account: KnownAccount = serde_json::from_str("{}").unwrap();

        assert!(!account.has_root_assertion());
        assert!(account.has_slots_assertion());
        assert!(account.slots().unwrap().is_empty());
        assert_eq!(account, KnownAccount::default());
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        for input in [
            r#""""#,
            r#""0x1234""#,
            "42",
            "null",
            r#"{"0x01":"0x02"}"#,
            r#"{"0x0000000000000000000000000000000000000000000000000000000000000001":7}"#,
            // Hashes must be hex strings with a 0x prefix
            "[0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0]",
            r#""290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563""#,
            r#"{"290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563":"0x0000000000000000000000000000000000000000000000000000000000000001"}"#,
            r#""0x290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e5zz""#,
        ] {
            let err = serde_json::from_str::<KnownAccount>(input).unwrap_err();
            assert!(
                err.to_string().contains(KNOWN_ACCOUNT_DECODE_ERROR),
                "unexpected error for {}: {}",
                input,
                err
            );
        }
    }

    #[test]
    fn test_clone_is_deep() {
        let key = B256::with_last_byte(1);
        let mut original = KnownAccount::Slots(HashMap::from([(key, B256::with_last_byte(2))]));
        let mut copy = original.clone();

        if let KnownAccount::Slots(slots) = &mut original {
            slots.insert(key, B256::with_last_byte(3));
            slots.insert(B256::with_last_byte(9), B256::ZERO);
        }
        assert_eq!(copy.slots().unwrap().get(&key), Some(&B256::with_last_byte(2)));
        assert_eq!(copy.slot_count(), 1);

        if let KnownAccount::Slots(slots) = &mut copy {
            slots.clear();
        }
        assert_eq!(original.slot_count(), 2);
    }

    #[test]
    fn test_clone_of_root_is_independent() {
        let mut original = KnownAccount::Root(B256::with_last_byte(1));
        let copy = original.clone();

        original = KnownAccount::Root(B256::with_last_byte(2));
        assert_eq!(copy.root(), Some(B256::with_last_byte(1)));
        assert_eq!(original.root(), Some(B256::with_last_byte(2)));
    }

    #[test]
    fn test_serialization_keeps_shape() {
        let known = KnownAccounts::new()
            .with_root(ACCOUNT, B256::with_last_byte(7))
            .with_slot(Address::ZERO, B256::with_last_byte(1), B256::with_last_byte(2));

        let json = serde_json::to_value(&known).unwrap();
        let accounts = json["knownAccounts"].as_object().unwrap();
        assert!(accounts.values().any(|v| v.is_string()));
        assert!(accounts.values().any(|v| v.is_object()));

        let decoded: KnownAccounts = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, known);
    }

    #[test]
    fn test_slot_count() {
        let known = KnownAccounts::new()
            .with_root(ACCOUNT, B256::ZERO)
            .with_slot(Address::ZERO, B256::with_last_byte(1), B256::ZERO)
            .with_slot(Address::ZERO, B256::with_last_byte(2), B256::ZERO);

        assert_eq!(known.len(), 2);
        assert_eq!(known.slot_count(), 3);
    }

    #[test]
    fn test_with_slot_replaces_root() {
        let known = KnownAccounts::new()
            .with_root(ACCOUNT, B256::ZERO)
            .with_slot(ACCOUNT, B256::with_last_byte(1), B256::with_last_byte(1));

        let account = known.get(&ACCOUNT).unwrap();
        assert!(!account.has_root_assertion());
        assert_eq!(account.slot_count(), 1);
    }
}
