//! The Act type system: act-types, ABI types, slot types, and the store
//! schema (component C4's output type, consumed by C5 onward).

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// The closed sum of act-types (spec §3 "Act types"). Every typed
/// expression carries exactly one of these as a runtime witness, which is
/// what lets `Eq`/`NEq`/`ITE`/`TEntry` check their operands agree without a
/// dependently-typed AST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActType {
    AInteger,
    ABoolean,
    AByteStr,
    AContract,
}

impl fmt::Display for ActType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActType::AInteger => "AInteger",
            ActType::ABoolean => "ABoolean",
            ActType::AByteStr => "AByteStr",
            ActType::AContract => "AContract",
        };
        write!(f, "{s}")
    }
}

/// A resolved ABI-level type, as declared on a slot, calldata argument, or
/// mapping key/value. Distinct from [`ActType`]: several `AbiType`s share
/// one `ActType` (e.g. `uint256` and `address` are both `AInteger`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum AbiType {
    Uint(u16),
    Int(u16),
    Bytes(u16),
    Bool,
    Address,
    /// Names another contract; values of this type are contract addresses.
    Contract(String),
}

impl AbiType {
    /// The single act-type every typed expression of this ABI type carries.
    pub fn act_type(&self) -> ActType {
        match self {
            AbiType::Uint(_) | AbiType::Int(_) | AbiType::Address => ActType::AInteger,
            AbiType::Bool => ActType::ABoolean,
            AbiType::Bytes(_) => ActType::AByteStr,
            AbiType::Contract(_) => ActType::AContract,
        }
    }
}

impl AbiType {
    /// Resolves a parsed [`act_syntax::ast::TypeName`] to an `AbiType`.
    /// Every builtin family maps directly; any other identifier names a
    /// contract (a slot of that type holds another contract's address).
    pub fn from_raw(ty: &act_syntax::ast::TypeName) -> AbiType {
        use act_syntax::ast::TypeName;
        match ty {
            TypeName::Uint(w) => AbiType::Uint(*w),
            TypeName::Int(w) => AbiType::Int(*w),
            TypeName::Bytes(w) => AbiType::Bytes(*w),
            TypeName::Bool => AbiType::Bool,
            TypeName::Address => AbiType::Address,
            TypeName::Custom(name) => AbiType::Contract(name.clone()),
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiType::Uint(256) => write!(f, "uint"),
            AbiType::Uint(w) => write!(f, "uint{w}"),
            AbiType::Int(256) => write!(f, "int"),
            AbiType::Int(w) => write!(f, "int{w}"),
            AbiType::Bytes(w) => write!(f, "bytes{w}"),
            AbiType::Bool => write!(f, "bool"),
            AbiType::Address => write!(f, "address"),
            AbiType::Contract(name) => write!(f, "{name}"),
        }
    }
}

/// A storage slot's shape: either a single value or an n-ary mapping
/// (spec §3 "Slot type").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SlotType {
    Value(AbiType),
    /// `keys` is guaranteed non-empty by construction (see [`SlotType::mapping`]).
    Mapping { keys: Vec<AbiType>, value: AbiType },
}

impl SlotType {
    pub fn mapping(keys: Vec<AbiType>, value: AbiType) -> Self {
        assert!(!keys.is_empty(), "a mapping slot needs at least one key type");
        SlotType::Mapping { keys, value }
    }

    /// The ABI type a fully-indexed reference into this slot resolves to.
    pub fn value_type(&self) -> &AbiType {
        match self {
            SlotType::Value(v) => v,
            SlotType::Mapping { value, .. } => value,
        }
    }

    /// Number of index expressions a reference into this slot needs.
    pub fn arity(&self) -> usize {
        match self {
            SlotType::Value(_) => 0,
            SlotType::Mapping { keys, .. } => keys.len(),
        }
    }
}

/// The global store schema: contract name to (slot name to slot type).
/// Built once by C4 and immutable thereafter (spec §3 "Store").
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Store {
    contracts: BTreeMap<String, BTreeMap<String, SlotType>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contracts(&self) -> impl Iterator<Item = &str> {
        self.contracts.keys().map(String::as_str)
    }

    pub fn has_contract(&self, contract: &str) -> bool {
        self.contracts.contains_key(contract)
    }

    pub fn slot(&self, contract: &str, slot: &str) -> Option<&SlotType> {
        self.contracts.get(contract)?.get(slot)
    }

    pub fn slots(&self, contract: &str) -> impl Iterator<Item = (&str, &SlotType)> {
        self.contracts
            .get(contract)
            .into_iter()
            .flat_map(|slots| slots.iter().map(|(name, ty)| (name.as_str(), ty)))
    }

    /// Inserts a slot declaration. Returns `false` (and leaves the store
    /// unchanged) if the contract already declares a slot with this name,
    /// so callers can report a duplicate-slot diagnostic instead of
    /// silently overwriting.
    pub fn declare_slot(&mut self, contract: &str, slot: &str, ty: SlotType) -> bool {
        let slots = self.contracts.entry(contract.to_string()).or_default();
        if slots.contains_key(slot) {
            return false;
        }
        slots.insert(slot.to_string(), ty);
        true
    }

    /// Ensures a contract is present in the store even if it declares no
    /// slots, so later passes can still report "unknown contract" only for
    /// genuinely absent names.
    pub fn declare_contract(&mut self, contract: &str) -> bool {
        if self.contracts.contains_key(contract) {
            return false;
        }
        self.contracts.insert(contract.to_string(), BTreeMap::new());
        true
    }
}

/// Timing of a storage entry in a typed expression (spec §3 "Timing").
///
/// `Neither` is the untimed form produced directly by the typechecker
/// inside preconditions and case guards; `setTime` (see
/// [`crate::expr::TExpr::set_time`]) rewrites every `Neither` in a subtree
/// to `Pre` or `Post` when elaborating postconditions and state-update
/// right hand sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Timing {
    Pre,
    Post,
    Neither,
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timing::Pre => "Pre",
            Timing::Post => "Post",
            Timing::Neither => "Neither",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abi_type_act_type_mapping() {
        assert_eq!(AbiType::Uint(256).act_type(), ActType::AInteger);
        assert_eq!(AbiType::Address.act_type(), ActType::AInteger);
        assert_eq!(AbiType::Bool.act_type(), ActType::ABoolean);
        assert_eq!(AbiType::Bytes(32).act_type(), ActType::AByteStr);
        assert_eq!(AbiType::Contract("Token".into()).act_type(), ActType::AContract);
    }

    #[test]
    fn store_rejects_duplicate_slot_declarations() {
        let mut store = Store::new();
        assert!(store.declare_slot("Token", "totalSupply", SlotType::Value(AbiType::Uint(256))));
        assert!(!store.declare_slot("Token", "totalSupply", SlotType::Value(AbiType::Uint(256))));
    }

    #[test]
    fn mapping_slot_reports_arity() {
        let slot = SlotType::mapping(vec![AbiType::Address], AbiType::Uint(256));
        assert_eq!(slot.arity(), 1);
        assert_eq!(slot.value_type(), &AbiType::Uint(256));
    }
}
