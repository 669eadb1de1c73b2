//! Storage references, items, updates, and locations (spec §3).
//!
//! These types sit between the store schema ([`crate::types::Store`]) and
//! typed expressions ([`crate::expr::TExpr`]): a [`StorageRef`] names a
//! slot (possibly indexed into a mapping), a [`StorageItem`] pairs that
//! name with its resolved act-type and ABI value-type, and a [`Rewrite`]
//! records whether a referenced location is actually updated by a
//! behaviour or merely held constant.

use act_base::Span;
use serde::Serialize;

use crate::expr::TExpr;
use crate::types::{AbiType, ActType};

/// JSON shape for one storage reference (spec.md §6: "storage references
/// use `{symbol:\"lookup\"|\"select\", …}`"). `SVar` serializes as a bare
/// `lookup`; each `SMapping` hop wraps its parent as `select` over
/// `index`; the unsupported `SField` cross-contract hop serializes as
/// `field` for parity even though no downstream consumer accepts it.
#[derive(Debug, Serialize)]
pub struct StorageRefNode {
    pub symbol: &'static str,
    pub contract: String,
    pub slot: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<Box<StorageRefNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<Box<crate::expr::ExprNode>>,
}

/// A storage reference, recursive over mapping indices and (rare)
/// cross-contract field access.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageRef {
    /// A top-level slot: `balanceOf`, `totalSupply`.
    SVar {
        contract: String,
        name: String,
        span: Span,
    },
    /// One level of mapping indexing: `parent[index]`.
    SMapping {
        parent: Box<StorageRef>,
        index: Box<TExpr>,
        span: Span,
    },
    /// Cross-contract access introduced by an `at Contract` clause (spec
    /// §9's `SField`). The encoder (C7) rejects every occurrence with an
    /// internal error; it exists in the data model but has no supported
    /// semantics downstream.
    SField {
        parent: Box<StorageRef>,
        contract: String,
        span: Span,
    },
}

impl StorageRef {
    pub fn span(&self) -> Span {
        match self {
            StorageRef::SVar { span, .. } => *span,
            StorageRef::SMapping { span, .. } => *span,
            StorageRef::SField { span, .. } => *span,
        }
    }

    /// The contract a reference ultimately names, walking past any mapping
    /// indices (but not past an `SField` hop, which changes contract).
    pub fn contract(&self) -> &str {
        match self {
            StorageRef::SVar { contract, .. } => contract,
            StorageRef::SMapping { parent, .. } => parent.contract(),
            StorageRef::SField { contract, .. } => contract,
        }
    }

    /// The declared slot name this reference ultimately indexes into.
    pub fn slot_name(&self) -> &str {
        match self {
            StorageRef::SVar { name, .. } => name,
            StorageRef::SMapping { parent, .. } => parent.slot_name(),
            StorageRef::SField { parent, .. } => parent.slot_name(),
        }
    }

    /// True if this reference or any of its parents is a cross-contract
    /// `SField` hop.
    pub fn crosses_contract(&self) -> bool {
        match self {
            StorageRef::SVar { .. } => false,
            StorageRef::SMapping { parent, .. } => parent.crosses_contract(),
            StorageRef::SField { .. } => true,
        }
    }

    /// Builds the JSON node for this reference (see [`StorageRefNode`]).
    pub fn to_node(&self) -> StorageRefNode {
        match self {
            StorageRef::SVar { contract, name, .. } => StorageRefNode {
                symbol: "lookup",
                contract: contract.clone(),
                slot: name.clone(),
                base: None,
                index: None,
            },
            StorageRef::SMapping { parent, index, .. } => StorageRefNode {
                symbol: "select",
                contract: parent.contract().to_string(),
                slot: parent.slot_name().to_string(),
                base: Some(Box::new(parent.to_node())),
                index: Some(Box::new(index.to_node())),
            },
            StorageRef::SField { parent, contract, .. } => StorageRefNode {
                symbol: "field",
                contract: contract.clone(),
                slot: parent.slot_name().to_string(),
                base: Some(Box::new(parent.to_node())),
                index: None,
            },
        }
    }
}

/// A storage reference paired with its resolved act-type and ABI
/// value-type (spec §3 "Storage item").
#[derive(Debug, Clone, PartialEq)]
pub struct StorageItem {
    pub act_type: ActType,
    pub value_type: AbiType,
    pub storage_ref: StorageRef,
}

/// JSON shape for one storage item: the reference plus its resolved sort.
#[derive(Debug, Serialize)]
pub struct StorageItemNode {
    #[serde(flatten)]
    pub reference: StorageRefNode,
    pub sort: ActType,
    pub abi_type: String,
}

impl StorageItem {
    pub fn to_node(&self) -> StorageItemNode {
        StorageItemNode {
            reference: self.storage_ref.to_node(),
            sort: self.act_type,
            abi_type: self.value_type.to_string(),
        }
    }
}

/// A reference without an rhs, used for read-only predicates and for the
/// `Constant` half of a [`Rewrite`] (spec §3 "Storage location").
pub type StorageLocation = StorageItem;

/// An assignment of a new value to a storage item (spec §3 "Storage
/// update"). The rhs's act-type is guaranteed (by the typechecker) to
/// match `item.act_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageUpdate {
    pub item: StorageItem,
    pub rhs: TExpr,
}

/// One entry of a behaviour's or constructor's state-update list: either a
/// location whose pre- and post-values are asserted equal (unmutated but
/// still referenced), or a genuine update (spec §3 "Rewrite").
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite {
    Constant(StorageLocation),
    Update(StorageUpdate),
}

impl Rewrite {
    pub fn item(&self) -> &StorageItem {
        match self {
            Rewrite::Constant(loc) => loc,
            Rewrite::Update(upd) => &upd.item,
        }
    }
}

/// JSON shape for one rewrite: the location plus `None` (constant) or
/// `Some(rhs)` (update).
#[derive(Debug, Serialize)]
pub struct RewriteNode {
    #[serde(flatten)]
    pub location: StorageItemNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rhs: Option<crate::expr::ExprNode>,
}

impl Rewrite {
    pub fn to_node(&self) -> RewriteNode {
        match self {
            Rewrite::Constant(loc) => RewriteNode {
                location: loc.to_node(),
                rhs: None,
            },
            Rewrite::Update(upd) => RewriteNode {
                location: upd.item.to_node(),
                rhs: Some(upd.rhs.to_node()),
            },
        }
    }
}
