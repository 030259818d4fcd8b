//! Child classification rules
//!
//! Bulk exports emit nested connections as separate lines tagged with
//! `__parentId` but without saying which connection they came from. Each
//! [`Role`] therefore lists its possible children as ordered
//! [`ChildRule`]s; the first rule that matches a record decides the
//! collection it is attached to.

use crate::domain::EntityKind;
use serde_json::{Map, Value};

/// Position of a record in an entity hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Order,
    LineItem,
    Refund,
    RefundLineItem,
    Transaction,
    Product,
    Variant,
    InventoryLevel,
    Customer,
    Address,
    Metafield,
    Collection,
    CollectionProduct,
    MetafieldOwner,
    InventoryItem,
}

/// How a record is recognised when it carries no `__typename`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// Any record under this parent
    Always,
    /// Records having at least one of these fields
    HasAnyField(&'static [&'static str]),
}

impl Matcher {
    pub fn matches(&self, record: &Map<String, Value>) -> bool {
        match self {
            Matcher::Always => true,
            Matcher::HasAnyField(fields) => fields.iter().any(|f| record.contains_key(*f)),
        }
    }
}

/// One kind of child a role can own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildRule {
    pub role: Role,
    /// Field on the parent that collects these children
    pub collection: &'static str,
    /// GraphQL type name, matched against an explicit `__typename`
    pub typename: &'static str,
    pub matcher: Matcher,
}

const fn rule(
    role: Role,
    collection: &'static str,
    typename: &'static str,
    matcher: Matcher,
) -> ChildRule {
    ChildRule {
        role,
        collection,
        typename,
        matcher,
    }
}

const ORDER_RULES: &[ChildRule] = &[
    rule(
        Role::LineItem,
        "lineItems",
        "LineItem",
        Matcher::HasAnyField(&["variant", "product"]),
    ),
    rule(
        Role::Refund,
        "refunds",
        "Refund",
        Matcher::HasAnyField(&["refundLineItems", "transactions"]),
    ),
];

// A refund line item references the refunded line item; a transaction
// always carries its amount.
const REFUND_RULES: &[ChildRule] = &[
    rule(
        Role::RefundLineItem,
        "refundLineItems",
        "RefundLineItem",
        Matcher::HasAnyField(&["lineItem"]),
    ),
    rule(
        Role::Transaction,
        "transactions",
        "OrderTransaction",
        Matcher::HasAnyField(&["amountSet"]),
    ),
];

const PRODUCT_RULES: &[ChildRule] = &[rule(
    Role::Variant,
    "variants",
    "ProductVariant",
    Matcher::Always,
)];

const VARIANT_RULES: &[ChildRule] = &[rule(
    Role::InventoryLevel,
    "inventoryLevels",
    "InventoryLevel",
    Matcher::Always,
)];

const CUSTOMER_RULES: &[ChildRule] = &[
    rule(
        Role::Metafield,
        "metafields",
        "Metafield",
        Matcher::HasAnyField(&["namespace", "key"]),
    ),
    rule(
        Role::Address,
        "addresses",
        "MailingAddress",
        Matcher::HasAnyField(&["address1", "city", "zip", "country"]),
    ),
];

const COLLECTION_RULES: &[ChildRule] = &[rule(
    Role::CollectionProduct,
    "products",
    "Product",
    Matcher::Always,
)];

const METAFIELD_OWNER_RULES: &[ChildRule] = &[rule(
    Role::Metafield,
    "metafields",
    "Metafield",
    Matcher::Always,
)];

const INVENTORY_ITEM_RULES: &[ChildRule] = &[rule(
    Role::InventoryLevel,
    "inventoryLevels",
    "InventoryLevel",
    Matcher::Always,
)];

impl Role {
    /// Role of the top-level records of an entity
    pub fn root_of(kind: EntityKind) -> Role {
        match kind {
            EntityKind::Orders => Role::Order,
            EntityKind::Products => Role::Product,
            EntityKind::Customers => Role::Customer,
            EntityKind::Collections => Role::Collection,
            EntityKind::ProductMetafields => Role::MetafieldOwner,
            EntityKind::InventoryItems => Role::InventoryItem,
        }
    }

    /// Children this role can own, in matching order
    pub fn child_rules(self) -> &'static [ChildRule] {
        match self {
            Role::Order => ORDER_RULES,
            Role::Refund => REFUND_RULES,
            Role::Product => PRODUCT_RULES,
            Role::Variant => VARIANT_RULES,
            Role::Customer => CUSTOMER_RULES,
            Role::Collection => COLLECTION_RULES,
            Role::MetafieldOwner => METAFIELD_OWNER_RULES,
            Role::InventoryItem => INVENTORY_ITEM_RULES,
            Role::LineItem
            | Role::RefundLineItem
            | Role::Transaction
            | Role::InventoryLevel
            | Role::Address
            | Role::Metafield
            | Role::CollectionProduct => &[],
        }
    }

    /// Pick the rule for a child record of this role
    ///
    /// An explicit `__typename` is authoritative; field sniffing is only
    /// used when the record has none.
    pub fn classify(self, record: &Map<String, Value>) -> Option<&'static ChildRule> {
        let rules = self.child_rules();
        match record.get("__typename").and_then(Value::as_str) {
            Some(typename) => rules.iter().find(|r| r.typename == typename),
            None => rules.iter().find(|r| r.matcher.matches(record)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test fixture must be an object"),
        }
    }

    #[test_case(Role::Order, json!({"variant": {"id": "v"}}), Some("lineItems"))]
    #[test_case(Role::Order, json!({"refundLineItems": []}), Some("refunds"))]
    #[test_case(Role::Order, json!({"note": "n"}), None)]
    #[test_case(Role::Refund, json!({"lineItem": {"id": "l"}}), Some("refundLineItems"))]
    #[test_case(Role::Refund, json!({"amountSet": {}}), Some("transactions"))]
    #[test_case(Role::Refund, json!({"kind": "REFUND"}), None)]
    #[test_case(Role::Product, json!({"sku": "A"}), Some("variants"))]
    #[test_case(Role::Variant, json!({"location": {}}), Some("inventoryLevels"))]
    #[test_case(Role::Customer, json!({"namespace": "custom", "key": "k"}), Some("metafields"))]
    #[test_case(Role::Customer, json!({"address1": "1 Main St"}), Some("addresses"))]
    #[test_case(Role::LineItem, json!({"id": "x"}), None)]
    fn test_sniffing(role: Role, record: Value, expected: Option<&str>) {
        let rule = role.classify(&object(record));
        assert_eq!(rule.map(|r| r.collection), expected);
    }

    #[test]
    fn test_typename_overrides_sniffing() {
        // Fields look like a refund line item, the tag says transaction
        let record = object(json!({
            "__typename": "OrderTransaction",
            "lineItem": {"id": "l"},
            "amountSet": {}
        }));
        let rule = Role::Refund.classify(&record).unwrap();
        assert_eq!(rule.role, Role::Transaction);
    }

    #[test]
    fn test_unknown_typename_is_unclassified() {
        let record = object(json!({"__typename": "Fulfillment", "lineItem": {}}));
        assert!(Role::Refund.classify(&record).is_none());
    }

    #[test]
    fn test_every_entity_has_root_rules() {
        for kind in EntityKind::ALL {
            let root = Role::root_of(kind);
            assert!(!root.child_rules().is_empty(), "{kind} root has no children");
        }
    }
}
