//! GraphQL documents
//!
//! Bulk queries carry an `{INCREMENTAL_FILTER}` marker directly after the
//! root connection name. [`render_query`] replaces it with an `updated_at`
//! search argument, or removes it for a full extract.

use crate::domain::EntityKind;
use chrono::{DateTime, SecondsFormat, Utc};

/// Marker replaced by the incremental search argument
pub const INCREMENTAL_FILTER: &str = "{INCREMENTAL_FILTER}";

pub const RUN_BULK_QUERY_MUTATION: &str = r#"
mutation bulkOperationRunQuery($query: String!) {
  bulkOperationRunQuery(query: $query) {
    bulkOperation {
      id
      status
    }
    userErrors {
      field
      message
    }
  }
}
"#;

pub const CURRENT_BULK_OPERATION_QUERY: &str = r#"
{
  currentBulkOperation {
    id
    status
    errorCode
    createdAt
    completedAt
    objectCount
    fileSize
    url
    partialDataUrl
  }
}
"#;

pub const SHOP_INFO_QUERY: &str = r#"
{
  shop {
    id
    name
    email
    myshopifyDomain
    primaryDomain {
      url
      host
    }
    currencyCode
    currencyFormats {
      moneyFormat
      moneyWithCurrencyFormat
    }
    ianaTimezone
    plan {
      displayName
    }
  }
}
"#;

const ORDERS_QUERY: &str = r#"
{
  orders{INCREMENTAL_FILTER} {
    edges {
      node {
        id
        name
        email
        phone
        createdAt
        updatedAt
        processedAt
        cancelledAt
        cancelReason
        displayFinancialStatus
        displayFulfillmentStatus
        currencyCode
        tags
        note
        totalPriceSet {
          shopMoney {
            amount
            currencyCode
          }
        }
        customer {
          id
          email
        }
        shippingAddress {
          address1
          address2
          city
          province
          country
          zip
        }
        lineItems {
          edges {
            node {
              id
              name
              quantity
              sku
              variant {
                id
                title
                sku
              }
              originalUnitPriceSet {
                shopMoney {
                  amount
                  currencyCode
                }
              }
              discountedTotalSet {
                shopMoney {
                  amount
                  currencyCode
                }
              }
            }
          }
        }
        refunds {
          id
          createdAt
          note
          totalRefundedSet {
            shopMoney {
              amount
              currencyCode
            }
          }
        }
      }
    }
  }
}
"#;

const PRODUCTS_QUERY: &str = r#"
{
  products{INCREMENTAL_FILTER} {
    edges {
      node {
        id
        handle
        title
        vendor
        productType
        status
        createdAt
        updatedAt
        totalInventory
        variants {
          edges {
            node {
              id
              sku
              title
              price
              compareAtPrice
              inventoryQuantity
              inventoryItem {
                inventoryLevels {
                  edges {
                    node {
                      id
                      location {
                        id
                        name
                      }
                    }
                  }
                }
              }
            }
          }
        }
      }
    }
  }
}
"#;

const CUSTOMERS_QUERY: &str = r#"
{
  customers{INCREMENTAL_FILTER} {
    edges {
      node {
        id
        email
        firstName
        lastName
        phone
        state
        createdAt
        updatedAt
        numberOfOrders
        note
        verifiedEmail
        tags
        addressesV2 {
          edges {
            node {
              id
              address1
              address2
              city
              province
              country
              zip
            }
          }
        }
        metafields {
          edges {
            node {
              id
              namespace
              key
              value
              type
            }
          }
        }
      }
    }
  }
}
"#;

const COLLECTIONS_QUERY: &str = r#"
{
  collections{INCREMENTAL_FILTER} {
    edges {
      node {
        id
        title
        handle
        updatedAt
        products {
          edges {
            node {
              id
              title
              handle
            }
          }
        }
      }
    }
  }
}
"#;

const PRODUCT_METAFIELDS_QUERY: &str = r#"
{
  products{INCREMENTAL_FILTER} {
    edges {
      node {
        id
        title
        metafields {
          edges {
            node {
              id
              namespace
              key
              value
              type
            }
          }
        }
      }
    }
  }
}
"#;

const INVENTORY_ITEMS_QUERY: &str = r#"
{
  inventoryItems{INCREMENTAL_FILTER} {
    edges {
      node {
        id
        sku
        createdAt
        updatedAt
        tracked
        unitCost {
          amount
          currencyCode
        }
        inventoryLevels {
          edges {
            node {
              id
              location {
                id
                name
              }
            }
          }
        }
      }
    }
  }
}
"#;

/// Built-in bulk query for an entity
pub fn default_query(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Orders => ORDERS_QUERY,
        EntityKind::Products => PRODUCTS_QUERY,
        EntityKind::Customers => CUSTOMERS_QUERY,
        EntityKind::Collections => COLLECTIONS_QUERY,
        EntityKind::ProductMetafields => PRODUCT_METAFIELDS_QUERY,
        EntityKind::InventoryItems => INVENTORY_ITEMS_QUERY,
    }
}

/// A query with its incremental marker resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedQuery {
    pub text: String,
    /// Whether a lower bound was actually injected
    pub filtered: bool,
}

/// Search argument restricting a connection to records updated at or after `since`
pub fn incremental_argument(since: DateTime<Utc>) -> String {
    format!(
        "(query: \"updated_at:>='{}'\")",
        since.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

/// Resolve the incremental marker in `template`
///
/// Without a lower bound the marker is removed. A template without the marker
/// is returned unchanged and reported as unfiltered.
pub fn render_query(template: &str, since: Option<DateTime<Utc>>) -> RenderedQuery {
    let has_marker = template.contains(INCREMENTAL_FILTER);
    match since {
        Some(since) if has_marker => RenderedQuery {
            text: template.replace(INCREMENTAL_FILTER, &incremental_argument(since)),
            filtered: true,
        },
        _ => RenderedQuery {
            text: template.replace(INCREMENTAL_FILTER, ""),
            filtered: false,
        },
    }
}
