//! Postgres-backed entity sets.
//!
//! Every set holds a clone of the context's `PgPool`. Writes that touch more than
//! one table (customer + addresses, order + join rows) run in a single transaction.
//! Reads fill navigation ids with one extra query per relationship. Customer and
//! product order ids apply the same [`DeletedFilter`](crate::set::DeletedFilter)
//! to the related orders; an order always lists all of its products.

mod addresses;
mod customers;
mod orders;
mod products;

pub use addresses::PgAddressSet;
pub use customers::PgCustomerSet;
pub use orders::PgOrderSet;
pub use products::PgProductSet;

use std::collections::HashMap;
use std::hash::Hash;

/// Group `(key, value)` pairs, keeping the input order within each group.
pub(crate) fn group_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> HashMap<K, Vec<V>>
where
    K: Eq + Hash,
{
    let mut grouped: HashMap<K, Vec<V>> = HashMap::new();
    for (key, value) in pairs {
        grouped.entry(key).or_default().push(value);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_pairs_preserves_order_per_key() {
        let grouped = group_pairs([(1, 'a'), (2, 'x'), (1, 'b'), (1, 'c')]);
        assert_eq!(grouped[&1], vec!['a', 'b', 'c']);
        assert_eq!(grouped[&2], vec!['x']);
    }
}
