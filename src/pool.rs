use uuid::Uuid;

/// Generates `count` distinct opaque identifiers. Zero yields an empty list.
pub fn build_ids(count: usize) -> Vec<String> {
    (0..count).map(|_| Uuid::new_v4().to_string()).collect()
}

/// Workflow and customer identifiers whose cross product drives label
/// cardinality. Read-only once built.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentifierPool {
    workflow_ids: Vec<String>,
    customer_ids: Vec<String>,
}

impl IdentifierPool {
    pub fn build(workflows: usize, customers: usize) -> Self {
        Self {
            workflow_ids: build_ids(workflows),
            customer_ids: build_ids(customers),
        }
    }

    pub fn from_ids(workflow_ids: Vec<String>, customer_ids: Vec<String>) -> Self {
        Self {
            workflow_ids,
            customer_ids,
        }
    }

    pub fn workflow_ids(&self) -> &[String] {
        &self.workflow_ids
    }

    pub fn customer_ids(&self) -> &[String] {
        &self.customer_ids
    }

    /// Number of `(workflow, customer)` combinations.
    pub fn cardinality(&self) -> usize {
        self.workflow_ids.len() * self.customer_ids.len()
    }

    /// Iterates the full cross product, workflows outer and customers inner.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.workflow_ids.iter().flat_map(move |workflow| {
            self.customer_ids
                .iter()
                .map(move |customer| (workflow.as_str(), customer.as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builds_requested_sizes_with_distinct_ids() {
        for (workflows, customers) in [(0, 0), (1, 0), (3, 2), (100, 40)] {
            let pool = IdentifierPool::build(workflows, customers);
            assert_eq!(pool.workflow_ids().len(), workflows);
            assert_eq!(pool.customer_ids().len(), customers);

            let unique: HashSet<_> = pool.workflow_ids().iter().collect();
            assert_eq!(unique.len(), workflows);
            let unique: HashSet<_> = pool.customer_ids().iter().collect();
            assert_eq!(unique.len(), customers);
        }
    }

    #[test]
    fn ids_are_uuid_shaped() {
        for id in build_ids(5) {
            assert!(Uuid::parse_str(&id).is_ok(), "not a uuid: {id}");
        }
    }

    #[test]
    fn pairs_cover_cross_product_once() {
        let pool = IdentifierPool::build(4, 3);
        let pairs: Vec<_> = pool.pairs().collect();
        assert_eq!(pairs.len(), pool.cardinality());
        assert_eq!(pairs.len(), 12);

        let unique: HashSet<_> = pairs.iter().collect();
        assert_eq!(unique.len(), 12);

        assert_eq!(pairs[0].0, pool.workflow_ids()[0]);
        assert_eq!(pairs[1].0, pool.workflow_ids()[0]);
        assert_eq!(pairs[3].0, pool.workflow_ids()[1]);
    }

    #[test]
    fn empty_side_yields_no_pairs() {
        assert_eq!(IdentifierPool::build(5, 0).pairs().count(), 0);
        assert_eq!(IdentifierPool::build(0, 5).pairs().count(), 0);
    }
}
