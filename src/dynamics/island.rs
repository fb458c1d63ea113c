use std::collections::{HashMap, HashSet};

use crate::{dynamics::solver::Contact, utils::allocator::EntityId};

/// Contacts whose bodies are connected through shared dynamic bodies; each
/// batch can be resolved independently of the others.
#[derive(Debug, Clone, Default)]
pub struct ContactBatch {
    pub bodies: Vec<EntityId>,
    pub contacts: Vec<Contact>,
}

impl ContactBatch {
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

/// Groups a step's contacts into connected batches.
///
/// World anchors never link batches: a contact against static geometry only
/// joins the batch of its dynamic body.
#[derive(Debug, Default)]
pub struct ContactBatcher {
    adjacency: HashMap<EntityId, Vec<EntityId>>,
}

impl ContactBatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits `contacts` into batches, keeping the input order inside each
    /// batch and ordering batches by their first contact.
    pub fn batch(&mut self, contacts: Vec<Contact>) -> Vec<ContactBatch> {
        self.adjacency.clear();
        for contact in &contacts {
            let neighbors = self.adjacency.entry(contact.body_a).or_default();
            if let Some(other) = contact.body_b {
                neighbors.push(other);
                self.adjacency.entry(other).or_default().push(contact.body_a);
            }
        }

        let mut batch_of: HashMap<EntityId, usize> = HashMap::new();
        let mut visited = HashSet::new();
        let mut batches: Vec<ContactBatch> = Vec::new();
        for contact in &contacts {
            if visited.contains(&contact.body_a) {
                continue;
            }
            let bodies = self.depth_first_collect(contact.body_a, &mut visited);
            for body in &bodies {
                batch_of.insert(*body, batches.len());
            }
            batches.push(ContactBatch {
                bodies,
                contacts: Vec::new(),
            });
        }

        for contact in contacts {
            if let Some(&index) = batch_of.get(&contact.body_a) {
                batches[index].contacts.push(contact);
            }
        }
        batches
    }

    fn depth_first_collect(&self, start: EntityId, visited: &mut HashSet<EntityId>) -> Vec<EntityId> {
        let mut stack = vec![start];
        let mut result = Vec::new();

        while let Some(node) = stack.pop() {
            if visited.insert(node) {
                result.push(node);
                if let Some(neighbors) = self.adjacency.get(&node) {
                    stack.extend(neighbors.iter().copied());
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn id(index: u32) -> EntityId {
        EntityId::from_index(index)
    }

    fn contact(a: u32, b: Option<u32>) -> Contact {
        Contact::new(id(a), b.map(id), Vec3::ZERO, Vec3::Y, 0.1, Default::default())
    }

    #[test]
    fn chains_of_shared_bodies_form_one_batch() {
        let mut batcher = ContactBatcher::new();
        let batches = batcher.batch(vec![
            contact(0, Some(1)),
            contact(5, Some(6)),
            contact(1, Some(2)),
            contact(2, None),
        ]);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 3);
        assert_eq!(batches[1].len(), 1);

        assert!(batches[1].contacts.iter().all(|c| c.involves(id(5))));

        let mut first = batches[0].bodies.clone();
        first.sort();
        assert_eq!(first, vec![id(0), id(1), id(2)]);
    }

    #[test]
    fn anchors_do_not_join_batches() {
        let mut batcher = ContactBatcher::new();
        let batches = batcher.batch(vec![contact(0, None), contact(1, None)]);
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|batch| batch.bodies.len() == 1));
    }

    #[test]
    fn empty_input_yields_no_batches() {
        assert!(ContactBatcher::new().batch(Vec::new()).is_empty());
    }
}
