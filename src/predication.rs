//! Predication: a belief state over the entities of one world.
//!
//! A [`Predication`] partitions a fixed, ordered entity sequence into three
//! disjoint sets:
//!
//! - **agreeing** — provably satisfies every predicate applied so far
//! - **ambiguous** — undetermined under the continuous-attribute tolerances
//! - **disagreeing** — provably fails at least one applied predicate
//!
//! [`Predication::apply`] is the only mutator and only ever moves entities
//! towards certainty of failure: agreeing → ambiguous, agreeing →
//! disagreeing, ambiguous → disagreeing. Nothing is ever promoted back.
//!
//! While a caption evaluates nested clauses it appends child predications
//! with [`Predication::sub_predication`]. Children are read back strictly by
//! the position they were appended at; asking for a position that was never
//! appended is a contract breach and panics.

use std::sync::Arc;

use crate::policy::Tolerances;
use crate::world::{Entity, EntityId, World};

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Auxiliary predications a predicate is evaluated against.
///
/// Relations compare against a reference (and, for ternary relations, a
/// comparison); selectors pick from a scope. Plain attributes need none.
#[derive(Debug, Clone, Copy, Default)]
pub struct Refs<'a> {
    pub scope: Option<&'a Predication>,
    pub reference: Option<&'a Predication>,
    pub comparison: Option<&'a Predication>,
}

impl<'a> Refs<'a> {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn reference(reference: &'a Predication) -> Self {
        Self {
            reference: Some(reference),
            ..Self::default()
        }
    }

    /// The scope predication.
    ///
    /// # Panics
    ///
    /// Panics if the caller did not supply one.
    #[track_caller]
    pub fn expect_scope(&self) -> &'a Predication {
        match self.scope {
            Some(scope) => scope,
            None => panic!("predicate requires a scope predication"),
        }
    }

    /// The reference predication.
    ///
    /// # Panics
    ///
    /// Panics if the caller did not supply one.
    #[track_caller]
    pub fn expect_reference(&self) -> &'a Predication {
        match self.reference {
            Some(reference) => reference,
            None => panic!("predicate requires a reference predication"),
        }
    }

    /// The comparison predication.
    ///
    /// # Panics
    ///
    /// Panics if the caller did not supply one.
    #[track_caller]
    pub fn expect_comparison(&self) -> &'a Predication {
        match self.comparison {
            Some(comparison) => comparison,
            None => panic!("predicate requires a comparison predication"),
        }
    }
}

/// An entity-level test with separate certainty conditions.
///
/// `pred_agreement` holds when the entity provably satisfies the predicate,
/// `pred_disagreement` when it provably fails. Both false means
/// undetermined; both true is a logic error in the predicate.
///
/// `predication` is the state being narrowed, as it was before the current
/// application started. Extremal tests compare against its other members.
pub trait Predicate {
    fn pred_agreement(&self, entity: &Entity, predication: &Predication, refs: &Refs<'_>) -> bool;

    fn pred_disagreement(&self, entity: &Entity, predication: &Predication, refs: &Refs<'_>) -> bool;
}

/// Which partition an entity currently belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Membership {
    Agreeing,
    Ambiguous,
    Disagreeing,
}

// ---------------------------------------------------------------------------
// Predication
// ---------------------------------------------------------------------------

/// Belief-state partition of a world's entities.
///
/// `Clone` copies the whole tree including sub-predications; [`copy`] and
/// [`reset`] produce childless states for independent evaluation.
///
/// [`copy`]: Predication::copy
/// [`reset`]: Predication::reset
#[derive(Debug, Clone)]
pub struct Predication {
    entities: Arc<[Entity]>,
    tolerances: Tolerances,
    agreeing: Vec<EntityId>,
    ambiguous: Vec<EntityId>,
    disagreeing: Vec<EntityId>,
    sub_predications: Vec<Predication>,
}

impl Predication {
    /// All entities of `world` agreeing, default tolerances.
    pub fn new(world: &World) -> Self {
        Self::with_tolerances(world, Tolerances::default())
    }

    /// All entities of `world` agreeing.
    pub fn with_tolerances(world: &World, tolerances: Tolerances) -> Self {
        let entities = Arc::clone(world.shared_entities());
        let agreeing = entities.iter().map(|e| e.id).collect();
        Self {
            entities,
            tolerances,
            agreeing,
            ambiguous: Vec::new(),
            disagreeing: Vec::new(),
            sub_predications: Vec::new(),
        }
    }

    /// Same partition, no sub-predications.
    pub fn copy(&self) -> Self {
        Self {
            entities: Arc::clone(&self.entities),
            tolerances: self.tolerances,
            agreeing: self.agreeing.clone(),
            ambiguous: self.ambiguous.clone(),
            disagreeing: self.disagreeing.clone(),
            sub_predications: Vec::new(),
        }
    }

    /// Fresh full-entity view over the same world: everything agreeing.
    pub fn reset(&self) -> Self {
        Self {
            entities: Arc::clone(&self.entities),
            tolerances: self.tolerances,
            agreeing: self.entities.iter().map(|e| e.id).collect(),
            ambiguous: Vec::new(),
            disagreeing: Vec::new(),
            sub_predications: Vec::new(),
        }
    }

    // ── Sub-predications ────────────────────────────────────────────────

    /// Append a child: a fresh full-entity view if `reset`, else a copy of
    /// this state. Returns the appended child.
    pub fn sub_predication(&mut self, reset: bool) -> &mut Predication {
        let child = if reset { self.reset() } else { self.copy() };
        self.attach(child)
    }

    /// Append an existing predication as the next child.
    ///
    /// # Panics
    ///
    /// Panics if `child` is built over a different entity sequence.
    #[track_caller]
    pub fn attach(&mut self, child: Predication) -> &mut Predication {
        self.assert_same_entities(&child);
        let index = self.sub_predications.len();
        self.sub_predications.push(child);
        &mut self.sub_predications[index]
    }

    /// The child appended at `index`.
    ///
    /// # Panics
    ///
    /// Panics if no child was appended at that position.
    #[track_caller]
    pub fn get_sub_predication(&self, index: usize) -> &Predication {
        match self.sub_predications.get(index) {
            Some(child) => child,
            None => panic!(
                "sub-predication {index} requested but only {} appended",
                self.sub_predications.len()
            ),
        }
    }

    pub fn sub_predications(&self) -> &[Predication] {
        &self.sub_predications
    }

    pub fn num_sub_predications(&self) -> usize {
        self.sub_predications.len()
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.index()]
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    pub fn num_entities(&self) -> usize {
        self.entities.len()
    }

    pub fn num_agreeing(&self) -> usize {
        self.agreeing.len()
    }

    pub fn num_ambiguous(&self) -> usize {
        self.ambiguous.len()
    }

    pub fn num_disagreeing(&self) -> usize {
        self.disagreeing.len()
    }

    pub fn num_not_disagreeing(&self) -> usize {
        self.agreeing.len() + self.ambiguous.len()
    }

    /// Ids of agreeing entities, ordered by id.
    pub fn agreeing_ids(&self) -> &[EntityId] {
        &self.agreeing
    }

    pub fn ambiguous_ids(&self) -> &[EntityId] {
        &self.ambiguous
    }

    pub fn disagreeing_ids(&self) -> &[EntityId] {
        &self.disagreeing
    }

    pub fn agreeing(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.agreeing.iter().map(|id| self.entity(*id))
    }

    pub fn ambiguous(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.ambiguous.iter().map(|id| self.entity(*id))
    }

    pub fn disagreeing(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.disagreeing.iter().map(|id| self.entity(*id))
    }

    /// Agreeing followed by ambiguous entities.
    pub fn not_disagreeing(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.agreeing().chain(self.ambiguous())
    }

    pub fn membership(&self, id: EntityId) -> Membership {
        if self.agreeing.binary_search(&id).is_ok() {
            Membership::Agreeing
        } else if self.ambiguous.binary_search(&id).is_ok() {
            Membership::Ambiguous
        } else {
            Membership::Disagreeing
        }
    }

    pub fn is_agreeing(&self, id: EntityId) -> bool {
        self.agreeing.binary_search(&id).is_ok()
    }

    pub fn is_disagreeing(&self, id: EntityId) -> bool {
        self.disagreeing.binary_search(&id).is_ok()
    }

    pub fn is_not_disagreeing(&self, id: EntityId) -> bool {
        !self.is_disagreeing(id)
    }

    /// Whether nothing has been narrowed yet.
    pub fn is_unconstrained(&self) -> bool {
        self.agreeing.len() == self.entities.len()
    }

    // ── Narrowing ───────────────────────────────────────────────────────

    /// Narrow this predication by `predicate`.
    ///
    /// Agreeing entities that provably fail move to disagreeing, those that
    /// are no longer provably satisfied move to ambiguous. Ambiguous entities
    /// that provably fail move to disagreeing.
    pub fn apply<P: Predicate + ?Sized>(&mut self, predicate: &P, refs: &Refs<'_>) {
        let mut agreeing = Vec::with_capacity(self.agreeing.len());
        let mut ambiguous = Vec::with_capacity(self.ambiguous.len());
        let mut disagreeing = self.disagreeing.clone();

        for &id in &self.agreeing {
            let entity = self.entity(id);
            let disagrees = predicate.pred_disagreement(entity, self, refs);
            let agrees = predicate.pred_agreement(entity, self, refs);
            debug_assert!(
                !(agrees && disagrees),
                "predicate both agrees and disagrees with {id}"
            );
            if disagrees {
                disagreeing.push(id);
            } else if agrees {
                agreeing.push(id);
            } else {
                ambiguous.push(id);
            }
        }
        for &id in &self.ambiguous {
            if predicate.pred_disagreement(self.entity(id), self, refs) {
                disagreeing.push(id);
            } else {
                ambiguous.push(id);
            }
        }

        // Entities moved from agreeing interleave with ids already ambiguous.
        ambiguous.sort_unstable();
        disagreeing.sort_unstable();
        self.agreeing = agreeing;
        self.ambiguous = ambiguous;
        self.disagreeing = disagreeing;
        self.debug_check_invariants();
    }

    /// Whether applying `predicate` is already entailed: every agreeing
    /// entity satisfies it and no ambiguous entity provably fails it.
    pub fn implies<P: Predicate + ?Sized>(&self, predicate: &P, refs: &Refs<'_>) -> bool {
        self.agreeing()
            .all(|e| predicate.pred_agreement(e, self, refs))
            && self
                .ambiguous()
                .all(|e| !predicate.pred_disagreement(e, self, refs))
    }

    /// Whether `predicate` entails this state: everything the predicate
    /// provably holds for is agreeing here, and everything disagreeing here
    /// provably fails the predicate.
    pub fn implied_by<P: Predicate + ?Sized>(&self, predicate: &P, refs: &Refs<'_>) -> bool {
        self.entities.iter().all(|e| match self.membership(e.id) {
            Membership::Agreeing => true,
            Membership::Ambiguous => !predicate.pred_agreement(e, self, refs),
            Membership::Disagreeing => predicate.pred_disagreement(e, self, refs),
        })
    }

    /// Applying `predicate` would add no information: the agreeing set is
    /// non-empty and every not-disagreeing entity provably satisfies it.
    pub fn tautological<P: Predicate + ?Sized>(&self, predicate: &P, refs: &Refs<'_>) -> bool {
        !self.agreeing.is_empty()
            && self
                .not_disagreeing()
                .all(|e| predicate.pred_agreement(e, self, refs))
    }

    /// Applying `predicate` would empty the agreeing set: it is non-empty
    /// now and every not-disagreeing entity provably fails.
    pub fn contradictory<P: Predicate + ?Sized>(&self, predicate: &P, refs: &Refs<'_>) -> bool {
        !self.agreeing.is_empty()
            && self
                .not_disagreeing()
                .all(|e| predicate.pred_disagreement(e, self, refs))
    }

    // ── Set algebra ─────────────────────────────────────────────────────

    /// Entity-wise union: agreeing in either, disagreeing in both.
    #[track_caller]
    pub fn union(&self, other: &Predication) -> Predication {
        self.combine(other, |a, b| match (a, b) {
            (Membership::Agreeing, _) | (_, Membership::Agreeing) => Membership::Agreeing,
            (Membership::Disagreeing, Membership::Disagreeing) => Membership::Disagreeing,
            _ => Membership::Ambiguous,
        })
    }

    /// Entity-wise intersection: agreeing in both, disagreeing in either.
    #[track_caller]
    pub fn intersect(&self, other: &Predication) -> Predication {
        self.combine(other, |a, b| match (a, b) {
            (Membership::Disagreeing, _) | (_, Membership::Disagreeing) => Membership::Disagreeing,
            (Membership::Agreeing, Membership::Agreeing) => Membership::Agreeing,
            _ => Membership::Ambiguous,
        })
    }

    /// Same three sets.
    #[track_caller]
    pub fn equals(&self, other: &Predication) -> bool {
        self.assert_same_entities(other);
        self.agreeing == other.agreeing
            && self.ambiguous == other.ambiguous
            && self.disagreeing == other.disagreeing
    }

    /// `self <= other`: agreeing and not-disagreeing sets both contained.
    #[track_caller]
    pub fn is_subset(&self, other: &Predication) -> bool {
        self.assert_same_entities(other);
        self.agreeing.iter().all(|id| other.is_agreeing(*id))
            && self
                .agreeing
                .iter()
                .chain(&self.ambiguous)
                .all(|id| other.is_not_disagreeing(*id))
    }

    /// `self >= other`.
    #[track_caller]
    pub fn is_superset(&self, other: &Predication) -> bool {
        other.is_subset(self)
    }

    /// Narrow attention to the agreeing entities of `witnesses` without
    /// ruling out the rest: they stay agreeing, every other entity still
    /// possible here becomes ambiguous, disagreeing entities stay so.
    #[track_caller]
    pub fn focus(&self, witnesses: &Predication) -> Predication {
        self.combine(witnesses, |own, witness| match (own, witness) {
            (Membership::Disagreeing, _) => Membership::Disagreeing,
            (_, Membership::Agreeing) => Membership::Agreeing,
            _ => Membership::Ambiguous,
        })
    }

    /// No entity can belong to both: the not-disagreeing sets do not meet.
    #[track_caller]
    pub fn disjoint(&self, other: &Predication) -> bool {
        self.assert_same_entities(other);
        self.agreeing
            .iter()
            .chain(&self.ambiguous)
            .all(|id| other.is_disagreeing(*id))
    }

    fn combine(
        &self,
        other: &Predication,
        merge: impl Fn(Membership, Membership) -> Membership,
    ) -> Predication {
        self.assert_same_entities(other);
        let mut result = self.reset();
        result.agreeing.clear();
        for entity in self.entities.iter() {
            let id = entity.id;
            match merge(self.membership(id), other.membership(id)) {
                Membership::Agreeing => result.agreeing.push(id),
                Membership::Ambiguous => result.ambiguous.push(id),
                Membership::Disagreeing => result.disagreeing.push(id),
            }
        }
        result
    }

    // ── Invariants ──────────────────────────────────────────────────────

    /// Panics unless both predications share the same entity sequence.
    #[track_caller]
    pub fn assert_same_entities(&self, other: &Predication) {
        assert!(
            Arc::ptr_eq(&self.entities, &other.entities),
            "predications built over different entity sequences"
        );
    }

    /// Check the partition invariants of this predication and all children.
    ///
    /// # Panics
    ///
    /// Panics on the first violated invariant.
    #[track_caller]
    pub fn check_invariants(&self) {
        let total = self.agreeing.len() + self.ambiguous.len() + self.disagreeing.len();
        assert_eq!(total, self.entities.len(), "partition does not cover all entities");
        for set in [&self.agreeing, &self.ambiguous, &self.disagreeing] {
            assert!(
                set.windows(2).all(|w| w[0] < w[1]),
                "partition set not strictly ordered by id"
            );
        }
        for id in &self.agreeing {
            assert!(
                self.ambiguous.binary_search(id).is_err() && self.disagreeing.binary_search(id).is_err(),
                "{id} in more than one partition set"
            );
        }
        for id in &self.ambiguous {
            assert!(self.disagreeing.binary_search(id).is_err(), "{id} both ambiguous and disagreeing");
        }
        for child in &self.sub_predications {
            self.assert_same_entities(child);
            child.check_invariants();
        }
    }

    fn debug_check_invariants(&self) {
        if cfg!(debug_assertions) {
            let total = self.agreeing.len() + self.ambiguous.len() + self.disagreeing.len();
            debug_assert_eq!(total, self.entities.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tests::world;
    use crate::world::{ColorName, ShapeKind};

    /// Agrees with listed ids, disagrees with listed ids, otherwise unknown.
    struct Fixed {
        agree: Vec<u32>,
        disagree: Vec<u32>,
    }

    impl Predicate for Fixed {
        fn pred_agreement(&self, entity: &Entity, _: &Predication, _: &Refs<'_>) -> bool {
            self.agree.contains(&entity.id.0)
        }

        fn pred_disagreement(&self, entity: &Entity, _: &Predication, _: &Refs<'_>) -> bool {
            self.disagree.contains(&entity.id.0)
        }
    }

    fn fixed(agree: &[u32], disagree: &[u32]) -> Fixed {
        Fixed {
            agree: agree.to_vec(),
            disagree: disagree.to_vec(),
        }
    }

    fn four() -> World {
        world(&[
            (ShapeKind::Square, ColorName::Red, 0.1, 0.1),
            (ShapeKind::Circle, ColorName::Blue, 0.3, 0.3),
            (ShapeKind::Square, ColorName::Blue, 0.5, 0.5),
            (ShapeKind::Triangle, ColorName::Green, 0.7, 0.7),
        ])
    }

    fn ids(list: &[EntityId]) -> Vec<u32> {
        list.iter().map(|id| id.0).collect()
    }

    #[test]
    fn new_predication_agrees_with_everything() {
        let p = Predication::new(&four());
        assert_eq!(p.num_agreeing(), 4);
        assert_eq!(p.num_ambiguous(), 0);
        assert_eq!(p.num_disagreeing(), 0);
        assert!(p.is_unconstrained());
        p.check_invariants();
    }

    #[test]
    fn apply_partitions_entities() {
        let mut p = Predication::new(&four());
        p.apply(&fixed(&[0, 2], &[3]), &Refs::none());
        assert_eq!(ids(p.agreeing_ids()), vec![0, 2]);
        assert_eq!(ids(p.ambiguous_ids()), vec![1]);
        assert_eq!(ids(p.disagreeing_ids()), vec![3]);
        p.check_invariants();
    }

    #[test]
    fn apply_is_monotone() {
        let mut p = Predication::new(&four());
        p.apply(&fixed(&[0, 2], &[3]), &Refs::none());
        // A predicate agreeing with everything cannot promote entity 1 or 3.
        p.apply(&fixed(&[0, 1, 2, 3], &[]), &Refs::none());
        assert_eq!(ids(p.agreeing_ids()), vec![0, 2]);
        assert_eq!(ids(p.ambiguous_ids()), vec![1]);
        assert_eq!(ids(p.disagreeing_ids()), vec![3]);

        p.apply(&fixed(&[2], &[1]), &Refs::none());
        assert_eq!(ids(p.agreeing_ids()), vec![2]);
        assert_eq!(ids(p.ambiguous_ids()), vec![0]);
        assert_eq!(ids(p.disagreeing_ids()), vec![1, 3]);
        p.check_invariants();
    }

    #[test]
    fn implies_requires_agreeing_and_no_ambiguous_failure() {
        let mut p = Predication::new(&four());
        p.apply(&fixed(&[0, 2], &[3]), &Refs::none());
        assert!(p.implies(&fixed(&[0, 2], &[]), &Refs::none()));
        assert!(!p.implies(&fixed(&[0], &[]), &Refs::none()));
        assert!(!p.implies(&fixed(&[0, 2], &[1]), &Refs::none()));
    }

    #[test]
    fn implied_by_detects_restatement() {
        let mut p = Predication::new(&four());
        let predicate = fixed(&[0, 2], &[1, 3]);
        p.apply(&predicate, &Refs::none());
        assert!(p.implied_by(&predicate, &Refs::none()));
        assert!(!p.implied_by(&fixed(&[0, 1, 2], &[3]), &Refs::none()));
    }

    #[test]
    fn tautology_and_contradiction() {
        let p = Predication::new(&four());
        assert!(p.tautological(&fixed(&[0, 1, 2, 3], &[]), &Refs::none()));
        assert!(!p.tautological(&fixed(&[0, 1, 2], &[]), &Refs::none()));
        assert!(p.contradictory(&fixed(&[], &[0, 1, 2, 3]), &Refs::none()));
        assert!(!p.contradictory(&fixed(&[], &[0, 1]), &Refs::none()));

        let mut empty = p.copy();
        empty.apply(&fixed(&[], &[0, 1, 2, 3]), &Refs::none());
        assert!(!empty.tautological(&fixed(&[0, 1, 2, 3], &[]), &Refs::none()));
        assert!(!empty.contradictory(&fixed(&[], &[0, 1, 2, 3]), &Refs::none()));
    }

    #[test]
    fn sub_predications_are_positional() {
        let mut p = Predication::new(&four());
        p.apply(&fixed(&[0, 1], &[2, 3]), &Refs::none());
        p.sub_predication(false).apply(&fixed(&[0], &[1]), &Refs::none());
        p.sub_predication(true);
        assert_eq!(p.num_sub_predications(), 2);
        assert_eq!(ids(p.get_sub_predication(0).agreeing_ids()), vec![0]);
        assert_eq!(p.get_sub_predication(1).num_agreeing(), 4);
        // The parent is untouched by its children.
        assert_eq!(ids(p.agreeing_ids()), vec![0, 1]);
        p.check_invariants();
    }

    #[test]
    #[should_panic(expected = "sub-predication 1 requested")]
    fn reading_unappended_sub_predication_panics() {
        let mut p = Predication::new(&four());
        p.sub_predication(false);
        p.get_sub_predication(1);
    }

    #[test]
    #[should_panic(expected = "different entity sequences")]
    fn set_algebra_rejects_foreign_predications() {
        let a = Predication::new(&four());
        let b = Predication::new(&four());
        a.union(&b);
    }

    #[test]
    fn union_and_intersection() {
        let base = Predication::new(&four());
        let mut a = base.copy();
        a.apply(&fixed(&[0], &[2, 3]), &Refs::none());
        let mut b = base.copy();
        b.apply(&fixed(&[2], &[0, 3]), &Refs::none());

        let union = a.union(&b);
        assert_eq!(ids(union.agreeing_ids()), vec![0, 2]);
        assert_eq!(ids(union.ambiguous_ids()), vec![1]);
        assert_eq!(ids(union.disagreeing_ids()), vec![3]);

        let intersection = a.intersect(&b);
        assert_eq!(intersection.num_agreeing(), 0);
        assert_eq!(ids(intersection.ambiguous_ids()), vec![1]);
        assert_eq!(ids(intersection.disagreeing_ids()), vec![0, 2, 3]);
        union.check_invariants();
        intersection.check_invariants();
    }

    #[test]
    fn subset_and_disjoint() {
        let base = Predication::new(&four());
        let mut narrow = base.copy();
        narrow.apply(&fixed(&[0], &[1, 2, 3]), &Refs::none());
        let mut other = base.copy();
        other.apply(&fixed(&[3], &[0, 1, 2]), &Refs::none());

        assert!(narrow.is_subset(&base));
        assert!(base.is_superset(&narrow));
        assert!(!base.is_subset(&narrow));
        assert!(narrow.disjoint(&other));
        assert!(!narrow.disjoint(&base));
        assert!(narrow.equals(&narrow.copy()));
        assert!(!narrow.equals(&base));
    }

    #[test]
    fn focus_keeps_other_candidates_open() {
        let mut outer = Predication::new(&four());
        outer.apply(&fixed(&[0, 1, 2], &[3]), &Refs::none());
        let mut witnesses = outer.copy();
        witnesses.apply(&fixed(&[2], &[0, 1]), &Refs::none());

        let focused = outer.focus(&witnesses);
        assert_eq!(ids(focused.agreeing_ids()), vec![2]);
        assert_eq!(ids(focused.ambiguous_ids()), vec![0, 1]);
        assert_eq!(ids(focused.disagreeing_ids()), vec![3]);
        // The single witness no longer makes its own description tautological.
        assert!(witnesses.tautological(&fixed(&[2], &[]), &Refs::none()));
        assert!(!focused.tautological(&fixed(&[2], &[]), &Refs::none()));
        focused.check_invariants();
    }
}
