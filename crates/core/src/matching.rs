//! Round participant selection and pair formation.
//!
//! Both procedures are pure decision logic over data the caller has already
//! loaded: they never touch persistence, and randomness comes in through a
//! caller-supplied [`rand::Rng`] so tests can seed it.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::domain::person::{Person, PersonId};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error(
        "pool \"{pool}\" has an odd number of available people and none of them \
         can be excluded; mark at least one available member as excludable"
    )]
    NoExcludableParticipant { pool: String },
}

/// Narrow an ordered candidate list down to an even-sized participant set.
///
/// An even-sized input is returned unchanged. An odd-sized input loses one
/// uniformly random member among those with `can_be_excluded`; if nobody is
/// excludable the round cannot be formed and the caller has to surface the
/// error to an operator.
pub fn select_participants<R: Rng>(
    pool_name: &str,
    candidates: &[Person],
    rng: &mut R,
) -> Result<Vec<Person>, SelectionError> {
    if candidates.len() % 2 == 0 {
        return Ok(candidates.to_vec());
    }

    let excludable: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, person)| person.can_be_excluded)
        .map(|(index, _)| index)
        .collect();

    if excludable.is_empty() {
        return Err(SelectionError::NoExcludableParticipant { pool: pool_name.to_owned() });
    }

    let skipped = excludable[rng.gen_range(0..excludable.len())];
    Ok(candidates
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != skipped)
        .map(|(_, person)| person.clone())
        .collect())
}

/// Historical pairing counts, keyed by [`pair_key`].
pub type PairHistory = HashMap<(PersonId, PersonId), u32>;

/// Canonical unordered key for a pair of people.
pub fn pair_key(a: PersonId, b: PersonId) -> (PersonId, PersonId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Form pairs from an even-sized participant set, preferring people who have
/// met the fewest times before.
///
/// Participants are shuffled with `rng`, then ordered most-constrained
/// first (heaviest repeat history picks a partner before the fresh people,
/// ties broken by shuffle order) and greedily paired: each person takes the
/// remaining candidate with the lowest historical count. Callers pass the
/// output of [`select_participants`], which is always even; a stray odd
/// participant would be left unpaired and dropped.
pub fn pair_participants<R: Rng>(
    participants: &[Person],
    history: &PairHistory,
    rng: &mut R,
) -> Vec<(Person, Person)> {
    let burden: HashMap<PersonId, u32> = participants
        .iter()
        .map(|person| {
            let total = participants
                .iter()
                .filter(|other| other.id != person.id)
                .map(|other| history.get(&pair_key(person.id, other.id)).copied().unwrap_or(0))
                .sum();
            (person.id, total)
        })
        .collect();

    let mut remaining: Vec<Person> = participants.to_vec();
    remaining.shuffle(rng);
    remaining.sort_by(|a, b| burden[&b.id].cmp(&burden[&a.id]));

    let mut pairs = Vec::with_capacity(remaining.len() / 2);
    while remaining.len() >= 2 {
        let first = remaining.remove(0);
        let partner_index = remaining
            .iter()
            .enumerate()
            .min_by_key(|(index, person)| {
                let count = history.get(&pair_key(first.id, person.id)).copied().unwrap_or(0);
                (count, *index)
            })
            .map(|(index, _)| index)
            .unwrap_or(0);
        let partner = remaining.remove(partner_index);
        pairs.push((first, partner));
    }

    pairs
}
