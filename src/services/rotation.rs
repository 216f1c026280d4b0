use std::collections::HashSet;

use rand::{Rng, seq::IndexedRandom};

use crate::database::models::{GamedayNominee, Nomination, TeamMember};
use crate::error::AppError;

/// Picks the primary and secondary nominees for a new gameday.
///
/// Members holding either role on one of `active_nominees` are excluded. When
/// that leaves nobody, the whole team is eligible again. Primary and secondary
/// are drawn independently from the same pool, so a single candidate ends up
/// holding both roles.
///
/// An empty roster fails with `NoEligibleMembers`; callers that know the team
/// id replace the placeholder in the error.
pub fn select_nominees<R: Rng + ?Sized>(
    members: &[TeamMember],
    active_nominees: &[GamedayNominee],
    rng: &mut R,
) -> Result<Nomination, AppError> {
    let Some(first) = members.first() else {
        return Err(AppError::NoEligibleMembers("unknown".to_string()));
    };

    let pool = candidate_pool(members, active_nominees);
    let pool = if pool.is_empty() {
        log::debug!(
            "Every member of team {} is already on duty, falling back to the full roster",
            first.team_id
        );
        members.iter().collect()
    } else {
        pool
    };

    let primary = draw(&pool, rng, &first.team_id)?;
    let secondary = draw(&pool, rng, &first.team_id)?;

    Ok(Nomination {
        primary: primary.clone(),
        secondary: secondary.clone(),
    })
}

/// Members not currently on duty, in roster order.
pub fn candidate_pool<'a>(
    members: &'a [TeamMember],
    active_nominees: &[GamedayNominee],
) -> Vec<&'a TeamMember> {
    let excluded: HashSet<&str> = active_nominees
        .iter()
        .filter(|n| n.is_on_duty())
        .map(|n| n.member_id.as_str())
        .collect();

    members
        .iter()
        .filter(|m| !excluded.contains(m.id.as_str()))
        .collect()
}

fn draw<'a, R: Rng + ?Sized>(
    pool: &[&'a TeamMember],
    rng: &mut R,
    team_id: &str,
) -> Result<&'a TeamMember, AppError> {
    pool.choose(rng)
        .copied()
        .ok_or_else(|| AppError::NoEligibleMembers(team_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn member(id: &str) -> TeamMember {
        TeamMember {
            id: id.to_string(),
            team_id: "falcons".to_string(),
            user_id: format!("user-{}", id),
            label: id.to_uppercase(),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn nominee(member_id: &str, is_primary: bool, is_secondary: bool) -> GamedayNominee {
        GamedayNominee {
            id: format!("n-{}", member_id),
            gameday_id: "g1".to_string(),
            member_id: member_id.to_string(),
            user_id: format!("user-{}", member_id),
            label: member_id.to_uppercase(),
            is_primary,
            is_secondary,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn empty_team_has_no_eligible_members() {
        let mut rng = StdRng::seed_from_u64(7);
        let result = select_nominees(&[], &[], &mut rng);
        assert!(matches!(result, Err(AppError::NoEligibleMembers(_))));
    }

    #[test]
    fn single_member_holds_both_roles() {
        let members = vec![member("a")];
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let nomination = select_nominees(&members, &[], &mut rng).unwrap();
            assert_eq!(nomination.primary.id, "a");
            assert_eq!(nomination.secondary.id, "a");
        }
    }

    #[test]
    fn single_member_stays_nominated_while_already_on_duty() {
        let members = vec![member("a")];
        let active = vec![nominee("a", true, false), nominee("a", false, true)];
        let mut rng = StdRng::seed_from_u64(1);
        let nomination = select_nominees(&members, &active, &mut rng).unwrap();
        assert_eq!(nomination.primary.id, "a");
        assert_eq!(nomination.secondary.id, "a");
    }

    #[test]
    fn nominees_on_active_gamedays_are_skipped() {
        let members = vec![member("a"), member("b"), member("c")];
        let active = vec![nominee("a", true, false), nominee("b", false, true)];
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let nomination = select_nominees(&members, &active, &mut rng).unwrap();
            assert_eq!(nomination.primary.id, "c");
            assert_eq!(nomination.secondary.id, "c");
        }
    }

    #[test]
    fn falls_back_to_full_roster_when_everyone_is_on_duty() {
        let members = vec![member("a"), member("b")];
        let active = vec![nominee("a", true, false), nominee("b", false, true)];
        let mut seen = HashSet::new();
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let nomination = select_nominees(&members, &active, &mut rng).unwrap();
            seen.insert(nomination.primary.id);
            seen.insert(nomination.secondary.id);
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn rows_without_a_role_do_not_exclude() {
        let members = vec![member("a"), member("b")];
        let active = vec![nominee("a", false, false)];
        assert_eq!(candidate_pool(&members, &active).len(), 2);
    }

    #[test]
    fn draws_are_deterministic_for_a_seed() {
        let members = vec![member("a"), member("b"), member("c"), member("d")];
        let first = select_nominees(&members, &[], &mut StdRng::seed_from_u64(42)).unwrap();
        let second = select_nominees(&members, &[], &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn every_eligible_member_can_be_drawn() {
        let members = vec![member("a"), member("b"), member("c")];
        let mut primaries = HashSet::new();
        for seed in 0..128 {
            let mut rng = StdRng::seed_from_u64(seed);
            primaries.insert(select_nominees(&members, &[], &mut rng).unwrap().primary.id);
        }
        assert_eq!(primaries.len(), 3);
    }
}
