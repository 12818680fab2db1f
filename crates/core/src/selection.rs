//! Weighted multi-strategy screenshot selection.
//!
//! A request carries one non-negative integer weight per [`Strategy`]. The
//! selector first draws a strategy (categorical draw over the weights, in the
//! fixed [`Strategy::ALL`] order), then draws one screenshot from that
//! strategy's subset of the eligible pool using the strategy's weighting
//! rule. When the subset is empty it falls back to a uniform draw over the
//! whole pool.
//!
//! The eligible pool itself (reported content, banned creators, the viewer's
//! recently-seen screenshots) is filtered by the content store; this module
//! only receives the survivors as [`Candidate`] values.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::threshold_validation::validate_positive;
use crate::types::{DbId, Timestamp};

const SECONDS_PER_DAY: f64 = 86_400.0;
const STRATEGY_COUNT: usize = 6;

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// A named ranking/sampling rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Random,
    Popular,
    Trending,
    Recent,
    Archeologist,
    Supporter,
}

impl Strategy {
    /// Stable ordering used to accumulate weights during the strategy draw.
    pub const ALL: [Strategy; STRATEGY_COUNT] = [
        Strategy::Random,
        Strategy::Popular,
        Strategy::Trending,
        Strategy::Recent,
        Strategy::Archeologist,
        Strategy::Supporter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Popular => "popular",
            Self::Trending => "trending",
            Self::Recent => "recent",
            Self::Archeologist => "archeologist",
            Self::Supporter => "supporter",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Sampling weight of `candidate` under this strategy.
    ///
    /// Returns `None` when the candidate is outside the strategy's subset
    /// (e.g. a non-supporter screenshot for [`Strategy::Supporter`]).
    pub fn weight(
        self,
        candidate: &Candidate,
        now: Timestamp,
        policy: &ScoringPolicy,
    ) -> Option<f64> {
        match self {
            Self::Random => Some(1.0),
            Self::Popular => {
                let favorites = candidate.favorites_count.max(0) as f64;
                let views = candidate.views_count.max(0) as f64;
                Some((favorites + policy.popular_smoothing) / (views + policy.popular_smoothing))
            }
            Self::Trending => {
                (candidate.recent_engagement > 0).then_some(candidate.recent_engagement as f64)
            }
            Self::Recent => {
                let age = age_in_days(candidate.created_at, now);
                let decay = 0.5_f64.powf(age / policy.recent_half_life_days);
                Some(decay.max(f64::MIN_POSITIVE))
            }
            Self::Archeologist => {
                let age = age_in_days(candidate.created_at, now);
                if age < policy.archeologist_min_age_days as f64 {
                    return None;
                }
                let views = candidate.views_count.max(0) as f64;
                Some((1.0 + age) / (1.0 + views))
            }
            Self::Supporter => candidate.creator_is_supporter.then_some(1.0),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown strategy '{s}'. Must be one of: {}",
                    Strategy::ALL.map(Strategy::as_str).join(", ")
                ))
            })
    }
}

fn age_in_days(created_at: Timestamp, now: Timestamp) -> f64 {
    (now - created_at).num_seconds().max(0) as f64 / SECONDS_PER_DAY
}

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// One non-negative weight per strategy. Unset strategies weigh zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrategyWeights([u32; STRATEGY_COUNT]);

impl StrategyWeights {
    pub fn with(mut self, strategy: Strategy, weight: u32) -> Self {
        self.set(strategy, weight);
        self
    }

    pub fn set(&mut self, strategy: Strategy, weight: u32) {
        self.0[strategy.index()] = weight;
    }

    pub fn get(&self, strategy: Strategy) -> u32 {
        self.0[strategy.index()]
    }

    pub fn is_all_zero(&self) -> bool {
        self.0.iter().all(|&w| w == 0)
    }

    /// Weights actually used for the draw: all-zero collapses to `{random: 1}`.
    pub fn effective(&self) -> Self {
        if self.is_all_zero() {
            Self::default().with(Strategy::Random, 1)
        } else {
            *self
        }
    }

    /// Categorical draw over the effective weights.
    ///
    /// The ticket is accumulated in [`Strategy::ALL`] order, so a given ticket
    /// always resolves to the same strategy.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> Strategy {
        let weights = self.effective();
        let total: u64 = weights.0.iter().map(|&w| u64::from(w)).sum();
        let mut ticket = rng.random_range(0..total);

        for strategy in Strategy::ALL {
            let weight = u64::from(weights.get(strategy));
            if ticket < weight {
                return strategy;
            }
            ticket -= weight;
        }

        Strategy::Random
    }
}

impl FromIterator<(Strategy, u32)> for StrategyWeights {
    fn from_iter<I: IntoIterator<Item = (Strategy, u32)>>(iter: I) -> Self {
        let mut weights = Self::default();
        for (strategy, weight) in iter {
            weights.set(strategy, weight);
        }
        weights
    }
}

// ---------------------------------------------------------------------------
// Scoring policy
// ---------------------------------------------------------------------------

/// Tunable curves behind the time-sensitive strategies.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringPolicy {
    /// Engagement newer than this many days counts toward `trending`.
    pub trending_window_days: i64,
    /// Age at which a `recent` weight halves.
    pub recent_half_life_days: f64,
    /// Minimum age for a screenshot to enter the `archeologist` subset.
    pub archeologist_min_age_days: i64,
    /// Pseudo-count added to both sides of the `popular` favorites/views ratio.
    pub popular_smoothing: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            trending_window_days: 7,
            recent_half_life_days: 14.0,
            archeologist_min_age_days: 90,
            popular_smoothing: 1.0,
        }
    }
}

impl ScoringPolicy {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.trending_window_days < 1 {
            return Err(CoreError::Validation(format!(
                "Trending window must be at least 1 day, got {}",
                self.trending_window_days
            )));
        }
        if self.archeologist_min_age_days < 0 {
            return Err(CoreError::Validation(format!(
                "Archeologist minimum age must not be negative, got {}",
                self.archeologist_min_age_days
            )));
        }
        validate_positive(self.recent_half_life_days, "Recent half-life")?;
        validate_positive(self.popular_smoothing, "Popular smoothing")
    }

    /// Start of the window whose engagement counts toward `trending`.
    pub fn trending_since(&self, now: Timestamp) -> Timestamp {
        now - Duration::days(self.trending_window_days)
    }
}

/// Views newer than the returned instant hide a screenshot from its viewer.
///
/// `view_max_age_days == 0` disables the anti-repeat window entirely. A
/// window reaching back past the Unix epoch starts at the epoch, so every
/// recorded view counts.
pub fn seen_cutoff(now: Timestamp, view_max_age_days: u32) -> Option<Timestamp> {
    if view_max_age_days == 0 {
        return None;
    }
    let cutoff = Duration::try_days(i64::from(view_max_age_days))
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    Some(cutoff.max(DateTime::<Utc>::UNIX_EPOCH))
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// The per-screenshot facts the strategies score on.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub screenshot_id: DbId,
    pub created_at: Timestamp,
    pub views_count: i64,
    pub favorites_count: i64,
    /// Views plus favorites inside the trending window.
    pub recent_engagement: i64,
    pub creator_is_supporter: bool,
}

/// Outcome of one selection, with strategy attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub screenshot_id: DbId,
    /// The strategy that actually produced the screenshot.
    pub strategy: Strategy,
    /// The strategy drawn first, before any fallback.
    pub requested_strategy: Strategy,
    pub fell_back: bool,
}

/// Pick one screenshot from `pool`.
///
/// Fails with [`CoreError::NoEligibleContent`] only when `pool` is empty.
pub fn select<R: Rng>(
    weights: &StrategyWeights,
    pool: &[Candidate],
    now: Timestamp,
    policy: &ScoringPolicy,
    rng: &mut R,
) -> Result<Selection, CoreError> {
    if pool.is_empty() {
        return Err(CoreError::NoEligibleContent);
    }

    let requested = weights.pick(rng);
    if let Some(candidate) = draw(requested, pool, now, policy, rng) {
        return Ok(Selection {
            screenshot_id: candidate.screenshot_id,
            strategy: requested,
            requested_strategy: requested,
            fell_back: false,
        });
    }

    let candidate = draw(Strategy::Random, pool, now, policy, rng)
        .ok_or(CoreError::NoEligibleContent)?;
    Ok(Selection {
        screenshot_id: candidate.screenshot_id,
        strategy: Strategy::Random,
        requested_strategy: requested,
        fell_back: true,
    })
}

/// Draw one candidate from `strategy`'s subset of `pool`.
///
/// Returns `None` when the subset is empty or carries no positive weight.
pub fn draw<'a, R: Rng>(
    strategy: Strategy,
    pool: &'a [Candidate],
    now: Timestamp,
    policy: &ScoringPolicy,
    rng: &mut R,
) -> Option<&'a Candidate> {
    if strategy == Strategy::Random {
        if pool.is_empty() {
            return None;
        }
        return Some(&pool[rng.random_range(0..pool.len())]);
    }

    let weighted: Vec<(&Candidate, f64)> = pool
        .iter()
        .filter_map(|c| strategy.weight(c, now, policy).map(|w| (c, w)))
        .filter(|(_, w)| w.is_finite() && *w > 0.0)
        .collect();

    let total: f64 = weighted.iter().map(|(_, w)| w).sum();
    if weighted.is_empty() || !total.is_finite() || total <= 0.0 {
        return None;
    }

    let mut target = rng.random::<f64>() * total;
    for (candidate, weight) in &weighted {
        if target < *weight {
            return Some(candidate);
        }
        target -= weight;
    }

    // Float residue at the top end of the range.
    weighted.last().map(|(c, _)| *c)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn candidate(id: DbId, age_days: i64) -> Candidate {
        Candidate {
            screenshot_id: id,
            created_at: now() - Duration::days(age_days),
            views_count: 10,
            favorites_count: 1,
            recent_engagement: 0,
            creator_is_supporter: false,
        }
    }

    fn counts(
        weights: &StrategyWeights,
        pool: &[Candidate],
        draws: usize,
        seed: u64,
    ) -> HashMap<DbId, usize> {
        let mut rng = StdRng::seed_from_u64(seed);
        let policy = ScoringPolicy::default();
        let mut hits = HashMap::new();
        for _ in 0..draws {
            let pick = select(weights, pool, now(), &policy, &mut rng).unwrap();
            *hits.entry(pick.screenshot_id).or_insert(0) += 1;
        }
        hits
    }

    // -- Strategy parsing ----------------------------------------------------

    #[test]
    fn strategy_round_trips_through_str() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.as_str().parse::<Strategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        assert_matches!("hot".parse::<Strategy>(), Err(CoreError::Validation(_)));
    }

    // -- Weights -------------------------------------------------------------

    #[test]
    fn all_zero_weights_fall_back_to_random() {
        let weights = StrategyWeights::default().with(Strategy::Recent, 0);
        let effective = weights.effective();
        assert_eq!(effective.get(Strategy::Random), 1);
        assert_eq!(effective.get(Strategy::Recent), 0);

        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(weights.pick(&mut rng), Strategy::Random);
        }
    }

    #[test]
    fn single_positive_weight_always_wins() {
        let weights = StrategyWeights::default()
            .with(Strategy::Popular, 1)
            .with(Strategy::Recent, 0)
            .with(Strategy::Random, 0);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            assert_eq!(weights.pick(&mut rng), Strategy::Popular);
        }
    }

    #[test]
    fn strategy_draw_follows_weight_proportions() {
        let weights: StrategyWeights = [(Strategy::Random, 1), (Strategy::Recent, 3)]
            .into_iter()
            .collect();
        let mut rng = StdRng::seed_from_u64(5);
        let recent = (0..8_000)
            .filter(|_| weights.pick(&mut rng) == Strategy::Recent)
            .count();
        // Expected 6000; allow generous slack.
        assert!((5_600..6_400).contains(&recent), "recent drawn {recent} times");
    }

    // -- Selection -----------------------------------------------------------

    #[test]
    fn empty_pool_is_no_eligible_content() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = select(
            &StrategyWeights::default(),
            &[],
            now(),
            &ScoringPolicy::default(),
            &mut rng,
        );
        assert_matches!(result, Err(CoreError::NoEligibleContent));
    }

    #[test]
    fn positive_weights_and_non_empty_pool_always_select() {
        let pool = vec![candidate(1, 1), candidate(2, 400)];
        let policy = ScoringPolicy::default();
        let mut rng = StdRng::seed_from_u64(9);
        for strategy in Strategy::ALL {
            let weights = StrategyWeights::default().with(strategy, 2);
            for _ in 0..50 {
                assert!(select(&weights, &pool, now(), &policy, &mut rng).is_ok());
            }
        }
    }

    #[test]
    fn empty_supporter_subset_falls_back_to_random() {
        let pool = vec![candidate(1, 3), candidate(2, 5)];
        let weights = StrategyWeights::default().with(Strategy::Supporter, 1);
        let mut rng = StdRng::seed_from_u64(2);

        let pick = select(&weights, &pool, now(), &ScoringPolicy::default(), &mut rng).unwrap();
        assert_eq!(pick.strategy, Strategy::Random);
        assert_eq!(pick.requested_strategy, Strategy::Supporter);
        assert!(pick.fell_back);
    }

    #[test]
    fn supporter_strategy_only_returns_supporter_content() {
        let mut supporter = candidate(7, 3);
        supporter.creator_is_supporter = true;
        let pool = vec![candidate(1, 3), supporter, candidate(2, 5)];
        let weights = StrategyWeights::default().with(Strategy::Supporter, 1);

        let hits = counts(&weights, &pool, 300, 4);
        assert_eq!(hits.get(&7), Some(&300));
    }

    #[test]
    fn popular_prefers_higher_favorite_ratio() {
        let mut pool = Vec::new();
        for (id, favorites) in [(1, 1), (2, 5), (3, 9)] {
            let mut c = candidate(id, 10);
            c.views_count = 10;
            c.favorites_count = favorites;
            pool.push(c);
        }
        let weights = StrategyWeights::default()
            .with(Strategy::Popular, 1)
            .with(Strategy::Recent, 0)
            .with(Strategy::Random, 0);

        let hits = counts(&weights, &pool, 10_000, 42);
        let low = hits.get(&1).copied().unwrap_or(0);
        let high = hits.get(&3).copied().unwrap_or(0);
        assert!(high > low, "0.9 ratio drawn {high} times, 0.1 ratio {low} times");
    }

    #[test]
    fn trending_only_considers_recent_engagement() {
        let mut hot = candidate(5, 2);
        hot.recent_engagement = 12;
        let pool = vec![candidate(1, 2), hot, candidate(2, 2)];
        let weights = StrategyWeights::default().with(Strategy::Trending, 1);

        let hits = counts(&weights, &pool, 200, 8);
        assert_eq!(hits.get(&5), Some(&200));
    }

    #[test]
    fn recent_prefers_newer_screenshots() {
        let pool = vec![candidate(1, 0), candidate(2, 60)];
        let weights = StrategyWeights::default().with(Strategy::Recent, 1);

        let hits = counts(&weights, &pool, 2_000, 13);
        assert!(hits.get(&1).copied().unwrap_or(0) > hits.get(&2).copied().unwrap_or(0));
    }

    #[test]
    fn archeologist_skips_young_screenshots() {
        let policy = ScoringPolicy::default();
        assert_eq!(Strategy::Archeologist.weight(&candidate(1, 10), now(), &policy), None);
        assert!(Strategy::Archeologist
            .weight(&candidate(2, 365), now(), &policy)
            .is_some());
    }

    #[test]
    fn archeologist_favors_low_view_counts() {
        let policy = ScoringPolicy::default();
        let mut forgotten = candidate(1, 400);
        forgotten.views_count = 0;
        let mut famous = candidate(2, 400);
        famous.views_count = 5_000;

        let low = Strategy::Archeologist.weight(&forgotten, now(), &policy).unwrap();
        let high = Strategy::Archeologist.weight(&famous, now(), &policy).unwrap();
        assert!(low > high);
    }

    #[test]
    fn very_old_screenshots_stay_drawable_under_recent() {
        let weight = Strategy::Recent
            .weight(&candidate(1, 100_000), now(), &ScoringPolicy::default())
            .unwrap();
        assert!(weight > 0.0);
    }

    // -- Policy --------------------------------------------------------------

    #[test]
    fn seen_cutoff_is_disabled_by_zero() {
        assert_eq!(seen_cutoff(now(), 0), None);
        assert_eq!(seen_cutoff(now(), 3), Some(now() - Duration::days(3)));
    }

    #[test]
    fn huge_seen_window_starts_at_epoch() {
        assert_eq!(
            seen_cutoff(now(), 100_000_000),
            Some(DateTime::<Utc>::UNIX_EPOCH)
        );
        assert_eq!(
            seen_cutoff(now(), u32::MAX),
            Some(DateTime::<Utc>::UNIX_EPOCH)
        );
    }

    #[test]
    fn default_policy_is_valid() {
        assert!(ScoringPolicy::default().validate().is_ok());
    }

    #[test]
    fn policy_rejects_non_positive_curves() {
        let policy = ScoringPolicy {
            popular_smoothing: 0.0,
            ..ScoringPolicy::default()
        };
        assert!(policy.validate().is_err());

        let policy = ScoringPolicy {
            trending_window_days: 0,
            ..ScoringPolicy::default()
        };
        assert!(policy.validate().is_err());
    }
}
